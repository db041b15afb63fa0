//! Gesture Disambiguator
//!
//! Decides whether a press on a history entry was a click (insert the result
//! at the caret) or a long press (restore the original input). The machine is
//! pure; whoever owns it arms and cancels the long-press timer according to
//! the returned [`Transition`].
//!
//! | state       | event      | next        | effect                  |
//! |-------------|------------|-------------|-------------------------|
//! | Idle        | PressStart | Pressed     | arm timer               |
//! | Pressed     | PressEnd   | Idle        | cancel timer, Click     |
//! | Pressed     | TimerFired | LongPressed | LongPress               |
//! | Pressed     | PressLeave | Idle        | cancel timer            |
//! | LongPressed | PressEnd   | Idle        | (release swallowed)     |
//! | LongPressed | PressLeave | Idle        |                         |

use crate::schedule::ScheduledTask;
use std::time::Duration;

/// Hold time that turns a press into a long press.
pub const LONG_PRESS: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Pressed,
    /// Long press already fired; the coming release must not click.
    LongPressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    PressStart,
    PressEnd,
    PressLeave,
    TimerFired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    /// Insert the entry's value at the caret.
    Click,
    /// Replace the buffer with the entry's original input.
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Arm,
    Cancel,
}

/// Outcome of feeding one event to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
    pub action: Option<GestureAction>,
    pub timer: Option<TimerCommand>,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GestureMachine {
    state: GestureState,
}

impl GestureMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn handle(&mut self, event: GestureEvent) -> Transition {
        use GestureEvent::*;
        use GestureState::*;

        let (next, transition) = match (self.state, event) {
            (Idle, PressStart) => (
                Pressed,
                Transition {
                    action: None,
                    timer: Some(TimerCommand::Arm),
                },
            ),
            (Pressed, PressEnd) => (
                Idle,
                Transition {
                    action: Some(GestureAction::Click),
                    timer: Some(TimerCommand::Cancel),
                },
            ),
            (Pressed, TimerFired) => (
                LongPressed,
                Transition {
                    action: Some(GestureAction::LongPress),
                    timer: None,
                },
            ),
            (Pressed, PressLeave) => (
                Idle,
                Transition {
                    action: None,
                    timer: Some(TimerCommand::Cancel),
                },
            ),
            (LongPressed, PressEnd | PressLeave) => (Idle, Transition::none()),
            (state, _) => (state, Transition::none()),
        };

        self.state = next;
        transition
    }
}

/// A gesture machine paired with its long-press timer.
///
/// One per history entry that has a value, so each entry has at most one timer.
#[derive(Debug)]
pub struct PressTracker {
    machine: GestureMachine,
    timer: ScheduledTask,
    hold: Duration,
}

impl PressTracker {
    pub fn new(hold: Duration) -> Self {
        Self {
            machine: GestureMachine::new(),
            timer: ScheduledTask::new(),
            hold,
        }
    }

    pub fn state(&self) -> GestureState {
        self.machine.state()
    }

    /// Feed `event` and apply the timer command. `on_fire` runs when an armed
    /// timer elapses; it should route a `TimerFired` back into this tracker.
    pub fn handle<F>(&mut self, event: GestureEvent, on_fire: F) -> Option<GestureAction>
    where
        F: FnOnce() + 'static,
    {
        let transition = self.machine.handle(event);
        match transition.timer {
            Some(TimerCommand::Arm) => self.timer.schedule(self.hold, on_fire),
            Some(TimerCommand::Cancel) => {
                self.timer.cancel();
            }
            None => {}
        }
        transition.action
    }
}

impl Default for PressTracker {
    fn default() -> Self {
        Self::new(LONG_PRESS)
    }
}
