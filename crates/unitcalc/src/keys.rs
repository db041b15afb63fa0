//! Key conversion from crossterm to input actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press asks the input surface to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Insert(char),
    Newline,
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    Submit,
    RecallPrev,
    RecallNext,
    AcceptCompletion,
    NextCompletion,
    PrevCompletion,
    Quit,
}

/// Convert a crossterm KeyEvent to an input action. Unbound keys map to None.
pub fn convert_key(event: KeyEvent) -> Option<InputAction> {
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl {
        return match event.code {
            KeyCode::Char('c') | KeyCode::Char('d') => Some(InputAction::Quit),
            KeyCode::Char('n') => Some(InputAction::NextCompletion),
            KeyCode::Char('p') => Some(InputAction::PrevCompletion),
            KeyCode::Char('a') => Some(InputAction::Home),
            KeyCode::Char('e') => Some(InputAction::End),
            _ => None,
        };
    }

    let action = match event.code {
        KeyCode::Enter
            if event
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            InputAction::Newline
        }
        KeyCode::Enter => InputAction::Submit,
        KeyCode::Char(c) => InputAction::Insert(c),
        KeyCode::Backspace => InputAction::Backspace,
        KeyCode::Delete => InputAction::Delete,
        KeyCode::Left => InputAction::Left,
        KeyCode::Right => InputAction::Right,
        KeyCode::Home => InputAction::Home,
        KeyCode::End => InputAction::End,
        KeyCode::Up => InputAction::RecallPrev,
        KeyCode::Down => InputAction::RecallNext,
        KeyCode::Tab => InputAction::AcceptCompletion,
        KeyCode::BackTab => InputAction::PrevCompletion,
        _ => return None,
    };
    Some(action)
}
