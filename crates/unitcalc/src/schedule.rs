//! Single-slot delayed task
//!
//! Holds at most one pending action. Scheduling while one is pending aborts
//! the old one first, so rapid re-scheduling never stacks timers. Tasks run on
//! the current `LocalSet`, the same cooperative thread as the event loop.

use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once `delay` has elapsed, replacing any pending action.
    ///
    /// Must be called from within a `LocalSet`.
    pub fn schedule<F>(&mut self, delay: Duration, action: F)
    where
        F: FnOnce() + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Abort the pending action. Returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_fires_after_delay() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let fired = Rc::new(RefCell::new(Vec::new()));
                let mut task = ScheduledTask::new();

                let log = Rc::clone(&fired);
                task.schedule(Duration::from_millis(300), move || log.borrow_mut().push("a"));
                assert!(task.is_pending());

                tokio::time::sleep(Duration::from_millis(299)).await;
                assert!(fired.borrow().is_empty());

                tokio::time::sleep(Duration::from_millis(2)).await;
                assert_eq!(*fired.borrow(), vec!["a"]);
                assert!(!task.is_pending());
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_reschedule_supersedes() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let fired = Rc::new(RefCell::new(Vec::new()));
                let mut task = ScheduledTask::new();

                let log = Rc::clone(&fired);
                task.schedule(Duration::from_millis(300), move || log.borrow_mut().push("first"));
                tokio::time::sleep(Duration::from_millis(100)).await;

                let log = Rc::clone(&fired);
                task.schedule(Duration::from_millis(300), move || log.borrow_mut().push("second"));

                tokio::time::sleep(Duration::from_millis(1000)).await;
                assert_eq!(*fired.borrow(), vec!["second"]);
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_cancel() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let fired = Rc::new(RefCell::new(0));
                let mut task = ScheduledTask::new();

                let count = Rc::clone(&fired);
                task.schedule(Duration::from_millis(500), move || *count.borrow_mut() += 1);
                assert!(task.cancel());
                assert!(!task.cancel());

                tokio::time::sleep(Duration::from_millis(1000)).await;
                assert_eq!(*fired.borrow(), 0);
            })
            .await;
    }
}
