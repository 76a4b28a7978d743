//! Background offload for long-running adapter work.
//!
//! One worker thread per call, no pooling or coordination beyond the join:
//! push a read-transform-write chain off the caller's thread with
//! [`spawn`], keep working, and [`Task::wait`] for the outcome when it is
//! needed.

use std::thread::{self, JoinHandle};

/// Handle to one spawned unit of work.
pub struct Task<T> {
    handle: JoinHandle<T>,
}

impl<T> Task<T> {
    /// Whether the work has completed; does not block.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the work completes and yields its result. A panic on
    /// the worker thread resumes on the caller.
    pub fn wait(self) -> T {
        match self.handle.join() {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Runs `work` on a fresh background thread.
pub fn spawn<T, F>(work: F) -> Task<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Task { handle: thread::spawn(work) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_returns_the_result() {
        let task = spawn(|| 2 + 2);
        assert_eq!(task.wait(), 4);
    }

    #[test]
    fn tasks_run_concurrently_with_the_caller() {
        let (tx, rx) = std::sync::mpsc::channel();
        let task = spawn(move || rx.recv().unwrap());
        assert!(!task.is_finished());
        tx.send(7).unwrap();
        assert_eq!(task.wait(), 7);
    }
}
