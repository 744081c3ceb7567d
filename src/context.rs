//! The designated context completions run on.
//!
//! The consumer of this crate is UI code that must not be touched from a
//! background task, so every completion is handed over a channel to a single
//! loop the application drives.

use tokio::sync::mpsc;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle for posting completions onto the callback loop. Cheap to clone;
/// every clone posts to the same loop.
#[derive(Debug, Clone)]
pub struct CallbackContext {
    tx: mpsc::UnboundedSender<Job>,
}

impl CallbackContext {
    /// Queues `job` to run on the loop. Jobs run in post order, each at most
    /// once. Posting after the loop is gone drops the job.
    pub fn post<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.tx.send(Box::new(job)).is_err() {
            log::warn!("callback loop is gone, dropping completion");
        }
    }
}

/// Owns the receiving half of the context: the single place completions run,
/// standing in for the main thread of a UI application.
#[derive(Debug)]
pub struct CallbackLoop {
    rx: mpsc::UnboundedReceiver<Job>,
}

impl CallbackLoop {
    /// Runs jobs until every [`CallbackContext`] clone is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            job();
        }
    }

    /// Runs a single job, waiting for one if none is queued. Returns `false`
    /// once all contexts are gone and the queue is drained.
    pub async fn turn(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }
}

/// Creates a connected context/loop pair.
pub fn channel() -> (CallbackContext, CallbackLoop) {
    let (tx, rx) = mpsc::unbounded_channel();

    (CallbackContext { tx }, CallbackLoop { rx })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[tokio::test]
    async fn jobs_run_in_post_order() {
        let (context, mut callback_loop) = channel();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let seen = Arc::clone(&seen);
            context.post(move || seen.lock().unwrap().push(i));
        }

        for _ in 0..3 {
            assert!(callback_loop.turn().await);
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn loop_finishes_once_contexts_are_gone() {
        let (context, mut callback_loop) = channel();
        context.post(|| ());
        drop(context);

        assert!(callback_loop.turn().await);
        assert!(!callback_loop.turn().await);
    }
}
