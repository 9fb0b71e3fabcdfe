//! Where request callbacks run.
//!
//! The engine never calls a [`RequestCallback`](crate::callback::RequestCallback)
//! directly; it hands a job to its dispatcher. Pick [`Inline`] to run on the
//! transport's worker thread, [`TokioDispatcher`] to run on a runtime's
//! blocking pool, or [`ChannelDispatcher`] to run on a thread you own.

use std::sync::mpsc;
use tokio::runtime::Handle;

/// A callback invocation waiting to run.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// Runs the job immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct Inline;

impl Dispatcher for Inline {
    fn dispatch(&self, job: Job) {
        job();
    }
}

/// Runs each job on the tokio blocking pool, so slow callbacks never stall
/// transport workers.
#[derive(Debug, Clone)]
pub struct TokioDispatcher {
    handle: Handle,
}

impl TokioDispatcher {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Dispatcher bound to the runtime this is called from.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Dispatcher for TokioDispatcher {
    fn dispatch(&self, job: Job) {
        drop(self.handle.spawn_blocking(job));
    }
}

/// Queues jobs on a channel; the owner of the receiver runs them, e.g. from
/// an application's main loop with `for job in rx { job() }`.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::Sender<Job>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, mpsc::Receiver<Job>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl Dispatcher for ChannelDispatcher {
    fn dispatch(&self, job: Job) {
        if self.tx.send(job).is_err() {
            tracing::warn!("callback receiver dropped; discarding callback");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn inline_runs_immediately() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        Inline.dispatch(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn channel_defers_to_receiver() {
        let (dispatcher, rx) = ChannelDispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        dispatcher.dispatch(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        rx.recv().unwrap()();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tokio_dispatcher_runs_on_runtime() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        TokioDispatcher::current().dispatch(Box::new(move || {
            let _ = tx.send(std::thread::current().id());
        }));
        let worker = rx.await.unwrap();
        assert_ne!(worker, std::thread::current().id());
    }
}
