//! Sequential request queue.
//!
//! Runs a list of requests one after another through an engine. Each
//! request starts only after the previous one completed; the first failure
//! stops the queue. The queue holds its own code for as long as it runs, so
//! no request can share it, and cancelling that code with
//! [`RequestEngine::cancel`] stops the queue without callbacks. Cancelling
//! the request currently running fails the queue at that index.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use crate::callback::{RequestCallback, RequestError};
use crate::code::RequestCode;
use crate::engine::{CancelHook, RequestEngine, Reservation};
use crate::error::HrqError;
use crate::request::RequestDescriptor;
use crate::transport::Cancel;

/// Receives the outcome of a whole queue. Exactly one method is called per
/// queue, unless the queue is cancelled first.
pub trait QueueCallback: Send + Sync {
    /// All requests completed; `results` are in submission order.
    fn on_queue_completed(&self, queue_code: RequestCode, results: Vec<String>);
    /// Request number `index` (0-based) failed; later requests were not sent.
    fn on_queue_request_failed(&self, queue_code: RequestCode, index: usize, error: RequestError);
}

/// Requests to run in order. Consumed by [`RequestQueue::execute`], so
/// nothing can be added once it runs.
#[derive(Debug, Default)]
pub struct RequestQueue {
    requests: VecDeque<RequestDescriptor>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: RequestDescriptor) -> &mut Self {
        self.requests.push_back(request);
        self
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Start the queue. Returns the queue code, or an error if the engine
    /// is not initialised or has no free code.
    pub fn execute(
        self,
        engine: &Arc<RequestEngine>,
        callback: Arc<dyn QueueCallback>,
    ) -> Result<RequestCode, HrqError> {
        let runner = Arc::new_cyclic(|me| QueueRunner {
            me: me.clone(),
            engine: Arc::downgrade(engine),
            reservation: OnceLock::new(),
            callback,
            state: Mutex::new(RunState {
                remaining: self.requests,
                results: Vec::new(),
                current: None,
                finished: false,
            }),
        });
        let reservation = engine.reserve_code(Box::new(QueueCancel(Arc::downgrade(&runner))))?;
        let queue_code = reservation.code;
        let _ = runner.reservation.set(reservation);
        tracing::debug!(queue_code, "starting request queue");
        runner.serve_next(Delivery::Dispatch);
        Ok(queue_code)
    }
}

/// Whether the caller is already running on the engine's dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Direct,
    Dispatch,
}

enum Finish {
    Completed(Vec<String>),
    Failed(usize, RequestError),
}

struct RunState {
    remaining: VecDeque<RequestDescriptor>,
    results: Vec<String>,
    /// Code of the member request in flight.
    current: Option<RequestCode>,
    finished: bool,
}

struct QueueRunner {
    me: Weak<QueueRunner>,
    engine: Weak<RequestEngine>,
    reservation: OnceLock<Reservation>,
    callback: Arc<dyn QueueCallback>,
    state: Mutex<RunState>,
}

/// Cancel handle the engine holds for the queue code.
struct QueueCancel(Weak<QueueRunner>);

impl Cancel for QueueCancel {
    fn cancel(&self) {
        if let Some(runner) = self.0.upgrade() {
            runner.abort();
        }
    }
}

impl QueueRunner {
    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn queue_code(&self) -> RequestCode {
        self.reservation.get().map_or(0, |r| r.code)
    }

    fn serve_next(&self, delivery: Delivery) {
        let Some(engine) = self.engine.upgrade() else {
            tracing::warn!(queue_code = self.queue_code(), "engine dropped, abandoning queue");
            return;
        };
        let (next, index) = {
            let mut state = self.state();
            if state.finished {
                return;
            }
            (state.remaining.pop_front(), state.results.len())
        };

        let Some(request) = next else {
            let results = std::mem::take(&mut self.state().results);
            self.finish(&engine, Finish::Completed(results), delivery);
            return;
        };
        let Some(me) = self.me.upgrade() else {
            return;
        };

        let weak = self.me.clone();
        let hook: CancelHook = Box::new(move || {
            if let Some(runner) = weak.upgrade() {
                runner.member_cancelled(index);
            }
        });
        match engine.submit_with_hook(request, me, Some(hook)) {
            Ok(code) => {
                // A synchronous transport may already have settled it.
                let mut state = self.state();
                if !state.finished && state.results.len() == index {
                    state.current = Some(code);
                }
            }
            Err(e) => {
                tracing::warn!(queue_code = self.queue_code(), index, "queue submit failed: {}", e);
                let error = RequestError::other(e.to_string());
                self.finish(&engine, Finish::Failed(index, error), delivery);
            }
        }
    }

    /// Deliver the terminal event once, unless the queue code was cancelled.
    fn finish(&self, engine: &RequestEngine, outcome: Finish, delivery: Delivery) {
        {
            let mut state = self.state();
            if state.finished {
                return;
            }
            state.finished = true;
            state.current = None;
        }
        let Some(reservation) = self.reservation.get() else {
            return;
        };
        if !engine.release_code(reservation) {
            return;
        }

        let (callback, code) = (Arc::clone(&self.callback), reservation.code);
        let job = move || match outcome {
            Finish::Completed(results) => callback.on_queue_completed(code, results),
            Finish::Failed(index, error) => callback.on_queue_request_failed(code, index, error),
        };
        match delivery {
            Delivery::Direct => job(),
            Delivery::Dispatch => engine.dispatch(Box::new(job)),
        }
    }

    /// The queue code itself was cancelled (or the engine torn down).
    fn abort(&self) {
        let current = {
            let mut state = self.state();
            state.finished = true;
            state.remaining.clear();
            state.current.take()
        };
        tracing::debug!(queue_code = self.queue_code(), "queue aborted");
        if let (Some(code), Some(engine)) = (current, self.engine.upgrade()) {
            engine.cancel(code);
        }
    }

    /// The running member was cancelled on its own.
    fn member_cancelled(&self, index: usize) {
        {
            let mut state = self.state();
            if state.finished || state.results.len() != index {
                return;
            }
            state.current = None;
        }
        let Some(engine) = self.engine.upgrade() else {
            return;
        };
        let error = RequestError::other("request cancelled");
        self.finish(&engine, Finish::Failed(index, error), Delivery::Dispatch);
    }
}

impl RequestCallback for QueueRunner {
    fn on_request_complete(&self, _request_code: RequestCode, result: String) {
        {
            let mut state = self.state();
            state.results.push(result);
            state.current = None;
        }
        self.serve_next(Delivery::Direct);
    }

    fn on_request_failed(&self, _request_code: RequestCode, error: RequestError) {
        let index = {
            let mut state = self.state();
            state.current = None;
            state.results.len()
        };
        if let Some(engine) = self.engine.upgrade() {
            self.finish(&engine, Finish::Failed(index, error), Delivery::Direct);
        }
    }
}
