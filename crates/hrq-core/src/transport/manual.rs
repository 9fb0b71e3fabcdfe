//! Transport driven by hand from tests: attempts queue up until the test
//! completes them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{AbortToken, Cancel, Completion, PreparedRequest, Transport, TransportResponse, TransportResult};
use crate::retry::TransportFailure;

pub(crate) struct Pending {
    pub request: PreparedRequest,
    pub token: AbortToken,
    on_done: Completion,
}

impl Pending {
    pub fn finish(self, result: TransportResult) -> PreparedRequest {
        (self.on_done)(result);
        self.request
    }
}

#[derive(Default)]
pub(crate) struct ManualTransport {
    pending: Mutex<VecDeque<Pending>>,
    seen: Mutex<Vec<PreparedRequest>>,
}

impl ManualTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Every attempt enqueued so far, in order.
    pub fn seen(&self) -> Vec<PreparedRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn take_next(&self) -> Pending {
        self.pending
            .lock()
            .unwrap()
            .pop_front()
            .expect("no pending attempt")
    }

    pub fn succeed_next(&self, body: &[u8]) -> PreparedRequest {
        self.take_next().finish(Ok(TransportResponse {
            status: 200,
            body: body.to_vec(),
        }))
    }

    pub fn fail_next(&self, failure: TransportFailure) -> PreparedRequest {
        self.take_next().finish(Err(failure))
    }
}

impl Transport for ManualTransport {
    fn enqueue(&self, request: PreparedRequest, on_done: Completion) -> Box<dyn Cancel> {
        let token = AbortToken::new();
        self.seen.lock().unwrap().push(request.clone());
        self.pending.lock().unwrap().push_back(Pending {
            request,
            token: token.clone(),
            on_done,
        });
        Box::new(token)
    }
}
