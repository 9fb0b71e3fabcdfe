//! Attempt completion: success, retry or failure.

use std::sync::Arc;
use std::time::Duration;

use super::{RequestEngine, Slot, Submitted};
use crate::callback::{Outcome, RequestError};
use crate::code::RequestCode;
use crate::encoding;
use crate::retry::{self, RetryDecision, TransportFailure};
use crate::transport::TransportResult;

/// What to do with a failed attempt, decided under the registry lock.
enum Next {
    Retry {
        attempt: u32,
        timeout: Duration,
        submitted: Arc<Submitted>,
    },
    Fail,
    Stale,
}

impl RequestEngine {
    pub(super) fn on_attempt_done(
        &self,
        code: RequestCode,
        ticket: u64,
        attempt: u32,
        result: TransportResult,
    ) {
        match result {
            Ok(response) => self.complete(code, ticket, attempt, &response.body),
            Err(failure) => self.fail_attempt(code, ticket, attempt, failure),
        }
    }

    fn complete(&self, code: RequestCode, ticket: u64, attempt: u32, body: &[u8]) {
        let Some(Slot::Request(entry)) = self
            .registry
            .remove_if(code, |slot| slot.is_attempt(ticket, attempt))
        else {
            tracing::debug!(code, attempt, "dropping response for request no longer in flight");
            return;
        };
        let charset = entry.submitted.descriptor.encoding();
        let outcome = match encoding::decode(charset, body) {
            Ok(text) => {
                tracing::debug!(code, attempt, "request completed ({} bytes)", body.len());
                Outcome::Complete(text)
            }
            Err(e) => {
                tracing::warn!(code, "{}", e);
                Outcome::Failed(RequestError::other(e.to_string()))
            }
        };
        self.deliver(code, entry.callback, outcome);
    }

    fn fail_attempt(&self, code: RequestCode, ticket: u64, attempt: u32, failure: TransportFailure) {
        let kind = retry::classify(&failure);
        let next = self
            .registry
            .with_mut(code, |slot| {
                let Slot::Request(entry) = slot else {
                    return Next::Stale;
                };
                if entry.ticket != ticket || entry.attempt != attempt {
                    return Next::Stale;
                }
                match entry.submitted.descriptor.policy().decide(attempt, kind) {
                    RetryDecision::Retry { attempt: next, timeout } => {
                        entry.attempt = next;
                        entry.cancel = None;
                        Next::Retry {
                            attempt: next,
                            timeout,
                            submitted: Arc::clone(&entry.submitted),
                        }
                    }
                    RetryDecision::NoRetry => Next::Fail,
                }
            })
            .unwrap_or(Next::Stale);

        match next {
            Next::Stale => {
                tracing::debug!(code, attempt, "dropping failure for request no longer in flight: {}", failure);
            }
            Next::Retry {
                attempt: next,
                timeout,
                submitted,
            } => match self.current_transport() {
                Some(transport) => {
                    tracing::info!(
                        code,
                        "attempt {} failed ({}), retrying as attempt {} with timeout {:?}",
                        attempt,
                        failure,
                        next,
                        timeout
                    );
                    self.start_attempt(transport.as_ref(), code, ticket, next, timeout, &submitted);
                }
                None => self.finish_failed(code, ticket, next, failure),
            },
            Next::Fail => self.finish_failed(code, ticket, attempt, failure),
        }
    }

    fn finish_failed(&self, code: RequestCode, ticket: u64, attempt: u32, failure: TransportFailure) {
        let Some(Slot::Request(entry)) = self
            .registry
            .remove_if(code, |slot| slot.is_attempt(ticket, attempt))
        else {
            return;
        };
        tracing::warn!(code, attempt, "request failed: {}", failure);
        let error = retry::to_request_error(failure, entry.submitted.descriptor.encoding());
        self.deliver(code, entry.callback, Outcome::Failed(error));
    }
}
