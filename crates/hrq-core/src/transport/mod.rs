//! Contract between the engine and the HTTP client doing the actual I/O.
//!
//! A transport accepts one attempt at a time, runs it off the caller's
//! thread, and calls the completion exactly once, whether the attempt
//! succeeded, failed or was cancelled.

mod libcurl;
#[cfg(test)]
pub(crate) mod manual;

pub use self::libcurl::CurlTransport;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::code::RequestCode;
use crate::request::Method;
use crate::retry::TransportFailure;

/// One attempt, fully assembled: query string applied, headers merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub code: RequestCode,
    /// 0 for the first try, 1.. for retries.
    pub attempt: u32,
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

/// A 2xx response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

pub type TransportResult = Result<TransportResponse, TransportFailure>;

/// Called once per attempt with its result.
pub type Completion = Box<dyn FnOnce(TransportResult) + Send + 'static>;

/// Handle for aborting an enqueued attempt.
pub trait Cancel: Send + Sync {
    fn cancel(&self);
}

pub trait Transport: Send + Sync {
    /// Start `request` without blocking; report through `on_done`.
    fn enqueue(&self, request: PreparedRequest, on_done: Completion) -> Box<dyn Cancel>;
}

/// Shared abort flag. The transport polls it while the attempt runs.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Cancel for AbortToken {
    fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}
