//! Caller-facing completion contract.

use crate::code::RequestCode;
use std::fmt;
use std::sync::mpsc;

/// Message delivered for every network error, whatever libcurl reported.
pub const OFFLINE_MESSAGE: &str = "Offline, check your internet connection";

/// Receives the terminal event of a submitted request.
///
/// Exactly one of the two methods is called per request code, unless the
/// request is cancelled first, in which case neither is. The thread it runs
/// on is decided by the engine's [`Dispatcher`](crate::dispatch::Dispatcher).
pub trait RequestCallback: Send + Sync {
    fn on_request_complete(&self, request_code: RequestCode, result: String);
    fn on_request_failed(&self, request_code: RequestCode, error: RequestError);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ErrorType {
    Server(u32),
    Network,
    Other,
}

/// Classified failure of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    kind: ErrorType,
    message: String,
}

impl RequestError {
    /// The server answered with an error status; `body` becomes the message.
    pub fn server(status: u32, body: String) -> Self {
        Self {
            kind: ErrorType::Server(status),
            message: body,
        }
    }

    /// No response was received.
    pub fn network() -> Self {
        Self {
            kind: ErrorType::Network,
            message: OFFLINE_MESSAGE.to_string(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorType::Other,
            message: message.into(),
        }
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self.kind, ErrorType::Server(_))
    }

    pub fn is_network_error(&self) -> bool {
        self.kind == ErrorType::Network
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of a server error; `None` for every other kind.
    pub fn status_code(&self) -> Option<u32> {
        match self.kind {
            ErrorType::Server(code) => Some(code),
            _ => None,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorType::Server(code) => write!(f, "server error {}: {}", code, self.message),
            ErrorType::Network => write!(f, "network error: {}", self.message),
            ErrorType::Other => write!(f, "error: {}", self.message),
        }
    }
}

impl std::error::Error for RequestError {}

/// Terminal event of a request, as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Complete(String),
    Failed(RequestError),
}

impl Outcome {
    pub fn into_result(self) -> Result<String, RequestError> {
        match self {
            Outcome::Complete(text) => Ok(text),
            Outcome::Failed(err) => Err(err),
        }
    }
}

/// Forwards outcomes into a std channel; handy for blocking callers and tests.
impl RequestCallback for mpsc::Sender<(RequestCode, Outcome)> {
    fn on_request_complete(&self, request_code: RequestCode, result: String) {
        let _ = self.send((request_code, Outcome::Complete(result)));
    }

    fn on_request_failed(&self, request_code: RequestCode, error: RequestError) {
        let _ = self.send((request_code, Outcome::Failed(error)));
    }
}

/// Forwards outcomes into a tokio channel for async callers.
impl RequestCallback for tokio::sync::mpsc::UnboundedSender<(RequestCode, Outcome)> {
    fn on_request_complete(&self, request_code: RequestCode, result: String) {
        let _ = self.send((request_code, Outcome::Complete(result)));
    }

    fn on_request_failed(&self, request_code: RequestCode, error: RequestError) {
        let _ = self.send((request_code, Outcome::Failed(error)));
    }
}
