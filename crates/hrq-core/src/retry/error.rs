//! Transport failure type handed to the engine for classification.

use std::fmt;

/// Why a single transport attempt did not produce a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The server answered with a non-2xx status.
    Status { code: u32, body: Vec<u8> },
    /// The attempt exceeded its timeout before a response arrived.
    Timeout,
    /// No response: connection refused or reset, DNS failure, no route.
    Connection(String),
    /// The transfer was aborted because the request was cancelled.
    Aborted,
    /// Anything else (malformed request, local I/O failure).
    Other(String),
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Status { code, body } => {
                write!(f, "HTTP {} ({} byte body)", code, body.len())
            }
            TransportFailure::Timeout => write!(f, "timed out"),
            TransportFailure::Connection(msg) => write!(f, "connection: {}", msg),
            TransportFailure::Aborted => write!(f, "aborted"),
            TransportFailure::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TransportFailure {}
