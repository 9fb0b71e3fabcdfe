//! Synchronous errors returned at the call site.
//!
//! Everything that goes wrong after a request has been handed to the
//! transport is reported through the callback as a
//! [`RequestError`](crate::callback::RequestError) instead.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HrqError {
    /// Config or engine used before `init()` (or after `teardown()`).
    #[error("{0} needs to be initialised before use")]
    NotInitialized(&'static str),
    /// Request built with an empty URL.
    #[error("request url is empty")]
    EmptyUrl,
    /// URL could not be parsed.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Every request code is currently in flight.
    #[error("no free request code (all {0} codes in flight)")]
    CodesExhausted(u32),
}
