//! hrq: asynchronous HTTP requests tracked by request code.
//!
//! Requests are described with a [`request::RequestBuilder`], submitted to a
//! [`engine::RequestEngine`] and answered exactly once through a
//! [`callback::RequestCallback`], unless cancelled first.

pub mod config;
pub mod logging;

pub mod callback;
pub mod code;
pub mod dispatch;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod queue;
pub mod registry;
pub mod request;
pub mod retry;
pub mod transport;

pub use callback::{Outcome, RequestCallback, RequestError};
pub use code::RequestCode;
pub use config::PersistentConfig;
pub use engine::RequestEngine;
pub use error::HrqError;
pub use request::{Method, RequestBuilder, RequestDescriptor};
