//! Request description: method, URL, headers, body and retry policy.
//!
//! A [`RequestDescriptor`] is produced by a [`RequestBuilder`] seeded from a
//! [`PersistentConfig`](crate::config::PersistentConfig) snapshot. Once
//! built it has no mutators; submitting it moves it into the engine.

mod builder;
pub(crate) mod headers;
mod query;

pub use self::builder::RequestBuilder;
pub use self::query::build_url;

use encoding_rs::Encoding;
use std::collections::HashMap;
use std::fmt;

use crate::error::HrqError;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// GET never carries a body; DELETE may.
    pub fn allows_body(self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frozen description of one request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    url_parameters: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
    policy: RetryPolicy,
    encoding: &'static Encoding,
}

impl RequestDescriptor {
    pub fn method(&self) -> Method {
        self.method
    }

    /// Base URL, without the query parameters.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn url_parameters(&self) -> &HashMap<String, String> {
        &self.url_parameters
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// URL sent on the wire: base URL plus query parameters.
    pub fn final_url(&self) -> Result<String, HrqError> {
        build_url(&self.url, &self.url_parameters)
    }
}
