//! Builder for [`RequestDescriptor`].

use serde::Serialize;
use std::time::Duration;

use super::headers::{has_header, set_header};
use super::{Method, RequestDescriptor};
use crate::config::{Defaults, PersistentConfig};
use crate::encoding;
use crate::error::HrqError;
use crate::retry::{is_valid_backoff, RetryPolicy};

const CONTENT_TYPE: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Collects per-request overrides on top of a config snapshot.
///
/// The builder owns its snapshot: changes to the config made after
/// [`RequestBuilder::new`] do not reach it.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: String,
    defaults: Defaults,
    body: Option<Vec<u8>>,
}

impl RequestBuilder {
    /// Start a request from the current config defaults.
    pub fn new(
        config: &PersistentConfig,
        method: Method,
        url: impl Into<String>,
    ) -> Result<Self, HrqError> {
        Ok(Self::with_defaults(config.snapshot()?, method, url))
    }

    /// Start a request from an explicit defaults snapshot.
    pub fn with_defaults(defaults: Defaults, method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            defaults,
            body: None,
        }
    }

    /// Add or override a header for this request only. Names compare
    /// case-insensitively, so this replaces a persistent `accept` too.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.defaults.headers, name.into(), value.into());
        self
    }

    /// Add or override a query parameter for this request only.
    pub fn url_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.url_parameters.insert(key.into(), value.into());
        self
    }

    /// Raw body bytes. Dropped for GET.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        Ok(self.body(bytes))
    }

    /// Timeout of the first attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.defaults.max_retries = max_retries;
        self
    }

    /// Ignored unless positive and finite.
    pub fn backoff_multiplier(mut self, backoff_multiplier: f32) -> Self {
        if is_valid_backoff(backoff_multiplier) {
            self.defaults.backoff_multiplier = backoff_multiplier;
        } else {
            tracing::debug!("ignoring invalid backoff multiplier {}", backoff_multiplier);
        }
        self
    }

    /// Response charset. Unknown labels are ignored and the current charset kept.
    pub fn encoding(mut self, label: &str) -> Self {
        match encoding::lookup(label) {
            Some(enc) => self.defaults.encoding = enc,
            None => tracing::debug!("ignoring unknown encoding {:?}", label),
        }
        self
    }

    /// Freeze into a descriptor.
    pub fn build(self) -> RequestDescriptor {
        let Defaults {
            timeout,
            max_retries,
            backoff_multiplier,
            encoding,
            mut headers,
            url_parameters,
        } = self.defaults;

        let body = if self.method.allows_body() {
            self.body
        } else {
            if self.body.is_some() {
                tracing::debug!("dropping body on {} {}", self.method, self.url);
            }
            None
        };
        if body.is_some() && !has_header(&headers, CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string());
        }

        RequestDescriptor {
            method: self.method,
            url: self.url,
            url_parameters,
            headers,
            body,
            policy: RetryPolicy::new(timeout, max_retries, backoff_multiplier),
            encoding,
        }
    }
}
