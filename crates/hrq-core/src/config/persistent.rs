//! Runtime defaults applied to every new request.
//!
//! A `PersistentConfig` starts uninitialised. `init` installs defaults,
//! `teardown` drops them again. Every other call made while uninitialised
//! returns [`HrqError::NotInitialized`]. Builders take a snapshot at
//! construction, so later changes never reach requests already built.

use encoding_rs::Encoding;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use super::HrqConfig;
use crate::encoding::{self, DEFAULT_ENCODING};
use crate::error::HrqError;
use crate::request::headers::{remove_header, set_header};
use crate::retry::{is_valid_backoff, RetryPolicy};

const COMPONENT: &str = "PersistentConfig";

/// Snapshot of the defaults a new request starts from.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_multiplier: f32,
    pub encoding: &'static Encoding,
    pub headers: HashMap<String, String>,
    pub url_parameters: HashMap<String, String>,
}

impl Default for Defaults {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            timeout: policy.initial_timeout,
            max_retries: policy.max_retries,
            backoff_multiplier: policy.backoff_multiplier,
            encoding: DEFAULT_ENCODING,
            headers: HashMap::new(),
            url_parameters: HashMap::new(),
        }
    }
}

impl Defaults {
    /// Defaults from the config file. An unknown encoding falls back to UTF-8
    /// and an invalid backoff to the built-in multiplier.
    pub fn from_config(cfg: &HrqConfig) -> Self {
        let encoding = encoding::lookup(&cfg.encoding).unwrap_or_else(|| {
            tracing::warn!("unknown encoding {:?} in config, using UTF-8", cfg.encoding);
            DEFAULT_ENCODING
        });
        let backoff_multiplier = if is_valid_backoff(cfg.backoff_multiplier) {
            cfg.backoff_multiplier
        } else {
            let fallback = RetryPolicy::default().backoff_multiplier;
            tracing::warn!(
                "invalid backoff_multiplier {} in config, using {}",
                cfg.backoff_multiplier,
                fallback
            );
            fallback
        };
        let mut headers = HashMap::new();
        for (name, value) in &cfg.headers {
            set_header(&mut headers, name.clone(), value.clone());
        }
        Self {
            timeout: Duration::from_millis(cfg.timeout_ms),
            max_retries: cfg.max_retries,
            backoff_multiplier,
            encoding,
            headers,
            url_parameters: cfg.url_parameters.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PersistentConfig {
    state: RwLock<Option<Defaults>>,
}

impl PersistentConfig {
    /// Uninitialised config; call `init` before building requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialise with built-in defaults. No-op if already initialised.
    pub fn init(&self) {
        self.init_with(Defaults::default());
    }

    /// Initialise with the given defaults. No-op if already initialised.
    pub fn init_with(&self, defaults: Defaults) {
        let mut state = self.write();
        if state.is_none() {
            *state = Some(defaults);
        }
    }

    /// Initialise from the on-disk config. No-op if already initialised.
    pub fn init_from(&self, cfg: &HrqConfig) {
        self.init_with(Defaults::from_config(cfg));
    }

    /// Drop all defaults; the config must be initialised again before use.
    pub fn teardown(&self) {
        *self.write() = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.read().is_some()
    }

    /// Copy of the current defaults.
    pub fn snapshot(&self) -> Result<Defaults, HrqError> {
        self.read().clone().ok_or(HrqError::NotInitialized(COMPONENT))
    }

    pub fn set_default_timeout(&self, timeout: Duration) -> Result<(), HrqError> {
        self.update(|d| d.timeout = timeout)
    }

    pub fn set_default_retries(&self, max_retries: u32) -> Result<(), HrqError> {
        self.update(|d| d.max_retries = max_retries)
    }

    /// Set the backoff multiplier. Returns `Ok(false)` and keeps the current
    /// one when `backoff_multiplier` is not positive and finite.
    pub fn set_default_backoff(&self, backoff_multiplier: f32) -> Result<bool, HrqError> {
        self.update(|d| {
            if !is_valid_backoff(backoff_multiplier) {
                return false;
            }
            d.backoff_multiplier = backoff_multiplier;
            true
        })
    }

    /// Set the response charset. Returns `Ok(false)` and leaves the current
    /// charset in place when `name` is not a known charset.
    pub fn set_encoding(&self, name: &str) -> Result<bool, HrqError> {
        let found = encoding::lookup(name);
        self.update(|d| match found {
            Some(enc) => {
                d.encoding = enc;
                true
            }
            None => false,
        })
    }

    /// Name of the current response charset.
    pub fn encoding(&self) -> Result<&'static str, HrqError> {
        self.snapshot().map(|d| d.encoding.name())
    }

    /// Add a header sent with every request, replacing any previous value
    /// under the same name in any letter case.
    pub fn add_persistent_header(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), HrqError> {
        let (name, value) = (name.into(), value.into());
        self.update(|d| set_header(&mut d.headers, name, value))
    }

    /// Returns true if the header was present. Names compare case-insensitively.
    pub fn remove_persistent_header(&self, name: &str) -> Result<bool, HrqError> {
        self.update(|d| remove_header(&mut d.headers, name))
    }

    /// Add a query parameter appended to every request URL, replacing any previous value.
    pub fn add_persistent_url_parameter(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), HrqError> {
        let (key, value) = (key.into(), value.into());
        self.update(|d| {
            d.url_parameters.insert(key, value);
        })
    }

    /// Returns true if the parameter was present.
    pub fn remove_persistent_url_parameter(&self, key: &str) -> Result<bool, HrqError> {
        self.update(|d| d.url_parameters.remove(key).is_some())
    }

    fn update<T>(&self, f: impl FnOnce(&mut Defaults) -> T) -> Result<T, HrqError> {
        let mut state = self.write();
        let defaults = state.as_mut().ok_or(HrqError::NotInitialized(COMPONENT))?;
        Ok(f(defaults))
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Defaults>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Defaults>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
