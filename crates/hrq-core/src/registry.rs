//! Registry of in-flight requests keyed by request code.
//!
//! The registry is the single arbiter between completion and cancellation:
//! whichever side removes an entry first owns the terminal transition, the
//! other finds nothing and does nothing. Entries are only ever removed
//! explicitly.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::code::RequestCode;

/// Map of request code -> in-flight state, serialised by a mutex.
///
/// Closures passed to [`RequestRegistry::with_mut`] run under the lock and
/// must not call back into the registry.
#[derive(Debug)]
pub struct RequestRegistry<E> {
    entries: Mutex<HashMap<RequestCode, E>>,
}

impl<E> Default for RequestRegistry<E> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<E> RequestRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry` under `code`. Hands the entry back if the code is
    /// still in flight.
    pub fn try_insert(&self, code: RequestCode, entry: E) -> Result<(), E> {
        let mut entries = self.lock();
        if entries.contains_key(&code) {
            return Err(entry);
        }
        entries.insert(code, entry);
        Ok(())
    }

    /// Unregister `code`, returning its entry if it was still live.
    pub fn remove(&self, code: RequestCode) -> Option<E> {
        self.lock().remove(&code)
    }

    /// Unregister `code` only if its entry satisfies `pred`.
    pub fn remove_if(&self, code: RequestCode, pred: impl FnOnce(&E) -> bool) -> Option<E> {
        let mut entries = self.lock();
        match entries.get(&code) {
            Some(entry) if pred(entry) => entries.remove(&code),
            _ => None,
        }
    }

    /// Run `f` on the live entry for `code`, if any.
    pub fn with_mut<R>(&self, code: RequestCode, f: impl FnOnce(&mut E) -> R) -> Option<R> {
        self.lock().get_mut(&code).map(f)
    }

    pub fn contains(&self, code: RequestCode) -> bool {
        self.lock().contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Unregister everything (used on teardown).
    pub fn drain(&self) -> Vec<(RequestCode, E)> {
        self.lock().drain().collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RequestCode, E>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
