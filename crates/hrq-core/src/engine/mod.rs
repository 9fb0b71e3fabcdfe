//! Request engine: submission, retries, cancellation and callback delivery.
//!
//! Lifecycle of a request code:
//!
//! ```text
//! Pending -> (Retrying)* -> Completed | Failed | Cancelled
//! ```
//!
//! Every transition out of `Pending`/`Retrying` goes through the registry.
//! Completion removes the entry before the callback is dispatched, so a
//! request that is cancelled first never reaches its callback.

mod complete;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;

use crate::callback::{Outcome, RequestCallback};
use crate::code::{RequestCode, RequestCodeGenerator, DEFAULT_CODE_CEILING};
use crate::config::PersistentConfig;
use crate::dispatch::{Dispatcher, Inline};
use crate::error::HrqError;
use crate::registry::RequestRegistry;
use crate::request::{Method, RequestBuilder, RequestDescriptor};
use crate::transport::{Cancel, PreparedRequest, Transport};

const COMPONENT: &str = "RequestEngine";

/// What the engine needs to (re)issue a request.
struct Submitted {
    descriptor: RequestDescriptor,
    url: String,
}

/// Run when a request is cancelled through [`RequestEngine::cancel`].
pub(crate) type CancelHook = Box<dyn FnOnce() + Send + 'static>;

/// State of one in-flight request.
struct InFlight {
    /// Distinguishes this request from an earlier one that used the same code.
    ticket: u64,
    attempt: u32,
    submitted: Arc<Submitted>,
    callback: Arc<dyn RequestCallback>,
    cancel: Option<Box<dyn Cancel>>,
    on_cancel: Option<CancelHook>,
}

/// Registry entry for one live code.
enum Slot {
    Request(InFlight),
    /// Code held by a running queue.
    Queue { ticket: u64, handle: Box<dyn Cancel> },
}

impl Slot {
    fn is_attempt(&self, ticket: u64, attempt: u32) -> bool {
        matches!(self, Slot::Request(e) if e.ticket == ticket && e.attempt == attempt)
    }
}

/// A code held for a queue until [`RequestEngine::release_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reservation {
    pub code: RequestCode,
    ticket: u64,
}

/// Configures a [`RequestEngine`] before it is created.
pub struct EngineBuilder {
    config: Arc<PersistentConfig>,
    dispatcher: Arc<dyn Dispatcher>,
    code_ceiling: RequestCode,
}

impl EngineBuilder {
    /// Where callbacks run. Defaults to [`Inline`].
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Request codes wrap back to 1 after this value.
    pub fn code_ceiling(mut self, ceiling: RequestCode) -> Self {
        self.code_ceiling = ceiling;
        self
    }

    pub fn build(self) -> Arc<RequestEngine> {
        Arc::new_cyclic(|me| RequestEngine {
            me: me.clone(),
            config: self.config,
            dispatcher: self.dispatcher,
            codes: RequestCodeGenerator::with_ceiling(self.code_ceiling),
            tickets: AtomicU64::new(0),
            registry: RequestRegistry::new(),
            transport: RwLock::new(None),
        })
    }
}

pub struct RequestEngine {
    me: Weak<RequestEngine>,
    config: Arc<PersistentConfig>,
    dispatcher: Arc<dyn Dispatcher>,
    codes: RequestCodeGenerator,
    tickets: AtomicU64,
    registry: RequestRegistry<Slot>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
}

impl RequestEngine {
    /// Engine with inline callback delivery and the default code ceiling.
    pub fn new(config: Arc<PersistentConfig>) -> Arc<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: Arc<PersistentConfig>) -> EngineBuilder {
        EngineBuilder {
            config,
            dispatcher: Arc::new(Inline),
            code_ceiling: DEFAULT_CODE_CEILING,
        }
    }

    /// Install the transport. No-op if already initialised.
    pub fn init(&self, transport: Arc<dyn Transport>) {
        let mut slot = self.transport.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(transport);
            tracing::debug!("request engine initialised");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.current_transport().is_some()
    }

    /// Drop the transport and cancel everything in flight without callbacks.
    /// The engine can be initialised again afterwards.
    pub fn teardown(&self) {
        self.transport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let drained = self.registry.drain();
        if !drained.is_empty() {
            tracing::info!("teardown cancelled {} in-flight request(s)", drained.len());
        }
        for (_, slot) in drained {
            match slot {
                Slot::Request(entry) => {
                    if let Some(handle) = entry.cancel {
                        handle.cancel();
                    }
                }
                Slot::Queue { handle, .. } => handle.cancel(),
            }
        }
    }

    pub fn config(&self) -> &Arc<PersistentConfig> {
        &self.config
    }

    /// Number of live codes: requests in flight plus running queues.
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    /// Start building a request from the current config defaults.
    pub fn request(&self, method: Method, url: impl Into<String>) -> Result<RequestBuilder, HrqError> {
        RequestBuilder::new(&self.config, method, url)
    }

    /// Submit `descriptor`; `callback` receives its outcome.
    ///
    /// Returns as soon as the first attempt is handed to the transport.
    /// Precondition violations are returned here; everything after is
    /// reported through the callback.
    pub fn submit(
        &self,
        descriptor: RequestDescriptor,
        callback: Arc<dyn RequestCallback>,
    ) -> Result<RequestCode, HrqError> {
        self.submit_with_hook(descriptor, callback, None)
    }

    /// Like [`RequestEngine::submit`]; `on_cancel` runs if the request is
    /// later cancelled through [`RequestEngine::cancel`] (not on teardown).
    pub(crate) fn submit_with_hook(
        &self,
        descriptor: RequestDescriptor,
        callback: Arc<dyn RequestCallback>,
        on_cancel: Option<CancelHook>,
    ) -> Result<RequestCode, HrqError> {
        let transport = self
            .current_transport()
            .ok_or(HrqError::NotInitialized(COMPONENT))?;
        if !self.config.is_initialized() {
            return Err(HrqError::NotInitialized("PersistentConfig"));
        }
        let url = descriptor.final_url()?;

        let submitted = Arc::new(Submitted { descriptor, url });
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let code = self.allocate(Slot::Request(InFlight {
            ticket,
            attempt: 0,
            submitted: Arc::clone(&submitted),
            callback,
            cancel: None,
            on_cancel,
        }))?;

        tracing::debug!(
            code,
            "submitting {} {}",
            submitted.descriptor.method(),
            submitted.url
        );
        let timeout = submitted.descriptor.policy().timeout(0);
        self.start_attempt(transport.as_ref(), code, ticket, 0, timeout, &submitted);
        Ok(code)
    }

    /// Cancel a live request or queue. Returns false if `code` is not live
    /// (already finished, already cancelled, or never issued).
    pub fn cancel(&self, code: RequestCode) -> bool {
        match self.registry.remove(code) {
            Some(Slot::Request(entry)) => {
                if let Some(handle) = entry.cancel {
                    handle.cancel();
                }
                tracing::debug!(code, "request cancelled");
                if let Some(hook) = entry.on_cancel {
                    hook();
                }
                true
            }
            Some(Slot::Queue { handle, .. }) => {
                tracing::debug!(code, "queue cancelled");
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Hold a code for a queue; `handle` is cancelled if the code is
    /// cancelled or the engine torn down.
    pub(crate) fn reserve_code(&self, handle: Box<dyn Cancel>) -> Result<Reservation, HrqError> {
        if !self.is_initialized() {
            return Err(HrqError::NotInitialized(COMPONENT));
        }
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let code = self.allocate(Slot::Queue { ticket, handle })?;
        Ok(Reservation { code, ticket })
    }

    /// Give back a reserved code. Returns false if it was cancelled meanwhile.
    pub(crate) fn release_code(&self, reservation: &Reservation) -> bool {
        self.registry
            .remove_if(reservation.code, |slot| {
                matches!(slot, Slot::Queue { ticket, .. } if *ticket == reservation.ticket)
            })
            .is_some()
    }

    /// Register `slot` under the next code that is not live.
    fn allocate(&self, mut slot: Slot) -> Result<RequestCode, HrqError> {
        for _ in 0..self.codes.ceiling() {
            let candidate = self.codes.generate();
            match self.registry.try_insert(candidate, slot) {
                Ok(()) => return Ok(candidate),
                Err(back) => {
                    tracing::debug!("request code {} still in flight, skipping", candidate);
                    slot = back;
                }
            }
        }
        Err(HrqError::CodesExhausted(self.codes.ceiling()))
    }

    pub(crate) fn deliver(&self, code: RequestCode, callback: Arc<dyn RequestCallback>, outcome: Outcome) {
        self.dispatcher.dispatch(Box::new(move || match outcome {
            Outcome::Complete(text) => callback.on_request_complete(code, text),
            Outcome::Failed(error) => callback.on_request_failed(code, error),
        }));
    }

    pub(crate) fn dispatch(&self, job: crate::dispatch::Job) {
        self.dispatcher.dispatch(job);
    }

    fn current_transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Hand attempt `attempt` to the transport and remember its cancel handle.
    fn start_attempt(
        &self,
        transport: &dyn Transport,
        code: RequestCode,
        ticket: u64,
        attempt: u32,
        timeout: Duration,
        submitted: &Submitted,
    ) {
        let descriptor = &submitted.descriptor;
        let request = PreparedRequest {
            code,
            attempt,
            method: descriptor.method(),
            url: submitted.url.clone(),
            headers: descriptor.headers().clone(),
            body: descriptor.body().map(<[u8]>::to_vec),
            timeout,
        };

        let engine = self.me.clone();
        let handle = transport.enqueue(
            request,
            Box::new(move |result| {
                if let Some(engine) = engine.upgrade() {
                    engine.on_attempt_done(code, ticket, attempt, result);
                }
            }),
        );

        // The entry may already be gone: cancelled meanwhile, or settled by a
        // transport that completed synchronously. Either way stop the work.
        let mut handle = Some(handle);
        self.registry.with_mut(code, |slot| {
            if let Slot::Request(entry) = slot {
                if entry.ticket == ticket && entry.attempt == attempt {
                    entry.cancel = handle.take();
                }
            }
        });
        if let Some(orphan) = handle {
            orphan.cancel();
        }
    }

    /// GET `url` with the default timeout.
    pub fn get(&self, callback: Arc<dyn RequestCallback>, url: &str) -> Result<RequestCode, HrqError> {
        self.simple(Method::Get, callback, url, None, None)
    }

    pub fn get_with_timeout(
        &self,
        callback: Arc<dyn RequestCallback>,
        url: &str,
        timeout: Duration,
    ) -> Result<RequestCode, HrqError> {
        self.simple(Method::Get, callback, url, None, Some(timeout))
    }

    pub fn post(
        &self,
        callback: Arc<dyn RequestCallback>,
        url: &str,
        body: impl Into<Vec<u8>>,
    ) -> Result<RequestCode, HrqError> {
        self.simple(Method::Post, callback, url, Some(body.into()), None)
    }

    pub fn post_with_timeout(
        &self,
        callback: Arc<dyn RequestCallback>,
        url: &str,
        body: impl Into<Vec<u8>>,
        timeout: Duration,
    ) -> Result<RequestCode, HrqError> {
        self.simple(Method::Post, callback, url, Some(body.into()), Some(timeout))
    }

    pub fn put(
        &self,
        callback: Arc<dyn RequestCallback>,
        url: &str,
        body: impl Into<Vec<u8>>,
    ) -> Result<RequestCode, HrqError> {
        self.simple(Method::Put, callback, url, Some(body.into()), None)
    }

    pub fn put_with_timeout(
        &self,
        callback: Arc<dyn RequestCallback>,
        url: &str,
        body: impl Into<Vec<u8>>,
        timeout: Duration,
    ) -> Result<RequestCode, HrqError> {
        self.simple(Method::Put, callback, url, Some(body.into()), Some(timeout))
    }

    /// DELETE without a body; use [`RequestEngine::request`] to send one.
    pub fn delete(&self, callback: Arc<dyn RequestCallback>, url: &str) -> Result<RequestCode, HrqError> {
        self.simple(Method::Delete, callback, url, None, None)
    }

    pub fn delete_with_timeout(
        &self,
        callback: Arc<dyn RequestCallback>,
        url: &str,
        timeout: Duration,
    ) -> Result<RequestCode, HrqError> {
        self.simple(Method::Delete, callback, url, None, Some(timeout))
    }

    fn simple(
        &self,
        method: Method,
        callback: Arc<dyn RequestCallback>,
        url: &str,
        body: Option<Vec<u8>>,
        timeout: Option<Duration>,
    ) -> Result<RequestCode, HrqError> {
        let mut builder = self.request(method, url)?;
        if let Some(body) = body {
            builder = builder.body(body);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        self.submit(builder.build(), callback)
    }
}
