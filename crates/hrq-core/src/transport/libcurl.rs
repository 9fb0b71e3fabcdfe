//! libcurl transport.
//!
//! Each attempt runs as one `curl::easy::Easy` transfer on the tokio
//! blocking pool. A semaphore caps how many transfers run at once; attempts
//! beyond that wait their turn, which gives the pooled-client queue.

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

use super::{AbortToken, Cancel, Completion, PreparedRequest, Transport, TransportResponse, TransportResult};
use crate::request::Method;
use crate::retry::TransportFailure;

const MAX_REDIRECTS: u32 = 10;

pub struct CurlTransport {
    runtime: Handle,
    permits: Arc<Semaphore>,
}

impl CurlTransport {
    /// Transport running on `runtime` with at most `max_concurrent` transfers.
    pub fn new(runtime: Handle, max_concurrent: usize) -> Self {
        Self {
            runtime,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Transport bound to the runtime this is called from.
    pub fn from_current(max_concurrent: usize) -> anyhow::Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| anyhow::anyhow!("curl transport needs a tokio runtime: {}", e))?;
        Ok(Self::new(runtime, max_concurrent))
    }
}

impl Transport for CurlTransport {
    fn enqueue(&self, request: PreparedRequest, on_done: Completion) -> Box<dyn Cancel> {
        let token = AbortToken::new();
        let abort = token.clone();
        let permits = Arc::clone(&self.permits);

        self.runtime.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_) if abort.is_aborted() => Err(TransportFailure::Aborted),
                Ok(permit) => {
                    let joined = tokio::task::spawn_blocking(move || {
                        let _permit = permit;
                        perform(&request, &abort)
                    })
                    .await;
                    joined.unwrap_or_else(|e| {
                        Err(TransportFailure::Other(format!("transfer task join: {}", e)))
                    })
                }
                Err(_) => Err(TransportFailure::Other("transport closed".to_string())),
            };
            on_done(result);
        });

        Box::new(token)
    }
}

/// Runs one transfer on the current thread.
fn perform(request: &PreparedRequest, abort: &AbortToken) -> TransportResult {
    tracing::debug!(
        code = request.code,
        attempt = request.attempt,
        "{} {} (timeout {:?})",
        request.method,
        request.url,
        request.timeout
    );

    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    easy.url(&request.url)?;
    match request.method {
        Method::Get => easy.get(true)?,
        Method::Post => easy.post(true)?,
        Method::Put => easy.custom_request("PUT")?,
        Method::Delete => easy.custom_request("DELETE")?,
    }
    match (&request.body, request.method) {
        (Some(payload), _) => easy.post_fields_copy(payload)?,
        (None, Method::Post | Method::Put) => easy.post_fields_copy(&[])?,
        (None, _) => {}
    }
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTS)?;
    easy.timeout(request.timeout)?;
    easy.connect_timeout(request.timeout.min(Duration::from_secs(30)))?;

    let mut list = curl::easy::List::new();
    for (k, v) in &request.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !request.headers.is_empty() {
        easy.http_headers(list)?;
    }
    easy.progress(true)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        // Returning false aborts the transfer with CURLE_ABORTED_BY_CALLBACK.
        transfer.progress_function(|_, _, _, _| !abort.is_aborted())?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    if (200..300).contains(&status) {
        Ok(TransportResponse { status, body })
    } else {
        Err(TransportFailure::Status { code: status, body })
    }
}
