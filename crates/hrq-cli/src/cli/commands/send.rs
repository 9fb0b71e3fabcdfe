//! `hrq get|post|put|delete <url>` – send one request and print the response.

use anyhow::{bail, Result};
use hrq_core::{Method, Outcome, RequestCode};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cli::args::RequestArgs;
use crate::cli::session::Session;

pub async fn run_send(
    session: &Session,
    method: Method,
    url: &str,
    body: Option<String>,
    args: &RequestArgs,
) -> Result<()> {
    let engine = &session.engine;
    let mut builder = args.apply(engine.request(method, url)?)?;
    if let Some(body) = body {
        builder = builder.body(body);
    }
    let descriptor = builder.build();
    tracing::debug!(
        "{} {} (timeout {:?}, retries {})",
        method,
        url,
        descriptor.policy().initial_timeout,
        descriptor.policy().max_retries
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<(RequestCode, Outcome)>();
    let code = engine.submit(descriptor, Arc::new(tx))?;

    tokio::select! {
        received = rx.recv() => match received {
            Some((_, Outcome::Complete(text))) => {
                println!("{}", text);
                Ok(())
            }
            Some((_, Outcome::Failed(err))) => match err.status_code() {
                Some(status) => bail!("HTTP {}: {}", status, err.message()),
                None => bail!("{}", err.message()),
            },
            None => bail!("request {} ended without a result", code),
        },
        _ = tokio::signal::ctrl_c() => {
            engine.cancel(code);
            bail!("request {} cancelled", code)
        }
    }
}
