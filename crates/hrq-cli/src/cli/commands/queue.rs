//! `hrq queue <url>...` – GET each URL in turn, printing every body.

use anyhow::{bail, Result};
use hrq_core::queue::{QueueCallback, RequestQueue};
use hrq_core::{Method, RequestCode, RequestError};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cli::args::RequestArgs;
use crate::cli::session::Session;

enum QueueEvent {
    Completed(Vec<String>),
    Failed(usize, RequestError),
}

struct Forward(mpsc::UnboundedSender<QueueEvent>);

impl QueueCallback for Forward {
    fn on_queue_completed(&self, _queue_code: RequestCode, results: Vec<String>) {
        let _ = self.0.send(QueueEvent::Completed(results));
    }

    fn on_queue_request_failed(&self, _queue_code: RequestCode, index: usize, error: RequestError) {
        let _ = self.0.send(QueueEvent::Failed(index, error));
    }
}

pub async fn run_queue(session: &Session, urls: &[String], args: &RequestArgs) -> Result<()> {
    let engine = &session.engine;
    let mut queue = RequestQueue::new();
    for url in urls {
        queue.push(args.apply(engine.request(Method::Get, url.as_str())?)?.build());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let queue_code = queue.execute(engine, Arc::new(Forward(tx)))?;
    tracing::debug!(queue_code, "queued {} request(s)", urls.len());

    tokio::select! {
        event = rx.recv() => match event {
            Some(QueueEvent::Completed(results)) => {
                for text in results {
                    println!("{}", text);
                }
                Ok(())
            }
            Some(QueueEvent::Failed(index, err)) => {
                bail!("request {} ({}) failed: {}", index + 1, urls[index], err)
            }
            None => bail!("queue {} ended without a result", queue_code),
        },
        _ = tokio::signal::ctrl_c() => {
            engine.cancel(queue_code);
            bail!("queue {} interrupted", queue_code)
        }
    }
}
