//! Per-request options shared by every request subcommand.

use anyhow::{bail, Context, Result};
use clap::Args;
use hrq_core::RequestBuilder;
use std::time::Duration;

#[derive(Debug, Clone, Default, Args)]
pub struct RequestArgs {
    /// Extra header, as "Name: value". Repeatable.
    #[arg(long = "header", short = 'H', value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Extra query parameter, as "key=value". Repeatable.
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Timeout of the first attempt in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Retries after the first attempt (network errors only).
    #[arg(long)]
    pub retries: Option<u32>,

    /// Timeout multiplier applied per retry.
    #[arg(long)]
    pub backoff: Option<f32>,

    /// Charset used to decode the response (e.g. UTF-8, ISO-8859-1).
    #[arg(long)]
    pub encoding: Option<String>,
}

impl RequestArgs {
    /// Apply the overrides on top of the config defaults already in `builder`.
    pub fn apply(&self, mut builder: RequestBuilder) -> Result<RequestBuilder> {
        for raw in &self.headers {
            let (name, value) = split_header(raw)?;
            builder = builder.header(name, value);
        }
        for raw in &self.params {
            let (key, value) = split_param(raw)?;
            builder = builder.url_parameter(key, value);
        }
        if let Some(ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(retries) = self.retries {
            builder = builder.max_retries(retries);
        }
        if let Some(backoff) = self.backoff {
            if !hrq_core::retry::is_valid_backoff(backoff) {
                bail!("backoff must be a positive number, got {}", backoff);
            }
            builder = builder.backoff_multiplier(backoff);
        }
        if let Some(label) = &self.encoding {
            if !hrq_core::encoding::is_supported(label) {
                bail!("unknown encoding: {}", label);
            }
            builder = builder.encoding(label);
        }
        Ok(builder)
    }
}

pub(crate) fn split_header(raw: &str) -> Result<(&str, &str)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("header must look like 'Name: value', got {:?}", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("header name is empty in {:?}", raw);
    }
    Ok((name, value.trim()))
}

pub(crate) fn split_param(raw: &str) -> Result<(&str, &str)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("parameter must look like 'key=value', got {:?}", raw))?;
    if key.is_empty() {
        bail!("parameter key is empty in {:?}", raw);
    }
    Ok((key, value))
}
