//! CLI for the hrq request engine.

mod args;
mod commands;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hrq_core::config;
use hrq_core::Method;
use std::path::PathBuf;

pub use args::RequestArgs;
use commands::{run_queue, run_send};
use session::Session;

/// Top-level CLI for hrq.
#[derive(Debug, Parser)]
#[command(name = "hrq")]
#[command(about = "hrq: asynchronous HTTP requests with retry and backoff", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/hrq/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Send a GET request and print the response body.
    Get {
        url: String,
        #[command(flatten)]
        args: RequestArgs,
    },

    /// Send a POST request.
    Post {
        url: String,
        /// Request body (sent as application/json unless a Content-Type header is given).
        #[arg(long, short = 'd')]
        body: String,
        #[command(flatten)]
        args: RequestArgs,
    },

    /// Send a PUT request.
    Put {
        url: String,
        /// Request body.
        #[arg(long, short = 'd')]
        body: String,
        #[command(flatten)]
        args: RequestArgs,
    },

    /// Send a DELETE request, optionally with a body.
    Delete {
        url: String,
        /// Optional request body.
        #[arg(long, short = 'd')]
        body: Option<String>,
        #[command(flatten)]
        args: RequestArgs,
    },

    /// GET several URLs one after another; stops at the first failure.
    Queue {
        /// URLs to fetch, in order.
        #[arg(required = true)]
        urls: Vec<String>,
        #[command(flatten)]
        args: RequestArgs,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_or_init_at(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);
        let session = Session::start(&cfg)?;

        let result = match cli.command {
            CliCommand::Get { url, args } => run_send(&session, Method::Get, &url, None, &args).await,
            CliCommand::Post { url, body, args } => {
                run_send(&session, Method::Post, &url, Some(body), &args).await
            }
            CliCommand::Put { url, body, args } => {
                run_send(&session, Method::Put, &url, Some(body), &args).await
            }
            CliCommand::Delete { url, body, args } => {
                run_send(&session, Method::Delete, &url, body, &args).await
            }
            CliCommand::Queue { urls, args } => run_queue(&session, &urls, &args).await,
        };
        session.shutdown();
        result
    }
}

#[cfg(test)]
mod tests;
