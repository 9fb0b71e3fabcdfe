//! CLI command handlers. Each command is in its own file.

mod queue;
mod send;

pub use queue::run_queue;
pub use send::run_send;
