//! Engine wiring shared by all request commands.

use anyhow::Result;
use hrq_core::config::HrqConfig;
use hrq_core::transport::CurlTransport;
use hrq_core::{PersistentConfig, RequestEngine};
use std::sync::Arc;

pub struct Session {
    pub engine: Arc<RequestEngine>,
}

impl Session {
    /// Initialise persistent defaults from `cfg` and an engine backed by libcurl.
    pub fn start(cfg: &HrqConfig) -> Result<Self> {
        let config = Arc::new(PersistentConfig::new());
        config.init_from(cfg);
        let engine = RequestEngine::builder(Arc::clone(&config))
            .code_ceiling(cfg.code_ceiling)
            .build();
        let transport = CurlTransport::from_current(cfg.max_concurrent_requests)?;
        engine.init(Arc::new(transport));
        Ok(Self { engine })
    }

    pub fn shutdown(&self) {
        self.engine.teardown();
        self.engine.config().teardown();
    }
}
