//! Shared `reqwest::Client` construction, grounded on the teacher's
//! `HttpConfig::build_client` (one timeout-bounded client per provider,
//! reused across requests rather than built per call).

use std::time::Duration;

use crate::error::{ClientError, Result};

#[derive(Clone, Copy)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub pool_idle_timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 60, pool_idle_timeout_secs: 90, pool_max_idle_per_host: 32 }
    }
}

impl HttpConfig {
    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        Self { timeout_secs, ..Self::default() }
    }

    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(self.pool_idle_timeout_secs))
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .build()
            .map_err(|e| ClientError::request("client builder", e))
    }
}
