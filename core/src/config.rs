//! Configuration loading with env-var overrides.
//!
//! Reads a TOML file (default `config/default.toml` relative to the
//! current working directory) and applies `INGESTD_*` environment
//! overrides for the handful of values operators need to flip without
//! editing the file (queue URL, worker count, log level).

use std::path::Path;

use serde::Deserialize;

use crate::error::{IngestError, Result};

/// Retry knobs shared by every HTTP-speaking client (§7 error table:
/// transient network errors retry with backoff; permanent ones do not).
/// Each external-service config section embeds its own copy so an
/// operator can tune, say, the embedding service's patience separately
/// from the index's without a single global knob.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_attempts")]
    pub attempts: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { attempts: default_retry_attempts(), base_delay_ms: default_retry_base_delay_ms() }
    }
}

/// Object-store access (§6 "Object store").
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default = "default_object_get_timeout_secs")]
    pub get_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_object_get_timeout_secs() -> u64 {
    60
}

/// Event-queue access (§6 "Event queue").
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_false")]
    pub enabled: bool,
    pub url: String,
    #[serde(default = "default_queue_poll_timeout_secs")]
    pub long_poll_timeout_secs: u64,
    #[serde(default = "default_queue_max_messages")]
    pub max_messages: u32,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_queue_poll_timeout_secs() -> u64 {
    20
}

fn default_queue_max_messages() -> u32 {
    10
}

/// Which backend services the OCR step (§4.A "fast" vs "llm" path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrMode {
    Fast,
    Llm,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub mode: OcrMode,
    /// Base URL for the fast-path `POST /ocr` endpoint.
    #[serde(default)]
    pub fast_endpoint: Option<String>,
    /// Base URL for the OpenAI-compatible chat-completions endpoint used by the LLM path.
    #[serde(default)]
    pub llm_endpoint: Option<String>,
    #[serde(default)]
    pub llm_model: Option<String>,
    #[serde(default = "default_ocr_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_ocr_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(default = "default_true")]
    pub normalize: bool,
    #[serde(default = "default_embedding_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_embedding_timeout_secs() -> u64 {
    30
}

fn default_embedding_batch_size() -> usize {
    32
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    pub endpoint: String,
    pub name: String,
    #[serde(default = "default_index_timeout_secs")]
    pub upsert_timeout_secs: u64,
    /// Dense-vector dimension declared in the index mapping (§6 "Search
    /// index"). Must match the embedding backend's output length.
    #[serde(default = "default_vector_dimension")]
    pub vector_dimension: usize,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_index_timeout_secs() -> u64 {
    30
}

fn default_vector_dimension() -> usize {
    1536
}

/// Pipeline concurrency and retry knobs (§4 "Scheduling model", §7 error table).
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Window size and overlap for chunking, both in whitespace-delimited words (§4.B).
    #[serde(default = "default_chunk_window")]
    pub chunk_window: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            chunk_window: default_chunk_window(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_worker_count() -> usize {
    4
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

fn default_chunk_window() -> usize {
    512
}

fn default_chunk_overlap() -> usize {
    50
}

/// Source toggles and the reconciliation sweep interval (§4 "Event Coordinator").
#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(default = "default_false")]
    pub full_scan_enabled: bool,
    #[serde(default = "default_true")]
    pub reconcile_enabled: bool,
    #[serde(default = "default_reconcile_interval_hours")]
    pub reconcile_interval_hours: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            full_scan_enabled: default_false(),
            reconcile_enabled: default_true(),
            reconcile_interval_hours: default_reconcile_interval_hours(),
        }
    }
}

fn default_reconcile_interval_hours() -> u64 {
    6
}

/// Fully-resolved daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    pub object_store: ObjectStoreConfig,
    #[serde(default)]
    pub queue: Option<QueueConfig>,
    pub ocr: OcrConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

impl Config {
    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    pub fn coordinator(&self) -> &CoordinatorConfig {
        &self.coordinator
    }

    pub fn queue_enabled(&self) -> bool {
        self.queue.as_ref().is_some_and(|q| q.enabled)
    }
}

/// Load config from `path`, or `config/default.toml` if `path` is `None`,
/// then apply `INGESTD_*` env-var overrides. Calls `dotenvy::dotenv()`
/// first so a local `.env` file can supply secrets (API keys, bucket
/// names) without writing them to the TOML file.
pub fn load(path: Option<&str>) -> Result<Config> {
    let _ = dotenvy::dotenv();

    let default_path = Path::new("config/default.toml");
    let resolved = path.map(Path::new).unwrap_or(default_path);

    let raw = std::fs::read_to_string(resolved)
        .map_err(|e| IngestError::Config(format!("cannot read {}: {e}", resolved.display())))?;

    let mut config: Config = toml::from_str(&raw)
        .map_err(|e| IngestError::Config(format!("parse error in {}: {e}", resolved.display())))?;

    if let Ok(level) = std::env::var("INGESTD_LOG_LEVEL") {
        config.log_level = level;
    }
    if let Ok(url) = std::env::var("INGESTD_QUEUE_URL") {
        if let Some(queue) = config.queue.as_mut() {
            queue.url = url;
        }
    }
    if let Ok(workers) = std::env::var("INGESTD_WORKER_COUNT") {
        config.pipeline.worker_count = workers
            .parse()
            .map_err(|_| IngestError::Config(format!("INGESTD_WORKER_COUNT must be an integer, got {workers:?}")))?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[object_store]
endpoint = "http://localhost:9000"
region = "us-east-1"
bucket = "docs"

[ocr]
mode = "fast"
fast_endpoint = "http://localhost:8081"

[embedding]
endpoint = "http://localhost:8082/embed"
model = "test-embed"

[index]
endpoint = "http://localhost:9200"
name = "docs"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().expect("create temp file");
        f.write_all(content.as_bytes()).expect("write temp file");
        f
    }

    #[test]
    fn defaults_fill_in_when_sections_absent() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load(Some(f.path().to_str().expect("utf8 path"))).expect("load config");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.pipeline().worker_count, 4);
        assert_eq!(cfg.pipeline().retry_attempts, 3);
        assert_eq!(cfg.pipeline().chunk_window, 512);
        assert_eq!(cfg.pipeline().chunk_overlap, 50);
        assert_eq!(cfg.coordinator().reconcile_interval_hours, 6);
        assert!(cfg.coordinator().reconcile_enabled);
        assert!(!cfg.coordinator().full_scan_enabled);
        assert!(!cfg.queue_enabled());
    }

    #[test]
    fn timeouts_match_spec_defaults() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load(Some(f.path().to_str().expect("utf8 path"))).expect("load config");
        assert_eq!(cfg.object_store.get_timeout_secs, 60);
        assert_eq!(cfg.ocr.request_timeout_secs, 120);
        assert_eq!(cfg.embedding.request_timeout_secs, 30);
        assert_eq!(cfg.index.upsert_timeout_secs, 30);
    }

    #[test]
    fn missing_file_errors() {
        let result = load(Some("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn explicit_pipeline_section_overrides_defaults() {
        let toml = format!(
            "{MINIMAL_TOML}\n[pipeline]\nworker_count = 8\nretry_attempts = 5\n"
        );
        let f = write_toml(&toml);
        let cfg = load(Some(f.path().to_str().expect("utf8 path"))).expect("load config");
        assert_eq!(cfg.pipeline().worker_count, 8);
        assert_eq!(cfg.pipeline().retry_attempts, 5);
    }
}
