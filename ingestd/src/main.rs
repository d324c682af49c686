//! Daemon entry point: load configuration, wire the HTTP-backed
//! collaborators to the pipeline and coordinator, run until a
//! termination signal, then report the accumulated totals (§7
//! "aggregated counts per scan/sweep printed on completion").
//!
//! CLI argument parsing is out of scope (§1 Non-goals) — the only
//! argument accepted is an optional config file path, defaulting to
//! `config/default.toml`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::info;

use ingest_clients::{HttpEmbeddingBackend, HttpEventQueue, HttpObjectStore, HttpOcrBackend, HttpSearchIndex};
use ingest_core::traits::{EmbeddingBackend, EventQueue, ObjectStore, SearchIndex};
use ingest_core::{logging, Coordinator, Pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1);
    let config = ingest_core::config::load(config_path.as_deref()).context("failed to load configuration")?;

    logging::init_logging(&config.log_dir, "ingestd.log", &config.log_level).context("failed to initialize logging")?;

    info!(
        worker_count = config.pipeline().worker_count,
        queue_enabled = config.queue_enabled(),
        full_scan = config.coordinator().full_scan_enabled,
        "starting ingestd"
    );

    let object_store: Arc<dyn ObjectStore> = Arc::new(HttpObjectStore::new(&config.object_store)?);
    let queue: Option<Arc<dyn EventQueue>> = match &config.queue {
        Some(queue_config) if queue_config.enabled => Some(Arc::new(HttpEventQueue::new(queue_config)?)),
        _ => None,
    };
    let ocr = Arc::new(HttpOcrBackend::new(&config.ocr)?);
    let embedding: Arc<dyn EmbeddingBackend> = Arc::new(HttpEmbeddingBackend::new(&config.embedding)?);
    let index: Arc<dyn SearchIndex> = Arc::new(HttpSearchIndex::new(&config.index)?);

    index.ensure_index().await.context("failed to ensure search index exists")?;

    let pipeline = Arc::new(Pipeline::new(
        Arc::clone(&object_store),
        ocr,
        Arc::clone(&embedding),
        Arc::clone(&index),
        config.pipeline().clone(),
        config.embedding.batch_size,
    ));

    let prefixes = config.object_store.prefixes.clone();
    let queue_max_messages = config.queue.as_ref().map(|q| q.max_messages).unwrap_or(0);
    let coordinator = Arc::new(Coordinator::new(
        object_store,
        queue,
        index,
        pipeline,
        config.coordinator().clone(),
        prefixes,
        config.pipeline().worker_count,
        queue_max_messages,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("termination signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let totals = coordinator.run(config.coordinator().full_scan_enabled, shutdown_rx).await;

    info!(
        indexed = totals.indexed,
        chunks_indexed = totals.chunks_indexed,
        duplicate_groups = totals.duplicates.len(),
        unchanged = totals.unchanged,
        deleted = totals.deleted,
        records_removed = totals.records_removed,
        empty = totals.empty,
        failed = totals.failed,
        total_events = totals.total_events(),
        "ingestd shut down"
    );

    Ok(())
}
