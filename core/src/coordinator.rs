//! Event Coordinator (§4.E): three event sources — full scan, queue
//! subscription, reconciliation sweep — feed a lane-routed work bus
//! (`bus::WorkBus`), drained by a pool of pipeline workers, whose outcomes
//! flow into a single `aggregate::Aggregator` lane. Grounded on the
//! teacher's `MaintenanceManager` (background tasks tracked by
//! `JoinHandle`, stopped on shutdown) for the worker pool lifecycle, and
//! `agent::scheduler::Scheduler` (a `tokio_cron_scheduler::Job` wrapping a
//! periodic async closure) for the reconciliation timer.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};

use ingest_model::{EventOrigin, Outcome, WorkEvent};

use crate::aggregate::{Aggregator, Totals};
use crate::bus::{LaneItem, WorkBus};
use crate::config::CoordinatorConfig;
use crate::pipeline::Pipeline;
use crate::traits::{EventQueue, ObjectStore, SearchIndex};

/// How long, after a shutdown signal, in-flight lane items are still given
/// to reach a terminal outcome before the coordinator gives up on them
/// (§4.E "Shutdown"). Not itself part of the configuration surface in §6;
/// this is a fixed operational ceiling, not a tunable.
const DRAIN_DEADLINE: Duration = Duration::from_secs(30);

pub struct Coordinator {
    object_store: Arc<dyn ObjectStore>,
    queue: Option<Arc<dyn EventQueue>>,
    index: Arc<dyn SearchIndex>,
    pipeline: Arc<Pipeline>,
    config: CoordinatorConfig,
    prefixes: Vec<String>,
    queue_max_messages: u32,
    bus: WorkBus,
    receivers: Mutex<Vec<tokio::sync::mpsc::Receiver<LaneItem>>>,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        object_store: Arc<dyn ObjectStore>,
        queue: Option<Arc<dyn EventQueue>>,
        index: Arc<dyn SearchIndex>,
        pipeline: Arc<Pipeline>,
        config: CoordinatorConfig,
        prefixes: Vec<String>,
        worker_count: usize,
        queue_max_messages: u32,
    ) -> Self {
        let (bus, receivers) = WorkBus::new(worker_count, worker_count.max(1) * 4);
        Self {
            object_store,
            queue,
            index,
            pipeline,
            config,
            prefixes,
            queue_max_messages,
            bus,
            receivers: Mutex::new(receivers),
        }
    }

    /// Run every configured source plus the worker pool until `shutdown`
    /// fires, then drain in-flight work within `DRAIN_DEADLINE` and return
    /// the accumulated totals.
    pub async fn run(self: Arc<Self>, start_full_scan: bool, mut shutdown: watch::Receiver<bool>) -> Totals {
        let (aggregator, totals_handle) = Aggregator::spawn();

        let receivers = std::mem::take(&mut *self.receivers.lock().await);
        let mut workers: Vec<JoinHandle<()>> = receivers
            .into_iter()
            .map(|rx| {
                let pipeline = Arc::clone(&self.pipeline);
                let aggregator = aggregator.clone();
                tokio::spawn(Self::worker_loop(pipeline, rx, aggregator))
            })
            .collect();

        if start_full_scan {
            if let Err(e) = self.run_full_scan().await {
                error!(error = %e, "full scan failed");
            }
        }

        let reconcile_handle = if self.config.reconcile_enabled {
            Some(self.clone().spawn_reconciliation().await)
        } else {
            None
        };

        let queue_handle = if self.queue.is_some() {
            Some(tokio::spawn(self.clone().run_queue_subscription(shutdown.clone())))
        } else {
            None
        };

        let _ = shutdown.changed().await;
        info!("shutdown signal received, draining in-flight work");

        if let Some(mut handle) = reconcile_handle {
            let _ = handle.shutdown().await;
        }
        if let Some(handle) = queue_handle {
            let _ = tokio::time::timeout(DRAIN_DEADLINE, handle).await;
        }

        for worker in &mut workers {
            if tokio::time::timeout(DRAIN_DEADLINE, &mut *worker).await.is_err() {
                warn!("worker did not drain within the deadline, aborting");
                worker.abort();
            }
        }

        drop(aggregator);
        totals_handle.await.unwrap_or_default()
    }

    async fn run_full_scan(&self) -> crate::error::Result<()> {
        let prefixes = if self.prefixes.is_empty() { vec![String::new()] } else { self.prefixes.clone() };
        for prefix in prefixes {
            let mut continuation = None;
            loop {
                let page = self.object_store.list(&prefix, continuation.as_deref()).await?;
                for object in &page.objects {
                    let event = WorkEvent::create(object.storage_key.clone(), EventOrigin::Scan);
                    if self.bus.dispatch(event).await.is_err() {
                        return Ok(());
                    }
                }
                continuation = page.continuation_token;
                if continuation.is_none() {
                    break;
                }
            }
        }
        Ok(())
    }

    async fn run_queue_subscription(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let Some(queue) = self.queue.clone() else { return };
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                received = queue.receive(self.queue_max_messages) => {
                    match received {
                        Ok(messages) => {
                            for message in messages {
                                self.handle_queue_message(queue.as_ref(), message).await;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "queue receive failed");
                        }
                    }
                }
            }
        }
    }

    /// Route every `WorkEvent` in one queue message with an ack, wait for
    /// all of them to reach a terminal outcome, then delete the message —
    /// a transient failure among them leaves the message for redelivery
    /// (§4.E "Queue subscription").
    async fn handle_queue_message(&self, queue: &dyn EventQueue, message: crate::traits::QueueMessage) {
        let mut acks = Vec::with_capacity(message.events.len());
        for event in message.events {
            match self.bus.dispatch_with_ack(event).await {
                Ok(rx) => acks.push(rx),
                Err(_) => return,
            }
        }

        let mut all_terminal = true;
        for ack in acks {
            match ack.await {
                Ok(Outcome::Failed { .. }) => all_terminal = false,
                Ok(_) => {}
                Err(_) => all_terminal = false,
            }
        }

        if all_terminal {
            if let Err(e) = queue.delete(&message.receipt_handle).await {
                warn!(error = %e, "failed to delete acknowledged queue message");
            }
        } else {
            debug!(receipt_handle = %message.receipt_handle, "leaving message for redelivery after a terminal failure");
        }
    }

    /// Reconciliation sweep (§4.E): S = object-store keys, I =
    /// `list_storage_keys()`. For every key in I\S, emit a DELETE. Never
    /// emits CREATE — the queue and full-scan sources own creation.
    /// Public so an operator (or a test) can trigger an out-of-band sweep
    /// without waiting for the next scheduled interval.
    pub async fn run_reconciliation(&self) -> crate::error::Result<()> {
        let mut in_store: HashSet<String> = HashSet::new();
        let prefixes = if self.prefixes.is_empty() { vec![String::new()] } else { self.prefixes.clone() };
        for prefix in prefixes {
            let mut continuation = None;
            loop {
                let page = self.object_store.list(&prefix, continuation.as_deref()).await?;
                in_store.extend(page.objects.into_iter().map(|o| o.storage_key));
                continuation = page.continuation_token;
                if continuation.is_none() {
                    break;
                }
            }
        }

        let mut continuation = None;
        let mut orphans_removed = 0u64;
        loop {
            let (keys, next) = self.index.list_storage_keys(continuation.as_deref()).await?;
            for key in keys {
                if !in_store.contains(&key) {
                    let event = WorkEvent::delete(key, EventOrigin::Reconcile);
                    if self.bus.dispatch(event).await.is_ok() {
                        orphans_removed += 1;
                    }
                }
            }
            continuation = next;
            if continuation.is_none() {
                break;
            }
        }
        info!(orphans_removed, "reconciliation sweep complete");
        Ok(())
    }

    /// Register the reconciliation sweep as a repeating `tokio-cron-scheduler`
    /// job, grounded on `agent::scheduler::Scheduler::add_job`'s
    /// `Job::new_repeated_async` usage. Returns the running scheduler;
    /// dropping or shutting it down stops future sweeps.
    async fn spawn_reconciliation(self: Arc<Self>) -> JobScheduler {
        let interval = Duration::from_secs(self.config.reconcile_interval_hours.max(1) * 3600);
        let scheduler = JobScheduler::new().await.expect("failed to initialize reconciliation scheduler");
        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let this = Arc::clone(&self);
            Box::pin(async move {
                if let Err(e) = this.run_reconciliation().await {
                    error!(error = %e, "reconciliation sweep failed");
                }
            })
        })
        .expect("failed to build reconciliation job");
        scheduler.add(job).await.expect("failed to register reconciliation job");
        scheduler.start().await.expect("failed to start reconciliation scheduler");
        scheduler
    }

    async fn worker_loop(pipeline: Arc<Pipeline>, mut rx: tokio::sync::mpsc::Receiver<LaneItem>, aggregator: Aggregator) {
        while let Some(item) = rx.recv().await {
            let (outcome, timings) = pipeline.run(&item.event).await;
            debug!(
                storage_key = %item.event.storage_key,
                outcome = outcome.label(),
                total_ms = timings.total_ms(),
                "work event reached a terminal outcome"
            );
            aggregator.report(outcome.clone()).await;
            if let Some(ack) = item.ack {
                let _ = ack.send(outcome);
            }
        }
    }
}
