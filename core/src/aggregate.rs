//! The pipeline-wide running totals (§9 "shared mutable pipeline-wide
//! counters"). Modeled as an explicit aggregation record owned by the
//! coordinator and updated through a single reducer lane — every worker
//! outcome flows through one channel whose sole reader mutates the totals,
//! rather than a map shared and mutated from every worker task.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ingest_model::Outcome;

/// Running totals for one coordinator lifetime. Duplicates are tracked per
/// winning fingerprint's original `storage_key` so an operator can see
/// duplicate groups forming even though no index row backs them (§3, open
/// question 1).
#[derive(Debug, Clone, Default)]
pub struct Totals {
    pub indexed: u64,
    pub chunks_indexed: u64,
    pub duplicates: HashMap<String, u64>,
    pub unchanged: u64,
    pub deleted: u64,
    pub records_removed: u64,
    pub empty: u64,
    pub failed: u64,
}

impl Totals {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Indexed { chunk_count } => {
                self.indexed += 1;
                self.chunks_indexed += *chunk_count as u64;
            }
            Outcome::Duplicate { original_storage_key } => {
                *self.duplicates.entry(original_storage_key.clone()).or_insert(0) += 1;
            }
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Deleted { records_removed } => {
                self.deleted += 1;
                self.records_removed += records_removed;
            }
            Outcome::Empty => self.empty += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total_events(&self) -> u64 {
        self.indexed
            + self.duplicates.values().sum::<u64>()
            + self.unchanged
            + self.deleted
            + self.empty
            + self.failed
    }
}

/// Handle for reporting outcomes into the single reducer lane. Cheap to
/// clone; every worker gets its own handle onto the same channel.
#[derive(Clone)]
pub struct Aggregator {
    tx: mpsc::Sender<Outcome>,
}

impl Aggregator {
    /// Spawn the reducer task and return a handle plus the join handle that
    /// resolves to final `Totals` once every `Aggregator` clone is dropped
    /// and the channel closes.
    pub fn spawn() -> (Self, JoinHandle<Totals>) {
        let (tx, mut rx) = mpsc::channel(1024);
        let handle = tokio::spawn(async move {
            let mut totals = Totals::default();
            while let Some(outcome) = rx.recv().await {
                totals.record(&outcome);
            }
            totals
        });
        (Self { tx }, handle)
    }

    pub async fn report(&self, outcome: Outcome) {
        let _ = self.tx.send(outcome).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn totals_accumulate_across_outcomes() {
        let (aggregator, handle) = Aggregator::spawn();
        aggregator.report(Outcome::Indexed { chunk_count: 3 }).await;
        aggregator.report(Outcome::Indexed { chunk_count: 2 }).await;
        aggregator.report(Outcome::Duplicate { original_storage_key: "docs/a.txt".into() }).await;
        aggregator.report(Outcome::Unchanged).await;
        aggregator.report(Outcome::Deleted { records_removed: 4 }).await;
        aggregator.report(Outcome::Empty).await;
        aggregator.report(Outcome::Failed { reason: "boom".into() }).await;
        drop(aggregator);

        let totals = handle.await.expect("reducer task completes");
        assert_eq!(totals.indexed, 2);
        assert_eq!(totals.chunks_indexed, 5);
        assert_eq!(totals.duplicates.get("docs/a.txt"), Some(&1));
        assert_eq!(totals.unchanged, 1);
        assert_eq!(totals.deleted, 1);
        assert_eq!(totals.records_removed, 4);
        assert_eq!(totals.empty, 1);
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.total_events(), 7);
    }
}
