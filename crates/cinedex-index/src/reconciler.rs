use crate::indexer::Indexer;
use cinedex_core::{CinedexResult, EntityType};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// What the startup check did for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Counts matched; nothing was touched.
    InSync {
        /// Points in the collection.
        count: usize,
    },
    /// Counts differed; the collection was rebuilt.
    Reset {
        /// Qualifying rows in the repository.
        expected: usize,
        /// Points found in the store.
        found: usize,
        /// Points written by the rebuild.
        indexed: usize,
    },
    /// Counting or rebuilding failed. Logged, not propagated.
    Failed {
        /// Rendered error.
        error: String,
    },
}

/// Compares repository and store counts per collection and rebuilds the
/// ones that drifted.
///
/// Only catches inserts and deletes missed while the process was down;
/// in-place edits with no count change are left to the event path.
#[derive(Clone)]
pub struct Reconciler {
    indexer: Arc<Indexer>,
}

impl Reconciler {
    /// A reconciler driving `indexer`.
    pub fn new(indexer: Arc<Indexer>) -> Self {
        Self { indexer }
    }

    /// Checks every collection concurrently.
    pub async fn run(&self) -> Vec<(EntityType, SyncOutcome)> {
        let outcomes = join_all(EntityType::ALL.map(|e| self.reconcile(e))).await;
        EntityType::ALL.into_iter().zip(outcomes).collect()
    }

    /// Checks one collection.
    pub async fn reconcile(&self, entity: EntityType) -> SyncOutcome {
        let collection = entity.collection_name();
        match self.try_reconcile(entity).await {
            Ok(outcome) => {
                match &outcome {
                    SyncOutcome::InSync { count } => {
                        info!(collection, count, "Collection in sync");
                    }
                    SyncOutcome::Reset {
                        expected,
                        found,
                        indexed,
                    } => {
                        info!(collection, expected, found, indexed, "Drifted collection rebuilt");
                    }
                    SyncOutcome::Failed { .. } => {}
                }
                outcome
            }
            Err(e) => {
                error!(collection, error = %e, "Reconciliation failed");
                SyncOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn try_reconcile(&self, entity: EntityType) -> CinedexResult<SyncOutcome> {
        let (expected, found) = tokio::try_join!(
            self.indexer.count_in_repository(entity),
            self.indexer.count_in_store(entity),
        )?;

        if expected == found {
            return Ok(SyncOutcome::InSync { count: found });
        }

        warn!(
            collection = entity.collection_name(),
            expected, found, "Count mismatch, resetting collection"
        );
        let indexed = self.indexer.reset_collection(entity).await?;
        Ok(SyncOutcome::Reset {
            expected,
            found,
            indexed,
        })
    }

    /// Runs the check in a detached task so startup does not wait on it.
    pub fn spawn(self) -> JoinHandle<Vec<(EntityType, SyncOutcome)>> {
        tokio::spawn(async move {
            let outcomes = self.run().await;
            let resets = outcomes
                .iter()
                .filter(|(_, o)| matches!(o, SyncOutcome::Reset { .. }))
                .count();
            let failures = outcomes
                .iter()
                .filter(|(_, o)| matches!(o, SyncOutcome::Failed { .. }))
                .count();
            info!(resets, failures, "Startup reconciliation finished");
            outcomes
        })
    }
}
