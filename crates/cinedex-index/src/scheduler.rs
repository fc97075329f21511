use crate::indexer::Indexer;
use cinedex_core::{ChangeEvent, CinedexResult, EntityType};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Debounce state of one collection. No entry means idle.
#[derive(Debug, Clone, Copy)]
enum Slot {
    /// Waiting for the quiet period to end at the given instant.
    Armed(Instant),
    /// A reindex pass is in flight; `rearm` records events seen meanwhile.
    Running { rearm: bool },
}

/// Coalesces change events into one re-index pass per collection.
///
/// Each collection has its own trailing-edge timer: a pass starts once no
/// event for that collection has arrived for the debounce period. At most
/// one pass per collection is in flight; events arriving during a pass arm
/// a fresh window after it completes. Deletions bypass debouncing.
///
/// All timer state lives in a single actor task. Cloning the handle is
/// cheap; the actor exits once every handle is dropped.
#[derive(Clone)]
pub struct ReindexScheduler {
    notify_tx: mpsc::UnboundedSender<EntityType>,
    indexer: Arc<Indexer>,
}

impl ReindexScheduler {
    /// Spawns the scheduler actor on the current runtime.
    pub fn start(indexer: Arc<Indexer>, debounce: Duration) -> Self {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_actor(notify_rx, indexer.clone(), debounce));
        info!(debounce_ms = debounce.as_millis() as u64, "Reindex scheduler started");
        Self { notify_tx, indexer }
    }

    /// Marks `collection` dirty and restarts its debounce timer.
    pub fn notify(&self, collection: EntityType) {
        if self.notify_tx.send(collection).is_err() {
            warn!(collection = %collection, "Reindex scheduler is not running, dropping notification");
        }
    }

    /// Routes a change event: deletions remove the point right away and
    /// report the outcome, everything else is debounced.
    pub async fn handle_event(&self, event: ChangeEvent) -> CinedexResult<()> {
        if event.is_deletion() {
            return self
                .indexer
                .delete_one(event.collection, event.entity_id)
                .await;
        }
        debug!(collection = %event.collection, id = event.entity_id, kind = ?event.kind, "Change event queued");
        self.notify(event.collection);
        Ok(())
    }
}

async fn run_actor(
    mut notify_rx: mpsc::UnboundedReceiver<EntityType>,
    indexer: Arc<Indexer>,
    debounce: Duration,
) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<EntityType>();
    let mut slots: HashMap<EntityType, Slot> = HashMap::new();

    loop {
        let next_due = slots
            .values()
            .filter_map(|slot| match slot {
                Slot::Armed(at) => Some(*at),
                Slot::Running { .. } => None,
            })
            .min();

        tokio::select! {
            received = notify_rx.recv() => {
                let Some(collection) = received else { break };
                let deadline = Instant::now() + debounce;
                let next = match slots.get(&collection) {
                    Some(Slot::Running { .. }) => Slot::Running { rearm: true },
                    Some(Slot::Armed(_)) | None => Slot::Armed(deadline),
                };
                slots.insert(collection, next);
            }
            Some(collection) = done_rx.recv() => {
                match slots.get(&collection) {
                    Some(Slot::Running { rearm: true }) => {
                        slots.insert(collection, Slot::Armed(Instant::now() + debounce));
                    }
                    _ => {
                        slots.remove(&collection);
                    }
                }
            }
            _ = sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                let now = Instant::now();
                let due: Vec<EntityType> = slots
                    .iter()
                    .filter(|(_, slot)| matches!(slot, Slot::Armed(at) if *at <= now))
                    .map(|(collection, _)| *collection)
                    .collect();

                for collection in due {
                    slots.insert(collection, Slot::Running { rearm: false });
                    let indexer = indexer.clone();
                    let done_tx = done_tx.clone();
                    tokio::spawn(async move {
                        match indexer.reindex_all(collection).await {
                            Ok(indexed) => {
                                info!(collection = %collection, indexed, "Debounced reindex finished");
                            }
                            Err(e) => {
                                error!(collection = %collection, error = %e, "Debounced reindex failed");
                            }
                        }
                        let _ = done_tx.send(collection);
                    });
                }
            }
        }
    }

    let pending = slots
        .values()
        .filter(|slot| matches!(slot, Slot::Armed(_)))
        .count();
    info!(pending, "Reindex scheduler stopped");
}
