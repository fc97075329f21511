use crate::{CinedexError, CinedexResult, EntityType};
use serde::{Deserialize, Serialize};

/// What happened to an entity in the system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A new row was inserted.
    Created,
    /// An existing row changed.
    Updated,
    /// A row was removed.
    Deleted,
}

/// A single mutation notification. Consumed once by the re-index scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Collection the entity belongs to.
    pub collection: EntityType,
    /// Primary key of the changed row.
    pub entity_id: u64,
    /// Kind of mutation.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Creates a new change event.
    pub fn new(collection: EntityType, entity_id: u64, kind: ChangeKind) -> Self {
        Self {
            collection,
            entity_id,
            kind,
        }
    }

    /// Parses a domain event name such as `movies.updated` or `promotion.deleted`.
    pub fn from_event_name(name: &str, entity_id: u64) -> CinedexResult<Self> {
        let (entity, kind) = name
            .split_once('.')
            .ok_or_else(|| CinedexError::Config(format!("Malformed event name '{name}'")))?;

        let collection: EntityType = entity.parse()?;
        let kind = match kind {
            "created" => ChangeKind::Created,
            "updated" => ChangeKind::Updated,
            "deleted" => ChangeKind::Deleted,
            other => {
                return Err(CinedexError::Config(format!(
                    "Unknown change kind '{other}' in event '{name}'"
                )))
            }
        };

        Ok(Self::new(collection, entity_id, kind))
    }

    /// Deletions skip debouncing and are applied immediately.
    pub fn is_deletion(&self) -> bool {
        self.kind == ChangeKind::Deleted
    }
}
