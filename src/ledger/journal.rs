//! Change journal
//!
//! An append-only record of every committed mutation, kept in memory and
//! persisted with the rest of the ledger snapshot. Entries carry before
//! and after state as JSON values so the journal can describe any entity
//! kind without knowing its shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::events::{ChangeEvent, ChangeOp, EntityKind};

/// One journal line describing a committed change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// When the change was committed
    pub timestamp: DateTime<Utc>,

    /// The operation performed
    pub op: ChangeOp,

    /// The kind of entity affected
    pub entity_kind: EntityKind,

    /// The raw id of the affected entity
    pub entity_id: Uuid,

    /// Display name of the affected entity, where it has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// Entity state before the change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,

    /// Entity state after the change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,

    /// Free-form annotation (e.g. why an insight was orphaned)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl JournalEntry {
    /// Build an entry from a change event
    pub fn from_event(event: &ChangeEvent) -> Self {
        let (kind, id) = event.key();
        Self {
            timestamp: Utc::now(),
            op: event.op(),
            entity_kind: kind,
            entity_id: id,
            entity_name: event.latest().display_name(),
            before: event.before().and_then(|s| serde_json::to_value(s).ok()),
            after: event.after().and_then(|s| serde_json::to_value(s).ok()),
            note: None,
        }
    }

    /// Attach an annotation
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Render a single human-readable line
    pub fn format_human_readable(&self) -> String {
        let name = self
            .entity_name
            .as_deref()
            .map(|n| format!(" \"{}\"", n))
            .unwrap_or_default();
        let note = self
            .note
            .as_deref()
            .map(|n| format!(" ({})", n))
            .unwrap_or_default();
        format!(
            "{} {} {}{}{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.op,
            self.entity_kind,
            name,
            note
        )
    }
}

/// Append-only in-memory journal of committed changes
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChangeJournal {
    entries: Vec<JournalEntry>,
}

impl ChangeJournal {
    /// Create an empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Append an entry built from an event
    pub fn record_event(&mut self, event: &ChangeEvent) {
        self.record(JournalEntry::from_event(event));
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// The most recent `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<&JournalEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    /// Entries touching a particular entity, oldest first
    pub fn for_entity(&self, kind: EntityKind, id: Uuid) -> Vec<&JournalEntry> {
        self.entries
            .iter()
            .filter(|e| e.entity_kind == kind && e.entity_id == id)
            .collect()
    }

    /// Number of entries recorded
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the journal is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
