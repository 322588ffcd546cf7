//! Change notification feed
//!
//! Every committed mutation produces exactly one `ChangeEvent` per affected
//! entity, carrying old and new snapshots. The ledger routes each event
//! synchronously to the balance engine, the search index, and the change
//! journal, which is what keeps the derived-state observers from drifting
//! out of sync with the entity store.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::{
    Account, Budget, ExpenseCategory, Insight, SavingsGoal, Subscription, Transaction,
};

/// The entity kinds tracked by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Account,
    Transaction,
    Category,
    Budget,
    Subscription,
    SavingsGoal,
    Insight,
}

impl EntityKind {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Transaction => "Transaction",
            Self::Category => "Category",
            Self::Budget => "Budget",
            Self::Subscription => "Subscription",
            Self::SavingsGoal => "SavingsGoal",
            Self::Insight => "Insight",
        }
    }

    /// Ranking priority for search tie-breaking: accounts first, then
    /// transactions, then everything else
    pub fn search_rank(&self) -> u8 {
        match self {
            Self::Account => 0,
            Self::Transaction => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A (kind, id) pair uniquely identifying an entity across kinds
pub type EntityKey = (EntityKind, Uuid);

/// A typed snapshot of an entity at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntitySnapshot {
    Account(Account),
    Transaction(Transaction),
    Category(ExpenseCategory),
    Budget(Budget),
    Subscription(Subscription),
    SavingsGoal(SavingsGoal),
    Insight(Insight),
}

impl EntitySnapshot {
    /// The kind of entity captured
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Account(_) => EntityKind::Account,
            Self::Transaction(_) => EntityKind::Transaction,
            Self::Category(_) => EntityKind::Category,
            Self::Budget(_) => EntityKind::Budget,
            Self::Subscription(_) => EntityKind::Subscription,
            Self::SavingsGoal(_) => EntityKind::SavingsGoal,
            Self::Insight(_) => EntityKind::Insight,
        }
    }

    /// The raw id of the captured entity
    pub fn id(&self) -> Uuid {
        match self {
            Self::Account(a) => *a.id.as_uuid(),
            Self::Transaction(t) => *t.id.as_uuid(),
            Self::Category(c) => *c.id.as_uuid(),
            Self::Budget(b) => *b.id.as_uuid(),
            Self::Subscription(s) => *s.id.as_uuid(),
            Self::SavingsGoal(g) => *g.id.as_uuid(),
            Self::Insight(i) => *i.id.as_uuid(),
        }
    }

    /// The (kind, id) key of the captured entity
    pub fn key(&self) -> EntityKey {
        (self.kind(), self.id())
    }

    /// A human-readable name for journal output, where the entity has one
    pub fn display_name(&self) -> Option<String> {
        match self {
            Self::Account(a) => Some(a.name.clone()),
            Self::Transaction(t) => Some(t.title.clone()),
            Self::Category(c) => Some(c.name.clone()),
            Self::Budget(_) => None,
            Self::Subscription(s) => Some(s.name.clone()),
            Self::SavingsGoal(g) => Some(g.name.clone()),
            Self::Insight(i) => Some(i.title.clone()),
        }
    }
}

/// The operation a change event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "CREATE"),
            Self::Updated => write!(f, "UPDATE"),
            Self::Deleted => write!(f, "DELETE"),
        }
    }
}

/// A single committed change to one entity, with the snapshots observers
/// need to update derived state without re-reading the store
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    Created {
        after: EntitySnapshot,
    },
    Updated {
        before: EntitySnapshot,
        after: EntitySnapshot,
    },
    Deleted {
        before: EntitySnapshot,
    },
}

impl ChangeEvent {
    /// Event for a newly created entity
    pub fn created(after: EntitySnapshot) -> Self {
        Self::Created { after }
    }

    /// Event for an updated entity
    pub fn updated(before: EntitySnapshot, after: EntitySnapshot) -> Self {
        Self::Updated { before, after }
    }

    /// Event for a deleted entity
    pub fn deleted(before: EntitySnapshot) -> Self {
        Self::Deleted { before }
    }

    /// The operation performed
    pub fn op(&self) -> ChangeOp {
        match self {
            Self::Created { .. } => ChangeOp::Created,
            Self::Updated { .. } => ChangeOp::Updated,
            Self::Deleted { .. } => ChangeOp::Deleted,
        }
    }

    /// Snapshot before the change, where one exists
    pub fn before(&self) -> Option<&EntitySnapshot> {
        match self {
            Self::Created { .. } => None,
            Self::Updated { before, .. } | Self::Deleted { before } => Some(before),
        }
    }

    /// Snapshot after the change, where one exists
    pub fn after(&self) -> Option<&EntitySnapshot> {
        match self {
            Self::Created { after } | Self::Updated { after, .. } => Some(after),
            Self::Deleted { .. } => None,
        }
    }

    /// The most recent snapshot carried by this event
    pub fn latest(&self) -> &EntitySnapshot {
        match self {
            Self::Created { after } | Self::Updated { after, .. } => after,
            Self::Deleted { before } => before,
        }
    }

    /// The key of the affected entity
    pub fn key(&self) -> EntityKey {
        self.latest().key()
    }

    /// The kind of the affected entity
    pub fn kind(&self) -> EntityKind {
        self.latest().kind()
    }
}
