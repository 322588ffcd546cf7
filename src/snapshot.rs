//! Snapshot persistence boundary
//!
//! The ledger talks to storage through the `SnapshotStore` trait: it
//! hands over a complete `LedgerSnapshot` and gets one back. The JSON
//! implementation writes atomically (temp file, flush, sync, rename) so
//! a crash mid-save can never leave a half-written ledger behind, and a
//! missing file loads as an empty ledger.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{ChangeJournal, EntityStore};
use crate::models::{
    Account, Budget, ExpenseCategory, Insight, SavingsGoal, Subscription, Transaction,
};

/// Current snapshot format version
const SNAPSHOT_VERSION: u32 = 1;

/// Complete serializable state of a ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Format version for forward compatibility
    pub version: u32,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub categories: Vec<ExpenseCategory>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub goals: Vec<SavingsGoal>,
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub journal: ChangeJournal,
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            accounts: Vec::new(),
            transactions: Vec::new(),
            categories: Vec::new(),
            budgets: Vec::new(),
            subscriptions: Vec::new(),
            goals: Vec::new(),
            insights: Vec::new(),
            journal: ChangeJournal::new(),
        }
    }
}

impl LedgerSnapshot {
    /// Capture a snapshot of a store and its journal
    pub fn capture(store: &EntityStore, journal: &ChangeJournal) -> Self {
        let (accounts, transactions, categories, budgets, subscriptions, goals, insights) =
            store.to_parts();
        Self {
            version: SNAPSHOT_VERSION,
            accounts,
            transactions,
            categories,
            budgets,
            subscriptions,
            goals,
            insights,
            journal: journal.clone(),
        }
    }

    /// Rebuild the entity store from this snapshot
    pub fn into_store(self) -> (EntityStore, ChangeJournal) {
        let store = EntityStore::from_parts(
            self.accounts,
            self.transactions,
            self.categories,
            self.budgets,
            self.subscriptions,
            self.goals,
            self.insights,
        );
        (store, self.journal)
    }
}

/// Persistence collaborator: somewhere a whole ledger can be saved to
/// and loaded from
pub trait SnapshotStore {
    /// Load the last saved snapshot; an empty backing store yields a
    /// default (empty) snapshot
    fn load(&self) -> LedgerResult<LedgerSnapshot>;

    /// Persist a snapshot, replacing whatever was saved before
    fn save(&self, snapshot: &LedgerSnapshot) -> LedgerResult<()>;
}

/// JSON-file-backed snapshot store with atomic writes
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> LedgerResult<LedgerSnapshot> {
        if !self.path.exists() {
            return Ok(LedgerSnapshot::default());
        }

        let file = File::open(&self.path).map_err(|e| {
            LedgerError::Storage(format!("Failed to open {}: {}", self.path.display(), e))
        })?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| {
            LedgerError::Storage(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> LedgerResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LedgerError::Storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        // temp file in the same directory so the rename stays atomic
        let temp_path = self.path.with_extension("json.tmp");

        let file = File::create(&temp_path)
            .map_err(|e| LedgerError::Storage(format!("Failed to create temp file: {}", e)))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, snapshot)
            .map_err(|e| LedgerError::Storage(format!("Failed to serialize ledger: {}", e)))?;
        writer
            .flush()
            .map_err(|e| LedgerError::Storage(format!("Failed to flush data: {}", e)))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| LedgerError::Storage(format!("Failed to sync data: {}", e)))?;

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            LedgerError::Storage(format!("Failed to rename temp file: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountKind;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonSnapshotStore::new(temp_dir.path().join("ledger.json"));

        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert!(snapshot.accounts.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");
        let snapshot_store = JsonSnapshotStore::new(&path);

        let mut entity_store = EntityStore::new();
        entity_store
            .insert_account(Account::new("Checking", AccountKind::Checking))
            .unwrap();

        let snapshot = LedgerSnapshot::capture(&entity_store, &ChangeJournal::new());
        snapshot_store.save(&snapshot).unwrap();
        assert!(path.exists());

        let loaded = snapshot_store.load().unwrap();
        assert_eq!(loaded.accounts.len(), 1);
        assert_eq!(loaded.accounts[0].name, "Checking");

        let (rebuilt, _) = loaded.into_store();
        assert_eq!(rebuilt.entity_count(), 1);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");
        let store = JsonSnapshotStore::new(&path);

        store.save(&LedgerSnapshot::default()).unwrap();
        assert!(path.exists());
        assert!(!temp_dir.path().join("ledger.json.tmp").exists());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("ledger.json");
        let store = JsonSnapshotStore::new(&path);

        store.save(&LedgerSnapshot::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_is_a_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");
        fs::write(&path, "not json at all").unwrap();

        let store = JsonSnapshotStore::new(&path);
        let err = store.load().unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
    }
}
