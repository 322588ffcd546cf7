//! Search index engine
//!
//! An inverted token index over every searchable entity, kept current by
//! the same change events that drive the balance engine. An update always
//! removes the entry's old tokens before inserting the new ones, so a
//! rename can never leave the renamed entity findable under its old name.
//! Results are render-ready: title, subtitle, amount, and timestamp come
//! back with the hit, no re-fetch needed.

pub mod tokenize;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ledger::{ChangeEvent, EntityKey, EntityKind, EntitySnapshot, EntityStore};
use crate::models::Money;

pub use tokenize::MatchQuality;

use tokenize::{match_quality, tokenize};

/// A ranked search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Kind of the matched entity
    pub kind: EntityKind,

    /// Raw id of the matched entity
    pub id: Uuid,

    /// Primary display line
    pub title: String,

    /// Secondary display line (account name for transactions, kind label
    /// for accounts and insights, etc.)
    pub subtitle: Option<String>,

    /// Monetary figure attached to the entity, where it has one
    pub amount: Option<Money>,

    /// How well the query matched; for multi-token queries, the weakest
    /// per-token grade
    pub quality: MatchQuality,

    /// Timestamp used for recency ranking
    pub timestamp: DateTime<Utc>,
}

/// Constraints applied to a search before ranking
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Restrict results to these kinds; `None` means all kinds
    pub kinds: Option<HashSet<EntityKind>>,

    /// Only entities timestamped at or after this instant
    pub after: Option<DateTime<Utc>>,

    /// Only entities timestamped at or before this instant
    pub before: Option<DateTime<Utc>>,

    /// Only entities carrying an amount of at least this much
    pub min_amount: Option<Money>,

    /// Only entities carrying an amount of at most this much
    pub max_amount: Option<Money>,

    /// Cap on the number of results returned
    pub limit: Option<usize>,
}

impl SearchFilter {
    /// No constraints
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a single kind
    pub fn kind(kind: EntityKind) -> Self {
        Self {
            kinds: Some(HashSet::from([kind])),
            ..Self::default()
        }
    }

    /// Add another permitted kind
    pub fn or_kind(mut self, kind: EntityKind) -> Self {
        self.kinds.get_or_insert_with(HashSet::new).insert(kind);
        self
    }

    /// Only entities timestamped within the given range, inclusive
    pub fn between(mut self, after: DateTime<Utc>, before: DateTime<Utc>) -> Self {
        self.after = Some(after);
        self.before = Some(before);
        self
    }

    /// Only entities carrying an amount within the given range, inclusive
    pub fn amount_between(mut self, min: Money, max: Money) -> Self {
        self.min_amount = Some(min);
        self.max_amount = Some(max);
        self
    }

    /// Cap the number of results
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check whether a kind passes the filter
    pub fn accepts(&self, kind: EntityKind) -> bool {
        match &self.kinds {
            Some(kinds) => kinds.contains(&kind),
            None => true,
        }
    }

    fn accepts_doc(&self, doc: &IndexedDoc) -> bool {
        if let Some(after) = self.after {
            if doc.timestamp < after {
                return false;
            }
        }
        if let Some(before) = self.before {
            if doc.timestamp > before {
                return false;
            }
        }
        // amount constraints only ever match entities that carry one
        if self.min_amount.is_some() || self.max_amount.is_some() {
            let amount = match doc.amount {
                Some(amount) => amount,
                None => return false,
            };
            if self.min_amount.is_some_and(|min| amount < min) {
                return false;
            }
            if self.max_amount.is_some_and(|max| amount > max) {
                return false;
            }
        }
        true
    }
}

/// Per-entity index entry: tokens plus the render-ready projection
#[derive(Debug, Clone)]
struct IndexedDoc {
    tokens: Vec<String>,
    title: String,
    subtitle: Option<String>,
    amount: Option<Money>,
    timestamp: DateTime<Utc>,
}

/// Inverted token index over searchable entities
#[derive(Debug, Default)]
pub struct SearchIndex {
    /// token -> keys of entities carrying that token
    tokens: HashMap<String, HashSet<EntityKey>>,
    /// key -> the entry's current tokens and projection
    docs: HashMap<EntityKey, IndexedDoc>,
}

impl SearchIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed entities
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Check whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Check whether an entity is currently indexed
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.docs.contains_key(key)
    }

    /// Bring the index in line with one committed change. Updates remove
    /// the old tokens before inserting the new ones; applying the same
    /// event twice is a no-op.
    pub fn apply(&mut self, store: &EntityStore, event: &ChangeEvent) {
        let key = event.key();
        self.remove(&key);
        if let Some(after) = event.after() {
            if let Some(doc) = project(store, after) {
                self.insert(key, doc);
            }
        }
    }

    /// Re-project one entity from the store (e.g. after a parent rename
    /// changed its indexed subtitle)
    pub fn reindex(&mut self, store: &EntityStore, snapshot: &EntitySnapshot) {
        let key = snapshot.key();
        self.remove(&key);
        if let Some(doc) = project(store, snapshot) {
            self.insert(key, doc);
        }
    }

    /// Drop an entity from the index
    pub fn remove(&mut self, key: &EntityKey) {
        if let Some(doc) = self.docs.remove(key) {
            for token in &doc.tokens {
                if let Some(keys) = self.tokens.get_mut(token) {
                    keys.remove(key);
                    if keys.is_empty() {
                        self.tokens.remove(token);
                    }
                }
            }
        }
    }

    /// Throw the index away and re-project every entity in the store
    pub fn rebuild(&mut self, store: &EntityStore) {
        self.tokens.clear();
        self.docs.clear();
        for snapshot in store.all_snapshots() {
            if let Some(doc) = project(store, &snapshot) {
                self.insert(snapshot.key(), doc);
            }
        }
    }

    /// Ranked search. Every query token must match at least one of an
    /// entity's tokens; the entity's grade is its weakest per-token grade.
    /// Filters apply before ranking. Results order by grade, then recency,
    /// then kind, then id, which is total, so equal inputs always produce
    /// equal output order.
    pub fn search(&self, query: &str, filter: &SearchFilter) -> Vec<SearchResult> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        // per query token: best grade per candidate entity
        let mut per_token: Vec<HashMap<EntityKey, MatchQuality>> =
            Vec::with_capacity(query_tokens.len());
        for qt in &query_tokens {
            let mut grades: HashMap<EntityKey, MatchQuality> = HashMap::new();
            for (token, keys) in &self.tokens {
                if let Some(quality) = match_quality(qt, token) {
                    for key in keys {
                        let entry = grades.entry(*key).or_insert(quality);
                        if quality > *entry {
                            *entry = quality;
                        }
                    }
                }
            }
            if grades.is_empty() {
                return Vec::new();
            }
            per_token.push(grades);
        }

        // intersect: a hit must satisfy every query token
        let (first, rest) = match per_token.split_first() {
            Some(split) => split,
            None => return Vec::new(),
        };

        let mut results: Vec<SearchResult> = Vec::new();
        'candidates: for (key, quality) in first {
            if !filter.accepts(key.0) {
                continue;
            }
            let mut weakest = *quality;
            for grades in rest {
                match grades.get(key) {
                    Some(q) => weakest = weakest.min(*q),
                    None => continue 'candidates,
                }
            }
            if let Some(doc) = self.docs.get(key) {
                if !filter.accepts_doc(doc) {
                    continue;
                }
                results.push(SearchResult {
                    kind: key.0,
                    id: key.1,
                    title: doc.title.clone(),
                    subtitle: doc.subtitle.clone(),
                    amount: doc.amount,
                    quality: weakest,
                    timestamp: doc.timestamp,
                });
            }
        }

        results.sort_by(|a, b| {
            b.quality
                .cmp(&a.quality)
                .then(b.timestamp.cmp(&a.timestamp))
                .then(a.kind.search_rank().cmp(&b.kind.search_rank()))
                .then(a.id.cmp(&b.id))
        });

        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }
        results
    }

    fn insert(&mut self, key: EntityKey, doc: IndexedDoc) {
        for token in &doc.tokens {
            self.tokens.entry(token.clone()).or_default().insert(key);
        }
        self.docs.insert(key, doc);
    }
}

/// Project an entity snapshot into its indexable form. Orphaned entities
/// project to nothing: they are excluded from search entirely. The store
/// is consulted for related display names (a transaction indexes its
/// account and category names alongside its own fields).
fn project(store: &EntityStore, snapshot: &EntitySnapshot) -> Option<IndexedDoc> {
    let doc = match snapshot {
        EntitySnapshot::Account(a) => IndexedDoc {
            tokens: tokenize(&format!("{} {}", a.name, a.kind)),
            title: a.name.clone(),
            subtitle: Some(a.kind.to_string()),
            amount: None,
            timestamp: a.created_at,
        },
        EntitySnapshot::Transaction(t) => {
            if t.orphaned {
                return None;
            }
            let account_name = store.account(t.account_id).ok().map(|a| a.name.clone());
            let category_name = t
                .category_id
                .and_then(|id| store.category(id).ok())
                .map(|c| c.name.clone());
            let text = format!(
                "{} {} {} {} {}",
                t.title,
                t.amount.to_decimal_string(),
                t.kind,
                account_name.as_deref().unwrap_or(""),
                category_name.as_deref().unwrap_or(""),
            );
            IndexedDoc {
                tokens: tokenize(&text),
                title: t.title.clone(),
                subtitle: account_name,
                amount: Some(t.amount),
                timestamp: t.timestamp,
            }
        }
        EntitySnapshot::Category(c) => IndexedDoc {
            tokens: tokenize(&c.name),
            title: c.name.clone(),
            subtitle: None,
            amount: None,
            timestamp: c.created_at,
        },
        EntitySnapshot::Budget(b) => {
            let category_name = store
                .category(b.category_id)
                .ok()
                .map(|c| c.name.clone());
            let text = format!(
                "budget {} {}",
                category_name.as_deref().unwrap_or(""),
                b.limit.to_decimal_string()
            );
            IndexedDoc {
                tokens: tokenize(&text),
                title: category_name.unwrap_or_else(|| "Budget".to_string()),
                subtitle: Some(b.period.to_string()),
                amount: Some(b.limit),
                timestamp: b.created_at,
            }
        }
        EntitySnapshot::Subscription(s) => IndexedDoc {
            tokens: tokenize(&format!(
                "{} {} {}",
                s.name,
                s.amount.to_decimal_string(),
                s.cadence
            )),
            title: s.name.clone(),
            subtitle: Some(s.cadence.to_string()),
            amount: Some(s.amount),
            timestamp: s.created_at,
        },
        EntitySnapshot::SavingsGoal(g) => IndexedDoc {
            tokens: tokenize(&format!("{} {}", g.name, g.target.to_decimal_string())),
            title: g.name.clone(),
            subtitle: None,
            amount: Some(g.target),
            timestamp: g.created_at,
        },
        EntitySnapshot::Insight(i) => {
            if i.orphaned {
                return None;
            }
            IndexedDoc {
                tokens: tokenize(&format!("{} {} {}", i.title, i.body, i.kind.label())),
                title: i.title.clone(),
                subtitle: Some(i.kind.label().to_string()),
                amount: None,
                timestamp: i.created_at,
            }
        }
    };

    let mut doc = doc;
    doc.tokens.sort();
    doc.tokens.dedup();
    if doc.tokens.is_empty() {
        return None;
    }
    Some(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::EntityStore;
    use crate::models::{
        Account, AccountKind, ExpenseCategory, Insight, InsightKind, InsightPriority, InsightRefs,
        Transaction, TransactionKind,
    };
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn indexed_store() -> (EntityStore, SearchIndex) {
        let mut store = EntityStore::new();
        let mut index = SearchIndex::new();

        let account = Account::new("Rent Account", AccountKind::Checking);
        let account_id = account.id;
        let event = store.insert_account(account).unwrap();
        index.apply(&store, &event);

        let rent = Transaction::new(
            account_id,
            "Rent Payment",
            Money::from_cents(135_000),
            TransactionKind::Expense,
            ts(2026, 1, 1),
        );
        let event = store.insert_transaction(rent).unwrap();
        index.apply(&store, &event);

        let other = Transaction::new(
            account_id,
            "Groceries",
            Money::from_cents(8_000),
            TransactionKind::Expense,
            ts(2026, 1, 2),
        );
        let event = store.insert_transaction(other).unwrap();
        index.apply(&store, &event);

        (store, index)
    }

    #[test]
    fn test_search_matches_and_ranks() {
        let (_store, index) = indexed_store();

        let results = index.search("payment", &SearchFilter::all());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Rent Payment");
        assert_eq!(results[0].subtitle.as_deref(), Some("Rent Account"));
        assert_eq!(results[0].amount, Some(Money::from_cents(135_000)));
        assert_eq!(results[0].quality, MatchQuality::Exact);

        assert_eq!(index.search("groc", &SearchFilter::all()).len(), 1);
        assert!(index.search("zzz", &SearchFilter::all()).is_empty());
        assert!(index.search("", &SearchFilter::all()).is_empty());
    }

    #[test]
    fn test_quality_outranks_recency() {
        let mut store = EntityStore::new();
        let mut index = SearchIndex::new();
        let account = Account::new("Main", AccountKind::Checking);
        let account_id = account.id;
        let event = store.insert_account(account).unwrap();
        index.apply(&store, &event);

        // newest to oldest: substring, prefix, exact
        for (title, day) in [("Parental leave pay", 3), ("Car Rental", 2), ("Rent Payment", 1)] {
            let event = store
                .insert_transaction(Transaction::new(
                    account_id,
                    title,
                    Money::from_cents(1_000),
                    TransactionKind::Expense,
                    ts(2026, 1, day),
                ))
                .unwrap();
            index.apply(&store, &event);
        }

        let results = index.search("rent", &SearchFilter::all());
        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        // exact beats prefix beats substring, despite recency
        assert_eq!(titles, vec!["Rent Payment", "Car Rental", "Parental leave pay"]);
    }

    #[test]
    fn test_amount_and_related_names_searchable() {
        let (_store, index) = indexed_store();
        let results = index.search("1350", &SearchFilter::all());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Rent Payment");

        // the account name is indexed on its transactions too
        let by_account = index.search("account", &SearchFilter::all());
        assert_eq!(by_account.len(), 3);
    }

    #[test]
    fn test_multi_token_query_requires_all_tokens() {
        let (_store, index) = indexed_store();
        assert_eq!(index.search("rent payment", &SearchFilter::all()).len(), 1);
        assert!(index.search("rent zzz", &SearchFilter::all()).is_empty());
    }

    #[test]
    fn test_kind_filter() {
        let (_store, index) = indexed_store();
        let accounts_only = index.search("rent", &SearchFilter::kind(EntityKind::Account));
        assert_eq!(accounts_only.len(), 1);
        assert_eq!(accounts_only[0].kind, EntityKind::Account);
    }

    #[test]
    fn test_date_and_amount_filters() {
        let (_store, index) = indexed_store();

        let jan_2_only = SearchFilter::all().between(ts(2026, 1, 2), ts(2026, 1, 31));
        let results = index.search("rent", &jan_2_only);
        // the account passes no timestamp in that window; only Groceries
        // does, and it doesn't match "rent"
        assert!(results.iter().all(|r| r.timestamp >= ts(2026, 1, 2)));

        let large = SearchFilter::all()
            .amount_between(Money::from_cents(100_000), Money::from_cents(200_000));
        let results = index.search("rent", &large);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Rent Payment");
    }

    #[test]
    fn test_rename_removes_old_tokens() {
        let mut store = EntityStore::new();
        let mut index = SearchIndex::new();

        let account = Account::new("Old Name", AccountKind::Checking);
        let id = account.id;
        let event = store.insert_account(account).unwrap();
        index.apply(&store, &event);
        assert_eq!(index.search("old", &SearchFilter::all()).len(), 1);

        let event = store.modify_account(id, |a| a.rename("Fresh Name")).unwrap();
        index.apply(&store, &event);

        assert!(index.search("old", &SearchFilter::all()).is_empty());
        assert_eq!(index.search("fresh", &SearchFilter::all()).len(), 1);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut store = EntityStore::new();
        let mut index = SearchIndex::new();

        let account = Account::new("Checking", AccountKind::Checking);
        let event = store.insert_account(account).unwrap();
        index.apply(&store, &event);
        index.apply(&store, &event);

        assert_eq!(index.len(), 1);
        assert_eq!(index.search("checking", &SearchFilter::all()).len(), 1);
    }

    #[test]
    fn test_orphaned_insight_leaves_index() {
        let mut store = EntityStore::new();
        let mut index = SearchIndex::new();

        let category = ExpenseCategory::new("Dining");
        let category_id = category.id;
        let event = store.insert_category(category).unwrap();
        index.apply(&store, &event);

        let insight = Insight::new(
            InsightKind::SpendingPattern,
            "Dining is trending up",
            "",
            InsightPriority::Medium,
            InsightRefs::category(category_id),
        );
        let event = store.insert_insight(insight).unwrap();
        index.apply(&store, &event);
        assert_eq!(index.search("trending", &SearchFilter::all()).len(), 1);

        for event in store.delete_category(category_id).unwrap() {
            index.apply(&store, &event);
        }
        assert!(index.search("trending", &SearchFilter::all()).is_empty());
    }

    #[test]
    fn test_rebuild_matches_incremental() {
        let (store, index) = indexed_store();

        let mut rebuilt = SearchIndex::new();
        rebuilt.rebuild(&store);

        assert_eq!(rebuilt.len(), index.len());
        let a = index.search("rent", &SearchFilter::all());
        let b = rebuilt.search("rent", &SearchFilter::all());
        assert_eq!(a, b);
    }

    #[test]
    fn test_repeated_search_is_identical() {
        let (_store, index) = indexed_store();

        let filter = SearchFilter::all();
        let first = index.search("rent", &filter);
        let second = index.search("rent", &filter);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_limit() {
        let (_store, index) = indexed_store();
        let results = index.search("rent", &SearchFilter::all().with_limit(1));
        assert_eq!(results.len(), 1);
    }
}
