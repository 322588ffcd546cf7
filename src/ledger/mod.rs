//! Ledger coordinator
//!
//! `Ledger` owns the entity store and its derived-state observers (the
//! balance engine, the search index, and the change journal) and routes
//! every committed change event to each of them exactly once. All
//! mutations go through `&mut self`, so writers are serialized by the
//! borrow checker; reads share `&self`.

pub mod events;
pub mod journal;
pub mod store;

pub use events::{ChangeEvent, ChangeOp, EntityKey, EntityKind, EntitySnapshot};
pub use journal::{ChangeJournal, JournalEntry};
pub use store::{DeletePolicy, EntityStore};

use chrono::{DateTime, Utc};

use crate::balance::BalanceEngine;
use crate::error::LedgerResult;
use crate::import::{ImportPipeline, ImportResult, RawRecord};
use crate::models::{
    Account, AccountId, Budget, BudgetId, CategoryId, Contribution, ExpenseCategory, Insight,
    InsightId, Money, SavingsGoal, SavingsGoalId, Subscription, SubscriptionId, Transaction,
    TransactionId,
};
use crate::search::{SearchFilter, SearchIndex, SearchResult};
use crate::snapshot::{LedgerSnapshot, SnapshotStore};

/// The ledger core: entities plus every derived view over them
#[derive(Debug, Default)]
pub struct Ledger {
    store: EntityStore,
    balances: BalanceEngine,
    index: SearchIndex,
    journal: ChangeJournal,
    delete_policy: DeletePolicy,
}

impl Ledger {
    /// Create an empty ledger with the default delete policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty ledger with an explicit delete policy
    pub fn with_delete_policy(delete_policy: DeletePolicy) -> Self {
        Self {
            delete_policy,
            ..Self::default()
        }
    }

    /// The configured delete policy
    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    // ---- persistence ----

    /// Load a ledger from a snapshot store. Derived state is rebuilt
    /// from the entities, never trusted from disk.
    pub fn load_from(storage: &impl SnapshotStore) -> LedgerResult<Self> {
        let (store, journal) = storage.load()?.into_store();
        let mut index = SearchIndex::new();
        index.rebuild(&store);
        Ok(Self {
            store,
            balances: BalanceEngine::new(),
            index,
            journal,
            delete_policy: DeletePolicy::default(),
        })
    }

    /// Persist the ledger to a snapshot store
    pub fn save_to(&self, storage: &impl SnapshotStore) -> LedgerResult<()> {
        storage.save(&LedgerSnapshot::capture(&self.store, &self.journal))
    }

    // ---- accounts ----

    /// Add an account, returning its id
    pub fn add_account(&mut self, account: Account) -> LedgerResult<AccountId> {
        let id = account.id;
        let event = self.store.insert_account(account)?;
        self.commit(event)?;
        Ok(id)
    }

    /// Rename an account
    pub fn rename_account(&mut self, id: AccountId, name: &str) -> LedgerResult<()> {
        let event = self.store.modify_account(id, |a| a.rename(name))?;
        self.commit(event)
    }

    /// Set an account's icon tag
    pub fn set_account_icon(&mut self, id: AccountId, icon: &str) -> LedgerResult<()> {
        let event = self.store.modify_account(id, |a| a.set_icon(icon))?;
        self.commit(event)
    }

    /// Delete an account under the ledger's configured policy
    pub fn delete_account(&mut self, id: AccountId) -> LedgerResult<()> {
        self.delete_account_with(id, self.delete_policy)
    }

    /// Delete an account under an explicit policy
    pub fn delete_account_with(&mut self, id: AccountId, policy: DeletePolicy) -> LedgerResult<()> {
        let events = self.store.delete_account(id, policy)?;
        self.commit_all(events)
    }

    /// Look up an account
    pub fn account(&self, id: AccountId) -> LedgerResult<&Account> {
        self.store.account(id)
    }

    /// All accounts, sorted by name
    pub fn accounts(&self) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self.store.accounts().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        accounts
    }

    // ---- transactions ----

    /// Record a transaction, returning its id
    pub fn record_transaction(&mut self, transaction: Transaction) -> LedgerResult<TransactionId> {
        let id = transaction.id;
        let event = self.store.insert_transaction(transaction)?;
        self.commit(event)?;
        Ok(id)
    }

    /// Move a transaction to a different category (or none)
    pub fn recategorize_transaction(
        &mut self,
        id: TransactionId,
        category_id: Option<CategoryId>,
    ) -> LedgerResult<()> {
        let event = self.store.recategorize_transaction(id, category_id)?;
        self.commit(event)
    }

    /// Delete a transaction
    pub fn delete_transaction(&mut self, id: TransactionId) -> LedgerResult<()> {
        let event = self.store.delete_transaction(id)?;
        self.commit(event)
    }

    /// Look up a transaction
    pub fn transaction(&self, id: TransactionId) -> LedgerResult<&Transaction> {
        self.store.transaction(id)
    }

    /// Non-orphaned transactions for an account, newest first
    pub fn account_transactions(&self, id: AccountId) -> Vec<&Transaction> {
        let mut transactions: Vec<&Transaction> = self
            .store
            .transactions()
            .filter(|t| t.account_id == id && !t.orphaned)
            .collect();
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        transactions
    }

    // ---- categories ----

    /// Add a category, returning its id
    pub fn add_category(&mut self, category: ExpenseCategory) -> LedgerResult<CategoryId> {
        let id = category.id;
        let event = self.store.insert_category(category)?;
        self.commit(event)?;
        Ok(id)
    }

    /// Rename a category
    pub fn rename_category(&mut self, id: CategoryId, name: &str) -> LedgerResult<()> {
        let event = self.store.modify_category(id, |c| c.rename(name))?;
        self.commit(event)
    }

    /// Delete a category; member transactions become uncategorized
    pub fn delete_category(&mut self, id: CategoryId) -> LedgerResult<()> {
        let events = self.store.delete_category(id)?;
        self.commit_all(events)
    }

    /// Look up a category
    pub fn category(&self, id: CategoryId) -> LedgerResult<&ExpenseCategory> {
        self.store.category(id)
    }

    /// All categories, sorted by name
    pub fn categories(&self) -> Vec<&ExpenseCategory> {
        let mut categories: Vec<&ExpenseCategory> = self.store.categories().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    // ---- budgets ----

    /// Add a budget, returning its id
    pub fn add_budget(&mut self, budget: Budget) -> LedgerResult<BudgetId> {
        let id = budget.id;
        let event = self.store.insert_budget(budget)?;
        self.commit(event)?;
        Ok(id)
    }

    /// Change a budget's spending limit
    pub fn set_budget_limit(&mut self, id: BudgetId, limit: Money) -> LedgerResult<()> {
        let event = self.store.modify_budget(id, |b| b.set_limit(limit))?;
        self.commit(event)
    }

    /// Delete a budget
    pub fn delete_budget(&mut self, id: BudgetId) -> LedgerResult<()> {
        let events = self.store.delete_budget(id)?;
        self.commit_all(events)
    }

    /// Look up a budget
    pub fn budget(&self, id: BudgetId) -> LedgerResult<&Budget> {
        self.store.budget(id)
    }

    // ---- subscriptions ----

    /// Add a subscription, returning its id
    pub fn add_subscription(&mut self, subscription: Subscription) -> LedgerResult<SubscriptionId> {
        let id = subscription.id;
        let event = self.store.insert_subscription(subscription)?;
        self.commit(event)?;
        Ok(id)
    }

    /// Roll a subscription's next-due date forward one cadence step
    pub fn advance_subscription(&mut self, id: SubscriptionId) -> LedgerResult<()> {
        let event = self.store.advance_subscription(id)?;
        self.commit(event)
    }

    /// Delete a subscription
    pub fn delete_subscription(&mut self, id: SubscriptionId) -> LedgerResult<()> {
        let event = self.store.delete_subscription(id)?;
        self.commit(event)
    }

    /// Look up a subscription
    pub fn subscription(&self, id: SubscriptionId) -> LedgerResult<&Subscription> {
        self.store.subscription(id)
    }

    /// Subscriptions due on or before a date, soonest first
    pub fn subscriptions_due_by(&self, date: chrono::NaiveDate) -> Vec<&Subscription> {
        let mut due: Vec<&Subscription> = self
            .store
            .subscriptions()
            .filter(|s| s.next_due <= date)
            .collect();
        due.sort_by(|a, b| a.next_due.cmp(&b.next_due));
        due
    }

    // ---- savings goals ----

    /// Add a savings goal, returning its id
    pub fn add_goal(&mut self, goal: SavingsGoal) -> LedgerResult<SavingsGoalId> {
        let id = goal.id;
        let event = self.store.insert_goal(goal)?;
        self.commit(event)?;
        Ok(id)
    }

    /// Record a contribution toward a goal
    pub fn contribute_to_goal(
        &mut self,
        id: SavingsGoalId,
        contribution: Contribution,
    ) -> LedgerResult<()> {
        let event = self.store.add_contribution(id, contribution)?;
        self.commit(event)
    }

    /// Delete a savings goal
    pub fn delete_goal(&mut self, id: SavingsGoalId) -> LedgerResult<()> {
        let event = self.store.delete_goal(id)?;
        self.commit(event)
    }

    /// Look up a savings goal
    pub fn goal(&self, id: SavingsGoalId) -> LedgerResult<&SavingsGoal> {
        self.store.goal(id)
    }

    // ---- insights ----

    /// Accept an insight from the analysis collaborator, returning its id
    pub fn record_insight(&mut self, insight: Insight) -> LedgerResult<InsightId> {
        let id = insight.id;
        let event = self.store.insert_insight(insight)?;
        self.commit(event)?;
        Ok(id)
    }

    /// Delete an insight outright
    pub fn delete_insight(&mut self, id: InsightId) -> LedgerResult<()> {
        let event = self.store.delete_insight(id)?;
        self.commit(event)
    }

    /// Look up an insight, orphaned or not
    pub fn insight(&self, id: InsightId) -> LedgerResult<&Insight> {
        self.store.insight(id)
    }

    /// Surfaceable insights: non-orphaned, newest first
    pub fn active_insights(&self) -> Vec<&Insight> {
        let mut insights: Vec<&Insight> =
            self.store.insights().filter(|i| !i.orphaned).collect();
        insights.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        insights
    }

    /// Surfaceable insights referencing an account, newest first
    pub fn insights_for_account(&self, id: AccountId) -> Vec<&Insight> {
        let mut insights: Vec<&Insight> = self
            .store
            .insights()
            .filter(|i| !i.orphaned && i.references_account(id))
            .collect();
        insights.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        insights
    }

    /// Surfaceable insights referencing a category, newest first
    pub fn insights_for_category(&self, id: CategoryId) -> Vec<&Insight> {
        let mut insights: Vec<&Insight> = self
            .store
            .insights()
            .filter(|i| !i.orphaned && i.references_category(id))
            .collect();
        insights.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        insights
    }

    // ---- derived reads ----

    /// Current balance of an account
    pub fn current_balance(&self, id: AccountId) -> LedgerResult<Money> {
        self.balances.current_balance(&self.store, id)
    }

    /// Total spent in a category
    pub fn category_total(&self, id: CategoryId) -> LedgerResult<Money> {
        self.balances.category_total(&self.store, id)
    }

    /// Spend recorded against a budget
    pub fn budget_spent(&self, id: BudgetId) -> LedgerResult<Money> {
        self.balances.budget_spent(&self.store, id)
    }

    /// Remaining headroom on a budget
    pub fn budget_remaining(&self, id: BudgetId) -> LedgerResult<Money> {
        self.balances.budget_remaining(&self.store, id)
    }

    /// Progress toward a savings goal
    pub fn savings_progress(&self, id: SavingsGoalId) -> LedgerResult<Money> {
        self.balances.savings_progress(&self.store, id)
    }

    /// Net worth: the sum of every account's current balance
    pub fn net_worth(&self) -> LedgerResult<Money> {
        let mut total = Money::zero();
        for account in self.store.accounts() {
            total += self.balances.current_balance(&self.store, account.id)?;
        }
        Ok(total)
    }

    // ---- search ----

    /// Ranked search over all indexed entities
    pub fn search(&self, query: &str, filter: &SearchFilter) -> Vec<SearchResult> {
        self.index.search(query, filter)
    }

    /// Rebuild the search index from scratch
    pub fn rebuild_search_index(&mut self) {
        self.index.rebuild(&self.store);
    }

    // ---- import ----

    /// Import a batch of raw records with partial-failure semantics
    pub fn import_records(&mut self, records: Vec<RawRecord>) -> LedgerResult<ImportResult> {
        let (result, events) = ImportPipeline::new(&mut self.store).import_records(records);
        self.commit_all(events)?;
        Ok(result)
    }

    /// Import transactions from CSV text
    pub fn import_csv<R: std::io::Read>(&mut self, reader: R) -> LedgerResult<ImportResult> {
        let (result, events) = ImportPipeline::new(&mut self.store).import_csv(reader);
        self.commit_all(events)?;
        Ok(result)
    }

    // ---- journal ----

    /// The change journal
    pub fn journal(&self) -> &ChangeJournal {
        &self.journal
    }

    /// The most recent journal entries, newest first
    pub fn recent_changes(&self, limit: usize) -> Vec<&JournalEntry> {
        self.journal.recent(limit)
    }

    /// Journal entries since a point in time, oldest first
    pub fn changes_since(&self, since: DateTime<Utc>) -> Vec<&JournalEntry> {
        self.journal
            .entries()
            .iter()
            .filter(|e| e.timestamp >= since)
            .collect()
    }

    // ---- event routing ----

    /// Route one committed event to every observer
    fn commit(&mut self, event: ChangeEvent) -> LedgerResult<()> {
        self.balances.apply(&self.store, &event)?;
        self.index.apply(&self.store, &event);
        self.reindex_dependents(&event);
        self.journal.record_event(&event);
        Ok(())
    }

    /// Transactions index their account and category names, so a parent
    /// rename has to re-project the member transactions
    fn reindex_dependents(&mut self, event: &ChangeEvent) {
        if let ChangeEvent::Updated { before, after } = event {
            let stale: Vec<Transaction> = match (before, after) {
                (EntitySnapshot::Account(b), EntitySnapshot::Account(a)) if b.name != a.name => {
                    self.store
                        .transactions()
                        .filter(|t| t.account_id == a.id && !t.orphaned)
                        .cloned()
                        .collect()
                }
                (EntitySnapshot::Category(b), EntitySnapshot::Category(a)) if b.name != a.name => {
                    self.store
                        .transactions()
                        .filter(|t| t.category_id == Some(a.id) && !t.orphaned)
                        .cloned()
                        .collect()
                }
                _ => Vec::new(),
            };
            for txn in stale {
                self.index
                    .reindex(&self.store, &EntitySnapshot::Transaction(txn));
            }
        }
    }

    /// Route a batch of committed events, in order
    fn commit_all(&mut self, events: Vec<ChangeEvent>) -> LedgerResult<()> {
        for event in events {
            self.commit(event)?;
        }
        Ok(())
    }
}
