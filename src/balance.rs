//! Balance aggregation engine
//!
//! Derived monetary values (account balances, category totals, budget
//! spend, goal progress) are cached lazily: a read computes and caches,
//! a committed write invalidates only the entries its change event can
//! affect. The entity store stays the single source of truth; dropping
//! every cache entry is always safe and never changes a result.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{ChangeEvent, EntitySnapshot, EntityStore};
use crate::models::{AccountId, BudgetId, CategoryId, Money, SavingsGoalId, Transaction};

/// Lazy cache layer over the entity store for derived monetary values
#[derive(Debug, Default)]
pub struct BalanceEngine {
    account_balances: RwLock<HashMap<AccountId, Money>>,
    category_totals: RwLock<HashMap<CategoryId, Money>>,
    budget_spent: RwLock<HashMap<BudgetId, Money>>,
    goal_progress: RwLock<HashMap<SavingsGoalId, Money>>,
}

impl BalanceEngine {
    /// Create an engine with all caches empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of an account: opening balance plus the signed sum
    /// of its non-orphaned transactions
    pub fn current_balance(&self, store: &EntityStore, id: AccountId) -> LedgerResult<Money> {
        let account = store.account(id)?;

        if let Some(cached) = self.read_cache(&self.account_balances, &id)? {
            return Ok(cached);
        }

        let balance = account.opening_balance
            + store
                .transactions()
                .filter(|t| t.account_id == id && !t.orphaned)
                .map(Transaction::signed_amount)
                .sum::<Money>();

        self.write_cache(&self.account_balances, id, balance)?;
        Ok(balance)
    }

    /// Total spent in a category: the sum of its non-orphaned expense
    /// transaction amounts, as a positive magnitude
    pub fn category_total(&self, store: &EntityStore, id: CategoryId) -> LedgerResult<Money> {
        store.category(id)?;

        if let Some(cached) = self.read_cache(&self.category_totals, &id)? {
            return Ok(cached);
        }

        let total = store
            .transactions()
            .filter(|t| t.category_id == Some(id) && t.is_expense() && !t.orphaned)
            .map(|t| t.amount)
            .sum::<Money>();

        self.write_cache(&self.category_totals, id, total)?;
        Ok(total)
    }

    /// Spend recorded against a budget: expense transactions in the
    /// budget's category whose timestamp falls inside its period
    pub fn budget_spent(&self, store: &EntityStore, id: BudgetId) -> LedgerResult<Money> {
        let budget = store.budget(id)?;

        if let Some(cached) = self.read_cache(&self.budget_spent, &id)? {
            return Ok(cached);
        }

        let spent = store
            .transactions()
            .filter(|t| {
                t.category_id == Some(budget.category_id)
                    && t.is_expense()
                    && !t.orphaned
                    && budget.period.contains(t.timestamp.date_naive())
            })
            .map(|t| t.amount)
            .sum::<Money>();

        self.write_cache(&self.budget_spent, id, spent)?;
        Ok(spent)
    }

    /// Remaining headroom on a budget (limit minus spent; negative when
    /// over budget)
    pub fn budget_remaining(&self, store: &EntityStore, id: BudgetId) -> LedgerResult<Money> {
        let limit = store.budget(id)?.limit;
        Ok(limit - self.budget_spent(store, id)?)
    }

    /// Progress toward a savings goal: the sum of its contributions
    pub fn savings_progress(&self, store: &EntityStore, id: SavingsGoalId) -> LedgerResult<Money> {
        let goal = store.goal(id)?;

        if let Some(cached) = self.read_cache(&self.goal_progress, &id)? {
            return Ok(cached);
        }

        let progress = goal.contributed();
        self.write_cache(&self.goal_progress, id, progress)?;
        Ok(progress)
    }

    /// Invalidate exactly the cache entries a committed change can affect
    pub fn apply(&self, store: &EntityStore, event: &ChangeEvent) -> LedgerResult<()> {
        for snapshot in [event.before(), event.after()].into_iter().flatten() {
            match snapshot {
                EntitySnapshot::Account(account) => {
                    self.evict(&self.account_balances, &account.id)?;
                }
                EntitySnapshot::Transaction(txn) => {
                    self.evict(&self.account_balances, &txn.account_id)?;
                    if let Some(category_id) = txn.category_id {
                        self.evict(&self.category_totals, &category_id)?;
                        self.evict_budgets_for_category(store, category_id)?;
                    }
                }
                EntitySnapshot::Category(category) => {
                    self.evict(&self.category_totals, &category.id)?;
                }
                EntitySnapshot::Budget(budget) => {
                    self.evict(&self.budget_spent, &budget.id)?;
                }
                EntitySnapshot::SavingsGoal(goal) => {
                    self.evict(&self.goal_progress, &goal.id)?;
                }
                EntitySnapshot::Subscription(_) | EntitySnapshot::Insight(_) => {}
            }
        }
        Ok(())
    }

    /// Drop every cached value; the next read of each figure recomputes it
    pub fn invalidate_all(&self) -> LedgerResult<()> {
        self.lock_write(&self.account_balances)?.clear();
        self.lock_write(&self.category_totals)?.clear();
        self.lock_write(&self.budget_spent)?.clear();
        self.lock_write(&self.goal_progress)?.clear();
        Ok(())
    }

    fn evict_budgets_for_category(
        &self,
        store: &EntityStore,
        category_id: CategoryId,
    ) -> LedgerResult<()> {
        let affected: Vec<BudgetId> = store
            .budgets()
            .filter(|b| b.category_id == category_id)
            .map(|b| b.id)
            .collect();
        let mut cache = self.lock_write(&self.budget_spent)?;
        for id in affected {
            cache.remove(&id);
        }
        Ok(())
    }

    fn read_cache<K: std::hash::Hash + Eq>(
        &self,
        cache: &RwLock<HashMap<K, Money>>,
        key: &K,
    ) -> LedgerResult<Option<Money>> {
        let guard = cache
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(guard.get(key).copied())
    }

    fn write_cache<K: std::hash::Hash + Eq>(
        &self,
        cache: &RwLock<HashMap<K, Money>>,
        key: K,
        value: Money,
    ) -> LedgerResult<()> {
        self.lock_write(cache)?.insert(key, value);
        Ok(())
    }

    fn evict<K: std::hash::Hash + Eq>(
        &self,
        cache: &RwLock<HashMap<K, Money>>,
        key: &K,
    ) -> LedgerResult<()> {
        self.lock_write(cache)?.remove(key);
        Ok(())
    }

    fn lock_write<'a, K>(
        &self,
        cache: &'a RwLock<HashMap<K, Money>>,
    ) -> LedgerResult<std::sync::RwLockWriteGuard<'a, HashMap<K, Money>>> {
        cache
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}
