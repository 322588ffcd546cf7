//! Entity store
//!
//! The single in-memory arena holding every entity, keyed by typed id.
//! Relationship edges are plain ids, never owned sub-objects, so deletes
//! and re-links only ever touch one map at a time. Every mutation follows
//! the same shape: clone, modify, validate, commit, and return the change
//! events describing exactly what was committed. A failed validation
//! leaves the store untouched.

use std::collections::HashMap;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, AccountId, Budget, BudgetId, CategoryId, Contribution, ExpenseCategory, Insight,
    InsightId, SavingsGoal, SavingsGoalId, Subscription, SubscriptionId, Transaction,
    TransactionId,
};

use super::events::{ChangeEvent, EntitySnapshot};

/// What happens to dependents when an entity with children is deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Keep dependents, flagged as orphaned and excluded from read paths
    #[default]
    OrphanAndFlag,
    /// Delete dependents along with the parent
    Cascade,
}

/// In-memory arena of all ledger entities
#[derive(Debug, Default, Clone)]
pub struct EntityStore {
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
    categories: HashMap<CategoryId, ExpenseCategory>,
    budgets: HashMap<BudgetId, Budget>,
    subscriptions: HashMap<SubscriptionId, Subscription>,
    goals: HashMap<SavingsGoalId, SavingsGoal>,
    insights: HashMap<InsightId, Insight>,
}

impl EntityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ---- accounts ----

    /// Look up an account by id
    pub fn account(&self, id: AccountId) -> LedgerResult<&Account> {
        self.accounts
            .get(&id)
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))
    }

    /// Look up an account by name, case-insensitively
    pub fn account_by_name(&self, name: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|a| a.name.eq_ignore_ascii_case(name.trim()))
    }

    /// All accounts, unordered
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Insert a new account
    pub fn insert_account(&mut self, account: Account) -> LedgerResult<ChangeEvent> {
        account
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        if self.account_by_name(&account.name).is_some() {
            return Err(LedgerError::Duplicate {
                entity_type: "Account",
                identifier: account.name.clone(),
            });
        }

        let event = ChangeEvent::created(EntitySnapshot::Account(account.clone()));
        self.accounts.insert(account.id, account);
        Ok(event)
    }

    /// Modify an account in place; the mutation is validated against the
    /// account invariants before anything is committed
    pub fn modify_account(
        &mut self,
        id: AccountId,
        f: impl FnOnce(&mut Account),
    ) -> LedgerResult<ChangeEvent> {
        let before = self.account(id)?.clone();

        let mut updated = before.clone();
        f(&mut updated);
        updated
            .validate()
            .map_err(|e| LedgerError::InvariantViolation(e.to_string()))?;

        if !updated.name.eq_ignore_ascii_case(&before.name)
            && self.account_by_name(&updated.name).is_some()
        {
            return Err(LedgerError::Duplicate {
                entity_type: "Account",
                identifier: updated.name.clone(),
            });
        }

        let event = ChangeEvent::updated(
            EntitySnapshot::Account(before),
            EntitySnapshot::Account(updated.clone()),
        );
        self.accounts.insert(id, updated);
        Ok(event)
    }

    /// Delete an account and resolve its dependents per the policy.
    ///
    /// Subscriptions billing against the account are removed under either
    /// policy; they cannot exist without one. Owned transactions are
    /// deleted under `Cascade` and flagged orphaned under `OrphanAndFlag`.
    /// Insights referencing the account are always flagged, never deleted.
    pub fn delete_account(
        &mut self,
        id: AccountId,
        policy: DeletePolicy,
    ) -> LedgerResult<Vec<ChangeEvent>> {
        let account = self.account(id)?.clone();
        let mut events = Vec::new();

        let owned: Vec<TransactionId> = self
            .transactions
            .values()
            .filter(|t| t.account_id == id)
            .map(|t| t.id)
            .collect();

        for txn_id in owned {
            match policy {
                DeletePolicy::Cascade => {
                    if let Some(txn) = self.transactions.remove(&txn_id) {
                        events.push(ChangeEvent::deleted(EntitySnapshot::Transaction(txn)));
                    }
                }
                DeletePolicy::OrphanAndFlag => {
                    if let Some(txn) = self.transactions.get_mut(&txn_id) {
                        if !txn.orphaned {
                            let before = txn.clone();
                            txn.mark_orphaned();
                            events.push(ChangeEvent::updated(
                                EntitySnapshot::Transaction(before),
                                EntitySnapshot::Transaction(txn.clone()),
                            ));
                        }
                    }
                }
            }
        }

        let billing: Vec<SubscriptionId> = self
            .subscriptions
            .values()
            .filter(|s| s.account_id == id)
            .map(|s| s.id)
            .collect();
        for sub_id in billing {
            if let Some(sub) = self.subscriptions.remove(&sub_id) {
                events.push(ChangeEvent::deleted(EntitySnapshot::Subscription(sub)));
            }
        }

        events.extend(self.orphan_insights(|i| i.references_account(id)));

        self.accounts.remove(&id);
        events.push(ChangeEvent::deleted(EntitySnapshot::Account(account)));
        Ok(events)
    }

    // ---- transactions ----

    /// Look up a transaction by id
    pub fn transaction(&self, id: TransactionId) -> LedgerResult<&Transaction> {
        self.transactions
            .get(&id)
            .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))
    }

    /// All transactions, unordered
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    /// Insert a new transaction; its account (and category, if set) must
    /// already exist
    pub fn insert_transaction(&mut self, transaction: Transaction) -> LedgerResult<ChangeEvent> {
        transaction
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        if !self.accounts.contains_key(&transaction.account_id) {
            return Err(LedgerError::StaleReference(format!(
                "transaction {} references missing account {}",
                transaction.id, transaction.account_id
            )));
        }
        if let Some(category_id) = transaction.category_id {
            if !self.categories.contains_key(&category_id) {
                return Err(LedgerError::StaleReference(format!(
                    "transaction {} references missing category {}",
                    transaction.id, category_id
                )));
            }
        }

        let event = ChangeEvent::created(EntitySnapshot::Transaction(transaction.clone()));
        self.transactions.insert(transaction.id, transaction);
        Ok(event)
    }

    /// Re-link a committed transaction to a different category (or none).
    /// This is the only post-commit edit a transaction supports.
    pub fn recategorize_transaction(
        &mut self,
        id: TransactionId,
        category_id: Option<CategoryId>,
    ) -> LedgerResult<ChangeEvent> {
        if let Some(cat_id) = category_id {
            if !self.categories.contains_key(&cat_id) {
                return Err(LedgerError::category_not_found(cat_id.to_string()));
            }
        }

        let before = self.transaction(id)?.clone();
        let mut updated = before.clone();
        updated.set_category(category_id);

        let event = ChangeEvent::updated(
            EntitySnapshot::Transaction(before),
            EntitySnapshot::Transaction(updated.clone()),
        );
        self.transactions.insert(id, updated);
        Ok(event)
    }

    /// Delete a transaction
    pub fn delete_transaction(&mut self, id: TransactionId) -> LedgerResult<ChangeEvent> {
        let transaction = self.transaction(id)?.clone();
        self.transactions.remove(&id);
        Ok(ChangeEvent::deleted(EntitySnapshot::Transaction(
            transaction,
        )))
    }

    // ---- categories ----

    /// Look up a category by id
    pub fn category(&self, id: CategoryId) -> LedgerResult<&ExpenseCategory> {
        self.categories
            .get(&id)
            .ok_or_else(|| LedgerError::category_not_found(id.to_string()))
    }

    /// Look up a category by name, case-insensitively
    pub fn category_by_name(&self, name: &str) -> Option<&ExpenseCategory> {
        self.categories
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
    }

    /// All categories, unordered
    pub fn categories(&self) -> impl Iterator<Item = &ExpenseCategory> {
        self.categories.values()
    }

    /// Insert a new category
    pub fn insert_category(&mut self, category: ExpenseCategory) -> LedgerResult<ChangeEvent> {
        category
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        if self.category_by_name(&category.name).is_some() {
            return Err(LedgerError::Duplicate {
                entity_type: "Category",
                identifier: category.name.clone(),
            });
        }

        let event = ChangeEvent::created(EntitySnapshot::Category(category.clone()));
        self.categories.insert(category.id, category);
        Ok(event)
    }

    /// Modify a category in place
    pub fn modify_category(
        &mut self,
        id: CategoryId,
        f: impl FnOnce(&mut ExpenseCategory),
    ) -> LedgerResult<ChangeEvent> {
        let before = self.category(id)?.clone();

        let mut updated = before.clone();
        f(&mut updated);
        updated
            .validate()
            .map_err(|e| LedgerError::InvariantViolation(e.to_string()))?;

        if !updated.name.eq_ignore_ascii_case(&before.name)
            && self.category_by_name(&updated.name).is_some()
        {
            return Err(LedgerError::Duplicate {
                entity_type: "Category",
                identifier: updated.name.clone(),
            });
        }

        let event = ChangeEvent::updated(
            EntitySnapshot::Category(before),
            EntitySnapshot::Category(updated.clone()),
        );
        self.categories.insert(id, updated);
        Ok(event)
    }

    /// Delete a category. Member transactions drop back to uncategorized,
    /// budgets over the category are removed, and insights referencing
    /// either are flagged orphaned.
    pub fn delete_category(&mut self, id: CategoryId) -> LedgerResult<Vec<ChangeEvent>> {
        let category = self.category(id)?.clone();
        let mut events = Vec::new();

        let members: Vec<TransactionId> = self
            .transactions
            .values()
            .filter(|t| t.category_id == Some(id))
            .map(|t| t.id)
            .collect();
        for txn_id in members {
            if let Some(txn) = self.transactions.get_mut(&txn_id) {
                let before = txn.clone();
                txn.set_category(None);
                events.push(ChangeEvent::updated(
                    EntitySnapshot::Transaction(before),
                    EntitySnapshot::Transaction(txn.clone()),
                ));
            }
        }

        let dependent_budgets: Vec<BudgetId> = self
            .budgets
            .values()
            .filter(|b| b.category_id == id)
            .map(|b| b.id)
            .collect();
        for budget_id in &dependent_budgets {
            if let Some(budget) = self.budgets.remove(budget_id) {
                events.push(ChangeEvent::deleted(EntitySnapshot::Budget(budget)));
            }
        }

        events.extend(self.orphan_insights(|i| {
            i.references_category(id)
                || dependent_budgets
                    .iter()
                    .any(|budget_id| i.references_budget(*budget_id))
        }));

        self.categories.remove(&id);
        events.push(ChangeEvent::deleted(EntitySnapshot::Category(category)));
        Ok(events)
    }

    // ---- budgets ----

    /// Look up a budget by id
    pub fn budget(&self, id: BudgetId) -> LedgerResult<&Budget> {
        self.budgets
            .get(&id)
            .ok_or_else(|| LedgerError::budget_not_found(id.to_string()))
    }

    /// All budgets, unordered
    pub fn budgets(&self) -> impl Iterator<Item = &Budget> {
        self.budgets.values()
    }

    /// Insert a new budget; its category must exist, and no other budget
    /// may cover the same category over an overlapping period
    pub fn insert_budget(&mut self, budget: Budget) -> LedgerResult<ChangeEvent> {
        budget
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        if !self.categories.contains_key(&budget.category_id) {
            return Err(LedgerError::StaleReference(format!(
                "budget {} references missing category {}",
                budget.id, budget.category_id
            )));
        }

        if let Some(existing) = self.budgets.values().find(|b| {
            b.category_id == budget.category_id
                && b.period.start <= budget.period.end
                && budget.period.start <= b.period.end
        }) {
            return Err(LedgerError::Duplicate {
                entity_type: "Budget",
                identifier: format!("{} over {}", existing.id, existing.period),
            });
        }

        let event = ChangeEvent::created(EntitySnapshot::Budget(budget.clone()));
        self.budgets.insert(budget.id, budget);
        Ok(event)
    }

    /// Modify a budget in place
    pub fn modify_budget(
        &mut self,
        id: BudgetId,
        f: impl FnOnce(&mut Budget),
    ) -> LedgerResult<ChangeEvent> {
        let before = self.budget(id)?.clone();

        let mut updated = before.clone();
        f(&mut updated);
        updated
            .validate()
            .map_err(|e| LedgerError::InvariantViolation(e.to_string()))?;

        let event = ChangeEvent::updated(
            EntitySnapshot::Budget(before),
            EntitySnapshot::Budget(updated.clone()),
        );
        self.budgets.insert(id, updated);
        Ok(event)
    }

    /// Delete a budget; insights referencing it are flagged orphaned
    pub fn delete_budget(&mut self, id: BudgetId) -> LedgerResult<Vec<ChangeEvent>> {
        let budget = self.budget(id)?.clone();
        let mut events = self.orphan_insights(|i| i.references_budget(id));
        self.budgets.remove(&id);
        events.push(ChangeEvent::deleted(EntitySnapshot::Budget(budget)));
        Ok(events)
    }

    // ---- subscriptions ----

    /// Look up a subscription by id
    pub fn subscription(&self, id: SubscriptionId) -> LedgerResult<&Subscription> {
        self.subscriptions
            .get(&id)
            .ok_or_else(|| LedgerError::subscription_not_found(id.to_string()))
    }

    /// All subscriptions, unordered
    pub fn subscriptions(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.values()
    }

    /// Insert a new subscription; its billing account must exist
    pub fn insert_subscription(&mut self, subscription: Subscription) -> LedgerResult<ChangeEvent> {
        subscription
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        if !self.accounts.contains_key(&subscription.account_id) {
            return Err(LedgerError::StaleReference(format!(
                "subscription {} references missing account {}",
                subscription.id, subscription.account_id
            )));
        }

        let event = ChangeEvent::created(EntitySnapshot::Subscription(subscription.clone()));
        self.subscriptions.insert(subscription.id, subscription);
        Ok(event)
    }

    /// Roll a subscription's next-due date forward one cadence step
    pub fn advance_subscription(&mut self, id: SubscriptionId) -> LedgerResult<ChangeEvent> {
        let before = self.subscription(id)?.clone();
        let mut updated = before.clone();
        updated.advance_next_due();

        let event = ChangeEvent::updated(
            EntitySnapshot::Subscription(before),
            EntitySnapshot::Subscription(updated.clone()),
        );
        self.subscriptions.insert(id, updated);
        Ok(event)
    }

    /// Delete a subscription
    pub fn delete_subscription(&mut self, id: SubscriptionId) -> LedgerResult<ChangeEvent> {
        let subscription = self.subscription(id)?.clone();
        self.subscriptions.remove(&id);
        Ok(ChangeEvent::deleted(EntitySnapshot::Subscription(
            subscription,
        )))
    }

    // ---- savings goals ----

    /// Look up a savings goal by id
    pub fn goal(&self, id: SavingsGoalId) -> LedgerResult<&SavingsGoal> {
        self.goals
            .get(&id)
            .ok_or_else(|| LedgerError::goal_not_found(id.to_string()))
    }

    /// All savings goals, unordered
    pub fn goals(&self) -> impl Iterator<Item = &SavingsGoal> {
        self.goals.values()
    }

    /// Insert a new savings goal
    pub fn insert_goal(&mut self, goal: SavingsGoal) -> LedgerResult<ChangeEvent> {
        goal.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        let event = ChangeEvent::created(EntitySnapshot::SavingsGoal(goal.clone()));
        self.goals.insert(goal.id, goal);
        Ok(event)
    }

    /// Record a contribution against a goal
    pub fn add_contribution(
        &mut self,
        id: SavingsGoalId,
        contribution: Contribution,
    ) -> LedgerResult<ChangeEvent> {
        let before = self.goal(id)?.clone();

        let mut updated = before.clone();
        updated.contribute(contribution);
        updated
            .validate()
            .map_err(|e| LedgerError::InvariantViolation(e.to_string()))?;

        let event = ChangeEvent::updated(
            EntitySnapshot::SavingsGoal(before),
            EntitySnapshot::SavingsGoal(updated.clone()),
        );
        self.goals.insert(id, updated);
        Ok(event)
    }

    /// Delete a savings goal
    pub fn delete_goal(&mut self, id: SavingsGoalId) -> LedgerResult<ChangeEvent> {
        let goal = self.goal(id)?.clone();
        self.goals.remove(&id);
        Ok(ChangeEvent::deleted(EntitySnapshot::SavingsGoal(goal)))
    }

    // ---- insights ----

    /// Look up an insight by id
    pub fn insight(&self, id: InsightId) -> LedgerResult<&Insight> {
        self.insights
            .get(&id)
            .ok_or_else(|| LedgerError::insight_not_found(id.to_string()))
    }

    /// All insights, including orphaned ones
    pub fn insights(&self) -> impl Iterator<Item = &Insight> {
        self.insights.values()
    }

    /// Insert an insight supplied by the analysis collaborator; every
    /// entity it references must resolve
    pub fn insert_insight(&mut self, insight: Insight) -> LedgerResult<ChangeEvent> {
        insight
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        if let Some(account_id) = insight.refs.account_id {
            if !self.accounts.contains_key(&account_id) {
                return Err(LedgerError::StaleReference(format!(
                    "insight {} references missing account {}",
                    insight.id, account_id
                )));
            }
        }
        if let Some(category_id) = insight.refs.category_id {
            if !self.categories.contains_key(&category_id) {
                return Err(LedgerError::StaleReference(format!(
                    "insight {} references missing category {}",
                    insight.id, category_id
                )));
            }
        }
        if let Some(budget_id) = insight.refs.budget_id {
            if !self.budgets.contains_key(&budget_id) {
                return Err(LedgerError::StaleReference(format!(
                    "insight {} references missing budget {}",
                    insight.id, budget_id
                )));
            }
        }

        let event = ChangeEvent::created(EntitySnapshot::Insight(insight.clone()));
        self.insights.insert(insight.id, insight);
        Ok(event)
    }

    /// Delete an insight outright
    pub fn delete_insight(&mut self, id: InsightId) -> LedgerResult<ChangeEvent> {
        let insight = self.insight(id)?.clone();
        self.insights.remove(&id);
        Ok(ChangeEvent::deleted(EntitySnapshot::Insight(insight)))
    }

    /// Flag every non-orphaned insight matching the predicate, returning
    /// an update event per flagged insight
    fn orphan_insights(&mut self, matches: impl Fn(&Insight) -> bool) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        for insight in self.insights.values_mut() {
            if !insight.orphaned && matches(insight) {
                let before = insight.clone();
                insight.mark_orphaned();
                events.push(ChangeEvent::updated(
                    EntitySnapshot::Insight(before),
                    EntitySnapshot::Insight(insight.clone()),
                ));
            }
        }
        events
    }

    // ---- bulk access ----

    /// Snapshots of every entity in the store, used to rebuild derived
    /// state from scratch
    pub fn all_snapshots(&self) -> Vec<EntitySnapshot> {
        let mut snapshots = Vec::with_capacity(self.entity_count());
        snapshots.extend(self.accounts.values().cloned().map(EntitySnapshot::Account));
        snapshots.extend(
            self.transactions
                .values()
                .cloned()
                .map(EntitySnapshot::Transaction),
        );
        snapshots.extend(
            self.categories
                .values()
                .cloned()
                .map(EntitySnapshot::Category),
        );
        snapshots.extend(self.budgets.values().cloned().map(EntitySnapshot::Budget));
        snapshots.extend(
            self.subscriptions
                .values()
                .cloned()
                .map(EntitySnapshot::Subscription),
        );
        snapshots.extend(
            self.goals
                .values()
                .cloned()
                .map(EntitySnapshot::SavingsGoal),
        );
        snapshots.extend(self.insights.values().cloned().map(EntitySnapshot::Insight));
        snapshots
    }

    /// Total number of entities across all kinds
    pub fn entity_count(&self) -> usize {
        self.accounts.len()
            + self.transactions.len()
            + self.categories.len()
            + self.budgets.len()
            + self.subscriptions.len()
            + self.goals.len()
            + self.insights.len()
    }

    /// Rebuild a store from flat entity lists (snapshot load)
    pub fn from_parts(
        accounts: Vec<Account>,
        transactions: Vec<Transaction>,
        categories: Vec<ExpenseCategory>,
        budgets: Vec<Budget>,
        subscriptions: Vec<Subscription>,
        goals: Vec<SavingsGoal>,
        insights: Vec<Insight>,
    ) -> Self {
        Self {
            accounts: accounts.into_iter().map(|a| (a.id, a)).collect(),
            transactions: transactions.into_iter().map(|t| (t.id, t)).collect(),
            categories: categories.into_iter().map(|c| (c.id, c)).collect(),
            budgets: budgets.into_iter().map(|b| (b.id, b)).collect(),
            subscriptions: subscriptions.into_iter().map(|s| (s.id, s)).collect(),
            goals: goals.into_iter().map(|g| (g.id, g)).collect(),
            insights: insights.into_iter().map(|i| (i.id, i)).collect(),
        }
    }

    /// Flatten the store into entity lists (snapshot save)
    #[allow(clippy::type_complexity)]
    pub fn to_parts(
        &self,
    ) -> (
        Vec<Account>,
        Vec<Transaction>,
        Vec<ExpenseCategory>,
        Vec<Budget>,
        Vec<Subscription>,
        Vec<SavingsGoal>,
        Vec<Insight>,
    ) {
        (
            self.accounts.values().cloned().collect(),
            self.transactions.values().cloned().collect(),
            self.categories.values().cloned().collect(),
            self.budgets.values().cloned().collect(),
            self.subscriptions.values().cloned().collect(),
            self.goals.values().cloned().collect(),
            self.insights.values().cloned().collect(),
        )
    }
}
