//! Core data models for the ledger
//!
//! This module contains the data structures that represent the financial
//! domain: accounts, transactions, categories, budgets, subscriptions,
//! savings goals, and insights. Models hold no behavior beyond invariant
//! enforcement; derived values (balances, totals) live in the balance
//! engine.

pub mod account;
pub mod budget;
pub mod category;
pub mod goal;
pub mod ids;
pub mod insight;
pub mod money;
pub mod period;
pub mod subscription;
pub mod transaction;

pub use account::{Account, AccountKind};
pub use budget::Budget;
pub use category::ExpenseCategory;
pub use goal::{Contribution, SavingsGoal};
pub use ids::{
    AccountId, BudgetId, CategoryId, InsightId, SavingsGoalId, SubscriptionId, TransactionId,
};
pub use insight::{Insight, InsightKind, InsightPriority, InsightRefs};
pub use money::Money;
pub use period::BudgetPeriod;
pub use subscription::{BillingCadence, Subscription};
pub use transaction::{Transaction, TransactionKind};
