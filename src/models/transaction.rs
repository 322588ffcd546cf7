//! Transaction model
//!
//! Transactions are append-mostly: once committed they are immutable
//! except for category reassignment. Edits are modeled as cancel+recreate
//! so the audit history survives. Amounts are stored as positive
//! magnitudes; the kind carries the sign.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, TransactionId};
use super::money::Money;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money flowing into the account
    Income,
    /// Money flowing out of the account
    Expense,
}

impl TransactionKind {
    /// Parse transaction kind from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" | "inflow" | "credit" => Some(Self::Income),
            "expense" | "outflow" | "debit" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
        }
    }
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// Human-readable title (e.g., "Rent Payment")
    pub title: String,

    /// Amount as a positive magnitude; sign comes from `kind`
    pub amount: Money,

    /// Direction of the transaction
    pub kind: TransactionKind,

    /// When the transaction occurred
    pub timestamp: DateTime<Utc>,

    /// The owning account (back-reference, not an ownership edge)
    pub account_id: AccountId,

    /// Optional category assignment; the only mutable field after commit
    pub category_id: Option<CategoryId>,

    /// Set when the owning account was deleted under the orphan policy;
    /// the transaction is kept for audit but excluded from balances
    #[serde(default)]
    pub orphaned: bool,

    /// When the transaction was committed to the ledger
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(
        account_id: AccountId,
        title: impl Into<String>,
        amount: Money,
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            title: title.into(),
            amount,
            kind,
            timestamp,
            account_id,
            category_id: None,
            orphaned: false,
            created_at: Utc::now(),
        }
    }

    /// Create a new transaction with a category
    pub fn with_category(
        account_id: AccountId,
        title: impl Into<String>,
        amount: Money,
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
        category_id: CategoryId,
    ) -> Self {
        let mut txn = Self::new(account_id, title, amount, kind, timestamp);
        txn.category_id = Some(category_id);
        txn
    }

    /// The signed contribution of this transaction to its account balance
    /// (income adds, expense subtracts)
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    /// Check if this is an expense
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Check if this is an income
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    /// Reassign the category (the one permitted post-commit edit)
    pub fn set_category(&mut self, category_id: Option<CategoryId>) {
        self.category_id = category_id;
    }

    /// Flag the transaction as orphaned after its account was deleted
    pub fn mark_orphaned(&mut self) {
        self.orphaned = true;
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.title.trim().is_empty() {
            return Err(TransactionValidationError::EmptyTitle);
        }

        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount(self.amount));
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.timestamp.format("%Y-%m-%d"),
            self.title,
            self.signed_amount()
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    EmptyTitle,
    NonPositiveAmount(Money),
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "Transaction title cannot be empty"),
            Self::NonPositiveAmount(amount) => {
                write!(f, "Transaction amount must be positive (got {})", amount)
            }
        }
    }
}

impl std::error::Error for TransactionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_transaction() {
        let account_id = AccountId::new();
        let txn = Transaction::new(
            account_id,
            "Groceries",
            Money::from_cents(5000),
            TransactionKind::Expense,
            ts(2026, 1, 15),
        );

        assert_eq!(txn.account_id, account_id);
        assert_eq!(txn.amount.cents(), 5000);
        assert!(txn.category_id.is_none());
        assert!(!txn.orphaned);
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_signed_amount() {
        let account_id = AccountId::new();
        let income = Transaction::new(
            account_id,
            "Paycheck",
            Money::from_cents(50000),
            TransactionKind::Income,
            ts(2026, 1, 1),
        );
        let expense = Transaction::new(
            account_id,
            "Rent",
            Money::from_cents(10000),
            TransactionKind::Expense,
            ts(2026, 1, 2),
        );

        assert_eq!(income.signed_amount().cents(), 50000);
        assert_eq!(expense.signed_amount().cents(), -10000);
    }

    #[test]
    fn test_validation() {
        let account_id = AccountId::new();
        let mut txn = Transaction::new(
            account_id,
            "Valid",
            Money::from_cents(100),
            TransactionKind::Expense,
            ts(2026, 1, 15),
        );
        assert!(txn.validate().is_ok());

        txn.title = String::new();
        assert_eq!(txn.validate(), Err(TransactionValidationError::EmptyTitle));

        txn.title = "Valid".into();
        txn.amount = Money::zero();
        assert!(matches!(
            txn.validate(),
            Err(TransactionValidationError::NonPositiveAmount(_))
        ));

        txn.amount = Money::from_cents(-500);
        assert!(matches!(
            txn.validate(),
            Err(TransactionValidationError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn test_category_reassignment() {
        let account_id = AccountId::new();
        let category_id = CategoryId::new();
        let mut txn = Transaction::new(
            account_id,
            "Dinner",
            Money::from_cents(3000),
            TransactionKind::Expense,
            ts(2026, 2, 1),
        );

        txn.set_category(Some(category_id));
        assert_eq!(txn.category_id, Some(category_id));

        txn.set_category(None);
        assert!(txn.category_id.is_none());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(
            TransactionKind::parse("income"),
            Some(TransactionKind::Income)
        );
        assert_eq!(
            TransactionKind::parse("EXPENSE"),
            Some(TransactionKind::Expense)
        );
        assert_eq!(TransactionKind::parse("transfer"), None);
    }

    #[test]
    fn test_serialization() {
        let txn = Transaction::with_category(
            AccountId::new(),
            "Coffee",
            Money::from_cents(450),
            TransactionKind::Expense,
            ts(2026, 3, 1),
            CategoryId::new(),
        );

        let json = serde_json::to_string(&txn).unwrap();
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(txn.id, deserialized.id);
        assert_eq!(txn.amount, deserialized.amount);
        assert_eq!(txn.category_id, deserialized.category_id);
    }

    #[test]
    fn test_display() {
        let mut txn = Transaction::new(
            AccountId::new(),
            "Rent Payment",
            Money::from_cents(120000),
            TransactionKind::Expense,
            ts(2026, 1, 1),
        );
        txn.timestamp = ts(2026, 1, 1);
        assert_eq!(format!("{}", txn), "2026-01-01 Rent Payment -$1200.00");
    }
}
