//! Account model
//!
//! Represents financial accounts (checking, savings, credit cards, etc.)
//! An account owns its transactions; the ownership edge lives in the
//! entity store, and transactions point back with a plain `AccountId`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;
use super::money::Money;

/// Kind of financial account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Checking account
    Checking,
    /// Savings account
    Savings,
    /// Credit card
    Credit,
    /// Investment account
    Investment,
    /// Cash/wallet
    Cash,
}

impl AccountKind {
    /// Parse account kind from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "checking" => Some(Self::Checking),
            "savings" => Some(Self::Savings),
            "credit" | "credit_card" | "creditcard" => Some(Self::Credit),
            "investment" => Some(Self::Investment),
            "cash" => Some(Self::Cash),
            _ => None,
        }
    }
}

impl Default for AccountKind {
    fn default() -> Self {
        Self::Checking
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => write!(f, "Checking"),
            Self::Savings => write!(f, "Savings"),
            Self::Credit => write!(f, "Credit Card"),
            Self::Investment => write!(f, "Investment"),
            Self::Cash => write!(f, "Cash"),
        }
    }
}

/// A financial account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// Account name (e.g., "Chase Checking")
    pub name: String,

    /// Icon tag used by the presentation collaborator
    #[serde(default)]
    pub icon: String,

    /// Kind of account
    pub kind: AccountKind,

    /// Opening balance, the last-committed stored value; the current
    /// balance is always this plus the signed sum of owned transactions
    pub opening_balance: Money,

    /// Credit limit; present iff kind == Credit
    pub credit_limit: Option<Money>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new non-credit account with a zero opening balance
    pub fn new(name: impl Into<String>, kind: AccountKind) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            name: name.into(),
            icon: String::new(),
            kind,
            opening_balance: Money::zero(),
            credit_limit: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new account with an opening balance
    pub fn with_opening_balance(
        name: impl Into<String>,
        kind: AccountKind,
        opening_balance: Money,
    ) -> Self {
        let mut account = Self::new(name, kind);
        account.opening_balance = opening_balance;
        account
    }

    /// Create a new credit account with its credit limit
    pub fn credit(
        name: impl Into<String>,
        opening_balance: Money,
        credit_limit: Money,
    ) -> Self {
        let mut account = Self::with_opening_balance(name, AccountKind::Credit, opening_balance);
        account.credit_limit = Some(credit_limit);
        account
    }

    /// Set the icon tag
    pub fn set_icon(&mut self, icon: impl Into<String>) {
        self.icon = icon.into();
        self.updated_at = Utc::now();
    }

    /// Rename the account
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.name.trim().is_empty() {
            return Err(AccountValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(AccountValidationError::NameTooLong(self.name.len()));
        }

        // Credit limit is present iff the account is a credit account
        match (self.kind, self.credit_limit) {
            (AccountKind::Credit, None) => return Err(AccountValidationError::MissingCreditLimit),
            (AccountKind::Credit, Some(limit)) if limit.is_negative() => {
                return Err(AccountValidationError::NegativeCreditLimit(limit))
            }
            (AccountKind::Credit, Some(_)) => {}
            (_, Some(_)) => return Err(AccountValidationError::CreditLimitOnNonCredit),
            (_, None) => {}
        }

        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// Validation errors for accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyName,
    NameTooLong(usize),
    MissingCreditLimit,
    NegativeCreditLimit(Money),
    CreditLimitOnNonCredit,
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Account name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Account name too long ({} chars, max 100)", len)
            }
            Self::MissingCreditLimit => {
                write!(f, "Credit accounts must declare a credit limit")
            }
            Self::NegativeCreditLimit(limit) => {
                write!(f, "Credit limit cannot be negative (got {})", limit)
            }
            Self::CreditLimitOnNonCredit => {
                write!(f, "Only credit accounts may have a credit limit")
            }
        }
    }
}

impl std::error::Error for AccountValidationError {}
