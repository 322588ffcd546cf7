//! Budget model
//!
//! A budget puts a spending limit on one category for one period.
//! Spent-so-far is derived by the balance engine from in-period,
//! in-category expense transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, CategoryId};
use super::money::Money;
use super::period::BudgetPeriod;

/// A spending limit for a category over a period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    /// Unique identifier
    pub id: BudgetId,

    /// The category this budget limits
    pub category_id: CategoryId,

    /// The period the limit applies to
    pub period: BudgetPeriod,

    /// The spending limit
    pub limit: Money,

    /// When the budget was created
    pub created_at: DateTime<Utc>,

    /// When the budget was last modified
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create a new budget
    pub fn new(category_id: CategoryId, period: BudgetPeriod, limit: Money) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            category_id,
            period,
            limit,
            created_at: now,
            updated_at: now,
        }
    }

    /// Change the spending limit
    pub fn set_limit(&mut self, limit: Money) {
        self.limit = limit;
        self.updated_at = Utc::now();
    }

    /// Validate the budget
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if self.limit.is_negative() {
            return Err(BudgetValidationError::NegativeLimit(self.limit));
        }

        if !self.period.is_valid() {
            return Err(BudgetValidationError::InvalidPeriod);
        }

        Ok(())
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} over {}", self.limit, self.period)
    }
}

/// Validation errors for budgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    NegativeLimit(Money),
    InvalidPeriod,
}

impl fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeLimit(limit) => {
                write!(f, "Budget limit cannot be negative (got {})", limit)
            }
            Self::InvalidPeriod => write!(f, "Budget period start must not be after its end"),
        }
    }
}

impl std::error::Error for BudgetValidationError {}
