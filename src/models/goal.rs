//! Savings goal model
//!
//! Progress toward a goal is derived from its contribution ledger by the
//! balance engine; the goal itself never stores a progress figure.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::SavingsGoalId;
use super::money::Money;

/// A single contribution toward a savings goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    /// Amount contributed, a positive magnitude
    pub amount: Money,

    /// When the contribution was made
    pub date: NaiveDate,
}

impl Contribution {
    /// Create a new contribution
    pub fn new(amount: Money, date: NaiveDate) -> Self {
        Self { amount, date }
    }
}

/// A savings target with a contribution ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    /// Unique identifier
    pub id: SavingsGoalId,

    /// Goal name (e.g., "Emergency Fund")
    pub name: String,

    /// The target amount
    pub target: Money,

    /// The date the goal should be reached by
    pub target_date: NaiveDate,

    /// Contributions recorded against the goal, in insertion order
    #[serde(default)]
    pub contributions: Vec<Contribution>,

    /// When the goal was created
    pub created_at: DateTime<Utc>,

    /// When the goal was last modified
    pub updated_at: DateTime<Utc>,
}

impl SavingsGoal {
    /// Create a new savings goal
    pub fn new(name: impl Into<String>, target: Money, target_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: SavingsGoalId::new(),
            name: name.into(),
            target,
            target_date,
            contributions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a contribution
    pub fn contribute(&mut self, contribution: Contribution) {
        self.contributions.push(contribution);
        self.updated_at = Utc::now();
    }

    /// Sum of all contributions
    pub fn contributed(&self) -> Money {
        self.contributions.iter().map(|c| c.amount).sum()
    }

    /// Check whether contributions have reached the target
    pub fn is_reached(&self) -> bool {
        self.contributed() >= self.target
    }

    /// Validate the goal
    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.name.trim().is_empty() {
            return Err(GoalValidationError::EmptyName);
        }

        if !self.target.is_positive() {
            return Err(GoalValidationError::NonPositiveTarget(self.target));
        }

        if let Some(bad) = self.contributions.iter().find(|c| !c.amount.is_positive()) {
            return Err(GoalValidationError::NonPositiveContribution(bad.amount));
        }

        Ok(())
    }
}

impl fmt::Display for SavingsGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} of {})", self.name, self.contributed(), self.target)
    }
}

/// Validation errors for savings goals
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    EmptyName,
    NonPositiveTarget(Money),
    NonPositiveContribution(Money),
}

impl fmt::Display for GoalValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Goal name cannot be empty"),
            Self::NonPositiveTarget(target) => {
                write!(f, "Goal target must be positive (got {})", target)
            }
            Self::NonPositiveContribution(amount) => {
                write!(f, "Contributions must be positive (got {})", amount)
            }
        }
    }
}

impl std::error::Error for GoalValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_goal() {
        let goal = SavingsGoal::new("Vacation", Money::from_cents(200000), date(2026, 12, 1));
        assert_eq!(goal.name, "Vacation");
        assert!(goal.contributions.is_empty());
        assert_eq!(goal.contributed(), Money::zero());
        assert!(!goal.is_reached());
        assert!(goal.validate().is_ok());
    }

    #[test]
    fn test_contributions() {
        let mut goal = SavingsGoal::new("Laptop", Money::from_cents(100000), date(2026, 6, 1));
        goal.contribute(Contribution::new(Money::from_cents(40000), date(2026, 1, 1)));
        goal.contribute(Contribution::new(Money::from_cents(60000), date(2026, 2, 1)));

        assert_eq!(goal.contributed().cents(), 100000);
        assert!(goal.is_reached());
    }

    #[test]
    fn test_validation() {
        let mut goal = SavingsGoal::new("Valid", Money::from_cents(5000), date(2026, 6, 1));
        assert!(goal.validate().is_ok());

        goal.name = String::new();
        assert_eq!(goal.validate(), Err(GoalValidationError::EmptyName));

        goal.name = "Valid".into();
        goal.target = Money::zero();
        assert!(matches!(
            goal.validate(),
            Err(GoalValidationError::NonPositiveTarget(_))
        ));

        goal.target = Money::from_cents(5000);
        goal.contributions
            .push(Contribution::new(Money::zero(), date(2026, 1, 1)));
        assert!(matches!(
            goal.validate(),
            Err(GoalValidationError::NonPositiveContribution(_))
        ));
    }

    #[test]
    fn test_serialization() {
        let mut goal = SavingsGoal::new("House", Money::from_cents(5000000), date(2030, 1, 1));
        goal.contribute(Contribution::new(Money::from_cents(100000), date(2026, 1, 1)));

        let json = serde_json::to_string(&goal).unwrap();
        let deserialized: SavingsGoal = serde_json::from_str(&json).unwrap();
        assert_eq!(goal.id, deserialized.id);
        assert_eq!(deserialized.contributions.len(), 1);
    }
}
