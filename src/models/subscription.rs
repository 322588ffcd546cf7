//! Subscription model
//!
//! A recurring charge against a linked account, with a billing cadence
//! and a rolling next-due date.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, SubscriptionId};
use super::money::Money;

/// How often a subscription bills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCadence {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCadence {
    /// Parse billing cadence from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "yearly" | "annual" | "annually" => Some(Self::Yearly),
            _ => None,
        }
    }

    /// Advance a due date by one cadence step
    pub fn advance(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Weekly => date + Duration::days(7),
            Self::Monthly => add_months(date, 1),
            Self::Quarterly => add_months(date, 3),
            Self::Yearly => add_months(date, 12),
        }
    }
}

impl fmt::Display for BillingCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly => write!(f, "Weekly"),
            Self::Monthly => write!(f, "Monthly"),
            Self::Quarterly => write!(f, "Quarterly"),
            Self::Yearly => write!(f, "Yearly"),
        }
    }
}

/// Add whole months to a date, clamping the day to the target month's length
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;

    let mut day = date.day();
    loop {
        if let Some(next) = NaiveDate::from_ymd_opt(year, month, day) {
            return next;
        }
        day -= 1;
    }
}

/// A recurring charge linked to an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier
    pub id: SubscriptionId,

    /// Subscription name (e.g., "Streaming Service")
    pub name: String,

    /// Recurring amount, a positive magnitude
    pub amount: Money,

    /// How often the subscription bills
    pub cadence: BillingCadence,

    /// The next billing date
    pub next_due: NaiveDate,

    /// The account the subscription bills against
    pub account_id: AccountId,

    /// When the subscription was created
    pub created_at: DateTime<Utc>,

    /// When the subscription was last modified
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Create a new subscription
    pub fn new(
        name: impl Into<String>,
        amount: Money,
        cadence: BillingCadence,
        next_due: NaiveDate,
        account_id: AccountId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SubscriptionId::new(),
            name: name.into(),
            amount,
            cadence,
            next_due,
            account_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Roll the next-due date forward one cadence step
    pub fn advance_next_due(&mut self) {
        self.next_due = self.cadence.advance(self.next_due);
        self.updated_at = Utc::now();
    }

    /// Validate the subscription
    pub fn validate(&self) -> Result<(), SubscriptionValidationError> {
        if self.name.trim().is_empty() {
            return Err(SubscriptionValidationError::EmptyName);
        }

        if !self.amount.is_positive() {
            return Err(SubscriptionValidationError::NonPositiveAmount(self.amount));
        }

        Ok(())
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.name, self.amount, self.cadence)
    }
}

/// Validation errors for subscriptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionValidationError {
    EmptyName,
    NonPositiveAmount(Money),
}

impl fmt::Display for SubscriptionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Subscription name cannot be empty"),
            Self::NonPositiveAmount(amount) => {
                write!(f, "Subscription amount must be positive (got {})", amount)
            }
        }
    }
}

impl std::error::Error for SubscriptionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_subscription() {
        let sub = Subscription::new(
            "Streaming",
            Money::from_cents(1499),
            BillingCadence::Monthly,
            date(2026, 2, 1),
            AccountId::new(),
        );
        assert_eq!(sub.name, "Streaming");
        assert!(sub.validate().is_ok());
    }

    #[test]
    fn test_cadence_advance() {
        assert_eq!(
            BillingCadence::Weekly.advance(date(2026, 1, 1)),
            date(2026, 1, 8)
        );
        assert_eq!(
            BillingCadence::Monthly.advance(date(2026, 1, 15)),
            date(2026, 2, 15)
        );
        assert_eq!(
            BillingCadence::Quarterly.advance(date(2026, 11, 30)),
            date(2027, 2, 28)
        );
        assert_eq!(
            BillingCadence::Yearly.advance(date(2026, 6, 1)),
            date(2027, 6, 1)
        );
    }

    #[test]
    fn test_month_end_clamping() {
        // Jan 31 + 1 month lands on the last day of February
        assert_eq!(
            BillingCadence::Monthly.advance(date(2026, 1, 31)),
            date(2026, 2, 28)
        );
        assert_eq!(
            BillingCadence::Monthly.advance(date(2024, 1, 31)),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn test_advance_next_due() {
        let mut sub = Subscription::new(
            "Gym",
            Money::from_cents(4000),
            BillingCadence::Monthly,
            date(2026, 1, 10),
            AccountId::new(),
        );
        sub.advance_next_due();
        assert_eq!(sub.next_due, date(2026, 2, 10));
    }

    #[test]
    fn test_validation() {
        let mut sub = Subscription::new(
            "Valid",
            Money::from_cents(999),
            BillingCadence::Yearly,
            date(2026, 1, 1),
            AccountId::new(),
        );
        assert!(sub.validate().is_ok());

        sub.name = "  ".into();
        assert_eq!(sub.validate(), Err(SubscriptionValidationError::EmptyName));

        sub.name = "Valid".into();
        sub.amount = Money::zero();
        assert!(matches!(
            sub.validate(),
            Err(SubscriptionValidationError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn test_cadence_parsing() {
        assert_eq!(
            BillingCadence::parse("monthly"),
            Some(BillingCadence::Monthly)
        );
        assert_eq!(
            BillingCadence::parse("ANNUAL"),
            Some(BillingCadence::Yearly)
        );
        assert_eq!(BillingCadence::parse("fortnightly"), None);
    }

    #[test]
    fn test_serialization() {
        let sub = Subscription::new(
            "Cloud Backup",
            Money::from_cents(299),
            BillingCadence::Monthly,
            date(2026, 3, 5),
            AccountId::new(),
        );
        let json = serde_json::to_string(&sub).unwrap();
        let deserialized: Subscription = serde_json::from_str(&json).unwrap();
        assert_eq!(sub.id, deserialized.id);
        assert_eq!(sub.next_due, deserialized.next_due);
    }
}
