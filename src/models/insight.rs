//! Insight model
//!
//! Insights are produced by an external analysis collaborator; this core
//! only stores them, guards their entity references, and hands them to the
//! presentation collaborator. Display text and icons come from a static
//! per-kind lookup, not virtual dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, BudgetId, CategoryId, InsightId};

/// Classification of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    SpendingPattern,
    Anomaly,
    BudgetAlert,
    Forecast,
    Optimization,
    BudgetRecommendation,
    PositiveSpendingTrend,
}

impl InsightKind {
    /// All kinds, in display order
    pub fn all() -> &'static [Self] {
        &[
            Self::SpendingPattern,
            Self::Anomaly,
            Self::BudgetAlert,
            Self::Forecast,
            Self::Optimization,
            Self::BudgetRecommendation,
            Self::PositiveSpendingTrend,
        ]
    }

    /// Display label for this kind
    pub fn label(&self) -> &'static str {
        match self {
            Self::SpendingPattern => "Spending Pattern",
            Self::Anomaly => "Anomaly",
            Self::BudgetAlert => "Budget Alert",
            Self::Forecast => "Forecast",
            Self::Optimization => "Optimization",
            Self::BudgetRecommendation => "Budget Recommendation",
            Self::PositiveSpendingTrend => "Positive Trend",
        }
    }

    /// Icon tag used by the presentation collaborator
    pub fn icon(&self) -> &'static str {
        match self {
            Self::SpendingPattern => "chart.bar",
            Self::Anomaly => "exclamationmark.triangle",
            Self::BudgetAlert => "bell",
            Self::Forecast => "chart.line.uptrend",
            Self::Optimization => "wand.and.stars",
            Self::BudgetRecommendation => "lightbulb",
            Self::PositiveSpendingTrend => "arrow.down.heart",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How urgently an insight should surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightPriority {
    Low,
    Medium,
    High,
}

impl fmt::Display for InsightPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// The entities an insight is about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightRefs {
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub budget_id: Option<BudgetId>,
}

impl InsightRefs {
    /// References no entities at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Reference a single account
    pub fn account(id: AccountId) -> Self {
        Self {
            account_id: Some(id),
            ..Self::default()
        }
    }

    /// Reference a single category
    pub fn category(id: CategoryId) -> Self {
        Self {
            category_id: Some(id),
            ..Self::default()
        }
    }

    /// Reference a single budget
    pub fn budget(id: BudgetId) -> Self {
        Self {
            budget_id: Some(id),
            ..Self::default()
        }
    }

    /// Check if no references are set
    pub fn is_empty(&self) -> bool {
        self.account_id.is_none() && self.category_id.is_none() && self.budget_id.is_none()
    }
}

/// A categorized financial observation supplied by the analysis collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Unique identifier
    pub id: InsightId,

    /// Classification of the observation
    pub kind: InsightKind,

    /// Short human-readable headline
    pub title: String,

    /// Longer human-readable body
    #[serde(default)]
    pub body: String,

    /// How urgently the insight should surface
    pub priority: InsightPriority,

    /// The entities the insight is about
    #[serde(default)]
    pub refs: InsightRefs,

    /// When the insight was produced
    pub created_at: DateTime<Utc>,

    /// Set when a referenced entity was deleted; orphaned insights are
    /// excluded from read paths
    #[serde(default)]
    pub orphaned: bool,
}

impl Insight {
    /// Create a new insight
    pub fn new(
        kind: InsightKind,
        title: impl Into<String>,
        body: impl Into<String>,
        priority: InsightPriority,
        refs: InsightRefs,
    ) -> Self {
        Self {
            id: InsightId::new(),
            kind,
            title: title.into(),
            body: body.into(),
            priority,
            refs,
            created_at: Utc::now(),
            orphaned: false,
        }
    }

    /// Check whether this insight references the given account
    pub fn references_account(&self, id: AccountId) -> bool {
        self.refs.account_id == Some(id)
    }

    /// Check whether this insight references the given category
    pub fn references_category(&self, id: CategoryId) -> bool {
        self.refs.category_id == Some(id)
    }

    /// Check whether this insight references the given budget
    pub fn references_budget(&self, id: BudgetId) -> bool {
        self.refs.budget_id == Some(id)
    }

    /// Flag the insight after a referenced entity was deleted
    pub fn mark_orphaned(&mut self) {
        self.orphaned = true;
    }

    /// Validate the insight
    pub fn validate(&self) -> Result<(), InsightValidationError> {
        if self.title.trim().is_empty() {
            return Err(InsightValidationError::EmptyTitle);
        }
        Ok(())
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.label(), self.title)
    }
}

/// Validation errors for insights
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightValidationError {
    EmptyTitle,
}

impl fmt::Display for InsightValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "Insight title cannot be empty"),
        }
    }
}

impl std::error::Error for InsightValidationError {}
