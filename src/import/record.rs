//! Import record and report types
//!
//! Validation never stops at the first problem: every defect a record
//! has is collected and graded, so one pass over the report tells the
//! caller everything wrong with the batch. Warnings commit; errors
//! reject the record and only the record.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::TransactionId;

/// One row of imported data before validation, all fields as text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Transaction date (several common formats accepted)
    pub date: String,
    /// Transaction title
    pub title: String,
    /// Amount as a positive decimal string
    pub amount: String,
    /// Direction ("income"/"expense"; blank defaults to expense)
    pub kind: String,
    /// Name of the account the transaction belongs to
    pub account: String,
    /// Category name; blank leaves the transaction uncategorized
    pub category: String,
}

/// How bad a validation defect is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The record commits anyway; the defect was worked around
    Warning,
    /// The record is rejected
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single graded defect found in one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// The field the defect was found in
    pub field: &'static str,
    /// What is wrong with it
    pub message: String,
    /// Whether the record survives the defect
    pub severity: Severity,
}

impl ValidationError {
    /// A rejecting defect
    pub fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// A non-rejecting defect
    pub fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.severity)
    }
}

/// What happened to one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record was committed as this transaction
    Committed(TransactionId),
    /// The record was rejected; nothing was committed for it
    Rejected,
}

/// Per-record report: outcome plus every defect found
#[derive(Debug, Clone)]
pub struct RecordReport {
    /// Zero-based position of the record in the batch
    pub row: usize,
    /// Title as supplied, for identifying the record in output
    pub title: String,
    /// What happened to the record
    pub outcome: RecordOutcome,
    /// Every defect found, in field order
    pub defects: Vec<ValidationError>,
}

impl RecordReport {
    /// Check whether any defect rejects the record
    pub fn has_errors(&self) -> bool {
        self.defects.iter().any(|d| d.severity == Severity::Error)
    }

    /// Check whether the record carried non-rejecting defects
    pub fn has_warnings(&self) -> bool {
        self.defects.iter().any(|d| d.severity == Severity::Warning)
    }
}

/// Outcome of a whole import batch.
///
/// `accepted + warned + rejected` always equals the batch size, and the
/// batch is a success exactly when nothing was rejected.
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// Records committed cleanly
    pub accepted: usize,
    /// Records committed despite warnings
    pub warned: usize,
    /// Records rejected
    pub rejected: usize,
    /// One report per record, in batch order
    pub reports: Vec<RecordReport>,
}

impl ImportResult {
    /// Total number of records processed
    pub fn total(&self) -> usize {
        self.accepted + self.warned + self.rejected
    }

    /// A batch succeeds when every record committed
    pub fn success(&self) -> bool {
        self.rejected == 0
    }

    /// Reports of rejected records only
    pub fn rejections(&self) -> impl Iterator<Item = &RecordReport> {
        self.reports
            .iter()
            .filter(|r| r.outcome == RecordOutcome::Rejected)
    }
}

impl fmt::Display for ImportResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "imported {} of {} ({} with warnings, {} rejected)",
            self.accepted + self.warned,
            self.total(),
            self.warned,
            self.rejected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
    }

    #[test]
    fn test_report_grading() {
        let report = RecordReport {
            row: 0,
            title: "Lunch".into(),
            outcome: RecordOutcome::Committed(TransactionId::new()),
            defects: vec![ValidationError::warning("category", "created \"Dining\"")],
        };
        assert!(!report.has_errors());
        assert!(report.has_warnings());
    }

    #[test]
    fn test_result_accounting() {
        let result = ImportResult {
            accepted: 2,
            warned: 1,
            rejected: 1,
            reports: Vec::new(),
        };
        assert_eq!(result.total(), 4);
        assert!(!result.success());

        let clean = ImportResult {
            accepted: 3,
            ..Default::default()
        };
        assert!(clean.success());
    }

    #[test]
    fn test_defect_display() {
        let defect = ValidationError::error("amount", "must be positive (got -5.00)");
        assert_eq!(
            defect.to_string(),
            "amount: must be positive (got -5.00) (error)"
        );
    }
}
