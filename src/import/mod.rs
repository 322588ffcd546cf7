//! Import and validation pipeline
//!
//! Imports a batch of raw transaction records with partial-failure
//! semantics: each record is validated independently, all of its defects
//! are collected in one pass, records with only warnings commit, and
//! records with any error are rejected without disturbing the rest of
//! the batch. Unknown account and category names are resolved by
//! creating the missing entity and grading the record with a warning.

pub mod record;

use chrono::NaiveDate;
use csv::ReaderBuilder;

use crate::error::LedgerResult;
use crate::ledger::{ChangeEvent, EntityStore};
use crate::models::{
    Account, AccountId, AccountKind, CategoryId, ExpenseCategory, Money, Transaction,
    TransactionId, TransactionKind,
};

pub use record::{
    ImportResult, RawRecord, RecordOutcome, RecordReport, Severity, ValidationError,
};

/// Validates and commits batches of raw records against an entity store.
///
/// The pipeline mutates the store directly and hands back the change
/// events for everything it committed; the caller routes those into the
/// derived-state engines.
pub struct ImportPipeline<'a> {
    store: &'a mut EntityStore,
}

impl<'a> ImportPipeline<'a> {
    /// Create a pipeline over a store
    pub fn new(store: &'a mut EntityStore) -> Self {
        Self { store }
    }

    /// Import a batch of raw records.
    ///
    /// Never fails as a whole: per-record problems land in the result's
    /// reports, and the returned events describe exactly what committed.
    pub fn import_records(&mut self, records: Vec<RawRecord>) -> (ImportResult, Vec<ChangeEvent>) {
        let mut result = ImportResult::default();
        let mut events = Vec::new();

        for (row, record) in records.into_iter().enumerate() {
            let report = self.import_one(row, &record, &mut events);
            tally(&mut result, report);
        }

        (result, events)
    }

    /// Parse CSV text and import it as a batch.
    ///
    /// Expected columns: date, title, amount, kind, account, category.
    /// A header row is detected by checking whether the first field of
    /// the first row parses as a date; short rows are padded with empty
    /// fields and graded by the normal validation path. A row the CSV
    /// parser cannot read is rejected like any other bad record; it never
    /// aborts the batch.
    pub fn import_csv<R: std::io::Read>(&mut self, reader: R) -> (ImportResult, Vec<ChangeEvent>) {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut result = ImportResult::default();
        let mut events = Vec::new();
        let mut row_index = 0;

        for (i, row) in csv_reader.records().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    tally(
                        &mut result,
                        RecordReport {
                            row: row_index,
                            title: String::new(),
                            outcome: RecordOutcome::Rejected,
                            defects: vec![ValidationError::error(
                                "record",
                                format!("CSV parse error: {}", e),
                            )],
                        },
                    );
                    row_index += 1;
                    continue;
                }
            };

            let field = |idx: usize| row.get(idx).unwrap_or("").trim().to_string();
            let record = RawRecord {
                date: field(0),
                title: field(1),
                amount: field(2),
                kind: field(3),
                account: field(4),
                category: field(5),
            };

            // first row with an unparsable date and no amount is a header
            if i == 0
                && parse_date(&record.date).is_none()
                && Money::parse_positive(&record.amount).is_err()
            {
                continue;
            }

            let report = self.import_one(row_index, &record, &mut events);
            tally(&mut result, report);
            row_index += 1;
        }

        (result, events)
    }

    /// Validate one record fully, then commit it if nothing rejects it
    fn import_one(
        &mut self,
        row: usize,
        record: &RawRecord,
        events: &mut Vec<ChangeEvent>,
    ) -> RecordReport {
        let mut defects = Vec::new();

        let date = match parse_date(&record.date) {
            Some(date) => Some(date),
            None => {
                defects.push(ValidationError::error(
                    "date",
                    format!("could not parse date: '{}'", record.date),
                ));
                None
            }
        };

        if record.title.trim().is_empty() {
            defects.push(ValidationError::error("title", "title cannot be empty"));
        }

        let amount = match Money::parse_positive(&record.amount) {
            Ok(amount) => Some(amount),
            Err(e) => {
                defects.push(ValidationError::error("amount", e.to_string()));
                None
            }
        };

        let kind = if record.kind.trim().is_empty() {
            defects.push(ValidationError::warning(
                "kind",
                "missing direction, assuming expense",
            ));
            Some(TransactionKind::Expense)
        } else {
            match TransactionKind::parse(&record.kind) {
                Some(kind) => Some(kind),
                None => {
                    defects.push(ValidationError::error(
                        "kind",
                        format!("unknown direction: '{}'", record.kind),
                    ));
                    None
                }
            }
        };

        // unknown names are only graded here; the entities themselves are
        // created at commit time, so a rejected record leaves no trace
        let (account_id, new_account) = if record.account.trim().is_empty() {
            defects.push(ValidationError::error(
                "account",
                "account name cannot be empty",
            ));
            (None, None)
        } else {
            match self.store.account_by_name(&record.account) {
                Some(account) => (Some(account.id), None),
                None => {
                    let account = Account::new(record.account.trim(), AccountKind::Checking);
                    match account.validate() {
                        Ok(()) => {
                            defects.push(ValidationError::warning(
                                "account",
                                format!("unknown account '{}', will be created", record.account.trim()),
                            ));
                            (Some(account.id), Some(account))
                        }
                        Err(e) => {
                            defects.push(ValidationError::error("account", e.to_string()));
                            (None, None)
                        }
                    }
                }
            }
        };

        let (category_id, new_category) = if record.category.trim().is_empty() {
            (None, None)
        } else {
            match self.store.category_by_name(&record.category) {
                Some(category) => (Some(category.id), None),
                None => {
                    let category = ExpenseCategory::new(record.category.trim());
                    match category.validate() {
                        Ok(()) => {
                            defects.push(ValidationError::warning(
                                "category",
                                format!("unknown category '{}', will be created", record.category.trim()),
                            ));
                            (Some(category.id), Some(category))
                        }
                        Err(e) => {
                            defects.push(ValidationError::error("category", e.to_string()));
                            (None, None)
                        }
                    }
                }
            }
        };

        let rejected = defects.iter().any(|d| d.severity == Severity::Error);
        let outcome = if rejected {
            RecordOutcome::Rejected
        } else {
            // all four must be present when nothing rejected the record
            match (date, amount, kind, account_id) {
                (Some(date), Some(amount), Some(kind), Some(account_id)) => {
                    let pending = PendingCommit {
                        date,
                        amount,
                        kind,
                        account_id,
                        category_id,
                        new_account,
                        new_category,
                    };
                    match self.commit_record(&record.title, pending, events) {
                        Ok(id) => RecordOutcome::Committed(id),
                        Err(e) => {
                            defects.push(ValidationError::error("record", e.to_string()));
                            RecordOutcome::Rejected
                        }
                    }
                }
                _ => RecordOutcome::Rejected,
            }
        };

        RecordReport {
            row,
            title: record.title.clone(),
            outcome,
            defects,
        }
    }

    /// Commit one accepted record: create any deferred entities, then the
    /// transaction itself
    fn commit_record(
        &mut self,
        title: &str,
        pending: PendingCommit,
        events: &mut Vec<ChangeEvent>,
    ) -> LedgerResult<TransactionId> {
        if let Some(account) = pending.new_account {
            events.push(self.store.insert_account(account)?);
        }
        if let Some(category) = pending.new_category {
            events.push(self.store.insert_category(category)?);
        }

        let timestamp = pending
            .date
            .and_hms_opt(12, 0, 0)
            .unwrap_or_default()
            .and_utc();
        let mut txn = Transaction::new(pending.account_id, title, pending.amount, pending.kind, timestamp);
        txn.set_category(pending.category_id);
        let id = txn.id;
        events.push(self.store.insert_transaction(txn)?);
        Ok(id)
    }
}

/// Everything a validated record needs at commit time, including entities
/// whose creation was deferred past the error check
struct PendingCommit {
    date: NaiveDate,
    amount: Money,
    kind: TransactionKind,
    account_id: AccountId,
    category_id: Option<CategoryId>,
    new_account: Option<Account>,
    new_category: Option<ExpenseCategory>,
}

/// Fold one record's report into the batch totals
fn tally(result: &mut ImportResult, report: RecordReport) {
    if report.has_errors() {
        result.rejected += 1;
    } else if report.has_warnings() {
        result.warned += 1;
    } else {
        result.accepted += 1;
    }
    result.reports.push(report);
}

/// Parse a date string using multiple format attempts
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let formats = [
        "%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d/%m/%Y", "%d/%m/%y", "%Y/%m/%d", "%m-%d-%Y",
        "%d-%m-%Y",
    ];
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, title: &str, amount: &str, kind: &str, account: &str, category: &str) -> RawRecord {
        RawRecord {
            date: date.into(),
            title: title.into(),
            amount: amount.into(),
            kind: kind.into(),
            account: account.into(),
            category: category.into(),
        }
    }

    fn seeded_store() -> EntityStore {
        let mut store = EntityStore::new();
        store
            .insert_account(Account::new("Checking", AccountKind::Checking))
            .unwrap();
        store
            .insert_category(ExpenseCategory::new("Dining"))
            .unwrap();
        store
    }

    #[test]
    fn test_clean_batch_commits_everything() {
        let mut store = seeded_store();
        let mut pipeline = ImportPipeline::new(&mut store);

        let (result, events) = pipeline.import_records(vec![
            raw("2026-01-01", "Salary", "5000", "income", "Checking", ""),
            raw("2026-01-02", "Lunch", "12.50", "expense", "Checking", "Dining"),
        ]);

        assert!(result.success());
        assert_eq!(result.accepted, 2);
        assert_eq!(result.warned, 0);
        assert_eq!(result.rejected, 0);
        assert_eq!(events.len(), 2);
        assert_eq!(store.transactions().count(), 2);
    }

    #[test]
    fn test_bad_record_rejected_rest_commits() {
        let mut store = seeded_store();
        let mut pipeline = ImportPipeline::new(&mut store);

        let (result, _events) = pipeline.import_records(vec![
            raw("2026-01-01", "Salary", "5000", "income", "Checking", ""),
            raw("2026-01-02", "Refund", "-5", "income", "Checking", ""),
            raw("2026-01-03", "Lunch", "12.50", "expense", "Checking", "Dining"),
        ]);

        assert!(!result.success());
        assert_eq!(result.accepted, 2);
        assert_eq!(result.rejected, 1);
        assert_eq!(result.total(), 3);

        let rejection = result.rejections().next().unwrap();
        assert_eq!(rejection.row, 1);
        assert_eq!(rejection.defects.len(), 1);
        assert_eq!(rejection.defects[0].field, "amount");

        // the rejected record left nothing behind
        assert_eq!(store.transactions().count(), 2);
    }

    #[test]
    fn test_all_defects_collected() {
        let mut store = seeded_store();
        let mut pipeline = ImportPipeline::new(&mut store);

        let (result, _) = pipeline.import_records(vec![raw(
            "not-a-date",
            "",
            "zero",
            "sideways",
            "",
            "",
        )]);

        assert_eq!(result.rejected, 1);
        let report = &result.reports[0];
        let fields: Vec<&str> = report.defects.iter().map(|d| d.field).collect();
        assert_eq!(fields, vec!["date", "title", "amount", "kind", "account"]);
    }

    #[test]
    fn test_unknown_account_and_category_create_with_warning() {
        let mut store = seeded_store();
        let mut pipeline = ImportPipeline::new(&mut store);

        let (result, events) = pipeline.import_records(vec![raw(
            "2026-01-05",
            "Train ticket",
            "32.00",
            "expense",
            "Travel Card",
            "Transport",
        )]);

        assert!(result.success());
        assert_eq!(result.warned, 1);
        assert_eq!(result.accepted, 0);
        // account create + category create + transaction create
        assert_eq!(events.len(), 3);
        assert!(store.account_by_name("Travel Card").is_some());
        assert!(store.category_by_name("Transport").is_some());
    }

    #[test]
    fn test_rejected_record_creates_nothing() {
        let mut store = seeded_store();
        let mut pipeline = ImportPipeline::new(&mut store);

        // bad amount rejects the record, so its unknown account and
        // category must not be created
        let (result, events) = pipeline.import_records(vec![raw(
            "2026-01-07",
            "Refund",
            "-5",
            "income",
            "Ghost Bank",
            "Phantom",
        )]);

        assert_eq!(result.rejected, 1);
        assert!(events.is_empty());
        assert!(store.account_by_name("Ghost Bank").is_none());
        assert!(store.category_by_name("Phantom").is_none());
        assert_eq!(store.transactions().count(), 0);
    }

    #[test]
    fn test_missing_kind_defaults_to_expense_with_warning() {
        let mut store = seeded_store();
        let mut pipeline = ImportPipeline::new(&mut store);

        let (result, _) = pipeline.import_records(vec![raw(
            "2026-01-06",
            "Mystery charge",
            "9.99",
            "",
            "Checking",
            "",
        )]);

        assert_eq!(result.warned, 1);
        let txn = store.transactions().next().unwrap();
        assert!(txn.is_expense());
    }

    #[test]
    fn test_csv_with_header() {
        let mut store = seeded_store();
        let mut pipeline = ImportPipeline::new(&mut store);

        let csv = "\
date,title,amount,kind,account,category
2026-01-01,Salary,5000,income,Checking,
01/02/2026,Lunch,12.50,expense,Checking,Dining
";
        let (result, _) = pipeline.import_csv(csv.as_bytes());
        assert!(result.success());
        assert_eq!(result.accepted, 2);
    }

    #[test]
    fn test_csv_without_header() {
        let mut store = seeded_store();
        let mut pipeline = ImportPipeline::new(&mut store);

        let csv = "2026-01-01,Salary,5000,income,Checking,\n";
        let (result, _) = pipeline.import_csv(csv.as_bytes());
        assert_eq!(result.accepted, 1);
    }

    #[test]
    fn test_csv_short_row_graded_not_fatal() {
        let mut store = seeded_store();
        let mut pipeline = ImportPipeline::new(&mut store);

        let csv = "2026-01-01,Salary\n";
        let (result, _) = pipeline.import_csv(csv.as_bytes());
        assert_eq!(result.rejected, 1);
        assert!(result.reports[0].has_errors());
    }

    #[test]
    fn test_csv_malformed_row_rejected_not_fatal() {
        let mut store = seeded_store();
        let mut pipeline = ImportPipeline::new(&mut store);

        // unclosed quote breaks the middle row only
        let csv = "\
2026-01-01,Salary,5000,income,Checking,
2026-01-02,\"broken,12.50,expense,Checking,
2026-01-03,Lunch,12.50,expense,Checking,Dining
";
        let (result, _) = pipeline.import_csv(csv.as_bytes());
        assert!(!result.success());
        assert!(result.rejected >= 1);
        assert!(result.accepted >= 1);
        assert_eq!(result.total(), result.reports.len());
    }

    #[test]
    fn test_date_formats() {
        assert!(parse_date("2026-01-31").is_some());
        assert!(parse_date("01/31/2026").is_some());
        assert!(parse_date("31/01/2026").is_some());
        assert!(parse_date("2026/01/31").is_some());
        assert!(parse_date("yesterday").is_none());
    }
}
