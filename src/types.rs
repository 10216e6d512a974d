//! Core types and data structures for statement ingestion and ledger posting

use bigdecimal::BigDecimal;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Side of a ledger line in double-entry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Debit - increases Assets and Expenses, decreases Liabilities, Equity, and Income
    Debit,
    /// Credit - increases Liabilities, Equity, and Income, decreases Assets and Expenses
    Credit,
}

impl Side {
    /// The opposite side, used when a mapped line needs a balancing counterpart
    pub fn opposite(self) -> Self {
        match self {
            Side::Debit => Side::Credit,
            Side::Credit => Side::Debit,
        }
    }
}

/// Reconciliation state of a bank transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Unmatched,
    Matched,
}

/// Canonical bank transaction produced by the statement parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransaction {
    /// Synthetic identifier, unique within one ingestion run
    pub id: String,
    /// Client that owns the statement
    pub client_id: String,
    /// Booking date (serialized as `YYYY-MM-DD`)
    pub date: NaiveDate,
    /// Free-text description as printed on the statement
    pub description: String,
    /// Signed amount: positive is an inflow, negative an outflow
    pub amount: BigDecimal,
    /// Running balance when the bank layout carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<BigDecimal>,
    /// Document this transaction was reconciled against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_document_id: Option<String>,
    pub status: TransactionStatus,
}

impl BankTransaction {
    /// Money came into the account
    pub fn is_inflow(&self) -> bool {
        self.amount > BigDecimal::from(0)
    }

    /// Money left the account
    pub fn is_outflow(&self) -> bool {
        self.amount < BigDecimal::from(0)
    }
}

/// Accounting month in `YYYY-MM` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodMonth {
    year: i32,
    month: u32,
}

impl PeriodMonth {
    /// Build a period from a year and a 1-based month
    pub fn new(year: i32, month: u32) -> LedgerResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidPeriod(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// The period a date falls into
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the period
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Whether the date lies inside this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }
}

impl fmt::Display for PeriodMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodMonth {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidPeriod(format!("expected YYYY-MM, got '{s}'"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl Serialize for PeriodMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeriodMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Key of the per-client accounting period
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    pub client_id: String,
    pub month: PeriodMonth,
}

impl PeriodKey {
    pub fn new(client_id: impl Into<String>, month: PeriodMonth) -> Self {
        Self {
            client_id: client_id.into(),
            month,
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.client_id, self.month)
    }
}

/// Accounting period state for one client and month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub client_id: String,
    pub month: PeriodMonth,
    /// Once locked, no entry group dated inside the period may be posted
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,
}

impl Period {
    /// A fresh, unlocked period
    pub fn open(client_id: impl Into<String>, month: PeriodMonth) -> Self {
        Self {
            client_id: client_id.into(),
            month,
            locked: false,
            locked_at: None,
            locked_by: None,
        }
    }

    pub fn key(&self) -> PeriodKey {
        PeriodKey::new(self.client_id.clone(), self.month)
    }
}

/// Single posting line inside an entry group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerLine {
    /// Fixed-width numeric account code from the firm's chart of accounts
    pub account_code: String,
    pub side: Side,
    pub account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_center: Option<String>,
    /// Non-negative amount with 2-decimal precision
    pub amount: BigDecimal,
    /// Whether the account was picked by a mapping rule rather than a person
    #[serde(default)]
    pub auto_mapped: bool,
}

impl LedgerLine {
    /// Create a new line
    pub fn new(
        account_code: impl Into<String>,
        account_name: impl Into<String>,
        side: Side,
        amount: BigDecimal,
    ) -> Self {
        Self {
            account_code: account_code.into(),
            side,
            account_name: account_name.into(),
            cost_center: None,
            amount,
            auto_mapped: false,
        }
    }

    /// Create a debit line
    pub fn debit(
        account_code: impl Into<String>,
        account_name: impl Into<String>,
        amount: BigDecimal,
    ) -> Self {
        Self::new(account_code, account_name, Side::Debit, amount)
    }

    /// Create a credit line
    pub fn credit(
        account_code: impl Into<String>,
        account_name: impl Into<String>,
        amount: BigDecimal,
    ) -> Self {
        Self::new(account_code, account_name, Side::Credit, amount)
    }

    pub fn with_cost_center(mut self, cost_center: impl Into<String>) -> Self {
        self.cost_center = Some(cost_center.into());
        self
    }

    pub fn auto_mapped(mut self) -> Self {
        self.auto_mapped = true;
        self
    }
}

/// Lines produced from one source document or one manual voucher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryGroup {
    pub id: String,
    pub client_id: String,
    pub date: NaiveDate,
    /// Number printed on the source document (invoice number, voucher number)
    pub source_doc_number: String,
    /// Identifier of the captured source document, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_doc_id: Option<String>,
    /// Tax id of the vendor or customer on the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_tax_id: Option<String>,
    pub description: String,
    pub period_month: PeriodMonth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub lines: Vec<LedgerLine>,
}

impl LedgerEntryGroup {
    /// Create an empty group; the period is derived from the date
    pub fn new(
        client_id: impl Into<String>,
        date: NaiveDate,
        source_doc_number: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            date,
            source_doc_number: source_doc_number.into(),
            source_doc_id: None,
            counterparty_tax_id: None,
            description: description.into(),
            period_month: PeriodMonth::from_date(date),
            created_by: None,
            lines: Vec::new(),
        }
    }

    /// Add a line to the group
    pub fn add_line(&mut self, line: LedgerLine) {
        self.lines.push(line);
    }

    /// Calculate total debits
    pub fn total_debits(&self) -> BigDecimal {
        self.lines
            .iter()
            .filter(|l| l.side == Side::Debit)
            .map(|l| &l.amount)
            .sum()
    }

    /// Calculate total credits
    pub fn total_credits(&self) -> BigDecimal {
        self.lines
            .iter()
            .filter(|l| l.side == Side::Credit)
            .map(|l| &l.amount)
            .sum()
    }

    /// Signed difference, debits minus credits
    pub fn difference(&self) -> BigDecimal {
        self.total_debits() - self.total_credits()
    }

    /// Check if debits equal credits within the given tolerance
    pub fn is_balanced(&self, tolerance: &BigDecimal) -> bool {
        self.difference().abs() <= *tolerance
    }

    /// The period key this group commits under
    pub fn period_key(&self) -> PeriodKey {
        PeriodKey::new(self.client_id.clone(), self.period_month)
    }
}

/// Machine-readable code of a validation error or warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    EmptyEntry,
    Unbalanced,
    PeriodLocked,
    InvalidAccountCode,
    NegativeAmount,
    ZeroAmount,
    AmountPrecision,
    AmbiguousSide,
    PeriodMismatch,
    DuplicateDocument,
    PossibleDuplicate,
    StorageError,
}

/// A single validation finding, rendered verbatim by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
    /// Index of the offending line inside the group, when line-specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ValidationIssue {
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(code: IssueCode, line: usize, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of validating one entry group; never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    /// Debits minus credits of the validated group
    pub difference: BigDecimal,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            difference: BigDecimal::from(0),
        }
    }
}

impl ValidationResult {
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
        self.is_valid = false;
    }

    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn has_warning(&self, code: IssueCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
