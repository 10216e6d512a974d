//! Duplicate document detection
//!
//! An exact match is the same document number from the same counterparty and
//! is treated as certain duplication even when amount or date drifted (a
//! corrected re-upload). A fuzzy match is the same counterparty and amount
//! within a few days under a different number, which catches re-keyed or
//! re-scanned documents. Fuzzy matches are reported, never auto-rejected.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::LedgerEntryGroup;

/// Classification of a duplicate check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Fuzzy,
    None,
}

/// Identity of a document used only at validation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateFingerprint {
    pub document_number: String,
    pub counterparty_tax_id: String,
    pub amount: BigDecimal,
    pub date: NaiveDate,
}

impl DuplicateFingerprint {
    pub fn new(
        document_number: impl Into<String>,
        counterparty_tax_id: impl Into<String>,
        amount: BigDecimal,
        date: NaiveDate,
    ) -> Self {
        Self {
            document_number: document_number.into().trim().to_string(),
            counterparty_tax_id: counterparty_tax_id.into().trim().to_string(),
            amount,
            date,
        }
    }

    /// Fingerprint of a group: its document number, counterparty and debit total
    pub fn from_group(group: &LedgerEntryGroup) -> Self {
        Self::new(
            group.source_doc_number.as_str(),
            group.counterparty_tax_id.as_deref().unwrap_or_default(),
            group.total_debits(),
            group.date,
        )
    }

    fn same_document(&self, other: &DuplicateFingerprint) -> bool {
        !self.document_number.is_empty()
            && !self.counterparty_tax_id.is_empty()
            && self.document_number == other.document_number
            && self.counterparty_tax_id == other.counterparty_tax_id
    }

    fn near(&self, other: &DuplicateFingerprint, window_days: i64) -> bool {
        !self.counterparty_tax_id.is_empty()
            && self.counterparty_tax_id == other.counterparty_tax_id
            && self.document_number != other.document_number
            && self.amount.round(2) == other.amount.round(2)
            && (self.date - other.date).num_days().abs() <= window_days
    }
}

/// An existing document or posted group for the same client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    #[serde(flatten)]
    pub fingerprint: DuplicateFingerprint,
}

impl DocumentRecord {
    pub fn new(id: impl Into<String>, fingerprint: DuplicateFingerprint) -> Self {
        Self {
            id: id.into(),
            fingerprint,
        }
    }

    pub fn from_group(group: &LedgerEntryGroup) -> Self {
        Self::new(group.id.clone(), DuplicateFingerprint::from_group(group))
    }
}

/// Result of a duplicate check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    pub match_type: MatchType,
    pub matches: Vec<DocumentRecord>,
}

impl DuplicateCheck {
    fn none() -> Self {
        Self {
            is_duplicate: false,
            match_type: MatchType::None,
            matches: Vec::new(),
        }
    }
}

/// Classify a candidate document against the client's existing records
///
/// Exact matches take precedence: when any exist, only they are returned.
pub fn check_duplicate(
    existing: &[DocumentRecord],
    candidate: &DuplicateFingerprint,
    window_days: i64,
) -> DuplicateCheck {
    let exact: Vec<DocumentRecord> = existing
        .iter()
        .filter(|r| candidate.same_document(&r.fingerprint))
        .cloned()
        .collect();
    if !exact.is_empty() {
        return DuplicateCheck {
            is_duplicate: true,
            match_type: MatchType::Exact,
            matches: exact,
        };
    }

    let fuzzy: Vec<DocumentRecord> = existing
        .iter()
        .filter(|r| candidate.near(&r.fingerprint, window_days))
        .cloned()
        .collect();
    if !fuzzy.is_empty() {
        return DuplicateCheck {
            is_duplicate: true,
            match_type: MatchType::Fuzzy,
            matches: fuzzy,
        };
    }

    DuplicateCheck::none()
}
