//! Pipeline configuration
//!
//! Posting thresholds, extra bank layouts and account mapping rules.
//! Everything is defaulted, so an empty JSON object is a valid config.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ledger::rules::{MappingRule, RuleSet};
use crate::statement::formats::{BankFormat, FormatRegistry};
use crate::types::*;

/// Posting thresholds and duplicate policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    /// Largest |debits - credits| still accepted as balanced
    pub balance_tolerance: BigDecimal,
    /// Days either side of a document date inside which a fuzzy duplicate is reported
    pub fuzzy_window_days: i64,
    /// Number of digits in a well-formed account code
    pub account_code_width: usize,
    /// Run the duplicate detector while posting
    pub check_duplicates: bool,
    /// Reject exact duplicates instead of only warning about them
    pub block_exact_duplicates: bool,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: BigDecimal::from(5) / BigDecimal::from(100),
            fuzzy_window_days: 7,
            account_code_width: 4,
            check_duplicates: true,
            block_exact_duplicates: true,
        }
    }
}

impl PostingConfig {
    /// Reject settings that would make validation meaningless
    pub fn validate(&self) -> LedgerResult<()> {
        if self.balance_tolerance < BigDecimal::from(0) {
            return Err(LedgerError::Config(
                "balance_tolerance cannot be negative".to_string(),
            ));
        }
        if self.fuzzy_window_days < 0 {
            return Err(LedgerError::Config(
                "fuzzy_window_days cannot be negative".to_string(),
            ));
        }
        if self.account_code_width == 0 {
            return Err(LedgerError::Config(
                "account_code_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete configuration surface of the ingestion and posting pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub posting: PostingConfig,
    /// Bank layouts registered on top of the built-in ones
    pub formats: Vec<BankFormat>,
    /// Account mapping rules, evaluated in order
    pub rules: Vec<MappingRule>,
}

impl PipelineConfig {
    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> LedgerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.posting.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&data)?;
        tracing::info!(
            path = %path.display(),
            formats = config.formats.len(),
            rules = config.rules.len(),
            "Loaded pipeline configuration"
        );
        Ok(config)
    }

    /// Built-in bank layouts plus the configured ones
    pub fn format_registry(&self) -> FormatRegistry {
        FormatRegistry::builtin().with_formats(self.formats.iter().cloned())
    }

    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(self.rules.clone())
    }
}
