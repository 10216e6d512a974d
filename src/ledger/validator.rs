//! Entry group validation: balance, period lock, account codes, line completeness

use bigdecimal::BigDecimal;

use crate::config::PostingConfig;
use crate::traits::EntryValidator;
use crate::types::*;
use crate::utils::validation::{
    has_cent_precision, validate_account_code, validate_non_negative_amount,
};

/// Validator implementing the firm's posting rules
///
/// Every check runs regardless of earlier failures so the caller gets the
/// complete list in one pass.
#[derive(Debug, Clone)]
pub struct StandardEntryValidator {
    tolerance: BigDecimal,
    account_code_width: usize,
}

impl Default for StandardEntryValidator {
    fn default() -> Self {
        Self::from_config(&PostingConfig::default())
    }
}

impl StandardEntryValidator {
    pub fn new(tolerance: BigDecimal, account_code_width: usize) -> Self {
        Self {
            tolerance,
            account_code_width,
        }
    }

    pub fn from_config(config: &PostingConfig) -> Self {
        Self::new(config.balance_tolerance.clone(), config.account_code_width)
    }

    fn check_balance(&self, group: &LedgerEntryGroup, result: &mut ValidationResult) {
        let difference = group.difference();
        if difference.abs() > self.tolerance {
            result.push_error(ValidationIssue::new(
                IssueCode::Unbalanced,
                format!(
                    "Entry is not balanced: debits = {}, credits = {}, difference = {}",
                    group.total_debits(),
                    group.total_credits(),
                    difference
                ),
            ));
        }
        result.difference = difference;
    }

    fn check_period(
        &self,
        group: &LedgerEntryGroup,
        period: Option<&Period>,
        result: &mut ValidationResult,
    ) {
        if period.is_some_and(|p| p.locked) {
            result.push_error(ValidationIssue::new(
                IssueCode::PeriodLocked,
                format!(
                    "Period {} is locked for client {}",
                    group.period_month, group.client_id
                ),
            ));
        }
    }

    fn check_lines(&self, group: &LedgerEntryGroup, result: &mut ValidationResult) {
        for (index, line) in group.lines.iter().enumerate() {
            if let Err(e) = validate_account_code(&line.account_code, self.account_code_width) {
                result.push_error(ValidationIssue::at_line(
                    IssueCode::InvalidAccountCode,
                    index,
                    format!("Line {}: {}", index + 1, validation_message(e)),
                ));
            }

            if let Err(e) = validate_non_negative_amount(&line.amount) {
                result.push_error(ValidationIssue::at_line(
                    IssueCode::NegativeAmount,
                    index,
                    format!("Line {}: {}", index + 1, validation_message(e)),
                ));
            } else if line.amount == BigDecimal::from(0) {
                result.push_warning(ValidationIssue::at_line(
                    IssueCode::ZeroAmount,
                    index,
                    format!(
                        "Line {}: zero amount on account {}",
                        index + 1,
                        line.account_code
                    ),
                ));
            }

            if !has_cent_precision(&line.amount) {
                result.push_warning(ValidationIssue::at_line(
                    IssueCode::AmountPrecision,
                    index,
                    format!(
                        "Line {}: amount {} has more than two decimal places",
                        index + 1,
                        line.amount
                    ),
                ));
            }
        }
    }
}

/// Strip the error-kind prefix so the message reads well on its own
fn validation_message(error: LedgerError) -> String {
    match error {
        LedgerError::Validation(message) => message,
        other => other.to_string(),
    }
}

impl EntryValidator for StandardEntryValidator {
    fn validate(&self, group: &LedgerEntryGroup, period: Option<&Period>) -> ValidationResult {
        let mut result = ValidationResult::default();

        if group.lines.is_empty() {
            result.push_error(ValidationIssue::new(
                IssueCode::EmptyEntry,
                "Entry must have at least one line",
            ));
        }
        self.check_balance(group, &mut result);
        self.check_period(group, period, &mut result);
        self.check_lines(group, &mut result);

        result
    }
}
