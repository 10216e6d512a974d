//! Validation utilities

use bigdecimal::BigDecimal;

use crate::types::*;

/// Validate that an amount is not negative
pub fn validate_non_negative_amount(amount: &BigDecimal) -> LedgerResult<()> {
    if *amount < BigDecimal::from(0) {
        Err(LedgerError::Validation(format!(
            "Amount cannot be negative, got {amount}"
        )))
    } else {
        Ok(())
    }
}

/// Whether an amount fits the 2-decimal currency precision
pub fn has_cent_precision(amount: &BigDecimal) -> bool {
    amount.round(2) == *amount
}

/// Validate that an account code follows the fixed-width numeric convention
pub fn validate_account_code(code: &str, width: usize) -> LedgerResult<()> {
    if code.is_empty() {
        return Err(LedgerError::Validation(
            "Account code cannot be empty".to_string(),
        ));
    }

    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(LedgerError::Validation(format!(
            "Account code '{code}' must contain digits only"
        )));
    }

    if code.len() != width {
        return Err(LedgerError::Validation(format!(
            "Account code '{code}' must be exactly {width} digits"
        )));
    }

    Ok(())
}

/// Validate that a client ID is valid
pub fn validate_client_id(client_id: &str) -> LedgerResult<()> {
    if client_id.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Client ID cannot be empty".to_string(),
        ));
    }

    if client_id.len() > 64 {
        return Err(LedgerError::Validation(
            "Client ID cannot exceed 64 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !client_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Validation(
            "Client ID can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate that an entry description is valid
pub fn validate_description(description: &str) -> LedgerResult<()> {
    if description.chars().count() > 500 {
        return Err(LedgerError::Validation(
            "Entry description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}
