//! Bank statement layouts and content-based format detection

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::statement::normalize::DateFormat;
use crate::statement::StatementError;

/// Code of the fallback layout that every registry carries
pub const GENERIC_FORMAT_CODE: &str = "generic";

/// Where the money columns of a layout live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum AmountColumns {
    /// Separate withdrawal (debit) and deposit (credit) columns
    Split { debit: usize, credit: usize },
    /// One signed column, positive for money in
    Signed { amount: usize },
}

/// Column and convention layout of one bank's statement export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankFormat {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub name_th: String,
    /// Lower- or mixed-case tokens searched for in the file content
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    pub date_column: usize,
    pub description_column: usize,
    pub amounts: AmountColumns,
    #[serde(default)]
    pub balance_column: Option<usize>,
    #[serde(default)]
    pub date_format: DateFormat,
    /// Dates carry Buddhist-era years
    #[serde(default)]
    pub buddhist_year: bool,
    /// Zero-based index of the header row; it and every row before it are skipped
    #[serde(default)]
    pub header_row: Option<usize>,
    /// Zero-based row indices that never carry transactions
    #[serde(default)]
    pub skip_rows: Vec<usize>,
    /// Factor applied to every parsed amount
    #[serde(default)]
    pub amount_scale: Option<BigDecimal>,
}

fn default_delimiter() -> char {
    ','
}

impl BankFormat {
    /// Check the layout can actually be used by the parser
    pub fn validate(&self) -> Result<(), StatementError> {
        if self.code.trim().is_empty() {
            return Err(StatementError::InvalidFormat(
                "format code cannot be empty".to_string(),
            ));
        }
        if !self.delimiter.is_ascii() {
            return Err(StatementError::InvalidFormat(format!(
                "format '{}': delimiter must be an ASCII character",
                self.code
            )));
        }
        if let AmountColumns::Split { debit, credit } = self.amounts {
            if debit == credit {
                return Err(StatementError::InvalidFormat(format!(
                    "format '{}': debit and credit columns must differ",
                    self.code
                )));
            }
        }
        Ok(())
    }

    /// Delimiter as the byte the tokenizer expects
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }

    /// Smallest number of fields a transaction row must have
    pub fn required_columns(&self) -> usize {
        let amount_max = match self.amounts {
            AmountColumns::Split { debit, credit } => debit.max(credit),
            AmountColumns::Signed { amount } => amount,
        };
        self.date_column.max(self.description_column).max(amount_max) + 1
    }

    /// Whether a row index is the header, above it, or explicitly skipped
    pub fn is_skipped_row(&self, row: usize) -> bool {
        self.header_row.is_some_and(|header| row <= header) || self.skip_rows.contains(&row)
    }

    /// Apply the optional scaling factor
    pub fn scale(&self, amount: BigDecimal) -> BigDecimal {
        match &self.amount_scale {
            Some(factor) => amount * factor,
            None => amount,
        }
    }

    /// Whether any alias occurs in the lower-cased sample
    fn matches(&self, lowered_sample: &str) -> bool {
        self.aliases
            .iter()
            .any(|alias| !alias.is_empty() && lowered_sample.contains(&alias.to_lowercase()))
    }

    /// The four-column fallback: date, description, debit, credit
    pub fn generic() -> Self {
        Self {
            code: GENERIC_FORMAT_CODE.to_string(),
            name: "Generic statement".to_string(),
            name_th: "รูปแบบทั่วไป".to_string(),
            aliases: Vec::new(),
            delimiter: ',',
            date_column: 0,
            description_column: 1,
            amounts: AmountColumns::Split {
                debit: 2,
                credit: 3,
            },
            balance_column: None,
            date_format: DateFormat::DayMonthYear,
            buddhist_year: true,
            header_row: Some(0),
            skip_rows: Vec::new(),
            amount_scale: None,
        }
    }
}

/// Builds a split-column layout; the built-in banks differ only in data
#[allow(clippy::too_many_arguments)]
fn bank(
    code: &str,
    name: &str,
    name_th: &str,
    aliases: &[&str],
    description_column: usize,
    amounts: AmountColumns,
    balance_column: Option<usize>,
    date_format: DateFormat,
    buddhist_year: bool,
) -> BankFormat {
    BankFormat {
        code: code.to_string(),
        name: name.to_string(),
        name_th: name_th.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        delimiter: ',',
        date_column: 0,
        description_column,
        amounts,
        balance_column,
        date_format,
        buddhist_year,
        header_row: Some(0),
        skip_rows: Vec::new(),
        amount_scale: None,
    }
}

/// Catalog of known bank layouts
///
/// Detection walks the banks in registration order and the first alias hit
/// wins; the generic layout is returned when nothing matches.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    banks: Vec<BankFormat>,
    generic: BankFormat,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FormatRegistry {
    /// A registry holding only the generic layout
    pub fn empty() -> Self {
        Self {
            banks: Vec::new(),
            generic: BankFormat::generic(),
        }
    }

    /// Layouts of the major Thai banks
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.banks = vec![
            bank(
                "KBANK",
                "Kasikornbank",
                "ธนาคารกสิกรไทย",
                &["kasikorn", "kbank", "k-bank", "กสิกร"],
                2,
                AmountColumns::Split { debit: 3, credit: 4 },
                Some(5),
                DateFormat::DayMonthYear,
                false,
            ),
            bank(
                "SCB",
                "Siam Commercial Bank",
                "ธนาคารไทยพาณิชย์",
                &["siam commercial", "scb", "ไทยพาณิชย์"],
                2,
                AmountColumns::Split { debit: 3, credit: 4 },
                Some(5),
                DateFormat::DayMonthYear,
                true,
            ),
            bank(
                "BBL",
                "Bangkok Bank",
                "ธนาคารกรุงเทพ",
                &["bangkok bank", "bualuang", "ธนาคารกรุงเทพ"],
                1,
                AmountColumns::Split { debit: 2, credit: 3 },
                Some(4),
                DateFormat::DayMonthYear,
                true,
            ),
            bank(
                "KTB",
                "Krungthai Bank",
                "ธนาคารกรุงไทย",
                &["krungthai", "krung thai", "กรุงไทย"],
                1,
                AmountColumns::Signed { amount: 2 },
                Some(3),
                DateFormat::DayMonthYear,
                true,
            ),
            bank(
                "BAY",
                "Bank of Ayudhya (Krungsri)",
                "ธนาคารกรุงศรีอยุธยา",
                &["krungsri", "bank of ayudhya", "กรุงศรี"],
                1,
                AmountColumns::Split { debit: 2, credit: 3 },
                Some(4),
                DateFormat::DayMonthYear,
                false,
            ),
            bank(
                "TTB",
                "TMBThanachart Bank",
                "ธนาคารทหารไทยธนชาต",
                &["tmbthanachart", "ttb bank", "ทหารไทยธนชาต"],
                1,
                AmountColumns::Split { debit: 2, credit: 3 },
                Some(4),
                DateFormat::YearMonthDay,
                false,
            ),
        ];
        registry
    }

    /// Register additional layouts, skipping invalid ones
    pub fn with_formats(mut self, formats: impl IntoIterator<Item = BankFormat>) -> Self {
        for format in formats {
            let code = format.code.clone();
            if let Err(e) = self.register(format) {
                tracing::warn!(code = %code, error = %e, "Ignoring invalid bank format");
            }
        }
        self
    }

    /// Add a layout; an existing layout with the same code is replaced
    pub fn register(&mut self, format: BankFormat) -> Result<(), StatementError> {
        format.validate()?;
        if format.code.eq_ignore_ascii_case(GENERIC_FORMAT_CODE) {
            self.generic = format;
            return Ok(());
        }
        match self
            .banks
            .iter_mut()
            .find(|b| b.code.eq_ignore_ascii_case(&format.code))
        {
            Some(existing) => *existing = format,
            None => self.banks.push(format),
        }
        Ok(())
    }

    /// Look a layout up by code, case-insensitively
    pub fn get(&self, code: &str) -> Option<&BankFormat> {
        let code = code.trim();
        if code.eq_ignore_ascii_case(GENERIC_FORMAT_CODE) {
            return Some(&self.generic);
        }
        self.banks.iter().find(|b| b.code.eq_ignore_ascii_case(code))
    }

    /// The fallback layout
    pub fn generic(&self) -> &BankFormat {
        &self.generic
    }

    /// Pick a layout from a sample of the file content
    pub fn detect(&self, sample: &str) -> &BankFormat {
        let lowered = sample.to_lowercase();
        self.banks
            .iter()
            .find(|b| b.matches(&lowered))
            .unwrap_or(&self.generic)
    }

    /// Codes of all registered layouts, generic last
    pub fn codes(&self) -> Vec<&str> {
        self.banks
            .iter()
            .map(|b| b.code.as_str())
            .chain(std::iter::once(self.generic.code.as_str()))
            .collect()
    }
}
