//! Statement parsing for delimited text and spreadsheet exports

use bigdecimal::BigDecimal;
use calamine::{Data, Reader};
use chrono::{NaiveDate, Utc};
use std::borrow::Cow;
use std::io::Cursor;

use crate::statement::formats::{AmountColumns, BankFormat, FormatRegistry};
use crate::statement::normalize::{excel_serial_to_date, parse_amount, parse_date, DateFormat};
use crate::statement::{ParsedStatement, RowError, StatementError, StatementFile};
use crate::types::{BankTransaction, TransactionStatus};

/// Rows fed to format detection
const DETECTION_SAMPLE_ROWS: usize = 20;

/// One cell of a statement row, whatever the source file type
#[derive(Debug, Clone, PartialEq)]
enum RawCell {
    Text(String),
    /// Native spreadsheet number; a date serial when found in the date column
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl RawCell {
    fn text(&self) -> String {
        match self {
            RawCell::Text(s) => s.trim().to_string(),
            RawCell::Number(n) => n.to_string(),
            RawCell::Date(d) => d.to_string(),
            RawCell::Empty => String::new(),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            RawCell::Text(s) => s.trim().is_empty(),
            RawCell::Empty => true,
            _ => false,
        }
    }

    fn date(&self, format: DateFormat, buddhist_year: bool) -> Option<NaiveDate> {
        match self {
            RawCell::Text(s) => parse_date(s, format, buddhist_year),
            RawCell::Number(serial) => excel_serial_to_date(*serial),
            RawCell::Date(d) => Some(*d),
            RawCell::Empty => None,
        }
    }

    fn amount(&self) -> BigDecimal {
        match self {
            RawCell::Text(s) => parse_amount(s),
            RawCell::Number(n) => parse_amount(&n.to_string()),
            RawCell::Date(_) | RawCell::Empty => BigDecimal::from(0),
        }
    }
}

impl From<&Data> for RawCell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => RawCell::Number(*i as f64),
            Data::Float(f) => RawCell::Number(*f),
            Data::String(s) => RawCell::Text(s.clone()),
            Data::Bool(b) => RawCell::Text(b.to_string()),
            Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
                .map(RawCell::Date)
                .unwrap_or(RawCell::Empty),
            Data::DateTimeIso(s) => parse_date(s, DateFormat::YearMonthDay, false)
                .map(RawCell::Date)
                .unwrap_or(RawCell::Empty),
            _ => RawCell::Empty,
        }
    }
}

/// A row together with its zero-based position in the file
struct RawRow {
    index: usize,
    cells: Vec<RawCell>,
}

/// Shared row-to-transaction logic for every file type
struct RowConverter<'a> {
    client_id: &'a str,
    format: &'a BankFormat,
    run_stamp: i64,
}

impl<'a> RowConverter<'a> {
    fn new(client_id: &'a str, format: &'a BankFormat) -> Self {
        Self {
            client_id,
            format,
            run_stamp: Utc::now().timestamp_millis(),
        }
    }

    fn convert(
        &self,
        rows: impl IntoIterator<Item = RawRow>,
    ) -> (Vec<BankTransaction>, Vec<RowError>) {
        let mut transactions = Vec::new();
        let mut errors = Vec::new();
        let mut skipped = 0usize;

        for row in rows {
            match self.convert_row(&row) {
                Ok(Some(txn)) => transactions.push(txn),
                Ok(None) => skipped += 1,
                Err(e) => errors.push(e),
            }
        }

        tracing::debug!(
            format = %self.format.code,
            parsed = transactions.len(),
            skipped,
            errors = errors.len(),
            "Converted statement rows"
        );
        (transactions, errors)
    }

    /// `Ok(None)` is a silent skip: blank, header/skip row, no date, or no money
    fn convert_row(&self, row: &RawRow) -> Result<Option<BankTransaction>, RowError> {
        let format = self.format;
        if format.is_skipped_row(row.index) || row.cells.iter().all(RawCell::is_blank) {
            return Ok(None);
        }

        let Some(date) = row
            .cells
            .get(format.date_column)
            .and_then(|c| c.date(format.date_format, format.buddhist_year))
        else {
            tracing::debug!(row = row.index + 1, "Skipping row without a valid date");
            return Ok(None);
        };

        let required = format.required_columns();
        if row.cells.len() < required {
            return Err(RowError::new(
                row.index + 1,
                format!(
                    "expected at least {required} columns, found {}",
                    row.cells.len()
                ),
            ));
        }

        let cell_amount = |column: usize| {
            format.scale(
                row.cells
                    .get(column)
                    .map(RawCell::amount)
                    .unwrap_or_else(|| BigDecimal::from(0)),
            )
        };
        let zero = BigDecimal::from(0);
        let amount = match format.amounts {
            AmountColumns::Split { debit, credit } => {
                // Withdrawals are outflows whatever their printed sign; a
                // negative deposit is a reversal and stays negative
                let debit = cell_amount(debit).abs();
                let credit = cell_amount(credit);
                if debit == zero && credit == zero {
                    return Ok(None);
                }
                credit - debit
            }
            AmountColumns::Signed { amount } => {
                let amount = cell_amount(amount);
                if amount == zero {
                    return Ok(None);
                }
                amount
            }
        };

        let balance = format
            .balance_column
            .and_then(|column| row.cells.get(column))
            .filter(|cell| !cell.is_blank())
            .map(|cell| format.scale(cell.amount()));

        let description = row
            .cells
            .get(format.description_column)
            .map(RawCell::text)
            .unwrap_or_default();

        Ok(Some(BankTransaction {
            id: format!("{}-{}-{}", self.client_id, self.run_stamp, row.index),
            client_id: self.client_id.to_string(),
            date,
            description,
            amount,
            balance,
            matched_document_id: None,
            status: TransactionStatus::Unmatched,
        }))
    }
}

/// Tokenize delimited text; quoted fields may contain the delimiter or newlines
fn delimited_rows(content: &str, format: &BankFormat) -> (Vec<RawRow>, Vec<RowError>) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(format.delimiter_byte())
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for (ordinal, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                let index = record
                    .position()
                    .map(|p| p.line().saturating_sub(1) as usize)
                    .unwrap_or(ordinal);
                rows.push(RawRow {
                    index,
                    cells: record
                        .iter()
                        .map(|field| RawCell::Text(field.to_string()))
                        .collect(),
                });
            }
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(ordinal + 1);
                errors.push(RowError::new(line, e.to_string()));
            }
        }
    }
    (rows, errors)
}

/// Parse a delimited statement
///
/// Malformed rows never abort the run: rows without a valid date are skipped
/// silently and structural problems are returned as row errors.
pub fn parse_delimited(
    content: &str,
    client_id: &str,
    format: &BankFormat,
) -> (Vec<BankTransaction>, Vec<RowError>) {
    let (rows, mut errors) = delimited_rows(content, format);
    let (transactions, row_errors) = RowConverter::new(client_id, format).convert(rows);
    errors.extend(row_errors);
    errors.sort_by_key(|e| e.line);
    (transactions, errors)
}

/// Decode the first worksheet of an `.xlsx` / `.xls` workbook held in memory
fn spreadsheet_rows(bytes: &[u8]) -> Result<Vec<RawRow>, StatementError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| StatementError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(StatementError::EmptyWorkbook)?
        .map_err(|e| StatementError::Spreadsheet(e.to_string()))?;

    // The used range may not start at A1; keep absolute row and column positions
    let (first_row, first_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    Ok(range
        .rows()
        .enumerate()
        .map(|(offset, cells)| RawRow {
            index: first_row + offset,
            cells: std::iter::repeat(RawCell::Empty)
                .take(first_col)
                .chain(cells.iter().map(RawCell::from))
                .collect(),
        })
        .collect())
}

/// Parse a spreadsheet statement
///
/// Numeric cells in the date column are spreadsheet date serials; text cells
/// go through the same date normalization as delimited files.
pub fn parse_spreadsheet(
    bytes: &[u8],
    client_id: &str,
    format: &BankFormat,
) -> Result<(Vec<BankTransaction>, Vec<RowError>), StatementError> {
    let rows = spreadsheet_rows(bytes)?;
    Ok(RowConverter::new(client_id, format).convert(rows))
}

/// Decoder chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Delimited,
    Spreadsheet,
}

impl FileKind {
    fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "csv" | "txt" => Some(FileKind::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(FileKind::Spreadsheet),
            _ => None,
        }
    }
}

fn sheet_sample(name: &str, rows: &[RawRow]) -> String {
    let mut sample = name.to_string();
    for row in rows.iter().take(DETECTION_SAMPLE_ROWS) {
        for cell in &row.cells {
            sample.push(' ');
            sample.push_str(&cell.text());
        }
        sample.push('\n');
    }
    sample
}

/// Single entry point for statement ingestion
#[derive(Debug, Clone, Default)]
pub struct StatementParser {
    registry: FormatRegistry,
}

impl StatementParser {
    pub fn new(registry: FormatRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Parse an uploaded statement
    ///
    /// The file extension selects the decoder. The layout is auto-detected
    /// only when `bank_code` is `None`; an explicit code always wins. This
    /// never fails: system errors are reported in `errors`, and a run that
    /// yields no transactions and no errors reports "no transactions found".
    pub fn parse_statement(
        &self,
        file: &StatementFile,
        client_id: &str,
        bank_code: Option<&str>,
    ) -> ParsedStatement {
        let explicit = match bank_code {
            Some(code) => match self.registry.get(code) {
                Some(format) => Some(format),
                None => {
                    let error = StatementError::UnknownFormat(code.to_string());
                    return self.failed(file, None, error);
                }
            },
            None => None,
        };

        let extension = file.extension().unwrap_or_default();
        let Some(kind) = FileKind::from_extension(&extension) else {
            let shown = if extension.is_empty() {
                file.name.clone()
            } else {
                format!(".{extension}")
            };
            return self.failed(file, explicit, StatementError::UnsupportedFileType(shown));
        };

        let mut notices = Vec::new();
        let (format, rows, mut errors) = match kind {
            FileKind::Delimited => {
                let content = String::from_utf8_lossy(&file.bytes);
                if matches!(content, Cow::Owned(_)) {
                    let notice = StatementError::NotUtf8;
                    tracing::warn!(file = %file.name, "{notice}");
                    notices.push(notice.to_string());
                }
                let format = explicit.unwrap_or_else(|| {
                    let head: Vec<&str> = content.lines().take(DETECTION_SAMPLE_ROWS).collect();
                    self.registry
                        .detect(&format!("{}\n{}", file.name, head.join("\n")))
                });
                let (rows, errors) = delimited_rows(&content, format);
                (format, rows, errors)
            }
            FileKind::Spreadsheet => match spreadsheet_rows(&file.bytes) {
                Ok(rows) => {
                    let format = explicit.unwrap_or_else(|| {
                        self.registry.detect(&sheet_sample(&file.name, &rows))
                    });
                    (format, rows, Vec::new())
                }
                Err(e) => return self.failed(file, explicit, e),
            },
        };

        let (transactions, row_errors) = RowConverter::new(client_id, format).convert(rows);
        errors.extend(row_errors);
        errors.sort_by_key(|e| e.line);

        let mut messages = notices;
        messages.extend(errors.iter().map(ToString::to_string));
        if transactions.is_empty() && messages.is_empty() {
            messages.push("No transactions found in file".to_string());
        }

        tracing::info!(
            file = %file.name,
            client_id,
            format = %format.code,
            transactions = transactions.len(),
            errors = messages.len(),
            "Parsed bank statement"
        );

        ParsedStatement {
            transactions,
            format: format.clone(),
            errors: messages,
        }
    }

    fn failed(
        &self,
        file: &StatementFile,
        format: Option<&BankFormat>,
        error: StatementError,
    ) -> ParsedStatement {
        tracing::warn!(file = %file.name, error = %error, "Statement could not be read");
        ParsedStatement {
            transactions: Vec::new(),
            format: format.unwrap_or_else(|| self.registry.generic()).clone(),
            errors: vec![error.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_delimited_basic() {
        let content = "Date,Description,Debit,Credit\n\
                       01/01/2567,Opening deposit,,10000.00\n\
                       02/01/2567,\"Rent, January\",\"5,000.00\",\n";
        let format = BankFormat::generic();
        let (txns, errors) = parse_delimited(content, "client-1", &format);

        assert!(errors.is_empty());
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].date, ymd(2024, 1, 1));
        assert_eq!(txns[0].amount, dec("10000"));
        assert_eq!(txns[1].description, "Rent, January");
        assert_eq!(txns[1].amount, dec("-5000"));
        assert_eq!(txns[1].status, TransactionStatus::Unmatched);
        assert!(txns.iter().all(|t| t.client_id == "client-1"));
    }

    #[test]
    fn test_malformed_date_row_is_skipped_silently() {
        let mut content = String::from("Date,Description,Debit,Credit\n");
        for day in 1..=10 {
            content.push_str(&format!("{day:02}/03/2567,Sale {day},,100.00\n"));
            if day == 5 {
                content.push_str("3x/03/2567,Broken row,,100.00\n");
            }
        }
        let (txns, errors) = parse_delimited(&content, "c1", &BankFormat::generic());
        assert_eq!(txns.len(), 10);
        assert!(errors.is_empty());

        let mut nine_valid = String::from("Date,Description,Debit,Credit\n");
        for day in 1..=9 {
            nine_valid.push_str(&format!("{day:02}/03/2567,Sale {day},,100.00\n"));
        }
        nine_valid.push_str("not-a-date,Broken row,,100.00\n");
        let (txns, errors) = parse_delimited(&nine_valid, "c1", &BankFormat::generic());
        assert_eq!(txns.len(), 9);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_zero_rows_and_blank_lines_skipped() {
        let content = "Date,Description,Debit,Credit\n\
                       \n\
                       01/01/2024,Balance brought forward,0.00,0.00\n\
                       ,,,\n\
                       02/01/2024,Fee,15.00,\n";
        let (txns, errors) = parse_delimited(content, "c1", &BankFormat::generic());
        assert!(errors.is_empty());
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].amount, dec("-15"));
    }

    #[test]
    fn test_short_row_is_reported() {
        let content = "Date,Description,Debit,Credit\n01/01/2024,Truncated\n";
        let (txns, errors) = parse_delimited(content, "c1", &BankFormat::generic());
        assert!(txns.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 2);
        assert!(errors[0].to_string().starts_with("Row 2:"));
    }

    #[test]
    fn test_skip_rows_and_header_offset() {
        let mut format = BankFormat::generic();
        format.header_row = Some(1);
        format.skip_rows = vec![3];
        let content = "Statement for 01/01/2024\n\
                       Date,Description,Debit,Credit\n\
                       01/01/2024,Deposit,,50\n\
                       01/01/2024,Subtotal,,50\n\
                       02/01/2024,Deposit,,25\n";
        let (txns, _) = parse_delimited(content, "c1", &format);
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[1].amount, dec("25"));
    }

    #[test]
    fn test_signed_amount_with_scale_and_balance() {
        let mut format = BankFormat::generic();
        format.amounts = AmountColumns::Signed { amount: 2 };
        format.balance_column = Some(3);
        format.amount_scale = Some(dec("0.01"));
        format.delimiter = ';';
        let content = "Date;Description;Amount;Balance\n\
                       15/06/2567;Card payment;-12550;100000\n";
        let (txns, _) = parse_delimited(content, "c1", &format);
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].amount, dec("-125.50"));
        assert_eq!(txns[0].balance, Some(dec("1000")));
    }

    #[test]
    fn test_ids_unique_within_run() {
        let content = "h\n01/01/2024,a,,1\n02/01/2024,b,,2\n03/01/2024,c,,3\n";
        let (txns, _) = parse_delimited(content, "c1", &BankFormat::generic());
        let mut ids: Vec<&str> = txns.iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        assert!(txns[0].id.starts_with("c1-"));
    }

    #[test]
    fn test_parse_statement_detects_and_honours_explicit_code() {
        let parser = StatementParser::default();
        let content = "SCB Easy statement\n\
                       Date,Time,Description,Withdrawal,Deposit,Balance\n\
                       05/01/2567,10:00,Transfer in,,1500.00,1500.00\n";
        let mut format = parser.registry().get("SCB").unwrap().clone();
        format.header_row = Some(1);
        let mut registry = FormatRegistry::builtin();
        registry.register(format).unwrap();
        let parser = StatementParser::new(registry);

        let file = StatementFile::new("statement.csv", content.as_bytes());
        let parsed = parser.parse_statement(&file, "c1", None);
        assert_eq!(parsed.format.code, "SCB");
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].date, ymd(2024, 1, 5));
        assert_eq!(parsed.transactions[0].balance, Some(dec("1500")));

        let parsed = parser.parse_statement(&file, "c1", Some("generic"));
        assert_eq!(parsed.format.code, "generic");
    }

    #[test]
    fn test_parse_statement_errors() {
        let parser = StatementParser::default();

        let pdf = StatementFile::new("statement.pdf", b"%PDF-1.4".to_vec());
        let parsed = parser.parse_statement(&pdf, "c1", None);
        assert!(parsed.transactions.is_empty());
        assert_eq!(parsed.errors, vec!["Unsupported file type: .pdf".to_string()]);

        let empty = StatementFile::new("empty.csv", Vec::new());
        let parsed = parser.parse_statement(&empty, "c1", None);
        assert_eq!(parsed.errors, vec!["No transactions found in file".to_string()]);

        let csv = StatementFile::new("s.csv", b"01/01/2024,x,,1".to_vec());
        let parsed = parser.parse_statement(&csv, "c1", Some("NOPE"));
        assert!(parsed.errors[0].contains("Unknown bank format"));

        let broken = StatementFile::new("broken.xlsx", b"definitely not a zip".to_vec());
        let parsed = parser.parse_statement(&broken, "c1", None);
        assert!(parsed.transactions.is_empty());
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].starts_with("Failed to read spreadsheet"));
    }

    #[test]
    fn test_spreadsheet_cells() {
        let format = BankFormat::generic();
        let converter = RowConverter::new("c1", &format);
        let rows = vec![
            RawRow {
                index: 0,
                cells: vec![RawCell::Text("Date".into()), RawCell::Text("Desc".into())],
            },
            RawRow {
                index: 1,
                cells: vec![
                    RawCell::Number(45657.0),
                    RawCell::Text("Year end fee".into()),
                    RawCell::Number(250.5),
                    RawCell::Empty,
                ],
            },
            RawRow {
                index: 2,
                cells: vec![
                    RawCell::Text("15/01/2568".into()),
                    RawCell::Text("Refund".into()),
                    RawCell::Empty,
                    RawCell::Number(99.0),
                ],
            },
        ];
        let (txns, errors) = converter.convert(rows);
        assert!(errors.is_empty());
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].date, ymd(2024, 12, 31));
        assert_eq!(txns[0].amount, dec("-250.5"));
        assert_eq!(txns[1].date, ymd(2025, 1, 15));
        assert_eq!(txns[1].amount, dec("99"));
    }

    #[test]
    fn test_offsetting_debit_and_credit_is_kept() {
        let content = "Date,Description,Debit,Credit\n01/01/2024,Swap,100.00,100.00\n";
        let (txns, errors) = parse_delimited(content, "c1", &BankFormat::generic());
        assert!(errors.is_empty());
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "Swap");
        assert_eq!(txns[0].amount, dec("0"));
    }

    #[test]
    fn test_split_column_signs() {
        let content = "Date,Description,Debit,Credit\n\
                       01/01/2024,Deposit reversal,,-50.00\n\
                       02/01/2024,Signed withdrawal,-20.00,\n";
        let (txns, errors) = parse_delimited(content, "c1", &BankFormat::generic());
        assert!(errors.is_empty());
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].amount, dec("-50"));
        assert!(txns[0].is_outflow());
        assert_eq!(txns[1].amount, dec("-20"));
    }

    #[test]
    fn test_non_utf8_file_is_reported() {
        // "พิม" in TIS-620
        let bytes = b"Date,Description,Debit,Credit\n01/01/2024,\xbe\xd4\xc1,10.00,\n".to_vec();
        let file = StatementFile::new("thai.csv", bytes);
        let parsed = StatementParser::default().parse_statement(&file, "c1", None);

        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].amount, dec("-10"));
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].contains("not valid UTF-8"));

        let utf8 = StatementFile::new("thai.csv", "Date,Description,Debit,Credit\n01/01/2024,พิม,10.00,\n");
        let parsed = StatementParser::default().parse_statement(&utf8, "c1", None);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.transactions[0].description, "พิม");
    }

    const SHEET_STATEMENT: &[u8] = include_bytes!("../../tests/fixtures/statement_b2.xlsx");

    /// Layout of the fixture workbook, whose used range starts at B2
    fn sheet_format() -> BankFormat {
        let mut format = BankFormat::generic();
        format.code = "UOB".to_string();
        format.name = "UOB Thailand".to_string();
        format.aliases = vec!["uob".to_string()];
        format.date_column = 1;
        format.description_column = 2;
        format.amounts = AmountColumns::Split { debit: 3, credit: 4 };
        format.balance_column = Some(5);
        format.header_row = Some(1);
        format
    }

    #[test]
    fn test_spreadsheet_rows_keep_absolute_positions() {
        let rows = spreadsheet_rows(SHEET_STATEMENT).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[0].cells[0], RawCell::Empty);
        assert_eq!(rows[0].cells[1], RawCell::Text("Date".to_string()));
        // Date-styled serial
        assert_eq!(rows[1].cells[1], RawCell::Date(ymd(2025, 1, 1)));
        // Unstyled serial
        assert_eq!(rows[2].cells[1], RawCell::Number(45659.0));
        assert_eq!(rows[3].cells[1], RawCell::Text("03/01/2568".to_string()));
    }

    #[test]
    fn test_parse_spreadsheet_fixture() {
        let (txns, errors) = parse_spreadsheet(SHEET_STATEMENT, "c1", &sheet_format()).unwrap();
        assert!(errors.is_empty());
        assert_eq!(txns.len(), 3);

        assert_eq!(txns[0].date, ymd(2025, 1, 1));
        assert_eq!(txns[0].description, "Opening transfer");
        assert_eq!(txns[0].amount, dec("1500"));
        assert_eq!(txns[0].balance, Some(dec("1500")));

        assert_eq!(txns[1].date, ymd(2025, 1, 2));
        assert_eq!(txns[1].amount, dec("-25.5"));
        assert_eq!(txns[1].balance, Some(dec("1474.5")));

        assert_eq!(txns[2].date, ymd(2025, 1, 3));
        assert_eq!(txns[2].amount, dec("100"));
        assert!(txns.iter().all(|t| t.description != "Description"));
    }

    #[test]
    fn test_parse_statement_xlsx_detects_registered_format() {
        let mut registry = FormatRegistry::builtin();
        registry.register(sheet_format()).unwrap();
        let parser = StatementParser::new(registry);

        let file = StatementFile::new("uob-2568-01.xlsx", SHEET_STATEMENT);
        let parsed = parser.parse_statement(&file, "c1", None);
        assert_eq!(parsed.format.code, "UOB");
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.transactions.len(), 3);
        assert_eq!(parsed.transactions[1].date, ymd(2025, 1, 2));
    }

    #[test]
    fn test_spreadsheet_integer_cell() {
        assert_eq!(RawCell::from(&Data::Int(1500)), RawCell::Number(1500.0));
        assert_eq!(RawCell::from(&Data::Int(1500)).amount(), dec("1500"));
        assert_eq!(RawCell::from(&Data::Empty), RawCell::Empty);
    }
}
