//! Entry group construction and posting request conversion

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::utils::validation::{validate_client_id, validate_description};

/// Builder for creating entry groups
pub struct EntryGroupBuilder {
    group: LedgerEntryGroup,
}

impl EntryGroupBuilder {
    /// Create a new entry group builder
    pub fn new(
        client_id: impl Into<String>,
        date: NaiveDate,
        source_doc_number: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            group: LedgerEntryGroup::new(client_id, date, source_doc_number, description),
        }
    }

    /// Link the captured source document
    pub fn source_doc_id(mut self, source_doc_id: impl Into<String>) -> Self {
        self.group.source_doc_id = Some(source_doc_id.into());
        self
    }

    /// Set the vendor or customer tax id
    pub fn counterparty_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.group.counterparty_tax_id = Some(tax_id.into());
        self
    }

    /// Record who prepared the entry
    pub fn created_by(mut self, user_id: impl Into<String>) -> Self {
        self.group.created_by = Some(user_id.into());
        self
    }

    /// Add a debit line
    pub fn debit(
        mut self,
        account_code: impl Into<String>,
        account_name: impl Into<String>,
        amount: BigDecimal,
    ) -> Self {
        self.group
            .add_line(LedgerLine::debit(account_code, account_name, amount));
        self
    }

    /// Add a credit line
    pub fn credit(
        mut self,
        account_code: impl Into<String>,
        account_name: impl Into<String>,
        amount: BigDecimal,
    ) -> Self {
        self.group
            .add_line(LedgerLine::credit(account_code, account_name, amount));
        self
    }

    /// Add a custom line
    pub fn line(mut self, line: LedgerLine) -> Self {
        self.group.add_line(line);
        self
    }

    /// Build the group
    ///
    /// Only structural problems fail here; balance, period and account checks
    /// are left to the validator.
    pub fn build(self) -> LedgerResult<LedgerEntryGroup> {
        validate_client_id(&self.group.client_id)?;
        validate_description(&self.group.description)?;
        if self.group.lines.is_empty() {
            return Err(LedgerError::Validation(
                "Entry group must have at least one line".to_string(),
            ));
        }
        Ok(self.group)
    }
}

/// One journal line as produced by document extraction
///
/// Exactly one of `debit` and `credit` is expected to be non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingLine {
    pub account_code: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub debit: BigDecimal,
    #[serde(default)]
    pub credit: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_center: Option<String>,
    #[serde(default)]
    pub auto_mapped: bool,
}

impl PostingLine {
    fn to_line(&self, index: usize) -> Result<LedgerLine, ValidationIssue> {
        let zero = BigDecimal::from(0);
        let (side, amount) = match (self.debit != zero, self.credit != zero) {
            (true, true) => {
                return Err(ValidationIssue::at_line(
                    IssueCode::AmbiguousSide,
                    index,
                    format!(
                        "Line {}: account {} has both a debit and a credit amount",
                        index + 1,
                        self.account_code
                    ),
                ))
            }
            (false, true) => (Side::Credit, self.credit.clone()),
            _ => (Side::Debit, self.debit.clone()),
        };

        Ok(LedgerLine {
            account_code: self.account_code.trim().to_string(),
            side,
            account_name: self.account_name.clone(),
            cost_center: self.cost_center.clone(),
            amount,
            auto_mapped: self.auto_mapped,
        })
    }
}

/// Journal proposal for one source document, awaiting human approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingRequest {
    pub client_id: String,
    pub entries: Vec<PostingLine>,
    pub user_id: String,
    pub period_month: PeriodMonth,
    pub source_doc_id: String,
    /// Document date; the first day of `period_month` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Printed document number; `source_doc_id` stands in when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_doc_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PostingRequest {
    /// Convert the request into an entry group ready for validation
    ///
    /// Returns every conversion problem at once: a line carrying both sides,
    /// or a date outside the stated period.
    pub fn into_group(self) -> Result<LedgerEntryGroup, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let date = self.date.unwrap_or_else(|| self.period_month.first_day());
        if !self.period_month.contains(date) {
            issues.push(ValidationIssue::new(
                IssueCode::PeriodMismatch,
                format!(
                    "Document date {} is outside period {}",
                    date, self.period_month
                ),
            ));
        }

        let mut lines = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            match entry.to_line(index) {
                Ok(line) => lines.push(line),
                Err(issue) => issues.push(issue),
            }
        }
        if !issues.is_empty() {
            return Err(issues);
        }

        let source_doc_number = self
            .source_doc_number
            .unwrap_or_else(|| self.source_doc_id.clone());
        let description = self
            .description
            .unwrap_or_else(|| format!("Posting for document {}", self.source_doc_id));

        let mut group = LedgerEntryGroup::new(self.client_id, date, source_doc_number, description);
        group.source_doc_id = Some(self.source_doc_id);
        group.counterparty_tax_id = self.counterparty_tax_id;
        group.created_by = Some(self.user_id);
        group.lines = lines;
        Ok(group)
    }
}

/// Common entry patterns
pub mod patterns {
    use super::*;

    /// Standard Thai VAT rate
    pub fn vat_rate() -> BigDecimal {
        BigDecimal::new(7.into(), 2)
    }

    /// Parameters for a purchase carrying input VAT
    pub struct PurchaseWithVatParams {
        pub client_id: String,
        pub date: NaiveDate,
        pub document_number: String,
        pub vendor_tax_id: String,
        pub description: String,
        pub expense_account: (String, String),
        pub input_vat_account: (String, String),
        pub payable_account: (String, String),
        pub net_amount: BigDecimal,
    }

    /// Create a simple expense payment (debit expense, credit cash or bank)
    pub fn expense_payment(
        client_id: &str,
        date: NaiveDate,
        document_number: &str,
        description: &str,
        expense_account: (&str, &str),
        cash_account: (&str, &str),
        amount: BigDecimal,
    ) -> LedgerResult<LedgerEntryGroup> {
        EntryGroupBuilder::new(client_id, date, document_number, description)
            .debit(expense_account.0, expense_account.1, amount.clone())
            .credit(cash_account.0, cash_account.1, amount)
            .build()
    }

    /// Create a purchase with 7% input VAT (debit expense and input VAT, credit payable)
    pub fn purchase_with_vat(params: PurchaseWithVatParams) -> LedgerResult<LedgerEntryGroup> {
        let vat = (&params.net_amount * vat_rate()).round(2);
        let gross = &params.net_amount + &vat;
        let (expense_code, expense_name) = params.expense_account;
        let (vat_code, vat_name) = params.input_vat_account;
        let (payable_code, payable_name) = params.payable_account;

        EntryGroupBuilder::new(
            params.client_id,
            params.date,
            params.document_number,
            params.description,
        )
        .counterparty_tax_id(params.vendor_tax_id)
        .debit(expense_code, expense_name, params.net_amount)
        .debit(vat_code, vat_name, vat)
        .credit(payable_code, payable_name, gross)
        .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_builder() {
        let group = EntryGroupBuilder::new("client-1", ymd(2024, 6, 5), "RV-001", "Cash sale")
            .created_by("user-7")
            .debit("1000", "Cash", BigDecimal::from(500))
            .credit("4000", "Sales", BigDecimal::from(500))
            .build()
            .unwrap();

        assert_eq!(group.lines.len(), 2);
        assert_eq!(group.period_month.to_string(), "2024-06");
        assert_eq!(group.created_by.as_deref(), Some("user-7"));
    }

    #[test]
    fn test_builder_rejects_structural_problems() {
        let no_lines = EntryGroupBuilder::new("client-1", ymd(2024, 6, 5), "X", "Nothing").build();
        assert!(matches!(no_lines, Err(LedgerError::Validation(_))));

        let bad_client = EntryGroupBuilder::new("client 1", ymd(2024, 6, 5), "X", "Bad")
            .debit("1000", "Cash", BigDecimal::from(1))
            .build();
        assert!(bad_client.is_err());

        // Unbalanced groups still build; the validator reports them
        let unbalanced = EntryGroupBuilder::new("client-1", ymd(2024, 6, 5), "X", "Half")
            .debit("1000", "Cash", BigDecimal::from(1))
            .build();
        assert!(unbalanced.is_ok());
    }

    #[test]
    fn test_posting_request_from_json() {
        let json = r#"{
            "clientId": "client-1",
            "userId": "accountant-3",
            "periodMonth": "2024-07",
            "sourceDocId": "doc-42",
            "date": "2024-07-15",
            "sourceDocNumber": "IV2407-0015",
            "counterpartyTaxId": "0105556012345",
            "entries": [
                {"accountCode": "5100", "accountName": "Office supplies", "debit": "1000.00", "credit": 0},
                {"accountCode": "1170", "accountName": "Input VAT", "debit": "70.00"},
                {"accountCode": "2100", "accountName": "Accounts payable", "credit": 1070, "autoMapped": true}
            ]
        }"#;
        let request: PostingRequest = serde_json::from_str(json).unwrap();
        let group = request.into_group().unwrap();

        assert_eq!(group.source_doc_number, "IV2407-0015");
        assert_eq!(group.source_doc_id.as_deref(), Some("doc-42"));
        assert_eq!(group.created_by.as_deref(), Some("accountant-3"));
        assert_eq!(group.lines[0].side, Side::Debit);
        assert_eq!(group.lines[2].side, Side::Credit);
        assert!(group.lines[2].auto_mapped);
        assert_eq!(group.difference(), BigDecimal::from(0));
    }

    #[test]
    fn test_posting_request_defaults() {
        let json = r#"{
            "clientId": "client-1",
            "userId": "u",
            "periodMonth": "2024-02",
            "sourceDocId": "doc-1",
            "entries": [{"accountCode": "1000", "accountName": "Cash", "debit": 5}]
        }"#;
        let request: PostingRequest = serde_json::from_str(json).unwrap();
        let group = request.into_group().unwrap();
        assert_eq!(group.date, ymd(2024, 2, 1));
        assert_eq!(group.source_doc_number, "doc-1");
        assert!(group.description.contains("doc-1"));
    }

    #[test]
    fn test_posting_request_conversion_issues() {
        let request = PostingRequest {
            client_id: "client-1".to_string(),
            entries: vec![PostingLine {
                account_code: "1000".to_string(),
                account_name: "Cash".to_string(),
                debit: BigDecimal::from(5),
                credit: BigDecimal::from(5),
                cost_center: None,
                auto_mapped: false,
            }],
            user_id: "u".to_string(),
            period_month: "2024-02".parse().unwrap(),
            source_doc_id: "doc-1".to_string(),
            date: Some(ymd(2024, 3, 1)),
            source_doc_number: None,
            counterparty_tax_id: None,
            description: None,
        };
        let issues = request.into_group().unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|i| i.code == IssueCode::PeriodMismatch));
        assert!(issues
            .iter()
            .any(|i| i.code == IssueCode::AmbiguousSide && i.line == Some(0)));
    }

    #[test]
    fn test_purchase_with_vat_pattern() {
        let group = patterns::purchase_with_vat(patterns::PurchaseWithVatParams {
            client_id: "client-1".to_string(),
            date: ymd(2024, 8, 20),
            document_number: "INV-88".to_string(),
            vendor_tax_id: "0105556012345".to_string(),
            description: "Printer paper".to_string(),
            expense_account: ("5100".to_string(), "Office supplies".to_string()),
            input_vat_account: ("1170".to_string(), "Input VAT".to_string()),
            payable_account: ("2100".to_string(), "Accounts payable".to_string()),
            net_amount: BigDecimal::from_str("1234.56").unwrap(),
        })
        .unwrap();

        assert_eq!(group.lines[1].amount, BigDecimal::from_str("86.42").unwrap());
        assert_eq!(group.total_credits(), BigDecimal::from_str("1320.98").unwrap());
        assert_eq!(group.difference(), BigDecimal::from(0));
        assert_eq!(group.counterparty_tax_id.as_deref(), Some("0105556012345"));
    }

    #[test]
    fn test_expense_payment_pattern() {
        let group = patterns::expense_payment(
            "client-1",
            ymd(2024, 8, 1),
            "PV-1",
            "Rent",
            ("5200", "Rent"),
            ("1020", "Bank"),
            BigDecimal::from(15000),
        )
        .unwrap();
        assert!(group.is_balanced(&BigDecimal::from(0)));
    }
}
