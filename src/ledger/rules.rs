//! Account mapping rules
//!
//! Rules are an ordered list of `{predicate, mapping}` pairs and the first
//! rule whose predicate holds wins.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Condition a bank transaction must satisfy for a rule to apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RulePredicate {
    /// Case-insensitive substring of the description
    DescriptionContains(String),
    /// Money came in
    Inflow,
    /// Money went out
    Outflow,
    /// Absolute amount at least this much
    AmountAtLeast(BigDecimal),
    /// Absolute amount at most this much
    AmountAtMost(BigDecimal),
    /// Every nested predicate holds
    All(Vec<RulePredicate>),
    /// At least one nested predicate holds
    Any(Vec<RulePredicate>),
}

impl RulePredicate {
    pub fn matches(&self, txn: &BankTransaction) -> bool {
        match self {
            RulePredicate::DescriptionContains(needle) => txn
                .description
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            RulePredicate::Inflow => txn.is_inflow(),
            RulePredicate::Outflow => txn.is_outflow(),
            RulePredicate::AmountAtLeast(min) => txn.amount.abs() >= *min,
            RulePredicate::AmountAtMost(max) => txn.amount.abs() <= *max,
            RulePredicate::All(predicates) => predicates.iter().all(|p| p.matches(txn)),
            RulePredicate::Any(predicates) => predicates.iter().any(|p| p.matches(txn)),
        }
    }
}

/// Ledger account a rule maps to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMapping {
    pub account_code: String,
    pub account_name: String,
    #[serde(default)]
    pub cost_center: Option<String>,
}

impl AccountMapping {
    pub fn new(account_code: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            account_code: account_code.into(),
            account_name: account_name.into(),
            cost_center: None,
        }
    }

    fn line(&self, side: Side, amount: BigDecimal) -> LedgerLine {
        LedgerLine {
            account_code: self.account_code.clone(),
            side,
            account_name: self.account_name.clone(),
            cost_center: self.cost_center.clone(),
            amount,
            auto_mapped: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    pub name: String,
    pub predicate: RulePredicate,
    pub mapping: AccountMapping,
}

impl MappingRule {
    pub fn new(name: impl Into<String>, predicate: RulePredicate, mapping: AccountMapping) -> Self {
        Self {
            name: name.into(),
            predicate,
            mapping,
        }
    }
}

/// Ordered, first-match-wins rule list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<MappingRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<MappingRule>) -> Self {
        Self { rules }
    }

    /// Append a rule; it is evaluated after every existing one
    pub fn push(&mut self, rule: MappingRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The first rule whose predicate holds for the transaction
    pub fn first_match(&self, txn: &BankTransaction) -> Option<&MappingRule> {
        self.rules.iter().find(|rule| rule.predicate.matches(txn))
    }

    /// Propose a balanced entry group for a bank transaction
    ///
    /// An outflow debits the mapped account and credits the bank account; an
    /// inflow does the reverse. The mapped line is flagged `auto_mapped`.
    /// Returns `None` when no rule matches or the amount is zero.
    pub fn propose_entry(
        &self,
        txn: &BankTransaction,
        bank_account: &AccountMapping,
    ) -> Option<LedgerEntryGroup> {
        if txn.amount == BigDecimal::from(0) {
            return None;
        }
        let rule = self.first_match(txn)?;
        let amount = txn.amount.abs();
        let mapped_side = if txn.is_outflow() {
            Side::Debit
        } else {
            Side::Credit
        };

        let mut group =
            LedgerEntryGroup::new(txn.client_id.clone(), txn.date, txn.id.clone(), txn.description.clone());
        group.add_line(rule.mapping.line(mapped_side, amount.clone()).auto_mapped());
        group.add_line(bank_account.line(mapped_side.opposite(), amount));
        Some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(description: &str, amount: i64) -> BankTransaction {
        BankTransaction {
            id: "c1-1-3".to_string(),
            client_id: "c1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            description: description.to_string(),
            amount: BigDecimal::from(amount),
            balance: None,
            matched_document_id: None,
            status: TransactionStatus::Unmatched,
        }
    }

    fn rules() -> RuleSet {
        RuleSet::new(vec![
            MappingRule::new(
                "electricity",
                RulePredicate::All(vec![
                    RulePredicate::Outflow,
                    RulePredicate::DescriptionContains("MEA".to_string()),
                ]),
                AccountMapping::new("5310", "Electricity"),
            ),
            MappingRule::new(
                "any transfer out",
                RulePredicate::All(vec![
                    RulePredicate::Outflow,
                    RulePredicate::DescriptionContains("transfer".to_string()),
                ]),
                AccountMapping::new("2100", "Accounts payable"),
            ),
            MappingRule::new(
                "customer receipts",
                RulePredicate::Inflow,
                AccountMapping::new("1130", "Accounts receivable"),
            ),
        ])
    }

    #[test]
    fn test_first_match_wins() {
        let rules = rules();
        let rule = rules.first_match(&txn("Transfer to MEA bill", -900)).unwrap();
        assert_eq!(rule.name, "electricity");

        let rule = rules.first_match(&txn("TRANSFER to supplier", -900)).unwrap();
        assert_eq!(rule.name, "any transfer out");

        assert!(rules.first_match(&txn("ATM withdrawal", -500)).is_none());
    }

    #[test]
    fn test_propose_outflow_entry() {
        let bank = AccountMapping::new("1020", "Bank - SCB current");
        let group = rules().propose_entry(&txn("MEA electricity", -1070), &bank).unwrap();

        assert_eq!(group.lines.len(), 2);
        assert_eq!(group.lines[0].side, Side::Debit);
        assert_eq!(group.lines[0].account_code, "5310");
        assert!(group.lines[0].auto_mapped);
        assert_eq!(group.lines[1].side, Side::Credit);
        assert_eq!(group.lines[1].account_code, "1020");
        assert!(!group.lines[1].auto_mapped);
        assert_eq!(group.difference(), BigDecimal::from(0));
        assert_eq!(group.source_doc_number, "c1-1-3");
    }

    #[test]
    fn test_propose_inflow_entry() {
        let bank = AccountMapping::new("1020", "Bank");
        let group = rules().propose_entry(&txn("Deposit", 5000), &bank).unwrap();
        assert_eq!(group.lines[0].side, Side::Credit);
        assert_eq!(group.lines[0].account_code, "1130");
        assert_eq!(group.lines[1].side, Side::Debit);
        assert_eq!(group.total_debits(), BigDecimal::from(5000));
    }

    #[test]
    fn test_rules_from_json() {
        let json = r#"[
            {"name": "big", "predicate": {"type": "amount_at_least", "value": "10000"},
             "mapping": {"account_code": "1500", "account_name": "Equipment"}},
            {"name": "fees", "predicate": {"type": "description_contains", "value": "fee"},
             "mapping": {"account_code": "5900", "account_name": "Bank charges", "cost_center": "HQ"}}
        ]"#;
        let rules: Vec<MappingRule> = serde_json::from_str(json).unwrap();
        let set = RuleSet::new(rules);
        assert_eq!(set.len(), 2);
        assert_eq!(set.first_match(&txn("Annual FEE", -200)).unwrap().name, "fees");
        assert_eq!(set.first_match(&txn("Laptop", -25000)).unwrap().name, "big");
    }
}
