//! Import a bank statement, propose entries from mapping rules and post them

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use thai_accounting_core::{
    AccountMapping, EntryGroupBuilder, Ledger, MemoryStorage, PeriodMonth, PipelineConfig,
    StatementFile, StatementParser,
};
use tracing_subscriber::{fmt, EnvFilter};

const CONFIG: &str = r#"{
    "posting": {"balance_tolerance": "0.05", "fuzzy_window_days": 7},
    "rules": [
        {"name": "electricity", "predicate": {"type": "description_contains", "value": "MEA"},
         "mapping": {"account_code": "5310", "account_name": "ค่าไฟฟ้า"}},
        {"name": "bank fees", "predicate": {"type": "description_contains", "value": "fee"},
         "mapping": {"account_code": "5910", "account_name": "ค่าธรรมเนียมธนาคาร"}},
        {"name": "receipts", "predicate": {"type": "inflow"},
         "mapping": {"account_code": "1130", "account_name": "ลูกหนี้การค้า"}}
    ]
}"#;

const STATEMENT: &str = "SCB Business Net statement\n\
วันที่,เวลา,รายการ,ถอน,ฝาก,คงเหลือ\n\
01/12/2567,09:12,Customer transfer,,\"53,500.00\",\"153,500.00\"\n\
05/12/2567,14:40,MEA electricity,\"2,140.00\",,\"151,360.00\"\n\
05/12/2567,14:41,Transfer fee,25.00,,\"151,335.00\"\n\
31/12/2567,23:59,Interest,,(0.00),\"151,335.00\"\n";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env().add_directive("thai_accounting_core=info".parse()?);
    fmt().with_env_filter(filter).init();

    let config = PipelineConfig::from_json_str(CONFIG)?;
    let parser = StatementParser::new(config.format_registry());
    let rules = config.rule_set();
    let ledger = Ledger::with_config(MemoryStorage::new(), config.posting.clone());

    // 1. Import the statement; the layout is detected from the banner line
    let file = StatementFile::new("december.csv", STATEMENT.as_bytes().to_vec());
    let parsed = ledger
        .import_statement(&parser, &file, "client-001", None)
        .await?;
    println!(
        "Imported {} transactions using {} ({})",
        parsed.transactions.len(),
        parsed.format.name,
        parsed.format.name_th
    );
    for error in &parsed.errors {
        println!("  ! {error}");
    }

    // 2. Propose and post entries for the unmatched transactions
    let bank = AccountMapping::new("1020", "เงินฝากธนาคาร - SCB");
    let proposals = ledger.propose_entries("client-001", &rules, &bank).await?;
    let result = ledger.post_batch(proposals).await;
    println!(
        "Posted {} proposed entries, {} rejected",
        result.posted_count,
        result.rejected.len()
    );

    // 3. A manual voucher that does not balance comes back for correction
    let voucher = EntryGroupBuilder::new(
        "client-001",
        NaiveDate::from_ymd_opt(2024, 12, 20).unwrap_or_default(),
        "JV-6712-001",
        "Accrued audit fee",
    )
    .created_by("accountant-1")
    .debit("5420", "ค่าสอบบัญชี", BigDecimal::from(20000))
    .credit("2190", "ค่าใช้จ่ายค้างจ่าย", BigDecimal::from(2000))
    .build()?;
    let result = ledger.post_batch(vec![voucher]).await;
    for item in &result.rejected {
        for reason in &item.reasons {
            println!("  ✗ {}: {}", item.id, reason.message);
        }
    }

    // 4. Close December; later postings into it are refused
    let december = PeriodMonth::new(2024, 12)?;
    let period = ledger.lock_period("client-001", december, "manager").await?;
    println!("Locked {} at {:?}", period.month, period.locked_at);

    let entries = ledger.entries("client-001", december).await?;
    println!("December carries {} entry groups", entries.len());
    println!("\n{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
