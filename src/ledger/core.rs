//! Main ledger orchestrator: validation, duplicate screening and batch posting

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::PostingConfig;
use crate::ledger::duplicate::{check_duplicate, DocumentRecord, DuplicateFingerprint, MatchType};
use crate::ledger::locks::PeriodLocks;
use crate::ledger::rules::{AccountMapping, RuleSet};
use crate::ledger::transaction::PostingRequest;
use crate::ledger::validator::StandardEntryValidator;
use crate::statement::{ParsedStatement, StatementFile, StatementParser};
use crate::traits::*;
use crate::types::*;

/// A batch item that was not posted, returned unchanged for correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedItem {
    /// Group id, or the source document id when the request never became a group
    pub id: String,
    pub reasons: Vec<ValidationIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<LedgerEntryGroup>,
}

/// Warnings attached to a posted item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemWarnings {
    pub id: String,
    pub warnings: Vec<ValidationIssue>,
}

/// Per-item outcome of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub posted_count: usize,
    pub posted_ids: Vec<String>,
    pub rejected: Vec<RejectedItem>,
    pub warnings: Vec<ItemWarnings>,
}

impl BatchResult {
    /// Whether every item was posted
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn total(&self) -> usize {
        self.posted_count + self.rejected.len()
    }

    fn record(&mut self, outcome: PostOutcome) {
        match outcome {
            PostOutcome::Posted { id, warnings } => {
                if !warnings.is_empty() {
                    self.warnings.push(ItemWarnings {
                        id: id.clone(),
                        warnings,
                    });
                }
                self.posted_count += 1;
                self.posted_ids.push(id);
            }
            PostOutcome::Rejected(item) => self.rejected.push(item),
        }
    }
}

/// Outcome of posting a single group
#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    Posted {
        id: String,
        warnings: Vec<ValidationIssue>,
    },
    Rejected(RejectedItem),
}

impl PostOutcome {
    pub fn is_posted(&self) -> bool {
        matches!(self, PostOutcome::Posted { .. })
    }

    fn rejected(group: LedgerEntryGroup, reasons: Vec<ValidationIssue>) -> Self {
        PostOutcome::Rejected(RejectedItem {
            id: group.id.clone(),
            reasons,
            group: Some(group),
        })
    }
}

/// Main ledger system that orchestrates posting
///
/// All methods take `&self`; share the ledger between tasks with an `Arc`.
pub struct Ledger<S: LedgerStorage> {
    storage: S,
    validator: Box<dyn EntryValidator>,
    config: PostingConfig,
    locks: PeriodLocks,
}

impl<S: LedgerStorage> Ledger<S> {
    /// Create a new ledger with default posting settings
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, PostingConfig::default())
    }

    /// Create a new ledger with the given posting settings
    pub fn with_config(storage: S, config: PostingConfig) -> Self {
        let validator = Box::new(StandardEntryValidator::from_config(&config));
        Self::with_validator(storage, config, validator)
    }

    /// Create a new ledger with a custom validator
    pub fn with_validator(
        storage: S,
        config: PostingConfig,
        validator: Box<dyn EntryValidator>,
    ) -> Self {
        Self {
            storage,
            validator,
            config,
            locks: PeriodLocks::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &PostingConfig {
        &self.config
    }

    // Period operations
    /// Current state of a period; untouched periods are open
    pub async fn period(&self, client_id: &str, month: PeriodMonth) -> LedgerResult<Period> {
        Ok(self
            .storage
            .get_period(client_id, month)
            .await?
            .unwrap_or_else(|| Period::open(client_id, month)))
    }

    /// Close a period to further posting
    ///
    /// Serialized with commits to the same period, so once this returns no
    /// group dated inside the period can be appended. Locking a locked
    /// period returns the existing record unchanged.
    pub async fn lock_period(
        &self,
        client_id: &str,
        month: PeriodMonth,
        locked_by: &str,
    ) -> LedgerResult<Period> {
        let key = PeriodKey::new(client_id, month);
        let _guard = self.locks.acquire(&key).await;

        if let Some(period) = self.storage.get_period(client_id, month).await? {
            if period.locked {
                tracing::debug!(period = %key, "Period already locked");
                return Ok(period);
            }
        }

        let period = Period {
            client_id: client_id.to_string(),
            month,
            locked: true,
            locked_at: Some(Utc::now()),
            locked_by: Some(locked_by.to_string()),
        };
        self.storage.save_period(&period).await?;
        tracing::info!(period = %key, locked_by, "Period locked");
        Ok(period)
    }

    // Validation
    /// Validate a group against the current period state and posted history
    ///
    /// Does not take the period lock, so the answer can be stale by the time
    /// the group is posted; `post_group` re-validates under the lock.
    pub async fn validate_group(&self, group: &LedgerEntryGroup) -> LedgerResult<ValidationResult> {
        let mut group = group.clone();
        group.period_month = PeriodMonth::from_date(group.date);
        self.evaluate(&group).await
    }

    async fn evaluate(&self, group: &LedgerEntryGroup) -> LedgerResult<ValidationResult> {
        let period = self
            .storage
            .get_period(&group.client_id, group.period_month)
            .await?;
        let mut result = self.validator.validate(group, period.as_ref());

        if self.config.check_duplicates {
            self.screen_duplicates(group, &mut result).await?;
        }
        Ok(result)
    }

    async fn screen_duplicates(
        &self,
        group: &LedgerEntryGroup,
        result: &mut ValidationResult,
    ) -> LedgerResult<()> {
        let records: Vec<DocumentRecord> = self
            .storage
            .read_client(&group.client_id)
            .await?
            .iter()
            .filter(|existing| existing.id != group.id)
            .map(DocumentRecord::from_group)
            .collect();
        let fingerprint = DuplicateFingerprint::from_group(group);
        let check = check_duplicate(&records, &fingerprint, self.config.fuzzy_window_days);
        let matched = check
            .matches
            .iter()
            .map(|r| r.id.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        match check.match_type {
            MatchType::Exact => {
                let issue = ValidationIssue::new(
                    IssueCode::DuplicateDocument,
                    format!(
                        "Document {} from {} has already been posted ({})",
                        fingerprint.document_number, fingerprint.counterparty_tax_id, matched
                    ),
                );
                if self.config.block_exact_duplicates {
                    result.push_error(issue);
                } else {
                    result.push_warning(issue);
                }
            }
            MatchType::Fuzzy => {
                result.push_warning(ValidationIssue::new(
                    IssueCode::PossibleDuplicate,
                    format!(
                        "Possible duplicate of {}: same counterparty and amount within {} days",
                        matched, self.config.fuzzy_window_days
                    ),
                ));
            }
            MatchType::None => {}
        }
        Ok(())
    }

    // Posting operations
    /// Validate and post one group
    ///
    /// Validation and the append happen under the period lock. Any failure,
    /// including a storage error, yields a rejection carrying the group.
    pub async fn post_group(&self, mut group: LedgerEntryGroup) -> PostOutcome {
        group.period_month = PeriodMonth::from_date(group.date);
        let key = group.period_key();
        let _guard = self.locks.acquire(&key).await;

        let result = match self.evaluate(&group).await {
            Ok(result) => result,
            Err(e) => return self.storage_failure(group, e),
        };
        if !result.is_valid {
            tracing::warn!(
                group_id = %group.id,
                period = %key,
                errors = result.errors.len(),
                "Entry group rejected"
            );
            return PostOutcome::rejected(group, result.errors);
        }

        if let Err(e) = self.storage.append_group(&group).await {
            return self.storage_failure(group, e);
        }
        tracing::debug!(group_id = %group.id, period = %key, "Entry group posted");
        PostOutcome::Posted {
            id: group.id,
            warnings: result.warnings,
        }
    }

    fn storage_failure(&self, group: LedgerEntryGroup, error: LedgerError) -> PostOutcome {
        tracing::warn!(group_id = %group.id, error = %error, "Storage failure while posting");
        let reason = ValidationIssue::new(IssueCode::StorageError, error.to_string());
        PostOutcome::rejected(group, vec![reason])
    }

    /// Post a batch item by item; one failure never affects the others
    pub async fn post_batch(&self, groups: Vec<LedgerEntryGroup>) -> BatchResult {
        let mut batch = BatchResult::default();
        for group in groups {
            batch.record(self.post_group(group).await);
        }
        log_batch(&batch);
        batch
    }

    /// Convert and post approved posting requests
    ///
    /// A request that cannot be converted is rejected under its source
    /// document id without a group.
    pub async fn post_requests(&self, requests: Vec<PostingRequest>) -> BatchResult {
        let mut batch = BatchResult::default();
        for request in requests {
            let source_doc_id = request.source_doc_id.clone();
            let outcome = match request.into_group() {
                Ok(group) => self.post_group(group).await,
                Err(reasons) => {
                    tracing::warn!(
                        source_doc_id = %source_doc_id,
                        "Posting request could not be converted"
                    );
                    PostOutcome::Rejected(RejectedItem {
                        id: source_doc_id,
                        reasons,
                        group: None,
                    })
                }
            };
            batch.record(outcome);
        }
        log_batch(&batch);
        batch
    }

    /// Groups posted for a client in one period
    pub async fn entries(
        &self,
        client_id: &str,
        month: PeriodMonth,
    ) -> LedgerResult<Vec<LedgerEntryGroup>> {
        self.storage.read_all(client_id, month).await
    }

    // Statement operations
    /// Parse a statement and persist its transactions
    ///
    /// Row errors are returned in the parsed statement and do not stop the
    /// good rows from being stored.
    pub async fn import_statement(
        &self,
        parser: &StatementParser,
        file: &StatementFile,
        client_id: &str,
        bank_code: Option<&str>,
    ) -> LedgerResult<ParsedStatement> {
        let parsed = parser.parse_statement(file, client_id, bank_code);
        if !parsed.transactions.is_empty() {
            self.storage
                .append_bank_transactions(&parsed.transactions)
                .await?;
        }
        tracing::info!(
            client_id,
            file = %file.name,
            format = %parsed.format.code,
            stored = parsed.transactions.len(),
            errors = parsed.errors.len(),
            "Statement imported"
        );
        Ok(parsed)
    }

    /// Propose entry groups for a client's unmatched bank transactions
    ///
    /// Transactions no rule matches are left out; proposals are not posted.
    pub async fn propose_entries(
        &self,
        client_id: &str,
        rules: &RuleSet,
        bank_account: &AccountMapping,
    ) -> LedgerResult<Vec<LedgerEntryGroup>> {
        let proposals: Vec<LedgerEntryGroup> = self
            .storage
            .list_bank_transactions(client_id)
            .await?
            .iter()
            .filter(|txn| txn.status == TransactionStatus::Unmatched)
            .filter_map(|txn| rules.propose_entry(txn, bank_account))
            .collect();
        tracing::debug!(client_id, proposals = proposals.len(), "Proposed entries");
        Ok(proposals)
    }
}

fn log_batch(batch: &BatchResult) {
    tracing::info!(
        posted = batch.posted_count,
        rejected = batch.rejected.len(),
        with_warnings = batch.warnings.len(),
        "Batch processed"
    );
}
