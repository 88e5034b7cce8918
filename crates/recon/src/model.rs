use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ToleranceConfig;
use crate::error::ExtractError;

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Which side of the reconciliation a source document feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    BankStatement,
    InternalLedger,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BankStatement => write!(f, "bank_statement"),
            Self::InternalLedger => write!(f, "internal_ledger"),
        }
    }
}

/// Records extracted from one document, before matching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedData {
    pub bank_transactions: Vec<BankTransaction>,
    pub ledger_entries: Vec<LedgerEntry>,
    pub parse_errors: Vec<String>,
}

/// A document whose extraction has resolved, successfully or not.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub id: String,
    pub file_name: String,
    pub kind: DocumentKind,
    pub result: Result<ExtractedData, ExtractError>,
}

/// The complete batch handed to the engine. Order is significant: it fixes
/// the input order both matcher passes walk.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub documents: Vec<ExtractedDocument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Success,
    Error,
}

/// Per-document outcome kept in the session for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutcome {
    pub id: String,
    pub file_name: String,
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub parse_errors: Vec<String>,
    pub bank_transaction_count: usize,
    pub ledger_entry_count: usize,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Credit,
    Debit,
    #[default]
    Unknown,
}

impl TransactionKind {
    /// Debits are negative on a bank statement, credits positive.
    pub fn from_amount(amount: Option<Decimal>) -> Self {
        match amount {
            Some(a) if a.is_sign_negative() && !a.is_zero() => Self::Debit,
            Some(_) => Self::Credit,
            None => Self::Unknown,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "credit" => Some(Self::Credit),
            "debit" => Some(Self::Debit),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// One signed monetary movement from a bank statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransaction {
    pub id: String,
    /// Day/month/year text as extracted. Unparseable text is a valid state.
    pub date: Option<String>,
    pub description: String,
    pub amount: Option<Decimal>,
    #[serde(rename = "type", default)]
    pub kind: TransactionKind,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub balance_after: Option<Decimal>,
    #[serde(default)]
    pub source_document_id: String,
    #[serde(default)]
    pub is_matched: bool,
}

/// One entry from the organization's internal records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub date: Option<String>,
    pub description: String,
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub account_code: Option<String>,
    #[serde(default)]
    pub cost_center: Option<String>,
    #[serde(default)]
    pub source_document_id: String,
    #[serde(default)]
    pub is_matched: bool,
}

// ---------------------------------------------------------------------------
// Pairs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    High,
    Medium,
    Low,
    Manual,
}

impl std::fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Review status of a pair. The engine only produces `MatchedExact` and
/// `MatchedWithDiscrepancy`; the rest belong to downstream review tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    #[serde(rename = "matched_exact")]
    MatchedExact,
    #[serde(rename = "matched_discrepancy")]
    MatchedWithDiscrepancy,
    #[serde(rename = "matched_manual")]
    MatchedManual,
    #[serde(rename = "pending_review")]
    PendingReview,
    #[serde(rename = "investigate")]
    Investigate,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatchedExact => write!(f, "matched_exact"),
            Self::MatchedWithDiscrepancy => write!(f, "matched_discrepancy"),
            Self::MatchedManual => write!(f, "matched_manual"),
            Self::PendingReview => write!(f, "pending_review"),
            Self::Investigate => write!(f, "investigate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountDiscrepancy {
    pub bank: Decimal,
    pub ledger: Decimal,
    /// bank − ledger
    pub difference: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateDiscrepancy {
    pub bank: String,
    pub ledger: String,
    pub difference_days_abs: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDiscrepancy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<AmountDiscrepancy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateDiscrepancy>,
    pub reference: bool,
    /// Reserved; never set by the engine.
    pub description: bool,
}

impl MatchDiscrepancy {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.date.is_none() && !self.reference && !self.description
    }
}

/// One bank transaction bound to one ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPair {
    pub id: String,
    pub bank_transaction: BankTransaction,
    pub ledger_entry: LedgerEntry,
    #[serde(rename = "matchConfidence")]
    pub confidence: MatchConfidence,
    pub discrepancy: Option<MatchDiscrepancy>,
    pub status: MatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    pub total_bank_transactions: usize,
    pub total_ledger_entries: usize,

    pub total_bank_amount: Decimal,
    pub total_ledger_amount: Decimal,

    pub matched_pairs_count: usize,
    /// Bank side of exact pairs only.
    pub total_amount_matched: Decimal,

    pub discrepancies_count: usize,
    pub total_amount_bank_in_discrepancies: Decimal,
    pub total_amount_ledger_in_discrepancies: Decimal,
    pub net_difference_in_discrepancies: Decimal,

    pub unmatched_bank_items_count: usize,
    pub total_unmatched_bank_value: Decimal,

    pub unmatched_ledger_items_count: usize,
    pub total_unmatched_ledger_value: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    pub session_id: String,
    pub name: String,
    pub engine_version: String,
    pub generated_at: String,
    pub tolerance: ToleranceConfig,
}

/// The sole handoff artifact of a run. Never mutated after it is built; a
/// re-run produces a new session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSession {
    pub meta: SessionMeta,
    pub documents: Vec<DocumentOutcome>,
    pub bank_transactions: Vec<BankTransaction>,
    pub ledger_entries: Vec<LedgerEntry>,
    pub matched_pairs: Vec<MatchedPair>,
    pub summary: ReconciliationSummary,
}

impl ReconciliationSession {
    pub fn unmatched_bank(&self) -> impl Iterator<Item = &BankTransaction> {
        self.bank_transactions.iter().filter(|t| !t.is_matched)
    }

    pub fn unmatched_ledger(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.ledger_entries.iter().filter(|e| !e.is_matched)
    }

    pub fn exact_matches(&self) -> impl Iterator<Item = &MatchedPair> {
        self.matched_pairs
            .iter()
            .filter(|p| p.status == MatchStatus::MatchedExact)
    }

    pub fn discrepancies(&self) -> impl Iterator<Item = &MatchedPair> {
        self.matched_pairs
            .iter()
            .filter(|p| p.status == MatchStatus::MatchedWithDiscrepancy)
    }

    pub fn failed_documents(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.documents
            .iter()
            .filter(|d| d.status == DocumentStatus::Error)
    }
}
