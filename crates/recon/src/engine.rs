use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{ReconConfig, ToleranceConfig};
use crate::matcher::Matcher;
use crate::model::{
    BankTransaction, DocumentKind, DocumentOutcome, DocumentStatus, ExtractedData, LedgerEntry,
    MatchedPair, ReconInput, ReconciliationSession, ReconciliationSummary, SessionMeta,
};
use crate::summary::compute_summary;

/// Matched state and summary for two flat record sequences.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub bank_transactions: Vec<BankTransaction>,
    pub ledger_entries: Vec<LedgerEntry>,
    pub matched_pairs: Vec<MatchedPair>,
    pub summary: ReconciliationSummary,
}

/// Run reconciliation over a fully resolved batch.
///
/// Records of successful documents are flattened in document order, then
/// record order. Failed documents contribute no records and are kept as
/// outcomes. Never fails: configuration is validated before this point.
#[instrument(skip_all, fields(name = %config.name, documents = input.documents.len()))]
pub fn run(config: &ReconConfig, input: ReconInput) -> ReconciliationSession {
    let mut documents = Vec::with_capacity(input.documents.len());
    let mut bank = Vec::new();
    let mut ledger = Vec::new();

    for doc in input.documents {
        let outcome = match doc.result {
            Ok(data) => flatten(&doc.id, &doc.file_name, doc.kind, data, &mut bank, &mut ledger),
            Err(e) => {
                warn!(document = %doc.id, error = %e, "document failed, contributes no records");
                DocumentOutcome {
                    id: doc.id,
                    file_name: doc.file_name,
                    kind: doc.kind,
                    status: DocumentStatus::Error,
                    error_message: Some(e.to_string()),
                    parse_errors: Vec::new(),
                    bank_transaction_count: 0,
                    ledger_entry_count: 0,
                }
            }
        };
        documents.push(outcome);
    }

    let result = reconcile(&config.tolerance, bank, ledger);
    info!(
        pairs = result.summary.matched_pairs_count,
        discrepancies = result.summary.discrepancies_count,
        unmatched_bank = result.summary.unmatched_bank_items_count,
        unmatched_ledger = result.summary.unmatched_ledger_items_count,
        "reconciliation complete"
    );

    ReconciliationSession {
        meta: SessionMeta {
            session_id: Uuid::new_v4().to_string(),
            name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            tolerance: config.tolerance.clone(),
        },
        documents,
        bank_transactions: result.bank_transactions,
        ledger_entries: result.ledger_entries,
        matched_pairs: result.matched_pairs,
        summary: result.summary,
    }
}

/// Match two flat sequences and summarize the partition.
///
/// Incoming `is_matched` flags are ignored; the returned records carry the
/// final matched state.
pub fn reconcile(
    tolerance: &ToleranceConfig,
    mut bank: Vec<BankTransaction>,
    mut ledger: Vec<LedgerEntry>,
) -> Reconciliation {
    bank.iter_mut().for_each(|t| t.is_matched = false);
    ledger.iter_mut().for_each(|e| e.is_matched = false);

    let output = Matcher::new(tolerance.clone()).run(&bank, &ledger);

    for p in &output.matched {
        bank[p.bank].is_matched = true;
        ledger[p.ledger].is_matched = true;
    }

    let matched_pairs: Vec<MatchedPair> = output
        .matched
        .into_iter()
        .map(|p| {
            let status = p.status();
            let bank_transaction = bank[p.bank].clone();
            let ledger_entry = ledger[p.ledger].clone();
            MatchedPair {
                id: format!("match-{}-{}", bank_transaction.id, ledger_entry.id),
                bank_transaction,
                ledger_entry,
                confidence: p.confidence,
                discrepancy: p.discrepancy,
                status,
                notes: None,
            }
        })
        .collect();

    let summary = compute_summary(&bank, &ledger, &matched_pairs);

    Reconciliation {
        bank_transactions: bank,
        ledger_entries: ledger,
        matched_pairs,
        summary,
    }
}

/// Tag records with their document and append the side the document feeds.
fn flatten(
    doc_id: &str,
    file_name: &str,
    kind: DocumentKind,
    data: ExtractedData,
    bank: &mut Vec<BankTransaction>,
    ledger: &mut Vec<LedgerEntry>,
) -> DocumentOutcome {
    let (bank_count, ledger_count) = match kind {
        DocumentKind::BankStatement => {
            if !data.ledger_entries.is_empty() {
                warn!(
                    document = doc_id,
                    ignored = data.ledger_entries.len(),
                    "ledger entries in a bank statement are ignored"
                );
            }
            let count = data.bank_transactions.len();
            bank.extend(data.bank_transactions.into_iter().enumerate().map(|(n, mut t)| {
                t.id = scoped_id(doc_id, &t.id, n);
                t.source_document_id = doc_id.to_string();
                t
            }));
            (count, 0)
        }
        DocumentKind::InternalLedger => {
            if !data.bank_transactions.is_empty() {
                warn!(
                    document = doc_id,
                    ignored = data.bank_transactions.len(),
                    "bank transactions in a ledger document are ignored"
                );
            }
            let count = data.ledger_entries.len();
            ledger.extend(data.ledger_entries.into_iter().enumerate().map(|(n, mut e)| {
                e.id = scoped_id(doc_id, &e.id, n);
                e.source_document_id = doc_id.to_string();
                e
            }));
            (0, count)
        }
    };

    for err in &data.parse_errors {
        warn!(document = doc_id, "{err}");
    }

    DocumentOutcome {
        id: doc_id.to_string(),
        file_name: file_name.to_string(),
        kind,
        status: DocumentStatus::Success,
        error_message: None,
        parse_errors: data.parse_errors,
        bank_transaction_count: bank_count,
        ledger_entry_count: ledger_count,
    }
}

/// Record ids are unique per batch once prefixed with the document id.
fn scoped_id(doc_id: &str, id: &str, n: usize) -> String {
    if id.trim().is_empty() {
        format!("{doc_id}:{}", n + 1)
    } else {
        format!("{doc_id}:{id}")
    }
}
