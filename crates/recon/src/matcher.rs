use tracing::{debug, instrument};

use crate::compare::normalize_reference;
use crate::config::ToleranceConfig;
use crate::discrepancy::{build_discrepancy, status_for};
use crate::model::{BankTransaction, LedgerEntry, MatchConfidence, MatchDiscrepancy, MatchStatus};

/// A pair formed by the matcher, as positions into the two input slices.
#[derive(Debug, Clone, PartialEq)]
pub struct PairMatch {
    pub bank: usize,
    pub ledger: usize,
    pub confidence: MatchConfidence,
    pub discrepancy: Option<MatchDiscrepancy>,
}

impl PairMatch {
    pub fn status(&self) -> MatchStatus {
        status_for(self.discrepancy.as_ref())
    }
}

/// Partition of both inputs: every position is in exactly one pair or in
/// exactly one of the `*_only` lists.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutput {
    pub matched: Vec<PairMatch>,
    pub bank_only: Vec<usize>,
    pub ledger_only: Vec<usize>,
}

/// Greedy two-pass matcher.
///
/// Pass 1 pairs on strong reference equality, pass 2 on amount and date
/// alone. Both passes walk the inputs in order and take the first
/// qualifying ledger entry; there is no scoring between candidates.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    tolerance: ToleranceConfig,
}

impl Matcher {
    pub fn new(tolerance: ToleranceConfig) -> Self {
        Self { tolerance }
    }

    /// Pair `bank` against `ledger`. The inputs are only borrowed; match
    /// state lives in the returned output.
    #[instrument(name = "match_records", skip_all, fields(bank = bank.len(), ledger = ledger.len()))]
    pub fn run(&self, bank: &[BankTransaction], ledger: &[LedgerEntry]) -> MatchOutput {
        let mut state = MatchState::new(bank.len(), ledger.len());

        self.reference_pass(bank, ledger, &mut state);
        let after_reference = state.matched.len();
        self.amount_date_pass(bank, ledger, &mut state);

        debug!(
            reference_pairs = after_reference,
            amount_date_pairs = state.matched.len() - after_reference,
            "matching complete"
        );

        state.finish()
    }

    fn reference_pass(
        &self,
        bank: &[BankTransaction],
        ledger: &[LedgerEntry],
        state: &mut MatchState,
    ) {
        for (bi, bt) in bank.iter().enumerate() {
            if state.bank_used[bi] {
                continue;
            }
            let Some(bank_ref) = self.strong_reference(bt) else {
                continue;
            };

            let found = ledger.iter().enumerate().find(|(li, le)| {
                !state.ledger_used[*li]
                    && normalize_reference(le.reference.as_deref()).as_deref()
                        == Some(bank_ref.as_str())
                    && self.tolerance.reference_amounts_within(bt.amount, le.amount)
                    && self
                        .tolerance
                        .dates_within(bt.date.as_deref(), le.date.as_deref())
            });

            if let Some((li, le)) = found {
                self.pair(bi, bt, li, le, MatchConfidence::High, state);
            }
        }
    }

    fn amount_date_pass(
        &self,
        bank: &[BankTransaction],
        ledger: &[LedgerEntry],
        state: &mut MatchState,
    ) {
        for (bi, bt) in bank.iter().enumerate() {
            if state.bank_used[bi] {
                continue;
            }

            // First candidate in ledger order; no scoring between candidates.
            let found = ledger.iter().enumerate().find(|(li, le)| {
                !state.ledger_used[*li]
                    && self.tolerance.amounts_within(bt.amount, le.amount)
                    && self
                        .tolerance
                        .dates_within(bt.date.as_deref(), le.date.as_deref())
            });

            if let Some((li, le)) = found {
                self.pair(bi, bt, li, le, MatchConfidence::Medium, state);
            }
        }
    }

    /// Normalized bank reference, if long enough to anchor the reference pass.
    fn strong_reference(&self, bt: &BankTransaction) -> Option<String> {
        let trimmed = bt.reference.as_deref()?.trim();
        if trimmed.chars().count() < self.tolerance.min_reference_len {
            return None;
        }
        normalize_reference(Some(trimmed))
    }

    fn pair(
        &self,
        bi: usize,
        bt: &BankTransaction,
        li: usize,
        le: &LedgerEntry,
        confidence: MatchConfidence,
        state: &mut MatchState,
    ) {
        let discrepancy = build_discrepancy(bt, le, &self.tolerance);
        debug!(
            bank = %bt.id,
            ledger = %le.id,
            %confidence,
            discrepancy = discrepancy.is_some(),
            "paired"
        );
        state.claim(bi, li);
        state.matched.push(PairMatch {
            bank: bi,
            ledger: li,
            confidence,
            discrepancy,
        });
    }
}

/// Arena of match flags for one run, indexed by input position.
struct MatchState {
    bank_used: Vec<bool>,
    ledger_used: Vec<bool>,
    matched: Vec<PairMatch>,
}

impl MatchState {
    fn new(bank_len: usize, ledger_len: usize) -> Self {
        Self {
            bank_used: vec![false; bank_len],
            ledger_used: vec![false; ledger_len],
            matched: Vec::new(),
        }
    }

    fn claim(&mut self, bi: usize, li: usize) {
        assert!(!self.bank_used[bi], "bank record {bi} matched twice");
        assert!(!self.ledger_used[li], "ledger record {li} matched twice");
        self.bank_used[bi] = true;
        self.ledger_used[li] = true;
    }

    fn finish(self) -> MatchOutput {
        let bank_only = unused(&self.bank_used);
        let ledger_only = unused(&self.ledger_used);
        assert_eq!(
            self.matched.len() + bank_only.len(),
            self.bank_used.len(),
            "bank records do not partition"
        );
        assert_eq!(
            self.matched.len() + ledger_only.len(),
            self.ledger_used.len(),
            "ledger records do not partition"
        );
        MatchOutput {
            matched: self.matched,
            bank_only,
            ledger_only,
        }
    }
}

fn unused(flags: &[bool]) -> Vec<usize> {
    flags
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(i, _)| i)
        .collect()
}
