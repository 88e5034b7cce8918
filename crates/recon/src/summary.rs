use rust_decimal::Decimal;

use crate::model::{BankTransaction, LedgerEntry, MatchStatus, MatchedPair, ReconciliationSummary};

/// Reduce the final partition to counts and totals.
///
/// Recomputed from scratch on every run. Absent amounts count as zero;
/// totals saturate at the bounds of `Decimal`.
pub fn compute_summary(
    bank: &[BankTransaction],
    ledger: &[LedgerEntry],
    pairs: &[MatchedPair],
) -> ReconciliationSummary {
    let mut summary = ReconciliationSummary {
        total_bank_transactions: bank.len(),
        total_ledger_entries: ledger.len(),
        matched_pairs_count: pairs.len(),
        ..Default::default()
    };

    for t in bank {
        let amount = t.amount.unwrap_or(Decimal::ZERO);
        summary.total_bank_amount = summary.total_bank_amount.saturating_add(amount);
        if !t.is_matched {
            summary.unmatched_bank_items_count += 1;
            summary.total_unmatched_bank_value =
                summary.total_unmatched_bank_value.saturating_add(amount);
        }
    }

    for e in ledger {
        let amount = e.amount.unwrap_or(Decimal::ZERO);
        summary.total_ledger_amount = summary.total_ledger_amount.saturating_add(amount);
        if !e.is_matched {
            summary.unmatched_ledger_items_count += 1;
            summary.total_unmatched_ledger_value =
                summary.total_unmatched_ledger_value.saturating_add(amount);
        }
    }

    for p in pairs {
        let bank_amount = p.bank_transaction.amount.unwrap_or(Decimal::ZERO);
        let ledger_amount = p.ledger_entry.amount.unwrap_or(Decimal::ZERO);
        match p.status {
            MatchStatus::MatchedExact => {
                summary.total_amount_matched = summary.total_amount_matched.saturating_add(bank_amount);
            }
            MatchStatus::MatchedWithDiscrepancy => {
                summary.discrepancies_count += 1;
                summary.total_amount_bank_in_discrepancies =
                    summary.total_amount_bank_in_discrepancies.saturating_add(bank_amount);
                summary.total_amount_ledger_in_discrepancies =
                    summary.total_amount_ledger_in_discrepancies.saturating_add(ledger_amount);
            }
            _ => {}
        }
    }

    summary.net_difference_in_discrepancies = summary
        .total_amount_bank_in_discrepancies
        .saturating_sub(summary.total_amount_ledger_in_discrepancies);

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchConfidence, MatchDiscrepancy};
    use rust_decimal_macros::dec;

    fn bank(id: &str, amount: Option<Decimal>, matched: bool) -> BankTransaction {
        BankTransaction {
            id: id.into(),
            amount,
            is_matched: matched,
            ..Default::default()
        }
    }

    fn ledger(id: &str, amount: Option<Decimal>, matched: bool) -> LedgerEntry {
        LedgerEntry {
            id: id.into(),
            amount,
            is_matched: matched,
            ..Default::default()
        }
    }

    fn pair(b: BankTransaction, l: LedgerEntry, status: MatchStatus) -> MatchedPair {
        MatchedPair {
            id: format!("match-{}-{}", b.id, l.id),
            bank_transaction: b,
            ledger_entry: l,
            confidence: MatchConfidence::Medium,
            discrepancy: match status {
                MatchStatus::MatchedWithDiscrepancy => Some(MatchDiscrepancy::default()),
                _ => None,
            },
            status,
            notes: None,
        }
    }

    #[test]
    fn summary_totals() {
        let b1 = bank("b1", Some(dec!(500.00)), true);
        let b2 = bank("b2", Some(dec!(-59.90)), true);
        let b3 = bank("b3", Some(dec!(15.50)), false);
        let b4 = bank("b4", None, false);
        let l1 = ledger("l1", Some(dec!(500.00)), true);
        let l2 = ledger("l2", Some(dec!(-60.00)), true);
        let l3 = ledger("l3", Some(dec!(8500.00)), false);

        let pairs = vec![
            pair(b1.clone(), l1.clone(), MatchStatus::MatchedExact),
            pair(b2.clone(), l2.clone(), MatchStatus::MatchedWithDiscrepancy),
        ];
        let s = compute_summary(&[b1, b2, b3, b4], &[l1, l2, l3], &pairs);

        assert_eq!(s.total_bank_transactions, 4);
        assert_eq!(s.total_ledger_entries, 3);
        assert_eq!(s.total_bank_amount, dec!(455.60));
        assert_eq!(s.total_ledger_amount, dec!(8940.00));
        assert_eq!(s.matched_pairs_count, 2);
        assert_eq!(s.total_amount_matched, dec!(500.00));
        assert_eq!(s.discrepancies_count, 1);
        assert_eq!(s.total_amount_bank_in_discrepancies, dec!(-59.90));
        assert_eq!(s.total_amount_ledger_in_discrepancies, dec!(-60.00));
        assert_eq!(s.net_difference_in_discrepancies, dec!(0.10));
        assert_eq!(s.unmatched_bank_items_count, 2);
        assert_eq!(s.total_unmatched_bank_value, dec!(15.50));
        assert_eq!(s.unmatched_ledger_items_count, 1);
        assert_eq!(s.total_unmatched_ledger_value, dec!(8500.00));
    }

    #[test]
    fn empty_summary_is_zero() {
        let s = compute_summary(&[], &[], &[]);
        assert_eq!(s, ReconciliationSummary::default());
        assert_eq!(s.net_difference_in_discrepancies, Decimal::ZERO);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let b1 = bank("b1", Some(Decimal::MAX), false);
        let b2 = bank("b2", Some(Decimal::MAX), false);
        let l1 = ledger("l1", Some(Decimal::MIN), true);
        let b3 = bank("b3", Some(Decimal::MAX), true);
        let pairs = vec![pair(b3.clone(), l1.clone(), MatchStatus::MatchedWithDiscrepancy)];
        let s = compute_summary(&[b1, b2, b3], &[l1], &pairs);
        assert_eq!(s.total_bank_amount, Decimal::MAX);
        assert_eq!(s.total_unmatched_bank_value, Decimal::MAX);
        assert_eq!(s.total_ledger_amount, Decimal::MIN);
        assert_eq!(s.net_difference_in_discrepancies, Decimal::MAX);
    }

    #[test]
    fn review_statuses_are_not_counted_as_exact() {
        let b = bank("b1", Some(dec!(10)), true);
        let l = ledger("l1", Some(dec!(10)), true);
        let pairs = vec![pair(b.clone(), l.clone(), MatchStatus::PendingReview)];
        let s = compute_summary(&[b], &[l], &pairs);
        assert_eq!(s.matched_pairs_count, 1);
        assert_eq!(s.total_amount_matched, Decimal::ZERO);
        assert_eq!(s.discrepancies_count, 0);
    }
}
