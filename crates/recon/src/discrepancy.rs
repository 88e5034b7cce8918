use crate::compare::{day_distance, normalize_reference};
use crate::config::ToleranceConfig;
use crate::model::{
    AmountDiscrepancy, BankTransaction, DateDiscrepancy, LedgerEntry, MatchDiscrepancy,
    MatchStatus,
};

/// Classify the differences of an already paired bank/ledger record.
///
/// Amount and date are checked independently. A reference mismatch is only
/// reported alongside an amount or date discrepancy. Returns `None` for an
/// exact pair.
pub fn build_discrepancy(
    bank: &BankTransaction,
    ledger: &LedgerEntry,
    tolerance: &ToleranceConfig,
) -> Option<MatchDiscrepancy> {
    let mut disc = MatchDiscrepancy::default();

    if let (Some(b), Some(l)) = (bank.amount, ledger.amount) {
        let difference = tolerance.comparable(b).saturating_sub(tolerance.comparable(l));
        if difference.abs() > tolerance.amount {
            disc.amount = Some(AmountDiscrepancy {
                bank: b,
                ledger: l,
                difference,
            });
        }
    }

    if let Some(days) = day_distance(bank.date.as_deref(), ledger.date.as_deref()) {
        if days > tolerance.days {
            disc.date = Some(DateDiscrepancy {
                bank: bank.date.clone().unwrap_or_default(),
                ledger: ledger.date.clone().unwrap_or_default(),
                difference_days_abs: days,
            });
        }
    }

    let bank_ref = normalize_reference(bank.reference.as_deref());
    let ledger_ref = normalize_reference(ledger.reference.as_deref());
    let references_differ = bank_ref != ledger_ref;
    let strong_reference_match = matches!(
        (&bank_ref, &ledger_ref),
        (Some(b), Some(l)) if b == l && b.chars().count() >= tolerance.min_reference_len
    );
    if references_differ
        && !strong_reference_match
        && (disc.amount.is_some() || disc.date.is_some())
    {
        disc.reference = true;
    }

    if disc.is_empty() {
        None
    } else {
        Some(disc)
    }
}

pub fn status_for(discrepancy: Option<&MatchDiscrepancy>) -> MatchStatus {
    match discrepancy {
        Some(_) => MatchStatus::MatchedWithDiscrepancy,
        None => MatchStatus::MatchedExact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AmountSign;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bank(date: Option<&str>, amount: Option<Decimal>, reference: Option<&str>) -> BankTransaction {
        BankTransaction {
            id: "bt".into(),
            date: date.map(Into::into),
            amount,
            reference: reference.map(Into::into),
            ..Default::default()
        }
    }

    fn ledger(date: Option<&str>, amount: Option<Decimal>, reference: Option<&str>) -> LedgerEntry {
        LedgerEntry {
            id: "le".into(),
            date: date.map(Into::into),
            amount,
            reference: reference.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn exact_pair_has_no_discrepancy() {
        let tol = ToleranceConfig::default();
        let disc = build_discrepancy(
            &bank(Some("05/10/2023"), Some(dec!(500.00)), Some("DEP001")),
            &ledger(Some("06/10/2023"), Some(dec!(500.03)), Some("dep001")),
            &tol,
        );
        assert_eq!(disc, None);
        assert_eq!(status_for(disc.as_ref()), MatchStatus::MatchedExact);
    }

    #[test]
    fn amount_difference_is_bank_minus_ledger() {
        let tol = ToleranceConfig::default();
        let disc = build_discrepancy(
            &bank(Some("05/10/2023"), Some(dec!(100.00)), None),
            &ledger(Some("05/10/2023"), Some(dec!(100.0500001)), None),
            &tol,
        )
        .unwrap();
        let amount = disc.amount.unwrap();
        assert_eq!(amount.bank, dec!(100.00));
        assert_eq!(amount.ledger, dec!(100.0500001));
        assert_eq!(amount.difference, dec!(-0.0500001));
        assert!(disc.date.is_none());
        assert!(!disc.reference);
    }

    #[test]
    fn amount_at_tolerance_is_not_flagged() {
        let tol = ToleranceConfig::default();
        let disc = build_discrepancy(
            &bank(Some("05/10/2023"), Some(dec!(100.00)), None),
            &ledger(Some("05/10/2023"), Some(dec!(100.05)), None),
            &tol,
        );
        assert_eq!(disc, None);
    }

    #[test]
    fn absent_amount_disqualifies_amount_rule() {
        let tol = ToleranceConfig::default();
        let disc = build_discrepancy(
            &bank(Some("05/10/2023"), None, None),
            &ledger(Some("05/10/2023"), Some(dec!(100.00)), None),
            &tol,
        );
        assert_eq!(disc, None);
    }

    #[test]
    fn date_beyond_tolerance() {
        let tol = ToleranceConfig::default();
        let disc = build_discrepancy(
            &bank(Some("01/10/2023"), Some(dec!(10)), None),
            &ledger(Some("05/10/2023"), Some(dec!(10)), None),
            &tol,
        )
        .unwrap();
        let date = disc.date.unwrap();
        assert_eq!(date.bank, "01/10/2023");
        assert_eq!(date.ledger, "05/10/2023");
        assert_eq!(date.difference_days_abs, 4);
    }

    #[test]
    fn reference_alone_is_not_flagged() {
        let tol = ToleranceConfig::default();
        let disc = build_discrepancy(
            &bank(Some("05/10/2023"), Some(dec!(10)), Some("159753")),
            &ledger(Some("05/10/2023"), Some(dec!(10)), Some("NF301")),
            &tol,
        );
        assert_eq!(disc, None);
    }

    #[test]
    fn reference_flagged_alongside_amount() {
        let tol = ToleranceConfig::default();
        let disc = build_discrepancy(
            &bank(Some("05/10/2023"), Some(dec!(10)), Some("159753")),
            &ledger(Some("05/10/2023"), Some(dec!(12)), None),
            &tol,
        )
        .unwrap();
        assert!(disc.amount.is_some());
        assert!(disc.reference);
        assert!(!disc.description);
    }

    #[test]
    fn equal_references_never_flagged() {
        let tol = ToleranceConfig::default();
        let disc = build_discrepancy(
            &bank(Some("01/10/2023"), Some(dec!(10)), Some(" abc ")),
            &ledger(Some("09/10/2023"), Some(dec!(10)), Some("ABC")),
            &tol,
        )
        .unwrap();
        assert!(disc.date.is_some());
        assert!(!disc.reference);
    }

    #[test]
    fn both_references_absent_not_flagged() {
        let tol = ToleranceConfig::default();
        let disc = build_discrepancy(
            &bank(Some("01/10/2023"), Some(dec!(10)), None),
            &ledger(Some("09/10/2023"), Some(dec!(10)), Some("  ")),
            &tol,
        )
        .unwrap();
        assert!(!disc.reference);
    }

    #[test]
    fn signed_amounts_compared_literally_by_default() {
        let tol = ToleranceConfig::default();
        let disc = build_discrepancy(
            &bank(Some("05/10/2023"), Some(dec!(-1250.75)), Some("159753")),
            &ledger(Some("05/10/2023"), Some(dec!(1250.75)), Some("159753")),
            &tol,
        )
        .unwrap();
        assert_eq!(disc.amount.unwrap().difference, dec!(-2501.50));
        assert!(!disc.reference);
    }

    #[test]
    fn magnitude_mode_clears_sign_difference() {
        let tol = ToleranceConfig {
            amount_sign: AmountSign::Magnitude,
            ..ToleranceConfig::default()
        };
        let disc = build_discrepancy(
            &bank(Some("05/10/2023"), Some(dec!(-1250.75)), Some("159753")),
            &ledger(Some("05/10/2023"), Some(dec!(1250.75)), Some("159753")),
            &tol,
        );
        assert_eq!(disc, None);
    }
}
