//! Date and amount comparators. Absent or malformed input never panics; it
//! propagates as `None` / `false`.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Parse a `D/M/YYYY` date.
///
/// Each component is read up to its first non-digit, so a trailing time
/// (`05/10/2023 10:30`) is ignored. Anything without exactly three
/// components, and impossible calendar dates such as `31/02/2023`, is `None`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let mut parts = value.trim().split('/');
    let day = u32::try_from(leading_int(parts.next()?)?).ok()?;
    let month = u32::try_from(leading_int(parts.next()?)?).ok()?;
    let year = i32::try_from(leading_int(parts.next()?)?).ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Optional sign and leading digits of `part`, after leading whitespace.
fn leading_int(part: &str) -> Option<i64> {
    let part = part.trim_start();
    let unsigned = part.trim_start_matches(['+', '-']);
    let sign_len = part.len() - unsigned.len();
    if sign_len > 1 {
        return None;
    }
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }
    part[..sign_len + digits].parse().ok()
}

/// Absolute number of calendar days between two dates.
pub fn day_distance(a: Option<&str>, b: Option<&str>) -> Option<u32> {
    let a = parse_date(a?)?;
    let b = parse_date(b?)?;
    u32::try_from((a - b).num_days().unsigned_abs()).ok()
}

/// True iff both amounts are present and `|a − b| <= tolerance`. A
/// difference too large to represent is never close.
pub fn amounts_close(a: Option<Decimal>, b: Option<Decimal>, tolerance: Decimal) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.checked_sub(b).is_some_and(|d| d.abs() <= tolerance),
        _ => false,
    }
}

/// Trimmed, case-folded reference. Blank references are absent.
pub fn normalize_reference(reference: Option<&str>) -> Option<String> {
    let trimmed = reference?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_day_month_year() {
        assert_eq!(parse_date("05/10/2023"), NaiveDate::from_ymd_opt(2023, 10, 5));
        assert_eq!(parse_date(" 5/1/2024 "), NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn trailing_text_after_components_is_ignored() {
        assert_eq!(parse_date("05/10/2023 10:30"), NaiveDate::from_ymd_opt(2023, 10, 5));
        assert_eq!(parse_date("05 /10x/2023"), NaiveDate::from_ymd_opt(2023, 10, 5));
        assert_eq!(parse_date("05/10/x2023"), None);
        assert_eq!(parse_date("05/-1/2023"), None);
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2023-10-05"), None);
        assert_eq!(parse_date("31/02/2023"), None);
        assert_eq!(parse_date("05/13/2023"), None);
        assert_eq!(parse_date("05/10/2023/1"), None);
        assert_eq!(parse_date("aa/bb/cccc"), None);
    }

    #[test]
    fn day_distance_is_absolute() {
        assert_eq!(day_distance(Some("01/10/2023"), Some("04/10/2023")), Some(3));
        assert_eq!(day_distance(Some("04/10/2023"), Some("01/10/2023")), Some(3));
        assert_eq!(day_distance(Some("31/12/2023"), Some("01/01/2024")), Some(1));
        assert_eq!(day_distance(Some("05/10/2023"), Some("05/10/2023")), Some(0));
    }

    #[test]
    fn day_distance_absent_propagates() {
        assert_eq!(day_distance(None, Some("01/10/2023")), None);
        assert_eq!(day_distance(Some("01/10/2023"), None), None);
        assert_eq!(day_distance(Some("not a date"), Some("01/10/2023")), None);
    }

    #[test]
    fn amount_tolerance_boundary() {
        let tol = dec!(0.05);
        assert!(amounts_close(Some(dec!(100.00)), Some(dec!(100.05)), tol));
        assert!(amounts_close(Some(dec!(100.05)), Some(dec!(100.00)), tol));
        assert!(!amounts_close(Some(dec!(100.00)), Some(dec!(100.0500001)), tol));
        assert!(!amounts_close(None, Some(dec!(100.00)), tol));
        assert!(!amounts_close(None, None, tol));
    }

    #[test]
    fn unrepresentable_difference_is_not_close() {
        assert!(!amounts_close(Some(Decimal::MAX), Some(Decimal::MIN), dec!(0.05)));
        assert!(!amounts_close(Some(Decimal::MIN), Some(Decimal::MAX), Decimal::MAX));
        assert!(amounts_close(Some(Decimal::MAX), Some(Decimal::MAX), dec!(0)));
    }

    #[test]
    fn reference_normalization() {
        assert_eq!(normalize_reference(Some("  NF301 ")), Some("nf301".into()));
        assert_eq!(normalize_reference(Some("   ")), None);
        assert_eq!(normalize_reference(None), None);
    }
}
