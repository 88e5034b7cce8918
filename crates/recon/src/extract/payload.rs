//! Structured payload returned by a model-backed extraction service.
//!
//! The payload is a JSON object with `bankTransactions`, `ledgerEntries` and
//! `parseErrors` arrays, possibly wrapped in a Markdown code fence or
//! surrounded by chatter. Field values are taken loosely: amounts must be
//! JSON numbers, everything else may be a string or a number.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::{in_amount_range, non_blank, Extractor, MISSING_DESCRIPTION, NO_RECORDS_EXTRACTED};
use crate::error::ExtractError;
use crate::model::{BankTransaction, DocumentKind, ExtractedData, LedgerEntry, TransactionKind};

/// Parse error recorded for an empty response.
pub const EMPTY_RESPONSE: &str = "extraction response was empty";

/// Reads the JSON payload format. Both arrays are returned whatever the
/// document kind; the engine keeps only the side the document feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadExtractor;

impl Extractor for PayloadExtractor {
    fn extract(&self, _kind: DocumentKind, content: &str) -> Result<ExtractedData, ExtractError> {
        parse_payload(content)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPayload {
    bank_transactions: Option<Vec<Value>>,
    ledger_entries: Option<Vec<Value>>,
    parse_errors: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRecord {
    date: Value,
    description: Value,
    amount: Value,
    #[serde(rename = "type")]
    kind: Value,
    reference: Value,
    balance_after: Value,
    account_code: Value,
    cost_center: Value,
}

pub fn parse_payload(response: &str) -> Result<ExtractedData, ExtractError> {
    let Some(json) = isolate_object(response)? else {
        return Ok(ExtractedData {
            parse_errors: vec![EMPTY_RESPONSE.into()],
            ..Default::default()
        });
    };

    let raw: RawPayload =
        serde_json::from_str(json).map_err(|e| ExtractError::Json(e.to_string()))?;

    let mut data = ExtractedData::default();

    for (n, value) in raw.bank_transactions.unwrap_or_default().into_iter().enumerate() {
        let Some(r) = record(value, "bankTransactions", n, &mut data.parse_errors) else {
            continue;
        };
        let amount = amount_of(&r.amount, "bankTransactions", n, "amount", &mut data.parse_errors);
        let balance_after = amount_of(
            &r.balance_after,
            "bankTransactions",
            n,
            "balanceAfter",
            &mut data.parse_errors,
        );
        data.bank_transactions.push(BankTransaction {
            id: format!("bs-{}", n + 1),
            date: text(&r.date),
            description: text(&r.description).unwrap_or_else(|| MISSING_DESCRIPTION.into()),
            amount,
            kind: text(&r.kind)
                .and_then(|k| TransactionKind::parse(&k))
                .unwrap_or_else(|| TransactionKind::from_amount(amount)),
            reference: text(&r.reference),
            balance_after,
            ..Default::default()
        });
    }

    for (n, value) in raw.ledger_entries.unwrap_or_default().into_iter().enumerate() {
        let Some(r) = record(value, "ledgerEntries", n, &mut data.parse_errors) else {
            continue;
        };
        data.ledger_entries.push(LedgerEntry {
            id: format!("le-{}", n + 1),
            date: text(&r.date),
            description: text(&r.description).unwrap_or_else(|| MISSING_DESCRIPTION.into()),
            amount: amount_of(&r.amount, "ledgerEntries", n, "amount", &mut data.parse_errors),
            reference: text(&r.reference),
            account_code: text(&r.account_code),
            cost_center: text(&r.cost_center),
            ..Default::default()
        });
    }

    data.parse_errors
        .extend(raw.parse_errors.unwrap_or_default().iter().filter_map(text));

    if data.bank_transactions.is_empty()
        && data.ledger_entries.is_empty()
        && data.parse_errors.is_empty()
    {
        data.parse_errors.push(NO_RECORDS_EXTRACTED.into());
    }

    Ok(data)
}

/// Strip a code fence and cut the response down to its outermost object.
/// `Ok(None)` for an empty response.
fn isolate_object(response: &str) -> Result<Option<&str>, ExtractError> {
    let mut text = response.trim();

    if let Some(rest) = text.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            let inner = inner.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
            text = inner.trim();
        }
    }

    if text.starts_with('{') && text.ends_with('}') {
        return Ok(Some(text));
    }
    if text.is_empty() {
        return Ok(None);
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(Some(&text[start..=end])),
        _ => Err(ExtractError::NotJson),
    }
}

fn record(
    value: Value,
    array: &str,
    n: usize,
    parse_errors: &mut Vec<String>,
) -> Option<RawRecord> {
    match serde_json::from_value(value) {
        Ok(r) => Some(r),
        Err(e) => {
            parse_errors.push(format!("{array}[{n}]: {e}"));
            None
        }
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_blank(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A numeric field, with out-of-range values reported and dropped.
fn amount_of(
    value: &Value,
    array: &str,
    n: usize,
    field: &str,
    parse_errors: &mut Vec<String>,
) -> Option<Decimal> {
    if !value.is_number() {
        return None;
    }
    let parsed = number(value).filter(|amount| in_amount_range(*amount));
    if parsed.is_none() {
        parse_errors.push(format!("{array}[{n}].{field}: amount {value} out of range"));
    }
    parsed
}

fn number(value: &Value) -> Option<Decimal> {
    let Value::Number(n) = value else {
        return None;
    };
    let repr = n.to_string();
    Decimal::from_str(&repr)
        .or_else(|_| Decimal::from_scientific(&repr))
        .ok()
}
