use std::str::FromStr;

use rust_decimal::Decimal;

use super::{in_amount_range, non_blank, Extractor, MISSING_DESCRIPTION, NO_RECORDS_EXTRACTED};
use crate::compare::parse_date;
use crate::config::ColumnMapping;
use crate::error::ExtractError;
use crate::model::{BankTransaction, DocumentKind, ExtractedData, LedgerEntry, TransactionKind};

/// Column-mapped CSV (or other delimited) export.
///
/// `date`, `description` and `amount` columns are required; the rest are
/// read when the header exists. Header lookup ignores ASCII case. Bad
/// field values never fail the document: the field is left absent and a
/// parse error is recorded.
#[derive(Debug, Clone)]
pub struct DelimitedExtractor {
    columns: ColumnMapping,
    delimiter: u8,
}

impl DelimitedExtractor {
    pub fn new(columns: ColumnMapping) -> Self {
        Self {
            columns,
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Default for DelimitedExtractor {
    fn default() -> Self {
        Self::new(ColumnMapping::default())
    }
}

impl Extractor for DelimitedExtractor {
    fn extract(&self, kind: DocumentKind, content: &str) -> Result<ExtractedData, ExtractError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ExtractError::Csv(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let col = &self.columns;
        let optional = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let required = |name: &str| {
            optional(name).ok_or_else(|| ExtractError::MissingColumn {
                column: name.into(),
            })
        };

        let date_idx = required(&col.date)?;
        let description_idx = required(&col.description)?;
        let amount_idx = required(&col.amount)?;
        let id_idx = optional(&col.id);
        let reference_idx = optional(&col.reference);
        let kind_idx = optional(&col.kind);
        let balance_idx = optional(&col.balance_after);
        let account_idx = optional(&col.account_code);
        let cost_center_idx = optional(&col.cost_center);

        let mut data = ExtractedData::default();

        for (n, record) in reader.records().enumerate() {
            let row = n + 1;
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    data.parse_errors.push(format!("row {row}: {e}"));
                    continue;
                }
            };
            let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).and_then(non_blank);

            let date = field(Some(date_idx));
            if let Some(ref d) = date {
                if parse_date(d).is_none() {
                    data.parse_errors
                        .push(format!("row {row}: unrecognized date '{d}'"));
                }
            }
            let amount = amount_field(field(Some(amount_idx)), row, "amount", &mut data.parse_errors);
            let description = field(Some(description_idx))
                .unwrap_or_else(|| MISSING_DESCRIPTION.to_string());
            let reference = field(reference_idx);

            match kind {
                DocumentKind::BankStatement => {
                    let balance_after = amount_field(
                        field(balance_idx),
                        row,
                        "balance",
                        &mut data.parse_errors,
                    );
                    let kind = field(kind_idx)
                        .and_then(|k| TransactionKind::parse(&k))
                        .unwrap_or_else(|| TransactionKind::from_amount(amount));
                    data.bank_transactions.push(BankTransaction {
                        id: field(id_idx).unwrap_or_else(|| format!("bs-{row}")),
                        date,
                        description,
                        amount,
                        kind,
                        reference,
                        balance_after,
                        ..Default::default()
                    });
                }
                DocumentKind::InternalLedger => {
                    data.ledger_entries.push(LedgerEntry {
                        id: field(id_idx).unwrap_or_else(|| format!("le-{row}")),
                        date,
                        description,
                        amount,
                        reference,
                        account_code: field(account_idx),
                        cost_center: field(cost_center_idx),
                        ..Default::default()
                    });
                }
            }
        }

        if data.bank_transactions.is_empty()
            && data.ledger_entries.is_empty()
            && data.parse_errors.is_empty()
        {
            data.parse_errors.push(NO_RECORDS_EXTRACTED.into());
        }

        Ok(data)
    }
}

fn amount_field(
    raw: Option<String>,
    row: usize,
    what: &str,
    parse_errors: &mut Vec<String>,
) -> Option<Decimal> {
    let raw = raw?;
    let parsed = parse_amount(&raw);
    if parsed.is_none() {
        parse_errors.push(format!("row {row}: cannot parse {what} '{raw}'"));
    }
    parsed
}

/// Parse a monetary amount as it appears in statement exports.
///
/// Accepts currency symbols (`R$`, `$`, `€`, `£`), point or comma decimal
/// separators and thousands grouping (`1.250,75`, `1,250.75`). When both
/// separators appear the last one is the decimal point. A single comma is
/// always a decimal comma, so a US-style `1,250` reads as `1.25`; repeated
/// single separators are grouping. Magnitudes above
/// [`max_amount`](super::max_amount) are rejected.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let mut cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    for symbol in ["R$", "$", "€", "£"] {
        cleaned = cleaned.replace(symbol, "");
    }
    if cleaned.is_empty()
        || !cleaned
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
    {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches(',').count() == 1 => cleaned.replace(',', "."),
        (None, Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    Decimal::from_str(&normalized)
        .ok()
        .filter(|amount| in_amount_range(*amount))
}
