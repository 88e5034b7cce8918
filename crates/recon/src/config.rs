use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::compare::{amounts_close, day_distance};
use crate::error::ReconError;
use crate::model::DocumentKind;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    /// Ordered: documents are flattened into the matcher input in this order.
    #[serde(default)]
    pub documents: Vec<DocumentConfig>,
}

fn default_name() -> String {
    "reconciliation".into()
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

/// How bank and ledger amounts are compared.
///
/// Bank debits arrive negative while ledger entries usually carry positive
/// magnitudes. `Raw` compares the signed values as extracted; `Magnitude`
/// compares absolute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountSign {
    #[default]
    Raw,
    Magnitude,
}

/// Read from TOML in snake_case; serialized into the session in camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ToleranceConfig {
    /// Max calendar days between two dates considered close.
    #[serde(default = "default_days")]
    pub days: u32,
    /// Max absolute currency difference between two amounts considered close.
    #[serde(default = "default_amount")]
    pub amount: Decimal,
    /// Minimum trimmed length of a bank reference for the reference pass.
    #[serde(default = "default_min_reference_len")]
    pub min_reference_len: usize,
    #[serde(default)]
    pub amount_sign: AmountSign,
}

pub const DEFAULT_TOLERANCE_DAYS: u32 = 3;
pub const DEFAULT_MIN_REFERENCE_LEN: usize = 5;

/// 0.05 currency units.
pub fn default_amount() -> Decimal {
    Decimal::new(5, 2)
}

fn default_days() -> u32 {
    DEFAULT_TOLERANCE_DAYS
}

fn default_min_reference_len() -> usize {
    DEFAULT_MIN_REFERENCE_LEN
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_TOLERANCE_DAYS,
            amount: default_amount(),
            min_reference_len: DEFAULT_MIN_REFERENCE_LEN,
            amount_sign: AmountSign::Raw,
        }
    }
}

impl ToleranceConfig {
    /// The amount as it takes part in comparisons.
    pub fn comparable(&self, amount: Decimal) -> Decimal {
        match self.amount_sign {
            AmountSign::Raw => amount,
            AmountSign::Magnitude => amount.abs(),
        }
    }

    pub fn amounts_within(&self, bank: Option<Decimal>, ledger: Option<Decimal>) -> bool {
        amounts_close(
            bank.map(|a| self.comparable(a)),
            ledger.map(|a| self.comparable(a)),
            self.amount,
        )
    }

    /// Reference-pass variant of [`amounts_within`](Self::amounts_within):
    /// an absent amount counts as zero.
    pub fn reference_amounts_within(&self, bank: Option<Decimal>, ledger: Option<Decimal>) -> bool {
        self.amounts_within(
            Some(bank.unwrap_or(Decimal::ZERO)),
            Some(ledger.unwrap_or(Decimal::ZERO)),
        )
    }

    /// An absent or unparseable date never counts as within tolerance.
    pub fn dates_within(&self, bank: Option<&str>, ledger: Option<&str>) -> bool {
        day_distance(bank, ledger).is_some_and(|days| days <= self.days)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(ReconError::ConfigValidation(format!(
                "tolerance.amount must not be negative, got {}",
                self.amount
            )));
        }
        if self.min_reference_len == 0 {
            return Err(ReconError::ConfigValidation(
                "tolerance.min_reference_len must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    pub id: String,
    pub kind: DocumentKind,
    pub file: String,
    #[serde(default)]
    pub format: Option<DocumentFormat>,
    #[serde(default)]
    pub columns: ColumnMapping,
    #[serde(default)]
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// Column-mapped CSV export.
    Csv,
    /// Payload returned by the extraction service.
    Json,
}

impl DocumentConfig {
    /// Explicit format, else inferred from the file extension (`.json` or CSV).
    pub fn resolved_format(&self) -> DocumentFormat {
        if let Some(format) = self.format {
            return format;
        }
        match Path::new(&self.file)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => DocumentFormat::Json,
            _ => DocumentFormat::Csv,
        }
    }

    pub fn file_name(&self) -> String {
        Path::new(&self.file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.clone())
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// CSV header names for each record field. `date`, `description` and
/// `amount` must exist in the file; the rest are read when present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub id: String,
    pub date: String,
    pub description: String,
    pub amount: String,
    pub reference: String,
    pub kind: String,
    pub balance_after: String,
    pub account_code: String,
    pub cost_center: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: "id".into(),
            date: "date".into(),
            description: "description".into(),
            amount: "amount".into(),
            reference: "reference".into(),
            kind: "type".into(),
            balance_after: "balance_after".into(),
            account_code: "account_code".into(),
            cost_center: "cost_center".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with no documents, for callers that extract records themselves.
    pub fn with_tolerance(name: impl Into<String>, tolerance: ToleranceConfig) -> Self {
        Self {
            name: name.into(),
            tolerance,
            documents: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        self.tolerance.validate()?;

        if self.documents.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one document is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for doc in &self.documents {
            if doc.id.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "document for file '{}' has an empty id",
                    doc.file
                )));
            }
            if !seen.insert(doc.id.as_str()) {
                return Err(ReconError::DuplicateDocument(doc.id.clone()));
            }
            if let Some(d) = doc.delimiter {
                if !d.is_ascii() {
                    return Err(ReconError::ConfigValidation(format!(
                        "document '{}': delimiter must be a single ASCII character",
                        doc.id
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const VALID: &str = r#"
name = "October close"

[tolerance]
days = 2
amount = "0.10"
min_reference_len = 4

[[documents]]
id = "bank-oct"
kind = "bank_statement"
file = "statements/bank.csv"

[[documents]]
id = "ledger-oct"
kind = "internal_ledger"
file = "ledger.json"
"#;

    #[test]
    fn parse_valid() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "October close");
        assert_eq!(config.tolerance.days, 2);
        assert_eq!(config.tolerance.amount, dec!(0.10));
        assert_eq!(config.tolerance.min_reference_len, 4);
        assert_eq!(config.tolerance.amount_sign, AmountSign::Raw);
        assert_eq!(config.documents.len(), 2);
        assert_eq!(config.documents[0].id, "bank-oct");
        assert_eq!(config.documents[0].kind, DocumentKind::BankStatement);
        assert_eq!(config.documents[0].resolved_format(), DocumentFormat::Csv);
        assert_eq!(config.documents[0].file_name(), "bank.csv");
        assert_eq!(config.documents[1].resolved_format(), DocumentFormat::Json);
    }

    #[test]
    fn tolerance_defaults() {
        let input = r#"
[[documents]]
id = "b"
kind = "bank_statement"
file = "b.csv"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.name, "reconciliation");
        assert_eq!(config.tolerance, ToleranceConfig::default());
        assert_eq!(config.tolerance.days, 3);
        assert_eq!(config.tolerance.amount, dec!(0.05));
        assert_eq!(config.tolerance.min_reference_len, 5);
    }

    #[test]
    fn parse_columns_and_sign() {
        let input = r#"
[tolerance]
amount_sign = "magnitude"

[[documents]]
id = "b"
kind = "bank_statement"
file = "b.txt"
format = "csv"
delimiter = ";"

[documents.columns]
date = "Data"
amount = "Valor"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.tolerance.amount_sign, AmountSign::Magnitude);
        let doc = &config.documents[0];
        assert_eq!(doc.delimiter, Some(';'));
        assert_eq!(doc.columns.date, "Data");
        assert_eq!(doc.columns.amount, "Valor");
        // Unmapped columns keep their defaults
        assert_eq!(doc.columns.description, "description");
    }

    #[test]
    fn reject_duplicate_document_ids() {
        let input = r#"
[[documents]]
id = "same"
kind = "bank_statement"
file = "a.csv"

[[documents]]
id = "same"
kind = "internal_ledger"
file = "b.csv"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::DuplicateDocument(ref id) if id == "same"));
    }

    #[test]
    fn reject_negative_amount_tolerance() {
        let input = r#"
[tolerance]
amount = "-0.01"

[[documents]]
id = "b"
kind = "bank_statement"
file = "b.csv"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("must not be negative"));
    }

    #[test]
    fn reject_no_documents() {
        let err = ReconConfig::from_toml("name = \"empty\"").unwrap_err();
        assert!(err.to_string().contains("at least one document"));
    }

    #[test]
    fn reject_unknown_kind() {
        let input = r#"
[[documents]]
id = "b"
kind = "brokerage"
file = "b.csv"
"#;
        assert!(matches!(
            ReconConfig::from_toml(input),
            Err(ReconError::ConfigParse(_))
        ));
    }

    #[test]
    fn magnitude_comparison_ignores_sign() {
        let raw = ToleranceConfig::default();
        assert!(!raw.amounts_within(Some(dec!(-1250.75)), Some(dec!(1250.75))));

        let magnitude = ToleranceConfig {
            amount_sign: AmountSign::Magnitude,
            ..ToleranceConfig::default()
        };
        assert!(magnitude.amounts_within(Some(dec!(-1250.75)), Some(dec!(1250.75))));
    }

    #[test]
    fn absent_date_is_never_within() {
        let tol = ToleranceConfig::default();
        assert!(tol.dates_within(Some("01/10/2023"), Some("04/10/2023")));
        assert!(!tol.dates_within(Some("01/10/2023"), Some("05/10/2023")));
        assert!(!tol.dates_within(None, Some("01/10/2023")));
        assert!(!tol.dates_within(Some("garbage"), Some("01/10/2023")));
    }
}
