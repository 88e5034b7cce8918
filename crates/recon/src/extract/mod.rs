//! Extraction seam: turns document content into records.
//!
//! The engine never calls an extractor itself. Callers resolve every
//! document of a batch first (`extract_all`), then hand the complete batch
//! to [`crate::engine::run`].

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use crate::config::{DocumentConfig, DocumentFormat};
use crate::error::ExtractError;
use crate::model::{DocumentKind, ExtractedData, ExtractedDocument};

pub mod delimited;
pub mod payload;

pub use delimited::DelimitedExtractor;
pub use payload::PayloadExtractor;

/// Placeholder for records extracted without a description.
pub const MISSING_DESCRIPTION: &str = "(no description)";

/// Parse error recorded when a document yields nothing at all.
pub const NO_RECORDS_EXTRACTED: &str = "no transactions or entries were extracted from the document";

/// Largest amount magnitude an extractor accepts (10^15). Larger values are
/// reported as parse errors and left absent.
pub fn max_amount() -> Decimal {
    Decimal::new(1_000_000_000_000_000, 0)
}

pub(crate) fn in_amount_range(amount: Decimal) -> bool {
    amount.abs() <= max_amount()
}

/// The external extraction collaborator.
pub trait Extractor: Send + Sync {
    fn extract(&self, kind: DocumentKind, content: &str) -> Result<ExtractedData, ExtractError>;
}

/// A document waiting for extraction.
pub struct SourceDocument {
    pub id: String,
    pub file_name: String,
    pub kind: DocumentKind,
    /// Raw content, or the error that prevented reading it.
    pub content: Result<String, ExtractError>,
    pub extractor: Box<dyn Extractor>,
}

impl SourceDocument {
    /// Document with the extractor its config asks for.
    pub fn from_config(doc: &DocumentConfig, content: Result<String, ExtractError>) -> Self {
        Self {
            id: doc.id.clone(),
            file_name: doc.file_name(),
            kind: doc.kind,
            content,
            extractor: extractor_for(doc),
        }
    }
}

pub fn extractor_for(doc: &DocumentConfig) -> Box<dyn Extractor> {
    match doc.resolved_format() {
        DocumentFormat::Csv => {
            let mut extractor = DelimitedExtractor::new(doc.columns.clone());
            if let Some(d) = doc.delimiter {
                extractor = extractor.with_delimiter(d as u8);
            }
            Box::new(extractor)
        }
        DocumentFormat::Json => Box::new(PayloadExtractor),
    }
}

/// Extract every document concurrently, one thread per document.
///
/// Returns only after all documents have resolved, in input order whatever
/// the completion order. A failing document yields an `Err` result and
/// does not affect the others.
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn extract_all(documents: &[SourceDocument]) -> Vec<ExtractedDocument> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = documents
            .iter()
            .map(|doc| {
                scope.spawn(move || match &doc.content {
                    Ok(content) => doc.extractor.extract(doc.kind, content),
                    Err(e) => Err(e.clone()),
                })
            })
            .collect();

        documents
            .iter()
            .zip(handles)
            .map(|(doc, handle)| {
                let result = handle.join().unwrap_or(Err(ExtractError::Panicked));
                if let Err(ref e) = result {
                    warn!(document = %doc.id, file = %doc.file_name, error = %e, "extraction failed");
                }
                ExtractedDocument {
                    id: doc.id.clone(),
                    file_name: doc.file_name.clone(),
                    kind: doc.kind,
                    result,
                }
            })
            .collect()
    })
}

/// Text of a field, `None` when blank.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
