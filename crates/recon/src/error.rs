use thiserror::Error;

/// Configuration failures. The matcher itself has no error path.
#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad tolerance, empty document list, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Two documents share the same id.
    #[error("duplicate document id: {0}")]
    DuplicateDocument(String),
}

/// Failure of the extraction collaborator for a single document.
///
/// Recorded on the document outcome; never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("cannot read document: {0}")]
    Io(String),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("missing column '{column}'")]
    MissingColumn { column: String },
    #[error("response is not valid JSON: {0}")]
    Json(String),
    #[error("response does not contain a JSON object")]
    NotJson,
    #[error("extraction worker panicked")]
    Panicked,
}
