//! `tally-recon`: bank statement to internal ledger reconciliation engine.
//!
//! Pure engine crate: receives extracted records, returns a reconciliation
//! session. No CLI or terminal IO.

pub mod compare;
pub mod config;
pub mod discrepancy;
pub mod engine;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod model;
pub mod summary;

pub use config::{AmountSign, ReconConfig, ToleranceConfig};
pub use engine::{reconcile, run};
pub use error::{ExtractError, ReconError};
pub use extract::{extract_all, Extractor, SourceDocument};
pub use matcher::Matcher;
pub use model::{ReconInput, ReconciliationSession, ReconciliationSummary};
pub use rust_decimal::Decimal;
