//! `tally run` and `tally validate`: config-driven reconciliation.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use tally_recon::error::ExtractError;
use tally_recon::extract::{extract_all, SourceDocument};
use tally_recon::model::{MatchStatus, ReconInput, ReconciliationSession};
use tally_recon::{Decimal, ReconConfig};
use tracing::info;

use crate::exit_codes::{
    EXIT_RECON_DOCUMENT_FAILED, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_RUNTIME,
    EXIT_RECON_UNRESOLVED, EXIT_USAGE,
};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  tally run october.recon.toml
  tally run october.recon.toml --json
  tally run october.recon.toml --output session.json
  tally run october.recon.toml --strict")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Output the session as JSON to stdout instead of the report
        #[arg(long)]
        json: bool,

        /// Write the session JSON to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit non-zero when documents failed or items remain unresolved
        #[arg(long)]
        strict: bool,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  tally validate october.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { config, json, output, strict } => {
            cmd_recon_run(config, json, output, strict)
        }
        ReconCommands::Validate { config } => cmd_recon_validate(config),
    }
}

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::new(EXIT_USAGE, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    ReconConfig::from_toml(&config_str).map_err(|e| {
        CliError::new(EXIT_RECON_INVALID_CONFIG, e.to_string())
            .with_hint("run `tally validate <config>` to check a config without running it")
    })
}

fn cmd_recon_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "{}: valid ({} documents, tolerance {} days / {})",
        config.name,
        config.documents.len(),
        config.tolerance.days,
        config.tolerance.amount,
    );
    Ok(())
}

fn cmd_recon_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let sources: Vec<SourceDocument> = config
        .documents
        .iter()
        .map(|doc| {
            let path = base_dir.join(&doc.file);
            let content = std::fs::read_to_string(&path)
                .map_err(|e| ExtractError::Io(format!("{}: {e}", path.display())));
            SourceDocument::from_config(doc, content)
        })
        .collect();

    info!(documents = sources.len(), "extracting");
    let documents = extract_all(&sources);
    let session = tally_recon::run(&config, ReconInput { documents });

    let json_str = serde_json::to_string_pretty(&session)
        .map_err(|e| CliError::new(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::new(EXIT_RECON_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    } else {
        print_report(&session);
    }

    print_summary(&session);

    if strict {
        check_strict(&session)?;
    }

    Ok(())
}

/// Human-readable listing of pairs and leftovers to stdout.
fn print_report(session: &ReconciliationSession) {
    println!("matched ({})", session.matched_pairs.len());
    for p in &session.matched_pairs {
        let b = &p.bank_transaction;
        let l = &p.ledger_entry;
        let status = match p.status {
            MatchStatus::MatchedExact => "exact",
            _ => "discrepancy",
        };
        println!(
            "  {:<14} {:<10} {:>12}  <->  {:<14} {:<10} {:>12}  {:<6} {}",
            b.id,
            b.date.as_deref().unwrap_or("-"),
            amount_text(b.amount),
            l.id,
            l.date.as_deref().unwrap_or("-"),
            amount_text(l.amount),
            p.confidence.to_string(),
            status,
        );
    }

    let unmatched_bank: Vec<_> = session.unmatched_bank().collect();
    println!("unmatched bank ({})", unmatched_bank.len());
    for t in unmatched_bank {
        println!(
            "  {:<14} {:<10} {:>12}  {}",
            t.id,
            t.date.as_deref().unwrap_or("-"),
            amount_text(t.amount),
            t.description,
        );
    }

    let unmatched_ledger: Vec<_> = session.unmatched_ledger().collect();
    println!("unmatched ledger ({})", unmatched_ledger.len());
    for e in unmatched_ledger {
        println!(
            "  {:<14} {:<10} {:>12}  {}",
            e.id,
            e.date.as_deref().unwrap_or("-"),
            amount_text(e.amount),
            e.description,
        );
    }
}

fn amount_text(amount: Option<Decimal>) -> String {
    amount.map(|a| a.to_string()).unwrap_or_else(|| "-".into())
}

/// Summary lines to stderr.
fn print_summary(session: &ReconciliationSession) {
    for doc in &session.documents {
        match &doc.error_message {
            Some(msg) => eprintln!("document {} ({}): failed: {msg}", doc.id, doc.file_name),
            None if !doc.parse_errors.is_empty() => eprintln!(
                "document {} ({}): {} parse errors",
                doc.id,
                doc.file_name,
                doc.parse_errors.len()
            ),
            None => {}
        }
    }

    let s = &session.summary;
    eprintln!(
        "{}: {} bank, {} ledger: {} matched ({} with discrepancies), {} unmatched bank ({}), {} unmatched ledger ({})",
        session.meta.name,
        s.total_bank_transactions,
        s.total_ledger_entries,
        s.matched_pairs_count,
        s.discrepancies_count,
        s.unmatched_bank_items_count,
        s.total_unmatched_bank_value,
        s.unmatched_ledger_items_count,
        s.total_unmatched_ledger_value,
    );
}

fn check_strict(session: &ReconciliationSession) -> Result<(), CliError> {
    let failed = session.failed_documents().count();
    if failed > 0 {
        return Err(CliError::new(
            EXIT_RECON_DOCUMENT_FAILED,
            format!("{failed} document(s) failed extraction"),
        ));
    }

    let s = &session.summary;
    if s.discrepancies_count > 0 || s.unmatched_bank_items_count > 0 || s.unmatched_ledger_items_count > 0 {
        return Err(CliError::new(
            EXIT_RECON_UNRESOLVED,
            format!(
                "unresolved: {} discrepancies, {} unmatched bank, {} unmatched ledger",
                s.discrepancies_count, s.unmatched_bank_items_count, s.unmatched_ledger_items_count
            ),
        ));
    }

    Ok(())
}
