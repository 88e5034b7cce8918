//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | recon            | Reconciliation-specific codes            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing config file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (3-9)
// =============================================================================

/// Config does not parse or fails validation.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 3;

/// Run completed but its output could not be produced (serialization, write).
pub const EXIT_RECON_RUNTIME: u8 = 4;

/// `--strict`: discrepancies or unmatched records remain.
pub const EXIT_RECON_UNRESOLVED: u8 = 5;

/// `--strict`: at least one document failed extraction.
pub const EXIT_RECON_DOCUMENT_FAILED: u8 = 6;
