//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain      | Description                              |
//! |---------|-------------|------------------------------------------|
//! | 0       | Universal   | Success                                  |
//! | 2       | Universal   | CLI usage error (bad args, missing file) |
//! | 3-4     | Universal   | Input read / input parse failures        |
//! | 60-69   | import      | Statement and code import outcomes       |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use commrecon_recon::ReconError;

// =============================================================================
// Universal (0-4)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, unknown carrier, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Cannot read an input file or write an output file.
pub const EXIT_IO: u8 = 3;

/// Input file could be read but not understood (manifest without headers).
pub const EXIT_PARSE: u8 = 4;

// =============================================================================
// Import (60-69)
// =============================================================================

/// Non-empty statement produced no rows. The file needs a human look:
/// usually a layout change that moved or renamed the column headers.
pub const EXIT_PARSE_EMPTY: u8 = 60;

/// Policy/broker directory could not be loaded.
pub const EXIT_DIRECTORY_UNAVAILABLE: u8 = 61;

/// Ledger open, write or commit failed. The run's transaction is rolled back.
pub const EXIT_LEDGER: u8 = 62;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 63;

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::DirectoryUnavailable(_) | ReconError::MissingColumn { .. } => EXIT_DIRECTORY_UNAVAILABLE,
        ReconError::Ledger(_) => EXIT_LEDGER,
        ReconError::Io(_) => EXIT_IO,
    }
}
