//! CLI Exit Code Registry
//!
//! Single source of truth for `mroute` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success                                               |
//! | 1    | General error (unspecified)                           |
//! | 2    | Usage error (bad arguments, missing input selection)  |
//! | 3    | Cannot read an input file or folder                   |
//! | 4    | Export file empty or without data lines               |
//! | 5    | Export file lacks a required column                   |
//! | 6    | Invalid config file                                   |
//! | 7    | Inconsistent routes found (`--fail-on-inconsistency`) |

use meterroute_io::IoError;
use meterroute_recon::AuditError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// An input path could not be read, or a folder lacks one of the periods.
pub const EXIT_IO: u8 = 3;

/// An export has no header or no data lines.
pub const EXIT_EMPTY_FILE: u8 = 4;

/// No header resolves to the quantity column.
pub const EXIT_MISSING_COLUMN: u8 = 5;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// The comparison tagged at least one route and `--fail-on-inconsistency` is set.
pub const EXIT_INCONSISTENT: u8 = 7;

pub fn audit_exit_code(err: &AuditError) -> u8 {
    match err.root() {
        AuditError::EmptyOrMalformedFile => EXIT_EMPTY_FILE,
        AuditError::MissingRequiredColumn { .. } => EXIT_MISSING_COLUMN,
        AuditError::ConfigParse(_) | AuditError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        AuditError::InPeriod { .. } => EXIT_ERROR,
    }
}

pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. } | IoError::MissingPeriod { .. } => EXIT_IO,
        IoError::NotADirectory(_) => EXIT_USAGE,
    }
}
