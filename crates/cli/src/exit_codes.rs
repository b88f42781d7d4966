//! CLI Exit Code Registry
//!
//! Single source of truth for `linkaudit` exit codes. Scripts that run the
//! snapshot nightly branch on these, so a code never changes meaning.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (unspecified)                      |
//! | 2    | Usage error (bad arguments)                      |
//! | 3    | Database file not found or not openable          |
//! | 4    | Invalid review config (parse or validation)      |
//! | 5    | A family's base collection could not be fetched  |
//! | 6    | Output could not be written                      |

use linkaudit_engine::ReviewError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, conflicting options.
pub const EXIT_USAGE: u8 = 2;

/// `--db` does not exist or SQLite refused to open it.
pub const EXIT_DB_NOT_FOUND: u8 = 3;

/// Review config failed to parse or validate.
pub const EXIT_CONFIG: u8 = 4;

/// Fetching a family's records failed. The run was aborted.
pub const EXIT_FETCH: u8 = 5;

/// Writing the snapshot (or stdout) failed.
pub const EXIT_WRITE: u8 = 6;

/// Map an engine error to its exit code.
pub fn review_exit_code(err: &ReviewError) -> u8 {
    match err {
        ReviewError::ConfigParse(_) | ReviewError::ConfigValidation(_) => EXIT_CONFIG,
        ReviewError::Fetch { .. } => EXIT_FETCH,
        ReviewError::Sink(_) => EXIT_WRITE,
    }
}
