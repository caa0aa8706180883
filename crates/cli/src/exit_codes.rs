//! CLI Exit Code Registry
//!
//! Single source of truth for `skylog` exit codes. Scripts that batch
//! nights together rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (unspecified)                      |
//! | 2    | Usage error (bad arguments, unreadable config)   |
//! | 3    | Config failed to parse or validate               |
//! | 4    | Run log yields no data parts                     |
//! | 5    | No accepted weather observation to assign from   |
//! | 6    | Run log unreadable or malformed                  |
//! | 7    | Output files could not be written                |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map the error to it in `run.rs`

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing config file.
pub const EXIT_USAGE: u8 = 2;

/// Config TOML did not parse or failed validation (also: unknown compare mode).
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// No data parts could be recovered from the run log.
pub const EXIT_NO_DATA_PARTS: u8 = 4;

/// No weather observation survived classification and filtering.
pub const EXIT_NO_OBSERVATIONS: u8 = 5;

/// Run log could not be read, is malformed XML, or its file name lacks date tokens.
pub const EXIT_INPUT: u8 = 6;

/// Per-part files or the timeline dump could not be written.
pub const EXIT_OUTPUT: u8 = 7;
