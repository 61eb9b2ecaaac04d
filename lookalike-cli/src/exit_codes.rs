//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

/// General error (catch-all).
pub const GENERAL_ERROR: u8 = 1;

/// Data format error (malformed key, rejected fingerprint).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: u8 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: u8 = 66;

/// Service unavailable (server unreachable, store down, retries exhausted).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const NETWORK_ERROR: u8 = 69;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: u8,
    pub message: String,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify error by inspecting the chain
        let code = if message.contains("Failed to read") {
            INPUT_ERROR
        } else if message.contains("Server unavailable") || message.contains("Request failed") {
            NETWORK_ERROR
        } else if message.contains("Server rejected")
            || message.contains("Malformed key")
            || message.contains("Invalid signature")
            || message.contains("Invalid parameter")
            || message.contains("Validation error")
        {
            DATA_ERROR
        } else {
            GENERAL_ERROR
        };

        Self { code, message }
    }
}
