//! Shared helpers for command handlers.

use lorasync_core::{ApplicationRecord, LocalId, LocalStore, MemoryStore};

use crate::error::CliError;

/// Look up a local application by id.
pub async fn require_application(
    store: &MemoryStore,
    id: LocalId,
) -> Result<ApplicationRecord, CliError> {
    store
        .get_application(id)
        .await?
        .ok_or_else(|| CliError::NotFound {
            resource_type: "application".into(),
            identifier: id.to_string(),
            list_command: "apps list".into(),
        })
}

/// Decode a hex payload; whitespace and a leading `0x` are ignored.
pub fn parse_hex(raw: &str) -> Result<Vec<u8>, CliError> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(&cleaned);

    let invalid = |reason: &str| CliError::Validation {
        field: "data".into(),
        reason: reason.into(),
    };
    if digits.len() % 2 != 0 {
        return Err(invalid("hex payload must have an even number of digits"));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| invalid("not a hex string"))
        })
        .collect()
}

/// Print a status line to stderr unless `--quiet`.
pub fn status(quiet: bool, message: &str) {
    if !quiet {
        eprintln!("{message}");
    }
}
