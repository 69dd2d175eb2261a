// ── Core identity types ──
//
// Local ids are allocated by the local store; remote ids are opaque
// strings chosen by each network server. DevEUI is normalized once on
// entry so lookups never care about the input format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ── LocalId ─────────────────────────────────────────────────────────

/// Identifier of an entity in the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for LocalId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

// ── RemoteId ────────────────────────────────────────────────────────

/// Identifier a network server assigned (or accepted) for an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RemoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── NetworkId ───────────────────────────────────────────────────────

/// Name of a configured network (the `[networks.<name>]` table key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(String);

impl NetworkId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NetworkId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── DevEui ──────────────────────────────────────────────────────────

/// 64-bit device EUI, normalized to 16 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DevEui(String);

impl DevEui {
    /// Parse a DevEUI from any common format: bare hex, colon- or
    /// dash-separated, any case.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CoreError> {
        let normalized: String = raw
            .as_ref()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        if normalized.len() != 16 || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::validation(format!(
                "invalid DevEUI {:?}: expected 16 hex digits",
                raw.as_ref()
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DevEui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DevEui {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DevEui {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DevEui> for String {
    fn from(eui: DevEui) -> Self {
        eui.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dev_eui_normalizes_separators_and_case() {
        let eui = DevEui::new("00-04-A3-0B-00-1C-05-30").unwrap();
        assert_eq!(eui.as_str(), "0004a30b001c0530");

        let eui: DevEui = "00:04:a3:0b:00:1c:05:30".parse().unwrap();
        assert_eq!(eui.to_string(), "0004a30b001c0530");
    }

    #[test]
    fn dev_eui_rejects_wrong_length_and_non_hex() {
        assert!(DevEui::new("0004a30b001c05").is_err());
        assert!(DevEui::new("0004a30b001c053z").is_err());
    }

    #[test]
    fn dev_eui_deserialization_validates() {
        let ok: DevEui = serde_json::from_str("\"0004A30B001C0530\"").unwrap();
        assert_eq!(ok.as_str(), "0004a30b001c0530");
        assert!(serde_json::from_str::<DevEui>("\"nope\"").is_err());
    }

    #[test]
    fn local_id_from_str() {
        let id: LocalId = " 42 ".parse().unwrap();
        assert_eq!(id, LocalId(42));
    }
}
