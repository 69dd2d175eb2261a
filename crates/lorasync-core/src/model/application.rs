// ── Application domain type ──

use serde::{Deserialize, Serialize};

/// Canonical application, independent of any network server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub description: Option<String>,
    /// Codec name understood by the network server (e.g. `CUSTOM_JS`).
    pub payload_codec: Option<String>,
    pub payload_decoder: Option<String>,
    pub payload_encoder: Option<String>,
    /// Where uplinks for this application are delivered downstream.
    pub base_url: Option<String>,
    /// Organization the application belongs to on the remote side.
    pub organization_id: Option<String>,
}
