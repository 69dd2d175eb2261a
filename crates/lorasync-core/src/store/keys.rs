// ── Protocol data keys ──
//
// `"<prefix>:<localId>/<dataName>"`. The prefix namespaces by entity
// kind, the local id by entity, so unrelated entities never collide.

use std::fmt;

use serde::Serialize;
use strum::Display;

use crate::model::LocalId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EntityKind {
    Company,
    Application,
    DeviceProfile,
    Device,
}

impl EntityKind {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Company => "co",
            Self::Application => "app",
            Self::DeviceProfile => "dp",
            Self::Device => "dev",
        }
    }

    /// Data name under which the remote twin's id is stored.
    pub fn remote_id_name(self) -> &'static str {
        match self {
            Self::Company => "coNwkId",
            Self::Application => "appNwkId",
            Self::DeviceProfile => "dpNwkId",
            Self::Device => "devNwkId",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataKey(String);

impl DataKey {
    pub fn new(kind: EntityKind, local_id: LocalId, data_name: &str) -> Self {
        Self(format!("{}:{local_id}/{data_name}", kind.prefix()))
    }

    /// Key holding the remote id of an entity's twin on a network.
    pub fn remote_id(kind: EntityKind, local_id: LocalId) -> Self {
        Self::new(kind, local_id, kind.remote_id_name())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format_is_prefix_id_name() {
        assert_eq!(
            DataKey::remote_id(EntityKind::Application, LocalId(42)).as_str(),
            "app:42/appNwkId"
        );
        assert_eq!(
            DataKey::remote_id(EntityKind::DeviceProfile, LocalId(7)).as_str(),
            "dp:7/dpNwkId"
        );
        assert_eq!(
            DataKey::new(EntityKind::Device, LocalId(3), "devNwkId").to_string(),
            "dev:3/devNwkId"
        );
    }

    #[test]
    fn kinds_do_not_collide() {
        let app = DataKey::remote_id(EntityKind::Application, LocalId(1));
        let dev = DataKey::remote_id(EntityKind::Device, LocalId(1));
        let co = DataKey::remote_id(EntityKind::Company, LocalId(1));
        assert_ne!(app, dev);
        assert_ne!(app, co);
    }
}
