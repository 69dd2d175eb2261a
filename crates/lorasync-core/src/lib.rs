//! Canonical model, network adapters and synchronization for lorasync.
//!
//! This crate sits between `lorasync-api` (raw wire clients) and the
//! `lorasync` binary:
//!
//! - **[`NetworkProtocol`]** adapters translate the canonical entity
//!   types to and from ChirpStack v1, ChirpStack v2, TTN v2 and the
//!   in-process Generic-IP backend. [`adapter_for`] picks one from a
//!   [`Network`]'s protocol.
//!
//! - **[`SyncEngine`]** pulls remote applications, profiles and devices
//!   into a [`LocalStore`], and pushes locally linked entities back out.
//!   A [`ProtocolDataStore`] holds the local-id → remote-id mapping that
//!   makes both directions idempotent.
//!
//! - **[`UplinkRouter`]** correlates downlink submissions with the
//!   uplink results that answer them, with an enforced timeout, and
//!   forwards everything else through an [`ApplicationDelivery`].
//!
//! - **Normalizers** ([`normalize`]) are pure wire ↔ model translations,
//!   one module per backend generation.

pub mod adapter;
pub mod error;
pub mod model;
pub mod normalize;
pub mod router;
pub mod store;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapter::{
    ChirpStackAdapter, ChirpStackVersion, DeviceContext, IntegrationTarget, IpAdapter,
    NetworkProtocol, Remote, RemoteDevice, TtnAdapter, adapter_for,
};
pub use error::CoreError;
pub use router::{
    ApplicationDelivery, DEFAULT_DOWNLINK_TIMEOUT, UplinkRouter, WebhookDelivery,
    run_downlink_worker,
};
pub use store::{
    DataKey, EntityKind, LocalStore, MemoryStore, ProtocolDataEntry, ProtocolDataStore,
};
pub use sync::{EntityReport, PushOptions, SyncEngine, SyncOutcome, SyncReport};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Application, ApplicationLink, ApplicationRecord, Company, DevEui, Device, DeviceActivation,
    DeviceCredentials, DeviceKeys, DeviceLink, DeviceProfile, DeviceProfileRecord, DeviceRecord,
    Downlink, DownlinkArgs, LocalId, Network, NetworkId, NetworkSettings, ProtocolKind, RemoteId,
    ReportingProtocol, SecurityData, Uplink, UplinkOutcome, UplinkResult,
};
