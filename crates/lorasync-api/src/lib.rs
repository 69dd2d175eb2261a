// lorasync-api: Async Rust clients for LoRaWAN network-server APIs
// (ChirpStack v1/v2 and The Things Network v2)

pub mod chirpstack;
pub mod error;
pub mod transport;
pub mod ttn;

pub use chirpstack::ChirpStackClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use ttn::TtnClient;
