// ChirpStack client modules
//
// Hand-written client for the ChirpStack (LoRa App Server) REST API.
// One transport serves both the v1 and v2 generations; their request and
// response bodies live in `models::v1` and `models::v2`.

pub mod applications;
pub mod auth;
pub mod client;
pub mod device_profiles;
pub mod devices;
pub mod integrations;
pub mod models;

pub use client::ChirpStackClient;
