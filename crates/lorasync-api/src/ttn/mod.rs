// The Things Network v2 client modules

pub mod applications;
pub mod client;
pub mod devices;
pub mod models;

pub use client::TtnClient;
