pub mod client;
pub mod wire;

pub use client::WifiLocationClient;
pub use wire::{Coordinates, GeolocationRequest, GeolocationResponse, WifiAccessPoint};
