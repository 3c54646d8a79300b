// openly-api: Async Rust client for the Rently keyless cloud

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::Credentials;
pub use client::{DEFAULT_API_URL, DEFAULT_LOGIN_URL, RentlyClient};
pub use error::Error;
pub use models::{DeviceRecord, DeviceStatusRecord, HubRecord, HubsResponse};
pub use transport::{TlsMode, TransportConfig};
