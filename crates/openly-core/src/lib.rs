// openly-core: Polling coordinator and lock state machine between openly-api and consumers (CLI).

pub mod cloud;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod hub;
pub mod lock;
pub mod model;
pub mod store;
pub mod stream;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cloud::CloudClient;
pub use config::{CoordinatorConfig, TlsVerification};
pub use coordinator::{PollState, PollingCoordinator};
pub use error::CoreError;
pub use hub::HubController;
pub use lock::LockController;
pub use store::Snapshot;
pub use stream::SnapshotStream;

pub use model::{Device, DeviceId, DeviceKind, Hub, HubId, LockCommand, LockStatus};

// Credentials are owned by the API crate; re-exported so hosts need a
// single dependency.
pub use openly_api::{Credentials, RentlyClient};
