// ── Domain model ──
//
// Typed representations of the hub → device tree as the coordinator
// publishes it. Raw cloud payloads live in `openly_api::models`; the
// mapping between the two is in `crate::convert`.

pub mod device;
pub mod hub;
pub mod id;
pub mod lock;

// ── Re-exports ──────────────────────────────────────────────────────

pub use device::{Device, DeviceKind};
pub use hub::Hub;
pub use id::{DeviceId, HubId};
pub use lock::{LockCommand, LockStatus};
