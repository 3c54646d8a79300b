// ── Device domain types ──

use serde::{Deserialize, Serialize};

use super::id::{DeviceId, HubId};
use super::lock::LockStatus;

/// Kind-specific payload of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceKind {
    Lock { status: LockStatus },
    /// Any non-lock device, carrying the raw `deviceType` string.
    Other { kind: String },
}

/// One device attached to a hub, as of a single poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub hub_id: HubId,
    pub kind: DeviceKind,
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    pub product_name: Option<String>,
    /// Battery percentage, 0-100.
    pub battery: Option<u8>,
}

impl Device {
    pub fn is_lock(&self) -> bool {
        matches!(self.kind, DeviceKind::Lock { .. })
    }

    /// Lock status, or `None` for non-lock devices.
    pub fn lock_status(&self) -> Option<LockStatus> {
        match self.kind {
            DeviceKind::Lock { status } => Some(status),
            DeviceKind::Other { .. } => None,
        }
    }

    /// The raw kind discriminator.
    pub fn device_type(&self) -> &str {
        match &self.kind {
            DeviceKind::Lock { .. } => "lock",
            DeviceKind::Other { kind } => kind,
        }
    }

    /// Name for display, falling back to the product name, then the id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.product_name.as_deref())
            .unwrap_or(self.id.as_str())
    }
}
