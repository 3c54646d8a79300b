// ── Hub domain type ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::{DeviceId, HubId};

/// A hub and the ids of the devices attached to it, in cloud order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hub {
    pub id: HubId,
    pub name: Option<String>,
    pub device_ids: Vec<DeviceId>,
    /// Remaining fields of the hub record.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Hub {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}
