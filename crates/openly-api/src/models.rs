// Keyless cloud wire types
//
// Raw JSON shapes as the cloud returns them. Fields the core does not
// consume are preserved in `extra` so an update can echo the record back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `GET /hubs`.
///
/// `hubs` stays optional: a body without it is a malformed listing, which
/// the core reports as "no hubs found" rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HubsResponse {
    #[serde(default)]
    pub hubs: Option<Vec<HubRecord>>,
}

/// One hub entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HubRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Device-specific status block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DeviceStatusRecord {
    #[serde(default)]
    pub battery: Option<i64>,
    /// Lock mode (`locked`, `unlocked`, `jammed`, ...) or a commanded mode.
    #[serde(default, alias = "lockStatus", skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One device attached to a hub.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: String,
    #[serde(default, rename = "deviceType", alias = "kind")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub hub_id: Option<String>,
    #[serde(default)]
    pub status: DeviceStatusRecord,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceRecord {
    /// Whether the cloud classifies this device as a lock.
    pub fn is_lock(&self) -> bool {
        self.kind.eq_ignore_ascii_case("lock")
    }

    /// Replace the desired lock mode ahead of an update call.
    pub fn set_mode(&mut self, mode: impl Into<String>) {
        self.status.mode = Some(mode.into());
    }
}

/// `GET /hubs/{id}/devices` is served both bare and wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DeviceList {
    Bare(Vec<DeviceRecord>),
    Wrapped { devices: Vec<DeviceRecord> },
}

impl From<DeviceList> for Vec<DeviceRecord> {
    fn from(list: DeviceList) -> Self {
        match list {
            DeviceList::Bare(devices) | DeviceList::Wrapped { devices } => devices,
        }
    }
}
