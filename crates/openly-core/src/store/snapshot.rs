// ── Poll snapshot ──
//
// One `Snapshot` per successful cycle. Built off to the side by a
// `SnapshotBuilder` and swapped in whole, so subscribers never observe a
// partially populated tree.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use openly_api::{DeviceRecord, HubRecord};

use crate::convert::{device_from_record, hub_from_record};
use crate::model::{Device, DeviceId, Hub, HubId};

/// Hubs and devices as of one poll cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Number of the cycle that produced this snapshot. `0` before the
    /// first successful cycle.
    pub cycle: u64,
    pub fetched_at: Option<DateTime<Utc>>,
    hubs: Vec<Arc<Hub>>,
    devices: Vec<Arc<Device>>,
    /// Positions in `devices` of the lock-kind devices.
    locks: Vec<usize>,
    by_id: HashMap<DeviceId, usize>,
}

impl Snapshot {
    /// The placeholder published before the first successful cycle.
    pub fn empty() -> Self {
        Self {
            cycle: 0,
            fetched_at: None,
            hubs: Vec::new(),
            devices: Vec::new(),
            locks: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    /// Hubs in listing order.
    pub fn hubs(&self) -> &[Arc<Hub>] {
        &self.hubs
    }

    /// Every device, hub by hub, in listing order.
    pub fn devices(&self) -> &[Arc<Device>] {
        &self.devices
    }

    /// Lock-kind devices only.
    pub fn locks(&self) -> impl Iterator<Item = &Arc<Device>> + '_ {
        self.locks.iter().filter_map(|&i| self.devices.get(i))
    }

    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    pub fn hub(&self, id: &str) -> Option<&Arc<Hub>> {
        self.hubs.iter().find(|h| h.id.as_str() == id)
    }

    pub fn device(&self, id: &str) -> Option<&Arc<Device>> {
        self.by_id.get(id).and_then(|&i| self.devices.get(i))
    }

    /// Devices attached to one hub.
    pub fn devices_for(&self, hub_id: &str) -> Vec<Arc<Device>> {
        self.devices
            .iter()
            .filter(|d| d.hub_id.as_str() == hub_id)
            .cloned()
            .collect()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// A lock record read during a cycle, handed to the lock table once the
/// cycle has succeeded.
#[derive(Debug, Clone)]
pub(crate) struct LockRead {
    pub record: DeviceRecord,
    pub hub_id: HubId,
}

/// Accumulates one cycle's hubs and devices.
#[derive(Debug, Default)]
pub(crate) struct SnapshotBuilder {
    hubs: Vec<Arc<Hub>>,
    devices: Vec<Arc<Device>>,
    locks: Vec<usize>,
    by_id: HashMap<DeviceId, usize>,
    lock_reads: Vec<LockRead>,
}

impl SnapshotBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a hub and the devices listed under it.
    ///
    /// Returns `false` (adding nothing) when the hub record has no id.
    pub(crate) fn push_hub(&mut self, record: HubRecord, devices: Vec<DeviceRecord>) -> bool {
        let Some(hub_id) = record.id.clone().filter(|id| !id.is_empty()) else {
            return false;
        };
        let hub_id = HubId::from(hub_id);

        let mut device_ids = Vec::with_capacity(devices.len());
        for raw in devices {
            let device = device_from_record(&raw, hub_id.clone());
            device_ids.push(device.id.clone());

            let index = self.devices.len();
            if device.is_lock() {
                self.locks.push(index);
                self.lock_reads.push(LockRead {
                    record: raw,
                    hub_id: hub_id.clone(),
                });
            }
            self.by_id.insert(device.id.clone(), index);
            self.devices.push(Arc::new(device));
        }

        match hub_from_record(record, device_ids) {
            Some(hub) => {
                self.hubs.push(Arc::new(hub));
                true
            }
            None => false,
        }
    }

    pub(crate) fn build(self, cycle: u64, fetched_at: DateTime<Utc>) -> (Snapshot, Vec<LockRead>) {
        let snapshot = Snapshot {
            cycle,
            fetched_at: Some(fetched_at),
            hubs: self.hubs,
            devices: self.devices,
            locks: self.locks,
            by_id: self.by_id,
        };
        (snapshot, self.lock_reads)
    }
}
