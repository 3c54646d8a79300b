// ── Lock table ──
//
// Per-lock mutable state shared by the coordinator and every
// `LockController`. Reads are stamped with a sequence number taken when
// the read *starts*; a read that started before the latest command on a
// lock is dropped for that lock, so an in-flight optimistic status is
// only replaced by data fetched after the command was sent.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use openly_api::DeviceRecord;
use tokio::sync::watch;

use crate::convert::{lock_status, parse_battery};
use crate::error::CoreError;
use crate::model::{DeviceId, HubId, LockCommand, LockStatus};

/// Local state for one lock.
#[derive(Debug, Clone)]
pub(crate) struct LockEntry {
    /// Last record read from the cloud, used as the body of update calls.
    pub record: DeviceRecord,
    pub hub_id: HubId,
    pub status: LockStatus,
    pub battery: Option<u8>,
    /// Read sequence current when the last command was issued.
    pub pending_since: Option<u64>,
    /// Sequence of the read that last updated this entry.
    pub last_read: u64,
}

pub(crate) struct LockTable {
    entries: DashMap<DeviceId, LockEntry>,
    read_seq: AtomicU64,
    /// Bumped on every change to any entry.
    version: watch::Sender<u64>,
}

impl LockTable {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        Self {
            entries: DashMap::new(),
            read_seq: AtomicU64::new(0),
            version,
        }
    }

    // ── Read sequencing ──────────────────────────────────────────────

    /// Stamp a read that is about to start.
    pub(crate) fn begin_read(&self) -> u64 {
        self.read_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Sequence of the most recently started read.
    pub(crate) fn latest_read(&self) -> u64 {
        self.read_seq.load(Ordering::SeqCst)
    }

    /// Apply a record fetched by read `seq`.
    ///
    /// `hub_id` is the hub the record was listed under; `None` keeps the
    /// entry's hub and refuses to create a new entry. Returns `false` when
    /// nothing was applied, including when the read is stale for this lock
    /// (it started before the lock's pending command, or before the read
    /// that last updated it).
    pub(crate) fn apply_read(&self, seq: u64, record: &DeviceRecord, hub_id: Option<HubId>) -> bool {
        let status = lock_status(record).unwrap_or_default();
        let battery = parse_battery(record.status.battery);
        let id = DeviceId::from(record.id.as_str());

        let applied = match self.entries.get_mut(&id) {
            Some(mut entry) => {
                let stale = entry.pending_since.is_some_and(|p| seq <= p) || seq < entry.last_read;
                if !stale {
                    entry.record = record.clone();
                    if let Some(hub_id) = hub_id {
                        entry.hub_id = hub_id;
                    }
                    entry.status = status;
                    entry.battery = battery;
                    entry.pending_since = None;
                    entry.last_read = seq;
                }
                !stale
            }
            None => {
                let Some(hub_id) = hub_id else {
                    return false;
                };
                self.entries.insert(
                    id,
                    LockEntry {
                        record: record.clone(),
                        hub_id,
                        status,
                        battery,
                        pending_since: None,
                        last_read: seq,
                    },
                );
                true
            }
        };

        if applied {
            self.bump_version();
        }
        applied
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Move a lock into the transient state for `command`.
    ///
    /// Returns the record to send, with the command's mode set.
    pub(crate) fn begin_command(
        &self,
        device_id: &str,
        command: LockCommand,
    ) -> Result<DeviceRecord, CoreError> {
        let record = {
            let mut entry =
                self.entries
                    .get_mut(device_id)
                    .ok_or_else(|| CoreError::DeviceNotFound {
                        identifier: device_id.to_owned(),
                    })?;

            if entry.status.is_jammed() {
                return Err(CoreError::InvalidTransition {
                    device_id: device_id.to_owned(),
                    status: entry.status,
                });
            }

            entry.status = command.transient_status();
            entry.pending_since = Some(self.latest_read());

            let mut record = entry.record.clone();
            record.set_mode(command.mode());
            record
        };

        self.bump_version();
        Ok(record)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub(crate) fn get(&self, device_id: &str) -> Option<LockEntry> {
        self.entries.get(device_id).map(|e| e.value().clone())
    }

    pub(crate) fn contains(&self, device_id: &str) -> bool {
        self.entries.contains_key(device_id)
    }

    /// All lock ids, sorted.
    pub(crate) fn ids(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    // ── Removal ──────────────────────────────────────────────────────

    pub(crate) fn remove(&self, device_id: &str) -> bool {
        let removed = self.entries.remove(device_id).is_some();
        if removed {
            self.bump_version();
        }
        removed
    }

    /// Drop every lock not in `listed`.
    pub(crate) fn retain(&self, listed: &HashSet<DeviceId>) {
        let before = self.entries.len();
        self.entries.retain(|id, _| listed.contains(id));
        if self.entries.len() != before {
            self.bump_version();
        }
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
