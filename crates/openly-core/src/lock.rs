// ── Lock controller ──
//
// Per-lock handle implementing the command contract. A command moves the
// lock into `locking`/`unlocking` before the request is sent and returns
// without waiting for the lock to settle; the next read that started
// after the command decides the real status.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cloud::CloudClient;
use crate::coordinator::PollingCoordinator;
use crate::error::CoreError;
use crate::hub::HubController;
use crate::model::{Device, DeviceId, HubId, LockCommand, LockStatus};

pub struct LockController<C: CloudClient> {
    coordinator: PollingCoordinator<C>,
    device_id: DeviceId,
}

impl<C: CloudClient> Clone for LockController<C> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            device_id: self.device_id.clone(),
        }
    }
}

impl<C: CloudClient> LockController<C> {
    pub(crate) fn new(coordinator: PollingCoordinator<C>, device_id: DeviceId) -> Self {
        Self {
            coordinator,
            device_id,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Owning hub, once a poll has listed this lock.
    pub fn hub_id(&self) -> Option<HubId> {
        self.entry_field(|e| e.hub_id.clone())
    }

    /// Effective local status. `None` until a read has populated the lock.
    pub fn status(&self) -> LockStatus {
        self.entry_field(|e| e.status).unwrap_or_default()
    }

    pub fn battery_level(&self) -> Option<u8> {
        self.entry_field(|e| e.battery).flatten()
    }

    /// Whether a read has populated this lock and it is still listed.
    pub fn is_available(&self) -> bool {
        self.coordinator.lock_table().contains(self.device_id.as_str())
    }

    /// This lock as of the latest snapshot.
    pub fn device(&self) -> Option<Arc<Device>> {
        self.coordinator
            .snapshot()
            .device(self.device_id.as_str())
            .cloned()
    }

    // ── Derived flags ────────────────────────────────────────────────

    pub fn is_locked(&self) -> bool {
        self.status().is_locked()
    }

    pub fn is_locking(&self) -> bool {
        self.status().is_locking()
    }

    pub fn is_unlocking(&self) -> bool {
        self.status().is_unlocking()
    }

    pub fn is_jammed(&self) -> bool {
        self.status().is_jammed()
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Fetch this lock's record now and apply it.
    ///
    /// A lock the cloud no longer returns is dropped and reported as
    /// `DeviceNotFound`.
    pub async fn refresh_status(&self) -> Result<LockStatus, CoreError> {
        let id = self.device_id.as_str();
        let locks = self.coordinator.lock_table();
        if !locks.contains(id) {
            return Err(self.not_found());
        }

        let seq = locks.begin_read();
        match self.coordinator.cloud().get_device(id).await? {
            Some(record) if record.is_lock() => {
                if !locks.apply_read(seq, &record, None) {
                    debug!(device = id, "stale read; keeping local status");
                }
                Ok(self.status())
            }
            _ => {
                locks.remove(id);
                warn!(device = id, "lock no longer returned by the cloud");
                Err(self.not_found())
            }
        }
    }

    pub async fn lock(&self) -> Result<(), CoreError> {
        self.send(LockCommand::Lock).await
    }

    pub async fn unlock(&self) -> Result<(), CoreError> {
        self.send(LockCommand::Unlock).await
    }

    async fn send(&self, command: LockCommand) -> Result<(), CoreError> {
        let id = self.device_id.as_str();
        let locks = self.coordinator.lock_table();
        let hub_id = locks
            .get(id)
            .map(|e| e.hub_id)
            .ok_or_else(|| self.not_found())?;
        let record = locks.begin_command(id, command)?;
        info!(device = id, %command, "sending lock command");

        HubController::new(self.coordinator.clone(), hub_id)
            .update_device(&record)
            .await
            .inspect_err(|e| warn!(device = id, %command, error = %e, "lock command failed"))
    }

    fn entry_field<T>(&self, f: impl FnOnce(&crate::store::LockEntry) -> T) -> Option<T> {
        self.coordinator
            .lock_table()
            .get(self.device_id.as_str())
            .as_ref()
            .map(f)
    }

    fn not_found(&self) -> CoreError {
        CoreError::DeviceNotFound {
            identifier: self.device_id.to_string(),
        }
    }
}
