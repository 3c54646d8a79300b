// ── Hub controller ──
//
// Per-hub handle for reads outside the poll cycle and for forwarding
// device updates. Holds no state of its own beyond the hub id.

use std::sync::Arc;

use openly_api::DeviceRecord;
use tracing::debug;

use crate::cloud::CloudClient;
use crate::convert::{device_from_record, hub_from_record};
use crate::coordinator::PollingCoordinator;
use crate::error::CoreError;
use crate::model::{Device, Hub, HubId};

pub struct HubController<C: CloudClient> {
    coordinator: PollingCoordinator<C>,
    hub_id: HubId,
}

impl<C: CloudClient> Clone for HubController<C> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            hub_id: self.hub_id.clone(),
        }
    }
}

impl<C: CloudClient> HubController<C> {
    pub(crate) fn new(coordinator: PollingCoordinator<C>, hub_id: HubId) -> Self {
        Self {
            coordinator,
            hub_id,
        }
    }

    pub fn hub_id(&self) -> &HubId {
        &self.hub_id
    }

    /// This hub as of the latest snapshot.
    pub fn hub(&self) -> Option<Arc<Hub>> {
        self.coordinator.snapshot().hub(self.hub_id.as_str()).cloned()
    }

    /// This hub's devices as of the latest snapshot.
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.coordinator.snapshot().devices_for(self.hub_id.as_str())
    }

    /// Fetch the hub's device list from the cloud now.
    pub async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        let records = self
            .coordinator
            .cloud()
            .list_devices(self.hub_id.as_str())
            .await?;
        debug!(hub = %self.hub_id, devices = records.len(), "listed hub devices");

        Ok(records
            .iter()
            .map(|r| device_from_record(r, self.hub_id.clone()))
            .collect())
    }

    /// Re-read the hub record and its devices.
    pub async fn refresh(&self) -> Result<(Hub, Vec<Device>), CoreError> {
        let mut record = self.coordinator.cloud().get_hub(self.hub_id.as_str()).await?;
        let devices = self.list_devices().await?;

        if record.id.as_deref().is_none_or(str::is_empty) {
            record.id = Some(self.hub_id.to_string());
        }
        let device_ids = devices.iter().map(|d| d.id.clone()).collect();
        let hub = hub_from_record(record, device_ids).ok_or(CoreError::NoHubsFound)?;
        Ok((hub, devices))
    }

    /// Forward a device's desired state to the cloud. Local state is not
    /// touched.
    pub async fn update_device(&self, device: &DeviceRecord) -> Result<(), CoreError> {
        debug!(hub = %self.hub_id, device = %device.id, "forwarding device update");
        self.coordinator
            .cloud()
            .update_device_status(device)
            .await
            .map_err(|e| CoreError::from_command(&device.id, e))
    }
}
