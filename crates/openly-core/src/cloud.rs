// ── Cloud capability ──
//
// Everything the coordinator needs from the keyless cloud. Production code
// uses `openly_api::RentlyClient`; tests substitute an in-memory fake.

use std::future::Future;

use openly_api::{DeviceRecord, HubRecord, HubsResponse, RentlyClient};
use secrecy::SecretString;

/// Authenticated calls against the keyless cloud.
///
/// Implementations classify their own failures into `openly_api::Error`;
/// the coordinator maps those into [`CoreError`](crate::CoreError).
pub trait CloudClient: Send + Sync + 'static {
    /// Exchange credentials for a session.
    fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<(), openly_api::Error>> + Send;

    fn list_hubs(&self) -> impl Future<Output = Result<HubsResponse, openly_api::Error>> + Send;

    fn get_hub(
        &self,
        hub_id: &str,
    ) -> impl Future<Output = Result<HubRecord, openly_api::Error>> + Send;

    fn list_devices(
        &self,
        hub_id: &str,
    ) -> impl Future<Output = Result<Vec<DeviceRecord>, openly_api::Error>> + Send;

    /// `Ok(None)` when the cloud has no such device.
    fn get_device(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, openly_api::Error>> + Send;

    /// Push the record's desired status to the cloud.
    fn update_device_status(
        &self,
        device: &DeviceRecord,
    ) -> impl Future<Output = Result<(), openly_api::Error>> + Send;
}

impl CloudClient for RentlyClient {
    fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<(), openly_api::Error>> + Send {
        RentlyClient::login(self, email, password)
    }

    fn list_hubs(&self) -> impl Future<Output = Result<HubsResponse, openly_api::Error>> + Send {
        RentlyClient::list_hubs(self)
    }

    fn get_hub(
        &self,
        hub_id: &str,
    ) -> impl Future<Output = Result<HubRecord, openly_api::Error>> + Send {
        RentlyClient::get_hub(self, hub_id)
    }

    fn list_devices(
        &self,
        hub_id: &str,
    ) -> impl Future<Output = Result<Vec<DeviceRecord>, openly_api::Error>> + Send {
        RentlyClient::list_devices(self, hub_id)
    }

    fn get_device(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, openly_api::Error>> + Send {
        RentlyClient::get_device(self, device_id)
    }

    fn update_device_status(
        &self,
        device: &DeviceRecord,
    ) -> impl Future<Output = Result<(), openly_api::Error>> + Send {
        RentlyClient::update_device_status(self, device)
    }
}
