// In-memory `CloudClient` for coordinator and controller tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use openly_api::{DeviceRecord, HubRecord, HubsResponse};
use secrecy::{ExposeSecret, SecretString};

use crate::cloud::CloudClient;
use crate::model::LockStatus;

#[derive(Debug, Clone, Copy)]
pub(crate) enum FakeError {
    Auth,
    Invalid,
    Server,
}

impl FakeError {
    fn to_api(self) -> openly_api::Error {
        match self {
            Self::Auth => openly_api::Error::Authentication {
                message: "token expired".into(),
            },
            Self::Invalid => openly_api::Error::InvalidResponse {
                message: "expected value at line 1 column 1".into(),
                body: "<html>".into(),
            },
            Self::Server => openly_api::Error::Api {
                status: 500,
                message: "internal error".into(),
            },
        }
    }
}

/// Scripted behaviour for the next `list_hubs` call.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Fail(FakeError),
    Delay(Duration),
}

#[derive(Default)]
struct State {
    hubs: Option<Vec<HubRecord>>,
    devices: HashMap<String, Vec<DeviceRecord>>,
    hub_steps: VecDeque<Step>,
    device_delay: Option<Duration>,
    password: Option<String>,
    login_error: Option<FakeError>,
    update_error: Option<FakeError>,
    updates: Vec<DeviceRecord>,
    login_calls: usize,
    list_hub_calls: usize,
    list_device_calls: usize,
    get_device_calls: usize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeCloud {
    state: Arc<Mutex<State>>,
}

pub(crate) fn hub_record(id: &str) -> HubRecord {
    HubRecord {
        id: Some(id.to_owned()),
        name: Some(format!("Hub {id}")),
        ..HubRecord::default()
    }
}

pub(crate) fn lock_record(id: &str, mode: &str) -> DeviceRecord {
    let mut record = DeviceRecord {
        id: id.to_owned(),
        kind: "lock".into(),
        name: Some(format!("Lock {id}")),
        ..DeviceRecord::default()
    };
    record.set_mode(mode);
    record.status.battery = Some(90);
    record
}

pub(crate) fn other_record(id: &str, kind: &str) -> DeviceRecord {
    DeviceRecord {
        id: id.to_owned(),
        kind: kind.to_owned(),
        ..DeviceRecord::default()
    }
}

impl FakeCloud {
    pub(crate) fn new() -> Self {
        let fake = Self::default();
        fake.lock().hubs = Some(Vec::new());
        fake
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    // ── Scripting ────────────────────────────────────────────────────

    pub(crate) fn with_hub(self, id: &str, devices: Vec<DeviceRecord>) -> Self {
        {
            let mut state = self.lock();
            state.hubs.get_or_insert_with(Vec::new).push(hub_record(id));
            state.devices.insert(id.to_owned(), devices);
        }
        self
    }

    pub(crate) fn with_password(self, password: &str) -> Self {
        self.lock().password = Some(password.to_owned());
        self
    }

    pub(crate) fn set_hubs(&self, hubs: Option<Vec<HubRecord>>) {
        self.lock().hubs = hubs;
    }

    pub(crate) fn remove_device(&self, hub_id: &str, device_id: &str) {
        if let Some(devices) = self.lock().devices.get_mut(hub_id) {
            devices.retain(|d| d.id != device_id);
        }
    }

    pub(crate) fn set_mode(&self, device_id: &str, mode: &str) {
        let mut state = self.lock();
        for device in state.devices.values_mut().flatten() {
            if device.id == device_id {
                device.set_mode(mode);
            }
        }
    }

    pub(crate) fn push_step(&self, step: Step) {
        self.lock().hub_steps.push_back(step);
    }

    pub(crate) fn set_device_delay(&self, delay: Option<Duration>) {
        self.lock().device_delay = delay;
    }

    pub(crate) fn fail_login(&self, error: Option<FakeError>) {
        self.lock().login_error = error;
    }

    pub(crate) fn fail_updates(&self, error: Option<FakeError>) {
        self.lock().update_error = error;
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub(crate) fn login_calls(&self) -> usize {
        self.lock().login_calls
    }

    pub(crate) fn list_hub_calls(&self) -> usize {
        self.lock().list_hub_calls
    }

    pub(crate) fn list_device_calls(&self) -> usize {
        self.lock().list_device_calls
    }

    pub(crate) fn get_device_calls(&self) -> usize {
        self.lock().get_device_calls
    }

    pub(crate) fn updates(&self) -> Vec<DeviceRecord> {
        self.lock().updates.clone()
    }

    fn find_device(&self, device_id: &str) -> Option<DeviceRecord> {
        self.lock()
            .devices
            .values()
            .flatten()
            .find(|d| d.id == device_id)
            .cloned()
    }
}

impl CloudClient for FakeCloud {
    fn login(
        &self,
        _email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<(), openly_api::Error>> + Send {
        let result = {
            let mut state = self.lock();
            state.login_calls += 1;
            match (&state.login_error, &state.password) {
                (Some(e), _) => Err(e.to_api()),
                (None, Some(expected)) if expected != password.expose_secret() => {
                    Err(openly_api::Error::Authentication {
                        message: "invalid_grant".into(),
                    })
                }
                _ => Ok(()),
            }
        };
        async move { result }
    }

    fn list_hubs(&self) -> impl Future<Output = Result<HubsResponse, openly_api::Error>> + Send {
        let (step, hubs) = {
            let mut state = self.lock();
            state.list_hub_calls += 1;
            (state.hub_steps.pop_front(), state.hubs.clone())
        };
        async move {
            match step {
                Some(Step::Fail(e)) => return Err(e.to_api()),
                Some(Step::Delay(d)) => tokio::time::sleep(d).await,
                None => {}
            }
            Ok(HubsResponse { hubs })
        }
    }

    fn get_hub(
        &self,
        hub_id: &str,
    ) -> impl Future<Output = Result<HubRecord, openly_api::Error>> + Send {
        let hub = self
            .lock()
            .hubs
            .iter()
            .flatten()
            .find(|h| h.id.as_deref() == Some(hub_id))
            .cloned();
        async move {
            hub.ok_or(openly_api::Error::Api {
                status: 404,
                message: "hub not found".into(),
            })
        }
    }

    fn list_devices(
        &self,
        hub_id: &str,
    ) -> impl Future<Output = Result<Vec<DeviceRecord>, openly_api::Error>> + Send {
        let (devices, delay) = {
            let mut state = self.lock();
            state.list_device_calls += 1;
            (
                state.devices.get(hub_id).cloned().unwrap_or_default(),
                state.device_delay,
            )
        };
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(devices)
        }
    }

    fn get_device(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, openly_api::Error>> + Send {
        self.lock().get_device_calls += 1;
        let device = self.find_device(device_id);
        async move { Ok(device) }
    }

    fn update_device_status(
        &self,
        device: &DeviceRecord,
    ) -> impl Future<Output = Result<(), openly_api::Error>> + Send {
        let result = {
            let mut state = self.lock();
            state.updates.push(device.clone());
            match state.update_error {
                Some(e) => Err(e.to_api()),
                None => Ok(()),
            }
        };
        if result.is_ok() {
            let settled = LockStatus::from_mode(device.status.mode.as_deref());
            self.set_mode(&device.id, settled.as_ref());
        }
        async move { result }
    }
}
