// ── API-to-domain type conversions ──
//
// Bridges raw `openly_api` records into `openly_core::model` types. Parsing
// never fails on a single field: unknown modes become `LockStatus::None`
// and out-of-range battery readings become unknown.

use openly_api::{DeviceRecord, HubRecord};

use crate::model::{Device, DeviceId, DeviceKind, Hub, HubId, LockStatus};

// ── Helpers ────────────────────────────────────────────────────────

/// Clamp a raw battery reading to a percentage, dropping impossible values.
pub(crate) fn parse_battery(raw: Option<i64>) -> Option<u8> {
    raw.and_then(|b| u8::try_from(b).ok()).filter(|b| *b <= 100)
}

/// Lock status carried by a record, `None` for non-lock devices.
pub(crate) fn lock_status(record: &DeviceRecord) -> Option<LockStatus> {
    record
        .is_lock()
        .then(|| LockStatus::from_mode(record.status.mode.as_deref()))
}

// ── Device ─────────────────────────────────────────────────────────

/// Build a typed device from a raw record listed under `hub_id`.
pub fn device_from_record(record: &DeviceRecord, hub_id: HubId) -> Device {
    let kind = match lock_status(record) {
        Some(status) => DeviceKind::Lock { status },
        None => DeviceKind::Other {
            kind: record.kind.clone(),
        },
    };

    Device {
        id: DeviceId::from(record.id.as_str()),
        hub_id,
        kind,
        name: record.name.clone(),
        manufacturer: record.manufacturer.clone(),
        product_name: record.product_name.clone(),
        battery: parse_battery(record.status.battery),
    }
}

// ── Hub ────────────────────────────────────────────────────────────

/// Build a hub from its record. Returns `None` when the record has no id.
pub fn hub_from_record(record: HubRecord, device_ids: Vec<DeviceId>) -> Option<Hub> {
    let id = record.id.filter(|id| !id.is_empty())?;
    Some(Hub {
        id: HubId::from(id),
        name: record.name,
        device_ids,
        metadata: record.extra,
    })
}
