//! Hub command handlers.

use std::sync::Arc;

use tabled::Tabled;

use openly_core::{Device, Hub, Snapshot};

use crate::cli::{GlobalOpts, HubsArgs, HubsCommand};
use crate::error::CliError;
use crate::output;

use super::Coordinator;
use super::devices::DeviceRow;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct HubRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Devices")]
    devices: usize,
    #[tabled(rename = "Locks")]
    locks: usize,
}

impl HubRow {
    fn new(hub: &Hub, snapshot: &Snapshot) -> Self {
        Self {
            id: hub.id.to_string(),
            name: hub.display_name().to_owned(),
            devices: hub.device_ids.len(),
            locks: snapshot
                .devices_for(hub.id.as_str())
                .iter()
                .filter(|d| d.is_lock())
                .count(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    coordinator: &Coordinator,
    args: HubsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        HubsCommand::List => {
            let snapshot = coordinator.snapshot();
            let hubs: Vec<Arc<Hub>> = snapshot.hubs().to_vec();
            let out = output::render_list(
                &global.output,
                &hubs,
                |h| HubRow::new(h, &snapshot),
                |h| h.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        HubsCommand::Devices { hub } => {
            let controller = coordinator.hub(&hub).ok_or_else(|| CliError::NotFound {
                resource_type: "hub".into(),
                identifier: hub.clone(),
                list_command: "hubs list".into(),
            })?;
            let devices: Vec<Device> = controller.list_devices().await?;
            let out = output::render_list(
                &global.output,
                &devices,
                |d| DeviceRow::new(d, color),
                |d| d.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
