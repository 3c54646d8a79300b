//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use openly_core::Device;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::Coordinator;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "Hub")]
    hub: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Battery")]
    battery: String,
    #[tabled(rename = "Product")]
    product: String,
}

impl DeviceRow {
    pub(crate) fn new(d: &Device, color: bool) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.display_name().to_owned(),
            dtype: d.device_type().to_owned(),
            hub: d.hub_id.to_string(),
            status: d
                .lock_status()
                .map_or_else(|| "-".into(), |s| output::status_label(s, color)),
            battery: output::battery_label(d.battery, color),
            product: match (&d.manufacturer, &d.product_name) {
                (Some(m), Some(p)) => format!("{m} {p}"),
                (Some(v), None) | (None, Some(v)) => v.clone(),
                (None, None) => String::new(),
            },
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    coordinator: &Coordinator,
    args: &DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        DevicesCommand::List { locks_only } => {
            let snapshot = coordinator.snapshot();
            let devices: Vec<Arc<Device>> = snapshot
                .devices()
                .iter()
                .filter(|d| !locks_only || d.is_lock())
                .cloned()
                .collect();
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
