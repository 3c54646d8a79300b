//! Lock command handlers.

use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use openly_core::{LockController, LockStatus, RentlyClient};

use crate::cli::{GlobalOpts, LockActionArgs, LocksArgs, LocksCommand};
use crate::error::CliError;
use crate::output;

use super::Coordinator;

/// Delay between status reads while waiting for a lock to settle.
const SETTLE_POLL: Duration = Duration::from_secs(2);

// ── View / table row ────────────────────────────────────────────────

/// Serializable view of one lock's locally known state.
#[derive(Debug, Serialize)]
pub(crate) struct LockView {
    id: String,
    hub_id: Option<String>,
    name: Option<String>,
    status: LockStatus,
    battery: Option<u8>,
}

impl LockView {
    pub(crate) fn from_controller(lock: &LockController<RentlyClient>) -> Self {
        let device = lock.device();
        Self {
            id: lock.device_id().to_string(),
            hub_id: lock.hub_id().map(|h| h.to_string()),
            name: device.map(|d| d.display_name().to_owned()),
            status: lock.status(),
            battery: lock.battery_level(),
        }
    }

    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub(crate) fn status(&self) -> LockStatus {
        self.status
    }

    pub(crate) fn battery(&self) -> Option<u8> {
        self.battery
    }
}

#[derive(Tabled)]
struct LockRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Hub")]
    hub: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Battery")]
    battery: String,
}

impl LockRow {
    fn new(v: &LockView, color: bool) -> Self {
        Self {
            id: v.id.clone(),
            name: v.name.clone().unwrap_or_default(),
            hub: v.hub_id.clone().unwrap_or_default(),
            status: output::status_label(v.status, color),
            battery: output::battery_label(v.battery, color),
        }
    }
}

fn detail(v: &LockView, color: bool) -> String {
    [
        format!("ID:      {}", v.id),
        format!("Name:    {}", v.name.as_deref().unwrap_or("-")),
        format!("Hub:     {}", v.hub_id.as_deref().unwrap_or("-")),
        format!("Status:  {}", output::status_label(v.status, color)),
        format!("Battery: {}", output::battery_label(v.battery, color)),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    coordinator: &Coordinator,
    args: LocksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        LocksCommand::List => {
            let views: Vec<LockView> = coordinator
                .locks()
                .iter()
                .map(LockView::from_controller)
                .collect();
            let out = output::render_list(
                &global.output,
                &views,
                |v| LockRow::new(v, color),
                |v| v.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LocksCommand::Get { lock } => {
            let controller = require_lock(coordinator, &lock)?;
            print_lock(&controller, global, color)
        }

        LocksCommand::Refresh { lock } => {
            let controller = coordinator.lock_controller(lock.as_str());
            let status = controller.refresh_status().await?;
            debug!(lock = %lock, %status, "status refreshed");
            print_lock(&controller, global, color)
        }

        LocksCommand::Lock(action) => {
            let controller = require_lock(coordinator, &action.lock)?;
            controller.lock().await?;
            finish_action(&controller, &action, global, color).await
        }

        LocksCommand::Unlock(action) => {
            let controller = require_lock(coordinator, &action.lock)?;
            controller.unlock().await?;
            finish_action(&controller, &action, global, color).await
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn require_lock(
    coordinator: &Coordinator,
    id: &str,
) -> Result<LockController<RentlyClient>, CliError> {
    let controller = coordinator.lock_controller(id);
    if controller.is_available() {
        Ok(controller)
    } else {
        Err(CliError::NotFound {
            resource_type: "lock".into(),
            identifier: id.into(),
            list_command: "locks list".into(),
        })
    }
}

fn print_lock(
    controller: &LockController<RentlyClient>,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let view = LockView::from_controller(controller);
    let out = output::render_single(&global.output, &view, |v| detail(v, color), |v| {
        v.status.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Print the transitional status, or poll until the lock settles.
async fn finish_action(
    controller: &LockController<RentlyClient>,
    action: &LockActionArgs,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    if !action.wait {
        return print_lock(controller, global, color);
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(action.wait_timeout);
    loop {
        tokio::time::sleep(SETTLE_POLL).await;
        let status = controller.refresh_status().await?;
        if !status.is_transitioning() {
            return print_lock(controller, global, color);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(CliError::NotSettled {
                device_id: action.lock.clone(),
                seconds: action.wait_timeout,
                status: status.to_string(),
            });
        }
    }
}
