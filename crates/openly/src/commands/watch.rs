//! `openly watch`: keep the schedule running and print every refresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::info;

use openly_core::{PollState, PollingCoordinator, Snapshot};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::Setup;
use crate::error::CliError;
use crate::output;

use super::Coordinator;
use super::locks::LockView;

pub async fn handle(
    mut setup: Setup,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(secs) = args.interval {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        setup.config.poll_interval = Duration::from_secs(secs);
    }
    if setup.config.poll_interval.is_zero() {
        return Err(CliError::Validation {
            field: "poll_interval".into(),
            reason: "watch needs a non-zero poll interval".into(),
        });
    }

    let coordinator = PollingCoordinator::connect(&setup.credentials, setup.config)
        .await
        .map_err(|e| CliError::from(e).with_profile(&setup.profile_name))?;
    info!(
        interval_secs = coordinator.config().poll_interval.as_secs(),
        "watching for updates (ctrl-c to stop)"
    );

    let color = output::should_color(&global.color);
    let json = matches!(
        global.output,
        OutputFormat::Json | OutputFormat::JsonCompact
    );
    let quiet = global.quiet;

    print_cycle(&coordinator, &coordinator.snapshot(), json, color, quiet);

    let printer = coordinator.clone();
    let listener = coordinator.on_snapshot_updated(move |snapshot: Arc<Snapshot>| {
        print_cycle(&printer, &snapshot, json, color, quiet);
    });

    let mut state = coordinator.state();
    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            changed = state.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = state.borrow_and_update().clone();
                if let PollState::Halted { reason } = current {
                    break Err(CliError::PollingHalted { reason });
                }
            }
        }
    };

    coordinator.shutdown().await;
    let _ = listener.await;
    outcome.map_err(|e| e.with_profile(&setup.profile_name))
}

fn print_cycle(coordinator: &Coordinator, snapshot: &Snapshot, json: bool, color: bool, quiet: bool) {
    let views: Vec<LockView> = coordinator
        .locks()
        .iter()
        .map(LockView::from_controller)
        .collect();

    let out = if json {
        serde_json::to_string(&views).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    } else {
        let stamp = snapshot.fetched_at.map_or_else(
            || Local::now().format("%H:%M:%S").to_string(),
            |t| t.with_timezone(&Local).format("%H:%M:%S").to_string(),
        );
        let mut lines = vec![format!(
            "[{stamp}] cycle {}: {} hub(s), {} lock(s)",
            snapshot.cycle,
            snapshot.hubs().len(),
            views.len()
        )];
        lines.extend(views.iter().map(|v| {
            format!(
                "  {:<24} {:<10} {}",
                v.label(),
                output::status_label(v.status(), color),
                output::battery_label(v.battery(), color)
            )
        }));
        lines.join("\n")
    };
    output::print_output(&out, quiet);
}
