//! Command dispatch: bridges CLI args -> coordinator calls -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod hubs;
pub mod locks;
pub mod watch;

use openly_core::{PollingCoordinator, RentlyClient};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Production coordinator type used by every handler.
pub type Coordinator = PollingCoordinator<RentlyClient>;

/// Dispatch a one-shot command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Hubs(args) => hubs::handle(coordinator, args, global).await,
        Command::Devices(args) => devices::handle(coordinator, &args, global),
        Command::Locks(args) => locks::handle(coordinator, args, global).await,
        // Watch, Config and Completions are handled before dispatch
        Command::Watch(_) | Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
