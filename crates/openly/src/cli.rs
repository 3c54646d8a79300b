//! Clap derive structures for the `openly` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// openly -- control Rently keyless smart locks from the command line
#[derive(Debug, Parser)]
#[command(
    name = "openly",
    version,
    about = "Control Rently keyless smart locks from the command line",
    long_about = "Polls the Rently keyless cloud for hubs and the devices attached to them,\n\
        and sends lock/unlock commands to smart locks.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "OPENLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Account email (overrides profile)
    #[arg(long, short = 'e', env = "OPENLY_EMAIL", global = true)]
    pub email: Option<String>,

    /// Account password (overrides profile and keyring)
    #[arg(long, env = "OPENLY_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, env = "OPENLY_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Login endpoint URL (overrides profile)
    #[arg(long, env = "OPENLY_LOGIN_URL", global = true)]
    pub login_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "OPENLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "OPENLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List hubs and the devices attached to them
    #[command(alias = "h")]
    Hubs(HubsArgs),

    /// List every device across all hubs
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Inspect and operate smart locks
    #[command(alias = "l")]
    Locks(LocksArgs),

    /// Poll continuously and print each refresh
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Hubs ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HubsArgs {
    #[command(subcommand)]
    pub command: HubsCommand,
}

#[derive(Debug, Subcommand)]
pub enum HubsCommand {
    /// List hubs
    #[command(alias = "ls")]
    List,

    /// Fetch a hub's devices directly from the cloud
    Devices {
        /// Hub ID
        hub: String,
    },
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List all devices
    #[command(alias = "ls")]
    List {
        /// Only show lock-kind devices
        #[arg(long)]
        locks_only: bool,
    },
}

// ── Locks ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LocksArgs {
    #[command(subcommand)]
    pub command: LocksCommand,
}

#[derive(Debug, Subcommand)]
pub enum LocksCommand {
    /// List locks with their status
    #[command(alias = "ls")]
    List,

    /// Show one lock
    Get {
        /// Lock device ID
        lock: String,
    },

    /// Re-read one lock's status from the cloud
    Refresh {
        /// Lock device ID
        lock: String,
    },

    /// Lock a door
    Lock(LockActionArgs),

    /// Unlock a door
    Unlock(LockActionArgs),
}

#[derive(Debug, Args)]
pub struct LockActionArgs {
    /// Lock device ID
    pub lock: String,

    /// Wait until the lock reports a settled status
    #[arg(long, short = 'w')]
    pub wait: bool,

    /// Maximum seconds to wait with --wait
    #[arg(long, default_value = "60", requires = "wait")]
    pub wait_timeout: u64,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between refreshes (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the resolved configuration
    Show,

    /// List profile names
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store a profile's password in the system keyring
    SetPassword,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
