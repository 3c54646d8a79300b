//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use openly_config::ConfigError;
use openly_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the keyless cloud: {reason}")]
    #[diagnostic(
        code(openly::connection_failed),
        help(
            "Check your network connection and the api_url / login_url settings.\n\
             Try: openly hubs list -v"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Error communicating with API: {message}")]
    #[diagnostic(
        code(openly::api_error),
        help("The cloud returned an unexpected response. Retry shortly.")
    )]
    Api { message: String },

    #[error("No hubs found for this account")]
    #[diagnostic(
        code(openly::no_hubs),
        help("Make sure the account has at least one hub registered in the Rently app.")
    )]
    NoHubs,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(openly::auth_failed),
        help(
            "Verify your email and password.\n\
             Run: openly config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(openly::no_credentials),
        help(
            "Configure credentials with: openly config init\n\
             Or set OPENLY_EMAIL and OPENLY_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(openly::not_found),
        help("Run: openly {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Lock '{device_id}' is {status}")]
    #[diagnostic(
        code(openly::invalid_transition),
        help("A jammed lock only clears from the cloud side. Check the door, then retry.")
    )]
    InvalidTransition { device_id: String, status: String },

    #[error("Command to '{device_id}' failed: {message}")]
    #[diagnostic(code(openly::command_failed))]
    CommandFailed { device_id: String, message: String },

    #[error("Lock '{device_id}' did not settle within {seconds}s (last status: {status})")]
    #[diagnostic(
        code(openly::not_settled),
        help("The command was accepted. Check again with: openly locks refresh {device_id}")
    )]
    NotSettled {
        device_id: String,
        seconds: u64,
        status: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(openly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(openly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: openly config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(openly::no_config),
        help(
            "Create one with: openly config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(openly::config))]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(openly::timeout),
        help("Increase timeout with --timeout or set refresh_timeout in your profile.")
    )]
    Timeout { seconds: u64 },

    #[error("Polling halted: {reason}")]
    #[diagnostic(
        code(openly::polling_halted),
        help("Credentials were rejected mid-session. Re-run after updating them.")
    )]
    PollingHalted { reason: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(openly::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(openly::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::PollingHalted { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } | Self::NoHubs => exit_code::NOT_FOUND,
            Self::InvalidTransition { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } | Self::NotSettled { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the active profile name to an authentication failure.
    pub fn with_profile(self, profile_name: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: profile_name.into(),
                message,
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthFailed { message } => CliError::AuthFailed {
                profile: "default".into(),
                message,
            },

            CoreError::CannotConnect { reason } => CliError::ConnectionFailed { reason },

            CoreError::TransientFetch { message } => CliError::Api { message },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NoHubsFound => CliError::NoHubs,

            CoreError::PollingHalted => CliError::PollingHalted {
                reason: "authentication was rejected".into(),
            },

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "lock".into(),
                identifier,
                list_command: "locks list".into(),
            },

            CoreError::InvalidTransition { device_id, status } => CliError::InvalidTransition {
                device_id,
                status: status.to_string(),
            },

            CoreError::CommandFailed { device_id, message } => {
                CliError::CommandFailed { device_id, message }
            }

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other),
        }
    }
}
