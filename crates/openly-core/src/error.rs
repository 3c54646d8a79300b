// ── Core error types ──
//
// Coordinator-level errors. Consumers never see HTTP status codes or JSON
// decode failures directly: `From<openly_api::Error>` folds transport-layer
// errors into the polling taxonomy (auth / transient / not found).

use thiserror::Error;

use crate::model::LockStatus;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Setup / credentials ──────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("Cannot connect to the keyless cloud: {reason}")]
    CannotConnect { reason: String },

    // ── Poll cycle ───────────────────────────────────────────────────
    #[error("Error communicating with API: {message}")]
    TransientFetch { message: String },

    #[error("Refresh timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("No hubs found in the hub listing")]
    NoHubsFound,

    #[error("Polling is halted until credentials are re-established")]
    PollingHalted,

    // ── Devices / commands ───────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Lock {device_id} cannot leave {status} by command; wait for the next poll")]
    InvalidTransition {
        device_id: String,
        status: LockStatus,
    },

    #[error("Command to {device_id} failed: {message}")]
    CommandFailed { device_id: String, message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Failures that keep the schedule running with the previous snapshot.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransientFetch { .. } | Self::Timeout { .. } | Self::NoHubsFound
        )
    }

    /// Failures that halt polling until re-authentication.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailed { .. })
    }

    /// Classify an error raised during setup (login or first refresh).
    ///
    /// Missing parameters, unreachable endpoints and 5xx answers become
    /// `CannotConnect`; everything else follows the steady-state mapping.
    pub(crate) fn from_setup(err: openly_api::Error) -> Self {
        match err {
            openly_api::Error::MissingParameters { field } => Self::CannotConnect {
                reason: format!("missing required parameter '{field}'"),
            },
            openly_api::Error::Transport(ref e) if e.is_connect() => Self::CannotConnect {
                reason: e.to_string(),
            },
            openly_api::Error::InvalidUrl(e) => Self::CannotConnect {
                reason: format!("invalid URL: {e}"),
            },
            openly_api::Error::Tls(reason) => Self::CannotConnect { reason },
            openly_api::Error::Api { status, message } if status >= 500 => Self::CannotConnect {
                reason: format!("keyless cloud unavailable (HTTP {status}): {message}"),
            },
            other => Self::from(other),
        }
    }

    /// Classify an error raised by a device update call.
    pub(crate) fn from_command(device_id: &str, err: openly_api::Error) -> Self {
        if err.is_auth_failure() {
            return Self::from(err);
        }
        Self::CommandFailed {
            device_id: device_id.to_owned(),
            message: err.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<openly_api::Error> for CoreError {
    fn from(err: openly_api::Error) -> Self {
        match err {
            openly_api::Error::Authentication { message } => CoreError::AuthFailed { message },
            openly_api::Error::NotAuthenticated => CoreError::AuthFailed {
                message: "no active session".into(),
            },
            openly_api::Error::MissingParameters { field } => CoreError::CannotConnect {
                reason: format!("missing required parameter '{field}'"),
            },
            openly_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            openly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            openly_api::Error::Tls(message) => CoreError::Config { message },
            other @ (openly_api::Error::Transport(_)
            | openly_api::Error::Api { .. }
            | openly_api::Error::InvalidResponse { .. }) => CoreError::TransientFetch {
                message: other.to_string(),
            },
        }
    }
}
