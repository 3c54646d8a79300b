// ── Lock state types ──

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Local lock status.
///
/// `None` is the sentinel before the first successful read and the value
/// for any mode string the cloud sends that is not recognised. `Locking`
/// and `Unlocking` are only ever set locally, by a command.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LockStatus {
    #[strum(to_string = "locked", serialize = "lock")]
    Locked,
    Locking,
    #[strum(to_string = "unlocked", serialize = "unlock")]
    Unlocked,
    Unlocking,
    Jammed,
    #[default]
    None,
}

impl LockStatus {
    /// Parse a remote mode string. Missing or unknown modes map to `None`.
    pub fn from_mode(mode: Option<&str>) -> Self {
        mode.and_then(|m| m.trim().parse().ok()).unwrap_or_default()
    }

    pub fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }

    pub fn is_locking(self) -> bool {
        matches!(self, Self::Locking)
    }

    pub fn is_unlocking(self) -> bool {
        matches!(self, Self::Unlocking)
    }

    pub fn is_jammed(self) -> bool {
        matches!(self, Self::Jammed)
    }

    /// Whether a command is in flight.
    pub fn is_transitioning(self) -> bool {
        matches!(self, Self::Locking | Self::Unlocking)
    }
}

/// A lock/unlock command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LockCommand {
    Lock,
    Unlock,
}

impl LockCommand {
    /// Mode string sent to the cloud.
    pub fn mode(self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Unlock => "unlock",
        }
    }

    /// Optimistic status entered as soon as the command is issued.
    pub fn transient_status(self) -> LockStatus {
        match self {
            Self::Lock => LockStatus::Locking,
            Self::Unlock => LockStatus::Unlocking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_parse_case_insensitively() {
        assert_eq!(LockStatus::from_mode(Some("LOCKED")), LockStatus::Locked);
        assert_eq!(LockStatus::from_mode(Some("Unlocked")), LockStatus::Unlocked);
        assert_eq!(LockStatus::from_mode(Some("jammed")), LockStatus::Jammed);
    }

    #[test]
    fn command_spellings_are_accepted() {
        assert_eq!(LockStatus::from_mode(Some("lock")), LockStatus::Locked);
        assert_eq!(LockStatus::from_mode(Some("unlock")), LockStatus::Unlocked);
    }

    #[test]
    fn missing_or_unknown_mode_is_none() {
        assert_eq!(LockStatus::from_mode(None), LockStatus::None);
        assert_eq!(LockStatus::from_mode(Some("ajar")), LockStatus::None);
        assert_eq!(LockStatus::from_mode(Some("")), LockStatus::None);
    }

    #[test]
    fn display_uses_canonical_form() {
        assert_eq!(LockStatus::Locked.to_string(), "locked");
        assert_eq!(LockStatus::Unlocking.as_ref(), "unlocking");
        assert_eq!(LockStatus::None.to_string(), "none");
    }

    #[test]
    fn derived_flags_follow_status() {
        assert!(LockStatus::Locking.is_locking());
        assert!(!LockStatus::Locking.is_locked());
        assert!(LockStatus::Unlocking.is_transitioning());
        assert!(!LockStatus::Jammed.is_transitioning());
    }

    #[test]
    fn commands_map_to_transient_states() {
        assert_eq!(LockCommand::Lock.mode(), "lock");
        assert_eq!(LockCommand::Unlock.transient_status(), LockStatus::Unlocking);
        assert_eq!(LockCommand::Unlock.to_string(), "unlock");
    }
}
