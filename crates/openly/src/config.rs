//! CLI flag overlay on top of `openly_config`.
//!
//! Profiles come from the config file; `GlobalOpts` flags (and their
//! `OPENLY_*` env twins) win over anything the profile says.

use std::time::Duration;

use secrecy::SecretString;

use openly_config::{Config, Profile};
use openly_core::{CoordinatorConfig, Credentials};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything needed to start a coordinator.
pub struct Setup {
    pub profile_name: String,
    pub credentials: Credentials,
    pub config: CoordinatorConfig,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build credentials and coordinator config from the config file,
/// profile, and CLI overrides.
pub fn resolve_setup(global: &GlobalOpts) -> Result<Setup, CliError> {
    let cfg = openly_config::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg, global);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        return Err(profile_not_found(&cfg, profile_name));
    }

    // No profile -- build from CLI flags / env vars alone
    if global.email.is_none() {
        return Err(CliError::NoConfig {
            path: openly_config::config_path().display().to_string(),
        });
    }
    resolve_profile(&Profile::default(), &profile_name, &cfg, global)
}

fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<Setup, CliError> {
    let email = match &global.email {
        Some(email) => email.clone(),
        None => openly_config::resolve_email(profile, profile_name)?,
    };
    let password = match &global.password {
        Some(pw) => SecretString::from(pw.clone()),
        None => openly_config::resolve_password(profile, profile_name)?,
    };

    let mut config = openly_config::profile_to_coordinator_config(profile, &cfg.defaults)?;
    if let Some(raw) = &global.api_url {
        config.api_url = Some(parse_url("api-url", raw)?);
    }
    if let Some(raw) = &global.login_url {
        config.login_url = Some(parse_url("login-url", raw)?);
    }
    if let Some(secs) = global.timeout {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        config.request_timeout = Duration::from_secs(secs);
        config.refresh_timeout = Duration::from_secs(secs);
    }

    Ok(Setup {
        profile_name: profile_name.to_owned(),
        credentials: Credentials::new(email, password),
        config,
    })
}

fn parse_url(field: &str, raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// `ProfileNotFound` listing the configured profile names.
pub fn profile_not_found(cfg: &Config, name: String) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}
