// ── Runtime coordinator configuration ──
//
// These types describe *how* to reach the keyless cloud and how often to
// poll it. They never touch disk: the CLI builds a `CoordinatorConfig`
// from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use openly_api::{TlsMode, TransportConfig};
use url::Url;

/// Default period between scheduled refresh cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default hard bound on one refresh cycle.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Additional CA certificate file.
    CustomCa(PathBuf),
}

/// Configuration for one coordinator instance.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// API root override. `None` uses the production endpoint.
    pub api_url: Option<Url>,
    /// OAuth token endpoint override. `None` uses the production endpoint.
    pub login_url: Option<Url>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Period of the scheduled refresh. `Duration::ZERO` disables the schedule.
    pub poll_interval: Duration,
    /// Hard bound on a whole refresh cycle.
    pub refresh_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            login_url: None,
            tls: TlsVerification::default(),
            request_timeout: DEFAULT_REFRESH_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }
}

impl CoordinatorConfig {
    /// Resolve the API root, falling back to the production endpoint.
    pub fn api_url(&self) -> Result<Url, url::ParseError> {
        match &self.api_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(openly_api::DEFAULT_API_URL),
        }
    }

    /// Resolve the login endpoint, falling back to the production endpoint.
    pub fn login_url(&self) -> Result<Url, url::ParseError> {
        match &self.login_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(openly_api::DEFAULT_LOGIN_URL),
        }
    }

    /// Build a [`TransportConfig`] for the HTTP client.
    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            },
            timeout: self.request_timeout,
        }
    }
}
