// Keyless cloud HTTP client
//
// Wraps `reqwest::Client` with bearer-token handling, URL construction and
// status classification. Every call returns decoded payloads; HTTP status
// codes never reach the caller except inside `Error::Api`.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{Credentials, TokenResponse};
use crate::error::Error;
use crate::models::{DeviceList, DeviceRecord, HubRecord, HubsResponse};
use crate::transport::TransportConfig;

/// Production API root.
pub const DEFAULT_API_URL: &str = "https://app2.keyless.rocks/api";

/// Production OAuth token endpoint.
pub const DEFAULT_LOGIN_URL: &str = "https://remotapp.rently.com/oauth/token";

/// Raw HTTP client for the keyless cloud.
///
/// Holds the bearer token obtained by [`login`](Self::login). Calls are
/// stateless otherwise, so one client can be shared by every controller.
pub struct RentlyClient {
    http: reqwest::Client,
    api_url: Url,
    login_url: Url,
    timeout_secs: u64,
    token: RwLock<Option<SecretString>>,
}

impl RentlyClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(api_url: Url, login_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            api_url,
            login_url,
            timeout_secs: transport.timeout.as_secs(),
            token: RwLock::new(None),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`. `timeout` is the
    /// request timeout `http` was built with; it is only reported in errors.
    pub fn with_client(http: reqwest::Client, api_url: Url, login_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            api_url,
            login_url,
            timeout_secs: timeout.as_secs(),
            token: RwLock::new(None),
        }
    }

    /// The API root URL.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Whether a bearer token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Exchange email/password for a bearer token.
    ///
    /// Empty fields fail with [`Error::MissingParameters`] before any
    /// request is sent. A 400/401/403 from the token endpoint is
    /// [`Error::Authentication`]; any other failure status is [`Error::Api`].
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), Error> {
        Credentials::new(email, password.clone()).validate()?;

        debug!("logging in at {}", self.login_url);

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let resp = self
            .http
            .post(self.login_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }
        let resp = Self::check_status(resp).await?;

        let token: TokenResponse = self.decode(resp).await?;
        let access_token = token.access_token.ok_or_else(|| Error::Authentication {
            message: "login response carried no access token".into(),
        })?;

        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            Some(SecretString::from(access_token));
        debug!("login successful");
        Ok(())
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /hubs`
    pub async fn list_hubs(&self) -> Result<HubsResponse, Error> {
        let url = self.url("hubs")?;
        self.get(url).await
    }

    /// `GET /hubs/{id}`
    pub async fn get_hub(&self, hub_id: &str) -> Result<HubRecord, Error> {
        let url = self.url(&format!("hubs/{hub_id}"))?;
        self.get(url).await
    }

    /// `GET /hubs/{id}/devices`
    pub async fn list_devices(&self, hub_id: &str) -> Result<Vec<DeviceRecord>, Error> {
        let url = self.url(&format!("hubs/{hub_id}/devices"))?;
        let list: DeviceList = self.get(url).await?;
        Ok(list.into())
    }

    /// `GET /devices/{id}` -- `None` when the cloud has no such device.
    pub async fn get_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, Error> {
        let url = self.url(&format!("devices/{device_id}"))?;
        match self.get::<Option<DeviceRecord>>(url).await {
            Ok(device) => Ok(device),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `PUT /devices/{id}` with the record's desired mode as a command.
    pub async fn update_device_status(&self, device: &DeviceRecord) -> Result<(), Error> {
        let mode = device
            .status
            .mode
            .as_deref()
            .ok_or(Error::MissingParameters { field: "mode" })?;
        let url = self.url(&format!("devices/{}", device.id))?;
        let body = json!({ "commands": { "mode": mode } });

        debug!("PUT {} mode={}", url, mode);

        let builder = self.authorized(self.http.put(url))?;
        let resp = builder
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check_status(resp).await?;
        Ok(())
    }

    // ── Request helpers ─────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.api_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        let token = guard.as_ref().ok_or(Error::NotAuthenticated)?;
        Ok(builder.bearer_auth(token.expose_secret()))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let builder = self.authorized(self.http.get(url))?;
        let resp = builder.send().await.map_err(|e| self.transport_error(e))?;
        let resp = Self::check_status(resp).await?;
        self.decode(resp).await
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Authentication {
                message: format!("request rejected (HTTP {status})"),
            }),
            _ => Err(Error::Api {
                status: status.as_u16(),
                message: body,
            }),
        }
    }

    async fn decode<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        trace!(len = body.len(), "decoding response body");
        serde_json::from_str(&body).map_err(|e| Error::InvalidResponse {
            message: e.to_string(),
            body,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }
}
