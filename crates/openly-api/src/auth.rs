use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::Error;

/// Account credentials for the keyless cloud.
///
/// The password never leaves a [`SecretString`] except when the login
/// request body is built.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }

    /// Reject empty fields before any network call is made.
    pub fn validate(&self) -> Result<(), Error> {
        if self.email.trim().is_empty() {
            return Err(Error::MissingParameters { field: "email" });
        }
        if self.password.expose_secret().is_empty() {
            return Err(Error::MissingParameters { field: "password" });
        }
        Ok(())
    }
}

/// OAuth token response returned by the login endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
}
