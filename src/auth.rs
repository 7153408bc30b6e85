//! Password-grant authentication against the identity endpoint.

use crate::error::{ApiError, Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tracing::{error, info, instrument};

/// A bearer token presented on every API call.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange a username and password for a bearer credential.
///
/// Any non-success status is fatal: there is nothing the pipeline can do
/// without a credential.
#[instrument(level = "info", skip(http, password))]
pub async fn authenticate(
    http: &Client,
    auth_url: &str,
    username: &str,
    password: &str,
) -> Result<Credential> {
    let form = [
        ("grant_type", "password"),
        ("username", username),
        ("password", password),
    ];
    let response = http
        .post(auth_url)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&form)
        .send()
        .await
        .map_err(|e| Error::Authentication(e.into()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::Authentication(e.into()))?;
    if !status.is_success() {
        error!(status = status.as_u16(), "Identity endpoint rejected credentials");
        return Err(Error::Authentication(ApiError::Status {
            status: status.as_u16(),
            body,
        }));
    }

    let token: TokenResponse =
        serde_json::from_str(&body).map_err(|e| Error::Authentication(e.into()))?;
    info!("Obtained bearer credential");
    Ok(Credential(token.access_token))
}
