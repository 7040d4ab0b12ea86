//! Client-credentials token exchange
//!
//! Daraja issues access tokens from `GET {base}/oauth/v1/generate` with the
//! consumer key and secret sent as HTTP Basic credentials. The token host is
//! the same host the payment call will go to, so callers pass the base URL
//! for the active environment.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::constants::{GRANT_TYPE, OAUTH_PATH};
use crate::error::{Error, Result};

/// Access token issued by the token endpoint.
///
/// `expires_in` is informational only. Daraja sends it as a string of
/// seconds ("3599"); the cache never consults it.
#[derive(Debug)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<String>,
}

/// Wire shape of the token response. Both fields are optional here so a
/// missing token surfaces as `Error::MissingToken` rather than a parse error.
#[derive(Deserialize)]
struct RawTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
}

/// Standard Base64 of `key:secret`, the value after `Basic ` in the header.
pub fn basic_credentials(consumer_key: &str, consumer_secret: &str) -> String {
    STANDARD.encode(format!("{consumer_key}:{consumer_secret}"))
}

/// Exchange the consumer key and secret for an access token.
///
/// Every call issues a request; caching lives in `TokenCache`.
pub async fn fetch_token(
    client: &reqwest::Client,
    base_url: &str,
    consumer_key: &str,
    consumer_secret: &str,
) -> Result<TokenResponse> {
    let url = format!(
        "{}{OAUTH_PATH}?grant_type={GRANT_TYPE}",
        base_url.trim_end_matches('/')
    );
    debug!(url = %url, "requesting access token");

    let response = client
        .get(&url)
        .header(
            AUTHORIZATION,
            format!("Basic {}", basic_credentials(consumer_key, consumer_secret)),
        )
        .send()
        .await
        .map_err(|e| {
            warn!(error = %e, "token request failed");
            Error::Http(format!("token request failed: {e}"))
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        warn!(status = status.as_u16(), "token endpoint rejected credentials");
        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    let raw = response
        .json::<RawTokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))?;

    let access_token = raw
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or(Error::MissingToken)?;
    let expires_in = raw.expires_in.map(|v| match v {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    });

    info!(expires_in = ?expires_in, "access token issued");
    Ok(TokenResponse {
        access_token,
        expires_in,
    })
}
