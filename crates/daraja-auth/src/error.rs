//! Error types for OAuth token acquisition

/// Errors from the token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("token response did not contain an access_token")]
    MissingToken,
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
