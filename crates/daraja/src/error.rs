//! Error taxonomy for Daraja operations
//!
//! Nothing here is recovered internally: each failure is logged where it
//! happens and returned to the caller as-is.

/// Errors from client construction and operation dispatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required credential was missing when the client was built.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("authentication failed: {0}")]
    Authentication(#[from] daraja_auth::Error),

    /// A required operation field was empty. Raised before any network I/O.
    #[error("validation error: {0}")]
    Validation(String),

    /// Network failure or request timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Remote { status: u16, body: String },

    /// Upstream answered 2xx with a body that is not JSON.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

/// Result alias for Daraja operations.
pub type Result<T> = std::result::Result<T, Error>;
