//! Daraja host and OAuth endpoint constants

/// Production API host
pub const PRODUCTION_BASE_URL: &str = "https://api.safaricom.co.ke";

/// Sandbox API host
pub const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";

/// Token generation path, relative to the environment's base URL
pub const OAUTH_PATH: &str = "/oauth/v1/generate";

/// Grant type for the consumer key/secret exchange
pub const GRANT_TYPE: &str = "client_credentials";
