//! Environment selection (Production vs Sandbox)
//!
//! The active environment only decides which base host a call goes to. It is
//! read on every dispatch, token exchange included, so a switch takes effect on
//! the next call and leaves any cached token untouched.

use std::fmt;
use std::str::FromStr;

use daraja_auth::{PRODUCTION_BASE_URL, SANDBOX_BASE_URL};
use serde::Deserialize;

/// Target Daraja environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "Production",
            Environment::Sandbox => "Sandbox",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "sandbox" => Ok(Environment::Sandbox),
            other => Err(format!(
                "unknown environment {other:?}, expected \"production\" or \"sandbox\""
            )),
        }
    }
}

/// Outcome of `Mpesa::set_environment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentChange {
    /// The requested environment was already active; nothing changed.
    AlreadySet(Environment),
    Switched { from: Environment, to: Environment },
}

/// Base URLs for each environment.
///
/// Defaults to Safaricom's hosts. Overriding them points the client at a
/// proxy or a local mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hosts {
    pub production: String,
    pub sandbox: String,
}

impl Default for Hosts {
    fn default() -> Self {
        Self {
            production: PRODUCTION_BASE_URL.to_string(),
            sandbox: SANDBOX_BASE_URL.to_string(),
        }
    }
}

impl Hosts {
    /// Base URL for `environment`, without a trailing slash.
    pub fn base_url(&self, environment: Environment) -> &str {
        let url = match environment {
            Environment::Production => &self.production,
            Environment::Sandbox => &self.sandbox,
        };
        url.trim_end_matches('/')
    }
}
