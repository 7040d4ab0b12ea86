//! Client configuration and presence checks
//!
//! Five values are always required (consumer key/secret, short code, pass key,
//! callback URL) and are checked when the client is built. The initiator and
//! result URLs are only needed by business-initiated operations, so they are
//! checked when one of those operations runs.

use std::time::Duration;

use common::Secret;

use crate::environment::{Environment, Hosts};
use crate::error::{Error, Result};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for one `Mpesa` client.
#[derive(Debug, Clone)]
pub struct MpesaConfig {
    pub consumer_key: String,
    pub consumer_secret: Secret<String>,
    pub short_code: String,
    pub pass_key: Secret<String>,
    pub callback_url: String,
    pub initiator_name: Option<String>,
    pub security_credential: Option<Secret<String>>,
    pub queue_timeout_url: Option<String>,
    pub result_url: Option<String>,
    pub confirmation_url: Option<String>,
    pub validation_url: Option<String>,
    pub environment: Environment,
    pub hosts: Hosts,
    pub timeout: Duration,
}

impl Default for MpesaConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: Secret::default(),
            short_code: String::new(),
            pass_key: Secret::default(),
            callback_url: String::new(),
            initiator_name: None,
            security_credential: None,
            queue_timeout_url: None,
            result_url: None,
            confirmation_url: None,
            validation_url: None,
            environment: Environment::default(),
            hosts: Hosts::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Initiator settings borrowed from the config, all present.
#[derive(Debug)]
pub(crate) struct InitiatorFields<'a> {
    pub name: &'a str,
    pub security_credential: &'a str,
    pub queue_timeout_url: &'a str,
    pub result_url: &'a str,
}

impl MpesaConfig {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        short_code: impl Into<String>,
        pass_key: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: Secret::new(consumer_secret.into()),
            short_code: short_code.into(),
            pass_key: Secret::new(pass_key.into()),
            callback_url: callback_url.into(),
            ..Self::default()
        }
    }

    /// Initiator name and encrypted security credential for B2C, B2B,
    /// reversal and account balance.
    pub fn with_initiator(
        mut self,
        name: impl Into<String>,
        security_credential: impl Into<String>,
    ) -> Self {
        self.initiator_name = Some(name.into());
        self.security_credential = Some(Secret::new(security_credential.into()));
        self
    }

    /// Where Daraja posts asynchronous results and queue timeouts.
    pub fn with_result_urls(
        mut self,
        queue_timeout_url: impl Into<String>,
        result_url: impl Into<String>,
    ) -> Self {
        self.queue_timeout_url = Some(queue_timeout_url.into());
        self.result_url = Some(result_url.into());
        self
    }

    /// Confirmation and validation URLs registered for C2B.
    pub fn with_c2b_urls(
        mut self,
        confirmation_url: impl Into<String>,
        validation_url: impl Into<String>,
    ) -> Self {
        self.confirmation_url = Some(confirmation_url.into());
        self.validation_url = Some(validation_url.into());
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_hosts(mut self, hosts: Hosts) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that every always-required value is present.
    ///
    /// Lists all missing fields in one error.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.consumer_key.trim().is_empty() {
            missing.push("consumer_key");
        }
        if self.consumer_secret.is_blank() {
            missing.push("consumer_secret");
        }
        if self.short_code.trim().is_empty() {
            missing.push("short_code");
        }
        if self.pass_key.is_blank() {
            missing.push("pass_key");
        }
        if self.callback_url.trim().is_empty() {
            missing.push("callback_url");
        }
        if !missing.is_empty() {
            return Err(Error::Configuration(format!(
                "missing required Mpesa credentials: {}",
                missing.join(", ")
            )));
        }

        if self.timeout.is_zero() {
            return Err(Error::Configuration(
                "timeout must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Initiator settings for business-initiated operations.
    pub(crate) fn initiator_fields(&self) -> Result<InitiatorFields<'_>> {
        let name = present(self.initiator_name.as_deref());
        let credential = present(self.security_credential.as_ref().map(|s| s.expose().as_str()));
        let queue_timeout_url = present(self.queue_timeout_url.as_deref());
        let result_url = present(self.result_url.as_deref());

        match (name, credential, queue_timeout_url, result_url) {
            (Some(name), Some(security_credential), Some(queue_timeout_url), Some(result_url)) => {
                Ok(InitiatorFields {
                    name,
                    security_credential,
                    queue_timeout_url,
                    result_url,
                })
            }
            _ => {
                let missing: Vec<&str> = [
                    ("initiator_name", name.is_none()),
                    ("security_credential", credential.is_none()),
                    ("queue_timeout_url", queue_timeout_url.is_none()),
                    ("result_url", result_url.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(field, _)| field)
                .collect();
                Err(Error::Validation(format!(
                    "operation requires configured {}",
                    missing.join(", ")
                )))
            }
        }
    }

    /// C2B confirmation and validation URLs.
    pub(crate) fn c2b_urls(&self) -> Result<(&str, &str)> {
        match (
            present(self.confirmation_url.as_deref()),
            present(self.validation_url.as_deref()),
        ) {
            (Some(confirmation), Some(validation)) => Ok((confirmation, validation)),
            _ => Err(Error::Validation(
                "URL registration requires configured confirmation_url and validation_url".into(),
            )),
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> MpesaConfig {
        MpesaConfig::new(
            "consumer-key",
            "consumer-secret",
            "174379",
            "bfb279f9aa9bdbcf158e97dd71a467cd2e0c893059b10f78e6b72ada1ed2c919",
            "https://example.com/callback",
        )
    }

    #[test]
    fn complete_config_validates() {
        let config = complete();
        assert!(config.validate().is_ok());
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn missing_pass_key_is_configuration_error() {
        let mut config = complete();
        config.pass_key = Secret::default();
        match config.validate() {
            Err(Error::Configuration(msg)) => {
                assert_eq!(msg, "missing required Mpesa credentials: pass_key");
            }
            other => panic!("expected Configuration, got {other:?}"),
        }
    }

    #[test]
    fn all_missing_fields_listed_in_order() {
        let err = MpesaConfig::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: missing required Mpesa credentials: consumer_key, consumer_secret, short_code, pass_key, callback_url"
        );
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = complete().with_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = complete().with_initiator("testapi", "encrypted-credential");
        let debug = format!("{config:?}");
        assert!(!debug.contains("consumer-secret"), "got: {debug}");
        assert!(!debug.contains("bfb279f9"), "got: {debug}");
        assert!(!debug.contains("encrypted-credential"), "got: {debug}");
        assert!(debug.contains("consumer-key"));
    }

    #[test]
    fn initiator_fields_require_all_four() {
        let config = complete().with_initiator("testapi", "cred");
        match config.initiator_fields() {
            Err(Error::Validation(msg)) => {
                assert!(msg.contains("queue_timeout_url"), "got: {msg}");
                assert!(msg.contains("result_url"), "got: {msg}");
                assert!(!msg.contains("initiator_name"), "got: {msg}");
            }
            other => panic!("expected Validation, got {other:?}"),
        }

        let config = config.with_result_urls("https://example.com/t", "https://example.com/r");
        let fields = config.initiator_fields().unwrap();
        assert_eq!(fields.name, "testapi");
        assert_eq!(fields.security_credential, "cred");
    }

    #[test]
    fn c2b_urls_required_for_registration() {
        assert!(complete().c2b_urls().is_err());
        let config = complete().with_c2b_urls("https://example.com/c", "https://example.com/v");
        assert_eq!(
            config.c2b_urls().unwrap(),
            ("https://example.com/c", "https://example.com/v")
        );
    }
}
