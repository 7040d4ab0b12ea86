//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Secrets (consumer secret, pass key, security credential) are loaded from
//! env vars or `*_file` paths, never stored in the TOML directly.

use common::Secret;
use daraja::{Environment, Hosts, MpesaConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONSUMER_SECRET_ENV: &str = "DARAJA_CONSUMER_SECRET";
pub const PASS_KEY_ENV: &str = "DARAJA_PASS_KEY";
pub const SECURITY_CREDENTIAL_ENV: &str = "DARAJA_SECURITY_CREDENTIAL";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    pub credentials: CredentialsConfig,
    pub business: BusinessConfig,
    #[serde(default)]
    pub initiator: Option<InitiatorConfig>,
    #[serde(default)]
    pub urls: UrlsConfig,
    #[serde(default)]
    pub hosts: Option<HostsConfig>,
}

/// OAuth app credentials
#[derive(Debug, Deserialize)]
pub struct CredentialsConfig {
    pub consumer_key: String,
    #[serde(skip)]
    pub consumer_secret: Option<Secret<String>>,
    #[serde(default)]
    pub consumer_secret_file: Option<PathBuf>,
}

/// Short code and Lipa Na M-Pesa settings
#[derive(Debug, Deserialize)]
pub struct BusinessConfig {
    pub short_code: String,
    pub callback_url: String,
    #[serde(skip)]
    pub pass_key: Option<Secret<String>>,
    #[serde(default)]
    pub pass_key_file: Option<PathBuf>,
}

/// Initiator for B2C, B2B, reversal and balance queries
#[derive(Debug, Deserialize)]
pub struct InitiatorConfig {
    pub name: String,
    #[serde(skip)]
    pub security_credential: Option<Secret<String>>,
    #[serde(default)]
    pub security_credential_file: Option<PathBuf>,
}

/// Callback URLs passed through to Daraja
#[derive(Debug, Default, Deserialize)]
pub struct UrlsConfig {
    pub queue_timeout_url: Option<String>,
    pub result_url: Option<String>,
    pub confirmation_url: Option<String>,
    pub validation_url: Option<String>,
}

/// Base URL overrides (proxies, local mocks)
#[derive(Debug, Deserialize)]
pub struct HostsConfig {
    pub production: String,
    pub sandbox: String,
}

fn default_timeout() -> u64 {
    5
}

impl Config {
    /// Load configuration from a TOML file, then overlay secrets from the
    /// environment or their `*_file` paths.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        for url in [
            Some(&config.business.callback_url),
            config.urls.queue_timeout_url.as_ref(),
            config.urls.result_url.as_ref(),
            config.urls.confirmation_url.as_ref(),
            config.urls.validation_url.as_ref(),
        ]
        .into_iter()
        .flatten()
        {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "callback URLs must start with http:// or https://, got: {url}"
                )));
            }
        }

        config.credentials.consumer_secret = resolve_secret(
            CONSUMER_SECRET_ENV,
            config.credentials.consumer_secret_file.as_deref(),
        )?;
        config.business.pass_key =
            resolve_secret(PASS_KEY_ENV, config.business.pass_key_file.as_deref())?;
        if let Some(initiator) = config.initiator.as_mut() {
            initiator.security_credential = resolve_secret(
                SECURITY_CREDENTIAL_ENV,
                initiator.security_credential_file.as_deref(),
            )?;
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("daraja.toml")
    }

    /// Build the client config. Missing secrets become empty values so the
    /// client's own presence check reports them by name.
    pub fn to_mpesa_config(&self) -> MpesaConfig {
        let mut mpesa = MpesaConfig::new(
            self.credentials.consumer_key.clone(),
            exposed(&self.credentials.consumer_secret),
            self.business.short_code.clone(),
            exposed(&self.business.pass_key),
            self.business.callback_url.clone(),
        )
        .with_environment(self.environment)
        .with_timeout(Duration::from_secs(self.timeout_secs));

        if let Some(initiator) = &self.initiator {
            mpesa = mpesa.with_initiator(
                initiator.name.clone(),
                exposed(&initiator.security_credential),
            );
        }
        mpesa.queue_timeout_url = self.urls.queue_timeout_url.clone();
        mpesa.result_url = self.urls.result_url.clone();
        mpesa.confirmation_url = self.urls.confirmation_url.clone();
        mpesa.validation_url = self.urls.validation_url.clone();

        if let Some(hosts) = &self.hosts {
            mpesa = mpesa.with_hosts(Hosts {
                production: hosts.production.clone(),
                sandbox: hosts.sandbox.clone(),
            });
        }
        mpesa
    }
}

fn exposed(secret: &Option<Secret<String>>) -> String {
    secret
        .as_ref()
        .map(|s| s.expose().clone())
        .unwrap_or_default()
}

/// Env var takes precedence over file. An empty file yields `None`.
fn resolve_secret(env_var: &str, file: Option<&Path>) -> common::Result<Option<Secret<String>>> {
    if let Ok(value) = std::env::var(env_var) {
        return Ok(Some(Secret::new(value)));
    }
    let Some(path) = file else {
        return Ok(None);
    };
    let value = std::fs::read_to_string(path).map_err(|e| {
        common::Error::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let value = value.trim().to_owned();
    if value.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Secret::new(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    unsafe fn clear_secret_env() {
        unsafe {
            remove_env(CONSUMER_SECRET_ENV);
            remove_env(PASS_KEY_ENV);
            remove_env(SECURITY_CREDENTIAL_ENV);
        }
    }

    fn valid_toml() -> &'static str {
        r#"
environment = "sandbox"

[credentials]
consumer_key = "consumer-key"

[business]
short_code = "174379"
callback_url = "https://example.com/callback"

[initiator]
name = "testapi"

[urls]
queue_timeout_url = "https://example.com/timeout"
result_url = "https://example.com/result"
"#
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("daraja.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_secret_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.environment, Environment::Sandbox);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.credentials.consumer_key, "consumer-key");
        assert_eq!(config.business.short_code, "174379");
        assert_eq!(config.initiator.as_ref().unwrap().name, "testapi");
        assert!(config.credentials.consumer_secret.is_none());
        assert!(config.business.pass_key.is_none());
        assert!(config.hosts.is_none());
    }

    #[test]
    fn test_environment_defaults_to_production() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_secret_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[credentials]
consumer_key = "k"

[business]
short_code = "174379"
callback_url = "https://example.com/callback"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert!(config.initiator.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/daraja.toml"));
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(matches!(Config::load(&path), Err(common::Error::Toml(_))));
    }

    #[test]
    fn test_unknown_environment_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, &valid_toml().replace("sandbox", "staging"));
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_secrets_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        unsafe {
            set_env(CONSUMER_SECRET_ENV, "secret-from-env");
            set_env(PASS_KEY_ENV, "passkey-from-env");
            set_env(SECURITY_CREDENTIAL_ENV, "cred-from-env");
        }
        let config = Config::load(&path).unwrap();
        unsafe { clear_secret_env() };

        assert_eq!(
            config.credentials.consumer_secret.as_ref().unwrap().expose(),
            "secret-from-env"
        );
        assert_eq!(
            config.business.pass_key.as_ref().unwrap().expose(),
            "passkey-from-env"
        );
        assert_eq!(
            config
                .initiator
                .as_ref()
                .unwrap()
                .security_credential
                .as_ref()
                .unwrap()
                .expose(),
            "cred-from-env"
        );
    }

    #[test]
    fn test_secret_from_file_and_env_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_secret_env() };
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("consumer_secret");
        std::fs::write(&secret_path, "  secret-from-file\n").unwrap();
        let pass_key_path = dir.path().join("pass_key");
        std::fs::write(&pass_key_path, "passkey-from-file").unwrap();

        let toml = valid_toml()
            .replace(
                "consumer_key = \"consumer-key\"",
                &format!(
                    "consumer_key = \"consumer-key\"\nconsumer_secret_file = {:?}",
                    secret_path.display().to_string()
                ),
            )
            .replace(
                "short_code = \"174379\"",
                &format!(
                    "short_code = \"174379\"\npass_key_file = {:?}",
                    pass_key_path.display().to_string()
                ),
            );
        let path = write_config(&dir, &toml);

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.credentials.consumer_secret.as_ref().unwrap().expose(),
            "secret-from-file"
        );

        unsafe { set_env(CONSUMER_SECRET_ENV, "secret-from-env") };
        let config = Config::load(&path).unwrap();
        unsafe { clear_secret_env() };
        assert_eq!(
            config.credentials.consumer_secret.as_ref().unwrap().expose(),
            "secret-from-env"
        );
        assert_eq!(
            config.business.pass_key.as_ref().unwrap().expose(),
            "passkey-from-file"
        );
    }

    #[test]
    fn test_empty_secret_file_yields_none() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_secret_env() };
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("empty");
        std::fs::write(&secret_path, "   \n").unwrap();

        let result = resolve_secret(CONSUMER_SECRET_ENV, Some(&secret_path)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_nonexistent_secret_file_errors() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_secret_env() };
        let result = resolve_secret(PASS_KEY_ENV, Some(Path::new("/nonexistent/pass_key")));
        match result {
            Err(common::Error::Config(msg)) => assert!(msg.contains("/nonexistent/pass_key")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, &format!("timeout_secs = 0\n{}", valid_toml()));
        match Config::load(&path) {
            Err(common::Error::Config(msg)) => assert!(msg.contains("timeout_secs")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_callback_url_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            &valid_toml().replace("https://example.com/callback", "example.com/callback"),
        );
        assert!(matches!(Config::load(&path), Err(common::Error::Config(_))));
    }

    #[test]
    fn test_to_mpesa_config_carries_settings() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            "{}\n[hosts]\nproduction = \"http://127.0.0.1:1\"\nsandbox = \"http://127.0.0.1:2\"\n",
            valid_toml()
        );
        let path = write_config(&dir, &toml);

        unsafe {
            set_env(CONSUMER_SECRET_ENV, "s");
            set_env(PASS_KEY_ENV, "p");
            set_env(SECURITY_CREDENTIAL_ENV, "c");
        }
        let config = Config::load(&path).unwrap();
        unsafe { clear_secret_env() };

        let mpesa = config.to_mpesa_config();
        assert!(mpesa.validate().is_ok());
        assert_eq!(mpesa.environment, Environment::Sandbox);
        assert_eq!(mpesa.timeout, Duration::from_secs(5));
        assert_eq!(mpesa.initiator_name.as_deref(), Some("testapi"));
        assert_eq!(mpesa.result_url.as_deref(), Some("https://example.com/result"));
        assert_eq!(mpesa.hosts.base_url(Environment::Sandbox), "http://127.0.0.1:2");
    }

    #[test]
    fn test_missing_secrets_surface_in_client_validation() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_secret_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        let mpesa = Config::load(&path).unwrap().to_mpesa_config();
        let err = mpesa.validate().unwrap_err().to_string();
        assert!(err.contains("consumer_secret"), "got: {err}");
        assert!(err.contains("pass_key"), "got: {err}");
    }

    #[test]
    fn test_resolve_path_cli_arg() {
        let path = Config::resolve_path(Some("/custom/daraja.toml"));
        assert_eq!(path, PathBuf::from("/custom/daraja.toml"));
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/daraja.toml") };
        let path = Config::resolve_path(None);
        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(path, PathBuf::from("/env/daraja.toml"));
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("daraja.toml"));
    }
}
