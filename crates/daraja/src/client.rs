//! Daraja client: session state plus the single dispatcher
//!
//! `Mpesa` owns everything shared across calls: the validated config, the
//! cached access token, and the active environment. Every operation goes
//! through `dispatch`:
//! 1. Presence-check the payload (no I/O on failure)
//! 2. Resolve the base URL from the current environment
//! 3. `ensure_token` against that host (single flight, cached after first use)
//! 4. Build the body with a fresh timestamp and POST it with the bearer token
//! 5. Return the upstream JSON unchanged, or the error
//!
//! The per-kind helpers (`stk_push`, `b2c`, ...) only fill payloads from the
//! config and the caller's arguments.

use common::Secret;
use daraja_auth::{TokenCache, TokenResponse, fetch_token};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::config::MpesaConfig;
use crate::environment::{Environment, EnvironmentChange};
use crate::error::{Error, Result};
use crate::metrics;
use crate::operation::{
    AccountBalance, B2b, B2c, C2bRegisterUrl, C2bSimulate, CUSTOMER_PAYBILL_ONLINE,
    MSISDN_IDENTIFIER, Operation, RESPONSE_TYPE_COMPLETED, Reversal, SHORTCODE_IDENTIFIER,
    StkPush,
};
use crate::security::Timestamp;

/// STK push request with the optional fields the short helper defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StkPushRequest {
    pub phone_number: String,
    pub amount: u64,
    pub account_reference: String,
    pub transaction_description: String,
    pub transaction_type: String,
}

impl StkPushRequest {
    pub fn new(phone_number: impl Into<String>, amount: u64) -> Self {
        Self {
            phone_number: phone_number.into(),
            amount,
            account_reference: "TestRef".into(),
            transaction_description: "Test Payment".into(),
            transaction_type: CUSTOMER_PAYBILL_ONLINE.into(),
        }
    }

    pub fn account_reference(mut self, reference: impl Into<String>) -> Self {
        self.account_reference = reference.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.transaction_description = description.into();
        self
    }

    /// e.g. `CustomerBuyGoodsOnline` for till numbers.
    pub fn transaction_type(mut self, transaction_type: impl Into<String>) -> Self {
        self.transaction_type = transaction_type.into();
        self
    }
}

/// M-Pesa Daraja client. Share it behind an `Arc`; all methods take `&self`.
pub struct Mpesa {
    config: MpesaConfig,
    environment: RwLock<Environment>,
    tokens: TokenCache,
    http: reqwest::Client,
}

impl Mpesa {
    /// Validate `config` and build the client. No network I/O happens here.
    pub fn new(config: MpesaConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        info!(
            environment = %config.environment,
            short_code = %config.short_code,
            "Daraja client configured; call sandbox() or production() to switch"
        );

        Ok(Self {
            environment: RwLock::new(config.environment),
            config,
            tokens: TokenCache::new(),
            http,
        })
    }

    pub fn config(&self) -> &MpesaConfig {
        &self.config
    }

    pub async fn environment(&self) -> Environment {
        *self.environment.read().await
    }

    /// Switch the environment used by subsequent calls.
    ///
    /// The cached token is kept as is.
    pub async fn set_environment(&self, environment: Environment) -> EnvironmentChange {
        let mut current = self.environment.write().await;
        if *current == environment {
            info!(%environment, "Daraja environment is already set");
            return EnvironmentChange::AlreadySet(environment);
        }
        let from = *current;
        *current = environment;
        info!(%from, to = %environment, "Daraja environment switched");
        EnvironmentChange::Switched {
            from,
            to: environment,
        }
    }

    pub async fn sandbox(&self) -> EnvironmentChange {
        self.set_environment(Environment::Sandbox).await
    }

    pub async fn production(&self) -> EnvironmentChange {
        self.set_environment(Environment::Production).await
    }

    /// Run a fresh token exchange and overwrite the cached token.
    ///
    /// Unlike the implicit path used by operations, this never short-circuits.
    pub async fn authenticate(&self) -> Result<Secret<String>> {
        let base_url = self.base_url().await;
        let token = self
            .tokens
            .authenticate(|| self.exchange(&base_url))
            .await?;
        Ok(token)
    }

    /// Cached token, if any, without network I/O.
    pub async fn cached_token(&self) -> Option<Secret<String>> {
        self.tokens.cached().await
    }

    async fn ensure_token(&self, base_url: &str) -> Result<Secret<String>> {
        let token = self.tokens.ensure_token(|| self.exchange(base_url)).await?;
        Ok(token)
    }

    async fn exchange(&self, base_url: &str) -> daraja_auth::Result<TokenResponse> {
        let result = fetch_token(
            &self.http,
            base_url,
            &self.config.consumer_key,
            self.config.consumer_secret.expose(),
        )
        .await;
        metrics::record_token_exchange(result.is_ok());
        result
    }

    async fn base_url(&self) -> String {
        let environment = self.environment().await;
        self.config.hosts.base_url(environment).to_string()
    }

    /// Send `operation` with a timestamp taken now.
    pub async fn dispatch(&self, operation: Operation) -> Result<Value> {
        self.dispatch_at(&operation, &Timestamp::now()).await
    }

    /// Send `operation` using the given timestamp for derived fields.
    #[instrument(skip_all, fields(operation = %operation.kind()))]
    pub async fn dispatch_at(&self, operation: &Operation, timestamp: &Timestamp) -> Result<Value> {
        let result = self.send(operation, timestamp).await;
        if let Err(e) = &result {
            error!(error = %e, "Daraja request failed");
        }
        metrics::record_request(operation.kind().name(), metrics::outcome(&result));
        result
    }

    async fn send(&self, operation: &Operation, timestamp: &Timestamp) -> Result<Value> {
        operation.validate()?;

        let environment = self.environment().await;
        let base_url = self.config.hosts.base_url(environment).to_string();
        let token = self.ensure_token(&base_url).await?;

        let path = operation.kind().path();
        let url = format!("{base_url}{path}");
        debug!(%environment, path, "sending request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token.expose())
            .json(&operation.request_body(timestamp))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, timeout = e.is_timeout(), "request did not complete");
                Error::Transport(format!("request to {path} failed: {e}"))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("reading response body: {e}")))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body, "upstream rejected request");
            return Err(Error::Remote {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "request accepted");
        serde_json::from_str(&body)
            .map_err(|e| Error::InvalidResponse(format!("response is not JSON: {e}")))
    }

    /// STK push with the default account reference and description.
    pub async fn stk_push(&self, phone_number: &str, amount: u64) -> Result<Value> {
        self.stk_push_with(StkPushRequest::new(phone_number, amount))
            .await
    }

    pub async fn stk_push_with(&self, request: StkPushRequest) -> Result<Value> {
        self.dispatch(
            StkPush {
                phone_number: request.phone_number,
                amount: request.amount,
                account_reference: request.account_reference,
                transaction_description: request.transaction_description,
                short_code: self.config.short_code.clone(),
                pass_key: self.config.pass_key.expose().clone(),
                callback_url: self.config.callback_url.clone(),
                transaction_type: request.transaction_type,
            }
            .into(),
        )
        .await
    }

    /// Business payment from the configured short code to `phone_number`.
    pub async fn b2c(&self, phone_number: &str, amount: u64) -> Result<Value> {
        let initiator = self.config.initiator_fields()?;
        let operation = B2c {
            initiator_name: initiator.name.to_string(),
            security_credential: initiator.security_credential.to_string(),
            command_id: "BusinessPayment".into(),
            amount,
            party_a: self.config.short_code.clone(),
            party_b: phone_number.to_string(),
            remarks: "Salary Payment".into(),
            queue_timeout_url: initiator.queue_timeout_url.to_string(),
            result_url: initiator.result_url.to_string(),
            occasion: None,
        };
        self.dispatch(operation.into()).await
    }

    /// Simulated customer paybill payment (sandbox).
    pub async fn c2b(&self, phone_number: &str, amount: u64, bill_ref_number: &str) -> Result<Value> {
        let operation = C2bSimulate {
            short_code: self.config.short_code.clone(),
            command_id: CUSTOMER_PAYBILL_ONLINE.into(),
            amount,
            msisdn: phone_number.to_string(),
            bill_ref_number: bill_ref_number.to_string(),
            pass_key: self.config.pass_key.expose().clone(),
        };
        self.dispatch(operation.into()).await
    }

    /// Register the configured confirmation and validation URLs.
    pub async fn register_c2b_urls(&self) -> Result<Value> {
        let (confirmation_url, validation_url) = self.config.c2b_urls()?;
        let operation = C2bRegisterUrl {
            short_code: self.config.short_code.clone(),
            response_type: RESPONSE_TYPE_COMPLETED.into(),
            confirmation_url: confirmation_url.to_string(),
            validation_url: validation_url.to_string(),
        };
        self.dispatch(operation.into()).await
    }

    /// Reverse `transaction_id`, crediting `phone_number`.
    pub async fn reversal(
        &self,
        phone_number: &str,
        amount: u64,
        transaction_id: &str,
    ) -> Result<Value> {
        let initiator = self.config.initiator_fields()?;
        let operation = Reversal {
            initiator_name: initiator.name.to_string(),
            security_credential: initiator.security_credential.to_string(),
            command_id: "TransactionReversal".into(),
            transaction_id: transaction_id.to_string(),
            amount,
            receiver_party: phone_number.to_string(),
            receiver_identifier_type: MSISDN_IDENTIFIER.into(),
            remarks: "Reversal Test".into(),
            queue_timeout_url: initiator.queue_timeout_url.to_string(),
            result_url: initiator.result_url.to_string(),
            occasion: None,
        };
        self.dispatch(operation.into()).await
    }

    /// Balance of the configured short code. The figures arrive on the result URL.
    pub async fn account_balance(&self) -> Result<Value> {
        let initiator = self.config.initiator_fields()?;
        let operation = AccountBalance {
            initiator_name: initiator.name.to_string(),
            security_credential: initiator.security_credential.to_string(),
            command_id: "AccountBalance".into(),
            party_a: self.config.short_code.clone(),
            identifier_type: SHORTCODE_IDENTIFIER.into(),
            remarks: "Balance Inquiry".into(),
            queue_timeout_url: initiator.queue_timeout_url.to_string(),
            result_url: initiator.result_url.to_string(),
        };
        self.dispatch(operation.into()).await
    }

    /// Transfer from the configured short code to another business.
    pub async fn b2b(&self, amount: u64, party_b: &str, account_reference: &str) -> Result<Value> {
        let initiator = self.config.initiator_fields()?;
        let operation = B2b {
            initiator_name: initiator.name.to_string(),
            security_credential: initiator.security_credential.to_string(),
            command_id: "BusinessToBusinessTransfer".into(),
            sender_identifier_type: SHORTCODE_IDENTIFIER.into(),
            receiver_identifier_type: SHORTCODE_IDENTIFIER.into(),
            amount,
            party_a: self.config.short_code.clone(),
            party_b: party_b.to_string(),
            account_reference: account_reference.to_string(),
            remarks: "B2B Payment".into(),
            queue_timeout_url: initiator.queue_timeout_url.to_string(),
            result_url: initiator.result_url.to_string(),
        };
        self.dispatch(operation.into()).await
    }
}
