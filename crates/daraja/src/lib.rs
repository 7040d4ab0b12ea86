//! Safaricom M-Pesa Daraja client
//!
//! Wraps the Daraja REST API: STK push, B2C, C2B simulate and URL
//! registration, B2B, reversal, and account balance. Each call is one POST
//! with a bearer token obtained (once) from the OAuth endpoint of the active
//! environment.
//!
//! ```no_run
//! # async fn run() -> daraja::Result<()> {
//! use daraja::{Mpesa, MpesaConfig};
//!
//! let mpesa = Mpesa::new(MpesaConfig::new(
//!     "consumer-key",
//!     "consumer-secret",
//!     "174379",
//!     "pass-key",
//!     "https://example.com/callback",
//! ))?;
//! mpesa.sandbox().await;
//! let response = mpesa.stk_push("254708374149", 1).await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod operation;
pub mod security;

pub use client::{Mpesa, StkPushRequest};
pub use config::MpesaConfig;
pub use environment::{Environment, EnvironmentChange, Hosts};
pub use error::{Error, Result};
pub use operation::{
    AccountBalance, B2b, B2c, C2bRegisterUrl, C2bSimulate, Operation, OperationKind, Reversal,
    StkPush,
};
pub use security::{Timestamp, password};
