//! Daraja OAuth authentication library
//!
//! Exchanges a consumer key/secret pair for a short-lived access token and
//! keeps that token in memory for reuse. This crate has no knowledge of the
//! payment operations themselves; the `daraja` crate drives it.
//!
//! Token flow:
//! 1. First operation calls `TokenCache::ensure_token()`
//! 2. Cache is empty, so `token::fetch_token()` runs the client-credentials grant
//! 3. Token is stored and handed to every later operation
//! 4. `TokenCache::authenticate()` forces a fresh exchange and overwrites it

pub mod cache;
pub mod constants;
pub mod error;
pub mod token;

pub use cache::TokenCache;
pub use constants::*;
pub use error::{Error, Result};
pub use token::{TokenResponse, basic_credentials, fetch_token};
