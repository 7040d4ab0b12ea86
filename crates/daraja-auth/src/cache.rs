//! In-memory access token cache with single-flight acquisition
//!
//! Holds at most one token. The implicit path (`ensure_token`) returns the
//! cached token when present; the explicit path (`authenticate`) always runs
//! a new exchange and overwrites it. Neither path looks at expiry: a token
//! the server has expired fails the next request instead of being refreshed.
//!
//! The slot is guarded by a tokio `Mutex` held across the exchange, so
//! concurrent first callers queue behind one request and then read its
//! result instead of issuing their own.

use std::future::Future;

use common::Secret;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::token::TokenResponse;

/// Cached access token for one client instance.
#[derive(Default)]
pub struct TokenCache {
    slot: Mutex<Option<Secret<String>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, running `fetch` only when the cache is empty.
    ///
    /// A failed exchange leaves the cache empty so the next caller retries.
    pub async fn ensure_token<F, Fut>(&self, fetch: F) -> Result<Secret<String>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenResponse>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            debug!("reusing cached access token");
            return Ok(token.clone());
        }

        let token = Secret::new(fetch().await?.access_token);
        *slot = Some(token.clone());
        info!("access token cached");
        Ok(token)
    }

    /// Run `fetch` unconditionally and replace whatever is cached.
    ///
    /// On failure the previously cached token, if any, is kept.
    pub async fn authenticate<F, Fut>(&self, fetch: F) -> Result<Secret<String>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenResponse>>,
    {
        let mut slot = self.slot.lock().await;
        let token = Secret::new(fetch().await?.access_token);
        let replaced = slot.replace(token.clone()).is_some();
        info!(replaced, "access token refreshed explicitly");
        Ok(token)
    }

    /// Peek at the cached token without any I/O.
    pub async fn cached(&self) -> Option<Secret<String>> {
        self.slot.lock().await.clone()
    }
}
