/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Short-lived, single-use CSRF state for the login handshake.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AuthError;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStateStore;
pub use self::redis::RedisStateStore;

/// Namespace of state markers in a shared key-value store.
pub const STATE_KEY_PREFIX: &str = "oauth_state:";

/// Stores login states and redeems each at most once.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Remember `state` for `ttl`.
    async fn put(&self, state: &str, ttl: Duration) -> Result<(), AuthError>;

    /// Atomically fetch and delete `state`. Returns `true` only for the first
    /// caller to redeem a state that exists and has not expired.
    async fn consume_once(&self, state: &str) -> Result<bool, AuthError>;
}

pub(crate) fn check_put(state: &str, ttl: Duration) -> Result<(), AuthError> {
    if state.is_empty() {
        return Err(AuthError::Validation("empty oauth state".to_string()));
    }
    if ttl.is_zero() {
        return Err(AuthError::Validation(
            "oauth state ttl must be positive".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn state_key(state: &str) -> String {
    format!("{STATE_KEY_PREFIX}{state}")
}
