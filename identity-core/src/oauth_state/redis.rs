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

//! Redis-backed state store. Requires Redis 6.2 or later for `GETDEL`.

use std::time::Duration;

use ::redis::aio::MultiplexedConnection;
use ::redis::Client;
use async_trait::async_trait;

use crate::error::AuthError;

use super::{check_put, state_key, StateStore};

#[derive(Clone)]
pub struct RedisStateStore {
    conn: MultiplexedConnection,
}

impl RedisStateStore {
    pub async fn connect(redis_url: &str) -> Result<Self, AuthError> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        tracing::info!("Connected to Redis state store");
        Ok(Self { conn })
    }

    pub fn from_connection(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn put(&self, state: &str, ttl: Duration) -> Result<(), AuthError> {
        check_put(state, ttl)?;
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.conn.clone();
        let _: () = ::redis::cmd("SET")
            .arg(state_key(state))
            .arg(1)
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn consume_once(&self, state: &str) -> Result<bool, AuthError> {
        let mut conn = self.conn.clone();
        // Read and delete in one command; a GET followed by DEL would let two
        // callers both observe the marker.
        let value: Option<String> = ::redis::cmd("GETDEL")
            .arg(state_key(state))
            .query_async(&mut conn)
            .await?;
        Ok(value.is_some())
    }
}
