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

//! In-process state store for single-instance deployments and tests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::AuthError;

use super::{check_put, StateStore};

#[derive(Default)]
pub struct MemoryStateStore {
    /// state → expiry instant
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of markers currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn put(&self, state: &str, ttl: Duration) -> Result<(), AuthError> {
        check_put(state, ttl)?;
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| AuthError::Validation("oauth state ttl out of range".to_string()))?;
        let mut entries = self.entries.lock().await;
        entries.retain(|_, expires_at| *expires_at > now);
        entries.insert(state.to_string(), expires_at);
        Ok(())
    }

    async fn consume_once(&self, state: &str) -> Result<bool, AuthError> {
        let mut entries = self.entries.lock().await;
        Ok(entries
            .remove(state)
            .is_some_and(|expires_at| expires_at > Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn state_is_valid_exactly_once() {
        let store = MemoryStateStore::new();
        store.put("s1", Duration::from_secs(300)).await.unwrap();

        assert!(store.consume_once("s1").await.unwrap());
        assert!(!store.consume_once("s1").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_state_is_invalid() {
        let store = MemoryStateStore::new();
        assert!(!store.consume_once("never-stored").await.unwrap());
    }

    #[tokio::test]
    async fn expired_state_is_invalid_and_removed() {
        let store = MemoryStateStore::new();
        store.put("s1", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(!store.consume_once("s1").await.unwrap());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn put_prunes_expired_entries() {
        let store = MemoryStateStore::new();
        store.put("old", Duration::from_millis(5)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.put("new", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn zero_ttl_is_rejected() {
        let store = MemoryStateStore::new();
        assert!(matches!(
            store.put("s1", Duration::ZERO).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn unrepresentable_ttl_is_rejected() {
        let store = MemoryStateStore::new();
        assert!(matches!(
            store.put("s1", Duration::MAX).await,
            Err(AuthError::Validation(_))
        ));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_consumers_see_exactly_one_success() {
        let store = Arc::new(MemoryStateStore::new());
        store.put("race", Duration::from_secs(60)).await.unwrap();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.consume_once("race").await.unwrap() })
            })
            .collect();

        let results = futures::future::join_all(handles).await;
        let successes = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();
        assert_eq!(successes, 1);
    }
}
