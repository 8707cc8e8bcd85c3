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

//! In-process user directory.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::AuthError;

use super::users::{IdentityRecord, UpsertIdentity, UserDirectory};

struct Inner {
    next_id: i64,
    by_external_id: HashMap<String, IdentityRecord>,
}

pub struct MemoryUserDirectory {
    inner: Mutex<Inner>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Assign ids sequentially from `first_id`.
    pub fn starting_at(first_id: i64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: first_id,
                by_external_id: HashMap::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.by_external_id.len()
    }
}

impl Default for MemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn upsert_by_external_id(
        &self,
        identity: &UpsertIdentity,
    ) -> Result<IdentityRecord, AuthError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();

        if let Some(record) = inner.by_external_id.get_mut(&identity.external_id) {
            record.email = identity.email.clone();
            record.name = identity.name.clone();
            record.picture = identity.picture.clone();
            record.locale = identity.locale.clone();
            record.verified_email = identity.verified_email;
            record.updated_at = now;
            record.last_login_at = identity.login_at;
            return Ok(record.clone());
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let record = IdentityRecord {
            id,
            external_id: identity.external_id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            picture: identity.picture.clone(),
            locale: identity.locale.clone(),
            verified_email: identity.verified_email,
            created_at: now,
            updated_at: now,
            last_login_at: identity.login_at,
        };
        inner
            .by_external_id
            .insert(record.external_id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<IdentityRecord>, AuthError> {
        Ok(self
            .inner
            .lock()
            .await
            .by_external_id
            .get(external_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn upsert(external_id: &str, email: &str) -> UpsertIdentity {
        UpsertIdentity {
            external_id: external_id.to_string(),
            email: email.to_string(),
            name: None,
            picture: None,
            locale: None,
            verified_email: false,
            login_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn first_login_creates_with_starting_id() {
        let dir = MemoryUserDirectory::starting_at(42);
        let record = dir.upsert_by_external_id(&upsert("g-1", "a@b.com")).await.unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.created_at, record.updated_at);

        let other = dir.upsert_by_external_id(&upsert("g-2", "c@d.com")).await.unwrap();
        assert_eq!(other.id, 43);
    }

    #[tokio::test]
    async fn repeated_upsert_updates_in_place() {
        let dir = MemoryUserDirectory::new();
        let first = dir.upsert_by_external_id(&upsert("g-1", "old@b.com")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let mut again = upsert("g-1", "new@b.com");
        again.verified_email = true;
        let second = dir.upsert_by_external_id(&again).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.email, "new@b.com");
        assert!(second.verified_email);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
        assert!(second.last_login_at >= first.last_login_at);
        assert_eq!(dir.len().await, 1);
    }

    #[tokio::test]
    async fn find_returns_none_for_unknown_id() {
        let dir = MemoryUserDirectory::new();
        assert!(dir.find_by_external_id("nobody").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_logins_create_one_record() {
        let dir = Arc::new(MemoryUserDirectory::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let dir = Arc::clone(&dir);
                tokio::spawn(async move {
                    dir.upsert_by_external_id(&upsert("g-race", "r@b.com"))
                        .await
                        .unwrap()
                        .id
                })
            })
            .collect();

        let ids: Vec<i64> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(dir.len().await, 1);
    }
}
