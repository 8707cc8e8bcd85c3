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

//! User directory: transactional upsert keyed by the provider's account id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use identity_types::UserResponse;
use sqlx::PgPool;

use crate::error::AuthError;
use crate::oauth::ProviderProfile;

const USER_COLUMNS: &str = "id, external_id, email, name, picture, locale, verified_email, \
                            created_at, updated_at, last_login_at";

/// A stored identity.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct IdentityRecord {
    pub id: i64,
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
    pub verified_email: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl IdentityRecord {
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            picture: self.picture.clone(),
            locale: self.locale.clone(),
            verified_email: self.verified_email,
            created_at: self.created_at.timestamp(),
            updated_at: self.updated_at.timestamp(),
            last_login_at: self.last_login_at.timestamp(),
        }
    }
}

/// Mutable fields written on every login.
#[derive(Debug, Clone)]
pub struct UpsertIdentity {
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
    pub verified_email: bool,
    pub login_at: DateTime<Utc>,
}

impl UpsertIdentity {
    pub fn from_profile(profile: &ProviderProfile, login_at: DateTime<Utc>) -> Self {
        Self {
            external_id: profile.id.clone(),
            email: profile.email.clone(),
            name: profile.name.clone().filter(|n| !n.is_empty()),
            picture: profile.picture.clone(),
            locale: profile.locale.clone(),
            verified_email: profile.verified_email,
            login_at,
        }
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create the identity on first login, otherwise refresh its mutable
    /// fields. Repeating the call for the same external id never creates a
    /// second record.
    async fn upsert_by_external_id(
        &self,
        identity: &UpsertIdentity,
    ) -> Result<IdentityRecord, AuthError>;

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<IdentityRecord>, AuthError>;
}

/// PostgreSQL directory over the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn upsert_by_external_id(
        &self,
        identity: &UpsertIdentity,
    ) -> Result<IdentityRecord, AuthError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE external_id = $1 FOR UPDATE")
                .bind(&identity.external_id)
                .fetch_optional(&mut *tx)
                .await?;

        let record = match existing {
            Some(id) => {
                sqlx::query_as::<_, IdentityRecord>(&format!(
                    r#"
                    UPDATE users
                    SET email = $2, name = $3, picture = $4, locale = $5,
                        verified_email = $6, updated_at = NOW(), last_login_at = $7
                    WHERE id = $1
                    RETURNING {USER_COLUMNS}
                    "#
                ))
                .bind(id)
                .bind(&identity.email)
                .bind(&identity.name)
                .bind(&identity.picture)
                .bind(&identity.locale)
                .bind(identity.verified_email)
                .bind(identity.login_at)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                // A concurrent first login may insert between the SELECT and
                // here; the conflict clause turns this insert into an update.
                sqlx::query_as::<_, IdentityRecord>(&format!(
                    r#"
                    INSERT INTO users
                        (external_id, email, name, picture, locale, verified_email,
                         created_at, updated_at, last_login_at)
                    VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW(), $7)
                    ON CONFLICT (external_id) DO UPDATE
                    SET email = EXCLUDED.email, name = EXCLUDED.name,
                        picture = EXCLUDED.picture, locale = EXCLUDED.locale,
                        verified_email = EXCLUDED.verified_email,
                        updated_at = NOW(), last_login_at = EXCLUDED.last_login_at
                    RETURNING {USER_COLUMNS}
                    "#
                ))
                .bind(&identity.external_id)
                .bind(&identity.email)
                .bind(&identity.name)
                .bind(&identity.picture)
                .bind(&identity.locale)
                .bind(identity.verified_email)
                .bind(identity.login_at)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;

        tracing::debug!(
            "Upserted identity {} for external id {}",
            record.id,
            record.external_id
        );
        Ok(record)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<IdentityRecord>, AuthError> {
        let record = sqlx::query_as::<_, IdentityRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ProviderProfile {
        ProviderProfile {
            id: "g-1".to_string(),
            email: "a@b.com".to_string(),
            verified_email: true,
            name: None,
            given_name: Some("Ada".to_string()),
            family_name: Some("Lovelace".to_string()),
            picture: Some("https://p/ada.png".to_string()),
            locale: None,
        }
    }

    #[test]
    fn upsert_from_profile_keeps_provider_name() {
        let now = Utc::now();
        let named = ProviderProfile {
            name: Some("Ada Lovelace".to_string()),
            ..profile()
        };
        let upsert = UpsertIdentity::from_profile(&named, now);
        assert_eq!(upsert.external_id, "g-1");
        assert_eq!(upsert.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(upsert.picture.as_deref(), Some("https://p/ada.png"));
        assert_eq!(upsert.login_at, now);
    }

    #[test]
    fn nameless_profile_stores_no_name() {
        let upsert = UpsertIdentity::from_profile(&profile(), Utc::now());
        assert_eq!(upsert.name, None);
        assert_eq!(upsert.email, "a@b.com");

        let blank = ProviderProfile {
            name: Some(String::new()),
            ..profile()
        };
        assert_eq!(UpsertIdentity::from_profile(&blank, Utc::now()).name, None);
    }

    #[test]
    fn response_uses_unix_seconds() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let record = IdentityRecord {
            id: 42,
            external_id: "g-1".to_string(),
            email: "a@b.com".to_string(),
            name: None,
            picture: None,
            locale: Some("en".to_string()),
            verified_email: true,
            created_at: at,
            updated_at: at,
            last_login_at: at,
        };
        let resp = record.to_response();
        assert_eq!(resp.id, 42);
        assert_eq!(resp.created_at, 1_700_000_000);
        assert_eq!(resp.locale.as_deref(), Some("en"));
    }
}
