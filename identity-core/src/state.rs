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

//! Shared application state passed to every Axum handler via `State`.

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::db::PgUserDirectory;
use crate::error::AuthError;
use crate::federated::RemoteKeySetVerifier;
use crate::guard::AccessGuard;
use crate::http::build_client;
use crate::login::LoginService;
use crate::oauth::OAuthBridge;
use crate::oauth_state::RedisStateStore;
use crate::policy::{PolicyEvaluator, StatementPolicy};
use crate::token::TokenIssuer;

/// Components shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub guard: Arc<AccessGuard>,
    /// `None` when no OAuth client is configured.
    pub login: Option<Arc<LoginService>>,
}

impl AppState {
    pub fn new(guard: Arc<AccessGuard>, login: Option<Arc<LoginService>>) -> Self {
        Self { guard, login }
    }

    /// Build every component from configuration, connecting to PostgreSQL,
    /// Redis and the Cognito key-set endpoint as configured.
    pub async fn connect(config: &Config) -> Result<Self, AuthError> {
        let client = build_client(config.http_timeout)?;
        let issuer = Arc::new(TokenIssuer::from_config(&config.auth)?);

        let federated = match &config.federated {
            Some(fc) => Some(Arc::new(RemoteKeySetVerifier::connect(fc, &client).await?)),
            None => {
                tracing::info!("COGNITO_USER_POOL_ID not set, federated tokens are rejected");
                None
            }
        };

        let policy: Arc<dyn PolicyEvaluator> = match &config.policy_path {
            Some(path) => {
                let document = tokio::fs::read_to_string(path).await.map_err(|e| {
                    AuthError::Configuration(format!("failed to read policy {path}: {e}"))
                })?;
                let policy = StatementPolicy::from_json(&document)?;
                tracing::info!("Loaded {} policy statement(s) from {path}", policy.len());
                Arc::new(policy)
            }
            None => {
                tracing::warn!("POLICY_PATH not set, every authorization request is denied");
                Arc::new(StatementPolicy::empty())
            }
        };

        let guard = Arc::new(AccessGuard::new(issuer.clone(), federated, policy));

        let login = match &config.oauth {
            Some(oauth) => {
                let bridge = Arc::new(OAuthBridge::new(oauth.clone(), client.clone())?);
                let pool = PgPoolOptions::new()
                    .max_connections(20)
                    .connect(&config.database_url)
                    .await?;
                tracing::info!("Connected to PostgreSQL");
                let states = Arc::new(RedisStateStore::connect(&config.redis_url).await?);
                Some(Arc::new(LoginService::new(
                    bridge,
                    states,
                    Arc::new(PgUserDirectory::new(pool)),
                    issuer,
                    config.state_ttl,
                )))
            }
            None => {
                tracing::info!("GOOGLE_OAUTH_CLIENT_ID not set, OAuth login is disabled");
                None
            }
        };

        Ok(Self { guard, login })
    }
}

impl FromRef<AppState> for Arc<AccessGuard> {
    fn from_ref(state: &AppState) -> Self {
        state.guard.clone()
    }
}
