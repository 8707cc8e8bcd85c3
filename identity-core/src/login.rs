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

//! Login flow orchestration.
//!
//! 1. [`LoginService::begin_login`] stores a fresh CSRF state and returns the
//!    provider consent URL.
//! 2. The provider redirects back with `state` and `code`.
//! 3. [`LoginService::handle_callback`] redeems the state, exchanges the code,
//!    fetches the profile, upserts the identity, and mints a session token
//!    whose subject is the internal user id.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use identity_types::{AuthResponse, LoginUrlResponse};
use oauth2::CsrfToken;

use crate::db::{UpsertIdentity, UserDirectory};
use crate::error::AuthError;
use crate::oauth::OAuthBridge;
use crate::oauth_state::StateStore;
use crate::token::TokenIssuer;

pub struct LoginService {
    bridge: Arc<OAuthBridge>,
    states: Arc<dyn StateStore>,
    users: Arc<dyn UserDirectory>,
    issuer: Arc<TokenIssuer>,
    state_ttl: Duration,
}

impl LoginService {
    pub fn new(
        bridge: Arc<OAuthBridge>,
        states: Arc<dyn StateStore>,
        users: Arc<dyn UserDirectory>,
        issuer: Arc<TokenIssuer>,
        state_ttl: Duration,
    ) -> Self {
        Self {
            bridge,
            states,
            users,
            issuer,
            state_ttl,
        }
    }

    pub async fn begin_login(&self) -> Result<LoginUrlResponse, AuthError> {
        let csrf_token = CsrfToken::new_random();
        let state = csrf_token.secret();
        self.states.put(state, self.state_ttl).await?;
        Ok(LoginUrlResponse {
            url: self.bridge.authorization_url(state),
        })
    }

    pub async fn handle_callback(
        &self,
        state: &str,
        code: &str,
    ) -> Result<AuthResponse, AuthError> {
        if state.is_empty() {
            return Err(AuthError::State("missing state".to_string()));
        }
        if code.is_empty() {
            return Err(AuthError::Validation(
                "missing authorization code".to_string(),
            ));
        }
        if !self.states.consume_once(state).await? {
            tracing::warn!("Rejected OAuth callback with unknown, expired or reused state");
            return Err(AuthError::State(
                "state is unknown, expired or already used".to_string(),
            ));
        }

        let provider_token = self.bridge.exchange(code).await?;
        let profile = self.bridge.fetch_profile(&provider_token).await?;
        let record = self
            .users
            .upsert_by_external_id(&UpsertIdentity::from_profile(&profile, Utc::now()))
            .await?;
        let token = self.issuer.issue(&record.id.to_string(), &record.email)?;

        tracing::info!("User {} logged in via OAuth", record.id);

        Ok(AuthResponse {
            token,
            user: record.to_response(),
        })
    }
}
