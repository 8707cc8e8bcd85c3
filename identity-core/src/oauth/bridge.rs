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

//! Google OAuth2 authorization-code bridge.

use url::Url;

use crate::config::{default_google_scopes, OAuthConfig};
use crate::error::AuthError;

use super::exchange::{request_token, ProviderToken};
use super::profile::{fetch_userinfo, ProviderProfile};

/// Drives the authorization-code flow against one OAuth client registration.
pub struct OAuthBridge {
    config: OAuthConfig,
    auth_url: Url,
    client: reqwest::Client,
}

impl OAuthBridge {
    /// Validate the client registration. Performs no network activity.
    pub fn new(mut config: OAuthConfig, client: reqwest::Client) -> Result<Self, AuthError> {
        if config.client_id.is_empty() {
            return Err(AuthError::Configuration("oauth: empty client id".to_string()));
        }
        if config.client_secret.is_empty() {
            return Err(AuthError::Configuration(
                "oauth: empty client secret".to_string(),
            ));
        }
        if config.redirect_url.is_empty() {
            return Err(AuthError::Configuration(
                "oauth: empty redirect url".to_string(),
            ));
        }
        if config.scopes.is_empty() {
            config.scopes = default_google_scopes();
        }
        let auth_url = Url::parse(&config.auth_url).map_err(|e| {
            AuthError::Configuration(format!("oauth: invalid authorization endpoint: {e}"))
        })?;

        Ok(Self {
            config,
            auth_url,
            client,
        })
    }

    /// Scopes requested on every consent URL.
    pub fn scopes(&self) -> &[String] {
        &self.config.scopes
    }

    /// Consent URL carrying `state`. Offline access is requested so the
    /// provider issues a refresh token.
    pub fn authorization_url(&self, state: &str) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("access_type", "offline");
        url.to_string()
    }

    /// Exchange an authorization code for a provider token.
    pub async fn exchange(&self, code: &str) -> Result<ProviderToken, AuthError> {
        if code.is_empty() {
            return Err(AuthError::Validation(
                "missing authorization code".to_string(),
            ));
        }
        request_token(
            &self.client,
            &self.config.token_url,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.config.redirect_url),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
            ],
        )
        .await
    }

    /// Fetch the account profile the token grants access to.
    pub async fn fetch_profile(&self, token: &ProviderToken) -> Result<ProviderProfile, AuthError> {
        fetch_userinfo(&self.client, &self.config.userinfo_url, &token.access_token).await
    }

    /// Obtain a fresh access token using the token's refresh token.
    ///
    /// The previous refresh token is kept when the provider does not rotate it.
    pub async fn refresh_token(&self, token: &ProviderToken) -> Result<ProviderToken, AuthError> {
        let refresh = token
            .refresh_token
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AuthError::Validation("no refresh token available".to_string()))?;

        let mut fresh = request_token(
            &self.client,
            &self.config.token_url,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
            ],
        )
        .await?;

        if fresh.refresh_token.is_none() {
            fresh.refresh_token = Some(refresh.to_string());
        }
        Ok(fresh)
    }
}
