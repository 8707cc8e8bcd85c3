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

//! Cognito JWT verification against a key set fetched once at startup.
//!
//! The key set is never refreshed. A key rotation on the pool requires the
//! process to be restarted before tokens signed with the new key validate.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;

use crate::config::FederatedConfig;
use crate::error::AuthError;

use super::keys::KeySet;

/// Claims carried by Cognito id and access tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct FederatedClaims {
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub token_use: String,
    /// Id tokens carry a string audience; access tokens carry none.
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "cognito:username")]
    pub username: Option<String>,
}

/// Verifies RSA-signed tokens from one Cognito user pool.
pub struct RemoteKeySetVerifier {
    keys: KeySet,
    expected_issuer: String,
}

impl RemoteKeySetVerifier {
    /// Fetch the pool's key set and build a verifier.
    ///
    /// Any failure here is a configuration error: the verifier never exists
    /// without keys.
    pub async fn connect(
        config: &FederatedConfig,
        client: &reqwest::Client,
    ) -> Result<Self, AuthError> {
        let issuer = pool_issuer(&config.user_pool_id, &config.region)?;
        let jwks_url = config
            .jwks_url
            .clone()
            .unwrap_or_else(|| format!("{issuer}/.well-known/jwks.json"));

        let resp = client.get(&jwks_url).send().await.map_err(|e| {
            tracing::error!("Key set fetch from {jwks_url} failed: {e}");
            AuthError::Configuration(format!("key set fetch failed: {e}"))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            tracing::error!("Key set fetch from {jwks_url} returned HTTP {status}");
            return Err(AuthError::Configuration(format!(
                "key set fetch returned HTTP {status}"
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Configuration(format!("failed to read key set: {e}")))?;
        let keys = KeySet::from_json(&body)?;

        tracing::info!(
            "Loaded {} signing key(s) for Cognito pool {}",
            keys.len(),
            config.user_pool_id
        );

        Ok(Self {
            keys,
            expected_issuer: issuer,
        })
    }

    /// Build a verifier from an already-loaded key set.
    pub fn new(user_pool_id: &str, region: &str, keys: KeySet) -> Result<Self, AuthError> {
        Ok(Self {
            keys,
            expected_issuer: pool_issuer(user_pool_id, region)?,
        })
    }

    /// `https://cognito-idp.{region}.amazonaws.com/{poolId}`
    pub fn expected_issuer(&self) -> &str {
        &self.expected_issuer
    }

    pub fn verify(&self, token: &str) -> Result<FederatedClaims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify `token` against the clock value `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<FederatedClaims, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::Validation(format!("invalid JWT header: {e}")))?;

        if !matches!(
            header.alg,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512
        ) {
            return Err(AuthError::Validation(format!(
                "unexpected signing method: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AuthError::Validation("kid header not found".to_string()))?;
        let key = self
            .keys
            .get(&kid)
            .ok_or_else(|| AuthError::KeyNotFound(kid.clone()))?;

        let mut validation = Validation::new(header.alg);
        // Checked below, in order, after the signature.
        validation.validate_exp = false;
        validation.validate_aud = false;

        let claims = decode::<FederatedClaims>(token, key, &validation)
            .map_err(|e| AuthError::Validation(e.to_string()))?
            .claims;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::Validation("token is expired".to_string()));
        }
        if claims.token_use != "id" && claims.token_use != "access" {
            return Err(AuthError::Validation(format!(
                "token_use mismatch: {}",
                claims.token_use
            )));
        }
        if claims.iss != self.expected_issuer {
            return Err(AuthError::Validation(format!(
                "issuer mismatch: {}",
                claims.iss
            )));
        }

        Ok(claims)
    }
}

fn pool_issuer(user_pool_id: &str, region: &str) -> Result<String, AuthError> {
    if user_pool_id.is_empty() || region.is_empty() {
        return Err(AuthError::Configuration(
            "Cognito user pool id and region are required".to_string(),
        ));
    }
    Ok(format!(
        "https://cognito-idp.{region}.amazonaws.com/{user_pool_id}"
    ))
}
