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

//! Self-issued session tokens.
//!
//! The identity core signs tokens with a shared secret (HMAC-SHA256); any
//! holder of the secret can validate the signature and extract the claims.

use chrono::{DateTime, Utc};
use identity_types::SessionClaims;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Mints and verifies HS256 session tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    expiration: chrono::Duration,
    audience: Option<String>,
}

impl TokenIssuer {
    /// Build an issuer.
    ///
    /// An empty `issuer` falls back to [`SessionClaims::DEFAULT_ISSUER`]; a
    /// non-positive `expiration` falls back to one hour. An expiration too
    /// large to add to the current time is a configuration error.
    pub fn new(
        secret: &str,
        issuer: &str,
        expiration: chrono::Duration,
        audience: Option<String>,
    ) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Configuration(
                "token issuer: empty secret".to_string(),
            ));
        }
        let issuer = if issuer.is_empty() {
            SessionClaims::DEFAULT_ISSUER.to_string()
        } else {
            issuer.to_string()
        };
        let expiration = if expiration <= chrono::Duration::zero() {
            chrono::Duration::hours(1)
        } else {
            expiration
        };
        if Utc::now().checked_add_signed(expiration).is_none() {
            return Err(AuthError::Configuration(
                "token issuer: expiration out of range".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            expiration,
            audience: audience.filter(|a| !a.is_empty()),
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        Self::new(
            &config.jwt_secret,
            &config.jwt_issuer,
            config.jwt_expiration,
            config.jwt_audience.clone(),
        )
    }

    /// The `iss` value embedded in every token this issuer signs.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn expiration(&self) -> chrono::Duration {
        self.expiration
    }

    /// Sign a session token for `subject`.
    pub fn issue(&self, subject: &str, email: &str) -> Result<String, AuthError> {
        self.issue_at(subject, email, Utc::now())
    }

    /// Sign a session token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let expires_at = now
            .checked_add_signed(self.expiration)
            .ok_or_else(|| AuthError::Validation("token expiry out of range".to_string()))?;
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            aud: self.audience.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign session token: {e}");
            AuthError::Configuration(format!("failed to sign session token: {e}"))
        })
    }

    /// Verify a token signed by this issuer.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against the clock value `now`.
    ///
    /// Checks the HS256 signature, the issuer, the audience when one is
    /// configured, and that `exp` is strictly after `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        // Expiry is checked below against the supplied clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::Validation(e.to_string()))?
            .claims;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::Validation("token is expired".to_string()));
        }

        Ok(claims)
    }
}
