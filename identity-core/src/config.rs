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

//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Secret used when `AUTH_JWT_SECRET` is unset. Never acceptable in production.
pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Minimal profile scopes requested when none are configured.
pub fn default_google_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/userinfo.email".to_string(),
        "https://www.googleapis.com/auth/userinfo.profile".to_string(),
    ]
}

/// Configuration for the identity core.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Redis connection string for the OAuth state store.
    pub redis_url: String,
    /// Session token settings.
    pub auth: AuthConfig,
    /// Google OAuth configuration. `None` if `GOOGLE_OAUTH_CLIENT_ID` is unset or empty.
    pub oauth: Option<OAuthConfig>,
    /// Cognito verification. `None` if `COGNITO_USER_POOL_ID` is unset or empty.
    pub federated: Option<FederatedConfig>,
    /// Lifetime of a login state (default: 5 minutes).
    pub state_ttl: Duration,
    /// Upper bound for every outbound provider call.
    pub http_timeout: Duration,
    /// JSON policy document for the access guard. `None` denies everything.
    pub policy_path: Option<String>,
}

/// Self-issued session token settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiration: chrono::Duration,
    pub jwt_audience: Option<String>,
}

/// Google OAuth client configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

/// Cognito user pool whose tokens are accepted.
#[derive(Debug, Clone)]
pub struct FederatedConfig {
    pub user_pool_id: String,
    pub region: String,
    /// Overrides the key-set URL derived from region and pool id.
    pub jwks_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Required
    /// - `DATABASE_URL`
    ///
    /// # Optional
    /// - `REDIS_URL` (default: `"redis://127.0.0.1:6379"`)
    /// - `AUTH_JWT_SECRET`, `AUTH_JWT_ISSUER` (default: `"identity-core"`),
    ///   `AUTH_JWT_EXP_MINUTES` (default: `"60"`), `AUTH_JWT_AUDIENCE`
    /// - OAuth: `GOOGLE_OAUTH_CLIENT_ID`, `GOOGLE_OAUTH_CLIENT_SECRET`,
    ///   `GOOGLE_OAUTH_REDIRECT_URL`, `GOOGLE_OAUTH_SCOPES` (comma separated),
    ///   `GOOGLE_OAUTH_AUTH_URL`, `GOOGLE_OAUTH_TOKEN_URL`, `GOOGLE_OAUTH_USERINFO_URL`
    /// - Cognito: `COGNITO_USER_POOL_ID`, `COGNITO_REGION`, `COGNITO_JWKS_URL`
    /// - `OAUTH_STATE_TTL_SECS` (default: `"300"`), `HTTP_TIMEOUT_SECS` (default: `"10"`)
    /// - `POLICY_PATH`
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.is_empty());

        let database_url =
            var("DATABASE_URL").ok_or("DATABASE_URL environment variable is required")?;
        let redis_url = var("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());

        let jwt_secret = var("AUTH_JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());
        if jwt_secret == DEFAULT_JWT_SECRET {
            tracing::warn!("Using default JWT secret, override AUTH_JWT_SECRET in production");
        }
        let jwt_exp_minutes = parse_int(&var, "AUTH_JWT_EXP_MINUTES", 60)?;
        let auth = AuthConfig {
            jwt_secret,
            jwt_issuer: var("AUTH_JWT_ISSUER").unwrap_or_else(|| "identity-core".to_string()),
            jwt_expiration: chrono::Duration::try_minutes(jwt_exp_minutes)
                .ok_or("AUTH_JWT_EXP_MINUTES is out of range")?,
            jwt_audience: var("AUTH_JWT_AUDIENCE"),
        };

        let oauth = var("GOOGLE_OAUTH_CLIENT_ID")
            .map(|client_id| {
                Ok::<_, String>(OAuthConfig {
                    client_id,
                    client_secret: var("GOOGLE_OAUTH_CLIENT_SECRET").ok_or(
                        "GOOGLE_OAUTH_CLIENT_SECRET required when GOOGLE_OAUTH_CLIENT_ID is set",
                    )?,
                    redirect_url: var("GOOGLE_OAUTH_REDIRECT_URL").ok_or(
                        "GOOGLE_OAUTH_REDIRECT_URL required when GOOGLE_OAUTH_CLIENT_ID is set",
                    )?,
                    scopes: var("GOOGLE_OAUTH_SCOPES")
                        .map(|raw| parse_scopes(&raw))
                        .filter(|scopes| !scopes.is_empty())
                        .unwrap_or_else(default_google_scopes),
                    auth_url: var("GOOGLE_OAUTH_AUTH_URL")
                        .unwrap_or_else(|| GOOGLE_AUTH_URL.to_string()),
                    token_url: var("GOOGLE_OAUTH_TOKEN_URL")
                        .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
                    userinfo_url: var("GOOGLE_OAUTH_USERINFO_URL")
                        .unwrap_or_else(|| GOOGLE_USERINFO_URL.to_string()),
                })
            })
            .transpose()?;

        let federated = var("COGNITO_USER_POOL_ID")
            .map(|user_pool_id| {
                Ok::<_, String>(FederatedConfig {
                    user_pool_id,
                    region: var("COGNITO_REGION")
                        .ok_or("COGNITO_REGION required when COGNITO_USER_POOL_ID is set")?,
                    jwks_url: var("COGNITO_JWKS_URL"),
                })
            })
            .transpose()?;

        let state_ttl = parse_positive_secs(&var, "OAUTH_STATE_TTL_SECS", 300)?;
        let http_timeout = parse_positive_secs(&var, "HTTP_TIMEOUT_SECS", 10)?;

        tracing::info!("Configuration loaded from environment variables");

        Ok(Self {
            database_url,
            redis_url,
            auth,
            oauth,
            federated,
            state_ttl,
            http_timeout,
            policy_path: var("POLICY_PATH"),
        })
    }
}

fn parse_int<F>(var: &F, key: &str, default: i64) -> Result<i64, String>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("{key} must be a valid integer")),
        None => Ok(default),
    }
}

fn parse_positive_secs<F>(var: &F, key: &str, default: i64) -> Result<Duration, String>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = parse_int(var, key, default)?;
    u64::try_from(secs)
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("{key} must be positive"))
}

/// Split a comma-separated scope list, dropping blanks.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
