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

//! Error taxonomy of the identity core and its HTTP boundary.
//!
//! Components return [`AuthError`]. At the HTTP edge it converts into
//! [`AppError`], which implements Axum's `IntoResponse` and is returned as
//! `APIResponse<APIError>` with `success: false`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use identity_types::{APIError, APIResponse};
use thiserror::Error;

/// Failure of an identity core operation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A component was constructed with missing or invalid settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed, expired, wrong-issuer or wrong-token-use credential.
    #[error("invalid token: {0}")]
    Validation(String),

    /// The token's `kid` matches no key in the key set.
    #[error("matching key not found for kid '{0}'")]
    KeyNotFound(String),

    /// Missing, expired or already-consumed CSRF state.
    #[error("invalid oauth state: {0}")]
    State(String),

    /// Identity provider HTTP, network or decoding failure.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Uniqueness conflict that the storage layer did not resolve.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Policy denied the action.
    #[error("not permitted")]
    Forbidden,

    /// Key-value or relational store failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// True for failures that must be reported as "not authenticated".
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::Validation(_) | AuthError::KeyNotFound(_) | AuthError::State(_)
        )
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AuthError::Conflict(db_err.message().to_string());
            }
        }
        AuthError::Storage(err.to_string())
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(err: redis::RedisError) -> Self {
        AuthError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return AuthError::ExternalService(format!("request timed out: {err}"));
        }
        AuthError::ExternalService(err.to_string())
    }
}

/// Application-level error that pairs an HTTP status code with an [`APIError`].
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: APIError,
}

impl AppError {
    pub fn new(status: StatusCode, body: APIError) -> Self {
        Self { status, body }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, APIError::unauthorized())
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, APIError::forbidden())
    }

    pub fn bad_gateway(detail: &str) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, APIError::external_service(detail))
    }

    pub fn internal(detail: &str) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            APIError::internal_error(detail),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = APIResponse::error(self.body);
        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match &err {
            // Client errors, but the caller never learns which check failed.
            e if e.is_authentication_failure() => {
                tracing::debug!("Rejected credential: {e}");
                Self::unauthorized()
            }
            AuthError::Forbidden => Self::forbidden(),
            AuthError::ExternalService(detail) => {
                tracing::error!("Identity provider error: {detail}");
                Self::bad_gateway(detail)
            }
            _ => {
                tracing::error!("Identity core error: {err}");
                Self::internal(&err.to_string())
            }
        }
    }
}
