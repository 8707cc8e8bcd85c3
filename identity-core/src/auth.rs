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

//! Axum extractor that authenticates the `Authorization: Bearer` header.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::error::AppError;
use crate::guard::{AccessGuard, AuthenticatedRequest};

/// Extractor that resolves the caller through the [`AccessGuard`].
///
/// Usage in a handler:
/// ```ignore
/// async fn my_handler(Authenticated(req): Authenticated) { ... }
/// ```
#[derive(Debug)]
pub struct Authenticated(pub AuthenticatedRequest);

impl<S> FromRequestParts<S> for Authenticated
where
    Arc<AccessGuard>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(AppError::unauthorized)?;
        let guard = Arc::<AccessGuard>::from_ref(state);
        let request = guard.authenticate(token)?;
        Ok(Authenticated(request))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
