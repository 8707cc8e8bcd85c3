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

//! Session token (JWT) claims.
//!
//! The session token is a signed JWT (HMAC-SHA256) minted by the identity
//! core after a successful login. Any service holding the shared secret can
//! validate the signature and read the claims.

use serde::{Deserialize, Serialize};

/// JWT payload for a self-issued session token.
///
/// # Example payload
///
/// ```json
/// {
///   "iss": "identity-core",
///   "sub": "42",
///   "exp": 1707004800,
///   "iat": 1707001200,
///   "jti": "0d6f7a2e-7f4c-4c43-9a51-0b0f6a1c2d3e",
///   "email": "a@b.com"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionClaims {
    /// Issuer identifier.
    pub iss: String,

    /// Internal user id.
    pub sub: String,

    /// Audience, present only when the issuer is configured with one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Expiration timestamp (Unix seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix seconds).
    pub iat: i64,

    /// Unique token id.
    pub jti: String,

    /// User email, omitted when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}

impl SessionClaims {
    /// Issuer used when none is configured.
    pub const DEFAULT_ISSUER: &'static str = "identity-core";
}
