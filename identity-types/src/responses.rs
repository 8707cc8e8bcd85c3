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

//! Response types for the identity API.
//!
//! Every endpoint returns an [`APIResponse<T>`] envelope:
//! - On success: `{ "success": true,  "result": <T> }`
//! - On failure: `{ "success": false, "result": <APIError> }`

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Generic envelope
// ---------------------------------------------------------------------------

/// Top-level API response envelope.
///
/// # Success example
///
/// ```json
/// { "success": true, "result": { "url": "https://accounts.google.com/..." } }
/// ```
///
/// # Error example
///
/// ```json
/// { "success": false, "result": { "code": "UNAUTHORIZED", "message": "..." } }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct APIResponse<A: Serialize> {
    pub success: bool,
    pub result: A,
}

impl<A: Serialize> APIResponse<A> {
    /// Wrap a successful result.
    pub fn ok(result: A) -> Self {
        Self {
            success: true,
            result,
        }
    }
}

impl APIResponse<crate::error::APIError> {
    /// Wrap an error result.
    pub fn error(err: crate::error::APIError) -> Self {
        Self {
            success: false,
            result: err,
        }
    }
}

// ---------------------------------------------------------------------------
// Login flow payloads
// ---------------------------------------------------------------------------

/// Result of login initiation: where to send the browser.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginUrlResponse {
    pub url: String,
}

/// A user record as exposed to API consumers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserResponse {
    /// Stable internal id; also the `sub` of issued session tokens.
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    pub verified_email: bool,
    /// Unix timestamp in seconds.
    pub created_at: i64,
    /// Unix timestamp in seconds.
    pub updated_at: i64,
    /// Unix timestamp in seconds.
    pub last_login_at: i64,
}

/// Result of a successful login callback.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthResponse {
    /// Signed session token (bearer credential).
    pub token: String,
    pub user: UserResponse,
}
