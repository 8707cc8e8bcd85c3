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

//! Identity and access core.
//!
//! This crate mints and verifies bearer credentials, bridges the Google
//! OAuth2 authorization-code flow into an internally issued session token,
//! reconciles external identities into durable storage, and gates requests
//! through authentication plus policy authorization.
//!
//! HTTP routing, migrations and process lifecycle live outside this crate.
//! Handlers receive an [`auth::Authenticated`] extractor and a
//! [`login::LoginService`] through [`state::AppState`].

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod federated;
pub mod guard;
pub mod http;
pub mod login;
pub mod oauth;
pub mod oauth_state;
pub mod policy;
pub mod state;
pub mod token;
