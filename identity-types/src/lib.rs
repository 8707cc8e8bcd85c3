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

//! Shared API types for the identity and access service.
//!
//! This crate defines the contract between the identity core and its
//! consumers (HTTP handlers, clients, integration tests).
//! It is intentionally framework-agnostic: no axum, no database types.

pub mod error;
pub mod requests;
pub mod responses;
pub mod token;

pub use error::APIError;
pub use requests::CallbackQuery;
pub use responses::{APIResponse, AuthResponse, LoginUrlResponse, UserResponse};
pub use token::SessionClaims;
