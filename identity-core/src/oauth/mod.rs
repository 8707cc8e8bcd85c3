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

//! Google OAuth2 helpers: consent URL construction, code exchange, token
//! refresh, and the userinfo profile.

pub mod bridge;
pub mod exchange;
pub mod profile;

pub use bridge::OAuthBridge;
pub use exchange::ProviderToken;
pub use profile::ProviderProfile;
