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

//! Verification of credentials minted by an AWS Cognito user pool.

pub mod keys;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use keys::KeySet;
pub use verify::{FederatedClaims, RemoteKeySetVerifier};
