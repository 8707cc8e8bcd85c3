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

//! JWKS (JSON Web Key Set) decoding into an immutable kid → RSA key map.

use std::collections::HashMap;

use jsonwebtoken::DecodingKey;
use serde::Deserialize;

use crate::error::AuthError;

/// A JWK entry from the key-set endpoint.
#[derive(Debug, Deserialize)]
struct JwkEntry {
    kid: String,
    kty: String,
    #[serde(default)]
    alg: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<JwkEntry>,
}

/// RSA public keys indexed by key id. Never mutated after construction.
#[derive(Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, DecodingKey>,
}

impl KeySet {
    /// Decode a `{"keys": [...]}` document.
    ///
    /// Entries whose `kty` is not `RSA` are skipped. An RSA entry with missing
    /// or undecodable modulus/exponent fails the whole document.
    pub fn from_json(body: &str) -> Result<Self, AuthError> {
        let doc: JwksDocument = serde_json::from_str(body)
            .map_err(|e| AuthError::Configuration(format!("failed to parse key set: {e}")))?;

        let mut keys = HashMap::with_capacity(doc.keys.len());
        for jwk in doc.keys {
            if jwk.kty != "RSA" {
                tracing::warn!(kid = %jwk.kid, kty = %jwk.kty, "Skipping non-RSA key");
                continue;
            }
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                return Err(AuthError::Configuration(format!(
                    "RSA key '{}' is missing modulus or exponent",
                    jwk.kid
                )));
            };
            let key = DecodingKey::from_rsa_components(n, e).map_err(|err| {
                AuthError::Configuration(format!("invalid RSA key '{}': {err}", jwk.kid))
            })?;
            tracing::debug!(kid = %jwk.kid, alg = ?jwk.alg, "Loaded RSA key");
            keys.insert(jwk.kid, key);
        }

        Ok(Self { keys })
    }

    /// Key registered under `kid`, if any.
    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }

    /// Number of usable RSA keys, logged when the set is fetched.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
