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

//! RSA fixtures shared by the unit tests of the federated verifier and the guard.

use std::sync::OnceLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::json;

pub const POOL_ID: &str = "us-east-1_TestPool";
pub const REGION: &str = "us-east-1";

struct Fixture {
    encoding: EncodingKey,
    n: String,
    e: String,
}

fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let public_key = private_key.to_public_key();
        Fixture {
            encoding: EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap(),
            n: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }
    })
}

pub fn issuer() -> String {
    format!("https://cognito-idp.{REGION}.amazonaws.com/{POOL_ID}")
}

/// A key-set document publishing the fixture key under every given kid.
pub fn jwks_json(kids: &[&str]) -> String {
    let f = fixture();
    let keys: Vec<_> = kids
        .iter()
        .map(|kid| {
            json!({"alg": "RS256", "e": f.e, "kid": kid, "kty": "RSA", "n": f.n, "use": "sig"})
        })
        .collect();
    json!({ "keys": keys }).to_string()
}

/// Cognito-shaped claims expiring `ttl_secs` after `now`.
pub fn claims(iss: &str, token_use: &str, now: i64, ttl_secs: i64) -> serde_json::Value {
    json!({
        "iss": iss,
        "sub": "a1b2c3d4-0000-1111-2222-333344445555",
        "aud": "app-client-id",
        "exp": now + ttl_secs,
        "iat": now,
        "jti": "7f0c2b6a-jti",
        "token_use": token_use,
        "email": "fed@example.com",
    })
}

pub fn sign(kid: Option<&str>, alg: Algorithm, claims: &serde_json::Value) -> String {
    let mut header = Header::new(alg);
    header.kid = kid.map(str::to_string);
    encode(&header, claims, &fixture().encoding).unwrap()
}
