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

//! Token endpoint requests: authorization code and refresh grants.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Provider token set returned by the token endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// POST a form-encoded grant to the token endpoint. Never retried.
pub(crate) async fn request_token(
    client: &reqwest::Client,
    token_url: &str,
    params: &[(&str, &str)],
) -> Result<ProviderToken, AuthError> {
    let response = client.post(token_url).form(params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!("OAuth token request failed. Status: {status}, Body: {body}");
        return Err(AuthError::ExternalService(format!(
            "token endpoint returned HTTP {status}"
        )));
    }

    let body_text = response.text().await?;
    serde_json::from_str(&body_text).map_err(|e| {
        AuthError::ExternalService(format!("failed to parse token response: {e}"))
    })
}
