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

//! Google userinfo (v2) profile.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Profile returned by the userinfo endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderProfile {
    /// Stable provider-side account id.
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

pub(crate) async fn fetch_userinfo(
    client: &reqwest::Client,
    userinfo_url: &str,
    access_token: &str,
) -> Result<ProviderProfile, AuthError> {
    let resp = client
        .get(userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::error!("UserInfo request failed. Status: {status}, Body: {body}");
        return Err(AuthError::ExternalService(format!(
            "userinfo endpoint returned HTTP {status}"
        )));
    }

    resp.json::<ProviderProfile>().await.map_err(|e| {
        AuthError::ExternalService(format!("failed to parse userinfo response: {e}"))
    })
}
