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

//! Request gate: bearer authentication followed by optional policy checks.
//!
//! A bearer token is either self-issued (HS256, signed by [`TokenIssuer`]) or
//! federated (RS*, signed by the Cognito pool). The `iss` claim, read without
//! verification, only selects which verifier runs; the selected verifier then
//! checks everything, including `iss` itself.

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AuthError;
use crate::federated::RemoteKeySetVerifier;
use crate::policy::{Decision, PolicyEvaluator, PolicyRequest};
use crate::token::TokenIssuer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    SelfIssued,
    Federated,
}

/// Identity established for one request, handed to downstream handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedRequest {
    pub subject: String,
    pub email: Option<String>,
    pub raw_token: String,
    pub origin: TokenOrigin,
}

/// An action a handler requires on a resource.
#[derive(Debug, Clone, Default)]
pub struct Permission {
    pub resource: String,
    pub action: String,
    pub context: HashMap<String, serde_json::Value>,
}

impl Permission {
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
            context: HashMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

#[derive(Deserialize)]
struct UnverifiedIssuer {
    #[serde(default)]
    iss: Option<String>,
}

pub struct AccessGuard {
    issuer: Arc<TokenIssuer>,
    federated: Option<Arc<RemoteKeySetVerifier>>,
    policy: Arc<dyn PolicyEvaluator>,
}

impl AccessGuard {
    pub fn new(
        issuer: Arc<TokenIssuer>,
        federated: Option<Arc<RemoteKeySetVerifier>>,
        policy: Arc<dyn PolicyEvaluator>,
    ) -> Self {
        Self {
            issuer,
            federated,
            policy,
        }
    }

    /// Select the verifier for `token` from its unverified `iss` claim.
    pub fn origin_of(&self, token: &str) -> Result<TokenOrigin, AuthError> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| AuthError::Validation("malformed token".to_string()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| AuthError::Validation(format!("malformed token payload: {e}")))?;
        let claims: UnverifiedIssuer = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::Validation(format!("malformed token claims: {e}")))?;
        let iss = claims
            .iss
            .ok_or_else(|| AuthError::Validation("token has no issuer".to_string()))?;

        if iss == self.issuer.issuer() {
            return Ok(TokenOrigin::SelfIssued);
        }
        match &self.federated {
            Some(verifier) if iss == verifier.expected_issuer() => Ok(TokenOrigin::Federated),
            _ => Err(AuthError::Validation(format!("unrecognized issuer: {iss}"))),
        }
    }

    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedRequest, AuthError> {
        self.authenticate_at(token, Utc::now())
    }

    pub fn authenticate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedRequest, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Validation("missing bearer token".to_string()));
        }

        let origin = self.origin_of(token)?;
        let (subject, email) = match origin {
            TokenOrigin::SelfIssued => {
                let claims = self.issuer.verify_at(token, now)?;
                (claims.sub, Some(claims.email).filter(|e| !e.is_empty()))
            }
            TokenOrigin::Federated => {
                let verifier = self.federated.as_ref().ok_or_else(|| {
                    AuthError::Validation("federated verification is not configured".to_string())
                })?;
                let claims = verifier.verify_at(token, now)?;
                (claims.sub, claims.email)
            }
        };

        Ok(AuthenticatedRequest {
            subject,
            email,
            raw_token: token.to_string(),
            origin,
        })
    }

    pub fn authorize(
        &self,
        subject: &str,
        resource: &str,
        action: &str,
        context: HashMap<String, serde_json::Value>,
    ) -> Decision {
        self.policy.evaluate(&PolicyRequest {
            subject: subject.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            context,
        })
    }

    /// Authenticate, then authorize when a permission is required. A denial
    /// carries no detail beyond "not permitted".
    pub fn protect(
        &self,
        token: &str,
        permission: Option<&Permission>,
    ) -> Result<AuthenticatedRequest, AuthError> {
        let request = self.authenticate(token)?;
        if let Some(p) = permission {
            let decision = self.authorize(
                &request.subject,
                &p.resource,
                &p.action,
                p.context.clone(),
            );
            if !decision.is_allowed() {
                return Err(AuthError::Forbidden);
            }
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::federated::{testing, KeySet};
    use crate::policy::{actions, Effect, PolicyStatement, StatementPolicy};
    use jsonwebtoken::Algorithm;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const KID: &str = "kid-1";

    struct CountingEvaluator {
        calls: AtomicUsize,
        decision: Decision,
    }

    impl PolicyEvaluator for CountingEvaluator {
        fn evaluate(&self, _request: &PolicyRequest) -> Decision {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.decision
        }
    }

    fn issuer() -> Arc<TokenIssuer> {
        Arc::new(
            TokenIssuer::new("guard-secret", "identity-core", chrono::Duration::minutes(10), None)
                .unwrap(),
        )
    }

    fn verifier() -> Arc<RemoteKeySetVerifier> {
        let keys = KeySet::from_json(&testing::jwks_json(&[KID])).unwrap();
        Arc::new(RemoteKeySetVerifier::new(testing::POOL_ID, testing::REGION, keys).unwrap())
    }

    fn guard_with(policy: Arc<dyn PolicyEvaluator>) -> AccessGuard {
        AccessGuard::new(issuer(), Some(verifier()), policy)
    }

    fn counting(decision: Decision) -> Arc<CountingEvaluator> {
        Arc::new(CountingEvaluator {
            calls: AtomicUsize::new(0),
            decision,
        })
    }

    #[test]
    fn self_issued_token_authenticates() {
        let guard = guard_with(Arc::new(StatementPolicy::empty()));
        let token = guard.issuer.issue("42", "a@b.com").unwrap();

        assert_eq!(guard.origin_of(&token).unwrap(), TokenOrigin::SelfIssued);
        let req = guard.authenticate(&token).unwrap();
        assert_eq!(req.subject, "42");
        assert_eq!(req.email.as_deref(), Some("a@b.com"));
        assert_eq!(req.origin, TokenOrigin::SelfIssued);
        assert_eq!(req.raw_token, token);
    }

    #[test]
    fn federated_token_authenticates() {
        let guard = guard_with(Arc::new(StatementPolicy::empty()));
        let now = Utc::now();
        let claims = testing::claims(&testing::issuer(), "access", now.timestamp(), 300);
        let token = testing::sign(Some(KID), Algorithm::RS256, &claims);

        let req = guard.authenticate_at(&token, now).unwrap();
        assert_eq!(req.origin, TokenOrigin::Federated);
        assert_eq!(req.email.as_deref(), Some("fed@example.com"));
    }

    #[test]
    fn unknown_issuer_is_rejected() {
        let guard = guard_with(Arc::new(StatementPolicy::empty()));
        let now = Utc::now();
        let claims = testing::claims("https://evil.example", "id", now.timestamp(), 300);
        let token = testing::sign(Some(KID), Algorithm::RS256, &claims);
        assert!(matches!(
            guard.origin_of(&token),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn federated_issuer_without_verifier_is_rejected() {
        let guard = AccessGuard::new(issuer(), None, Arc::new(StatementPolicy::empty()));
        let now = Utc::now();
        let claims = testing::claims(&testing::issuer(), "id", now.timestamp(), 300);
        let token = testing::sign(Some(KID), Algorithm::RS256, &claims);
        assert!(guard.authenticate_at(&token, now).is_err());
    }

    #[test]
    fn forged_self_issued_token_fails_full_verification() {
        let guard = guard_with(Arc::new(StatementPolicy::empty()));
        let forger =
            TokenIssuer::new("not-the-secret", "identity-core", chrono::Duration::minutes(5), None)
                .unwrap();
        let token = forger.issue("1", "").unwrap();

        assert_eq!(guard.origin_of(&token).unwrap(), TokenOrigin::SelfIssued);
        assert!(matches!(
            guard.authenticate(&token),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let guard = guard_with(Arc::new(StatementPolicy::empty()));
        assert!(guard.authenticate("").is_err());
        assert!(guard.authenticate("not-a-jwt").is_err());
        assert!(guard.authenticate("a.%%%.c").is_err());
    }

    #[test]
    fn failed_authentication_never_consults_policy() {
        let evaluator = counting(Decision::Allow);
        let guard = guard_with(evaluator.clone());

        let permission = Permission::new("users:1", actions::READ);
        let result = guard.protect("bogus.token.value", Some(&permission));
        assert!(result.is_err());
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn deny_is_reported_as_forbidden() {
        let evaluator = counting(Decision::Deny);
        let guard = guard_with(evaluator.clone());
        let token = guard.issuer.issue("42", "a@b.com").unwrap();

        let result = guard.protect(&token, Some(&Permission::new("users:7", actions::DELETE)));
        match result {
            Err(err @ AuthError::Forbidden) => assert_eq!(err.to_string(), "not permitted"),
            other => panic!("expected Forbidden, got {other:?}"),
        }
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn protect_without_permission_only_authenticates() {
        let evaluator = counting(Decision::Deny);
        let guard = guard_with(evaluator.clone());
        let token = guard.issuer.issue("42", "").unwrap();

        let req = guard.protect(&token, None).unwrap();
        assert_eq!(req.subject, "42");
        assert!(req.email.is_none());
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn statement_policy_allows_owner_by_context() {
        let policy = StatementPolicy::new(vec![PolicyStatement {
            id: "own-profile".to_string(),
            effect: Effect::Allow,
            subjects: vec!["*".to_string()],
            resources: vec!["users:*".to_string()],
            actions: vec![actions::READ.to_string()],
            conditions: HashMap::from([("owner".to_string(), serde_json::json!(true))]),
        }])
        .unwrap();
        let guard = guard_with(Arc::new(policy));
        let token = guard.issuer.issue("42", "a@b.com").unwrap();

        let own = Permission::new("users:42", actions::READ)
            .with_context("owner", serde_json::json!(true));
        assert!(guard.protect(&token, Some(&own)).is_ok());

        let other = Permission::new("users:7", actions::READ)
            .with_context("owner", serde_json::json!(false));
        assert!(matches!(
            guard.protect(&token, Some(&other)),
            Err(AuthError::Forbidden)
        ));
    }
}
