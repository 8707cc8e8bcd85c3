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

//! Authorization policies.
//!
//! A [`StatementPolicy`] holds allow/deny statements over subjects, resources
//! and actions. Patterns may contain `*`, which matches any run of characters.
//! An explicit deny always wins; without a matching allow the request is
//! denied.
//!
//! # Example document
//!
//! ```json
//! {
//!   "statements": [
//!     {
//!       "id": "owners-read-own-profile",
//!       "effect": "allow",
//!       "subjects": ["*"],
//!       "resources": ["users:*"],
//!       "actions": ["read"],
//!       "conditions": { "owner": true }
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;

use crate::error::AuthError;

pub mod actions {
    pub const READ: &str = "read";
    pub const DELETE: &str = "delete";
}

/// Input to a policy decision.
#[derive(Debug, Clone, Default)]
pub struct PolicyRequest {
    pub subject: String,
    pub resource: String,
    pub action: String,
    pub context: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

pub trait PolicyEvaluator: Send + Sync {
    fn evaluate(&self, request: &PolicyRequest) -> Decision;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

/// A statement as written in a policy document.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyStatement {
    #[serde(default)]
    pub id: String,
    pub effect: Effect,
    pub subjects: Vec<String>,
    pub resources: Vec<String>,
    pub actions: Vec<String>,
    /// Context key → value the request context must carry.
    #[serde(default)]
    pub conditions: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PolicyDocument {
    statements: Vec<PolicyStatement>,
}

struct CompiledStatement {
    statement: PolicyStatement,
    subjects: Vec<Regex>,
    resources: Vec<Regex>,
    actions: Vec<Regex>,
}

impl CompiledStatement {
    fn compile(statement: PolicyStatement) -> Result<Self, AuthError> {
        Ok(Self {
            subjects: compile_patterns(&statement.subjects)?,
            resources: compile_patterns(&statement.resources)?,
            actions: compile_patterns(&statement.actions)?,
            statement,
        })
    }

    fn matches(&self, request: &PolicyRequest) -> bool {
        any_match(&self.subjects, &request.subject)
            && any_match(&self.resources, &request.resource)
            && any_match(&self.actions, &request.action)
            && self
                .statement
                .conditions
                .iter()
                .all(|(key, expected)| request.context.get(key) == Some(expected))
    }
}

/// In-memory statement set.
#[derive(Default)]
pub struct StatementPolicy {
    statements: Vec<CompiledStatement>,
}

impl StatementPolicy {
    /// A policy with no statements denies everything.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(statements: Vec<PolicyStatement>) -> Result<Self, AuthError> {
        let statements = statements
            .into_iter()
            .map(CompiledStatement::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { statements })
    }

    pub fn from_json(document: &str) -> Result<Self, AuthError> {
        let doc: PolicyDocument = serde_json::from_str(document)
            .map_err(|e| AuthError::Configuration(format!("invalid policy document: {e}")))?;
        Self::new(doc.statements)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl PolicyEvaluator for StatementPolicy {
    fn evaluate(&self, request: &PolicyRequest) -> Decision {
        let mut allowed = false;
        for compiled in self.statements.iter().filter(|s| s.matches(request)) {
            match compiled.statement.effect {
                Effect::Deny => {
                    tracing::debug!(
                        statement = %compiled.statement.id,
                        "Denied {} on {} for {}",
                        request.action,
                        request.resource,
                        request.subject
                    );
                    return Decision::Deny;
                }
                Effect::Allow => allowed = true,
            }
        }
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, AuthError> {
    patterns.iter().map(|p| compile_pattern(p)).collect()
}

fn compile_pattern(pattern: &str) -> Result<Regex, AuthError> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$"))
        .map_err(|e| AuthError::Configuration(format!("invalid policy pattern '{pattern}': {e}")))
}

fn any_match(patterns: &[Regex], value: &str) -> bool {
    patterns.iter().any(|re| re.is_match(value))
}
