//! Rule definitions and validation outcomes.

use serde::{Deserialize, Serialize};

/// Evaluation strategy a rule delegates to.
///
/// Persisted rule kinds are plain strings; anything this crate does not know
/// is kept as [`RuleKind::Unsupported`] so the evaluator selector can reject it
/// with the offending value instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleKind {
    Pattern,
    Delegate,
    CompromisedPassword,
    Unsupported(String),
}

impl From<String> for RuleKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Pattern" | "RegExp" => RuleKind::Pattern,
            "Delegate" | "Programmatic" => RuleKind::Delegate,
            "CompromisedPassword" | "PwnedPassword" => RuleKind::CompromisedPassword,
            _ => RuleKind::Unsupported(raw),
        }
    }
}

impl From<RuleKind> for String {
    fn from(kind: RuleKind) -> Self {
        match kind {
            RuleKind::Pattern => "Pattern".to_string(),
            RuleKind::Delegate => "Delegate".to_string(),
            RuleKind::CompromisedPassword => "CompromisedPassword".to_string(),
            RuleKind::Unsupported(raw) => raw,
        }
    }
}

/// How a failing rule affects the rest of the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Advisory: recorded, evaluation continues, dependency failures pass.
    #[serde(alias = "soft", alias = "SOFT")]
    Soft,
    /// Mandatory: a failure stops evaluation, dependency failures abort the call.
    #[serde(alias = "strong", alias = "STRONG")]
    Strong,
}

/// A tenant-scoped password policy rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub kind: RuleKind,
    pub severity: Severity,
    pub order: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub pattern_expression: Option<String>,
    #[serde(default)]
    pub delegate_reference: Option<String>,
    pub violation_message_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub module_name: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    /// Builds an enabled pattern rule.
    pub fn pattern(
        id: impl Into<String>,
        order: i32,
        severity: Severity,
        expression: impl Into<String>,
        violation_message_id: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: RuleKind::Pattern,
            severity,
            order,
            enabled: true,
            pattern_expression: Some(expression.into()),
            delegate_reference: None,
            violation_message_id: violation_message_id.into(),
            description: None,
            module_name: None,
        }
    }

    /// Builds an enabled delegate rule pointing at a gateway-relative path.
    pub fn delegate(
        id: impl Into<String>,
        order: i32,
        severity: Severity,
        reference: impl Into<String>,
        violation_message_id: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: RuleKind::Delegate,
            severity,
            order,
            enabled: true,
            pattern_expression: None,
            delegate_reference: Some(reference.into()),
            violation_message_id: violation_message_id.into(),
            description: None,
            module_name: None,
        }
    }

    /// Builds an enabled compromised-password rule.
    pub fn compromised_password(
        id: impl Into<String>,
        order: i32,
        severity: Severity,
        violation_message_id: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: RuleKind::CompromisedPassword,
            severity,
            order,
            enabled: true,
            pattern_expression: None,
            delegate_reference: None,
            violation_message_id: violation_message_id.into(),
            description: None,
            module_name: None,
        }
    }

    pub fn is_strong(&self) -> bool {
        self.severity == Severity::Strong
    }
}

/// Outcome of validating one password against a tenant's rules.
///
/// Violations keep rule evaluation order; the password is accepted exactly
/// when no violation was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    violations: Vec<String>,
}

impl ValidationResult {
    pub fn from_violations(violations: Vec<String>) -> Self {
        Self { violations }
    }

    pub fn accepted() -> Self {
        Self::default()
    }

    pub fn is_accepted(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<String> {
        self.violations
    }
}

/// `valid` / `invalid` marker used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Valid,
    Invalid,
}

/// Wire form of a validation outcome, shared by this engine's callers and by
/// delegate endpoints answering a validation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub result: Outcome,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl From<&ValidationResult> for ValidationReport {
    fn from(result: &ValidationResult) -> Self {
        Self {
            result: if result.is_accepted() {
                Outcome::Valid
            } else {
                Outcome::Invalid
            },
            messages: result.violations.clone(),
        }
    }
}
