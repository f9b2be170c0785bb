//! Error taxonomy for the validation engine.
//!
//! Policy violations are never errors: they are reported through
//! [`ValidationResult`](crate::ValidationResult). Everything here aborts a
//! validation call.

use std::path::PathBuf;
use thiserror::Error;

/// Broad class of a [`PolicyError`], used by callers to choose a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A malformed or incompatible rule definition. Report as an internal error.
    Configuration,
    /// The password owner could not be resolved to exactly one identity.
    Identity,
    /// An external service needed for a verdict failed.
    Dependency,
}

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("No evaluator is registered for rule kind: {0}")]
    UnsupportedRuleKind(String),
    #[error("Invalid pattern in rule {rule_id}: {source}")]
    InvalidPatternRule {
        rule_id: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },
    #[error("Delegate rule {rule} could not be evaluated: {reason}")]
    DelegateUnavailable { rule: String, reason: String },
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("Compromised-password range service failed: {0}")]
    RangeService(#[from] RangeError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl PolicyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PolicyError::UnsupportedRuleKind(_) | PolicyError::InvalidPatternRule { .. } => {
                ErrorCategory::Configuration
            }
            PolicyError::Identity(_) => ErrorCategory::Identity,
            PolicyError::DelegateUnavailable { .. }
            | PolicyError::RangeService(_)
            | PolicyError::Registry(_) => ErrorCategory::Dependency,
        }
    }
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("User is not found: id = {0}")]
    NotFound(String),
    #[error("User id {owner} matches {matches} users")]
    Ambiguous { owner: String, matches: u64 },
    #[error("User lookup failed: {0}")]
    Lookup(String),
}

#[derive(Error, Debug)]
pub enum RangeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Range service returned HTTP {0}")]
    HttpStatus(u16),
    #[error("[line:{line}] Invalid format of the line: '{content}'")]
    InvalidLine { line: usize, content: String },
    #[error("[line:{line}] Invalid usage number value: {value}")]
    InvalidCount { line: usize, value: String },
}

#[derive(Error, Debug)]
pub enum DelegateError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Rules file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Failed to read rules file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Rules file is empty")]
    EmptyFile,
    #[error("Failed to parse rules file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Rule registry lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}
