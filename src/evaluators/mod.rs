//! Rule evaluators
//!
//! Each evaluator judges one rule kind against a password and its owner.

mod compromised;
mod delegate;
mod pattern;

pub(crate) use compromised::CompromisedPasswordEvaluator;
pub(crate) use delegate::DelegateEvaluator;
pub(crate) use pattern::PatternEvaluator;

use secrecy::SecretString;

use crate::context::RequestContext;
use crate::error::PolicyError;
use crate::rule::{Rule, RuleKind};

/// Result type for evaluator functions.
/// - `Ok(vec![])` - Rule passed
/// - `Ok(messages)` - Rule failed with violation message ids
/// - `Err(e)` - The rule could not be evaluated; aborts the call
pub(crate) type EvaluationResult = Result<Vec<String>, PolicyError>;

/// Everything an evaluator may look at for one rule.
pub(crate) struct EvaluationInput<'a> {
    pub password: &'a SecretString,
    pub owner_id: &'a str,
    pub owner_name: &'a str,
    pub ctx: &'a RequestContext,
}

/// The evaluator chosen for a rule.
pub(crate) enum Evaluator<'a> {
    Pattern(PatternEvaluator),
    Delegate(&'a DelegateEvaluator),
    CompromisedPassword(&'a CompromisedPasswordEvaluator),
}

impl Evaluator<'_> {
    pub(crate) async fn evaluate(&self, rule: &Rule, input: &EvaluationInput<'_>) -> EvaluationResult {
        match self {
            Evaluator::Pattern(e) => e.evaluate(rule, input),
            Evaluator::Delegate(e) => e.evaluate(rule, input).await,
            Evaluator::CompromisedPassword(e) => e.evaluate(rule, input).await,
        }
    }
}

/// Evaluators that hold outbound clients, built once per engine.
pub(crate) struct EvaluatorSet {
    delegate: DelegateEvaluator,
    compromised: CompromisedPasswordEvaluator,
}

impl EvaluatorSet {
    pub(crate) fn new(delegate: DelegateEvaluator, compromised: CompromisedPasswordEvaluator) -> Self {
        Self {
            delegate,
            compromised,
        }
    }

    /// Maps a rule kind to its evaluator. Kinds without an evaluator are a
    /// configuration error, never a silent pass.
    pub(crate) fn select(&self, kind: &RuleKind) -> Result<Evaluator<'_>, PolicyError> {
        match kind {
            RuleKind::Pattern => Ok(Evaluator::Pattern(PatternEvaluator)),
            RuleKind::Delegate => Ok(Evaluator::Delegate(&self.delegate)),
            RuleKind::CompromisedPassword => Ok(Evaluator::CompromisedPassword(&self.compromised)),
            RuleKind::Unsupported(raw) => Err(PolicyError::UnsupportedRuleKind(raw.clone())),
        }
    }
}
