//! Pattern evaluator - the password must fully match the rule's expression.

use fancy_regex::Regex;
use secrecy::ExposeSecret;

use super::{EvaluationInput, EvaluationResult};
use crate::error::PolicyError;
use crate::rule::Rule;

const USER_NAME_PLACEHOLDER: &str = "<USER_NAME>";

pub(crate) struct PatternEvaluator;

impl PatternEvaluator {
    /// Checks the password against the rule's expression, with every
    /// `<USER_NAME>` replaced verbatim by the owner's name. The name is not
    /// escaped: regex metacharacters in it keep their meaning.
    ///
    /// # Returns
    /// - `Ok(vec![rule.violation_message_id])` if the password does not fully match
    /// - `Ok(vec![])` if it matches, or if the expression is blank
    /// - `Err(InvalidPatternRule)` if the expression does not compile
    pub(crate) fn evaluate(&self, rule: &Rule, input: &EvaluationInput<'_>) -> EvaluationResult {
        let expression = match rule.pattern_expression.as_deref() {
            Some(e) if !e.trim().is_empty() => e,
            _ => return Ok(Vec::new()),
        };

        let expression = expression.replace(USER_NAME_PLACEHOLDER, input.owner_name);

        #[cfg(feature = "tracing")]
        tracing::info!(rule = %rule.id, expression = %expression, "Validating password against pattern");

        let invalid = |source: fancy_regex::Error| PolicyError::InvalidPatternRule {
            rule_id: rule.id.clone(),
            source: Box::new(source),
        };

        let pattern = Regex::new(&full_match(&expression)).map_err(invalid)?;
        let matched = pattern
            .is_match(input.password.expose_secret())
            .map_err(invalid)?;

        #[cfg(feature = "tracing")]
        tracing::info!(rule = %rule.id, matched, "Password matching result");

        if matched {
            Ok(Vec::new())
        } else {
            Ok(vec![rule.violation_message_id.clone()])
        }
    }
}

/// Anchors `expression` so it must cover the entire input.
///
/// A trailing `#` comment in verbose mode would swallow the closing group,
/// so the group is closed on a new line when `x` is still on at the end.
fn full_match(expression: &str) -> String {
    if verbose_at_end(expression) {
        format!("^(?:{}\n)$", expression)
    } else {
        format!("^(?:{})$", expression)
    }
}

/// Whether the last inline flag group `(?flags)` leaves `x` enabled.
fn verbose_at_end(expression: &str) -> bool {
    let bytes = expression.as_bytes();
    let mut verbose = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'(' if bytes.get(i + 1) == Some(&b'?') => {
                let start = i + 2;
                let mut end = start;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphabetic() || bytes[end] == b'-')
                {
                    end += 1;
                }
                if end > start && bytes.get(end) == Some(&b')') {
                    let flags = &bytes[start..end];
                    let (on, off) = match flags.iter().position(|&b| b == b'-') {
                        Some(p) => (&flags[..p], &flags[p + 1..]),
                        None => (flags, &flags[flags.len()..]),
                    };
                    if off.contains(&b'x') {
                        verbose = false;
                    } else if on.contains(&b'x') {
                        verbose = true;
                    }
                }
                i = end;
            }
            _ => i += 1,
        }
    }

    verbose
}
