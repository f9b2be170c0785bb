//! Compromised-password evaluator - k-anonymity lookup of the SHA-1 digest.

use std::sync::Arc;

use secrecy::ExposeSecret;

use super::{EvaluationInput, EvaluationResult};
use crate::client::{HashedPasswordUsage, RangeClient};
use crate::hash::PasswordHash;
use crate::rule::Rule;

pub(crate) struct CompromisedPasswordEvaluator {
    client: Arc<dyn RangeClient>,
}

impl CompromisedPasswordEvaluator {
    pub(crate) fn new(client: Arc<dyn RangeClient>) -> Self {
        Self { client }
    }

    /// Only the 5-character digest prefix leaves the process; the suffix is
    /// matched against the service's answer locally.
    ///
    /// # Returns
    /// - `Ok(vec![rule.violation_message_id])` if the digest is known with a non-zero count
    /// - `Ok(vec![])` for blank passwords and unknown digests
    /// - `Err(RangeService)` if the range service fails
    pub(crate) async fn evaluate(&self, rule: &Rule, input: &EvaluationInput<'_>) -> EvaluationResult {
        let password = input.password.expose_secret();
        if password.trim().is_empty() {
            return Ok(Vec::new());
        }

        let hash = PasswordHash::of(password);

        #[cfg(feature = "tracing")]
        tracing::debug!(prefix = hash.prefix(), "Checking password with prefix");

        let usages = self.client.range(hash.prefix()).await?;
        let usage_count = known_usage(&hash, &usages);

        #[cfg(feature = "tracing")]
        tracing::info!(rule = %rule.id, usage_count, "Compromised password lookup");

        if usage_count > 0 {
            Ok(vec![rule.violation_message_id.clone()])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Usage count of the digest among `usages`, 0 when absent.
fn known_usage(hash: &PasswordHash, usages: &[HashedPasswordUsage]) -> u64 {
    usages
        .iter()
        .find(|u| u.usage_count > 0 && u.suffix.eq_ignore_ascii_case(hash.suffix()))
        .map(|u| u.usage_count)
        .unwrap_or(0)
}
