//! Delegate evaluator - asks an external endpoint to judge the password.

use std::sync::Arc;

use secrecy::ExposeSecret;

use super::{EvaluationInput, EvaluationResult};
use crate::client::{DelegateClient, DelegatePayload};
use crate::error::PolicyError;
use crate::rule::{Outcome, Rule, ValidationReport};

/// Statuses a delegate may answer with when it produced a verdict.
const SUCCESS_STATUSES: std::ops::RangeInclusive<u16> = 200..=202;

pub(crate) struct DelegateEvaluator {
    client: Arc<dyn DelegateClient>,
}

impl DelegateEvaluator {
    pub(crate) fn new(client: Arc<dyn DelegateClient>) -> Self {
        Self { client }
    }

    /// Posts the password to `rule.delegate_reference` on the tenant gateway.
    ///
    /// An `invalid` verdict yields the delegate's own messages, or the rule's
    /// message id when the delegate sent none. When no verdict can be obtained
    /// (transport failure, status outside 200-202, unreadable body) a strong
    /// rule aborts the call and a soft rule passes.
    ///
    /// A 200-202 answer whose body is not a valid report is therefore not a
    /// failed rule: a soft delegate that answers garbage lets the password
    /// through.
    pub(crate) async fn evaluate(&self, rule: &Rule, input: &EvaluationInput<'_>) -> EvaluationResult {
        let reference = match rule.delegate_reference.as_deref() {
            Some(r) if !r.trim().is_empty() => r,
            _ => return unavailable(rule, "rule has no delegate reference".to_string()),
        };

        let url = input.ctx.resolve(reference);
        let payload = DelegatePayload {
            password: input.password.expose_secret(),
            user_id: input.owner_id,
        };

        let response = match self.client.post(&url, input.ctx.headers(), &payload).await {
            Ok(response) => response,
            Err(e) => return unavailable(rule, e.to_string()),
        };

        if !SUCCESS_STATUSES.contains(&response.status) {
            return unavailable(rule, format!("{} returned status code {}", url, response.status));
        }

        let report: ValidationReport = match serde_json::from_str(&response.body) {
            Ok(report) => report,
            Err(e) => return unavailable(rule, format!("unreadable response from {}: {}", url, e)),
        };

        match report.result {
            Outcome::Valid => Ok(Vec::new()),
            Outcome::Invalid if report.messages.is_empty() => {
                Ok(vec![rule.violation_message_id.clone()])
            }
            Outcome::Invalid => Ok(report.messages),
        }
    }
}

fn unavailable(rule: &Rule, reason: String) -> EvaluationResult {
    if rule.is_strong() {
        #[cfg(feature = "tracing")]
        tracing::error!(rule = %rule.id, name = %rule.name, %reason, "Strong delegate rule could not be evaluated");
        Err(PolicyError::DelegateUnavailable {
            rule: rule.name.clone(),
            reason,
        })
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!(rule = %rule.id, name = %rule.name, %reason, "Soft delegate rule unavailable, treating as passed");
        Ok(Vec::new())
    }
}
