//! Validation engine - ordered rule dispatch with early exit on strong failures.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::mpsc;

use crate::client::{DelegateClient, HttpDelegateClient, HttpRangeClient, RangeClient};
use crate::config::PolicyConfig;
use crate::context::RequestContext;
use crate::error::PolicyError;
use crate::evaluators::{
    CompromisedPasswordEvaluator, DelegateEvaluator, EvaluationInput, EvaluatorSet,
};
use crate::identity::IdentityResolver;
use crate::registry::RuleRegistry;
use crate::rule::ValidationResult;

/// Validates passwords against each tenant's configured rules.
///
/// The engine holds no mutable state; one instance can serve concurrent
/// calls for any number of tenants.
pub struct ValidationEngine {
    registry: Arc<dyn RuleRegistry>,
    identity: Arc<dyn IdentityResolver>,
    evaluators: EvaluatorSet,
}

impl ValidationEngine {
    pub fn new(
        registry: Arc<dyn RuleRegistry>,
        identity: Arc<dyn IdentityResolver>,
        delegate_client: Arc<dyn DelegateClient>,
        range_client: Arc<dyn RangeClient>,
    ) -> Self {
        Self {
            registry,
            identity,
            evaluators: EvaluatorSet::new(
                DelegateEvaluator::new(delegate_client),
                CompromisedPasswordEvaluator::new(range_client),
            ),
        }
    }

    /// Builds an engine whose delegate and range calls go over HTTP with the
    /// configured timeout and padding. Both share one connection pool.
    ///
    /// # Errors
    /// Fails only if the HTTP client cannot be built (e.g. the TLS backend
    /// does not initialise).
    pub fn from_config(
        config: &PolicyConfig,
        registry: Arc<dyn RuleRegistry>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.lookup_timeout())
            .timeout(config.lookup_timeout())
            .build()?;
        let delegate = HttpDelegateClient::with_client(http.clone());
        let range = HttpRangeClient::with_client(
            http,
            config.range_service_url(),
            config.range_padding(),
        );
        Ok(Self::new(registry, identity, Arc::new(delegate), Arc::new(range)))
    }

    /// Validates `password` for `owner_id` within `ctx`'s tenant.
    ///
    /// Rules run one at a time in ascending `order`; rules sharing an order
    /// keep the registry's order. Violations are collected in evaluation
    /// order. The first strong rule that reports a violation ends the
    /// evaluation and later rules are never invoked.
    ///
    /// # Errors
    /// Fails without a partial result when the owner cannot be resolved, a
    /// rule is misconfigured, or a dependency a verdict needs is unavailable.
    pub async fn validate(
        &self,
        ctx: &RequestContext,
        password: &SecretString,
        owner_id: &str,
    ) -> Result<ValidationResult, PolicyError> {
        let owner_name = match self.identity.resolve_owner_name(ctx, owner_id).await {
            Ok(name) => name,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::error!(tenant = ctx.tenant(), owner_id, error = %e, "Owner resolution failed");
                return Err(e.into());
            }
        };

        let mut rules = self.registry.list_enabled_rules(ctx.tenant()).await?;
        rules.sort_by_key(|r| r.order);

        let input = EvaluationInput {
            password,
            owner_id,
            owner_name: &owner_name,
            ctx,
        };
        let mut violations = Vec::new();

        for rule in &rules {
            let evaluator = self.evaluators.select(&rule.kind)?;

            #[cfg(feature = "tracing")]
            tracing::info!(
                tenant = ctx.tenant(),
                rule = %rule.id,
                name = %rule.name,
                kind = ?rule.kind,
                severity = ?rule.severity,
                "Validating password with rule"
            );

            let messages = evaluator.evaluate(rule, &input).await?;

            #[cfg(feature = "tracing")]
            tracing::info!(rule = %rule.id, ?messages, "Validation errors");

            let failed = !messages.is_empty();
            violations.extend(messages);

            if failed && rule.is_strong() {
                break;
            }
        }

        let result = ValidationResult::from_violations(violations);

        #[cfg(feature = "tracing")]
        tracing::info!(
            tenant = ctx.tenant(),
            accepted = result.is_accepted(),
            violations = ?result.violations(),
            "Validation result"
        );

        Ok(result)
    }

    /// Runs [`validate`](Self::validate) and sends the outcome on `tx`.
    pub async fn validate_tx(
        &self,
        ctx: &RequestContext,
        password: &SecretString,
        owner_id: &str,
        tx: mpsc::Sender<Result<ValidationResult, PolicyError>>,
    ) {
        let outcome = self.validate(ctx, password, owner_id).await;

        if let Err(e) = tx.send(outcome).await {
            #[cfg(feature = "tracing")]
            tracing::error!("Failed to send password validation result: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCategory, IdentityError};
    use crate::evaluators::fakes::{FakeDelegate, FakeRange};
    use crate::identity::StaticIdentityResolver;
    use crate::registry::InMemoryRuleRegistry;
    use crate::rule::{Rule, RuleKind, Severity};

    const PASSWORD_SUFFIX: &str = "1E4C9B93F3F0682250B6CF8331B7EE68FD8";

    struct Rig {
        engine: ValidationEngine,
        delegate: Arc<FakeDelegate>,
        range: Arc<FakeRange>,
    }

    fn rig(rules: Vec<Rule>, delegate: FakeDelegate, range: FakeRange) -> Rig {
        let registry = InMemoryRuleRegistry::new();
        for rule in rules {
            registry.upsert_rule("diku", rule).unwrap();
        }
        let identity = StaticIdentityResolver::new().with_user("u-1", "alice");
        let delegate = Arc::new(delegate);
        let range = Arc::new(range);
        let engine = ValidationEngine::new(
            Arc::new(registry),
            Arc::new(identity),
            delegate.clone(),
            range.clone(),
        );
        Rig {
            engine,
            delegate,
            range,
        }
    }

    fn pattern_rig(rules: Vec<Rule>) -> Rig {
        rig(rules, FakeDelegate::answering(200, r#"{"result":"valid"}"#), FakeRange::serving(""))
    }

    fn ctx() -> RequestContext {
        RequestContext::new("diku", "http://gateway:9130").with_token("token")
    }

    fn secret(password: &str) -> SecretString {
        SecretString::new(password.to_string().into())
    }

    fn length_and_digit_rules() -> Vec<Rule> {
        vec![
            Rule::pattern("length", 0, Severity::Strong, "^.{8,}$", "too-short"),
            Rule::pattern("digit", 1, Severity::Strong, ".*[0-9].*", "no-digit"),
        ]
    }

    #[tokio::test]
    async fn test_strong_failure_stops_evaluation() {
        let rig = pattern_rig(length_and_digit_rules());
        let result = rig.engine.validate(&ctx(), &secret("short"), "u-1").await.unwrap();

        assert!(!result.is_accepted());
        assert_eq!(result.violations(), ["too-short".to_string()]);
    }

    #[tokio::test]
    async fn test_all_rules_pass() {
        let rig = pattern_rig(length_and_digit_rules());
        let result = rig
            .engine
            .validate(&ctx(), &secret("longenough1"), "u-1")
            .await
            .unwrap();

        assert!(result.is_accepted());
        assert!(result.violations().is_empty());
    }

    #[tokio::test]
    async fn test_soft_failures_accumulate_in_order() {
        let rig = pattern_rig(vec![
            Rule::pattern("digit", 2, Severity::Soft, ".*[0-9].*", "no-digit"),
            Rule::pattern("length", 1, Severity::Soft, "^.{8,}$", "too-short"),
            Rule::pattern("upper", 3, Severity::Soft, ".*[A-Z].*", "no-upper"),
        ]);
        let result = rig.engine.validate(&ctx(), &secret("abc"), "u-1").await.unwrap();

        assert_eq!(result.violations(), ["too-short", "no-digit", "no-upper"].map(String::from));
    }

    #[tokio::test]
    async fn test_equal_order_keeps_registry_order() {
        let rig = pattern_rig(vec![
            Rule::pattern("b", 1, Severity::Soft, "^x$", "second-inserted-first"),
            Rule::pattern("a", 1, Severity::Soft, "^y$", "second-inserted-second"),
            Rule::pattern("c", 0, Severity::Soft, "^z$", "lowest-order"),
        ]);
        let result = rig.engine.validate(&ctx(), &secret("q"), "u-1").await.unwrap();

        assert_eq!(
            result.violations(),
            ["lowest-order", "second-inserted-first", "second-inserted-second"].map(String::from)
        );
    }

    #[tokio::test]
    async fn test_user_name_placeholder_uses_resolved_owner() {
        let rig = pattern_rig(vec![Rule::pattern(
            "no-user-name",
            0,
            Severity::Strong,
            "^(?!.*<USER_NAME>).*$",
            "contains-user-name",
        )]);

        let rejected = rig.engine.validate(&ctx(), &secret("alice123"), "u-1").await.unwrap();
        assert_eq!(rejected.violations(), ["contains-user-name".to_string()]);

        let accepted = rig.engine.validate(&ctx(), &secret("bob123"), "u-1").await.unwrap();
        assert!(accepted.is_accepted());
    }

    #[tokio::test]
    async fn test_no_later_calls_after_strong_failure() {
        let rig = rig(
            vec![
                Rule::pattern("length", 0, Severity::Strong, "^.{8,}$", "too-short"),
                Rule::delegate("remote", 1, Severity::Strong, "/pv/check", "remote-failed"),
                Rule::compromised_password("pwned", 2, Severity::Strong, "compromised"),
            ],
            FakeDelegate::answering(200, r#"{"result":"valid"}"#),
            FakeRange::serving(""),
        );

        let result = rig.engine.validate(&ctx(), &secret("short"), "u-1").await.unwrap();
        assert_eq!(result.violations(), ["too-short".to_string()]);
        assert_eq!(rig.delegate.calls(), 0);
        assert_eq!(rig.range.calls(), 0);
    }

    #[tokio::test]
    async fn test_soft_failure_does_not_stop_later_rules() {
        let rig = rig(
            vec![
                Rule::pattern("length", 0, Severity::Soft, "^.{8,}$", "too-short"),
                Rule::delegate("remote", 1, Severity::Strong, "/pv/check", "remote-failed"),
            ],
            FakeDelegate::answering(200, r#"{"result":"invalid","messages":["remote-says-no"]}"#),
            FakeRange::serving(""),
        );

        let result = rig.engine.validate(&ctx(), &secret("short"), "u-1").await.unwrap();
        assert_eq!(result.violations(), ["too-short", "remote-says-no"].map(String::from));
        assert_eq!(rig.delegate.calls(), 1);
    }

    #[tokio::test]
    async fn test_soft_delegate_outage_is_absorbed() {
        let rig = rig(
            vec![
                Rule::delegate("remote", 0, Severity::Soft, "/pv/check", "remote-failed"),
                Rule::pattern("length", 1, Severity::Strong, "^.{8,}$", "too-short"),
            ],
            FakeDelegate::answering(500, "down"),
            FakeRange::serving(""),
        );

        let result = rig.engine.validate(&ctx(), &secret("short"), "u-1").await.unwrap();
        assert_eq!(result.violations(), ["too-short".to_string()]);
    }

    #[tokio::test]
    async fn test_strong_delegate_outage_aborts() {
        let rig = rig(
            vec![
                Rule::delegate("remote", 0, Severity::Strong, "/pv/check", "remote-failed"),
                Rule::compromised_password("pwned", 1, Severity::Strong, "compromised"),
            ],
            FakeDelegate::answering(500, "down"),
            FakeRange::serving(""),
        );

        let err = rig
            .engine
            .validate(&ctx(), &secret("longenough1"), "u-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::DelegateUnavailable { .. }));
        assert_eq!(err.category(), ErrorCategory::Dependency);
        assert_eq!(rig.range.calls(), 0);
    }

    #[tokio::test]
    async fn test_compromised_password_rejected() {
        let body = format!("{}:42\n", PASSWORD_SUFFIX);
        let rig = rig(
            vec![Rule::compromised_password("pwned", 0, Severity::Strong, "compromised")],
            FakeDelegate::answering(200, "{}"),
            FakeRange::serving(&body),
        );

        let result = rig.engine.validate(&ctx(), &secret("password"), "u-1").await.unwrap();
        assert_eq!(result.violations(), ["compromised".to_string()]);
        assert_eq!(rig.range.prefixes.lock().unwrap().as_slice(), ["5BAA6".to_string()]);
    }

    #[tokio::test]
    async fn test_range_failure_aborts() {
        let rig = rig(
            vec![Rule::compromised_password("pwned", 0, Severity::Soft, "compromised")],
            FakeDelegate::answering(200, "{}"),
            FakeRange::failing(),
        );

        let err = rig
            .engine
            .validate(&ctx(), &secret("password"), "u-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::RangeService(_)));
    }

    #[tokio::test]
    async fn test_unknown_owner_is_identity_error() {
        let rig = pattern_rig(length_and_digit_rules());

        let err = rig
            .engine
            .validate(&ctx(), &secret("longenough1"), "u-404")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::Identity(IdentityError::NotFound(_))));
        assert_eq!(err.category(), ErrorCategory::Identity);
    }

    #[tokio::test]
    async fn test_unsupported_kind_aborts_before_later_rules() {
        let mut mystery = Rule::pattern("mystery", 0, Severity::Soft, "", "mystery");
        mystery.kind = RuleKind::Unsupported("Dictionary".to_string());
        let rig = rig(
            vec![
                mystery,
                Rule::delegate("remote", 1, Severity::Soft, "/pv/check", "remote-failed"),
            ],
            FakeDelegate::answering(200, r#"{"result":"valid"}"#),
            FakeRange::serving(""),
        );

        let err = rig
            .engine
            .validate(&ctx(), &secret("longenough1"), "u-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::UnsupportedRuleKind(ref k) if k == "Dictionary"));
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(rig.delegate.calls(), 0);
    }

    #[tokio::test]
    async fn test_disabled_rules_are_skipped() {
        let mut disabled = Rule::pattern("digit", 0, Severity::Strong, ".*[0-9].*", "no-digit");
        disabled.enabled = false;
        let rig = pattern_rig(vec![disabled]);

        let result = rig.engine.validate(&ctx(), &secret("nodigits"), "u-1").await.unwrap();
        assert!(result.is_accepted());
    }

    #[tokio::test]
    async fn test_other_tenant_rules_do_not_apply() {
        let rig = pattern_rig(length_and_digit_rules());
        let other = RequestContext::new("other", "http://gateway:9130");

        let result = rig.engine.validate(&other, &secret("short"), "u-1").await.unwrap();
        assert!(result.is_accepted());
    }

    #[tokio::test]
    async fn test_delegate_is_called_on_tenant_gateway() {
        let rig = rig(
            vec![Rule::delegate("remote", 0, Severity::Soft, "/pv/check", "remote-failed")],
            FakeDelegate::answering(200, r#"{"result":"valid"}"#),
            FakeRange::serving(""),
        );

        rig.engine.validate(&ctx(), &secret("whatever"), "u-1").await.unwrap();
        assert_eq!(
            rig.delegate.urls.lock().unwrap().as_slice(),
            ["http://gateway:9130/pv/check".to_string()]
        );
    }

    #[tokio::test]
    async fn test_validate_tx() {
        let rig = pattern_rig(length_and_digit_rules());
        let (tx, mut rx) = mpsc::channel(1);

        rig.engine.validate_tx(&ctx(), &secret("short"), "u-1", tx).await;

        let outcome = rx.recv().await.expect("Should receive validation outcome");
        assert_eq!(outcome.unwrap().into_violations(), vec!["too-short".to_string()]);
    }

    #[test]
    fn test_from_config_builds_http_clients() {
        let config = PolicyConfig::default().with_range_service_url("http://localhost:8089");
        let engine = ValidationEngine::from_config(
            &config,
            Arc::new(InMemoryRuleRegistry::new()),
            Arc::new(StaticIdentityResolver::new()),
        );
        assert!(engine.is_ok());
    }

    #[tokio::test]
    async fn test_from_config_range_lookup_over_http() {
        use crate::client::test_support::serve_once;

        let (url, server) = serve_once(200, "1E4C9B93F3F0682250B6CF8331B7EE68FD8:42\n").await;
        let config = PolicyConfig::default()
            .with_range_service_url(url)
            .with_range_padding(true);
        let registry = InMemoryRuleRegistry::new();
        registry
            .upsert_rule(
                "diku",
                Rule::compromised_password("pwned", 0, Severity::Strong, "compromised"),
            )
            .unwrap();
        let engine = ValidationEngine::from_config(
            &config,
            Arc::new(registry),
            Arc::new(StaticIdentityResolver::new().with_user("u-1", "alice")),
        )
        .unwrap();

        let result = engine.validate(&ctx(), &secret("password"), "u-1").await.unwrap();
        assert_eq!(result.violations(), ["compromised".to_string()]);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /range/5BAA6 HTTP/1.1"));
        assert!(request.to_lowercase().contains("add-padding: true"));
    }
}
