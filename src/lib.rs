//! Password policy enforcement library
//!
//! This library decides whether a password is acceptable under a tenant's
//! configured rules and, if not, which rules rejected it.
//!
//! Each rule delegates to one of three evaluators:
//!
//! - **Pattern**: the password must fully match a regular expression, which
//!   may reference the owner's name through the `<USER_NAME>` placeholder
//! - **Delegate**: an external endpoint on the tenant gateway judges the password
//! - **CompromisedPassword**: k-anonymity lookup of the SHA-1 digest against a
//!   range service; only the first 5 hex characters leave the process
//!
//! Rules run in ascending `order`. A failing `Strong` rule stops evaluation;
//! `Soft` rules are advisory.
//!
//! # Features
//!
//! - `tracing` (default): Enables logging via tracing crate
//!
//! # Environment Variables
//!
//! See [`PolicyConfig::from_env`]:
//! `PWD_RANGE_SERVICE_URL`, `PWD_RANGE_PADDING`, `PWD_LOOKUP_TIMEOUT_MS`,
//! `PWD_RULES_PATH`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pwd_policy::{
//!     InMemoryRuleRegistry, PolicyConfig, RequestContext, StaticIdentityResolver,
//!     ValidationEngine,
//! };
//! use secrecy::SecretString;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PolicyConfig::from_env()?;
//! let registry = Arc::new(InMemoryRuleRegistry::from_config(&config)?);
//! let identity = Arc::new(StaticIdentityResolver::new().with_user("u-1", "alice"));
//! let engine = ValidationEngine::from_config(&config, registry, identity)?;
//!
//! let ctx = RequestContext::new("diku", "http://gateway:9130").with_token("token");
//! let password = SecretString::new("MyP@ssw0rd!".to_string().into());
//!
//! let result = engine.validate(&ctx, &password, "u-1").await?;
//! println!("Accepted: {}", result.is_accepted());
//! println!("Violations: {:?}", result.violations());
//! # Ok(())
//! # }
//! ```

// Internal modules
mod client;
mod config;
mod context;
mod engine;
mod error;
mod evaluators;
mod hash;
mod identity;
mod registry;
mod rule;

// Public API
pub use client::{
    DelegateClient, DelegatePayload, DelegateResponse, HashedPasswordUsage, HttpDelegateClient,
    HttpRangeClient, RangeClient, parse_range_body,
};
pub use config::PolicyConfig;
pub use context::{RequestContext, TENANT_HEADER, TOKEN_HEADER};
pub use engine::ValidationEngine;
pub use error::{
    ConfigError, DelegateError, ErrorCategory, IdentityError, PolicyError, RangeError,
    RegistryError,
};
pub use identity::{HttpUserResolver, IdentityResolver, StaticIdentityResolver};
pub use registry::{InMemoryRuleRegistry, RuleRegistry};
pub use rule::{Outcome, Rule, RuleKind, Severity, ValidationReport, ValidationResult};
