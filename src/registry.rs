//! Rule registry
//!
//! Supplies each tenant's enabled rules to the engine. [`InMemoryRuleRegistry`]
//! keeps rules in memory and can be seeded from a JSON rules file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::config::PolicyConfig;
use crate::error::RegistryError;
use crate::rule::Rule;

#[async_trait]
pub trait RuleRegistry: Send + Sync {
    /// Enabled rules of `tenant`, in a deterministic order for a fixed rule set.
    async fn list_enabled_rules(&self, tenant: &str) -> Result<Vec<Rule>, RegistryError>;
}

/// Tenant-keyed rule store.
///
/// Rules of a tenant are kept in insertion order; replacing a rule keeps its
/// position.
#[derive(Debug, Default)]
pub struct InMemoryRuleRegistry {
    rules: RwLock<HashMap<String, Vec<Rule>>>,
}

impl InMemoryRuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads rules from the file named by [`PolicyConfig::rules_path`].
    pub fn from_config(config: &PolicyConfig) -> Result<Self, RegistryError> {
        Self::from_path(config.rules_path())
    }

    /// Loads rules from a JSON file shaped `{ "<tenant>": [rule, ...] }`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File does not exist
    /// - File cannot be read
    /// - File is empty
    /// - File is not a valid rules document
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let path = path.as_ref();

        if !path.exists() {
            #[cfg(feature = "tracing")]
            tracing::error!("Rules file not found: {}", path.display());
            return Err(RegistryError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;

        if content.trim().is_empty() {
            #[cfg(feature = "tracing")]
            tracing::error!("Rules file is empty: {}", path.display());
            return Err(RegistryError::EmptyFile);
        }

        let rules: HashMap<String, Vec<Rule>> = serde_json::from_str(&content)?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Rule registry loaded: {} rules for {} tenants from {:?}",
            rules.values().map(Vec::len).sum::<usize>(),
            rules.len(),
            path
        );

        Ok(Self {
            rules: RwLock::new(rules),
        })
    }

    /// Inserts a rule for `tenant`, replacing any rule with the same id.
    pub fn upsert_rule(&self, tenant: &str, rule: Rule) -> Result<(), RegistryError> {
        let mut guard = self.rules.write().map_err(|_| RegistryError::Poisoned)?;
        let rules = guard.entry(tenant.to_string()).or_default();
        match rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => rules.push(rule),
        }
        Ok(())
    }

    /// Removes a rule; returns whether it existed.
    pub fn remove_rule(&self, tenant: &str, rule_id: &str) -> Result<bool, RegistryError> {
        let mut guard = self.rules.write().map_err(|_| RegistryError::Poisoned)?;
        let Some(rules) = guard.get_mut(tenant) else {
            return Ok(false);
        };
        let before = rules.len();
        rules.retain(|r| r.id != rule_id);
        Ok(rules.len() != before)
    }
}

#[async_trait]
impl RuleRegistry for InMemoryRuleRegistry {
    async fn list_enabled_rules(&self, tenant: &str) -> Result<Vec<Rule>, RegistryError> {
        let guard = self.rules.read().map_err(|_| RegistryError::Poisoned)?;
        Ok(guard
            .get(tenant)
            .map(|rules| rules.iter().filter(|r| r.enabled).cloned().collect())
            .unwrap_or_default())
    }
}
