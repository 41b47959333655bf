//! ACL rule-store collaborator.

use aoi_types::{AccessRule, AoiResult};
use async_trait::async_trait;
use std::sync::RwLock;

/// Destination for resolved, agent-attributed access rules.
#[async_trait]
pub trait AclRuleStore: Send + Sync + 'static {
    /// Record one rule.
    async fn add_rule(&self, rule: AccessRule) -> AoiResult<()>;
}

/// In-process [`AclRuleStore`] that keeps rules in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryAclRuleStore {
    rules: RwLock<Vec<AccessRule>>,
}

impl InMemoryAclRuleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded rules.
    pub fn rules(&self) -> Vec<AccessRule> {
        let rules = self.rules.read().unwrap_or_else(|e| e.into_inner());
        rules.clone()
    }

    /// Rules attributed to `agent_id`.
    pub fn rules_for(&self, agent_id: &str) -> Vec<AccessRule> {
        let rules = self.rules.read().unwrap_or_else(|e| e.into_inner());
        rules
            .iter()
            .filter(|r| r.agent_id.as_deref() == Some(agent_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AclRuleStore for InMemoryAclRuleStore {
    async fn add_rule(&self, rule: AccessRule) -> AoiResult<()> {
        let mut rules = self.rules.write().unwrap_or_else(|e| e.into_inner());
        rules.push(rule);
        Ok(())
    }
}
