//! Agent registry collaborator.

use aoi_types::agent::AgentIdentity;
use aoi_types::{AoiError, AoiResult};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Registry of logical agents, owned outside this crate.
#[async_trait]
pub trait AgentRegistry: Send + Sync + 'static {
    /// Register an agent. Fails with [`AoiError::AgentAlreadyExists`] on duplicates.
    async fn register(&self, identity: AgentIdentity) -> AoiResult<()>;

    /// Look up an agent by ID.
    async fn get_agent(&self, agent_id: &str) -> AoiResult<Option<AgentIdentity>>;
}

/// In-process [`AgentRegistry`].
#[derive(Debug, Default)]
pub struct InMemoryAgentRegistry {
    agents: DashMap<String, AgentIdentity>,
}

impl InMemoryAgentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent is registered.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// All registered agents.
    pub fn list(&self) -> Vec<AgentIdentity> {
        self.agents.iter().map(|r| r.value().clone()).collect()
    }
}

#[async_trait]
impl AgentRegistry for InMemoryAgentRegistry {
    async fn register(&self, identity: AgentIdentity) -> AoiResult<()> {
        match self.agents.entry(identity.id.clone()) {
            Entry::Occupied(_) => Err(AoiError::AgentAlreadyExists(identity.id)),
            Entry::Vacant(slot) => {
                slot.insert(identity);
                Ok(())
            }
        }
    }

    async fn get_agent(&self, agent_id: &str) -> AoiResult<Option<AgentIdentity>> {
        Ok(self.agents.get(agent_id).map(|r| r.value().clone()))
    }
}
