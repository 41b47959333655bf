//! Logical agent identities bound to mesh nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Prefix of agent IDs synthesized from node IDs.
pub const AGENT_ID_PREFIX: &str = "agent-";

/// Deterministic agent ID for a node.
pub fn agent_id_for_node(node_id: &str) -> String {
    format!("{AGENT_ID_PREFIX}{node_id}")
}

/// An agent as registered with the agent registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Agent ID.
    pub id: String,
    /// Display name, taken from the node.
    pub name: String,
    /// Node the agent runs on.
    pub node_id: String,
    /// Hostname of that node.
    pub hostname: String,
    /// Tags the node carried at registration time.
    pub tags: Vec<String>,
    /// Mesh addresses of the node.
    pub ips: Vec<IpAddr>,
    /// When the agent was registered.
    pub registered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_is_deterministic() {
        assert_eq!(agent_id_for_node("n123"), "agent-n123");
        assert_eq!(agent_id_for_node("n123"), agent_id_for_node("n123"));
        assert_ne!(agent_id_for_node("n1"), agent_id_for_node("n2"));
    }
}
