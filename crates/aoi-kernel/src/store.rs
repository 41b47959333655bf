//! Process-lifetime stores injected into the authenticator and permission engine.

use std::collections::HashMap;
use std::sync::RwLock;

/// Node ID → agent ID bindings created by auto-provisioning.
#[derive(Debug, Default)]
pub struct AgentBindingStore {
    bindings: RwLock<HashMap<String, String>>,
}

impl AgentBindingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Agent bound to `node_id`, if any.
    pub fn get(&self, node_id: &str) -> Option<String> {
        let bindings = self.bindings.read().unwrap_or_else(|e| e.into_inner());
        bindings.get(node_id).cloned()
    }

    /// Bind `node_id` to `agent_id` unless a binding exists.
    ///
    /// Returns the agent that ends up bound.
    pub fn bind_if_absent(&self, node_id: &str, agent_id: &str) -> String {
        let mut bindings = self.bindings.write().unwrap_or_else(|e| e.into_inner());
        bindings
            .entry(node_id.to_string())
            .or_insert_with(|| agent_id.to_string())
            .clone()
    }

    /// Remove a binding.
    pub fn remove(&self, node_id: &str) -> Option<String> {
        let mut bindings = self.bindings.write().unwrap_or_else(|e| e.into_inner());
        bindings.remove(node_id)
    }

    /// Snapshot of all bindings.
    pub fn list(&self) -> HashMap<String, String> {
        let bindings = self.bindings.read().unwrap_or_else(|e| e.into_inner());
        bindings.clone()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        let bindings = self.bindings.read().unwrap_or_else(|e| e.into_inner());
        bindings.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Last observed tag set per node, for drift detection.
#[derive(Debug, Default)]
pub struct TagSnapshotStore {
    snapshots: RwLock<HashMap<String, Vec<String>>>,
}

impl TagSnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last snapshot for `node_id`.
    pub fn get(&self, node_id: &str) -> Option<Vec<String>> {
        let snapshots = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        snapshots.get(node_id).cloned()
    }

    /// Store a new snapshot, returning the previous one.
    pub fn replace(&self, node_id: &str, tags: Vec<String>) -> Option<Vec<String>> {
        let mut snapshots = self.snapshots.write().unwrap_or_else(|e| e.into_inner());
        snapshots.insert(node_id.to_string(), tags)
    }

    /// Forget a node.
    pub fn remove(&self, node_id: &str) -> Option<Vec<String>> {
        let mut snapshots = self.snapshots.write().unwrap_or_else(|e| e.into_inner());
        snapshots.remove(node_id)
    }

    /// Number of tracked nodes.
    pub fn len(&self) -> usize {
        let snapshots = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        snapshots.len()
    }

    /// Whether no node is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_if_absent_keeps_first() {
        let store = AgentBindingStore::new();
        assert_eq!(store.bind_if_absent("n1", "agent-a"), "agent-a");
        assert_eq!(store.bind_if_absent("n1", "agent-b"), "agent-a");
        assert_eq!(store.get("n1").as_deref(), Some("agent-a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_binding() {
        let store = AgentBindingStore::new();
        store.bind_if_absent("n1", "agent-a");
        assert_eq!(store.remove("n1").as_deref(), Some("agent-a"));
        assert!(store.get("n1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_replace() {
        let store = TagSnapshotStore::new();
        assert!(store.replace("n1", vec!["tag:a".into()]).is_none());
        assert_eq!(
            store.replace("n1", vec!["tag:b".into()]),
            Some(vec!["tag:a".to_string()])
        );
        assert_eq!(store.get("n1"), Some(vec!["tag:b".to_string()]));
        store.remove("n1");
        assert!(store.is_empty());
    }
}
