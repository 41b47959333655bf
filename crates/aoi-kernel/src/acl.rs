//! Tag-based access control.
//!
//! The [`PermissionEngine`] holds a mutable tag → (resource patterns,
//! permission) rule table. A node's effective permissions are the union of
//! the rules of every tag it carries; when several tags grant the same
//! literal pattern, the highest level wins. Distinct pattern strings are
//! never merged, even when they overlap (`agents/*` and `agents/**` stay
//! separate rules). Checks are default-deny.

use crate::rule_store::AclRuleStore;
use crate::store::TagSnapshotStore;
use aoi_tailnet::NetworkIdentityClient;
use aoi_types::config::AclConfig;
use aoi_types::{
    AccessRule, Action, AoiError, AoiResult, PermissionCheckResult, PermissionLevel,
    TagPermissionMapping,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Prefix every mesh tag carries.
pub const TAG_PREFIX: &str = "tag:";

/// Whether `pattern` covers `target`.
///
/// | Pattern      | Matches                                           |
/// |--------------|---------------------------------------------------|
/// | `target`     | always                                            |
/// | `*`          | anything                                          |
/// | `prefix/*`   | `prefix/<segment>` with no further `/`            |
/// | `prefix/**`  | anything under `prefix/`                          |
/// | otherwise    | never                                             |
pub fn match_resource(pattern: &str, target: &str) -> bool {
    if pattern == target || pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix("/**") {
        return target
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'));
    }
    if let Some(prefix) = pattern.strip_suffix("/*") {
        return target
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|segment| !segment.contains('/'));
    }
    false
}

fn validate_tag(tag: &str) -> AoiResult<()> {
    match tag.strip_prefix(TAG_PREFIX) {
        Some(name) if !name.is_empty() => Ok(()),
        _ => Err(AoiError::InvalidTagFormat(tag.to_string())),
    }
}

/// A node whose tags differ from the last observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagChange {
    /// Node ID.
    pub node_id: String,
    /// Tags at the previous observation; `None` the first time a node is seen.
    pub previous: Option<Vec<String>>,
    /// Tags now.
    pub current: Vec<String>,
}

/// Result of a best-effort bulk sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Nodes synced successfully.
    pub synced: usize,
    /// Rules pushed across all successful nodes.
    pub rules: usize,
    /// `(node_id, error)` for each node that failed.
    pub failures: Vec<(String, String)>,
}

/// Resolves tags to permissions and answers authorization checks.
pub struct PermissionEngine {
    mappings: RwLock<HashMap<String, TagPermissionMapping>>,
    default_permission: PermissionLevel,
    client: Arc<dyn NetworkIdentityClient>,
    rule_store: Arc<dyn AclRuleStore>,
    snapshots: Arc<TagSnapshotStore>,
}

impl PermissionEngine {
    /// Create an engine with an empty rule table.
    pub fn new(
        client: Arc<dyn NetworkIdentityClient>,
        rule_store: Arc<dyn AclRuleStore>,
        snapshots: Arc<TagSnapshotStore>,
        default_permission: PermissionLevel,
    ) -> Self {
        Self {
            mappings: RwLock::new(HashMap::new()),
            default_permission,
            client,
            rule_store,
            snapshots,
        }
    }

    /// Create an engine loaded with the configured mappings.
    ///
    /// Fails on the first invalid tag.
    pub fn from_config(
        config: &AclConfig,
        client: Arc<dyn NetworkIdentityClient>,
        rule_store: Arc<dyn AclRuleStore>,
        snapshots: Arc<TagSnapshotStore>,
    ) -> AoiResult<Self> {
        let engine = Self::new(client, rule_store, snapshots, config.default_permission);
        for mapping in &config.tag_mappings {
            engine.add_tag_mapping(&mapping.tag, mapping.resources.clone(), mapping.permission)?;
        }
        info!(
            mappings = config.tag_mappings.len(),
            default_permission = %config.default_permission,
            "Permission engine loaded"
        );
        Ok(engine)
    }

    /// Level granted when no rule matches.
    pub fn default_permission(&self) -> PermissionLevel {
        self.default_permission
    }

    /// Add or replace the mapping for `tag`.
    pub fn add_tag_mapping(
        &self,
        tag: &str,
        resources: Vec<String>,
        permission: PermissionLevel,
    ) -> AoiResult<()> {
        validate_tag(tag)?;
        let mapping = TagPermissionMapping {
            tag: tag.to_string(),
            resources,
            permission,
        };
        let mut mappings = self.mappings.write().unwrap_or_else(|e| e.into_inner());
        let replaced = mappings.insert(tag.to_string(), mapping).is_some();
        debug!(tag, %permission, replaced, "Tag mapping set");
        Ok(())
    }

    /// Remove the mapping for `tag`.
    pub fn remove_tag_mapping(&self, tag: &str) -> AoiResult<TagPermissionMapping> {
        let mut mappings = self.mappings.write().unwrap_or_else(|e| e.into_inner());
        let removed = mappings
            .remove(tag)
            .ok_or_else(|| AoiError::TagMappingNotFound(tag.to_string()))?;
        debug!(tag, "Tag mapping removed");
        Ok(removed)
    }

    /// All mappings, sorted by tag.
    pub fn get_tag_mappings(&self) -> Vec<TagPermissionMapping> {
        let mappings = self.mappings.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<TagPermissionMapping> = mappings.values().cloned().collect();
        all.sort_by(|a, b| a.tag.cmp(&b.tag));
        all
    }

    /// Effective rules for a tag set, one per literal pattern, in first-seen order.
    pub fn resolve<S: AsRef<str>>(&self, tags: &[S]) -> Vec<AccessRule> {
        let mappings = self.mappings.read().unwrap_or_else(|e| e.into_inner());
        let mut rules: Vec<AccessRule> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for mapping in tags.iter().filter_map(|t| mappings.get(t.as_ref())) {
            for pattern in &mapping.resources {
                match index.get(pattern.as_str()) {
                    Some(&i) => {
                        let rule = &mut rules[i];
                        rule.permission = rule.permission.max(mapping.permission);
                    }
                    None => {
                        index.insert(pattern.as_str(), rules.len());
                        rules.push(AccessRule::new(pattern.clone(), mapping.permission));
                    }
                }
            }
        }
        rules
    }

    /// Whether a caller with `tags` may perform `action` on `resource`.
    pub fn check<S: AsRef<str>>(
        &self,
        tags: &[S],
        resource: &str,
        action: &Action,
    ) -> PermissionCheckResult {
        let required = action.required_level();

        let granting = self
            .resolve(tags)
            .into_iter()
            .find(|rule| rule.permission >= required && match_resource(&rule.resource, resource));
        if let Some(rule) = granting {
            return PermissionCheckResult::allow(format!(
                "'{}' grants {} on {}",
                rule.resource, rule.permission, resource
            ));
        }

        if self.default_permission >= required {
            return PermissionCheckResult::allow(format!(
                "default permission {} covers {} on {}",
                self.default_permission, action, resource
            ));
        }

        debug!(%resource, %action, %required, "Permission denied");
        PermissionCheckResult::deny(format!(
            "{action} on {resource} requires {required}; no tag grants it and the default is {}",
            self.default_permission
        ))
    }

    /// [`PermissionEngine::check`] with the action given as a verb.
    pub fn check_str<S: AsRef<str>>(
        &self,
        tags: &[S],
        resource: &str,
        action: &str,
    ) -> PermissionCheckResult {
        self.check(tags, resource, &Action::parse(action))
    }

    /// Effective rules for a tag set.
    pub fn get_permissions_for_tags<S: AsRef<str>>(&self, tags: &[S]) -> Vec<AccessRule> {
        self.resolve(tags)
    }

    /// Effective rules for a node, using its current tags.
    pub async fn get_permissions_for_node(&self, node_id: &str) -> AoiResult<Vec<AccessRule>> {
        let tags = self.client.get_node_tags(node_id).await?;
        Ok(self.resolve(&tags))
    }

    /// Push a node's effective rules, attributed to `agent_id`, to the rule store.
    ///
    /// Returns the number of rules pushed.
    pub async fn sync_node_acl(&self, node_id: &str, agent_id: &str) -> AoiResult<usize> {
        let rules = self.get_permissions_for_node(node_id).await?;
        let count = rules.len();
        for rule in rules {
            self.rule_store.add_rule(rule.with_agent(agent_id)).await?;
        }
        info!(node = %node_id, agent = %agent_id, rules = count, "Synced node ACL");
        Ok(count)
    }

    /// Sync every `node_id → agent_id` pair, continuing past failures.
    pub async fn sync_all_nodes(&self, nodes: &HashMap<String, String>) -> SyncReport {
        let mut report = SyncReport::default();
        let mut pairs: Vec<(&String, &String)> = nodes.iter().collect();
        pairs.sort();

        for (node_id, agent_id) in pairs {
            match self.sync_node_acl(node_id, agent_id).await {
                Ok(count) => {
                    report.synced += 1;
                    report.rules += count;
                }
                Err(e) => {
                    warn!(node = %node_id, agent = %agent_id, error = %e, "Node ACL sync failed");
                    report.failures.push((node_id.clone(), e.to_string()));
                }
            }
        }
        report
    }

    /// Peers whose tag set changed since the last call.
    ///
    /// A node seen for the first time always counts as changed. Tag order is
    /// ignored.
    pub async fn detect_tag_changes(&self) -> AoiResult<Vec<TagChange>> {
        let peers = self.client.get_peers().await?;
        let mut changes = Vec::new();

        for peer in peers {
            let mut current = peer.tags.clone();
            current.sort();
            current.dedup();

            let previous = self.snapshots.get(&peer.id);
            if previous.as_ref() == Some(&current) {
                continue;
            }
            self.snapshots.replace(&peer.id, current.clone());
            debug!(node = %peer.id, ?previous, ?current, "Tag change detected");
            changes.push(TagChange {
                node_id: peer.id,
                previous,
                current,
            });
        }
        Ok(changes)
    }
}
