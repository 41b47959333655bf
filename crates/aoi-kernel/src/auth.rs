//! Mesh-identity authentication.
//!
//! The [`Authenticator`] turns a caller's IP address into one of three
//! mutually exclusive outcomes: a verified mesh peer, a loopback caller
//! accepted under the development fallback, or an anonymous pass-through
//! (only when authentication is not required). Authenticated nodes can be
//! bound to a logical agent on first sight.

use crate::registry::AgentRegistry;
use crate::store::AgentBindingStore;
use aoi_tailnet::{is_loopback, NetworkIdentityClient};
use aoi_types::agent::{agent_id_for_node, AgentIdentity};
use aoi_types::config::{AuthConfig, FallbackMode};
use aoi_types::{AoiError, AoiResult, NodeInfo};
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Node ID, name, and hostname of the development pseudo-node.
pub const LOCALHOST_NODE_ID: &str = "localhost";

/// Tag carried by the development pseudo-node.
pub const DEVELOPMENT_TAG: &str = "tag:development";

/// How a peer identity was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Resolved through the mesh identity daemon.
    Tailnet,
    /// Loopback caller accepted by the development fallback.
    DevelopmentFallback,
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Tailnet => write!(f, "tailnet"),
            AuthMethod::DevelopmentFallback => write!(f, "development_fallback"),
        }
    }
}

/// A resolved caller identity attached to request scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerIdentity {
    /// The caller's node.
    pub node: NodeInfo,
    /// Agent bound to the node, if any.
    pub agent_id: Option<String>,
    /// How the identity was established.
    pub method: AuthMethod,
}

impl PeerIdentity {
    /// Whether the caller's node carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.node.has_tag(tag)
    }

    /// Tags of the caller's node.
    pub fn tags(&self) -> &[String] {
        &self.node.tags
    }
}

/// Outcome of a successful authentication pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// The caller has an identity.
    Peer(PeerIdentity),
    /// The caller proceeds without identity (authentication not required).
    Anonymous,
}

impl Authentication {
    /// The identity, if any.
    pub fn identity(&self) -> Option<&PeerIdentity> {
        match self {
            Authentication::Peer(identity) => Some(identity),
            Authentication::Anonymous => None,
        }
    }

    /// Consume into the identity, if any.
    pub fn into_identity(self) -> Option<PeerIdentity> {
        match self {
            Authentication::Peer(identity) => Some(identity),
            Authentication::Anonymous => None,
        }
    }
}

/// Resolves callers to mesh identities and applies authentication policy.
pub struct Authenticator {
    config: AuthConfig,
    client: Arc<dyn NetworkIdentityClient>,
    registry: Arc<dyn AgentRegistry>,
    bindings: Arc<AgentBindingStore>,
}

impl Authenticator {
    /// Create an authenticator over injected collaborators.
    pub fn new(
        config: AuthConfig,
        client: Arc<dyn NetworkIdentityClient>,
        registry: Arc<dyn AgentRegistry>,
        bindings: Arc<AgentBindingStore>,
    ) -> Self {
        info!(
            require_auth = config.require_auth,
            fallback_mode = %config.fallback_mode,
            allowed_tags = config.allowed_tags.len(),
            auto_register = config.auto_register_agents,
            "Authenticator configured"
        );
        Self {
            config,
            client,
            registry,
            bindings,
        }
    }

    /// Active policy.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// The identity client in use.
    pub fn client(&self) -> &Arc<dyn NetworkIdentityClient> {
        &self.client
    }

    /// The binding store in use.
    pub fn bindings(&self) -> &Arc<AgentBindingStore> {
        &self.bindings
    }

    /// Agent currently bound to `node_id`.
    pub fn agent_for_node(&self, node_id: &str) -> Option<String> {
        self.bindings.get(node_id)
    }

    /// Remove the binding for `node_id`. The registry entry is left alone.
    pub fn unbind_node(&self, node_id: &str) -> Option<String> {
        let removed = self.bindings.remove(node_id);
        if let Some(agent_id) = &removed {
            info!(node = %node_id, agent = %agent_id, "Removed node binding");
        }
        removed
    }

    /// Authenticate a caller by IP address.
    ///
    /// `None` means the address could not be determined; it is treated as a
    /// non-mesh, non-loopback caller.
    pub async fn authenticate(&self, ip: Option<IpAddr>) -> AoiResult<Authentication> {
        let (node, method) = match ip {
            Some(ip) if self.client.is_tailscale_ip(ip) => {
                (self.resolve_mesh_peer(ip).await?, AuthMethod::Tailnet)
            }
            _ => match self.fallback(ip)? {
                Some(node) => (node, AuthMethod::DevelopmentFallback),
                None => return Ok(Authentication::Anonymous),
            },
        };

        self.check_allowed_tags(&node)?;

        let agent_id = self.provision_agent(&node).await?;
        debug!(
            node = %node.id,
            agent = agent_id.as_deref().unwrap_or("-"),
            method = %method,
            "Caller authenticated"
        );
        Ok(Authentication::Peer(PeerIdentity {
            node,
            agent_id,
            method,
        }))
    }

    /// Policy for callers outside the mesh address space.
    fn fallback(&self, ip: Option<IpAddr>) -> AoiResult<Option<NodeInfo>> {
        if let Some(ip) = ip.filter(|ip| is_loopback(*ip)) {
            if self.config.fallback_mode == FallbackMode::Development {
                debug!(%ip, "Accepting loopback caller under development fallback");
                return Ok(Some(localhost_node(ip)));
            }
        }

        let shown = ip.map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".to_string());
        if self.config.require_auth {
            warn!(ip = %shown, "Rejecting non-mesh caller");
            return Err(AoiError::NotTailscaleRequest(shown));
        }
        debug!(ip = %shown, "Passing through unauthenticated caller");
        Ok(None)
    }

    async fn resolve_mesh_peer(&self, ip: IpAddr) -> AoiResult<NodeInfo> {
        let node = self.client.get_peer_by_ip(ip).await.map_err(|e| {
            warn!(%ip, error = %e, "Could not resolve mesh caller");
            e
        })?;
        if !node.online {
            warn!(%ip, node = %node.id, "Rejecting offline node");
            return Err(AoiError::UnauthorizedNode(format!("node {} is offline", node.id)));
        }
        Ok(node)
    }

    fn check_allowed_tags(&self, node: &NodeInfo) -> AoiResult<()> {
        let allowed = &self.config.allowed_tags;
        if allowed.is_empty() || node.has_any_tag(allowed) {
            return Ok(());
        }
        warn!(node = %node.id, tags = ?node.tags, "Node carries no allowed tag");
        Err(AoiError::TagNotAllowed(node.id.clone()))
    }

    /// Return the node's agent, registering one if enabled.
    ///
    /// Racing first requests for the same node converge on one registry
    /// entry because the agent ID is deterministic and a duplicate
    /// registration counts as success.
    async fn provision_agent(&self, node: &NodeInfo) -> AoiResult<Option<String>> {
        if let Some(agent_id) = self.bindings.get(&node.id) {
            return Ok(Some(agent_id));
        }
        if !self.config.auto_register_agents {
            return Ok(None);
        }

        let agent_id = agent_id_for_node(&node.id);
        if self.registry.get_agent(&agent_id).await?.is_none() {
            match self.registry.register(agent_identity(&agent_id, node)).await {
                Ok(()) => info!(node = %node.id, agent = %agent_id, "Registered agent for node"),
                Err(AoiError::AgentAlreadyExists(_)) => {
                    debug!(agent = %agent_id, "Agent registered concurrently");
                }
                Err(e) => {
                    warn!(node = %node.id, error = %e, "Agent registration failed");
                    return Err(e);
                }
            }
        }

        Ok(Some(self.bindings.bind_if_absent(&node.id, &agent_id)))
    }
}

fn localhost_node(ip: IpAddr) -> NodeInfo {
    NodeInfo {
        id: LOCALHOST_NODE_ID.to_string(),
        name: LOCALHOST_NODE_ID.to_string(),
        hostname: LOCALHOST_NODE_ID.to_string(),
        ips: vec![ip],
        online: true,
        tags: vec![DEVELOPMENT_TAG.to_string()],
        os: std::env::consts::OS.to_string(),
        ..Default::default()
    }
}

fn agent_identity(agent_id: &str, node: &NodeInfo) -> AgentIdentity {
    let name = if node.hostname.is_empty() {
        node.name.clone()
    } else {
        node.hostname.clone()
    };
    AgentIdentity {
        id: agent_id.to_string(),
        name,
        node_id: node.id.clone(),
        hostname: node.hostname.clone(),
        tags: node.tags.clone(),
        ips: node.ips.clone(),
        registered_at: chrono::Utc::now(),
    }
}
