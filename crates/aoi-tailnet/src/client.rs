//! The identity lookup contract.
//!
//! Implementations supply [`NetworkIdentityClient::get_status`]; every other
//! lookup is derived from the status snapshot so that all implementations
//! share the same error conditions and cache semantics.

use aoi_types::{AoiError, AoiResult, NodeInfo, Status};
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Access to the mesh network's view of local and peer identities.
#[async_trait]
pub trait NetworkIdentityClient: Send + Sync + 'static {
    /// Current daemon status, served from cache while fresh.
    async fn get_status(&self) -> AoiResult<Arc<Status>>;

    /// Discard the cached status so the next lookup refetches.
    fn invalidate_cache(&self);

    /// The local node.
    async fn get_self(&self) -> AoiResult<NodeInfo> {
        self.get_status()
            .await?
            .self_node
            .clone()
            .ok_or(AoiError::NotConnected)
    }

    /// A node by ID. The local node is checked before peers.
    async fn get_peer(&self, node_id: &str) -> AoiResult<NodeInfo> {
        if node_id.is_empty() {
            return Err(AoiError::InvalidNodeId);
        }
        let status = self.get_status().await?;
        if let Some(me) = status.self_node.as_ref().filter(|n| n.id == node_id) {
            return Ok(me.clone());
        }
        status
            .find_peer(node_id)
            .cloned()
            .ok_or_else(|| AoiError::NodeNotFound(node_id.to_string()))
    }

    /// The node owning `ip`. Local addresses take priority over peers.
    async fn get_peer_by_ip(&self, ip: IpAddr) -> AoiResult<NodeInfo> {
        let status = self.get_status().await?;
        if let Some(me) = status.self_node.as_ref().filter(|n| n.has_ip(ip)) {
            debug!(%ip, node = %me.id, "Address belongs to local node");
            return Ok(me.clone());
        }
        status
            .peers
            .values()
            .find(|p| p.has_ip(ip))
            .cloned()
            .ok_or_else(|| AoiError::NodeNotFound(ip.to_string()))
    }

    /// All peers, sorted by node ID.
    async fn get_peers(&self) -> AoiResult<Vec<NodeInfo>> {
        let status = self.get_status().await?;
        let mut peers: Vec<NodeInfo> = status.peers.values().cloned().collect();
        peers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(peers)
    }

    /// Whether the daemon is reachable and running.
    async fn is_connected(&self) -> bool {
        match self.get_status().await {
            Ok(status) => status.is_running(),
            Err(e) => {
                debug!(error = %e, "Identity daemon not connected");
                false
            }
        }
    }

    /// Whether `node_id` is a known, online node.
    async fn verify_peer(&self, node_id: &str) -> AoiResult<bool> {
        match self.get_peer(node_id).await {
            Ok(node) => Ok(node.online),
            Err(AoiError::NodeNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Tags assigned to `node_id`.
    async fn get_node_tags(&self, node_id: &str) -> AoiResult<Vec<String>> {
        Ok(self.get_peer(node_id).await?.tags)
    }

    /// Whether `ip` belongs to the mesh address space. No I/O.
    fn is_tailscale_ip(&self, ip: IpAddr) -> bool {
        crate::ip::is_tailscale_ip(ip)
    }
}
