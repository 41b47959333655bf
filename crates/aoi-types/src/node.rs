//! Network-level identity records reported by the mesh identity daemon.

use crate::serde_compat::{map_or_null, string_or_number, vec_or_null};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// Backend state reported by a daemon that is up and attached to the mesh.
pub const BACKEND_RUNNING: &str = "Running";

/// A peer's network-level identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Opaque node ID assigned by the control plane.
    #[serde(rename = "ID", default)]
    pub id: String,
    /// Display name (usually the MagicDNS name).
    #[serde(rename = "DNSName", default)]
    pub name: String,
    /// Machine hostname.
    #[serde(rename = "HostName", default)]
    pub hostname: String,
    /// Mesh addresses assigned to the node.
    #[serde(rename = "TailscaleIPs", default, deserialize_with = "vec_or_null")]
    pub ips: Vec<IpAddr>,
    /// Whether the node is currently reachable.
    #[serde(rename = "Online", default)]
    pub online: bool,
    /// ACL tags assigned by the control plane's policy.
    #[serde(rename = "Tags", default, deserialize_with = "vec_or_null")]
    pub tags: Vec<String>,
    /// Whether the node is currently used as an exit node.
    #[serde(rename = "ExitNode", default)]
    pub exit_node: bool,
    /// Operating system string.
    #[serde(rename = "OS", default)]
    pub os: String,
    /// Owning user's ID.
    #[serde(rename = "UserID", default, deserialize_with = "string_or_number")]
    pub user_id: String,
    /// Network (tailnet) the node belongs to.
    #[serde(rename = "NetworkID", default)]
    pub network_id: String,
    /// When the node was first registered.
    #[serde(rename = "Created", default)]
    pub created: Option<DateTime<Utc>>,
    /// When the node was last seen by the control plane.
    #[serde(rename = "LastSeen", default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl NodeInfo {
    /// Whether the node carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether the node carries at least one of `tags`.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.has_tag(t))
    }

    /// Whether `ip` is one of the node's addresses.
    pub fn has_ip(&self, ip: IpAddr) -> bool {
        self.ips.contains(&ip)
    }
}

/// Snapshot of the local identity daemon.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Status {
    /// Backend state string, e.g. `Running` or `NeedsLogin`.
    #[serde(rename = "BackendState", default)]
    pub backend_state: String,
    /// The local node, absent until the daemon has logged in.
    #[serde(rename = "Self", default)]
    pub self_node: Option<NodeInfo>,
    /// Known peers keyed by the daemon's peer key.
    #[serde(rename = "Peer", default, deserialize_with = "map_or_null")]
    pub peers: HashMap<String, NodeInfo>,
    /// Local mesh addresses.
    #[serde(rename = "TailscaleIPs", default, deserialize_with = "vec_or_null")]
    pub ips: Vec<IpAddr>,
    /// Health warnings.
    #[serde(rename = "Health", default, deserialize_with = "vec_or_null")]
    pub health: Vec<String>,
}

impl Status {
    /// Whether the backend reports that it is running.
    pub fn is_running(&self) -> bool {
        self.backend_state == BACKEND_RUNNING
    }

    /// Look up a peer by node ID, falling back to the map key.
    pub fn find_peer(&self, node_id: &str) -> Option<&NodeInfo> {
        self.peers
            .values()
            .find(|p| p.id == node_id)
            .or_else(|| self.peers.get(node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS_JSON: &str = r#"{
        "BackendState": "Running",
        "TailscaleIPs": ["100.101.102.103", "fd7a:115c:a1e0::1"],
        "Self": {
            "ID": "nSelf",
            "DNSName": "laptop.example.ts.net.",
            "HostName": "laptop",
            "TailscaleIPs": ["100.101.102.103"],
            "Online": true,
            "OS": "linux",
            "UserID": 12345,
            "Created": "2026-01-02T03:04:05Z",
            "LastSeen": "0001-01-01T00:00:00Z"
        },
        "Peer": {
            "nodekey:abc": {
                "ID": "nPeer1",
                "DNSName": "worker.example.ts.net.",
                "HostName": "worker",
                "TailscaleIPs": ["100.64.0.7"],
                "Online": false,
                "Tags": ["tag:aoi-agent"],
                "ExitNode": false,
                "OS": "linux",
                "UserID": "u-9"
            }
        },
        "Health": null
    }"#;

    #[test]
    fn test_parse_daemon_status() {
        let status: Status = serde_json::from_str(STATUS_JSON).unwrap();
        assert!(status.is_running());
        assert_eq!(status.ips.len(), 2);
        assert!(status.health.is_empty());

        let me = status.self_node.as_ref().unwrap();
        assert_eq!(me.id, "nSelf");
        assert_eq!(me.hostname, "laptop");
        assert_eq!(me.user_id, "12345");
        assert!(me.tags.is_empty());
        assert!(me.created.is_some());

        let peer = status.find_peer("nPeer1").unwrap();
        assert_eq!(peer.hostname, "worker");
        assert!(!peer.online);
        assert!(peer.has_tag("tag:aoi-agent"));
        assert_eq!(peer.user_id, "u-9");
    }

    #[test]
    fn test_find_peer_by_map_key() {
        let status: Status = serde_json::from_str(STATUS_JSON).unwrap();
        assert_eq!(status.find_peer("nodekey:abc").unwrap().id, "nPeer1");
        assert!(status.find_peer("nMissing").is_none());
    }

    #[test]
    fn test_status_without_self() {
        let status: Status =
            serde_json::from_str(r#"{"BackendState": "NeedsLogin", "Self": null}"#).unwrap();
        assert!(!status.is_running());
        assert!(status.self_node.is_none());
        assert!(status.peers.is_empty());
    }

    #[test]
    fn test_has_any_tag() {
        let node = NodeInfo {
            tags: vec!["tag:a".into(), "tag:b".into()],
            ..Default::default()
        };
        assert!(node.has_any_tag(&["tag:x".into(), "tag:b".into()]));
        assert!(!node.has_any_tag(&["tag:x".into()]));
        assert!(!node.has_any_tag(&[]));
    }
}
