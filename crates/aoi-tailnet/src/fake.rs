//! In-memory identity daemon for deterministic tests.
//!
//! [`FakeClient`] answers from a mutable [`Status`] and goes through the same
//! [`StatusCache`] as the real client, so changes made with the mutators only
//! become visible once the cache expires or is invalidated.

use crate::cache::{StatusCache, DEFAULT_STATUS_TTL};
use crate::client::NetworkIdentityClient;
use aoi_types::node::BACKEND_RUNNING;
use aoi_types::{AoiError, AoiResult, NodeInfo, Status};
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// In-memory [`NetworkIdentityClient`].
pub struct FakeClient {
    status: RwLock<Status>,
    cache: StatusCache,
    unreachable: AtomicBool,
    fetches: AtomicUsize,
}

impl FakeClient {
    /// A running daemon with no local identity and no peers.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_STATUS_TTL)
    }

    /// A running daemon whose status is cached for `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            status: RwLock::new(Status {
                backend_state: BACKEND_RUNNING.to_string(),
                ..Default::default()
            }),
            cache: StatusCache::new(ttl),
            unreachable: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Builder: set the local node.
    pub fn with_self(self, node: NodeInfo) -> Self {
        self.set_self(node);
        self
    }

    /// Builder: add a peer.
    pub fn with_peer(self, node: NodeInfo) -> Self {
        self.upsert_peer(node);
        self
    }

    /// Replace the local node.
    pub fn set_self(&self, node: NodeInfo) {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        status.ips = node.ips.clone();
        status.self_node = Some(node);
    }

    /// Forget the local node.
    pub fn clear_self(&self) {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        status.ips.clear();
        status.self_node = None;
    }

    /// Add or replace a peer, keyed by its node ID.
    pub fn upsert_peer(&self, node: NodeInfo) {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        status.peers.insert(node.id.clone(), node);
    }

    /// Remove a peer.
    pub fn remove_peer(&self, node_id: &str) -> Option<NodeInfo> {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        status.peers.remove(node_id)
    }

    /// Replace a peer's tags. Returns false if the peer is unknown.
    pub fn set_tags(&self, node_id: &str, tags: Vec<String>) -> bool {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        match status.peers.get_mut(node_id) {
            Some(peer) => {
                peer.tags = tags;
                true
            }
            None => false,
        }
    }

    /// Set a peer's online flag. Returns false if the peer is unknown.
    pub fn set_online(&self, node_id: &str, online: bool) -> bool {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        match status.peers.get_mut(node_id) {
            Some(peer) => {
                peer.online = online;
                true
            }
            None => false,
        }
    }

    /// Set the backend state string.
    pub fn set_backend_state(&self, state: &str) {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        status.backend_state = state.to_string();
    }

    /// Make subsequent fetches fail with a connection error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of status fetches that reached the fake daemon.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn fetch_status(&self) -> AoiResult<Status> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AoiError::Connection("fake daemon unreachable".to_string()));
        }
        let status = self.status.read().unwrap_or_else(|e| e.into_inner());
        Ok(status.clone())
    }
}

impl Default for FakeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkIdentityClient for FakeClient {
    async fn get_status(&self) -> AoiResult<Arc<Status>> {
        self.cache.get_or_fetch(|| self.fetch_status()).await
    }

    fn invalidate_cache(&self) {
        self.cache.invalidate();
    }
}

/// Build a node for tests and fixtures.
pub fn test_node(id: &str, ip: &str, tags: &[&str]) -> NodeInfo {
    let ip: IpAddr = ip.parse().unwrap_or(IpAddr::from([100, 64, 0, 1]));
    NodeInfo {
        id: id.to_string(),
        name: format!("{id}.example.ts.net."),
        hostname: id.to_string(),
        ips: vec![ip],
        online: true,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        os: "linux".to_string(),
        ..Default::default()
    }
}
