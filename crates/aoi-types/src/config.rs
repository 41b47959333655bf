//! Configuration surface for authentication, ACLs, and the identity daemon.
//!
//! All structs use `#[serde(default)]` so a partial TOML file is valid.

use crate::permission::{PermissionLevel, TagPermissionMapping};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default control socket of the mesh daemon.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/tailscale/tailscaled.sock";

/// How requests from outside the mesh address space are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Loopback callers are accepted as a synthetic `localhost` node.
    Development,
    /// No fallback.
    #[default]
    Strict,
}

impl fmt::Display for FallbackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackMode::Development => write!(f, "development"),
            FallbackMode::Strict => write!(f, "strict"),
        }
    }
}

/// Authentication policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Reject callers that cannot be resolved to a mesh identity.
    pub require_auth: bool,
    /// If non-empty, callers must carry at least one of these tags.
    pub allowed_tags: Vec<String>,
    /// Treatment of non-mesh callers.
    pub fallback_mode: FallbackMode,
    /// Register an agent for every newly authenticated node.
    pub auto_register_agents: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_tags: Vec::new(),
            fallback_mode: FallbackMode::Strict,
            auto_register_agents: false,
        }
    }
}

/// Tag-to-permission rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Level granted when no rule matches.
    pub default_permission: PermissionLevel,
    /// Initial rule set.
    pub tag_mappings: Vec<TagPermissionMapping>,
}

/// Local identity daemon connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailnetConfig {
    /// Path of the daemon's control socket.
    pub socket_path: PathBuf,
    /// How long a status snapshot is reused, in milliseconds.
    pub status_ttl_ms: u64,
    /// Upper bound for one status request, in milliseconds.
    pub request_timeout_ms: u64,
}

impl TailnetConfig {
    /// Status cache TTL.
    pub fn status_ttl(&self) -> Duration {
        Duration::from_millis(self.status_ttl_ms)
    }

    /// Request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for TailnetConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            status_ttl_ms: 5_000,
            request_timeout_ms: 3_000,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoiConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Authentication policy.
    pub auth: AuthConfig,
    /// Access-control rules.
    pub acl: AclConfig,
    /// Identity daemon connection.
    pub tailnet: TailnetConfig,
}

impl Default for AoiConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 4210)),
            log_level: "info".to_string(),
            auth: AuthConfig::default(),
            acl: AclConfig::default(),
            tailnet: TailnetConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AoiConfig::default();
        assert!(config.auth.require_auth);
        assert_eq!(config.auth.fallback_mode, FallbackMode::Strict);
        assert!(!config.auth.auto_register_agents);
        assert_eq!(config.acl.default_permission, PermissionLevel::None);
        assert_eq!(config.tailnet.status_ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml() {
        let config: AoiConfig = toml::from_str(
            r#"
            [auth]
            fallback_mode = "development"
            allowed_tags = ["tag:aoi-agent"]

            [[acl.tag_mappings]]
            tag = "tag:aoi-agent"
            resources = ["agents/*"]
            permission = "write"
            "#,
        )
        .unwrap();
        assert!(config.auth.require_auth);
        assert_eq!(config.auth.fallback_mode, FallbackMode::Development);
        assert_eq!(config.auth.allowed_tags, vec!["tag:aoi-agent"]);
        assert_eq!(config.acl.tag_mappings.len(), 1);
        assert_eq!(config.tailnet.socket_path, PathBuf::from(DEFAULT_SOCKET_PATH));
    }

    #[test]
    fn test_unknown_fallback_mode_rejected() {
        let result: Result<AoiConfig, _> = toml::from_str(
            r#"
            [auth]
            fallback_mode = "lenient"
            "#,
        );
        assert!(result.is_err());
    }
}
