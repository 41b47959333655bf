//! Shared error types for AOI.

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for mesh authentication and access control.
#[derive(Error, Debug)]
pub enum AoiError {
    // -- Connection --
    /// The identity daemon could not be reached.
    #[error("Identity daemon unreachable: {0}")]
    Connection(String),

    /// The identity daemon did not answer in time.
    #[error("Identity daemon timed out after {0:?}")]
    Timeout(Duration),

    /// The identity daemon answered with a non-success status.
    #[error("Identity daemon returned HTTP {status}: {body}")]
    Daemon {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// A status document could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -- Identity resolution --
    /// An empty node ID was supplied.
    #[error("Invalid node ID")]
    InvalidNodeId,

    /// No node with this ID or address is known to the daemon.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The daemon has not reported a local identity yet.
    #[error("Not connected to the mesh network")]
    NotConnected,

    // -- Authentication decision --
    /// The caller's address is outside the mesh address space.
    #[error("Request is not from the mesh network: {0}")]
    NotTailscaleRequest(String),

    /// The caller resolved to a node that may not authenticate.
    #[error("Unauthorized node: {0}")]
    UnauthorizedNode(String),

    /// The caller carries none of the allowed tags.
    #[error("Node carries no allowed tag: {0}")]
    TagNotAllowed(String),

    // -- Authorization policy --
    /// A permission check failed.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // -- Configuration mutation --
    /// A tag lacks the `tag:` prefix or a name.
    #[error("Invalid tag format: {0}")]
    InvalidTagFormat(String),

    /// No mapping exists for this tag.
    #[error("Tag mapping not found: {0}")]
    TagMappingNotFound(String),

    // -- Collaborators --
    /// An agent with this ID is already registered.
    #[error("Agent already exists: {0}")]
    AgentAlreadyExists(String),

    /// The agent registry failed.
    #[error("Agent registry error: {0}")]
    Registry(String),

    /// The ACL rule store failed.
    #[error("ACL rule store error: {0}")]
    RuleStore(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure class of an [`AoiError`], used for status-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Daemon unreachable, timed out, or returned garbage.
    Connection,
    /// Node lookup failed.
    IdentityResolution,
    /// The caller may not authenticate.
    Authentication,
    /// The caller is authenticated but lacks permission.
    Authorization,
    /// A rule mutation was rejected.
    ConfigMutation,
    /// An external collaborator or local resource failed.
    Internal,
}

impl AoiError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) | Self::Timeout(_) | Self::Daemon { .. } | Self::Serialization(_) => {
                ErrorKind::Connection
            }
            Self::InvalidNodeId | Self::NodeNotFound(_) | Self::NotConnected => {
                ErrorKind::IdentityResolution
            }
            Self::NotTailscaleRequest(_) | Self::UnauthorizedNode(_) | Self::TagNotAllowed(_) => {
                ErrorKind::Authentication
            }
            Self::PermissionDenied(_) => ErrorKind::Authorization,
            Self::InvalidTagFormat(_) | Self::TagMappingNotFound(_) => ErrorKind::ConfigMutation,
            Self::AgentAlreadyExists(_)
            | Self::Registry(_)
            | Self::RuleStore(_)
            | Self::Config(_)
            | Self::Io(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for AoiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Alias for Result with AoiError.
pub type AoiResult<T> = Result<T, AoiError>;
