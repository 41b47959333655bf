//! Authentication and access-control engine for AOI.
//!
//! Resolves inbound callers to mesh identities, binds them to agents, and
//! maps their tags to resource permissions.

pub mod acl;
pub mod auth;
pub mod config;
pub mod registry;
pub mod rule_store;
pub mod store;

pub use acl::{match_resource, PermissionEngine, SyncReport, TagChange};
pub use auth::{AuthMethod, Authentication, Authenticator, PeerIdentity};
pub use registry::{AgentRegistry, InMemoryAgentRegistry};
pub use rule_store::{AclRuleStore, InMemoryAclRuleStore};
pub use store::{AgentBindingStore, TagSnapshotStore};
