//! Mesh identity daemon client.
//!
//! Turns the local daemon's view of the network into peer identities.
//!
//! ## Architecture
//!
//! - **NetworkIdentityClient**: the lookup contract consumed by the authenticator
//! - **StatusCache**: TTL-gated snapshot shared by all callers
//! - **LocalClient**: talks HTTP to the daemon over its unix control socket
//! - **FakeClient**: in-memory daemon for deterministic tests

pub mod cache;
pub mod client;
pub mod fake;
pub mod ip;
#[cfg(unix)]
pub mod local;

pub use cache::StatusCache;
pub use client::NetworkIdentityClient;
pub use fake::FakeClient;
pub use ip::{is_loopback, is_tailscale_ip};
#[cfg(unix)]
pub use local::LocalClient;
