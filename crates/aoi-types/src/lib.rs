//! Core types for AOI mesh authentication and access control.
//!
//! This crate defines the data structures shared by the identity client,
//! the authenticator, the permission engine, and the HTTP glue. It contains
//! no business logic.

pub mod agent;
pub mod config;
pub mod error;
pub mod node;
pub mod permission;
pub mod serde_compat;

pub use error::{AoiError, AoiResult, ErrorKind};
pub use node::{NodeInfo, Status};
pub use permission::{AccessRule, Action, PermissionCheckResult, PermissionLevel, TagPermissionMapping};
