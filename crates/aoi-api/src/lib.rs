//! HTTP surface for AOI.
//!
//! Axum middleware that authenticates callers by mesh identity and gates
//! routes on tags or tag-derived permissions, plus the small HTTP API the
//! daemon serves.

pub mod client_ip;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;

pub use client_ip::client_ip;
pub use error::ApiError;
pub use extract::Caller;
pub use middleware::{
    authenticate, authenticate_request, request_ip, require_permission, require_tag,
    PermissionGate, RequiredTag, ResourceSelector,
};
pub use routes::{router, AppState};
