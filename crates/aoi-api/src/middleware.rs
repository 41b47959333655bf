//! Authentication and authorization middleware.
//!
//! Layer [`authenticate`] outermost; [`require_tag`] and
//! [`require_permission`] read the identity it attaches.
//!
//! ```ignore
//! Router::new()
//!     .route("/agents/{id}", get(handler))
//!     .layer(from_fn_with_state(gate, require_permission))
//!     .layer(from_fn_with_state(authenticator, authenticate));
//! ```

use crate::client_ip::client_ip;
use crate::error::ApiError;
use aoi_kernel::{Authentication, Authenticator, PeerIdentity, PermissionEngine};
use aoi_types::{Action, AoiResult};
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, warn};

/// The caller IP of a request, per [`client_ip`].
pub fn request_ip<B>(request: &Request<B>) -> Option<IpAddr> {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    client_ip(request.headers(), remote)
}

/// Authenticate a request by its caller IP.
///
/// The returned future does not borrow `request`.
pub fn authenticate_request<'a, B>(
    authenticator: &'a Authenticator,
    request: &Request<B>,
) -> impl Future<Output = AoiResult<Authentication>> + Send + 'a {
    authenticator.authenticate(request_ip(request))
}

/// Resolve the caller and attach its [`PeerIdentity`].
///
/// Any failure is a 401. Anonymous callers (allowed only when
/// `require_auth` is off) pass through with nothing attached.
pub async fn authenticate(
    State(authenticator): State<Arc<Authenticator>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let ip = request_ip(&request);
    match authenticator.authenticate(ip).await {
        Ok(Authentication::Peer(identity)) => {
            request.extensions_mut().insert(identity);
        }
        Ok(Authentication::Anonymous) => {}
        Err(e) => {
            warn!(path = %request.uri().path(), error = %e, "Rejected unauthenticated request");
            return ApiError::unauthenticated(&e).into_response();
        }
    }
    next.run(request).await
}

fn identity(request: &Request<Body>) -> Result<&PeerIdentity, ApiError> {
    request
        .extensions()
        .get::<PeerIdentity>()
        .ok_or_else(|| ApiError::Unauthenticated("authentication required".to_string()))
}

/// State for [`require_tag`].
#[derive(Debug, Clone)]
pub struct RequiredTag(
    /// Tag callers must carry.
    pub String,
);

impl RequiredTag {
    /// Require `tag`, e.g. `tag:aoi-agent`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

/// Require the authenticated caller to carry a tag.
pub async fn require_tag(
    State(RequiredTag(tag)): State<RequiredTag>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let caller = match identity(&request) {
        Ok(caller) => caller,
        Err(e) => return e.into_response(),
    };
    if !caller.has_tag(&tag) {
        warn!(node = %caller.node.id, tag = %tag, "Caller lacks required tag");
        return ApiError::Forbidden(format!("node {} lacks required tag {tag}", caller.node.id))
            .into_response();
    }
    next.run(request).await
}

/// How [`require_permission`] names the resource being accessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSelector {
    /// Always this resource.
    Fixed(String),
    /// The request path without its leading `/`.
    Path,
}

impl ResourceSelector {
    fn select(&self, request: &Request<Body>) -> String {
        match self {
            Self::Fixed(resource) => resource.clone(),
            Self::Path => request.uri().path().trim_start_matches('/').to_string(),
        }
    }
}

/// State for [`require_permission`].
#[derive(Clone)]
pub struct PermissionGate {
    /// Engine the check runs against.
    pub engine: Arc<PermissionEngine>,
    /// Resource the request targets.
    pub resource: ResourceSelector,
    /// Action the caller must be allowed.
    pub action: Action,
}

impl PermissionGate {
    /// Gate `action` on the selected resource.
    pub fn new(engine: Arc<PermissionEngine>, resource: ResourceSelector, action: Action) -> Self {
        Self {
            engine,
            resource,
            action,
        }
    }
}

/// Require the authenticated caller's tags to permit an action.
pub async fn require_permission(
    State(gate): State<PermissionGate>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let caller = match identity(&request) {
        Ok(caller) => caller,
        Err(e) => return e.into_response(),
    };
    let resource = gate.resource.select(&request);
    let result = gate.engine.check(caller.tags(), &resource, &gate.action);
    if !result.allowed {
        warn!(
            node = %caller.node.id,
            resource = %resource,
            action = %gate.action,
            reason = %result.reason,
            "Permission denied"
        );
        return ApiError::Forbidden(result.reason).into_response();
    }
    debug!(node = %caller.node.id, resource = %resource, action = %gate.action, "Permission granted");
    next.run(request).await
}
