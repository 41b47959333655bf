//! The daemon's HTTP API.

use crate::error::ApiError;
use crate::extract::Caller;
use crate::middleware::{authenticate, require_permission, PermissionGate, ResourceSelector};
use aoi_kernel::{Authenticator, PeerIdentity, PermissionEngine, TagChange};
use aoi_types::{AccessRule, Action, PermissionLevel};
use axum::extract::State;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Resource guarding the admin routes.
pub const ADMIN_RESOURCE: &str = "admin/tags";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Resolves callers for [`authenticate`].
    pub authenticator: Arc<Authenticator>,
    /// Answers permission checks and tag-change queries.
    pub engine: Arc<PermissionEngine>,
}

/// Build the API router.
///
/// `/api/health` is open; everything else goes through [`authenticate`],
/// and `/api/admin/*` additionally needs `admin` on [`ADMIN_RESOURCE`].
/// `POST /api/admin/tag-changes` consumes the deltas it returns: each call
/// advances the stored tag snapshots.
pub fn router(state: AppState) -> Router {
    let admin_gate = PermissionGate::new(
        state.engine.clone(),
        ResourceSelector::Fixed(ADMIN_RESOURCE.to_string()),
        Action::Admin,
    );

    let admin = Router::new()
        .route("/api/admin/tag-changes", post(tag_changes))
        .layer(from_fn_with_state(admin_gate, require_permission));

    let authenticated = Router::new()
        .route("/api/whoami", get(whoami))
        .route("/api/permissions", get(permissions))
        .merge(admin)
        .layer(from_fn_with_state(state.authenticator.clone(), authenticate));

    Router::new()
        .route("/api/health", get(health))
        .merge(authenticated)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn whoami(Caller(identity): Caller) -> Json<PeerIdentity> {
    Json(identity)
}

#[derive(Debug, Serialize)]
struct PermissionsResponse {
    node_id: String,
    tags: Vec<String>,
    rules: Vec<AccessRule>,
    default_permission: PermissionLevel,
}

async fn permissions(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> Json<PermissionsResponse> {
    let rules = state.engine.get_permissions_for_tags(identity.tags());
    Json(PermissionsResponse {
        node_id: identity.node.id.clone(),
        tags: identity.tags().to_vec(),
        rules,
        default_permission: state.engine.default_permission(),
    })
}

async fn tag_changes(State(state): State<AppState>) -> Result<Json<Vec<TagChange>>, ApiError> {
    Ok(Json(state.engine.detect_tag_changes().await?))
}
