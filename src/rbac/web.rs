use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderName;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::rbac::evaluator;
use crate::rbac::types::{
    Role, RoleCheckRequest, RoleCheckResponse, RoleLevel, RouteAuthorizeRequest,
    RouteAuthorizeResponse,
};
use crate::rbac::RoleHierarchy;

pub fn router(hierarchy: Arc<RoleHierarchy>) -> Router {
    Router::new()
        .route("/v1/roles", get(handle_list))
        .route("/v1/roles/check", post(handle_check))
        .route("/v1/routes/authorize", post(handle_authorize_route))
        .with_state(hierarchy)
}

/// Route guard: the caller's role arrives in `header`, set by the identity
/// layer once the session cookie has been verified.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    pub hierarchy: Arc<RoleHierarchy>,
    pub required: Role,
    pub header: HeaderName,
}

impl RoleGuard {
    fn caller_role(&self, request: &Request) -> Option<Role> {
        request
            .headers()
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }
}

pub async fn require_role(State(guard): State<RoleGuard>, request: Request, next: Next) -> Response {
    let caller = guard.caller_role(&request);
    match evaluator::authorize(&guard.hierarchy, &caller, guard.required) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

async fn handle_list(State(hierarchy): State<Arc<RoleHierarchy>>) -> impl IntoResponse {
    let roles: Vec<RoleLevel> = hierarchy
        .roles()
        .into_iter()
        .map(|(role, level)| RoleLevel { role, level })
        .collect();
    Json(roles)
}

async fn handle_check(
    State(hierarchy): State<Arc<RoleHierarchy>>,
    Json(req): Json<RoleCheckRequest>,
) -> impl IntoResponse {
    let allowed = evaluator::has_role_named(&hierarchy, &req.user, &req.required_role);
    Json(RoleCheckResponse { allowed })
}

async fn handle_authorize_route(
    State(hierarchy): State<Arc<RoleHierarchy>>,
    Json(req): Json<RouteAuthorizeRequest>,
) -> impl IntoResponse {
    let role: Option<Role> = req.role.as_deref().and_then(|r| r.parse().ok());
    let required_role = evaluator::required_for_path(&hierarchy, &req.path);
    let allowed = match required_role {
        Some(required) => evaluator::has_role(&hierarchy, &role, required),
        None => true,
    };
    Json(RouteAuthorizeResponse {
        allowed,
        required_role,
    })
}
