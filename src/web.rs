//! HTTP surface: role checks, route authorization and the approval endpoint,
//! all on one listener behind the security-headers middleware.
use crate::approval::engine::HttpDecisionEngine;
use crate::approval::ApprovalGate;
use crate::errors::GateError;
use crate::rbac::web::RoleGuard;
use crate::rbac::{loader, RoleHierarchy};
use crate::settings::Settings;
use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub hierarchy: Arc<RoleHierarchy>,
    pub gate: Arc<ApprovalGate>,
}

impl AppState {
    /// Build the role table and the decision engine client from settings.
    pub fn from_settings(settings: Settings) -> Result<Self, GateError> {
        let hierarchy = match &settings.rbac.hierarchy_path {
            Some(path) => loader::load_hierarchy(path)?,
            None => {
                tracing::info!("Using built-in role hierarchy");
                RoleHierarchy::canonical()
            }
        };

        let engine = HttpDecisionEngine::new(&settings.engine)?;
        tracing::info!(endpoint = engine.endpoint(), "Decision engine configured");
        let gate = ApprovalGate::new(Arc::new(engine), settings.engine_timeout());

        Ok(Self {
            settings: Arc::new(settings),
            hierarchy: Arc::new(hierarchy),
            gate: Arc::new(gate),
        })
    }
}

// Security headers middleware
async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store"),
    );

    response
}

pub fn router(state: &AppState) -> Result<Router, GateError> {
    let header = HeaderName::from_bytes(state.settings.server.role_header.as_bytes())
        .map_err(|e| {
            GateError::InvalidSetting(format!(
                "server.role_header `{}`: {e}",
                state.settings.server.role_header
            ))
        })?;
    let guard = RoleGuard {
        hierarchy: state.hierarchy.clone(),
        required: state.settings.approval.required_role,
        header,
    };

    let router = Router::new()
        .route("/healthz", get(health))
        .merge(crate::rbac::web::router(state.hierarchy.clone()))
        .merge(crate::approval::web::router(state.gate.clone(), guard))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

pub async fn serve(state: AppState) -> Result<(), GateError> {
    let router = router(&state)?;

    let addr: SocketAddr = format!("{}:{}", state.settings.server.host, state.settings.server.port)
        .parse()
        .map_err(|e| GateError::InvalidSetting(format!("bad listen addr: {e}")))?;

    tracing::info!(
        %addr,
        roles = state.hierarchy.roles().len(),
        routes = state.hierarchy.routes().len(),
        approval_role = %state.settings.approval.required_role,
        "fundgate listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
