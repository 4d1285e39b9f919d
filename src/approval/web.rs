use std::sync::Arc;

use axum::extract::State;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use crate::approval::ApprovalGate;
use crate::rbac::web::{require_role, RoleGuard};

/// Approval endpoint, reachable only by callers at or above `guard.required`.
pub fn router(gate: Arc<ApprovalGate>, guard: RoleGuard) -> Router {
    Router::new()
        .route("/v1/approvals/evaluate", post(handle_evaluate))
        .route_layer(middleware::from_fn_with_state(guard, require_role))
        .with_state(gate)
}

async fn handle_evaluate(
    State(gate): State<Arc<ApprovalGate>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    match gate.evaluate(&body).await {
        Ok(decision) => Json(decision).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::engine::DecisionEngine;
    use crate::approval::errors::EngineFailure;
    use crate::approval::types::{ApprovalDecision, ApprovalRequest, Verdict};
    use crate::rbac::types::Role;
    use crate::rbac::RoleHierarchy;
    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderName, Request, StatusCode};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    struct CountingEngine {
        calls: AtomicUsize,
        reply: Result<ApprovalDecision, EngineFailure>,
    }

    #[async_trait::async_trait]
    impl DecisionEngine for CountingEngine {
        async fn decide(&self, _: &ApprovalRequest) -> Result<ApprovalDecision, EngineFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn app(reply: Result<ApprovalDecision, EngineFailure>) -> (Router, Arc<CountingEngine>) {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            reply,
        });
        let gate = Arc::new(ApprovalGate::new(engine.clone(), Duration::from_secs(5)));
        let guard = RoleGuard {
            hierarchy: Arc::new(RoleHierarchy::canonical()),
            required: Role::ComplianceOfficer,
            header: HeaderName::from_static("x-user-role"),
        };
        (router(gate, guard), engine)
    }

    fn approve() -> Result<ApprovalDecision, EngineFailure> {
        Ok(ApprovalDecision {
            decision: Verdict::Approve,
            reason: "Within limits".into(),
            requires_manual_review: false,
        })
    }

    fn payout_body() -> Value {
        json!({
            "type": "payout",
            "user": {
                "riskScore": 12,
                "riskTier": "low",
                "kycStatus": "verified",
                "payoutBlocked": false,
                "countryRiskTier": "low"
            },
            "entity": { "id": "po-1", "type": "payout", "fields": { "amount": 1200 } }
        })
    }

    async fn call(app: Router, role: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut request = Request::post("/v1/approvals/evaluate").header("content-type", "application/json");
        if let Some(role) = role {
            request = request.header("x-user-role", role);
        }
        let response = app
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_evaluate_returns_decision() {
        let (app, engine) = app(approve());
        let (status, body) = call(app, Some("Admin"), payout_body()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "decision": "approve", "reason": "Within limits", "requiresManualReview": false })
        );
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_insufficient_role_is_forbidden() {
        let (app, engine) = app(approve());
        let (status, body) = call(app, Some("Support"), payout_body()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("ComplianceOfficer"));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_role_header_is_forbidden() {
        let (app, _) = app(approve());
        let (status, _) = call(app, None, payout_body()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_invalid_request_is_bad_request() {
        let (app, engine) = app(approve());
        let mut body = payout_body();
        body["entity"]["fields"]["amount"] = json!("a lot");
        let (status, body) = call(app, Some("ComplianceOfficer"), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["fields"][0]["field"], "entity.fields.amount");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_is_bad_gateway() {
        let (app, _) = app(Err(EngineFailure::Transport("connection refused".into())));
        let (status, body) = call(app, Some("SuperAdmin"), payout_body()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.get("decision").is_none());
    }
}
