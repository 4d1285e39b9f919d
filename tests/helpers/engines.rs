use std::sync::{Arc, Mutex};

use axum::routing::post;
use axum::{Json, Router};
use fundgate::approval::engine::DecisionEngine;
use fundgate::approval::errors::EngineFailure;
use fundgate::approval::types::{ApprovalDecision, ApprovalRequest, Verdict};
use serde_json::{json, Value};

pub fn decision(verdict: Verdict, reason: &str, manual: bool) -> ApprovalDecision {
    ApprovalDecision {
        decision: verdict,
        reason: reason.to_string(),
        requires_manual_review: manual,
    }
}

/// In-process engine double that records what it was asked.
pub struct RecordingEngine {
    seen: Mutex<Vec<ApprovalRequest>>,
    reply: Result<ApprovalDecision, EngineFailure>,
}

impl RecordingEngine {
    pub fn replying(reply: Result<ApprovalDecision, EngineFailure>) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            reply,
        })
    }

    pub fn calls(&self) -> Vec<ApprovalRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DecisionEngine for RecordingEngine {
    async fn decide(&self, request: &ApprovalRequest) -> Result<ApprovalDecision, EngineFailure> {
        self.seen.lock().unwrap().push(request.clone());
        self.reply.clone()
    }
}

/// Flow server stand-in listening on an ephemeral port.
///
/// Answers every call with `{"result": reply}` and keeps the raw bodies it received.
pub struct FlowServer {
    pub endpoint: String,
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl FlowServer {
    pub async fn start(reply: Value) -> Self {
        let bodies: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let captured = bodies.clone();
        let app = Router::new().route(
            "/autoApprovalFlow",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                let reply = reply.clone();
                async move {
                    captured.lock().unwrap().push(body);
                    Json(json!({ "result": reply }))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind flow server");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Flow server crashed");
        });

        Self {
            endpoint: format!("http://{addr}/autoApprovalFlow"),
            bodies,
        }
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}
