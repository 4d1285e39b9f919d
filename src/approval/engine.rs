//! External decision engine seam.
//!
//! The verdict itself is produced outside this crate by a managed
//! generative-AI flow. `HttpDecisionEngine` speaks the flow server's HTTP
//! convention: the input is posted as `{"data": ...}` and the output comes
//! back as `{"result": ...}`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::approval::errors::EngineFailure;
use crate::approval::types::{ApprovalDecision, ApprovalRequest};
use crate::settings::Engine;

/// Upper bound on how much of an error body is echoed back into `EngineFailure::Status`.
const MAX_ERROR_BODY: usize = 512;

#[async_trait::async_trait]
pub trait DecisionEngine: Send + Sync {
    /// Produce a verdict for an already-validated request.
    async fn decide(&self, request: &ApprovalRequest) -> Result<ApprovalDecision, EngineFailure>;
}

#[derive(Debug, Serialize)]
struct FlowRequest<'a> {
    data: &'a ApprovalRequest,
}

#[derive(Debug, Deserialize)]
struct FlowResponse {
    result: ApprovalDecision,
}

/// Decision engine reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDecisionEngine {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl HttpDecisionEngine {
    pub fn new(config: &Engine) -> Result<Self, EngineFailure> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EngineFailure::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl DecisionEngine for HttpDecisionEngine {
    async fn decide(&self, request: &ApprovalRequest) -> Result<ApprovalDecision, EngineFailure> {
        debug!(endpoint = %self.endpoint, entity = %request.entity.id, "calling decision engine");

        let mut call = self
            .client
            .post(&self.endpoint)
            .json(&FlowRequest { data: request });
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await.map_err(|e| {
            if e.is_timeout() {
                EngineFailure::Timeout {
                    after_ms: self.timeout_ms,
                }
            } else {
                EngineFailure::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            warn!(status = status.as_u16(), "decision engine returned an error status");
            return Err(EngineFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                EngineFailure::Timeout {
                    after_ms: self.timeout_ms,
                }
            } else {
                EngineFailure::Transport(e.to_string())
            }
        })?;
        let parsed: FlowResponse = serde_json::from_slice(&bytes)
            .map_err(|e| EngineFailure::MalformedResponse(e.to_string()))?;

        Ok(parsed.result)
    }
}
