use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::approval::engine::DecisionEngine;
use crate::approval::errors::{ApprovalError, EngineFailure};
use crate::approval::types::{ApprovalDecision, ApprovalRequest};
use crate::approval::validate;

/// Validation and delegation boundary in front of the decision engine.
///
/// The engine's verdict is returned exactly as received. Any failure to get
/// one is surfaced as an error; the gate never produces a verdict of its own.
#[derive(Clone)]
pub struct ApprovalGate {
    engine: Arc<dyn DecisionEngine>,
    timeout: Duration,
}

impl ApprovalGate {
    pub fn new(engine: Arc<dyn DecisionEngine>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validate JSON-shaped input, then delegate. Invalid input never reaches the engine.
    pub async fn evaluate(&self, input: &Value) -> Result<ApprovalDecision, ApprovalError> {
        let request = validate::parse_request(input).map_err(|err| {
            tracing::warn!(fields = ?err.field_names(), "rejected malformed approval request");
            err
        })?;
        self.evaluate_request(&request).await
    }

    /// Delegate an already-typed request.
    pub async fn evaluate_request(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, ApprovalError> {
        let decision = match tokio::time::timeout(self.timeout, self.engine.decide(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(EngineFailure::Timeout {
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        match decision {
            Ok(decision) => {
                tracing::info!(
                    entity = %request.entity.id,
                    approval_type = %request.approval_type,
                    decision = ?decision.decision,
                    manual_review = decision.requires_manual_review,
                    "approval decided"
                );
                Ok(decision)
            }
            Err(failure) => {
                tracing::warn!(
                    entity = %request.entity.id,
                    approval_type = %request.approval_type,
                    error = %failure,
                    "decision engine failed"
                );
                Err(failure.into())
            }
        }
    }
}

impl std::fmt::Debug for ApprovalGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalGate")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
