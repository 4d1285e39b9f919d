use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One offending field, addressed by its dotted path (e.g. `user.kycStatus`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("Invalid approval request: {}", summarize(.fields))]
#[diagnostic(
    code(fundgate::approval::validation),
    help("See the `fields` list for every offending field; the request was not forwarded")
)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.field.as_str()).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The decision engine could not produce a verdict. Never coerced into one.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum EngineFailure {
    #[error("Decision engine timed out after {after_ms} ms")]
    #[diagnostic(
        code(fundgate::engine::timeout),
        help("Raise `engine.timeout_ms` or check the decision flow's latency")
    )]
    Timeout { after_ms: u64 },

    #[error("Decision engine unreachable: {0}")]
    #[diagnostic(
        code(fundgate::engine::transport),
        help("Check `engine.endpoint` and that the flow server is running")
    )]
    Transport(String),

    #[error("Decision engine returned HTTP {status}: {body}")]
    #[diagnostic(code(fundgate::engine::status))]
    Status { status: u16, body: String },

    #[error("Decision engine returned a malformed decision: {0}")]
    #[diagnostic(
        code(fundgate::engine::malformed),
        help("The flow must return {{\"result\": {{\"decision\", \"reason\", \"requiresManualReview\"}}}}")
    )]
    MalformedResponse(String),
}

#[derive(Debug, Error, Diagnostic)]
pub enum ApprovalError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    DecisionEngine(#[from] EngineFailure),
}

impl IntoResponse for ApprovalError {
    fn into_response(self) -> Response {
        match self {
            ApprovalError::Validation(err) => {
                let body = json!({
                    "error": "validation_failed",
                    "message": err.to_string(),
                    "fields": err.fields,
                });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApprovalError::DecisionEngine(err) => {
                let status = match err {
                    EngineFailure::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::BAD_GATEWAY,
                };
                let body = json!({ "error": err.to_string() });
                (status, Json(body)).into_response()
            }
        }
    }
}
