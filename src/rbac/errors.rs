use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

use crate::rbac::types::Role;

#[derive(Debug, Error, Diagnostic)]
pub enum RbacError {
    #[error("Access denied: requires role `{required}`")]
    #[diagnostic(
        code(fundgate::rbac::denied),
        help("The caller's role must be at or above the required level in the role hierarchy")
    )]
    AuthorizationDenied { required: Role },

    #[error("Failed to load role hierarchy `{path}`")]
    #[diagnostic(
        code(fundgate::rbac::hierarchy_load),
        help("Check that the file exists and contains valid KDL syntax")
    )]
    HierarchyLoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid role hierarchy: {0}")]
    #[diagnostic(
        code(fundgate::rbac::invalid_hierarchy),
        help("Each hierarchy file may contain `role \"<Role>\" level=<n>` and `route \"/prefix\" requires=\"<Role>\"` nodes")
    )]
    InvalidHierarchy(String),

    #[error("Unknown role `{0}`")]
    #[diagnostic(
        code(fundgate::rbac::unknown_role),
        help("Valid roles: Investor, ProjectOwner, Support, AccountingOperator, ComplianceOfficer, Admin, SuperAdmin")
    )]
    UnknownRole(String),

    #[error("Invalid level {level} for role `{role}`")]
    #[diagnostic(
        code(fundgate::rbac::invalid_level),
        help("Levels must be positive integers; level 0 is reserved for users without a role")
    )]
    InvalidLevel { role: String, level: String },

    #[error("KDL parse error: {0}")]
    #[diagnostic(
        code(fundgate::rbac::kdl_parse),
        help("Check your KDL file syntax, see https://kdl.dev for the specification")
    )]
    KdlParse(String),
}

impl IntoResponse for RbacError {
    fn into_response(self) -> Response {
        let status = match &self {
            RbacError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
