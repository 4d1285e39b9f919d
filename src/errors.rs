use miette::Diagnostic;
use thiserror::Error;

use crate::approval::errors::{ApprovalError, EngineFailure};
use crate::rbac::errors::RbacError;

#[derive(Debug, Error, Diagnostic)]
pub enum GateError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(fundgate::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rbac(#[from] RbacError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Approval(#[from] ApprovalError),

    #[error("Invalid setting: {0}")]
    #[diagnostic(
        code(fundgate::invalid_setting),
        help("Check config.toml and FUNDGATE__* environment overrides")
    )]
    InvalidSetting(String),
}

impl From<EngineFailure> for GateError {
    fn from(value: EngineFailure) -> Self {
        GateError::Approval(value.into())
    }
}
