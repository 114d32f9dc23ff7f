use thiserror::Error;

use crate::model::ValidationIssue;

#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("Invalid certificate data: {0}")]
    InvalidData(String),

    #[error("Certificate is incomplete: {}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Validation code error: {0}")]
    Code(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("An export is already in progress")]
    ExportInFlight,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CertificateError>;

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
