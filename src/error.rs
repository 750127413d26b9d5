use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// The four on-disk artifacts a model is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    UnigramVocab,
    BigramVocab,
    TrigramVocab,
    Classifier,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::UnigramVocab => "unigram vocabulary",
            ArtifactKind::BigramVocab => "bigram vocabulary",
            ArtifactKind::TrigramVocab => "trigram vocabulary",
            ArtifactKind::Classifier => "classifier",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactFailure {
    pub artifact: ArtifactKind,
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for ArtifactFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.artifact, self.path.display(), self.reason)
    }
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to load model artifacts: {}", join_failures(.failures))]
    ArtifactLoad { failures: Vec<ArtifactFailure> },

    #[error("feature width mismatch: classifier expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

fn join_failures(failures: &[ArtifactFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            _ => {
                tracing::error!("Internal server error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

// Helper function for creating validation errors
pub fn validation_error(msg: &str) -> AppError {
    AppError::InvalidInput(msg.to_string())
}
