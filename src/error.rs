//! Error types for pull-benchmark

use std::time::Duration;

use thiserror::Error;

/// Errors produced while generating images, measuring pulls, or analyzing results
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("image build failed: {0}")]
    Build(String),

    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("{0} not found")]
    NotFound(String),

    #[error("could not find event with reason {0}")]
    MissingEvent(String),

    #[error("event with reason {0} has no timestamp")]
    MissingTimestamp(String),

    #[error("received empty benchmark pod list")]
    EmptyPodList,

    #[error("could not find image pull duration")]
    PullDurationNotFound,

    #[error("invalid duration {0:?}")]
    InvalidDuration(String),

    #[error("{0}")]
    Mismatch(String),

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    pub fn config(msg: impl Into<String>) -> Self {
        BenchError::Config(msg.into())
    }

    pub fn mismatch(msg: impl Into<String>) -> Self {
        BenchError::Mismatch(msg.into())
    }

    /// True for a 404 from the api server
    pub fn is_not_found(&self) -> bool {
        matches!(self, BenchError::Kube(kube::Error::Api(e)) if e.code == 404)
    }

    /// True for a 409 from the api server
    pub fn is_conflict(&self) -> bool {
        matches!(self, BenchError::Kube(kube::Error::Api(e)) if e.code == 409)
    }
}

pub type BenchResult<T> = Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16, reason: &str) -> BenchError {
        BenchError::Kube(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: format!("request failed: {reason}"),
            reason: reason.to_string(),
            code,
        }))
    }

    #[test]
    fn test_api_status_helpers() {
        assert!(api_error(404, "NotFound").is_not_found());
        assert!(!api_error(404, "NotFound").is_conflict());
        assert!(api_error(409, "AlreadyExists").is_conflict());
        assert!(!api_error(500, "InternalError").is_not_found());
        assert!(!BenchError::config("bad").is_not_found());
    }
}
