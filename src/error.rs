//! Service-level error types
//!
//! Errors raised at the transport boundary (decode, unknown task, full queue)
//! are returned to the HTTP caller immediately. Evaluation errors never reach
//! this type on the submission path; they are recorded on the task itself.

use crate::evaluator::EvaluationError;
use crate::tasks::{QueueError, RegistryError, TaskId};
use thiserror::Error;
use warp::http::StatusCode;

/// Main error type for task service operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to decode request: {message}")]
    DecodeError { message: String },

    #[error("Task not found: {id}")]
    NotFound { id: TaskId },

    #[error("Invalid task ID: {raw}")]
    InvalidTaskId { raw: String },

    #[error("Malformed expression: {0}")]
    MalformedExpression(#[from] EvaluationError),

    #[error("Dispatch queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Internal error: {message}")]
    InternalError { message: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

impl ServiceError {
    /// HTTP status code reported to the caller for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::DecodeError { .. } | ServiceError::InvalidTaskId { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::MalformedExpression(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::QueueFull { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::InternalError { .. } | ServiceError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::DecodeError { .. } => "decode_error",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::InvalidTaskId { .. } => "invalid_task_id",
            ServiceError::MalformedExpression(_) => EvaluationError::KIND,
            ServiceError::QueueFull { .. } => "queue_full",
            ServiceError::InternalError { .. } | ServiceError::ConfigError(_) => "internal_error",
        }
    }

    /// Create decode error
    pub fn decode_error<S: Into<String>>(message: S) -> Self {
        Self::DecodeError {
            message: message.into(),
        }
    }

    /// Create invalid task ID error
    pub fn invalid_task_id<S: Into<String>>(raw: S) -> Self {
        Self::InvalidTaskId { raw: raw.into() }
    }

    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { id } => ServiceError::NotFound { id },
            other => ServiceError::internal_error(other.to_string()),
        }
    }
}

impl From<QueueError> for ServiceError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Full { capacity } => ServiceError::QueueFull { capacity },
            QueueError::Closed => ServiceError::internal_error("dispatch queue is closed"),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
