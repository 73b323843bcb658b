//! Service layer error types
//!
//! Provides a unified error type for all service operations.

use reaction_client::ApiError;
use reaction_common::AppError;
use reaction_core::DomainError;
use std::fmt;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Store or ledger failure
    Domain(DomainError),

    /// Remote API failure that survived the caller's retries
    Api(ApiError),

    /// Run stopped by a workspace-wide condition
    Aborted(String),

    /// Validation error
    Validation(String),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::Api(e) => write!(f, "{e}"),
            Self::Aborted(reason) => write!(f, "Run aborted: {reason}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an aborted error
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted(reason.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the whole run must stop
    pub fn is_workspace_fatal(&self) -> bool {
        match self {
            Self::Api(e) => e.is_workspace_fatal(),
            Self::Aborted(_) => true,
            _ => false,
        }
    }

    /// Get the error code for machine-readable output
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::Api(e) => e.code(),
            Self::Aborted(_) => "ABORTED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<ApiError> for ServiceError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::Api(e) if e.is_workspace_fatal() => AppError::Aborted(e.to_string()),
            ServiceError::Api(e) => AppError::ExternalService(e.to_string()),
            ServiceError::Aborted(reason) => AppError::Aborted(reason),
            ServiceError::Validation(msg) => AppError::Validation(msg),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
