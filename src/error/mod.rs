use crate::models::ErrorResponse;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::{debug, error};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid product identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Product not found: {0}")]
    TargetNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Catalog has {size} products, limit is {limit}")]
    CatalogTooLarge { size: usize, limit: usize },

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Recommendation computation failed: {0}")]
    ComputationFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidIdentifier(_) => "invalid_identifier",
            ApiError::TargetNotFound(_) => "target_not_found",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::CatalogTooLarge { .. } => "catalog_too_large",
            ApiError::CatalogError(_) => "catalog_error",
            ApiError::SerializationError(_) => "serialization_error",
            ApiError::ComputationFailure(_) => "computation_failure",
            ApiError::ConfigError(_) => "config_error",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    /// Expected outcomes are resolved at the boundary; everything else is a fault.
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            ApiError::ComputationFailure(_) | ApiError::InternalError(_)
        )
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidIdentifier(_) | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::TargetNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::CatalogTooLarge { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::CatalogError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_unexpected() {
            error!("Request failed unexpectedly: {}", self);
        } else {
            debug!("Request resolved with {}: {}", self.kind(), self);
        }

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            kind: self.kind().to_string(),
        })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::CatalogError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::ComputationFailure(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}
