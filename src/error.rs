use lambda_http::{http::StatusCode, Error as LambdaError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::registry::RegistryError;

/// Fixed message returned when the registry hands back a partial certificate.
pub const INCOMPLETE_ISSUANCE_MESSAGE: &str = "Failed to create keys/certificates";

/// Internal application errors surfaced during request handling.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("{}", INCOMPLETE_ISSUANCE_MESSAGE)]
    IncompleteIssuance,
    #[error("{0}")]
    InvalidRequest(String),
}

impl AppError {
    /// Stable, machine-readable code placed in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Registry(_) => "registry_call_failed",
            AppError::IncompleteIssuance => "incomplete_issuance",
            AppError::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Registry(_) | AppError::IncompleteIssuance => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let mut body = ErrorBody::new(self.code(), self.to_string());
        if let AppError::Registry(err) = self {
            body.operation = Some(err.operation().as_str());
            body.aws_error_code = err.aws_code().map(str::to_owned);
        }
        body
    }
}

/// JSON error payload returned to callers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_error_code: Option<String>,
}

impl ErrorBody {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            operation: None,
            aws_error_code: None,
        }
    }
}

/// Convert a fatal start-up error into the Lambda runtime error type.
pub fn lambda_error(err: impl std::error::Error) -> LambdaError {
    let message = err.to_string();
    error!(error = ?err, message = %message, "fatal error forwarded to Lambda runtime");
    LambdaError::from(message)
}
