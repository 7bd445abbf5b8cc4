//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use otpgate_core::MfaError;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized - missing primary authentication
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// MFA error from the provider chain
    #[error("MFA error: {0}")]
    Mfa(#[from] MfaError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Mfa(ref e) => match e {
                // Wrong code and unknown device look the same to the user
                MfaError::NoValidUserFound => StatusCode::UNAUTHORIZED,

                // Validation service cannot be used with our credentials
                MfaError::VerificationServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,

                // Validation service answered with an error
                MfaError::VerificationFailed(_) => StatusCode::BAD_GATEWAY,

                // Configuration problems surface as internal errors
                MfaError::ProviderUnconfigured
                | MfaError::DuplicateProvider(_)
                | MfaError::ConfigParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Mfa(ref e) => match e {
                MfaError::NoValidUserFound => "AUTHENTICATION_FAILED",
                MfaError::VerificationServiceUnavailable(_) => "VERIFICATION_UNAVAILABLE",
                MfaError::VerificationFailed(_) => "VERIFICATION_FAILED",
                MfaError::ProviderUnconfigured => "PROVIDER_UNCONFIGURED",
                MfaError::DuplicateProvider(_) => "DUPLICATE_PROVIDER",
                MfaError::ConfigParse(_) => "CONFIG_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // Never reveal why a second factor was refused
            Self::Mfa(ref e) => match e {
                MfaError::NoValidUserFound => "Authentication failed".to_string(),
                MfaError::VerificationServiceUnavailable(_) | MfaError::VerificationFailed(_) => {
                    "OTP validation service error".to_string()
                }
                _ => "MFA configuration error".to_string(),
            },
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Mfa(_) => "mfa",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        match &self {
            Self::BadRequest(_) => {
                tracing::warn!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    "Client error"
                );
            }
            Self::Unauthorized(_) => {
                tracing::warn!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    "Authentication error"
                );
            }
            Self::Mfa(e) if e.is_authentication_failure() => {
                tracing::info!(
                    status = %status,
                    category = category,
                    code = code,
                    "Second factor refused"
                );
            }
            Self::Mfa(_) => {
                tracing::error!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    client_message = %client_message,
                    "Server error"
                );
            }
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
