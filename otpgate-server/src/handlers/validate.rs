//! MFA validation handler
//!
//! Runs the second-factor check for a user whose primary login already
//! succeeded. The login stage forwards the submitted form unchanged and names
//! the user in the `X-Authenticated-User` header.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use otpgate_core::{FormData, MfaDecision};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the username established by the primary login.
///
/// The header is trusted as is: it must be set by the upstream login stage,
/// which has to strip any client-supplied copy before forwarding.
pub const AUTHENTICATED_USER_HEADER: &str = "x-authenticated-user";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Successful validation response
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidateResponse {
    /// A provider accepted the submitted second factor
    Accepted { provider: &'static str },
    /// The user has no bindings
    NotRequired,
}

impl From<MfaDecision> for ValidateResponse {
    fn from(decision: MfaDecision) -> Self {
        match decision {
            MfaDecision::Accepted { provider } => Self::Accepted { provider },
            MfaDecision::NotRequired => Self::NotRequired,
        }
    }
}

/// POST /mfa/validate - Check the second factor of an authenticated user
///
/// Accepts `application/x-www-form-urlencoded` login form fields. Refused
/// codes answer 401 without saying which binding failed.
#[instrument(skip_all, fields(user = tracing::field::Empty))]
pub async fn validate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ValidateResponse>, ApiError> {
    let user = authenticated_user(&headers)?;
    tracing::Span::current().record("user", user);

    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        let content_type = content_type.to_str().unwrap_or_default();
        if !content_type.starts_with(FORM_CONTENT_TYPE) {
            return Err(ApiError::bad_request(format!(
                "Expected {FORM_CONTENT_TYPE} body"
            )));
        }
    }

    let form = FormData::from_urlencoded(&body);
    let bindings = state.bindings.bindings_for(user);

    let decision = state.registry.validate_mfa(&form, user, bindings).await?;
    info!(decision = ?decision, "MFA check passed");

    Ok(Json(decision.into()))
}

fn authenticated_user(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHENTICATED_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing authenticated user"))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_authenticated_user() {
        let mut headers = HeaderMap::new();
        assert!(authenticated_user(&headers).is_err());

        headers.insert(AUTHENTICATED_USER_HEADER, HeaderValue::from_static("  "));
        assert!(authenticated_user(&headers).is_err());

        headers.insert(AUTHENTICATED_USER_HEADER, HeaderValue::from_static("alice"));
        assert_eq!(authenticated_user(&headers).unwrap(), "alice");
    }

    #[test]
    fn test_response_shape() {
        let accepted = serde_json::to_value(ValidateResponse::Accepted {
            provider: "yubikey",
        })
        .unwrap();
        assert_eq!(
            accepted,
            serde_json::json!({"status": "accepted", "provider": "yubikey"})
        );

        let skipped = serde_json::to_value(ValidateResponse::NotRequired).unwrap();
        assert_eq!(skipped, serde_json::json!({"status": "not_required"}));
    }
}
