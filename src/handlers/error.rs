//! API error type mapping core failures onto HTTP responses
//!
//! The mapping encodes the propagation policy: session-validity failures
//! never reach this type (they are `None` at the manager boundary and
//! become a plain 401); what arrives here is either a credential outcome
//! with a defined user-visible shape, or an infrastructure fault that must
//! surface as retryable rather than as "unauthenticated".

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::credentials::AuthError;
use crate::session::SessionError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("session store unavailable")]
    StoreUnavailable,

    #[error("internal error")]
    Internal,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        log::error!("store failure: {e}");
        ApiError::StoreUnavailable
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Store(store) => store.into(),
            SessionError::Issue(cause) => {
                log::error!("token issuance failure: {cause}");
                ApiError::Internal
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Auth(auth) => match auth {
                AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::Hash => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            ApiError::Auth(AuthError::Validation(errors)) => {
                builder.json(json!({ "errors": errors }))
            }
            ApiError::Unauthorized => {
                builder.json(json!({ "message": "Authentication required" }))
            }
            ApiError::StoreUnavailable | ApiError::Auth(AuthError::Store(_)) => {
                builder.json(json!({ "message": "Service temporarily unavailable", "retryable": true }))
            }
            other => builder.json(json!({ "message": other.to_string() })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::FieldErrors;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::EmailTaken).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AuthError::Validation(FieldErrors::default())).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(StoreError::Unavailable("down".to_string())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_credential_rejection_is_generic() {
        let response = ApiError::from(AuthError::InvalidCredentials).error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
