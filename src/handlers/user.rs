// Session-gated user access and health check
use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use log::warn;

use crate::handlers::error::ApiError;
use crate::models::HealthResponse;
use crate::session::SessionManager;
use crate::store::UserStore;

/// `GET /auth/me` — the current user, resolved through the session.
///
/// Any session-validity failure reads as 401 so clients uniformly redirect
/// to re-authentication; only store faults surface differently.
///
/// # Errors
///
/// Returns 401 without a valid session, 503 on store faults
pub async fn current_user(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
    users: web::Data<Arc<dyn UserStore>>,
) -> Result<HttpResponse, ApiError> {
    let Some(identity) = sessions.verify_request(&req).await? else {
        return Err(ApiError::Unauthorized);
    };

    let Some(user) = users.find_by_id(&identity.owner_id).await? else {
        // Weak reference: the session outlived its user record
        warn!(
            "session {} references missing user {}",
            identity.session_id, identity.owner_id
        );
        return Err(ApiError::Unauthorized);
    };

    Ok(HttpResponse::Ok().json(user.profile()))
}

/// `GET /ping` — health check
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        message: format!("wicket {} is running", crate::VERSION),
    })
}
