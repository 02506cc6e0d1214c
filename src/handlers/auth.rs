// Authentication handlers: signup, login, logout, renew
use actix_web::{web, HttpRequest, HttpResponse};
use log::debug;
use serde::Deserialize;
use serde_json::json;

use crate::credentials::CredentialVerifier;
use crate::handlers::error::ApiError;
use crate::session::{extract_session_token, SessionManager};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `POST /auth/signup` — validate, register, and sign the new user in.
///
/// # Errors
///
/// Returns an error for invalid fields, a taken email, or store faults
pub async fn signup(
    body: web::Json<SignupRequest>,
    verifier: web::Data<CredentialVerifier>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, ApiError> {
    let user = verifier
        .signup(&body.name, &body.email, &body.password)
        .await?;
    let issued = sessions.create(&user.id).await?;

    Ok(HttpResponse::Created()
        .cookie(sessions.session_cookie(&issued))
        .json(json!({ "message": "Account created successfully" })))
}

/// `POST /auth/login` — verify credentials and open a session.
///
/// No session is created and no store write happens unless the credentials
/// check out.
///
/// # Errors
///
/// Returns an error for invalid fields, bad credentials, or store faults
pub async fn login(
    body: web::Json<LoginRequest>,
    verifier: web::Data<CredentialVerifier>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, ApiError> {
    let user = verifier.login(&body.email, &body.password).await?;
    let issued = sessions.create(&user.id).await?;

    Ok(HttpResponse::Ok()
        .cookie(sessions.session_cookie(&issued))
        .json(json!({ "message": "Login successful" })))
}

/// `POST /auth/logout` — revoke the current session and clear the cookie.
///
/// Succeeds whether or not a live session was presented; logging out twice
/// is not an error.
///
/// # Errors
///
/// Returns an error only when the store is unreachable
pub async fn logout(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, ApiError> {
    sessions
        .revoke(extract_session_token(&req).as_deref())
        .await?;

    Ok(HttpResponse::Ok()
        .cookie(sessions.clear_cookie())
        .json(json!({ "message": "Logout successful" })))
}

/// `POST /auth/renew` — sliding-expiration renewal of the current session.
///
/// Re-issues the cookie with the new expiry. A session that vanished
/// between verification and renewal reads as unauthenticated.
///
/// # Errors
///
/// Returns 401 without a valid session, 503 on store faults
pub async fn renew(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, ApiError> {
    let Some(identity) = sessions.verify_request(&req).await? else {
        return Err(ApiError::Unauthorized);
    };

    match sessions.renew(&identity.session_id).await? {
        Some(issued) => Ok(HttpResponse::Ok()
            .cookie(sessions.session_cookie(&issued))
            .json(json!({ "message": "Session renewed" }))),
        None => {
            debug!("session {} disappeared during renewal", identity.session_id);
            Err(ApiError::Unauthorized)
        }
    }
}
