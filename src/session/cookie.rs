use actix_web::cookie::{time::OffsetDateTime, Cookie, SameSite};
use actix_web::HttpRequest;
use chrono::{DateTime, Utc};

/// Name of the cookie carrying the signed session token
pub const SESSION_COOKIE: &str = "wicket_session";

/// Cookie transport for the session artifact.
///
/// The factory only moves opaque token strings in and out of cookies; it
/// never inspects them. Everything security-relevant happens in the token
/// codec and the session manager.
#[derive(Clone, Copy)]
pub struct CookieFactory {
    cookie_secure: bool,
}

impl CookieFactory {
    #[must_use]
    pub fn new(cookie_secure: bool) -> Self {
        Self { cookie_secure }
    }

    /// Build the session cookie: `httpOnly`, `sameSite=Lax`, `path=/`, with
    /// the cookie's own expiry matching the session record's.
    #[must_use]
    pub fn session_cookie(&self, token: &str, expires_at: DateTime<Utc>) -> Cookie<'static> {
        let expires = OffsetDateTime::from_unix_timestamp(expires_at.timestamp())
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);

        Cookie::build(SESSION_COOKIE.to_owned(), token.to_owned())
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .path("/")
            .expires(expires)
            .finish()
    }

    /// Build an already-expired session cookie, instructing the client to
    /// drop its retained artifact.
    #[must_use]
    pub fn clear_cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE.to_owned(), "")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(-1))
            .finish()
    }
}

/// Pull the session token out of a request, if any. Cookie absence is
/// indistinguishable from "no session" everywhere downstream.
#[must_use]
pub fn extract_session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_cookie_attributes() {
        let factory = CookieFactory::new(true);
        let expires_at = Utc::now() + Duration::days(7);
        let cookie = factory.session_cookie("token-value", expires_at);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "token-value");
        assert!(cookie.http_only().unwrap());
        assert!(cookie.secure().unwrap());
        assert_eq!(cookie.same_site().unwrap(), SameSite::Lax);
        assert_eq!(cookie.path().unwrap(), "/");
        assert_eq!(
            cookie.expires_datetime().unwrap().unix_timestamp(),
            expires_at.timestamp()
        );
    }

    #[test]
    fn test_insecure_factory_for_local_development() {
        let factory = CookieFactory::new(false);
        let cookie = factory.session_cookie("t", Utc::now() + Duration::days(7));
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let factory = CookieFactory::new(true);
        let cookie = factory.clear_cookie();

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert!(cookie.max_age().unwrap().whole_seconds() < 0);
    }

    #[test]
    fn test_extract_token_from_request() {
        let req = actix_web::test::TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "abc123"))
            .to_http_request();
        assert_eq!(extract_session_token(&req), Some("abc123".to_string()));

        let bare = actix_web::test::TestRequest::default().to_http_request();
        assert_eq!(extract_session_token(&bare), None);
    }
}
