// web-server/src/auth.rs
//! Session credential persistence in cookies and the auth header provider.
use std::collections::HashMap;
use actix_web::{HttpRequest, HttpResponseBuilder, cookie::{Cookie, SameSite}};
use actix_web::cookie::time::Duration as CookieDuration;
use common::{auth_headers, CookieConfig, SessionCredential};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const TOKEN_TYPE_COOKIE: &str = "token_type";

const SECONDS_PER_DAY: i64 = 60 * 60 * 24;

/// Read the persisted session credential, if any
pub fn session_credential(req: &HttpRequest) -> Option<SessionCredential> {
    let access_token = req.cookie(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string());
    let token_type = req.cookie(TOKEN_TYPE_COOKIE).map(|c| c.value().to_string());
    SessionCredential::from_parts(access_token, token_type)
}

/// Headers identifying the session to the agent API; empty when logged out
pub fn get_auth_headers(req: &HttpRequest) -> HashMap<String, String> {
    auth_headers(session_credential(req).as_ref())
}

pub fn is_authenticated(req: &HttpRequest) -> bool {
    session_credential(req).is_some()
}

/// Cookies persisting a freshly issued credential
pub fn credential_cookies(
    access_token: &str,
    token_type: &str,
    config: &CookieConfig,
) -> [Cookie<'static>; 2] {
    [
        credential_cookie(ACCESS_TOKEN_COOKIE, access_token, config),
        credential_cookie(TOKEN_TYPE_COOKIE, token_type, config),
    ]
}

fn credential_cookie(name: &'static str, value: &str, config: &CookieConfig) -> Cookie<'static> {
    Cookie::build(name, value.to_string())
        .path("/")
        .secure(config.secure)
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::seconds(config.age_days * SECONDS_PER_DAY))
        .finish()
}

/// Delete the persisted credential on the client
pub fn clear_credential_cookies(builder: &mut HttpResponseBuilder) {
    for name in [ACCESS_TOKEN_COOKIE, TOKEN_TYPE_COOKIE] {
        let cookie = Cookie::build(name, "")
            .path("/")
            .max_age(CookieDuration::seconds(0))
            .finish();
        builder.cookie(cookie);
    }
}
