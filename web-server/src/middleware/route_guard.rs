// web-server/src/middleware/route_guard.rs
use std::fmt;
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{header, StatusCode},
    Error, ResponseError,
    HttpResponse
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use crate::auth::is_authenticated;

const LOGIN_PATH: &str = "/login";

// Requests under these prefixes never need a session
const OPEN_PREFIXES: [&str; 2] = ["/api", LOGIN_PATH];

const ASSET_EXTENSIONS: [&str; 12] = [
    "svg", "png", "jpg", "jpeg", "gif", "webp", "css", "js", "woff", "woff2", "ttf", "eot",
];

// Short-circuit for pages that need a logged-in user
#[derive(Debug)]
struct LoginRequired {
    redirect: String,
}

impl fmt::Display for LoginRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Login required for {}", self.redirect)
    }
}

impl ResponseError for LoginRequired {
    fn status_code(&self) -> StatusCode {
        StatusCode::TEMPORARY_REDIRECT
    }

    fn error_response(&self) -> HttpResponse {
        let location = format!("{}?redirect={}", LOGIN_PATH, urlencoding::encode(&self.redirect));
        HttpResponse::TemporaryRedirect()
            .append_header((header::LOCATION, location))
            .finish()
    }
}

/// Static assets the login page itself needs
fn is_public_asset(path: &str) -> bool {
    if path == "/favicon.ico" {
        return true;
    }
    path.rsplit_once('.')
        .map(|(_, ext)| ASSET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Whether a path may be served without a session
pub fn is_open_path(path: &str) -> bool {
    OPEN_PREFIXES.iter().any(|p| path.starts_with(p)) || is_public_asset(path)
}

/// Redirects anonymous visitors of UI pages to the login page
#[derive(Debug, Clone, Default)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RouteGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RouteGuardMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RouteGuardMiddleware { service }))
    }
}

pub struct RouteGuardMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RouteGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();

        if !is_open_path(&path) && !is_authenticated(req.request()) {
            tracing::debug!("Redirecting anonymous request for {} to login", path);
            return Box::pin(async move {
                Err(LoginRequired { redirect: path }.into())
            });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            fut.await
        })
    }
}
