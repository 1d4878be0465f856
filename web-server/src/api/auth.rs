// web-server/src/api/auth.rs
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use common::Config;
use serde::Deserialize;
use serde_json::json;
use crate::agent_api::{upstream_error_message, AgentApi, Credentials, LoginResponse, MessageResponse};
use crate::auth::{clear_credential_cookies, credential_cookies, get_auth_headers};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: Option<String>,
    password: Option<String>,
}

/// Upstream message, unless missing or blank
fn message_or(message: Option<String>, fallback: &str) -> String {
    message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Both fields present and non-empty
fn required(a: Option<String>, b: Option<String>) -> Option<(String, String)> {
    match (a, b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => Some((a, b)),
        _ => None,
    }
}

// Exchange username/password for a session credential stored in cookies
#[post("/login")]
pub async fn login(
    body: web::Bytes,
    agent: web::Data<AgentApi>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    const FAILED: &str = "An error occurred during login";

    let request: LoginRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Login error: invalid request body: {}", e);
        ApiError::Internal(FAILED)
    })?;

    let (username, password) = required(request.username, request.password)
        .ok_or(ApiError::BadRequest("Username and password are required"))?;

    let base_url = agent
        .base_url()
        .ok_or(ApiError::NotConfigured("Login API URL is required"))?;

    let credentials = Credentials { email: &username, password: &password };
    let response = agent.login(base_url, &credentials).await.map_err(|e| {
        tracing::error!("Login error: {}", e);
        ApiError::Internal(FAILED)
    })?;

    let status = response.status();
    if !status.is_success() {
        let message = upstream_error_message(response, "Login failed").await;
        tracing::info!("Login rejected by agent API with status {}", status.as_u16());
        return Err(ApiError::upstream(status.as_u16(), message));
    }

    let issued: LoginResponse = response.json().await.map_err(|e| {
        tracing::error!("Login error: unexpected response body: {}", e);
        ApiError::Internal(FAILED)
    })?;

    let mut builder = HttpResponse::Ok();
    for cookie in credential_cookies(&issued.data.access_token, &issued.data.token_type, &config.cookies) {
        builder.cookie(cookie);
    }

    tracing::info!("Login successful");

    Ok(builder.json(json!({
        "message": message_or(issued.message, "Login successful")
    })))
}

// Create an account on the agent API; does not log the user in
#[post("/register")]
pub async fn register(
    body: web::Bytes,
    agent: web::Data<AgentApi>,
) -> Result<HttpResponse, ApiError> {
    const FAILED: &str = "An error occurred during registration";

    let request: RegisterRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Register error: invalid request body: {}", e);
        ApiError::Internal(FAILED)
    })?;

    let (email, password) = required(request.email, request.password)
        .ok_or(ApiError::BadRequest("Email and password are required"))?;

    let base_url = agent
        .base_url()
        .ok_or(ApiError::NotConfigured("Register API URL is required"))?;

    let credentials = Credentials { email: &email, password: &password };
    let response = agent.register(base_url, &credentials).await.map_err(|e| {
        tracing::error!("Register error: {}", e);
        ApiError::Internal(FAILED)
    })?;

    let status = response.status();
    if !status.is_success() {
        let message = upstream_error_message(response, "Registration failed").await;
        return Err(ApiError::upstream(status.as_u16(), message));
    }

    let registered: MessageResponse = response.json().await.map_err(|e| {
        tracing::error!("Register error: unexpected response body: {}", e);
        ApiError::Internal(FAILED)
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": message_or(registered.message, "User registered successfully")
    })))
}

// End the session upstream, then forget the credential
#[get("/logout")]
pub async fn logout(
    req: HttpRequest,
    agent: web::Data<AgentApi>,
) -> Result<HttpResponse, ApiError> {
    const FAILED: &str = "An error occurred during logout";

    let auth_headers = get_auth_headers(&req);

    let base_url = agent
        .base_url()
        .ok_or(ApiError::NotConfigured("Logout API URL is required"))?;

    let response = agent.logout(base_url, &auth_headers).await.map_err(|e| {
        tracing::error!("Logout error: {}", e);
        ApiError::Internal(FAILED)
    })?;

    let status = response.status();
    if !status.is_success() {
        let message = upstream_error_message(response, "Logout failed").await;
        return Err(ApiError::upstream(status.as_u16(), message));
    }

    let logged_out: MessageResponse = response.json().await.map_err(|e| {
        tracing::error!("Logout error: unexpected response body: {}", e);
        ApiError::Internal(FAILED)
    })?;

    let mut builder = HttpResponse::Ok();
    clear_credential_cookies(&mut builder);

    tracing::info!("Session logged out");

    Ok(builder.json(json!({
        "message": message_or(logged_out.message, "Logged out successfully")
    })))
}
