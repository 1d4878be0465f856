// web-server/src/relay.rs
//! Chat relay: forwards a user query to the agent API and pipes the
//! upstream event stream back to the browser untouched.
use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder};
use actix_web::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use actix_web::web::Bytes;
use common::{Chunk, SseEvent, EVENT_ERROR};
use futures_util::stream;
use reqwest::StatusCode;
use serde::Deserialize;
use uuid::Uuid;
use crate::agent_api::AgentApi;
use crate::auth::{clear_credential_cookies, get_auth_headers};
use crate::error::ApiError;

const MISSING_QUERY: &str = "User Query is required";
const MISSING_AGENT_URL: &str = "Agent API URL is not set";
const NO_RESPONSE_BODY: &str = "No response body from API";
const PROCESSING_FAILED: &str = "Failed to process message";

#[derive(Debug, Deserialize)]
struct ChatParams {
    query: Option<String>,
}

// Configure relay routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/chat")
            .route(web::get().to(chat_stream))
    );
}

/// Response headers shared by relayed and synthetic streams
fn event_stream() -> HttpResponseBuilder {
    let mut builder = HttpResponse::Ok();
    builder
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .insert_header((CONNECTION, "keep-alive"));
    builder
}

/// Stream carrying a single in-band error event telling the client to log in
fn unauthorized_stream() -> Result<HttpResponse, ApiError> {
    let event = SseEvent::json(EVENT_ERROR, &Chunk::unauthorized())
        .map_err(|_| ApiError::Internal(PROCESSING_FAILED))?;
    let frame = Bytes::from(event.to_wire());

    let mut builder = event_stream();
    clear_credential_cookies(&mut builder);
    Ok(builder.streaming(stream::once(async move { Ok::<_, std::io::Error>(frame) })))
}

// Chat relay handler
async fn chat_stream(
    req: HttpRequest,
    agent: web::Data<AgentApi>,
) -> Result<HttpResponse, ApiError> {
    let relay_id = Uuid::new_v4();

    // A malformed query string is treated like a missing query
    let query = web::Query::<ChatParams>::from_query(req.query_string())
        .ok()
        .and_then(|params| params.into_inner().query)
        .filter(|query| !query.is_empty())
        .ok_or(ApiError::BadRequest(MISSING_QUERY))?;

    let base_url = agent
        .base_url()
        .ok_or(ApiError::NotConfigured(MISSING_AGENT_URL))?;

    let auth_headers = get_auth_headers(&req);
    tracing::debug!(
        "Relay {} opening upstream stream (authenticated: {})",
        relay_id,
        !auth_headers.is_empty()
    );

    let response = agent
        .open_chat_stream(base_url, &query, &auth_headers)
        .await
        .map_err(|e| {
            tracing::error!("Relay {} failed to reach agent API: {}", relay_id, e);
            ApiError::Internal(PROCESSING_FAILED)
        })?;

    let status = response.status();
    if !status.is_success() {
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Relay {} rejected by agent API, clearing session", relay_id);
            return unauthorized_stream();
        }

        tracing::warn!("Relay {} upstream responded with status {}", relay_id, status.as_u16());
        return Err(ApiError::upstream(
            status.as_u16(),
            format!("API responded with status {}", status.as_u16()),
        ));
    }

    if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
        tracing::error!("Relay {} upstream returned an empty body", relay_id);
        return Err(ApiError::Internal(NO_RESPONSE_BODY));
    }

    tracing::info!("Relay {} streaming upstream response", relay_id);

    // Each upstream chunk is forwarded as-is, in order
    Ok(event_stream().streaming(response.bytes_stream()))
}
