// web-server/src/agent_api.rs
use std::collections::HashMap;
use common::Config;
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};

const EVENT_STREAM: &str = "text/event-stream";

/// Connection details of the upstream agent API, fixed at startup
#[derive(Clone, Debug)]
pub struct AgentApi {
    http: Client,
    base_url: Option<String>,
    agent_type: String,
}

/// Body of the agent API's login and register endpoints
#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenData {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub message: Option<String>,
    pub data: TokenData,
}

/// Success body of register and logout; `data` carries nothing useful
#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: Option<String>,
}

impl AgentApi {
    pub fn new(base_url: Option<String>, agent_type: impl Into<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Self {
            http: Client::new(),
            base_url,
            agent_type: agent_type.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.agent_base_url().map(str::to_string), config.agent_type.clone())
    }

    /// Base URL of the agent API, `None` when the deployment does not set one
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Upstream URL of the streaming chat endpoint for a user query
    pub fn chat_url(&self, base_url: &str, query: &str) -> String {
        format!(
            "{}/agents/chat?agent_type={}&query={}",
            base_url,
            urlencoding::encode(&self.agent_type),
            urlencoding::encode(query)
        )
    }

    /// Open the upstream chat stream; the response body is not read
    pub async fn open_chat_stream(
        &self,
        base_url: &str,
        query: &str,
        auth_headers: &HashMap<String, String>,
    ) -> reqwest::Result<Response> {
        let mut request = self
            .http
            .get(self.chat_url(base_url, query))
            .header(header::ACCEPT, EVENT_STREAM);

        for (name, value) in auth_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        request.send().await
    }

    pub async fn login(&self, base_url: &str, credentials: &Credentials<'_>) -> reqwest::Result<Response> {
        self.http
            .post(format!("{}/login", base_url))
            .json(credentials)
            .send()
            .await
    }

    pub async fn register(&self, base_url: &str, credentials: &Credentials<'_>) -> reqwest::Result<Response> {
        self.http
            .post(format!("{}/register", base_url))
            .json(credentials)
            .send()
            .await
    }

    pub async fn logout(
        &self,
        base_url: &str,
        auth_headers: &HashMap<String, String>,
    ) -> reqwest::Result<Response> {
        let mut request = self.http.get(format!("{}/logout", base_url));
        for (name, value) in auth_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request.send().await
    }
}

/// Error message from a failed upstream response, or `fallback`
pub async fn upstream_error_message(response: Response, fallback: &str) -> String {
    response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
