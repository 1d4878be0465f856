// common/src/models/session.rs
use std::collections::HashMap;

/// Token type assumed when the session does not carry one
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Credential issued by the agent API's login flow and persisted client-side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredential {
    pub access_token: String,
    pub token_type: Option<String>,
}

impl SessionCredential {
    /// Build a credential from persisted values; an empty token means no session
    pub fn from_parts(access_token: Option<String>, token_type: Option<String>) -> Option<Self> {
        let access_token = access_token.filter(|token| !token.is_empty())?;
        Some(Self {
            access_token,
            token_type: token_type.filter(|kind| !kind.is_empty()),
        })
    }

    pub fn token_type(&self) -> &str {
        self.token_type.as_deref().unwrap_or(DEFAULT_TOKEN_TYPE)
    }

    /// Value of the `Authorization` header for this credential
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type(), self.access_token)
    }
}

/// Headers to attach to an upstream request on behalf of the session
///
/// An absent credential yields no headers; the request is still attempted.
pub fn auth_headers(credential: Option<&SessionCredential>) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    if let Some(credential) = credential {
        headers.insert(AUTHORIZATION_HEADER.to_string(), credential.authorization());
    }
    headers
}
