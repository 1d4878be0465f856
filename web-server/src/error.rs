// web-server/src/error.rs
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Terminal failure of an API route, rendered as `{"error": "<message>"}`
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller input is missing or invalid
    #[error("{0}")]
    BadRequest(&'static str),

    /// Deployment configuration is incomplete
    #[error("{0}")]
    NotConfigured(&'static str),

    /// The agent API answered with a failure status
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Anything unexpected while handling the request
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotConfigured(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_upstream_status_is_passed_through() {
        let err = ApiError::upstream(503, "API responded with status 503");
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "API responded with status 503");
    }

    #[test]
    fn test_invalid_upstream_status_maps_to_bad_gateway() {
        assert_eq!(ApiError::upstream(42, "odd").status_code(), StatusCode::BAD_GATEWAY);
    }
}
