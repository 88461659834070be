use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

/// Everything that can go wrong between a submitted question and a rendered answer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("transport error{}: {body}", status_suffix(.status))]
    Transport { status: Option<u16>, body: String },
    #[error("query service reported a failure: {0}")]
    UpstreamFailure(String),
    #[error("no terminal status after {attempts} checks")]
    Timeout { attempts: u32 },
    #[error("question was interrupted before an answer arrived")]
    Interrupted,
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("a question is already in flight for this session")]
    QuestionInFlight,
    #[error("session not found: {0}")]
    SessionNotFound(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}

impl GatewayError {
    pub fn transport(status: Option<u16>, body: impl Into<String>) -> Self {
        GatewayError::Transport {
            status,
            body: body.into(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::EmptyQuestion => StatusCode::BAD_REQUEST,
            GatewayError::QuestionInFlight => StatusCode::CONFLICT,
            GatewayError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Transport { .. } | GatewayError::UpstreamFailure(_) => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Interrupted => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }
}
