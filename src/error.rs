use thiserror::Error;

/// Everything a gateway call can fail with. Provider faults are caught
/// at the client boundary and classified here; nothing escapes as an
/// unclassified panic.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limit exceeded on provider API")]
    RateLimited,

    #[error("Request to provider API timed out")]
    UpstreamTimeout,

    #[error("Provider transport error: {0}")]
    Transport(String),

    #[error("Provider API error: {body}")]
    UpstreamHttp { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unexpected error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status surfaced to gateway callers. Upstream HTTP errors
    /// pass their status through unchanged.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::RateLimited => 429,
            GatewayError::UpstreamTimeout => 504,
            GatewayError::Transport(_) => 502,
            GatewayError::UpstreamHttp { status, .. } => *status,
            GatewayError::Config(_)
            | GatewayError::Serialization(_)
            | GatewayError::Internal(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
