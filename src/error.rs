use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode, Url};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvbError {
    #[error("No open session: call open() before issuing requests")]
    SessionNotOpen,

    #[error("Authorization rejected by the API: {0}")]
    Authorization(String),

    #[error("Rate limited by the API ({0})")]
    RateLimit(RateLimitedResponse),

    #[error("HTTP error {status_code}: {reason}")]
    Http { status_code: u16, reason: String },

    #[error("Malformed response from the API: {0}")]
    MalformedResponse(#[from] DecodeError),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EvbError {
    /// HTTP status behind the error, for the status-derived variants.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authorization(_) => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Self::RateLimit(resp) => Some(resp.status.as_u16()),
            Self::Http { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Why a success response body could not be decoded.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unexpected body shape: {0}")]
    Json(#[from] serde_json::Error),

    #[error("field `{field}` has timestamp {value:?} not in {format:?}: {source}")]
    Timestamp {
        field: &'static str,
        value: String,
        format: &'static str,
        #[source]
        source: chrono::ParseError,
    },
}

/// The parts of a 429 response a caller needs to schedule its own backoff.
#[derive(Debug, Clone)]
pub struct RateLimitedResponse {
    pub status: StatusCode,
    pub url: Url,
    pub headers: HeaderMap,
}

impl RateLimitedResponse {
    pub fn from_response(response: &Response) -> Self {
        Self {
            status: response.status(),
            url: response.url().clone(),
            headers: response.headers().clone(),
        }
    }

    /// Value of the `Retry-After` header in seconds, when the server sent one.
    pub fn retry_after(&self) -> Option<u64> {
        self.headers
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }
}

impl std::fmt::Display for RateLimitedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} from {}", self.status, self.url)?;
        if let Some(secs) = self.retry_after() {
            write!(f, ", retry after {}s", secs)?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, EvbError>;
