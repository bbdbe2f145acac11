use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::Http {
            status: status.as_u16(),
            body: Self::truncate_body(body),
        }
    }

    /// Whether the failure is a malformed payload rather than transport.
    pub fn is_decode(&self) -> bool {
        matches!(self, ApiError::Decode(_))
    }
}
