use thiserror::Error;

/// Authentication and session storage error types
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status}: {body_snippet}")]
    Http {
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error(transparent)]
    Backend(#[from] crate::models::BackendRejection),

    #[error("Sign-in callback is missing the token or refresh token")]
    InvalidCallback,

    #[error("Missing refresh token - cannot refresh session")]
    MissingRefreshToken,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session storage lock timeout")]
    LockTimeout,

    #[error("JSON serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
