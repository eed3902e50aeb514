use thiserror::Error;

/// Domain API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status}: {body_snippet}")]
    Http {
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error(transparent)]
    Backend(#[from] bw_auth::BackendRejection),

    #[error("Not signed in - this endpoint needs a session token")]
    Unauthenticated,

    #[error("Missing image host credential {0}")]
    MissingCredential(&'static str),

    #[error("Image host rejected the delete: {0}")]
    ImageHostRejected(String),

    #[error("Payment callback is missing {0}")]
    MissingPaymentParam(&'static str),

    #[error("Malformed payment reference: {0}")]
    InvalidPaymentReference(String),

    #[error("JSON serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
