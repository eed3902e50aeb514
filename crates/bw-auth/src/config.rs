use std::time::Duration;

use url::Url;

use crate::errors::{AuthError, Result};

/// Backend routes consumed by the auth client, relative to the API base URL
pub mod endpoints {
    pub const LOGIN: &str = "auth/token";
    pub const REFRESH: &str = "auth/refresh";
    pub const LOGOUT: &str = "auth/logout";
    pub const REGISTER: &str = "users";
    pub const MY_PROFILE: &str = "users/my-info";
    pub const SOCIAL_SIGN_IN: &str = "oauth2/authorization/google";
}

/// Environment variable holding the backend API base URL
pub const API_URL_VAR: &str = "BOOKSWAP_API_URL";

/// Base URL used when the environment does not provide one
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1/";

/// Refresh tokens this far ahead of their expiry
pub const TOKEN_EXPIRY_SKEW: Duration = Duration::from_secs(300);

/// Token lifetime assumed when the backend omits `expiresIn`
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(30),
        }
    }
}

/// Configuration for [`crate::AuthClient`]
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Backend API base URL; endpoint paths are joined onto it
    pub base_url: Url,

    /// HTTP client timeouts
    pub http_timeouts: HttpTimeouts,

    /// Custom user agent (optional)
    pub user_agent: Option<String>,
}

impl AuthConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            http_timeouts: HttpTimeouts::default(),
            user_agent: Some("bookswap".to_string()),
        }
    }

    /// Parse a base URL out of its string form
    pub fn parse(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;

        if base_url.cannot_be_a_base() {
            return Err(AuthError::InvalidResponse(format!(
                "Not a usable base URL: {}",
                base_url
            )));
        }

        Ok(Self::new(base_url))
    }

    /// Build a config from `BOOKSWAP_API_URL`, falling back to the local
    /// development backend when the variable is unset.
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var(API_URL_VAR).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::parse(&raw)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_API_URL).expect("valid default API URL"))
    }
}
