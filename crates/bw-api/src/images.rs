use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use bw_auth::HttpTimeouts;

use crate::errors::{ApiError, Result};

/// Environment variables holding the image host credentials
pub const CLOUD_NAME_VAR: &str = "BOOKSWAP_IMG_CLOUD_NAME";
pub const API_KEY_VAR: &str = "BOOKSWAP_IMG_API_KEY";
pub const API_SECRET_VAR: &str = "BOOKSWAP_IMG_API_SECRET";

/// Image host credentials
#[derive(Debug, Clone)]
pub struct ImageHostConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl ImageHostConfig {
    /// Read all three credentials; fails closed on the first missing one,
    /// before any network traffic can happen
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            cloud_name: require_var(CLOUD_NAME_VAR)?,
            api_key: require_var(API_KEY_VAR)?,
            api_secret: require_var(API_SECRET_VAR)?,
        })
    }

    fn destroy_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/destroy",
            self.cloud_name
        )
    }
}

fn require_var(name: &'static str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ApiError::MissingCredential(name))
}

/// Signature over the signed parameters plus the secret, hex encoded.
/// Binding the timestamp into the digest time-boxes the request.
fn sign(public_id: &str, timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "public_id={}&timestamp={}{}",
        public_id, timestamp, api_secret
    ));
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Client for the image host's signed destroy endpoint
///
/// Uploads go straight from the browser to the host; the only call this side
/// makes is deleting a replaced or abandoned image by its public id.
#[derive(Debug, Clone)]
pub struct ImageHost {
    config: ImageHostConfig,
    destroy_endpoint: String,
    http: Client,
}

impl ImageHost {
    pub fn new(config: ImageHostConfig) -> Result<Self> {
        let timeouts = HttpTimeouts::default();
        let http = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .user_agent("bookswap")
            .build()?;

        let destroy_endpoint = config.destroy_url();
        Ok(Self {
            config,
            destroy_endpoint,
            http,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ImageHostConfig::from_env()?)
    }

    /// Same client pointed at a different destroy endpoint (tests)
    pub fn with_destroy_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.destroy_endpoint = endpoint.into();
        self
    }

    /// Delete an uploaded image by public id
    #[instrument(skip(self))]
    pub async fn destroy(&self, public_id: &str) -> Result<()> {
        let timestamp = Utc::now().timestamp();
        let signature = sign(public_id, timestamp, &self.config.api_secret);

        debug!("Requesting signed delete for {}", public_id);
        let response = self
            .http
            .post(&self.destroy_endpoint)
            .form(&[
                ("public_id", public_id),
                ("timestamp", &timestamp.to_string()),
                ("api_key", &self.config.api_key),
                ("signature", &signature),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status,
                body_snippet: body.chars().take(200).collect(),
            });
        }

        let body: DestroyResponse = response.json().await?;
        // "not found" is fine: the image is gone either way
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(ApiError::ImageHostRejected(other.to_string())),
        }
    }
}
