use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;
use url::Url;

use bw_auth::{ApiEnvelope, HttpTimeouts};

use crate::errors::{ApiError, Result};

/// Backend routes for the domain endpoints, relative to the API base URL
pub mod endpoints {
    pub const BOOKS: &str = "books";
    pub const AUTHORS: &str = "authors";
    pub const CATEGORIES: &str = "categories";
    pub const SLIDES: &str = "slides";
    pub const PROVINCES: &str = "provinces";
    pub const ADDRESSES: &str = "addresses";
    pub const CART: &str = "cart";
    pub const ORDERS: &str = "orders";
    pub const CHECKOUT: &str = "orders/checkout";
    pub const LISTINGS: &str = "listings";
    pub const USERS: &str = "users";
}

/// Client for the backend's domain endpoints
///
/// Catalog browsing works anonymously; account, order and back-office
/// endpoints need the session's access token attached. The token is plain
/// data here - session lifecycle stays with the session manager, which hands
/// out a fresh client after every auth change.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: Url) -> Result<Self> {
        let timeouts = HttpTimeouts::default();
        let http = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .user_agent("bookswap")
            .build()?;

        Ok(Self {
            base_url,
            http,
            access_token: None,
        })
    }

    /// Same client with a session token attached
    pub fn with_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Whether a session token is attached
    pub fn is_authorized(&self) -> bool {
        self.access_token.is_some()
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// The attached token, required for endpoints that never work anonymously
    pub(crate) fn require_token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .ok_or(ApiError::Unauthenticated)
    }

    pub(crate) async fn get_enveloped<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.authorize(self.http.get(url)).send().await?;
        self.read_envelope(response).await
    }

    pub(crate) async fn post_enveloped<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T> {
        let response = self.authorize(self.http.post(url)).json(body).send().await?;
        self.read_envelope(response).await
    }

    pub(crate) async fn put_enveloped<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T> {
        let response = self.authorize(self.http.put(url)).json(body).send().await?;
        self.read_envelope(response).await
    }

    pub(crate) async fn put_empty<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<()> {
        let response = self.authorize(self.http.put(url)).json(body).send().await?;
        let envelope: ApiEnvelope<serde_json::Value> = self.read_body(response).await?;
        Ok(envelope.into_empty_result()?)
    }

    pub(crate) async fn delete_enveloped(&self, url: Url) -> Result<()> {
        let response = self.authorize(self.http.delete(url)).send().await?;
        let envelope: ApiEnvelope<serde_json::Value> = self.read_body(response).await?;
        Ok(envelope.into_empty_result()?)
    }

    async fn read_envelope<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let envelope: ApiEnvelope<T> = self.read_body(response).await?;
        Ok(envelope.into_result()?)
    }

    async fn read_body<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            // Error statuses still carry the envelope; prefer its code and
            // message over a bare status line when present.
            if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                && let Err(rejection) = envelope.into_empty_result()
            {
                return Err(rejection.into());
            }

            return Err(ApiError::Http {
                status,
                body_snippet: body.chars().take(200).collect(),
            });
        }

        Ok(response.json().await?)
    }
}

/// Degrade a fetch to its sentinel value, logging the failure
///
/// List screens render empty rather than crash when the backend is
/// unreachable. Form saves must NOT go through this - they propagate their
/// error once so the form can display it.
pub fn or_sentinel<T: Default>(result: Result<T>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{} failed: {}", what, e);
            T::default()
        }
    }
}
