use std::collections::HashMap;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{endpoints, AuthConfig};
use crate::errors::{AuthError, Result};
use crate::models::{
    ApiEnvelope, CallbackTokens, LoginRequest, RefreshRequest, RegisterRequest, TokenGrant,
    UserProfile,
};

/// HTTP client for the backend's account and token endpoints
#[derive(Debug, Clone)]
pub struct AuthClient {
    config: AuthConfig,
    http: Client,
}

impl AuthClient {
    /// Create a new authentication client
    pub fn new(config: AuthConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.http_timeouts.connect)
            .timeout(config.http_timeouts.request)
            .user_agent(config.user_agent.as_deref().unwrap_or("bookswap"))
            .build()?;

        Ok(Self { config, http })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.config.base_url.join(path)?)
    }

    /// URL the user is sent to for provider sign-in
    ///
    /// The provider flow completes by redirecting back to the storefront's
    /// callback route; see [`AuthClient::parse_callback`].
    pub fn social_sign_in_url(&self) -> Result<Url> {
        self.endpoint(endpoints::SOCIAL_SIGN_IN)
    }

    /// Parse the sign-in callback URL and extract the issued token pair
    ///
    /// The callback contract is `token` and `refreshToken` as query
    /// parameters; absence of either is a hard failure. The URL carries the
    /// tokens themselves, so it is never recorded.
    #[instrument(skip(self, callback_url))]
    pub fn parse_callback(&self, callback_url: &str) -> Result<CallbackTokens> {
        let url = Url::parse(callback_url)?;
        let params: HashMap<_, _> = url.query_pairs().collect();

        let token = params.get("token").filter(|t| !t.is_empty());
        let refresh_token = params.get("refreshToken").filter(|t| !t.is_empty());

        match (token, refresh_token) {
            (Some(token), Some(refresh_token)) => Ok(CallbackTokens {
                token: token.to_string(),
                refresh_token: refresh_token.to_string(),
            }),
            _ => Err(AuthError::InvalidCallback),
        }
    }

    /// Sign in with username and password
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenGrant> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        debug!("Requesting token grant for {}", username);
        let response = self
            .http
            .post(self.endpoint(endpoints::LOGIN)?)
            .json(&request)
            .send()
            .await?;

        self.read_envelope(response).await
    }

    /// Register a new account
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile> {
        debug!("Registering account {}", request.username);
        let response = self
            .http
            .post(self.endpoint(endpoints::REGISTER)?)
            .json(request)
            .send()
            .await?;

        self.read_envelope(response).await
    }

    /// Exchange a refresh token for a fresh token pair
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };

        debug!("Refreshing access token");
        let response = self
            .http
            .post(self.endpoint(endpoints::REFRESH)?)
            .json(&request)
            .send()
            .await?;

        self.read_envelope(response).await
    }

    /// Invalidate the current token on the backend
    #[instrument(skip(self, access_token))]
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        debug!("Invalidating token on the backend");
        let response = self
            .http
            .post(self.endpoint(endpoints::LOGOUT)?)
            .bearer_auth(access_token)
            .send()
            .await?;

        let envelope: ApiEnvelope<serde_json::Value> = self.read_body(response).await?;
        Ok(envelope.into_empty_result()?)
    }

    /// Fetch the signed-in user's profile
    #[instrument(skip(self, access_token))]
    pub async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile> {
        debug!("Fetching user profile");
        let response = self
            .http
            .get(self.endpoint(endpoints::MY_PROFILE)?)
            .bearer_auth(access_token)
            .send()
            .await?;

        self.read_envelope(response).await
    }

    /// Decode an enveloped response, unwrapping the payload
    async fn read_envelope<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let envelope: ApiEnvelope<T> = self.read_body(response).await?;
        Ok(envelope.into_result()?)
    }

    /// Check the HTTP status and deserialize the body
    async fn read_body<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            // The backend serves its envelope on error statuses too; prefer
            // its code/message over a bare status line when present.
            if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                && let Err(rejection) = envelope.into_empty_result()
            {
                return Err(rejection.into());
            }

            return Err(AuthError::Http {
                status,
                body_snippet: body.chars().take(200).collect(),
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> AuthClient {
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        AuthClient::new(AuthConfig::new(base)).unwrap()
    }

    #[tokio::test]
    async fn login_unwraps_the_token_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .and(body_partial_json(serde_json::json!({"username": "lan"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 1000,
                "result": {"token": "T1", "refreshToken": "R1", "expiresIn": 3600}
            })))
            .mount(&server)
            .await;

        let grant = client_for(&server)
            .await
            .login("lan", "secret")
            .await
            .unwrap();
        assert_eq!(grant.token, "T1");
        assert_eq!(grant.refresh_token, "R1");
        assert_eq!(grant.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn login_surfaces_backend_rejections() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "code": 1006,
                "message": "Unauthenticated"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .login("lan", "wrong")
            .await
            .unwrap_err();

        match err {
            AuthError::Backend(rejection) => {
                assert_eq!(rejection.code, 1006);
                assert_eq!(rejection.message, "Unauthenticated");
            }
            other => panic!("Expected Backend rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn refresh_posts_the_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_partial_json(serde_json::json!({"refreshToken": "R1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 1000,
                "result": {"token": "T2", "refreshToken": "R2"}
            })))
            .mount(&server)
            .await;

        let grant = client_for(&server).await.refresh("R1").await.unwrap();
        assert_eq!(grant.token, "T2");
        assert_eq!(grant.expires_in, None);
    }

    #[tokio::test]
    async fn fetch_profile_sends_the_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/my-info"))
            .and(header("authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 1000,
                "result": {
                    "id": "u1",
                    "username": "lan",
                    "roles": [{"name": "ADMIN"}]
                }
            })))
            .mount(&server)
            .await;

        let profile = client_for(&server).await.fetch_profile("T1").await.unwrap();
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.roles[0].name, "ADMIN");
    }

    #[tokio::test]
    async fn callback_with_both_tokens_parses() {
        let client = AuthClient::new(AuthConfig::default()).unwrap();
        let tokens = client
            .parse_callback("https://shop.example/authenticate?token=T1&refreshToken=R1")
            .unwrap();

        assert_eq!(tokens.token, "T1");
        assert_eq!(tokens.refresh_token, "R1");
    }

    #[tokio::test]
    async fn callback_missing_refresh_token_is_rejected() {
        let client = AuthClient::new(AuthConfig::default()).unwrap();
        let err = client
            .parse_callback("https://shop.example/authenticate?token=T1")
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCallback));
    }

    #[tokio::test]
    async fn callback_with_empty_token_is_rejected() {
        let client = AuthClient::new(AuthConfig::default()).unwrap();
        let err = client
            .parse_callback("https://shop.example/authenticate?token=&refreshToken=R1")
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCallback));
    }
}
