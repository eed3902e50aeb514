use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Envelope every backend endpoint wraps its payload in
///
/// `code` 1000 is the success code across the whole API; any other code is a
/// rejection and `message` carries whatever explanation the backend gave.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope code denoting success
pub const CODE_SUCCESS: i64 = 1000;

/// A non-success envelope, carried as an error by both API client crates
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Backend rejected the request (code {code}): {message}")]
pub struct BackendRejection {
    pub code: i64,
    pub message: String,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning non-success codes into a rejection
    pub fn into_result(self) -> Result<T, BackendRejection> {
        if self.code != CODE_SUCCESS {
            return Err(BackendRejection {
                code: self.code,
                message: self
                    .message
                    .unwrap_or_else(|| "no message provided".to_string()),
            });
        }

        self.result.ok_or(BackendRejection {
            code: CODE_SUCCESS,
            message: "success envelope carried no result".to_string(),
        })
    }

    /// Unwrap an envelope whose payload is optional by design (e.g. logout)
    pub fn into_empty_result(self) -> Result<(), BackendRejection> {
        if self.code != CODE_SUCCESS {
            return Err(BackendRejection {
                code: self.code,
                message: self
                    .message
                    .unwrap_or_else(|| "no message provided".to_string()),
            });
        }
        Ok(())
    }
}

/// Token pair returned by sign-in and refresh endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires; the backend may omit it
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Token pair extracted from the provider sign-in callback URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTokens {
    pub token: String,
    pub refresh_token: String,
}

/// Password sign-in request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Refresh request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Account registration request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// User profile as served by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Avatar image URL on the image host
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
