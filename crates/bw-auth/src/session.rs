use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserProfile;
use crate::roles;

/// Bearer token pair issued by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthTokens {
    pub fn new(access_token: String, refresh_token: String, expires_in: u64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(expires_in as i64);
        Self {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// True once the token is inside the proactive-refresh window
    pub fn is_expired(&self) -> bool {
        use crate::config::TOKEN_EXPIRY_SKEW;
        let skew = chrono::Duration::from_std(TOKEN_EXPIRY_SKEW)
            .unwrap_or(chrono::Duration::seconds(300));
        Utc::now() + skew >= self.expires_at
    }
}

/// The session record a storefront process owns
///
/// Created empty at startup, populated by sign-in, the provider callback, or
/// bootstrap hydration, mutated by refresh, destroyed on logout. Persisted
/// writes are last-writer-wins; nothing here validates the token itself -
/// a stale or forged token is only found out when the backend rejects it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub tokens: Option<AuthTokens>,
    pub profile: Option<UserProfile>,
    /// Cached result of [`roles::is_admin`] over the profile roles, kept for
    /// synchronous reads. Recomputed whenever the roles change; the stored
    /// value is never authoritative on its own.
    pub is_admin: bool,
}

impl Session {
    /// Session holding freshly issued tokens and no profile yet
    pub fn from_tokens(tokens: AuthTokens) -> Self {
        Self {
            tokens: Some(tokens),
            profile: None,
            is_admin: false,
        }
    }

    /// True iff an access token is present. Performs no validation.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.refresh_token.as_str())
    }

    /// Cached profile, if hydrated. Never triggers network I/O.
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Replace the profile and re-derive the admin flag from its roles
    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
        self.recompute_admin();
    }

    /// Re-derive the cached admin flag from the current roles
    pub fn recompute_admin(&mut self) {
        self.is_admin = self
            .profile
            .as_ref()
            .is_some_and(|profile| roles::is_admin(&profile.roles));
    }

    /// True when the access token is due for a proactive refresh
    pub fn needs_refresh(&self) -> bool {
        self.tokens.as_ref().is_some_and(AuthTokens::is_expired)
    }
}
