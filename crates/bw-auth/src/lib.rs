//! Session and authentication layer for the bookswap storefront
//!
//! The storefront delegates every piece of account logic to the backend API;
//! this crate owns the client side of that contract:
//!
//! 1. Password and provider (OAuth redirect) sign-in
//! 2. The session record: token pair, cached profile, derived admin flag
//! 3. Session persistence behind the [`SessionStore`] trait
//! 4. Proactive token refresh against the backend's refresh endpoint
//!
//! # Sign-in flow
//!
//! ```no_run
//! use bw_auth::{AuthClient, AuthConfig, AuthTokens, Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = AuthClient::new(AuthConfig::from_env()?)?;
//!
//!     // Password sign-in...
//!     let grant = client.login("lan", "secret").await?;
//!
//!     // ...or provider sign-in, which ends on a callback URL carrying the
//!     // token pair as query parameters.
//!     let callback = "https://shop.example/authenticate?token=T&refreshToken=R";
//!     let _tokens = client.parse_callback(callback)?;
//!
//!     let mut session = Session::from_tokens(AuthTokens::new(
//!         grant.token,
//!         grant.refresh_token,
//!         grant.expires_in.unwrap_or(3600),
//!     ));
//!
//!     // Hydrate the profile; the admin flag is derived from its roles.
//!     let profile = client.fetch_profile(&session.tokens.as_ref().unwrap().access_token).await?;
//!     session.set_profile(profile);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Session storage
//!
//! [`MemorySessionStore`] keeps the session in process memory (tests, simple
//! embedding); [`FileSessionStore`] persists it as plain JSON under the
//! platform config directory. Either way there is exactly one session slot
//! and writes are last-writer-wins - concurrent processes are not
//! coordinated. Stores never broadcast: the caller owns the auth-changed
//! signal (see `bw-core`).
//!
//! ```
//! use bw_auth::{AuthTokens, MemorySessionStore, Session, SessionStore};
//!
//! # async fn example() -> bw_auth::Result<()> {
//! let store = MemorySessionStore::new();
//!
//! let session = Session::from_tokens(AuthTokens::new(
//!     "access".to_string(),
//!     "refresh".to_string(),
//!     3600,
//! ));
//! store.save(&session).await?;
//!
//! assert!(store.load().await.is_some());
//! store.clear().await?;
//! assert!(store.load().await.is_none());
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod file_store;
pub mod models;
pub mod roles;
pub mod session;
pub mod store;

// Re-export main types
pub use client::AuthClient;
pub use config::{AuthConfig, HttpTimeouts, DEFAULT_TOKEN_LIFETIME_SECS, TOKEN_EXPIRY_SKEW};
pub use errors::{AuthError, Result};
pub use file_store::FileSessionStore;
pub use models::{
    ApiEnvelope, BackendRejection, CallbackTokens, Permission, RegisterRequest, Role, TokenGrant,
    UserProfile, CODE_SUCCESS,
};
pub use roles::{is_admin, RoleName};
pub use session::{AuthTokens, Session};
pub use store::{MemorySessionStore, SessionStore};
