use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use bw_auth::{
    AuthClient, AuthTokens, Result as AuthResult, Session, SessionStore, TokenGrant,
    DEFAULT_TOKEN_LIFETIME_SECS, TOKEN_EXPIRY_SKEW,
};

use crate::events::{AppEvent, AuthSnapshot, EventBus};
use crate::routes::{ADMIN_HOME_ROUTE, HOME_ROUTE, LOGIN_ROUTE};
use crate::NotificationCenter;

/// Shortest pause between two proactive refresh rounds
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Terminal states of the provider sign-in callback flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInOutcome {
    /// Tokens and profile stored; land on the role-appropriate page
    SignedIn { landing_route: &'static str },
    /// Flow failed; the visitor is sent back to login
    Failed { landing_route: &'static str },
}

impl SignInOutcome {
    pub fn landing_route(&self) -> &'static str {
        match *self {
            Self::SignedIn { landing_route } | Self::Failed { landing_route } => landing_route,
        }
    }
}

/// Owns the session for one storefront process
///
/// Constructed once at application start with its store, backend client and
/// signal channels injected; every other component reads session state
/// through it instead of touching storage directly. All mutations persist
/// first, then broadcast the auth-changed event.
///
/// Async completions (profile fetch, token refresh) can outlive the session
/// they were started for. Every mutation bumps an epoch; a completion that
/// started under an older epoch discards its result instead of clobbering
/// the newer session.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    client: AuthClient,
    bus: EventBus,
    notifications: NotificationCenter,
    epoch: Arc<AtomicU64>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        client: AuthClient,
        bus: EventBus,
        notifications: NotificationCenter,
    ) -> Self {
        Self {
            store,
            client,
            bus,
            notifications,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Current session as stored; anonymous if nothing is stored
    pub async fn session(&self) -> Session {
        self.store.load().await.unwrap_or_default()
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn bump_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn broadcast_auth(&self, session: &Session) {
        self.bus
            .publish(AppEvent::AuthChanged(AuthSnapshot::from_session(session)));
    }

    /// One-time startup hydration
    ///
    /// Restores whatever the previous run left behind and starts the
    /// proactive refresh schedule. Never fails application start: network
    /// problems are logged and swallowed, and the app renders with whatever
    /// state is available - possibly token-only, possibly anonymous.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) {
        let Some(mut session) = self.store.load().await else {
            debug!("No stored session; starting anonymous");
            return;
        };

        if !session.is_authenticated() {
            debug!("Stored session has no token; starting anonymous");
            return;
        }

        if session.profile().is_some() {
            // Roles may have changed server-side since the flag was cached
            session.recompute_admin();
            if let Err(e) = self.store.save(&session).await {
                warn!("Failed to persist rehydrated session: {}", e);
            }
            self.broadcast_auth(&session);
        } else {
            match self.hydrate_profile(&mut session).await {
                Ok(()) => {
                    info!("Profile hydrated for {}", session_user(&session));
                    self.broadcast_auth(&session);
                }
                Err(e) => {
                    // Token-only is a degraded state the UI tolerates
                    warn!("Profile fetch during bootstrap failed: {}", e);
                }
            }
        }

        self.spawn_refresh_loop();
    }

    /// Password sign-in; persists the session and starts refresh scheduling
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<Session> {
        let grant = self.client.login(username, password).await?;
        let session = self.install_grant(grant).await?;
        self.spawn_refresh_loop();
        Ok(session)
    }

    /// Complete a provider sign-in from the callback URL
    ///
    /// Tokens are persisted before the profile fetch on purpose: a failed
    /// fetch leaves the visitor holding valid tokens, so retrying does not
    /// require authenticating with the provider again.
    #[instrument(skip(self, callback_url))]
    pub async fn complete_sign_in(&self, callback_url: &str) -> SignInOutcome {
        let tokens = match self.client.parse_callback(callback_url) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Rejected sign-in callback: {}", e);
                self.notifications.error("Đăng nhập thất bại");
                return SignInOutcome::Failed {
                    landing_route: LOGIN_ROUTE,
                };
            }
        };

        self.bump_epoch();
        let mut session = Session::from_tokens(AuthTokens::new(
            tokens.token,
            tokens.refresh_token,
            DEFAULT_TOKEN_LIFETIME_SECS,
        ));

        if let Err(e) = self.store.save(&session).await {
            warn!("Failed to persist callback tokens: {}", e);
            self.notifications.error("Đăng nhập thất bại");
            return SignInOutcome::Failed {
                landing_route: LOGIN_ROUTE,
            };
        }

        match self.hydrate_profile(&mut session).await {
            Ok(()) => {
                self.spawn_refresh_loop();
                self.broadcast_auth(&session);
                self.notifications.success("Đăng nhập thành công");

                let landing_route = if session.is_admin {
                    ADMIN_HOME_ROUTE
                } else {
                    HOME_ROUTE
                };
                SignInOutcome::SignedIn { landing_route }
            }
            Err(e) => {
                warn!("Profile fetch after sign-in callback failed: {}", e);
                self.notifications
                    .error("Không thể tải thông tin người dùng");
                SignInOutcome::Failed {
                    landing_route: LOGIN_ROUTE,
                }
            }
        }
    }

    /// Sign out: clear the store, stop scheduled refreshes, broadcast
    #[instrument(skip(self))]
    pub async fn logout(&self) -> AuthResult<()> {
        self.bump_epoch();

        let session = self.store.load().await;
        if let Some(token) = session.as_ref().and_then(Session::access_token) {
            // Best-effort server-side invalidation
            if let Err(e) = self.client.logout(token).await {
                warn!("Backend logout failed: {}", e);
            }
        }

        self.store.clear().await?;
        self.bus
            .publish(AppEvent::AuthChanged(AuthSnapshot::anonymous()));
        Ok(())
    }

    /// Kick off the proactive refresh schedule for the current session
    ///
    /// Refreshes immediately, then again ahead of each expiry. The task dies
    /// quietly once the session it was started for is replaced or cleared.
    pub fn spawn_refresh_loop(&self) -> JoinHandle<()> {
        let manager = self.clone();
        let epoch = manager.current_epoch();

        tokio::spawn(async move {
            loop {
                match manager.refresh_once(epoch).await {
                    Ok(Some(expires_at)) => {
                        tokio::time::sleep(refresh_delay(expires_at)).await;
                    }
                    Ok(None) => {
                        debug!("Refresh schedule retired");
                        break;
                    }
                    Err(e) => {
                        // The next sign-in or restart starts a new schedule
                        warn!("Token refresh failed: {}", e);
                        break;
                    }
                }
            }
        })
    }

    /// One refresh round; yields the next expiry while the schedule should
    /// continue, `None` once it is stale
    async fn refresh_once(&self, epoch: u64) -> AuthResult<Option<DateTime<Utc>>> {
        if self.current_epoch() != epoch {
            return Ok(None);
        }

        let session = self.store.load().await.unwrap_or_default();
        let Some(refresh_token) = session.refresh_token().map(str::to_string) else {
            return Ok(None);
        };

        let grant = self.client.refresh(&refresh_token).await?;

        // A sign-in or logout racing the request wins; drop the stale grant
        if self.current_epoch() != epoch {
            debug!("Discarding refresh result from a superseded session");
            return Ok(None);
        }

        let mut session = self.store.load().await.unwrap_or_default();
        let tokens = AuthTokens::new(
            grant.token,
            grant.refresh_token,
            grant.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
        );
        let expires_at = tokens.expires_at;
        session.tokens = Some(tokens);

        self.store.save(&session).await?;
        self.broadcast_auth(&session);
        debug!("Access token refreshed; next expiry {}", expires_at);

        Ok(Some(expires_at))
    }

    /// Persist a fresh grant and hydrate its profile
    async fn install_grant(&self, grant: TokenGrant) -> AuthResult<Session> {
        self.bump_epoch();

        let mut session = Session::from_tokens(AuthTokens::new(
            grant.token,
            grant.refresh_token,
            grant.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
        ));

        if let Err(e) = self.hydrate_profile(&mut session).await {
            // Token-only sign-in still counts; the profile can hydrate later
            warn!("Profile fetch after sign-in failed: {}", e);
            self.store.save(&session).await?;
        }

        self.broadcast_auth(&session);
        Ok(session)
    }

    /// Fetch the profile for the session's token, recompute the admin flag
    /// and persist the result
    async fn hydrate_profile(&self, session: &mut Session) -> AuthResult<()> {
        let Some(token) = session.access_token().map(str::to_string) else {
            return Ok(());
        };

        let profile = self.client.fetch_profile(&token).await?;
        session.set_profile(profile);
        self.store.save(session).await?;
        Ok(())
    }
}

fn session_user(session: &Session) -> &str {
    session
        .profile()
        .map(|p| p.username.as_str())
        .unwrap_or("<anonymous>")
}

/// Sleep long enough to wake just ahead of the expiry, never hot-looping
fn refresh_delay(expires_at: DateTime<Utc>) -> Duration {
    let until_expiry = (expires_at - Utc::now()).to_std().unwrap_or_default();
    until_expiry
        .saturating_sub(TOKEN_EXPIRY_SKEW)
        .max(MIN_REFRESH_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::AppEvent;
    use bw_auth::{AuthConfig, MemorySessionStore, Role, UserProfile};
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn profile_body(roles: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "code": 1000,
            "result": {
                "id": "u1",
                "username": "lan",
                "roles": roles.iter().map(|r| serde_json::json!({"name": r})).collect::<Vec<_>>()
            }
        })
    }

    fn grant_body(token: &str, refresh: &str) -> serde_json::Value {
        serde_json::json!({
            "code": 1000,
            "result": {"token": token, "refreshToken": refresh, "expiresIn": 3600}
        })
    }

    async fn manager_for(server: &MockServer) -> (SessionManager, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        let client = AuthClient::new(AuthConfig::new(base)).unwrap();
        let manager = SessionManager::new(
            store.clone(),
            client,
            EventBus::new(),
            NotificationCenter::new(),
        );
        (manager, store)
    }

    fn stored_session(tokens: Option<AuthTokens>, roles: Option<&[&str]>) -> Session {
        let mut session = Session::default();
        session.tokens = tokens;
        if let Some(roles) = roles {
            session.set_profile(UserProfile {
                id: "u1".to_string(),
                username: "lan".to_string(),
                email: None,
                first_name: None,
                last_name: None,
                avatar: None,
                roles: roles
                    .iter()
                    .map(|name| Role {
                        name: (*name).to_string(),
                        description: None,
                        permissions: vec![],
                    })
                    .collect(),
            });
        }
        session
    }

    #[tokio::test]
    async fn bootstrap_without_a_session_stays_anonymous() {
        let server = MockServer::start().await;
        let (manager, _store) = manager_for(&server).await;
        let mut events = manager.events().subscribe();

        manager.bootstrap().await;

        assert!(matches!(
            events.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
        assert!(!manager.session().await.is_authenticated());
    }

    #[tokio::test]
    async fn bootstrap_with_cached_profile_recomputes_and_broadcasts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(grant_body("T2", "R2")),
            )
            .mount(&server)
            .await;

        let (manager, store) = manager_for(&server).await;
        let mut stale = stored_session(
            Some(AuthTokens::new("T1".to_string(), "R1".to_string(), 3600)),
            Some(&["ADMIN"]),
        );
        // Simulate a stale cached flag from an older run
        stale.is_admin = false;
        store.save(&stale).await.unwrap();

        let mut events = manager.events().subscribe();
        manager.bootstrap().await;

        match events.recv().await.unwrap() {
            AppEvent::AuthChanged(snapshot) => {
                assert!(snapshot.authenticated);
                assert!(snapshot.is_admin, "cached flag must be recomputed from roles");
            }
            other => panic!("Expected AuthChanged, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bootstrap_tolerates_a_failed_profile_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/my-info"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(grant_body("T2", "R2")),
            )
            .mount(&server)
            .await;

        let (manager, store) = manager_for(&server).await;
        store
            .save(&stored_session(
                Some(AuthTokens::new("T1".to_string(), "R1".to_string(), 3600)),
                None,
            ))
            .await
            .unwrap();

        let mut events = manager.events().subscribe();
        manager.bootstrap().await;

        // Token-only degraded state: still authenticated, no profile
        let session = manager.session().await;
        assert!(session.is_authenticated());
        assert!(session.profile().is_none());

        // The refresh schedule still runs and broadcasts once it lands
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("refresh broadcast expected")
            .unwrap();
        match event {
            AppEvent::AuthChanged(snapshot) => assert!(snapshot.authenticated),
            other => panic!("Expected AuthChanged, got {:?}", other),
        }
        assert_eq!(manager.session().await.access_token(), Some("T2"));
    }

    #[tokio::test]
    async fn callback_signs_an_admin_in_and_lands_on_the_back_office() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/my-info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body(&["ADMIN"])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(grant_body("T2", "R2")),
            )
            .mount(&server)
            .await;

        let (manager, store) = manager_for(&server).await;
        let outcome = manager
            .complete_sign_in("https://shop.example/authenticate?token=T1&refreshToken=R1")
            .await;

        assert_eq!(
            outcome,
            SignInOutcome::SignedIn {
                landing_route: ADMIN_HOME_ROUTE
            }
        );

        let session = store.load().await.unwrap();
        assert!(session.is_admin);
        assert!(session.profile().is_some());
        // T1 may already have been rotated by the refresh schedule
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn callback_missing_refresh_token_never_fetches_the_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/my-info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body(&["USER"])))
            .expect(0)
            .mount(&server)
            .await;

        let (manager, store) = manager_for(&server).await;
        let mut toasts = manager.notifications().subscribe();

        let outcome = manager
            .complete_sign_in("https://shop.example/authenticate?token=T1")
            .await;

        assert_eq!(
            outcome,
            SignInOutcome::Failed {
                landing_route: LOGIN_ROUTE
            }
        );
        assert!(store.load().await.is_none(), "nothing may be persisted");

        match toasts.recv().await.unwrap() {
            crate::NotificationEvent::Posted(toast) => {
                assert_eq!(toast.kind, crate::NotificationKind::Error);
            }
            other => panic!("Expected Posted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn callback_keeps_tokens_when_the_profile_fetch_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/my-info"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (manager, store) = manager_for(&server).await;
        let outcome = manager
            .complete_sign_in("https://shop.example/authenticate?token=T1&refreshToken=R1")
            .await;

        assert_eq!(
            outcome,
            SignInOutcome::Failed {
                landing_route: LOGIN_ROUTE
            }
        );

        // Tokens survive so a retry does not re-run the provider flow
        let session = store.load().await.unwrap();
        assert_eq!(session.access_token(), Some("T1"));
        assert_eq!(session.refresh_token(), Some("R1"));
        assert!(session.profile().is_none());
    }

    #[tokio::test]
    async fn login_hydrates_profile_and_broadcasts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(grant_body("T1", "R1")),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/my-info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body(&["USER"])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(grant_body("T2", "R2")),
            )
            .mount(&server)
            .await;

        let (manager, _store) = manager_for(&server).await;
        let mut events = manager.events().subscribe();

        let session = manager.login("lan", "secret").await.unwrap();
        assert_eq!(session.profile().unwrap().username, "lan");
        assert!(!session.is_admin);

        match events.recv().await.unwrap() {
            AppEvent::AuthChanged(snapshot) => {
                assert_eq!(snapshot.username.as_deref(), Some("lan"));
            }
            other => panic!("Expected AuthChanged, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn logout_clears_the_store_and_broadcasts_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"code": 1000})),
            )
            .mount(&server)
            .await;

        let (manager, store) = manager_for(&server).await;
        store
            .save(&stored_session(
                Some(AuthTokens::new("T1".to_string(), "R1".to_string(), 3600)),
                Some(&["USER"]),
            ))
            .await
            .unwrap();

        let mut events = manager.events().subscribe();
        manager.logout().await.unwrap();

        assert!(store.load().await.is_none());
        match events.recv().await.unwrap() {
            AppEvent::AuthChanged(snapshot) => assert!(!snapshot.authenticated),
            other => panic!("Expected AuthChanged, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn stale_refresh_rounds_retire_quietly() {
        let server = MockServer::start().await;
        let (manager, store) = manager_for(&server).await;
        store
            .save(&stored_session(
                Some(AuthTokens::new("T1".to_string(), "R1".to_string(), 3600)),
                None,
            ))
            .await
            .unwrap();

        let epoch = manager.current_epoch();
        manager.bump_epoch();

        // Started under an older epoch: retires without touching the network
        let next = manager.refresh_once(epoch).await.unwrap();
        assert!(next.is_none());
    }
}
