use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use bw_auth::{roles, Session};

/// Paths reachable with no session at all (exact match)
pub const PUBLIC_EXACT: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/about",
    "/authenticate",
    "/payment/result",
];

/// Path prefixes reachable with no session
pub const PUBLIC_PREFIXES: &[&str] = &["/books", "/authors", "/categories", "/search"];

/// Namespace reserved for the back office
pub const ADMIN_PREFIX: &str = "/admin";

/// Where unauthorized visitors are sent
pub const LOGIN_ROUTE: &str = "/login";

/// Storefront landing page; also where signed-in non-admins are sent when
/// they hit the back office
pub const HOME_ROUTE: &str = "/";

/// Back-office landing page
pub const ADMIN_HOME_ROUTE: &str = "/admin";

/// Access class of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Authenticated,
    Admin,
}

/// Verdict for one navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin,
    RedirectToHome,
}

/// Classify a path. The public allow-list wins over the admin namespace;
/// anything unlisted requires a session.
pub fn classify(path: &str) -> RouteClass {
    if PUBLIC_EXACT.contains(&path)
        || PUBLIC_PREFIXES
            .iter()
            .any(|prefix| path.starts_with(prefix))
    {
        return RouteClass::Public;
    }

    if path == ADMIN_PREFIX || path.starts_with("/admin/") {
        return RouteClass::Admin;
    }

    RouteClass::Authenticated
}

/// Decide access for `path` against the current session
///
/// Admin paths fail closed: a token without a hydrated profile is sent back
/// to login even if the token itself might still be valid, because role
/// membership cannot be established. Membership always comes from the
/// canonical role check, not the cached flag.
pub fn decide(path: &str, session: &Session) -> RouteDecision {
    match classify(path) {
        RouteClass::Public => RouteDecision::Allow,
        RouteClass::Authenticated => {
            if session.is_authenticated() {
                RouteDecision::Allow
            } else {
                RouteDecision::RedirectToLogin
            }
        }
        RouteClass::Admin => {
            if !session.is_authenticated() {
                return RouteDecision::RedirectToLogin;
            }

            match session.profile() {
                None => RouteDecision::RedirectToLogin,
                Some(profile) => {
                    if roles::is_admin(&profile.roles) {
                        RouteDecision::Allow
                    } else {
                        RouteDecision::RedirectToHome
                    }
                }
            }
        }
    }
}

/// Token identifying one navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationId(u64);

/// Collapses racing access checks onto one decision per navigation
///
/// Mount, path-change and auth-changed triggers tend to arrive together and
/// would each try to redirect. Every navigation gets a monotonically
/// increasing generation: the first evaluation of a generation wins, repeats
/// are dropped, and a decision computed for a superseded generation is
/// discarded instead of firing a late redirect. A deliberate re-check (after
/// an auth change, say) begins a new navigation for the same path.
#[derive(Debug, Default)]
pub struct Navigator {
    current: AtomicU64,
    evaluated: AtomicU64,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new navigation, superseding any still in flight
    pub fn begin(&self) -> NavigationId {
        NavigationId(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `nav` is still the latest navigation
    pub fn is_current(&self, nav: NavigationId) -> bool {
        self.current.load(Ordering::SeqCst) == nav.0
    }

    /// Evaluate access for one navigation
    ///
    /// Returns `None` when the navigation has been superseded or this
    /// generation already produced a decision.
    pub fn evaluate(
        &self,
        nav: NavigationId,
        path: &str,
        session: &Session,
    ) -> Option<RouteDecision> {
        if !self.is_current(nav) {
            debug!("Dropping access check for superseded navigation {:?}", nav);
            return None;
        }

        if self.evaluated.swap(nav.0, Ordering::SeqCst) == nav.0 {
            debug!("Navigation {:?} already evaluated", nav);
            return None;
        }

        Some(decide(path, session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bw_auth::{AuthTokens, Role, Session, UserProfile};

    fn session_with_roles(names: &[&str]) -> Session {
        let mut session = Session::from_tokens(AuthTokens::new(
            "access".to_string(),
            "refresh".to_string(),
            3600,
        ));
        session.set_profile(UserProfile {
            id: "u1".to_string(),
            username: "lan".to_string(),
            email: None,
            first_name: None,
            last_name: None,
            avatar: None,
            roles: names
                .iter()
                .map(|name| Role {
                    name: (*name).to_string(),
                    description: None,
                    permissions: vec![],
                })
                .collect(),
        });
        session
    }

    fn token_only_session() -> Session {
        Session::from_tokens(AuthTokens::new(
            "access".to_string(),
            "refresh".to_string(),
            3600,
        ))
    }

    #[test]
    fn public_paths_never_redirect() {
        let sessions = [
            Session::default(),
            token_only_session(),
            session_with_roles(&["ADMIN"]),
        ];

        for path in ["/", "/login", "/books/12", "/authors", "/search"] {
            for session in &sessions {
                assert_eq!(
                    decide(path, session),
                    RouteDecision::Allow,
                    "path {} must stay public",
                    path
                );
            }
        }
    }

    #[test]
    fn account_paths_require_a_token() {
        assert_eq!(
            decide("/profile", &Session::default()),
            RouteDecision::RedirectToLogin
        );
        assert_eq!(
            decide("/profile", &token_only_session()),
            RouteDecision::Allow
        );
        assert_eq!(decide("/cart", &Session::default()), RouteDecision::RedirectToLogin);
    }

    #[test]
    fn admin_paths_redirect_anonymous_visitors_to_login() {
        for path in ["/admin", "/admin/books", "/admin/users/3"] {
            assert_eq!(
                decide(path, &Session::default()),
                RouteDecision::RedirectToLogin
            );
        }
    }

    #[test]
    fn admin_paths_fail_closed_without_a_profile() {
        // Token present but the profile never hydrated: membership is
        // unknowable, so back to login.
        assert_eq!(
            decide("/admin/books", &token_only_session()),
            RouteDecision::RedirectToLogin
        );
    }

    #[test]
    fn admin_paths_send_non_admins_home() {
        assert_eq!(
            decide("/admin/slides", &session_with_roles(&["USER", "SELLER"])),
            RouteDecision::RedirectToHome
        );
    }

    #[test]
    fn admin_membership_is_case_insensitive() {
        assert_eq!(
            decide("/admin", &session_with_roles(&["admin"])),
            RouteDecision::Allow
        );
    }

    #[test]
    fn admin_namespace_does_not_swallow_lookalike_paths() {
        assert_eq!(classify("/administrator-guide"), RouteClass::Authenticated);
        assert_eq!(classify("/admin"), RouteClass::Admin);
        assert_eq!(classify("/admin/authors"), RouteClass::Admin);
    }

    #[test]
    fn navigator_collapses_duplicate_triggers() {
        let navigator = Navigator::new();
        let session = Session::default();

        let nav = navigator.begin();
        assert_eq!(
            navigator.evaluate(nav, "/profile", &session),
            Some(RouteDecision::RedirectToLogin)
        );
        // Mount and broadcast arriving right after the path change are dropped
        assert_eq!(navigator.evaluate(nav, "/profile", &session), None);
    }

    #[test]
    fn navigator_discards_superseded_navigations() {
        let navigator = Navigator::new();
        let session = Session::default();

        let stale = navigator.begin();
        let fresh = navigator.begin();

        assert_eq!(navigator.evaluate(stale, "/profile", &session), None);
        assert_eq!(
            navigator.evaluate(fresh, "/books", &session),
            Some(RouteDecision::Allow)
        );
    }

    #[test]
    fn deliberate_recheck_gets_a_new_generation() {
        let navigator = Navigator::new();

        let nav = navigator.begin();
        assert!(navigator
            .evaluate(nav, "/admin", &Session::default())
            .is_some());

        // Auth changed; the app re-runs the check as a fresh navigation.
        let recheck = navigator.begin();
        assert_eq!(
            navigator.evaluate(recheck, "/admin", &session_with_roles(&["ADMIN"])),
            Some(RouteDecision::Allow)
        );
    }
}
