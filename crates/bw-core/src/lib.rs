//! Application runtime for the bookswap storefront
//!
//! Everything here runs client-side around the backend API: the session
//! manager (startup hydration, sign-in flows, proactive token refresh), route
//! access control, the typed event bus the components listen on, the toast
//! notification center, and the small pieces of screen state (cart,
//! pagination) that carry real rules.
//!
//! The crate is wiring-agnostic: the application root constructs one
//! [`SessionManager`] with its store and channels injected, hands clones to
//! whatever renders the UI, and tears the session down through
//! [`SessionManager::logout`].

pub mod app_config;
pub mod cart;
pub mod events;
pub mod manager;
pub mod notify;
pub mod pager;
pub mod routes;

pub use app_config::AppConfig;
pub use cart::{Cart, CartLine};
pub use events::{AppEvent, AuthSnapshot, EventBus};
pub use manager::{SessionManager, SignInOutcome};
pub use notify::{
    Notification, NotificationCenter, NotificationEvent, NotificationKind, AUTO_DISMISS,
};
pub use pager::Pager;
pub use routes::{
    classify, decide, NavigationId, Navigator, RouteClass, RouteDecision, ADMIN_HOME_ROUTE,
    HOME_ROUTE, LOGIN_ROUTE,
};
