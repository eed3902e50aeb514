use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use bw_auth::{AuthClient, AuthConfig, FileSessionStore};
use bw_core::{AppConfig, AppEvent, EventBus, Navigator, NotificationCenter, SessionManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()
        .await
        .context("Failed to load application config")?;

    let auth_config =
        AuthConfig::parse(&config.api_base_url).context("Invalid backend API base URL")?;

    let storage_dir =
        FileSessionStore::default_storage_dir().context("No usable config directory")?;
    let store = FileSessionStore::new(&storage_dir)
        .await
        .context("Failed to open the session store")?;

    let bus = EventBus::new();
    let notifications = NotificationCenter::new();
    let manager = SessionManager::new(
        Arc::new(store),
        AuthClient::new(auth_config)?,
        bus.clone(),
        notifications.clone(),
    );

    spawn_event_logger(&bus, &notifications);

    // Hydrate whatever the last run left behind and start the refresh
    // schedule; renders anonymous when there is nothing to restore.
    manager.bootstrap().await;

    let session = manager.session().await;
    let navigator = Navigator::new();
    let nav = navigator.begin();
    if let Some(decision) = navigator.evaluate(nav, &config.landing_route, &session) {
        info!(
            route = %config.landing_route,
            ?decision,
            "Landing route evaluated"
        );
    }

    info!("bookswap shell running; press Ctrl-C to exit");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down");

    Ok(())
}

/// Mirror bus traffic into the log; stands in for the UI listeners
fn spawn_event_logger(bus: &EventBus, notifications: &NotificationCenter) {
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                AppEvent::AuthChanged(snapshot) => info!(
                    authenticated = snapshot.authenticated,
                    is_admin = snapshot.is_admin,
                    username = snapshot.username.as_deref().unwrap_or("<anonymous>"),
                    "Auth state changed"
                ),
                AppEvent::CartUpdated { item_count } => {
                    info!(item_count, "Cart updated");
                }
            }
        }
    });

    let mut toasts = notifications.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = toasts.recv().await {
            match event {
                bw_core::NotificationEvent::Posted(toast) => {
                    info!(kind = ?toast.kind, "Toast: {}", toast.message);
                }
                bw_core::NotificationEvent::Dismissed(id) => {
                    info!("Toast {} dismissed", id);
                }
            }
        }
    });
}
