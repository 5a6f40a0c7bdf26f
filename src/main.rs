// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::dashboard_view::{DashboardView, ViewSettings};
use crate::application::data_source::DashboardDataSource;
use crate::application::seeder::Seeder;
use crate::application::store::KeyValueStore;
use crate::application::streaming_service::StreamingDashboardService;
use crate::infrastructure::config::{load_config, AppConfig, DataMode, StorageBackend};
use crate::infrastructure::file_store::FileStore;
use crate::infrastructure::memory_store::MemoryStore;
use crate::infrastructure::mock_source::MockDataSource;
use crate::infrastructure::remote_source::RemoteDataSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_activity, get_devices, get_kpis, get_notifications, get_orders, get_overview,
    get_sparkline, get_transactions, health_check, post_activity, post_notifications_read,
    post_order, stream_overview,
};
use crate::presentation::live_handlers::{
    get_live, post_live_item, post_live_order, post_live_read_all, post_live_read_one,
    post_live_refresh, post_live_sync_menus,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_config()?;

    // Create store (infrastructure layer)
    let store: Arc<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Memory => match config.storage.quota_bytes {
            Some(quota) => Arc::new(MemoryStore::with_quota(quota)),
            None => Arc::new(MemoryStore::new()),
        },
        StorageBackend::File => Arc::new(FileStore::open(&config.storage.path).await?),
    };

    // Pick the backend once; nothing downstream knows which one it got
    let source = build_source(&config, store).await?;
    tracing::info!("Using {} data source", source.name());

    // Create services (application layer)
    let dashboard_service = DashboardService::new(source.clone());
    let streaming_service = StreamingDashboardService::new(source.clone());
    let live = DashboardView::mount(source.clone(), ViewSettings::from(&config.dashboard));

    // Create application state
    let state = Arc::new(AppState {
        source,
        dashboard_service,
        streaming_service,
        live: live.view().clone(),
    });

    // Build router (presentation layer)
    let router = build_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting backoffice-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    live.unmount();
    Ok(())
}

async fn build_source(
    config: &AppConfig,
    store: Arc<dyn KeyValueStore>,
) -> anyhow::Result<Arc<dyn DashboardDataSource>> {
    let source: Arc<dyn DashboardDataSource> = match config.data.mode {
        DataMode::Mock => {
            let seeder = Arc::new(Seeder::new(store.clone()));
            // Seeding is best-effort; reads reseed missing keys on demand.
            if let Err(e) = seeder.seed_all().await {
                tracing::warn!("Seeding failed, continuing without baseline data: {}", e);
            }
            Arc::new(MockDataSource::new(store, seeder, config.data.delay()))
        }
        DataMode::Remote => Arc::new(RemoteDataSource::new(config.remote.clone(), store)?),
    };
    Ok(source)
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/kpis", get(get_kpis))
        .route("/api/kpis/:key/sparkline", get(get_sparkline))
        .route("/api/activity", get(get_activity).post(post_activity))
        .route("/api/notifications", get(get_notifications))
        .route("/api/notifications/read", post(post_notifications_read))
        .route("/api/devices", get(get_devices))
        .route("/api/orders", get(get_orders).post(post_order))
        .route("/api/transactions", get(get_transactions))
        .route("/dashboards/overview", get(get_overview))
        .route("/dashboards/overview/stream", get(stream_overview))
        .route("/live", get(get_live))
        .route("/live/refresh", post(post_live_refresh))
        .route("/live/orders", post(post_live_order))
        .route("/live/items", post(post_live_item))
        .route("/live/menus/sync", post(post_live_sync_menus))
        .route("/live/notifications/read", post(post_live_read_all))
        .route("/live/notifications/:id/read", post(post_live_read_one))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
