// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::dashboard_view::DashboardView;
use crate::application::data_source::DashboardDataSource;
use crate::application::streaming_service::StreamingDashboardService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn DashboardDataSource>,
    pub dashboard_service: DashboardService,
    pub streaming_service: StreamingDashboardService,
    /// Server-side live dashboard, polled on the configured interval
    pub live: DashboardView,
}
