// HTTP request handlers for the data API and the overview dashboard
use crate::domain::activity::{ActivityItem, ActivityKind};
use crate::domain::device::DeviceStatus;
use crate::domain::kpi::KpiKey;
use crate::domain::order::{NewOrder, Order};
use crate::domain::range::{ActivityQuery, DeviceFilter, TimeRange};
use crate::domain::sparkline::sparkline_points;
use crate::infrastructure::chunked_stream::stream_from_receiver;
use crate::infrastructure::http_response::{
    accepts_brotli, envelope_response, json_response, ApiEnvelope,
};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static SERVER_ID_SEQ: AtomicU64 = AtomicU64::new(0);

fn server_id(prefix: &str) -> String {
    let seq = SERVER_ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-s{}", prefix, Utc::now().timestamp_millis(), seq)
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl From<RangeQuery> for TimeRange {
    fn from(query: RangeQuery) -> Self {
        TimeRange::new(query.from, query.to)
    }
}

#[derive(Debug, Deserialize)]
pub struct SparklineQuery {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
    pub limit: Option<usize>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceParams {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    #[serde(default)]
    pub meta: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct WriteResult {
    pub id: Option<String>,
    pub version: u64,
}

#[derive(Debug, Serialize)]
pub struct Sparkline {
    pub key: KpiKey,
    pub points: String,
}

pub(crate) async fn bad_request(message: String, compress: bool) -> Response {
    match json_response(&ApiEnvelope::<()>::failure(message), StatusCode::BAD_REQUEST, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_kpis(
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let result = state.source.kpis(query.into()).await;
    envelope_response(result, accepts_brotli(&headers)).await
}

pub async fn get_sparkline(
    Path(key): Path<String>,
    Query(query): Query<SparklineQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let Some(key) = KpiKey::parse(&key) else {
        return bad_request(format!("unknown KPI: {}", key), compress).await;
    };

    let width = query.width.unwrap_or(120.0);
    let height = query.height.unwrap_or(32.0);
    let result = state
        .source
        .kpis(TimeRange::new(query.from, query.to))
        .await
        .map(|kpis| Sparkline {
            key,
            points: sparkline_points(&kpis.get(key).series, width, height, 2.0),
        });

    envelope_response(result, compress).await
}

pub async fn get_activity(
    Query(params): Query<ActivityParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let kind = match params.kind.as_deref().filter(|k| !k.is_empty()) {
        Some(raw) => match ActivityKind::parse(raw) {
            Some(kind) => Some(kind),
            None => return bad_request(format!("unknown activity type: {}", raw), compress).await,
        },
        None => None,
    };

    let query = ActivityQuery {
        limit: params.limit,
        kind,
    };
    envelope_response(state.source.activity(query).await, compress).await
}

pub async fn post_activity(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewActivity>,
) -> Response {
    let item = ActivityItem::new(server_id("act"), input.kind, input.title, input.meta, Utc::now());
    let id = item.id.clone();

    let result = state
        .source
        .record_activity(item)
        .await
        .map(|version| WriteResult {
            id: Some(id),
            version,
        });
    envelope_response(result, accepts_brotli(&headers)).await
}

pub async fn get_notifications(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    envelope_response(state.source.notifications().await, accepts_brotli(&headers)).await
}

pub async fn post_notifications_read(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<MarkReadRequest>,
) -> Response {
    let result = state
        .source
        .mark_notifications_read(request.ids)
        .await
        .map(|version| WriteResult { id: None, version });
    envelope_response(result, accepts_brotli(&headers)).await
}

pub async fn get_devices(
    Query(params): Query<DeviceParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match DeviceStatus::parse(raw) {
            Some(status) => Some(status),
            None => return bad_request(format!("unknown device status: {}", raw), compress).await,
        },
        None => None,
    };

    envelope_response(state.source.devices(DeviceFilter { status }).await, compress).await
}

pub async fn get_orders(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    envelope_response(state.source.orders().await, accepts_brotli(&headers)).await
}

pub async fn post_order(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewOrder>,
) -> Response {
    let order = Order::from_input(server_id("ord"), input, Utc::now());
    let id = order.id.clone();

    let result = state
        .source
        .record_order(order)
        .await
        .map(|version| WriteResult {
            id: Some(id),
            version,
        });
    envelope_response(result, accepts_brotli(&headers)).await
}

pub async fn get_transactions(
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let result = state.source.transactions(query.into()).await;
    envelope_response(result, accepts_brotli(&headers)).await
}

/// Every panel at once, after the slowest one resolves
pub async fn get_overview(
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let snapshot = state.dashboard_service.snapshot(query.into()).await;
    match json_response(&snapshot, StatusCode::OK, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stream the overview dashboard (progressive loading)
pub async fn stream_overview(
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    let rx = state.streaming_service.stream_dashboard(query.into()).await;
    stream_from_receiver(rx, compress).await
}
