// HTTP handlers for the server-side live dashboard and its optimistic actions
use crate::application::dashboard_view::ViewState;
use crate::domain::order::NewOrder;
use crate::infrastructure::http_response::{accepts_brotli, json_response, ApiEnvelope};
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::bad_request;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub price: f64,
}

/// Live state plus the skeleton placeholders a client should still render
#[derive(Debug, Serialize)]
pub struct LiveView {
    pub placeholders: usize,
    #[serde(flatten)]
    pub state: ViewState,
}

impl From<ViewState> for LiveView {
    fn from(state: ViewState) -> Self {
        Self {
            placeholders: state.placeholders(),
            state,
        }
    }
}

async fn ok<T: Serialize>(data: T, headers: &HeaderMap) -> Response {
    match json_response(&ApiEnvelope::success(data), StatusCode::OK, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Current in-memory state of the live dashboard
pub async fn get_live(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    ok(LiveView::from(state.live.state().await), &headers).await
}

pub async fn post_live_refresh(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    state.live.refresh().await;
    ok(LiveView::from(state.live.state().await), &headers).await
}

pub async fn post_live_order(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewOrder>,
) -> Response {
    ok(state.live.create_order(input).await, &headers).await
}

pub async fn post_live_item(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewItem>,
) -> Response {
    if input.name.trim().is_empty() {
        return bad_request("item name must not be empty".to_string(), accepts_brotli(&headers)).await;
    }
    ok(state.live.add_item(input.name.trim(), input.price).await, &headers).await
}

pub async fn post_live_sync_menus(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    ok(state.live.sync_menus().await, &headers).await
}

pub async fn post_live_read_all(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    state.live.mark_all_notifications_read().await;
    ok(state.live.unread_count().await, &headers).await
}

pub async fn post_live_read_one(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    state.live.mark_notification_read(&id).await;
    ok(state.live.unread_count().await, &headers).await
}
