// Remote data source - generic HTTP client against a real dashboard backend
use crate::application::data_source::DashboardDataSource;
use crate::application::errors::DataError;
use crate::application::store::KeyValueStore;
use crate::domain::activity::ActivityItem;
use crate::domain::collection::Versioned;
use crate::domain::device::HardwareDevice;
use crate::domain::kpi::Kpis;
use crate::domain::notification::NotificationItem;
use crate::domain::order::{Order, Transaction};
use crate::domain::range::{ActivityQuery, DeviceFilter, TimeRange};
use crate::infrastructure::config::{prepare_query, RemoteSettings};
use crate::infrastructure::http_response::ApiEnvelope;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct WriteAck {
    version: u64,
}

#[derive(Debug, Serialize)]
struct MarkReadBody {
    ids: Option<Vec<String>>,
}

pub struct RemoteDataSource {
    client: reqwest::Client,
    settings: RemoteSettings,
    store: Arc<dyn KeyValueStore>,
}

impl RemoteDataSource {
    pub fn new(settings: RemoteSettings, store: Arc<dyn KeyValueStore>) -> Result<Self, DataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| DataError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            settings: RemoteSettings {
                base_url: settings.base_url.trim_end_matches('/').to_string(),
                ..settings
            },
            store,
        })
    }

    /// Fill an endpoint template. Query pairs whose placeholder has no value
    /// are left out rather than sent empty.
    fn build_url(&self, template: &str, params: &[(&str, Option<String>)]) -> String {
        let vars: HashMap<String, String> = params
            .iter()
            .filter_map(|(name, value)| {
                value
                    .as_deref()
                    .map(|v| (name.to_string(), urlencoding::encode(v).into_owned()))
            })
            .collect();

        let (path, query) = template.split_once('?').unwrap_or((template, ""));
        let pairs: Vec<String> = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| prepare_query(pair, &vars))
            .filter(|pair| !pair.contains("${"))
            .collect();

        let mut url = format!("{}{}", self.settings.base_url, prepare_query(path, &vars));
        if !pairs.is_empty() {
            url.push('?');
            url.push_str(&pairs.join("&"));
        }
        url
    }

    /// Endpoint template without its query string, for writes
    fn build_write_url(&self, template: &str) -> String {
        let path = template.split('?').next().unwrap_or(template);
        format!("{}{}", self.settings.base_url, path)
    }

    /// Bearer token from the store; absent or empty means anonymous
    async fn bearer_token(&self) -> Result<Option<String>, DataError> {
        let Some(bytes) = self.store.get(&self.settings.token_key).await? else {
            return Ok(None);
        };

        let raw = String::from_utf8_lossy(&bytes);
        let token = raw.trim().trim_matches('"');
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, DataError> {
        let request = match self.bearer_token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DataError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Backend answered 401 for {}", response.url());
            return Err(DataError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope = response.json::<ApiEnvelope<T>>().await?;
        if !envelope.ok {
            return Err(DataError::Backend(
                envelope.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        envelope
            .data
            .ok_or_else(|| DataError::decode("response envelope", "missing data"))
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T, DataError> {
        tracing::debug!("GET {}", url);
        self.execute(self.client.get(url)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, DataError> {
        tracing::debug!("POST {}", url);
        self.execute(self.client.post(url).json(body)).await
    }
}

fn range_params(range: TimeRange) -> [(&'static str, Option<String>); 2] {
    [
        ("from", range.from.map(|v| v.to_string())),
        ("to", range.to.map(|v| v.to_string())),
    ]
}

#[async_trait]
impl DashboardDataSource for RemoteDataSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn kpis(&self, range: TimeRange) -> Result<Kpis, DataError> {
        let url = self.build_url(&self.settings.endpoints.kpis, &range_params(range));
        self.get(url).await
    }

    async fn activity(&self, query: ActivityQuery) -> Result<Versioned<ActivityItem>, DataError> {
        let url = self.build_url(
            &self.settings.endpoints.activity,
            &[
                ("limit", query.limit.map(|l| l.to_string())),
                ("kind", query.kind.map(|k| k.as_str().to_string())),
            ],
        );
        self.get(url).await
    }

    async fn notifications(&self) -> Result<Versioned<NotificationItem>, DataError> {
        let url = self.build_url(&self.settings.endpoints.notifications, &[]);
        self.get(url).await
    }

    async fn devices(&self, filter: DeviceFilter) -> Result<Vec<HardwareDevice>, DataError> {
        let url = self.build_url(
            &self.settings.endpoints.devices,
            &[("status", filter.status.map(|s| s.as_str().to_string()))],
        );
        self.get(url).await
    }

    async fn orders(&self) -> Result<Versioned<Order>, DataError> {
        let url = self.build_url(&self.settings.endpoints.orders, &[]);
        self.get(url).await
    }

    async fn transactions(&self, range: TimeRange) -> Result<Vec<Transaction>, DataError> {
        let url = self.build_url(&self.settings.endpoints.transactions, &range_params(range));
        self.get(url).await
    }

    async fn record_activity(&self, item: ActivityItem) -> Result<u64, DataError> {
        let url = self.build_write_url(&self.settings.endpoints.activity);
        let ack: WriteAck = self.post(url, &item).await?;
        Ok(ack.version)
    }

    async fn record_order(&self, order: Order) -> Result<u64, DataError> {
        let url = self.build_write_url(&self.settings.endpoints.orders);
        let ack: WriteAck = self.post(url, &order).await?;
        Ok(ack.version)
    }

    async fn mark_notifications_read(&self, ids: Option<Vec<String>>) -> Result<u64, DataError> {
        let url = self.build_write_url(&self.settings.endpoints.notifications_read);
        let ack: WriteAck = self.post(url, &MarkReadBody { ids }).await?;
        Ok(ack.version)
    }
}
