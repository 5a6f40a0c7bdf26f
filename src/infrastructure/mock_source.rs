// Mock data source - serves seeded records from the key-value store after a simulated delay
use crate::application::data_source::DashboardDataSource;
use crate::application::errors::DataError;
use crate::application::seeder::Seeder;
use crate::application::store::{
    KeyValueStore, ACTIVITY_KEY, DEVICES_KEY, KPIS_KEY, NOTIFICATIONS_KEY, ORDERS_KEY,
    TRANSACTIONS_KEY,
};
use crate::domain::activity::ActivityItem;
use crate::domain::collection::Versioned;
use crate::domain::device::HardwareDevice;
use crate::domain::kpi::Kpis;
use crate::domain::notification::NotificationItem;
use crate::domain::order::{Order, Transaction};
use crate::domain::range::{ActivityQuery, DeviceFilter, TimeRange};
use crate::domain::series::is_ascending;
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub struct MockDataSource {
    store: Arc<dyn KeyValueStore>,
    seeder: Arc<Seeder>,
    delay: Duration,
    // Serializes read-modify-write cycles issued through this source.
    write_lock: Mutex<()>,
}

impl MockDataSource {
    pub fn new(store: Arc<dyn KeyValueStore>, seeder: Arc<Seeder>, delay: Duration) -> Self {
        Self {
            store,
            seeder,
            delay,
            write_lock: Mutex::new(()),
        }
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Read and parse a key. A missing or malformed value is reseeded first.
    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T, DataError> {
        if let Some(bytes) = self.store.get(key).await? {
            match serde_json::from_slice(&bytes) {
                Ok(value) => return Ok(value),
                Err(e) => tracing::warn!("Discarding malformed {}: {}", key, e),
            }
        }

        let bytes = self.seeder.seed_key(key).await?;
        serde_json::from_slice(&bytes).map_err(|e| DataError::decode(key, e))
    }

    async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DataError> {
        let bytes = serde_json::to_vec(value).map_err(|e| DataError::encode(key, e))?;
        self.store.set(key, Bytes::from(bytes)).await?;
        Ok(())
    }

    async fn update<T, F>(&self, key: &str, apply: F) -> Result<u64, DataError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Versioned<T>),
    {
        let _guard = self.write_lock.lock().await;
        let mut collection: Versioned<T> = self.load(key).await?;
        apply(&mut collection);
        self.save(key, &collection).await?;
        Ok(collection.version)
    }
}

#[async_trait]
impl DashboardDataSource for MockDataSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn kpis(&self, range: TimeRange) -> Result<Kpis, DataError> {
        self.simulate_latency().await;
        let mut kpis: Kpis = self.load(KPIS_KEY).await?;

        if !range.is_open() {
            for metric in kpis.metrics_mut() {
                metric.series.retain(|p| range.contains(p.t));
            }
        }
        debug_assert!(kpis.metrics().iter().all(|m| is_ascending(&m.series)));

        Ok(kpis)
    }

    async fn activity(&self, query: ActivityQuery) -> Result<Versioned<ActivityItem>, DataError> {
        self.simulate_latency().await;
        let mut feed: Versioned<ActivityItem> = self.load(ACTIVITY_KEY).await?;

        if let Some(kind) = query.kind {
            feed.items.retain(|item| item.kind == kind);
        }
        if let Some(limit) = query.limit {
            feed.items.truncate(limit);
        }

        Ok(feed)
    }

    async fn notifications(&self) -> Result<Versioned<NotificationItem>, DataError> {
        self.simulate_latency().await;
        self.load(NOTIFICATIONS_KEY).await
    }

    async fn devices(&self, filter: DeviceFilter) -> Result<Vec<HardwareDevice>, DataError> {
        self.simulate_latency().await;
        let mut devices: Vec<HardwareDevice> = self.load(DEVICES_KEY).await?;

        if let Some(status) = filter.status {
            devices.retain(|d| d.status == status);
        }

        Ok(devices)
    }

    async fn orders(&self) -> Result<Versioned<Order>, DataError> {
        self.simulate_latency().await;
        self.load(ORDERS_KEY).await
    }

    async fn transactions(&self, range: TimeRange) -> Result<Vec<Transaction>, DataError> {
        self.simulate_latency().await;
        let mut transactions: Vec<Transaction> = self.load(TRANSACTIONS_KEY).await?;
        transactions.retain(|t| range.contains(t.ts.timestamp_millis()));
        Ok(transactions)
    }

    async fn record_activity(&self, item: ActivityItem) -> Result<u64, DataError> {
        self.simulate_latency().await;
        tracing::debug!("Recording activity {}", item.id);
        self.update(ACTIVITY_KEY, |feed: &mut Versioned<ActivityItem>| {
            feed.prepend(item);
        })
        .await
    }

    async fn record_order(&self, order: Order) -> Result<u64, DataError> {
        self.simulate_latency().await;
        tracing::debug!("Recording order {}", order.id);
        self.update(ORDERS_KEY, |orders: &mut Versioned<Order>| {
            orders.prepend(order);
        })
        .await
    }

    async fn mark_notifications_read(&self, ids: Option<Vec<String>>) -> Result<u64, DataError> {
        self.simulate_latency().await;
        self.update(NOTIFICATIONS_KEY, |notifications: &mut Versioned<NotificationItem>| {
            for item in notifications.items.iter_mut() {
                if ids.as_ref().is_none_or(|ids| ids.contains(&item.id)) {
                    item.read = true;
                }
            }
            notifications.version += 1;
        })
        .await
    }
}
