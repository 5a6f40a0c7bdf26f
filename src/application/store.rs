// Key-value store trait - the persistent storage the dashboards read and write
use crate::application::errors::StoreError;
use async_trait::async_trait;
use bytes::Bytes;

pub const KPIS_KEY: &str = "dash.kpis";
pub const ACTIVITY_KEY: &str = "dash.activity";
pub const NOTIFICATIONS_KEY: &str = "dash.notifications";
pub const DEVICES_KEY: &str = "dash.devices";
pub const ORDERS_KEY: &str = "dash.orders";
pub const TRANSACTIONS_KEY: &str = "dash.transactions";

/// Every key the seeder owns, in seeding order
pub const SEEDED_KEYS: [&str; 6] = [
    KPIS_KEY,
    ACTIVITY_KEY,
    NOTIFICATIONS_KEY,
    DEVICES_KEY,
    ORDERS_KEY,
    TRANSACTIONS_KEY,
];

/// String-keyed blob storage shared by every session of one profile.
///
/// There is no locking across writers; the last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    async fn set(&self, key: &str, value: Bytes) -> Result<(), StoreError>;
}
