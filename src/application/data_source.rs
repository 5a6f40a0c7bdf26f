// Data source trait - the accessor the dashboards fetch through
use crate::application::errors::DataError;
use crate::domain::activity::ActivityItem;
use crate::domain::collection::Versioned;
use crate::domain::device::HardwareDevice;
use crate::domain::kpi::Kpis;
use crate::domain::notification::NotificationItem;
use crate::domain::order::{Order, Transaction};
use crate::domain::range::{ActivityQuery, DeviceFilter, TimeRange};
use async_trait::async_trait;

/// One backend strategy. The mock and remote implementations are picked once
/// at startup and look identical to callers.
#[async_trait]
pub trait DashboardDataSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn kpis(&self, range: TimeRange) -> Result<Kpis, DataError>;

    async fn activity(&self, query: ActivityQuery) -> Result<Versioned<ActivityItem>, DataError>;

    async fn notifications(&self) -> Result<Versioned<NotificationItem>, DataError>;

    async fn devices(&self, filter: DeviceFilter) -> Result<Vec<HardwareDevice>, DataError>;

    async fn orders(&self) -> Result<Versioned<Order>, DataError>;

    async fn transactions(&self, range: TimeRange) -> Result<Vec<Transaction>, DataError>;

    /// Prepend an activity item, returning the feed's new version
    async fn record_activity(&self, item: ActivityItem) -> Result<u64, DataError>;

    /// Prepend an order, returning the orders collection's new version
    async fn record_order(&self, order: Order) -> Result<u64, DataError>;

    /// Mark the given notifications read, or all of them when `ids` is `None`
    async fn mark_notifications_read(&self, ids: Option<Vec<String>>) -> Result<u64, DataError>;
}
