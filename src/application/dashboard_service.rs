// Dashboard service - Use case for loading every panel of the overview dashboard
use crate::application::data_source::DashboardDataSource;
use crate::application::errors::DataError;
use crate::domain::dashboard::{DashboardSnapshot, PanelData, PanelId, PanelState};
use crate::domain::range::{ActivityQuery, DeviceFilter, TimeRange};
use std::sync::Arc;

/// Rows shown in the activity panel
pub const FEED_LIMIT: usize = 20;

/// Fetch one panel's data through the data source
pub async fn fetch_panel(
    source: &dyn DashboardDataSource,
    panel: PanelId,
    range: TimeRange,
) -> Result<PanelData, DataError> {
    match panel {
        PanelId::Kpis => source.kpis(range).await.map(PanelData::Kpis),
        PanelId::Activity => source
            .activity(ActivityQuery {
                limit: Some(FEED_LIMIT),
                kind: None,
            })
            .await
            .map(PanelData::Activity),
        PanelId::Orders => source.orders().await.map(PanelData::Orders),
        PanelId::Devices => source
            .devices(DeviceFilter::default())
            .await
            .map(PanelData::Devices),
        PanelId::Transactions => source.transactions(range).await.map(PanelData::Transactions),
    }
}

#[derive(Clone)]
pub struct DashboardService {
    source: Arc<dyn DashboardDataSource>,
}

impl DashboardService {
    pub fn new(source: Arc<dyn DashboardDataSource>) -> Self {
        Self { source }
    }

    /// Fetch every panel concurrently and wait for all of them.
    ///
    /// A failing panel is reported in its own state and never fails the snapshot.
    pub async fn snapshot(&self, range: TimeRange) -> DashboardSnapshot {
        let source = self.source.as_ref();
        let (kpis, activity, orders, devices, transactions) = tokio::join!(
            source.kpis(range),
            source.activity(ActivityQuery {
                limit: Some(FEED_LIMIT),
                kind: None,
            }),
            source.orders(),
            source.devices(DeviceFilter::default()),
            source.transactions(range),
        );

        let snapshot = DashboardSnapshot {
            kpis: PanelState::from_result(kpis),
            activity: PanelState::from_result(activity),
            orders: PanelState::from_result(orders),
            devices: PanelState::from_result(devices),
            transactions: PanelState::from_result(transactions),
        };

        tracing::debug!("Built dashboard snapshot from {} source", source.name());
        snapshot
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::activity::ActivityItem;
    use crate::domain::collection::Versioned;
    use crate::domain::device::HardwareDevice;
    use crate::domain::kpi::Kpis;
    use crate::domain::notification::NotificationItem;
    use crate::domain::order::{Order, Transaction};
    use crate::application::errors::StoreError;
    use crate::application::seeder::Seeder;
    use crate::infrastructure::memory_store::MemoryStore;
    use crate::infrastructure::mock_source::MockDataSource;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Wraps a real source, counts fetches, and can fail or stall chosen panels.
    pub(crate) struct ScriptedSource {
        pub store: Arc<MemoryStore>,
        pub inner: MockDataSource,
        pub fetches: AtomicUsize,
        pub failing: HashSet<PanelId>,
        pub stalled: HashSet<PanelId>,
        pub failing_writes: bool,
    }

    impl ScriptedSource {
        pub async fn seeded(delay: Duration) -> Self {
            let store = Arc::new(MemoryStore::new());
            let seeder = Arc::new(Seeder::with_rng_seed(store.clone(), 3));
            seeder.seed_all().await.unwrap();
            Self {
                inner: MockDataSource::new(store.clone(), seeder, delay),
                store,
                fetches: AtomicUsize::new(0),
                failing: HashSet::new(),
                stalled: HashSet::new(),
                failing_writes: false,
            }
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        async fn gate(&self, panel: PanelId) -> Result<(), DataError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.stalled.contains(&panel) {
                std::future::pending::<()>().await;
            }
            if self.failing.contains(&panel) {
                return Err(DataError::Transport("connection refused".to_string()));
            }
            Ok(())
        }

        fn write_gate(&self) -> Result<(), DataError> {
            if self.failing_writes {
                return Err(DataError::Store(StoreError::Unavailable("quota exceeded".to_string())));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DashboardDataSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn kpis(&self, range: TimeRange) -> Result<Kpis, DataError> {
            self.gate(PanelId::Kpis).await?;
            self.inner.kpis(range).await
        }

        async fn activity(&self, query: ActivityQuery) -> Result<Versioned<ActivityItem>, DataError> {
            self.gate(PanelId::Activity).await?;
            self.inner.activity(query).await
        }

        async fn notifications(&self) -> Result<Versioned<NotificationItem>, DataError> {
            self.inner.notifications().await
        }

        async fn devices(&self, filter: DeviceFilter) -> Result<Vec<HardwareDevice>, DataError> {
            self.gate(PanelId::Devices).await?;
            self.inner.devices(filter).await
        }

        async fn orders(&self) -> Result<Versioned<Order>, DataError> {
            self.gate(PanelId::Orders).await?;
            self.inner.orders().await
        }

        async fn transactions(&self, range: TimeRange) -> Result<Vec<Transaction>, DataError> {
            self.gate(PanelId::Transactions).await?;
            self.inner.transactions(range).await
        }

        async fn record_activity(&self, item: ActivityItem) -> Result<u64, DataError> {
            self.write_gate()?;
            self.inner.record_activity(item).await
        }

        async fn record_order(&self, order: Order) -> Result<u64, DataError> {
            self.write_gate()?;
            self.inner.record_order(order).await
        }

        async fn mark_notifications_read(&self, ids: Option<Vec<String>>) -> Result<u64, DataError> {
            self.write_gate()?;
            self.inner.mark_notifications_read(ids).await
        }
    }

    #[tokio::test]
    async fn test_snapshot_loads_every_panel() {
        let source = Arc::new(ScriptedSource::seeded(Duration::ZERO).await);
        let snapshot = DashboardService::new(source.clone()).snapshot(TimeRange::default()).await;

        assert!(snapshot.kpis.loaded().is_some());
        assert_eq!(snapshot.activity.loaded().map(|a| a.items.len()), Some(8));
        assert!(snapshot.orders.loaded().is_some());
        assert!(snapshot.devices.loaded().is_some());
        assert!(snapshot.transactions.loaded().is_some());
        assert_eq!(source.fetch_count(), 5);
    }

    #[tokio::test]
    async fn test_failed_panel_does_not_fail_snapshot() {
        let mut source = ScriptedSource::seeded(Duration::ZERO).await;
        source.failing.insert(PanelId::Devices);
        let snapshot = DashboardService::new(Arc::new(source)).snapshot(TimeRange::default()).await;

        assert!(matches!(snapshot.devices, PanelState::Errored(_)));
        assert!(snapshot.kpis.loaded().is_some());
    }

    #[tokio::test]
    async fn test_fetch_panel_maps_to_panel_data() {
        let source = ScriptedSource::seeded(Duration::ZERO).await;
        let data = fetch_panel(&source, PanelId::Kpis, TimeRange::default()).await.unwrap();
        assert!(matches!(data, PanelData::Kpis(_)));
    }
}
