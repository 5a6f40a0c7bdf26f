// Dashboard view - client-side state of a mounted dashboard
//
// Panels load independently, re-load on every poll tick, and user actions are
// applied to local state before the data source confirms them.
use crate::application::dashboard_service::fetch_panel;
use crate::application::data_source::DashboardDataSource;
use crate::application::errors::DataError;
use crate::domain::activity::{ActivityItem, ActivityKind};
use crate::domain::collection::{reconcile, Versioned, Watermark};
use crate::domain::dashboard::{PanelData, PanelId, PanelState};
use crate::domain::device::HardwareDevice;
use crate::domain::kpi::Kpis;
use crate::domain::notification::{unread_count, NotificationItem};
use crate::domain::order::{NewOrder, Order, Transaction};
use crate::domain::range::TimeRange;
use crate::infrastructure::config::DashboardSettings;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub range: TimeRange,
    pub poll_interval: Option<Duration>,
    pub toast_duration: Duration,
}

impl From<&DashboardSettings> for ViewSettings {
    fn from(settings: &DashboardSettings) -> Self {
        Self {
            range: TimeRange::default(),
            poll_interval: settings.poll_interval(),
            toast_duration: settings.toast_duration(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub id: u64,
    pub message: String,
}

/// What a dashboard renders. Collections survive reloads; `panels` tracks loading.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewState {
    pub panels: HashMap<PanelId, PanelState<()>>,
    pub kpis: Option<Kpis>,
    pub feed: Vec<ActivityItem>,
    pub orders: Vec<Order>,
    pub devices: Vec<HardwareDevice>,
    pub transactions: Vec<Transaction>,
    pub notifications: Vec<NotificationItem>,
    pub toast: Option<Toast>,
}

impl ViewState {
    pub fn panel(&self, panel: PanelId) -> &PanelState<()> {
        static IDLE: PanelState<()> = PanelState::Idle;
        self.panels.get(&panel).unwrap_or(&IDLE)
    }

    /// Skeleton placeholders currently on screen: four KPI cards while the
    /// KPI panel loads, plus one per other loading panel (8 right after mount)
    pub fn placeholders(&self) -> usize {
        PanelId::ALL
            .iter()
            .filter(|p| self.panel(**p).is_loading())
            .map(|p| p.placeholders())
            .sum()
    }
}

/// Newest collection states applied, and optimistic records not yet seen in a fetch
#[derive(Debug, Default)]
struct SyncState {
    feed: Watermark,
    orders: Watermark,
    notifications: Watermark,
    pending_feed: HashSet<String>,
    pending_orders: HashSet<String>,
    pending_read: HashSet<String>,
    read_all_pending: bool,
}

#[derive(Debug, Default)]
struct Inner {
    view: ViewState,
    sync: SyncState,
    toast_seq: u64,
}

struct Shared {
    source: Arc<dyn DashboardDataSource>,
    settings: ViewSettings,
    inner: Mutex<Inner>,
    shutdown: watch::Sender<bool>,
    id_seq: AtomicU64,
}

#[derive(Clone)]
pub struct DashboardView {
    shared: Arc<Shared>,
}

/// A dashboard on screen. Unmounting (or dropping) stops polling.
pub struct MountedView {
    view: DashboardView,
    poller: Option<JoinHandle<()>>,
}

impl DashboardView {
    pub fn mount(source: Arc<dyn DashboardDataSource>, settings: ViewSettings) -> MountedView {
        let (shutdown, _) = watch::channel(false);
        let mut inner = Inner::default();
        for panel in PanelId::ALL {
            inner.view.panels.insert(panel, PanelState::Loading);
        }

        let view = DashboardView {
            shared: Arc::new(Shared {
                source,
                settings,
                inner: Mutex::new(inner),
                shutdown,
                id_seq: AtomicU64::new(0),
            }),
        };

        view.spawn_fetches();
        let poller = view.shared.settings.poll_interval.map(|period| view.spawn_poller(period));

        MountedView { view, poller }
    }

    pub fn is_mounted(&self) -> bool {
        !*self.shared.shutdown.borrow()
    }

    pub async fn state(&self) -> ViewState {
        self.shared.inner.lock().await.view.clone()
    }

    pub async fn unread_count(&self) -> usize {
        unread_count(&self.shared.inner.lock().await.view.notifications)
    }

    /// Re-fetch every panel; previously loaded data stays until replaced
    pub async fn refresh(&self) {
        if self.is_mounted() {
            self.spawn_fetches();
        }
    }

    fn spawn_poller(&self, period: Duration) -> JoinHandle<()> {
        let view = self.clone();
        let mut shutdown = self.shared.shutdown.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; mount already fetched.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tracing::debug!("Poll tick, refreshing dashboard");
                        view.refresh().await;
                    }
                    _ = shutdown.changed() => break,
                }
            }
        })
    }

    fn spawn_fetches(&self) {
        for panel in PanelId::ALL {
            let view = self.clone();
            tokio::spawn(async move { view.load_panel(panel).await });
        }

        let view = self.clone();
        tokio::spawn(async move { view.load_notifications().await });
    }

    async fn load_panel(&self, panel: PanelId) {
        if !self.is_mounted() {
            return;
        }
        self.shared
            .inner
            .lock()
            .await
            .view
            .panels
            .insert(panel, PanelState::Loading);

        let range = self.shared.settings.range;
        let result = fetch_panel(self.shared.source.as_ref(), panel, range).await;

        if !self.is_mounted() {
            tracing::debug!("Dropping {:?} result for an unmounted view", panel);
            return;
        }

        let mut inner = self.shared.inner.lock().await;
        match result {
            Ok(data) => {
                inner.apply(data);
                inner.view.panels.insert(panel, PanelState::Loaded(()));
            }
            Err(e) => {
                tracing::warn!("Panel {:?} failed to load: {}", panel, e);
                inner.view.panels.insert(panel, PanelState::Errored(e.to_string()));
            }
        }
    }

    async fn load_notifications(&self) {
        if !self.is_mounted() {
            return;
        }
        let result = self.shared.source.notifications().await;
        if !self.is_mounted() {
            return;
        }

        match result {
            Ok(notifications) => self.shared.inner.lock().await.apply_notifications(notifications),
            Err(e) => tracing::warn!("Notifications failed to load: {}", e),
        }
    }

    fn client_id(&self, prefix: &str, now: DateTime<Utc>) -> String {
        let seq = self.shared.id_seq.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", prefix, now.timestamp_millis(), seq)
    }

    /// Create an order locally, put it and its feed entry at the head, then mirror both
    pub async fn create_order(&self, input: NewOrder) -> Order {
        let now = Utc::now();
        let order = Order::from_input(self.client_id("ord", now), input, now);
        let activity = ActivityItem::new(
            self.client_id("act", now),
            ActivityKind::Order,
            format!("New order {}", order.id),
            order.summary(),
            now,
        );

        {
            let mut inner = self.shared.inner.lock().await;
            inner.sync.pending_orders.insert(order.id.clone());
            inner.view.orders.insert(0, order.clone());
            inner.push_activity(activity.clone());
        }
        self.show_toast(format!("Order {} created", order.id)).await;

        let source = self.shared.source.clone();
        let mirrored = order.clone();
        self.mirror(
            "order",
            move || async move { source.record_order(mirrored).await },
            |sync, v| sync.orders.confirm(v),
        );
        self.mirror_activity(activity);

        order
    }

    pub async fn add_item(&self, name: &str, price: f64) -> ActivityItem {
        let now = Utc::now();
        let item = ActivityItem::new(
            self.client_id("act", now),
            ActivityKind::Item,
            "Item added",
            format!("{} · ${:.2}", name, price),
            now,
        );

        self.shared.inner.lock().await.push_activity(item.clone());
        self.show_toast(format!("{} added", name)).await;
        self.mirror_activity(item.clone());
        item
    }

    pub async fn sync_menus(&self) -> ActivityItem {
        let now = Utc::now();
        let item = ActivityItem::new(
            self.client_id("act", now),
            ActivityKind::Menu,
            "Menus synced",
            "All channels",
            now,
        );

        self.shared.inner.lock().await.push_activity(item.clone());
        self.show_toast("Menus synced").await;
        self.mirror_activity(item.clone());
        item
    }

    pub async fn mark_all_notifications_read(&self) {
        {
            let mut inner = self.shared.inner.lock().await;
            inner.sync.read_all_pending = true;
            for n in inner.view.notifications.iter_mut() {
                n.read = true;
            }
        }

        let source = self.shared.source.clone();
        self.mirror(
            "notifications",
            move || async move { source.mark_notifications_read(None).await },
            |sync, v| sync.notifications.confirm(v),
        );
    }

    pub async fn mark_notification_read(&self, id: &str) {
        {
            let mut inner = self.shared.inner.lock().await;
            inner.sync.pending_read.insert(id.to_string());
            if let Some(n) = inner.view.notifications.iter_mut().find(|n| n.id == id) {
                n.read = true;
            }
        }

        let source = self.shared.source.clone();
        let ids = vec![id.to_string()];
        self.mirror(
            "notification",
            move || async move { source.mark_notifications_read(Some(ids)).await },
            |sync, v| sync.notifications.confirm(v),
        );
    }

    /// Replace the current toast; it clears itself unless superseded first
    pub async fn show_toast(&self, message: impl Into<String>) {
        let id = {
            let mut inner = self.shared.inner.lock().await;
            inner.toast_seq += 1;
            let id = inner.toast_seq;
            inner.view.toast = Some(Toast {
                id,
                message: message.into(),
            });
            id
        };

        let shared = self.shared.clone();
        tokio::spawn(async move {
            tokio::time::sleep(shared.settings.toast_duration).await;
            let mut inner = shared.inner.lock().await;
            if inner.view.toast.as_ref().is_some_and(|t| t.id == id) {
                inner.view.toast = None;
            }
        });
    }

    fn mirror_activity(&self, item: ActivityItem) {
        let source = self.shared.source.clone();
        self.mirror(
            "activity",
            move || async move { source.record_activity(item).await },
            |sync, v| sync.feed.confirm(v),
        );
    }

    /// Best-effort write to the data source. Failures are logged; local state is kept.
    fn mirror<F, Fut, A>(&self, what: &'static str, write: F, on_version: A)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<u64, DataError>> + Send + 'static,
        A: FnOnce(&mut SyncState, u64) + Send + 'static,
    {
        let shared = self.shared.clone();
        tokio::spawn(async move {
            match write().await {
                Ok(version) => on_version(&mut shared.inner.lock().await.sync, version),
                Err(e) => tracing::warn!("Failed to persist {}: {}", what, e),
            }
        });
    }
}

impl Inner {
    fn push_activity(&mut self, item: ActivityItem) {
        self.sync.pending_feed.insert(item.id.clone());
        self.view.feed.insert(0, item);
    }

    fn apply(&mut self, data: PanelData) {
        match data {
            PanelData::Kpis(kpis) => self.view.kpis = Some(kpis),
            PanelData::Activity(feed) => {
                if !self.sync.feed.admits(&feed) {
                    tracing::debug!("Ignoring stale feed v{}", feed.version);
                    return;
                }
                self.view.feed = reconcile(&self.view.feed, &feed.items, &self.sync.pending_feed);
                let fetched: HashSet<&str> = feed.items.iter().map(|a| a.id.as_str()).collect();
                self.sync.pending_feed.retain(|id| !fetched.contains(id.as_str()));
                self.sync.feed.observe(&feed);
            }
            PanelData::Orders(orders) => {
                if !self.sync.orders.admits(&orders) {
                    tracing::debug!("Ignoring stale orders v{}", orders.version);
                    return;
                }
                self.view.orders = reconcile(&self.view.orders, &orders.items, &self.sync.pending_orders);
                let fetched: HashSet<&str> = orders.items.iter().map(|o| o.id.as_str()).collect();
                self.sync.pending_orders.retain(|id| !fetched.contains(id.as_str()));
                self.sync.orders.observe(&orders);
            }
            PanelData::Devices(devices) => self.view.devices = devices,
            PanelData::Transactions(transactions) => self.view.transactions = transactions,
        }
    }

    fn apply_notifications(&mut self, notifications: Versioned<NotificationItem>) {
        if !self.sync.notifications.admits(&notifications) {
            tracing::debug!("Ignoring stale notifications v{}", notifications.version);
            return;
        }
        self.sync.notifications.observe(&notifications);

        let mut items = notifications.items;
        let sync = &mut self.sync;
        for n in items.iter_mut() {
            if n.read {
                sync.pending_read.remove(&n.id);
            } else if sync.read_all_pending || sync.pending_read.contains(&n.id) {
                n.read = true;
            }
        }
        if items.iter().all(|n| n.read) {
            sync.read_all_pending = false;
        }
        self.view.notifications = items;
    }
}

impl MountedView {
    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.view.shared.shutdown.send_replace(true);
        if let Some(poller) = self.poller.take() {
            poller.abort();
            tracing::debug!("Dashboard unmounted, polling stopped");
        }
    }
}

impl Drop for MountedView {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_service::tests::ScriptedSource;
    use crate::domain::range::ActivityQuery;

    fn settings(poll: Option<u64>) -> ViewSettings {
        ViewSettings {
            range: TimeRange::default(),
            poll_interval: poll.map(Duration::from_secs),
            toast_duration: Duration::from_millis(2500),
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_fresh_profile() {
        let source = Arc::new(ScriptedSource::seeded(Duration::from_millis(420)).await);
        let mounted = DashboardView::mount(source, settings(None));
        settle().await;

        let state = mounted.view().state().await;
        assert!(state.panel(PanelId::Kpis).is_loading());
        assert_eq!(state.placeholders(), 8);
        assert!(state.kpis.is_none());

        tokio::time::sleep(Duration::from_millis(430)).await;
        let state = mounted.view().state().await;
        assert_eq!(state.panel(PanelId::Kpis), &PanelState::Loaded(()));
        assert_eq!(state.placeholders(), 0);

        let kpis = state.kpis.expect("kpis loaded");
        let values: Vec<f64> = kpis.metrics().iter().map(|m| m.value).collect();
        assert_eq!(values, vec![48250.0, 1267.0, 38.1, 23.0]);
        let deltas: Vec<String> = kpis.metrics().iter().map(|m| m.delta_label()).collect();
        assert_eq!(deltas, vec!["+12.4", "-2.1", "+3.2", "+1.0"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_optimistic_order_appears_before_refetch() {
        let source = Arc::new(ScriptedSource::seeded(Duration::from_millis(420)).await);
        let mounted = DashboardView::mount(source.clone(), settings(None));
        tokio::time::sleep(Duration::from_millis(500)).await;
        let fetches = source.fetch_count();

        let order = mounted
            .view()
            .create_order(NewOrder {
                channel: "pos".to_string(),
                table: Some("T4".to_string()),
                items: 2,
                total: 18.5,
            })
            .await;

        let state = mounted.view().state().await;
        assert_eq!(state.orders[0].id, order.id);
        assert_eq!(state.feed[0].kind, ActivityKind::Order);
        let expected_toast = format!("Order {} created", order.id);
        assert_eq!(state.toast.map(|t| t.message), Some(expected_toast));
        assert_eq!(source.fetch_count(), fetches);

        // Mirrored write lands in the store; a refresh keeps the order at the head.
        tokio::time::sleep(Duration::from_millis(500)).await;
        let stored = source.inner.activity(ActivityQuery::default()).await.unwrap();
        assert_eq!(stored.items[0].id, state.feed[0].id);

        mounted.view().refresh().await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        let state = mounted.view().state().await;
        assert_eq!(state.orders[0].id, order.id);
        assert_eq!(state.feed.iter().filter(|a| a.id == state.feed[0].id).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fetch_does_not_drop_optimistic_item() {
        let source = Arc::new(ScriptedSource::seeded(Duration::from_millis(420)).await);
        let mounted = DashboardView::mount(source.clone(), settings(None));
        tokio::time::sleep(Duration::from_millis(500)).await;

        // A refresh is in flight while the user adds an item.
        mounted.view().refresh().await;
        settle().await;
        let item = mounted.view().add_item("Iced tea", 3.5).await;
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let state = mounted.view().state().await;
        assert_eq!(state.feed[0].id, item.id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_mirror_keeps_optimistic_item() {
        let mut source = ScriptedSource::seeded(Duration::from_millis(20)).await;
        source.failing_writes = true;
        let source = Arc::new(source);
        let mounted = DashboardView::mount(source.clone(), settings(None));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let item = mounted.view().sync_menus().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        mounted.view().refresh().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let state = mounted.view().state().await;
        assert_eq!(state.feed[0].id, item.id);
        let stored = source.inner.activity(ActivityQuery::default()).await.unwrap();
        assert!(stored.items.iter().all(|a| a.id != item.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_panel_is_loading_when_mount_returns() {
        let source = Arc::new(ScriptedSource::seeded(Duration::from_millis(420)).await);
        let mounted = DashboardView::mount(source, settings(None));

        let state = mounted.view().state().await;
        for panel in PanelId::ALL {
            assert!(state.panel(panel).is_loading(), "{:?} not loading", panel);
        }
        assert_eq!(state.placeholders(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reseeded_feed_replaces_view() {
        use crate::application::dashboard_service::FEED_LIMIT;
        use crate::application::store::{KeyValueStore, ACTIVITY_KEY};
        use bytes::Bytes;

        let source = Arc::new(ScriptedSource::seeded(Duration::from_millis(10)).await);
        let mounted = DashboardView::mount(source.clone(), settings(None));
        tokio::time::sleep(Duration::from_millis(50)).await;

        for name in ["Tea", "Scone", "Jam"] {
            mounted.view().add_item(name, 2.0).await;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        mounted.view().refresh().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        source.store.set(ACTIVITY_KEY, Bytes::from_static(b"{broken")).await.unwrap();
        for _ in 0..2 {
            mounted.view().refresh().await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let stored = source
            .inner
            .activity(ActivityQuery {
                limit: Some(FEED_LIMIT),
                kind: None,
            })
            .await
            .unwrap();
        let stored_ids: Vec<&str> = stored.items.iter().map(|a| a.id.as_str()).collect();
        let state = mounted.view().state().await;
        let view_ids: Vec<&str> = state.feed.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(view_ids, stored_ids);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_stops_after_unmount() {
        let source = Arc::new(ScriptedSource::seeded(Duration::ZERO).await);
        let mounted = DashboardView::mount(source.clone(), settings(Some(30)));

        tokio::time::sleep(Duration::from_secs(65)).await;
        let while_mounted = source.fetch_count();
        assert!(while_mounted >= 15, "mount plus two poll ticks, got {}", while_mounted);

        let view = mounted.view().clone();
        mounted.unmount();
        assert!(!view.is_mounted());
        let at_unmount = source.fetch_count();

        tokio::time::sleep(Duration::from_secs(300)).await;
        view.refresh().await;
        settle().await;
        assert_eq!(source.fetch_count(), at_unmount);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_fetch_after_unmount_is_ignored() {
        let source = Arc::new(ScriptedSource::seeded(Duration::from_millis(420)).await);
        let mounted = DashboardView::mount(source, settings(None));
        settle().await;
        let view = mounted.view().clone();
        drop(mounted);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let state = view.state().await;
        assert!(state.kpis.is_none());
        assert!(state.panel(PanelId::Kpis).is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panels_load_independently() {
        let mut source = ScriptedSource::seeded(Duration::from_millis(100)).await;
        source.stalled = HashSet::from([PanelId::Devices]);
        source.failing = HashSet::from([PanelId::Transactions]);
        let mounted = DashboardView::mount(Arc::new(source), settings(None));

        tokio::time::sleep(Duration::from_secs(5)).await;
        let state = mounted.view().state().await;
        assert!(state.panel(PanelId::Devices).is_loading());
        assert!(matches!(state.panel(PanelId::Transactions), PanelState::Errored(_)));
        for panel in [PanelId::Kpis, PanelId::Activity, PanelId::Orders] {
            assert_eq!(state.panel(panel), &PanelState::Loaded(()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_all_notifications_read() {
        let source = Arc::new(ScriptedSource::seeded(Duration::from_millis(10)).await);
        let mounted = DashboardView::mount(source.clone(), settings(None));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(mounted.view().unread_count().await, 2);

        mounted.view().mark_all_notifications_read().await;
        assert_eq!(mounted.view().unread_count().await, 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let stored = source.inner.notifications().await.unwrap();
        assert!(stored.items.iter().all(|n| n.read));
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_toast_replaces_and_outlives_older() {
        let source = Arc::new(ScriptedSource::seeded(Duration::ZERO).await);
        let mounted = DashboardView::mount(source, settings(None));
        let view = mounted.view();

        view.show_toast("first").await;
        tokio::time::sleep(Duration::from_millis(2000)).await;
        view.sync_menus().await;
        assert_eq!(view.state().await.toast.map(|t| t.message), Some("Menus synced".to_string()));

        // The first toast's timer fires here and must leave the newer one alone.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(view.state().await.toast.is_some());

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(view.state().await.toast.is_none());
    }

    #[tokio::test]
    async fn test_client_ids_are_distinct_within_one_millisecond() {
        let source = Arc::new(ScriptedSource::seeded(Duration::ZERO).await);
        let mounted = DashboardView::mount(source, settings(None));
        let now = Utc::now();

        let a = mounted.view().client_id("act", now);
        let b = mounted.view().client_id("act", now);
        assert_ne!(a, b);
    }
}
