// Seeder - populates the store with baseline dashboard data on first use
use crate::application::errors::DataError;
use crate::application::store::{
    KeyValueStore, ACTIVITY_KEY, DEVICES_KEY, KPIS_KEY, NOTIFICATIONS_KEY, ORDERS_KEY,
    SEEDED_KEYS, TRANSACTIONS_KEY,
};
use crate::domain::activity::{ActivityItem, ActivityKind};
use crate::domain::collection::Versioned;
use crate::domain::device::{DeviceStatus, HardwareDevice};
use crate::domain::kpi::{KpiKey, KpiMetric, Kpis};
use crate::domain::notification::NotificationItem;
use crate::domain::order::{Order, OrderStatus, Transaction, TransactionStatus};
use crate::domain::series::SeriesPoint;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::{Arc, Mutex};

const SERIES_DAYS: i64 = 14;

/// Baseline headline numbers: (key, value, delta %)
const BASELINE_KPIS: [(KpiKey, f64, f64); 4] = [
    (KpiKey::Revenue, 48250.0, 12.4),
    (KpiKey::Orders, 1267.0, -2.1),
    (KpiKey::Aov, 38.1, 3.2),
    (KpiKey::Refunds, 23.0, 1.0),
];

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SeedReport {
    pub seeded: Vec<&'static str>,
    pub kept: Vec<&'static str>,
}

pub struct Seeder {
    store: Arc<dyn KeyValueStore>,
    rng: Mutex<StdRng>,
}

impl Seeder {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_rng_seed(store: Arc<dyn KeyValueStore>, seed: u64) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seed every well-known key that is absent or unreadable. Existing
    /// well-formed data is never touched, so calling this twice is a no-op.
    pub async fn seed_all(&self) -> Result<SeedReport, DataError> {
        let mut report = SeedReport::default();

        for key in SEEDED_KEYS {
            let existing = self.store.get(key).await?;
            match existing {
                Some(bytes) if is_well_formed(key, &bytes) => report.kept.push(key),
                Some(_) => {
                    tracing::warn!("Stored value for {} is malformed, reseeding", key);
                    self.seed_key(key).await?;
                    report.seeded.push(key);
                }
                None => {
                    self.seed_key(key).await?;
                    report.seeded.push(key);
                }
            }
        }

        tracing::info!(
            "Seeding complete: {} seeded, {} kept",
            report.seeded.len(),
            report.kept.len()
        );
        Ok(report)
    }

    /// Unconditionally (re)write one key, returning the bytes written
    pub async fn seed_key(&self, key: &str) -> Result<Bytes, DataError> {
        let bytes = self.generate(key, Utc::now())?;
        self.store.set(key, bytes.clone()).await?;
        tracing::debug!("Seeded {} ({} bytes)", key, bytes.len());
        Ok(bytes)
    }

    fn generate(&self, key: &str, now: DateTime<Utc>) -> Result<Bytes, DataError> {
        // A poisoned lock only means another seed panicked mid-generation; the RNG is still usable.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        // Readers tell a reseeded collection from a stale copy by its generation.
        let generation: u64 = rng.random();
        match key {
            KPIS_KEY => encode(key, &seed_kpis(&mut rng, now)),
            ACTIVITY_KEY => encode(key, &Versioned::seeded(seed_activity(&mut rng, now), generation)),
            NOTIFICATIONS_KEY => encode(key, &Versioned::seeded(seed_notifications(), generation)),
            DEVICES_KEY => encode(key, &seed_devices()),
            ORDERS_KEY => encode(key, &Versioned::seeded(seed_orders(&mut rng, now), generation)),
            TRANSACTIONS_KEY => encode(key, &seed_transactions(&mut rng, now)),
            other => Err(DataError::UnknownKey(other.to_string())),
        }
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Bytes, DataError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| DataError::encode(key, e))
}

/// Whether stored bytes parse as the shape expected under `key`
pub fn is_well_formed(key: &str, bytes: &[u8]) -> bool {
    match key {
        KPIS_KEY => serde_json::from_slice::<Kpis>(bytes).is_ok(),
        ACTIVITY_KEY => serde_json::from_slice::<Versioned<ActivityItem>>(bytes).is_ok(),
        NOTIFICATIONS_KEY => serde_json::from_slice::<Versioned<NotificationItem>>(bytes).is_ok(),
        DEVICES_KEY => serde_json::from_slice::<Vec<HardwareDevice>>(bytes).is_ok(),
        ORDERS_KEY => serde_json::from_slice::<Versioned<Order>>(bytes).is_ok(),
        TRANSACTIONS_KEY => serde_json::from_slice::<Vec<Transaction>>(bytes).is_ok(),
        _ => false,
    }
}

fn seed_kpis(rng: &mut StdRng, now: DateTime<Utc>) -> Kpis {
    let [revenue, orders, aov, refunds] =
        BASELINE_KPIS.map(|(key, value, delta)| KpiMetric::new(key, value, delta, seed_series(rng, now, value)));

    Kpis {
        revenue,
        orders,
        aov,
        refunds,
    }
}

/// Daily points ending today: a sine wave around `value` plus a few percent of
/// uniform noise. The last point is the headline value itself.
fn seed_series(rng: &mut StdRng, now: DateTime<Utc>, value: f64) -> Vec<SeriesPoint> {
    (0..SERIES_DAYS)
        .map(|i| {
            let t = (now - Duration::days(SERIES_DAYS - 1 - i)).timestamp_millis();
            if i == SERIES_DAYS - 1 {
                return SeriesPoint::new(t, value);
            }
            let base = value * (1.0 + 0.08 * (i as f64 * 0.7).sin());
            let noise = rng.random_range(-3..=3) as f64 * value / 100.0;
            let v = ((base + noise).max(0.0) * 100.0).round() / 100.0;
            SeriesPoint::new(t, v)
        })
        .collect()
}

fn seed_activity(rng: &mut StdRng, now: DateTime<Utc>) -> Vec<ActivityItem> {
    let entries = [
        (ActivityKind::Order, "New order #1042", "Table 7 · 3 items"),
        (ActivityKind::Printer, "Kitchen printer reconnected", "EPSON TM-m30"),
        (ActivityKind::Refund, "Refund issued", "Order #1031 · $12.50"),
        (ActivityKind::Integration, "Delivery menu synced", "3 channels updated"),
        (ActivityKind::Order, "New order #1041", "Takeaway · 1 item"),
        (ActivityKind::Item, "Item added", "Seasonal lemonade"),
        (ActivityKind::Menu, "Menu published", "Lunch menu v12"),
        (ActivityKind::Order, "New order #1040", "Table 2 · 5 items"),
    ];

    let mut minutes_ago = 0;
    entries
        .into_iter()
        .enumerate()
        .map(|(i, (kind, title, meta))| {
            minutes_ago += rng.random_range(2..=25);
            ActivityItem::new(
                format!("act-{}", i + 1),
                kind,
                title,
                meta,
                now - Duration::minutes(minutes_ago),
            )
        })
        .collect()
}

fn seed_notifications() -> Vec<NotificationItem> {
    [
        ("Low stock", "Oat milk is below the reorder threshold", "5 min ago", false),
        ("Printer offline", "Bar printer has not responded for 10 minutes", "12 min ago", false),
        ("Payout sent", "Weekly payout of $8,420.00 is on its way", "2 h ago", true),
        ("New review", "A guest left a 5-star review", "Yesterday", true),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (title, body, time, read))| NotificationItem {
        id: format!("ntf-{}", i + 1),
        title: title.to_string(),
        body: body.to_string(),
        time: time.to_string(),
        read,
    })
    .collect()
}

fn seed_devices() -> Vec<HardwareDevice> {
    [
        ("Front counter", "TM30-81A2", DeviceStatus::Online),
        ("Kitchen printer", "TM30-77F0", DeviceStatus::Online),
        ("Bar printer", "TM20-1C44", DeviceStatus::Offline),
        ("Card reader 1", "WPE-3390", DeviceStatus::Paired),
        ("Card reader 2", "WPE-3391", DeviceStatus::Online),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (alias, serial, status))| HardwareDevice {
        id: format!("dev-{}", i + 1),
        alias: alias.to_string(),
        serial: serial.to_string(),
        status,
    })
    .collect()
}

fn seed_orders(rng: &mut StdRng, now: DateTime<Utc>) -> Vec<Order> {
    let statuses = [
        OrderStatus::New,
        OrderStatus::New,
        OrderStatus::Preparing,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
    ];

    statuses
        .into_iter()
        .enumerate()
        .map(|(i, status)| {
            let items = rng.random_range(1..=6);
            let cents: u32 = (0..items).map(|_| rng.random_range(450..=1890)).sum();
            Order {
                id: format!("ord-{}", 1045 - i),
                channel: if i % 3 == 0 { "takeaway" } else { "dine_in" }.to_string(),
                table: (i % 3 != 0).then(|| format!("T{}", i + 1)),
                items,
                total: cents as f64 / 100.0,
                status,
                ts: now - Duration::minutes(4 * i as i64 + 1),
            }
        })
        .collect()
}

fn seed_transactions(rng: &mut StdRng, now: DateTime<Utc>) -> Vec<Transaction> {
    let customers = ["Walk-in", "A. Costa", "M. Lindqvist", "Walk-in", "J. Okafor"];

    (0..10)
        .map(|i| {
            let status = match rng.random_range(0..10) {
                0 => TransactionStatus::Refunded,
                1 | 2 => TransactionStatus::Pending,
                _ => TransactionStatus::Paid,
            };
            Transaction {
                id: format!("txn-{}", i + 1),
                reference: format!("#{}", 1040 - i),
                customer: customers[i % customers.len()].to_string(),
                amount: rng.random_range(600..=12000) as f64 / 100.0,
                status,
                ts: now - Duration::minutes(9 * i as i64 + 2),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::is_ascending;
    use crate::infrastructure::memory_store::MemoryStore;

    async fn snapshot(store: &MemoryStore) -> Vec<Option<Bytes>> {
        let mut values = Vec::new();
        for key in SEEDED_KEYS {
            values.push(store.get(key).await.unwrap());
        }
        values
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let seeder = Seeder::new(store.clone());

        let first = seeder.seed_all().await.unwrap();
        assert_eq!(first.seeded.len(), SEEDED_KEYS.len());
        let after_first = snapshot(&store).await;

        let second = seeder.seed_all().await.unwrap();
        assert!(second.seeded.is_empty());
        assert_eq!(second.kept.len(), SEEDED_KEYS.len());
        assert_eq!(snapshot(&store).await, after_first);
    }

    #[tokio::test]
    async fn test_seed_keeps_user_additions() {
        let store = Arc::new(MemoryStore::new());
        let custom = Versioned::new(vec![ActivityItem::new(
            "user-1",
            ActivityKind::Item,
            "Item added",
            "Flat white",
            Utc::now(),
        )]);
        let bytes = Bytes::from(serde_json::to_vec(&custom).unwrap());
        store.set(ACTIVITY_KEY, bytes.clone()).await.unwrap();

        Seeder::new(store.clone()).seed_all().await.unwrap();
        assert_eq!(store.get(ACTIVITY_KEY).await.unwrap(), Some(bytes));
    }

    #[tokio::test]
    async fn test_malformed_value_is_reseeded() {
        let store = Arc::new(MemoryStore::new());
        store.set(KPIS_KEY, Bytes::from_static(b"{not json")).await.unwrap();

        let report = Seeder::new(store.clone()).seed_all().await.unwrap();
        assert!(report.seeded.contains(&KPIS_KEY));

        let bytes = store.get(KPIS_KEY).await.unwrap().unwrap();
        assert!(is_well_formed(KPIS_KEY, &bytes));
    }

    #[test]
    fn test_kpi_series_are_ascending_and_end_on_value() {
        let mut rng = StdRng::seed_from_u64(7);
        let kpis = seed_kpis(&mut rng, Utc::now());

        for metric in kpis.metrics() {
            assert_eq!(metric.series.len(), SERIES_DAYS as usize);
            assert!(is_ascending(&metric.series));
            assert!(metric.series.iter().all(|p| p.v >= 0.0));
            assert_eq!(metric.series.last().map(|p| p.v), Some(metric.value));
        }
        assert_eq!(kpis.revenue.value, 48250.0);
        assert_eq!(kpis.orders.delta, -2.1);
    }

    #[test]
    fn test_seeded_ids_are_unique() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = Utc::now();
        let activity = seed_activity(&mut rng, now);
        let mut ids: Vec<&str> = activity.iter().map(|a| a.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), activity.len());

        assert!(activity.windows(2).all(|w| w[0].ts >= w[1].ts));
    }

    #[tokio::test]
    async fn test_reseed_starts_a_new_generation() {
        let store = Arc::new(MemoryStore::new());
        let seeder = Seeder::with_rng_seed(store.clone(), 11);

        let first: Versioned<Order> = serde_json::from_slice(&seeder.seed_key(ORDERS_KEY).await.unwrap()).unwrap();
        let second: Versioned<Order> = serde_json::from_slice(&seeder.seed_key(ORDERS_KEY).await.unwrap()).unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 1);
        assert_ne!(first.generation, second.generation);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let seeder = Seeder::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            seeder.generate("dash.unknown", Utc::now()),
            Err(DataError::UnknownKey(_))
        ));
    }
}
