// Dashboard domain model - panels and their loading states
use super::activity::ActivityItem;
use super::collection::Versioned;
use super::device::HardwareDevice;
use super::kpi::Kpis;
use super::order::{Order, Transaction};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelId {
    Kpis,
    Activity,
    Orders,
    Devices,
    Transactions,
}

impl PanelId {
    pub const ALL: [PanelId; 5] = [
        PanelId::Kpis,
        PanelId::Activity,
        PanelId::Orders,
        PanelId::Devices,
        PanelId::Transactions,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            PanelId::Kpis => "Overview",
            PanelId::Activity => "Recent activity",
            PanelId::Orders => "Open orders",
            PanelId::Devices => "Hardware",
            PanelId::Transactions => "Recent transactions",
        }
    }

    /// Number of skeleton placeholders shown while the panel loads
    pub fn placeholders(&self) -> usize {
        match self {
            PanelId::Kpis => 4,
            _ => 1,
        }
    }
}

/// `Idle -> Loading -> Loaded | Errored`, and back to `Loading` on refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum PanelState<T> {
    Idle,
    Loading,
    Loaded(T),
    Errored(String),
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        PanelState::Idle
    }
}

impl<T> PanelState<T> {
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => PanelState::Loaded(data),
            Err(e) => PanelState::Errored(e.to_string()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            PanelState::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

/// Payload of one panel once it has loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PanelData {
    Kpis(Kpis),
    Activity(Versioned<ActivityItem>),
    Orders(Versioned<Order>),
    Devices(Vec<HardwareDevice>),
    Transactions(Vec<Transaction>),
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub kpis: PanelState<Kpis>,
    pub activity: PanelState<Versioned<ActivityItem>>,
    pub orders: PanelState<Versioned<Order>>,
    pub devices: PanelState<Vec<HardwareDevice>>,
    pub transactions: PanelState<Vec<Transaction>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelSkeleton {
    pub id: PanelId,
    pub title: &'static str,
    pub placeholders: usize,
}

impl From<PanelId> for PanelSkeleton {
    fn from(id: PanelId) -> Self {
        Self {
            id,
            title: id.title(),
            placeholders: id.placeholders(),
        }
    }
}

/// Messages of a progressively loading dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    Skeleton { panels: Vec<PanelSkeleton> },
    PanelUpdate { panel: PanelId, state: PanelState<PanelData> },
    Complete { panels: usize, duration_ms: i64 },
}
