// Activity feed domain model
use super::collection::Identified;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Order,
    Refund,
    Printer,
    Integration,
    Item,
    Menu,
}

impl ActivityKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "order" => Some(ActivityKind::Order),
            "refund" => Some(ActivityKind::Refund),
            "printer" => Some(ActivityKind::Printer),
            "integration" => Some(ActivityKind::Integration),
            "item" => Some(ActivityKind::Item),
            "menu" => Some(ActivityKind::Menu),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Order => "order",
            ActivityKind::Refund => "refund",
            ActivityKind::Printer => "printer",
            ActivityKind::Integration => "integration",
            ActivityKind::Item => "item",
            ActivityKind::Menu => "menu",
        }
    }
}

/// One feed entry. Entries are never mutated, only prepended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub meta: String,
    pub ts: DateTime<Utc>,
}

impl ActivityItem {
    pub fn new(
        id: impl Into<String>,
        kind: ActivityKind,
        title: impl Into<String>,
        meta: impl Into<String>,
        ts: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            meta: meta.into(),
            ts,
        }
    }
}

impl Identified for ActivityItem {
    fn id(&self) -> &str {
        &self.id
    }
}
