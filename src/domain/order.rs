// Orders and payment transactions
use super::collection::Identified;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Preparing,
    Ready,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub channel: String,
    pub table: Option<String>,
    pub items: u32,
    pub total: f64,
    pub status: OrderStatus,
    pub ts: DateTime<Utc>,
}

impl Order {
    /// A fresh order from user input, stamped `New`
    pub fn from_input(id: String, input: NewOrder, ts: DateTime<Utc>) -> Self {
        Self {
            id,
            channel: input.channel,
            table: input.table,
            items: input.items,
            total: input.total,
            status: OrderStatus::New,
            ts,
        }
    }

    /// Secondary line shown under the feed entry
    pub fn summary(&self) -> String {
        let place = self.table.as_deref().unwrap_or(&self.channel);
        format!("{} · {} items · ${:.2}", place, self.items, self.total)
    }
}

impl Identified for Order {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for the "create order" action
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default)]
    pub table: Option<String>,
    pub items: u32,
    pub total: f64,
}

fn default_channel() -> String {
    "pos".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Paid,
    Pending,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub reference: String,
    pub customer: String,
    pub amount: f64,
    pub status: TransactionStatus,
    pub ts: DateTime<Utc>,
}
