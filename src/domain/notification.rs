// Notification dropdown domain model
use super::collection::Identified;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Display string, e.g. "5 min ago"
    pub time: String,
    pub read: bool,
}

impl Identified for NotificationItem {
    fn id(&self) -> &str {
        &self.id
    }
}

pub fn unread_count(items: &[NotificationItem]) -> usize {
    items.iter().filter(|n| !n.read).count()
}
