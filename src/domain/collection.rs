// Versioned record collections and the merge rule for optimistic updates
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub trait Identified {
    fn id(&self) -> &str;
}

/// A persisted collection. `version` grows by one on every write and restarts
/// when the collection is seeded again, which also draws a new `generation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    #[serde(default)]
    pub generation: u64,
    pub version: u64,
    pub items: Vec<T>,
}

impl<T> Versioned<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self::seeded(items, 0)
    }

    pub fn seeded(items: Vec<T>, generation: u64) -> Self {
        Self {
            generation,
            version: 1,
            items,
        }
    }

    /// Prepend a record and bump the version, returning the new version.
    pub fn prepend(&mut self, item: T) -> u64 {
        self.items.insert(0, item);
        self.version += 1;
        self.version
    }
}

/// Newest collection state a reader has applied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    generation: u64,
    version: u64,
}

impl Watermark {
    /// A fetched copy is stale only if it is older within the same generation.
    pub fn admits<T>(&self, fetched: &Versioned<T>) -> bool {
        fetched.generation != self.generation || fetched.version >= self.version
    }

    pub fn observe<T>(&mut self, fetched: &Versioned<T>) {
        self.generation = fetched.generation;
        self.version = fetched.version;
    }

    /// Record the version a confirmed write produced
    pub fn confirm(&mut self, version: u64) {
        self.version = self.version.max(version);
    }
}

/// Merge a fetched collection with local state.
///
/// The fetched copy wins for every id it contains. Local items listed in
/// `pending` that the fetched copy does not contain yet stay at the head,
/// in their local order.
pub fn reconcile<T: Identified + Clone>(
    local: &[T],
    fetched: &[T],
    pending: &HashSet<String>,
) -> Vec<T> {
    let fetched_ids: HashSet<&str> = fetched.iter().map(|item| item.id()).collect();

    local
        .iter()
        .filter(|item| pending.contains(item.id()) && !fetched_ids.contains(item.id()))
        .cloned()
        .chain(fetched.iter().cloned())
        .collect()
}
