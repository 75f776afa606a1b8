//! Time-stamped, append-only seed pools.

use std::sync::Arc;

use parking_lot::RwLock;

/// One harvested value, stamped with the block number it was observed at.
/// Consumers filter out items whose timestamp is not strictly less than the
/// current block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedItem {
    pub value: String,
    pub timestamp: u64,
}

impl SeedItem {
    pub fn new(value: impl Into<String>, timestamp: u64) -> Self {
        Self { value: value.into(), timestamp }
    }
}

/// Visible at every block: used for addresses that must always be in scope
/// regardless of when they were harvested (e.g. the DApp's own inner
/// contracts, read from `address.txt` at startup).
pub const ALWAYS_VISIBLE: u64 = u32::MAX as u64;

/// An append-only, shared-read pool of seed items. Writers push under a
/// write lock; readers snapshot the current length and iterate by index, so
/// a reader never observes a torn item even while a writer is appending.
#[derive(Clone, Default)]
pub struct SeedPool {
    items: Arc<RwLock<Vec<SeedItem>>>,
}

impl SeedPool {
    pub fn new() -> Self {
        Self { items: Arc::new(RwLock::new(Vec::new())) }
    }

    pub fn push(&self, value: impl Into<String>, timestamp: u64) {
        self.items.write().push(SeedItem::new(value, timestamp));
    }

    /// All values visible at `current_block`, i.e. `timestamp < current_block`.
    pub fn visible_at(&self, current_block: u64) -> Vec<String> {
        let guard = self.items.read();
        let len = guard.len();
        guard[..len]
            .iter()
            .filter(|item| item.timestamp < current_block)
            .map(|item| item.value.clone())
            .collect()
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.items.read().iter().any(|item| item.value == value)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
