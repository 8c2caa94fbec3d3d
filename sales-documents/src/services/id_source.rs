//! Line item id allocation.

use crate::models::{LineItem, LineItemId};

/// Hands out line item ids that are unique within one document.
pub trait IdSource {
    /// `None` once the source has no unused id left.
    fn next_id(&mut self) -> Option<LineItemId>;
}

/// Monotonic counter. Never reuses an id, even after removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequentialIds {
    next: Option<u64>,
}

impl SequentialIds {
    pub fn starting_at(first: u64) -> Self {
        Self { next: Some(first) }
    }

    /// A counter that continues past every id already in `items`, so items
    /// added to a loaded document cannot collide with persisted ones.
    /// Exhausted from the start when `items` already holds `u64::MAX`.
    pub fn after(items: &[LineItem]) -> Self {
        let max = items.iter().map(|item| item.id().value()).max().unwrap_or(0);
        Self {
            next: max.checked_add(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> Option<LineItemId> {
        let id = self.next?;
        self.next = id.checked_add(1);
        Some(LineItemId::new(id))
    }
}
