//! Per-category marker stores.
//!
//! Each category owns one cell holding an immutable `Arc<[Marker]>`. Writers
//! swap the whole slice in one step, so readers see either the previous or
//! the new contents and never a mix. Writers only hold a weak reference: once
//! the owning [`MarkerStores`] is dropped, late writes are discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::models::{Category, Marker};

#[derive(Debug)]
struct StoreCell {
    markers: RwLock<Arc<[Marker]>>,
    revision: AtomicU64,
}

impl StoreCell {
    fn new() -> Self {
        StoreCell {
            markers: RwLock::new(Arc::from(Vec::new())),
            revision: AtomicU64::new(0),
        }
    }
}

/// The four category stores of one mounted map.
#[derive(Debug, Clone)]
pub struct MarkerStores {
    cells: [Arc<StoreCell>; 4],
}

impl Default for MarkerStores {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerStores {
    pub fn new() -> Self {
        MarkerStores {
            cells: std::array::from_fn(|_| Arc::new(StoreCell::new())),
        }
    }

    /// Current contents of one category's store.
    pub fn snapshot(&self, category: Category) -> Arc<[Marker]> {
        let cell = &self.cells[category.index()];
        let guard = cell.markers.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Current contents of every store, in [`Category::ALL`] order.
    pub fn snapshot_all(&self) -> Vec<(Category, Arc<[Marker]>)> {
        Category::ALL
            .iter()
            .map(|&category| (category, self.snapshot(category)))
            .collect()
    }

    /// Number of replacements applied to one category's store.
    pub fn revision(&self, category: Category) -> u64 {
        self.cells[category.index()].revision.load(Ordering::Acquire)
    }

    /// Sum of all per-category revisions; changes whenever any store is replaced.
    pub fn total_revision(&self) -> u64 {
        Category::ALL.iter().map(|&c| self.revision(c)).sum()
    }

    pub fn writer(&self, category: Category) -> StoreWriter {
        StoreWriter {
            category,
            cell: Arc::downgrade(&self.cells[category.index()]),
        }
    }

    pub fn writers(&self) -> StoreWriters {
        StoreWriters(Category::ALL.map(|category| self.writer(category)))
    }
}

/// Write handle for a single category's store.
#[derive(Debug, Clone)]
pub struct StoreWriter {
    category: Category,
    cell: Weak<StoreCell>,
}

impl StoreWriter {
    /// Replaces the whole store. Returns `false` if the store has already
    /// been torn down, in which case nothing happens.
    pub fn replace(&self, markers: Vec<Marker>) -> bool {
        let Some(cell) = self.cell.upgrade() else {
            tracing::debug!(category = %self.category, "store dropped, discarding late write");
            return false;
        };
        {
            let mut guard = cell.markers.write().unwrap_or_else(PoisonError::into_inner);
            *guard = Arc::from(markers);
        }
        cell.revision.fetch_add(1, Ordering::AcqRel);
        true
    }

    pub fn is_live(&self) -> bool {
        self.cell.strong_count() > 0
    }
}

/// One writer per category, detached from the stores' lifetime.
#[derive(Debug, Clone)]
pub struct StoreWriters([StoreWriter; 4]);

impl StoreWriters {
    pub fn get(&self, category: Category) -> &StoreWriter {
        &self.0[category.index()]
    }
}
