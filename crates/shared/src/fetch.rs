//! Initial data load: one independent fetch per category.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;

use crate::categories::{CategoryConfig, CATEGORIES};
use crate::models::Category;
use crate::normalize::normalize_records;
use crate::store::{StoreWriter, StoreWriters};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// A backend exposing named collections that can be read in full.
pub trait CollectionSource {
    fn select_all(&self, collection: &str) -> impl Future<Output = Result<Vec<Value>, FetchError>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The store was replaced with `markers` entries; `dropped` records failed validation.
    Loaded { markers: usize, dropped: usize },
    /// The fetch failed; the store was left untouched.
    Failed { error: FetchError },
    /// The fetch succeeded but the stores were torn down before it arrived.
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub outcomes: Vec<(Category, LoadOutcome)>,
}

impl LoadReport {
    pub fn outcome(&self, category: Category) -> Option<&LoadOutcome> {
        self.outcomes
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, outcome)| outcome)
    }

    pub fn failed(&self) -> Vec<Category> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, LoadOutcome::Failed { .. }))
            .map(|(c, _)| *c)
            .collect()
    }
}

/// Fetches one category's collection and, on success, replaces its store.
///
/// Never returns an error: failures are logged and reported in the outcome.
pub async fn load_category<S: CollectionSource>(
    source: &S,
    config: &CategoryConfig,
    writer: &StoreWriter,
) -> LoadOutcome {
    if !writer.is_live() {
        tracing::debug!(category = %config.category, "store dropped before fetch, skipping");
        return LoadOutcome::Discarded;
    }
    tracing::info!(category = %config.category, collection = config.collection, "Fetching markers");

    let records = match source.select_all(config.collection).await {
        Ok(records) => records,
        Err(error) => {
            tracing::error!(category = %config.category, %error, "Error fetching markers");
            return LoadOutcome::Failed { error };
        }
    };

    let markers = normalize_records(&records, &config.fields);
    let count = markers.len();
    let dropped = records.len() - count;
    if dropped > 0 {
        tracing::debug!(category = %config.category, dropped, "Skipped malformed records");
    }

    if writer.replace(markers) {
        tracing::info!(category = %config.category, markers = count, "Markers prepared");
        LoadOutcome::Loaded {
            markers: count,
            dropped,
        }
    } else {
        LoadOutcome::Discarded
    }
}

/// Runs every category's load concurrently.
///
/// `on_settled` is called as each category finishes, in completion order,
/// so a UI can redraw without waiting for the slowest collection. The
/// returned report is ordered by category.
pub async fn load_markers<S, F>(source: &S, writers: &StoreWriters, mut on_settled: F) -> LoadReport
where
    S: CollectionSource,
    F: FnMut(Category, &LoadOutcome),
{
    let mut pending: FuturesUnordered<_> = CATEGORIES
        .iter()
        .map(|config| async move {
            let outcome = load_category(source, config, writers.get(config.category)).await;
            (config.category, outcome)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(CATEGORIES.len());
    while let Some((category, outcome)) = pending.next().await {
        on_settled(category, &outcome);
        outcomes.push((category, outcome));
    }
    outcomes.sort_by_key(|(category, _)| *category);

    LoadReport { outcomes }
}
