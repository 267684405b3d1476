//! Marker pipeline for the community resource map: category table, record
//! normalization, per-category stores, the initial load, viewport
//! recentering and clustering.

pub mod categories;
pub mod cluster;
pub mod config;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod projection;
pub mod recenter;
pub mod store;
