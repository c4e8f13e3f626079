//! Screens instrument snapshots for spread/duration outliers and lays out a
//! labelled scatter scene with decluttered annotations.

pub mod config;
pub mod layout;
pub mod provider;
pub mod rank;
pub mod record;
pub mod scene;
pub mod util;

pub use layout::{LabelSpec, LayoutConfig, LayoutOutcome, LayoutReport, relax_labels};
pub use rank::{RankError, RankedList, Recommendations, top_by_column, top_by_ratio};
pub use record::{CategoryFilter, Column, Dataset, Record};
pub use scene::{Scene, SceneConfig, compose_scene};
