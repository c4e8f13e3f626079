use std::path::PathBuf;

use clap::Parser;

use crate::layout::LayoutConfig;
use crate::provider::{DataProvider, JsonFileProvider, SampleProvider};
use crate::rank::RankingSettings;
use crate::record::CategoryFilter;
use crate::scene::SceneConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// JSON dataset; the built-in sample is used when omitted.
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Rows shown in each ranking.
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    #[arg(long, default_value = "base_spread")]
    pub rank_column: String,

    #[arg(long, default_value = "duration")]
    pub ratio_numerator: String,

    #[arg(long, default_value = "base_spread")]
    pub ratio_denominator: String,

    /// Initial category; all categories when omitted.
    #[arg(long)]
    pub category: Option<String>,

    /// Upper bound on label relaxation iterations.
    #[arg(long, default_value_t = 400)]
    pub max_iterations: usize,

    /// Print one scene and summary as JSON instead of opening a window.
    #[arg(long)]
    pub headless: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonitorSettings {
    pub ranking: RankingSettings,
    pub scene: SceneConfig,
    pub initial_filter: CategoryFilter,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            ranking: RankingSettings::default(),
            scene: SceneConfig::default(),
            initial_filter: CategoryFilter::All,
        }
    }
}

impl Args {
    pub fn settings(&self) -> MonitorSettings {
        MonitorSettings {
            ranking: RankingSettings {
                limit: self.top,
                column: self.rank_column.clone(),
                ratio_numerator: self.ratio_numerator.clone(),
                ratio_denominator: self.ratio_denominator.clone(),
            },
            scene: SceneConfig {
                layout: LayoutConfig {
                    max_iterations: self.max_iterations,
                    ..LayoutConfig::default()
                },
                ..SceneConfig::default()
            },
            initial_filter: self
                .category
                .clone()
                .map_or(CategoryFilter::All, CategoryFilter::Only),
        }
    }

    pub fn provider(&self) -> Box<dyn DataProvider + Send + Sync> {
        match &self.data {
            Some(path) => Box::new(JsonFileProvider::new(path.clone())),
            None => Box::new(SampleProvider),
        }
    }
}
