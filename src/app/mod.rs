use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use tracing::{error, info};

use spread_monitor::config::MonitorSettings;
use spread_monitor::provider::{DataProvider, RenderSink, SummarySink};
use spread_monitor::rank::Recommendations;
use spread_monitor::record::{CategoryFilter, Dataset};
use spread_monitor::scene::Scene;

mod render_utils;
mod scene_view;
mod ui;

type SharedProvider = Arc<dyn DataProvider + Send + Sync>;

pub struct MonitorApp {
    provider: SharedProvider,
    settings: MonitorSettings,
    state: AppState,
    reload_rx: Option<Receiver<Result<Dataset, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Dataset, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    dataset: Dataset,
    source: String,
    settings: MonitorSettings,
    categories: Vec<String>,
    pending_filter: CategoryFilter,
    active_filter: CategoryFilter,
    search: String,
    pan: Vec2,
    zoom: f32,
    scene_dirty: bool,
    scene: SceneSlot,
    summary: SummarySlot,
    rank_error: Option<String>,
}

#[derive(Default)]
struct SceneSlot(Option<Scene>);

#[derive(Default)]
struct SummarySlot(Option<Recommendations>);

impl RenderSink for SceneSlot {
    fn render(&mut self, scene: Scene) {
        self.0 = Some(scene);
    }
}

impl SummarySink for SummarySlot {
    fn summarize(&mut self, recommendations: Recommendations) {
        self.0 = Some(recommendations);
    }
}

impl MonitorApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        provider: Box<dyn DataProvider + Send + Sync>,
        settings: MonitorSettings,
    ) -> Self {
        let provider: SharedProvider = Arc::from(provider);
        let state = Self::start_load(&provider);
        Self {
            provider,
            settings,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(provider: &SharedProvider) -> Receiver<Result<Dataset, String>> {
        let (tx, rx) = mpsc::channel();
        let provider = Arc::clone(provider);

        thread::spawn(move || {
            let result = provider.snapshot().map_err(|error| {
                error!(source = %provider.describe(), "failed to load dataset: {error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(provider: &SharedProvider) -> AppState {
        info!(source = %provider.describe(), "loading dataset");
        AppState::Loading {
            rx: Self::spawn_load(provider),
        }
    }

    fn ready(&self, dataset: Dataset, previous: Option<&ViewModel>) -> AppState {
        let mut settings = self.settings.clone();
        if let Some(previous) = previous {
            settings.ranking.limit = previous.settings.ranking.limit;
            settings.initial_filter = previous.active_filter.clone();
        }
        AppState::Ready(Box::new(ViewModel::new(
            dataset,
            self.provider.describe(),
            settings,
        )))
    }
}

impl eframe::App for MonitorApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(result);
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading instrument snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load instrument snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(&self.provider));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(&self.provider);
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            let previous = match &self.state {
                AppState::Ready(model) => Some(model.as_ref()),
                _ => None,
            };
            let next_state = match result {
                Ok(dataset) => self.ready(dataset, previous),
                Err(error) => AppState::Error(error),
            };
            self.state = next_state;
            ctx.request_repaint();
        }
    }
}
