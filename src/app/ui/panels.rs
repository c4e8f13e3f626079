use eframe::egui::{self, Align, Context, Layout, Vec2};
use tracing::warn;

use spread_monitor::config::MonitorSettings;
use spread_monitor::provider::run_request;
use spread_monitor::record::{CategoryFilter, Dataset};

use super::super::{SceneSlot, SummarySlot, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(dataset: Dataset, source: String, settings: MonitorSettings) -> Self {
        let categories = dataset.categories();
        if let CategoryFilter::Only(category) = &settings.initial_filter
            && !categories.contains(category)
        {
            warn!(category = %category, "initial category not present in dataset");
        }
        let initial_filter = settings.initial_filter.clone();

        Self {
            dataset,
            source,
            settings,
            categories,
            pending_filter: initial_filter.clone(),
            active_filter: initial_filter,
            search: String::new(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            scene_dirty: true,
            scene: SceneSlot::default(),
            summary: SummarySlot::default(),
            rank_error: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        if self.scene_dirty {
            self.rebuild_scene();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("spread-monitor");
                    ui.separator();
                    ui.label(format!("source: {}", self.source));
                    ui.label(format!("records: {}", self.dataset.len()));
                    ui.label(format!("categories: {}", self.categories.len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(status) = self.layout_status_text() {
                            ui.label(status);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("recommendations")
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| self.draw_summary(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading instrument snapshot...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_scene(ui);
            }
        });
    }

    /// Rankings and scene are rebuilt from scratch on every selection change.
    pub(in crate::app) fn rebuild_scene(&mut self) {
        self.scene_dirty = false;
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;

        let mut scene = SceneSlot::default();
        let mut summary = SummarySlot::default();
        match run_request(
            &self.dataset,
            &self.active_filter,
            &self.settings.ranking,
            &self.settings.scene,
            &mut scene,
            &mut summary,
        ) {
            Ok(()) => {
                self.rank_error = None;
                self.scene = scene;
                self.summary = summary;
            }
            Err(error) => {
                warn!("ranking request rejected: {error}");
                self.rank_error = Some(error.to_string());
                self.scene = SceneSlot::default();
                self.summary = SummarySlot::default();
            }
        }
    }

    pub(in crate::app) fn apply_selection(&mut self) {
        self.active_filter = self.pending_filter.clone();
        self.scene_dirty = true;
    }

    fn layout_status_text(&self) -> Option<String> {
        let scene = self.scene.0.as_ref()?;
        let status = if scene.layout_degenerate() {
            format!(
                "layout: best effort ({} overlaps after {} iterations)",
                scene.layout.residual_overlaps, scene.layout.iterations
            )
        } else {
            format!("layout: settled in {} iterations", scene.layout.iterations)
        };
        Some(format!(
            "{status}  |  canvas: {}  |  points: {}",
            scene.tier.label(),
            scene.markers.len()
        ))
    }
}
