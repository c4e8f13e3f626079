use eframe::egui::{self, RichText, Ui};

use spread_monitor::record::CategoryFilter;

use super::super::ViewModel;

const MAX_RANKING_ROWS: usize = 25;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("View Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Select a category:");
        egui::ComboBox::from_id_salt("category_selector")
            .selected_text(self.pending_filter.label().to_owned())
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                ui.selectable_value(
                    &mut self.pending_filter,
                    CategoryFilter::All,
                    CategoryFilter::All.label(),
                );
                for category in &self.categories {
                    ui.selectable_value(
                        &mut self.pending_filter,
                        CategoryFilter::Only(category.clone()),
                        category.as_str(),
                    );
                }
            });

        let pending = self.pending_filter != self.active_filter;
        ui.add_space(4.0);
        if ui
            .add_enabled(pending, egui::Button::new("Apply selection"))
            .on_hover_text("Rebuild rankings and the labelled scatter for this category.")
            .clicked()
        {
            self.apply_selection();
        }

        ui.separator();

        let mut limit = self.settings.ranking.limit;
        let slider = ui
            .add(egui::Slider::new(&mut limit, 1..=MAX_RANKING_ROWS).text("Ranking rows"))
            .on_hover_text("Rows shown in each recommendation list.");
        if slider.changed() && limit != self.settings.ranking.limit {
            self.settings.ranking.limit = limit;
            self.scene_dirty = true;
        }

        ui.separator();

        ui.label("Highlight (issuer or code)")
            .on_hover_text("Fuzzy-highlight matching labels without changing the scene.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        ui.label(RichText::new("Scene").strong());
        ui.small("Scroll to zoom, drag to pan.");
        if ui.button("Reset view").clicked() {
            self.pan = egui::Vec2::ZERO;
            self.zoom = 1.0;
        }

        if let Some(scene) = self.scene.0.as_ref() {
            ui.add_space(6.0);
            ui.label(RichText::new("Legend").strong());
            for (index, entry) in scene.legend.iter().enumerate() {
                ui.horizontal(|ui| {
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                    ui.painter().circle_filled(
                        rect.center(),
                        4.5,
                        super::super::render_utils::category_color(index),
                    );
                    ui.label(format!("{} ({})", entry.category, entry.count));
                });
            }
        }
    }
}
