use eframe::egui::{self, RichText, Ui};

use spread_monitor::rank::RankedList;
use spread_monitor::util::format_value;

use super::super::ViewModel;

fn draw_ranked_list(ui: &mut Ui, id: &str, list: &RankedList, show_issuer: bool) {
    ui.label(RichText::new(list.title()).strong());
    if list.is_empty() {
        ui.label("No records to rank.");
    } else {
        egui::Grid::new(id)
            .striped(true)
            .num_columns(if show_issuer { 6 } else { 5 })
            .show(ui, |ui| {
                ui.strong("Category");
                if show_issuer {
                    ui.strong("Issuer");
                }
                ui.strong("Code");
                ui.strong("Duration");
                ui.strong("Spread");
                ui.strong("Score");
                ui.end_row();

                for entry in &list.entries {
                    let record = &entry.record;
                    ui.label(record.category.as_str());
                    if show_issuer {
                        ui.label(record.issuer.as_str());
                    }
                    ui.label(record.code.as_str());
                    ui.label(format_value(record.duration));
                    ui.label(format_value(record.base_spread));
                    ui.label(entry.score.map(format_value).unwrap_or_default());
                    ui.end_row();
                }
            });
    }

    if list.excluded > 0 {
        ui.small(format!(
            "{} record(s) excluded: zero denominator or non-finite ratio",
            list.excluded
        ));
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_summary(&mut self, ui: &mut Ui) {
        ui.heading("Recommendations");
        ui.add_space(6.0);

        if let Some(error) = &self.rank_error {
            ui.colored_label(egui::Color32::from_rgb(235, 110, 96), error.as_str());
            return;
        }

        let Some(recommendations) = self.summary.0.as_ref() else {
            ui.label("Rankings are computed when a selection is applied.");
            return;
        };

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                draw_ranked_list(ui, "by_column", &recommendations.by_column, true);
                ui.separator();
                draw_ranked_list(ui, "by_ratio", &recommendations.by_ratio, false);
            });
    }
}
