use std::collections::HashSet;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, StrokeKind, Ui, pos2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use spread_monitor::scene::{RecordId, Scene};
use spread_monitor::util::format_value;

use super::ViewModel;
use super::render_utils::{CanvasTransform, category_color, dim_color, draw_background, rect_visible};

const LABEL_FILL: Color32 = Color32::from_rgb(255, 236, 92);
const CONNECTOR_COLOR: Color32 = Color32::from_rgb(214, 48, 40);
const AXIS_COLOR: Color32 = Color32::from_gray(40);
const GRID_COLOR: Color32 = Color32::from_gray(214);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    fn search_matches(&self, scene: &Scene) -> Option<HashSet<RecordId>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let matcher = SkimMatcherV2::default();
        let records = self.dataset.records();
        let matches = scene
            .markers
            .iter()
            .filter(|marker| {
                records.get(marker.id.0).is_some_and(|record| {
                    fuzzy_match_score(&matcher, &record.issuer, query).is_some()
                        || fuzzy_match_score(&matcher, &record.code, query).is_some()
                })
            })
            .map(|marker| marker.id)
            .collect();
        Some(matches)
    }

    fn handle_scene_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response, transform: CanvasTransform) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let canvas_before = transform.to_canvas(pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.25, 8.0);

        let zoomed = CanvasTransform::new(rect, self.scene_canvas(), self.pan, self.zoom);
        self.pan += pointer - zoomed.to_screen(canvas_before);
    }

    fn scene_canvas(&self) -> Rect {
        self.scene
            .0
            .as_ref()
            .map_or(Rect::from_min_size(pos2(0.0, 0.0), vec2(1.0, 1.0)), |scene| scene.canvas)
    }

    pub(in crate::app) fn draw_scene(&mut self, ui: &mut Ui) {
        if self.scene_dirty {
            self.rebuild_scene();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        if self.scene.0.is_none() {
            ui.label("No scene: fix the ranking settings and apply a selection.");
            return;
        }

        let transform = CanvasTransform::new(rect, self.scene_canvas(), self.pan, self.zoom);
        self.handle_scene_zoom(ui, rect, &response, transform);
        if response.dragged() {
            self.pan += response.drag_delta();
        }

        let Some(scene) = self.scene.0.as_ref() else {
            return;
        };
        let matches = self.search_matches(scene);
        let transform = CanvasTransform::new(rect, scene.canvas, self.pan, self.zoom);
        let scale = transform.scale();

        painter.rect_filled(transform.rect_to_screen(scene.canvas), 0.0, Color32::WHITE);
        let plot = transform.rect_to_screen(scene.plot_area);

        for tick in &scene.x_axis.ticks {
            let x = transform.to_screen(pos2(tick.offset, scene.plot_area.max.y)).x;
            painter.line_segment([pos2(x, plot.top()), pos2(x, plot.bottom())], Stroke::new(1.0, GRID_COLOR));
            painter.text(
                pos2(x, plot.bottom() + 4.0 * scale),
                Align2::CENTER_TOP,
                tick.text.as_str(),
                FontId::proportional((12.0 * scale).max(6.0)),
                AXIS_COLOR,
            );
        }
        for tick in &scene.y_axis.ticks {
            let y = transform.to_screen(pos2(scene.plot_area.min.x, tick.offset)).y;
            painter.line_segment([pos2(plot.left(), y), pos2(plot.right(), y)], Stroke::new(1.0, GRID_COLOR));
            painter.text(
                pos2(plot.left() - 6.0 * scale, y),
                Align2::RIGHT_CENTER,
                tick.text.as_str(),
                FontId::proportional((12.0 * scale).max(6.0)),
                AXIS_COLOR,
            );
        }
        painter.rect_stroke(plot, 0.0, Stroke::new(1.2, AXIS_COLOR), StrokeKind::Inside);

        painter.text(
            pos2(plot.center().x, plot.top() - 8.0 * scale),
            Align2::CENTER_BOTTOM,
            scene.title.as_str(),
            FontId::proportional((16.0 * scale).max(7.0)),
            AXIS_COLOR,
        );
        painter.text(
            pos2(plot.center().x, plot.bottom() + 24.0 * scale),
            Align2::CENTER_TOP,
            scene.x_axis.title.as_str(),
            FontId::proportional((14.0 * scale).max(6.0)),
            AXIS_COLOR,
        );
        painter.text(
            pos2(plot.left() - 48.0 * scale, plot.top() - 8.0 * scale),
            Align2::LEFT_BOTTOM,
            scene.y_axis.title.as_str(),
            FontId::proportional((14.0 * scale).max(6.0)),
            AXIS_COLOR,
        );

        let highlighted = |id: RecordId| matches.as_ref().is_none_or(|matches| matches.contains(&id));
        let pointer = ui.input(|input| input.pointer.hover_pos());
        let mut hovered = None;

        for marker in &scene.markers {
            let position = transform.to_screen(marker.position);
            let radius = (4.0 * scale.sqrt()).clamp(2.5, 9.0);
            let mut color = category_color(marker.legend_index);
            if !highlighted(marker.id) {
                color = dim_color(color, 0.2);
            }
            painter.circle_filled(position, radius, color);
            if pointer.is_some_and(|pointer| pointer.distance(position) <= radius + 2.0) {
                hovered = Some(marker.id);
            }
        }

        let font = FontId::monospace((scene.font_size * scale).max(4.0));

        for (label, connector) in scene.labels.iter().zip(&scene.connectors) {
            let screen_rect = transform.rect_to_screen(label.rect());
            if !rect_visible(rect, screen_rect) {
                continue;
            }

            let active = highlighted(label.id);
            if connector.length() > 1.0 {
                let start = transform.to_screen(connector.to);
                let end = transform.to_screen(connector.from);
                let connector_color = if active {
                    CONNECTOR_COLOR
                } else {
                    dim_color(CONNECTOR_COLOR, 0.2)
                };
                painter.arrow(start, end - start, Stroke::new(1.0, connector_color));
            }

            let (fill, border) = if hovered == Some(label.id) {
                (Color32::from_rgb(255, 200, 80), Color32::BLACK)
            } else if active {
                (LABEL_FILL, Color32::BLACK)
            } else {
                (dim_color(LABEL_FILL, 0.2), dim_color(Color32::BLACK, 0.2))
            };
            painter.rect(screen_rect, 3.0 * scale, fill, Stroke::new(1.0, border), StrokeKind::Inside);

            for (line_index, line) in label.text_lines.iter().enumerate() {
                let offset = vec2(
                    scene.text_padding,
                    scene.text_padding + line_index as f32 * scene.line_height,
                ) * scale;
                painter.text(
                    screen_rect.min + offset,
                    Align2::LEFT_TOP,
                    line.as_str(),
                    font.clone(),
                    if active { Color32::BLACK } else { Color32::from_gray(120) },
                );
            }
        }

        if let Some(id) = hovered
            && let Some(record) = self.dataset.records().get(id.0)
        {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
            let panel_text = format!(
                "{}  |  {}  |  {}  |  D {}  |  S {}",
                record.category,
                record.issuer,
                record.code,
                format_value(record.duration),
                format_value(record.base_spread)
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(20),
            );
        }

        if scene.markers.is_empty() {
            painter.text(
                plot.center(),
                Align2::CENTER_CENTER,
                "No records in this category.",
                FontId::proportional(14.0),
                AXIS_COLOR,
            );
        }
    }
}
