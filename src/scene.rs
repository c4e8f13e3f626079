use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};
use tracing::debug;

use crate::layout::{LabelSpec, LayoutConfig, LayoutReport, connector_endpoint, relax_labels};
use crate::record::{CategoryFilter, Dataset, Record};
use crate::util::{format_value, nice_ticks};

const MARGIN_LEFT: f32 = 72.0;
const MARGIN_RIGHT: f32 = 24.0;
const MARGIN_TOP: f32 = 64.0;
const MARGIN_BOTTOM: f32 = 56.0;
const RANGE_PADDING: f64 = 0.05;
const TICK_TARGET: usize = 6;

/// Canvas footprint picked from the number of points in view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasTier {
    Small,
    Medium,
    Large,
}

impl CanvasTier {
    pub const MEDIUM_ABOVE: usize = 20;
    pub const LARGE_ABOVE: usize = 50;

    pub fn for_count(count: usize) -> Self {
        if count > Self::LARGE_ABOVE {
            Self::Large
        } else if count > Self::MEDIUM_ABOVE {
            Self::Medium
        } else {
            Self::Small
        }
    }

    pub fn size(self) -> Vec2 {
        match self {
            Self::Small => vec2(864.0, 576.0),
            Self::Medium => vec2(1440.0, 864.0),
            Self::Large => vec2(2160.0, 1440.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// Approximate monospace text metrics used to size label boxes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    pub font_size: f32,
    pub char_width: f32,
    pub line_height: f32,
    pub padding: f32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            font_size: 9.0,
            char_width: 5.6,
            line_height: 11.5,
            padding: 3.0,
        }
    }
}

impl TextMetrics {
    pub fn box_size(&self, lines: &[String]) -> Vec2 {
        let widest = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        vec2(
            widest as f32 * self.char_width + self.padding * 2.0,
            lines.len() as f32 * self.line_height + self.padding * 2.0,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SceneConfig {
    pub layout: LayoutConfig,
    pub text: TextMetrics,
}

/// Index of a record in its dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub id: RecordId,
    pub position: Pos2,
    /// Index into [`Scene::legend`].
    pub legend_index: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelBox {
    pub id: RecordId,
    pub anchor: Pos2,
    pub text_lines: Vec<String>,
    pub size: Vec2,
    pub position: Pos2,
}

impl LabelBox {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connector {
    pub id: RecordId,
    pub from: Pos2,
    pub to: Pos2,
}

impl Connector {
    pub fn length(&self) -> f32 {
        (self.to - self.from).length()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AxisTick {
    pub value: f64,
    /// Canvas coordinate along the axis.
    pub offset: f32,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    pub title: String,
    pub min: f64,
    pub max: f64,
    pub ticks: Vec<AxisTick>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegendEntry {
    pub category: String,
    pub count: usize,
}

/// Everything needed to draw one view. Rebuilt for every request.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub tier: CanvasTier,
    pub canvas: Rect,
    pub plot_area: Rect,
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub legend: Vec<LegendEntry>,
    pub markers: Vec<Marker>,
    pub labels: Vec<LabelBox>,
    pub connectors: Vec<Connector>,
    pub layout: LayoutReport,
    pub font_size: f32,
    /// Distance between text baselines inside a label box.
    pub line_height: f32,
    /// Inset of the text from the label box border.
    pub text_padding: f32,
}

impl Scene {
    /// Layout gave up with overlaps or escaped boxes left in place.
    pub fn layout_degenerate(&self) -> bool {
        self.layout.is_degenerate()
    }
}

pub fn label_lines(record: &Record) -> Vec<String> {
    vec![
        record.issuer.clone(),
        record.code.clone(),
        format!("D: {}", format_value(record.duration)),
        format!("S: {}", format_value(record.base_spread)),
    ]
}

pub fn scene_title(filter: &CategoryFilter) -> String {
    let category = match filter {
        CategoryFilter::All => "All",
        CategoryFilter::Only(category) => category.as_str(),
    };
    format!("Base spread vs duration\nCategory: {category}")
}

#[derive(Clone, Copy, Debug)]
struct DataRange {
    min: f64,
    max: f64,
}

impl DataRange {
    fn covering(values: impl Iterator<Item = f64>) -> Self {
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| {
            (lo.min(value), hi.max(value))
        });
        if !min.is_finite() || !max.is_finite() {
            return Self { min: 0.0, max: 1.0 };
        }

        let span = max - min;
        let pad = if span > 0.0 {
            span * RANGE_PADDING
        } else {
            (min.abs() * RANGE_PADDING).max(0.5)
        };
        Self {
            min: min - pad,
            max: max + pad,
        }
    }

    fn fraction(self, value: f64) -> f32 {
        ((value - self.min) / (self.max - self.min)) as f32
    }
}

fn axis(title: &str, range: DataRange, to_canvas: impl Fn(f64) -> f32) -> Axis {
    let ticks = nice_ticks(range.min, range.max, TICK_TARGET)
        .into_iter()
        .map(|value| AxisTick {
            value,
            offset: to_canvas(value),
            text: format_value(value),
        })
        .collect();
    Axis {
        title: title.to_owned(),
        min: range.min,
        max: range.max,
        ticks,
    }
}

/// Builds the scatter scene for the records passing `filter`, with one marker,
/// one label and one connector per record.
pub fn compose_scene(dataset: &Dataset, filter: &CategoryFilter, config: &SceneConfig) -> Scene {
    let view = dataset.view(filter);
    let tier = CanvasTier::for_count(view.len());
    let canvas = Rect::from_min_size(Pos2::ZERO, tier.size());
    let plot_area = Rect::from_min_max(
        pos2(canvas.min.x + MARGIN_LEFT, canvas.min.y + MARGIN_TOP),
        pos2(canvas.max.x - MARGIN_RIGHT, canvas.max.y - MARGIN_BOTTOM),
    );

    let x_range = DataRange::covering(view.iter().map(|(_, record)| record.duration));
    let y_range = DataRange::covering(view.iter().map(|(_, record)| record.base_spread));
    let to_x = |value: f64| plot_area.min.x + x_range.fraction(value) * plot_area.width();
    let to_y = |value: f64| plot_area.max.y - y_range.fraction(value) * plot_area.height();

    let mut legend: Vec<LegendEntry> = Vec::new();
    let mut markers = Vec::with_capacity(view.len());
    let mut label_lines_by_record = Vec::with_capacity(view.len());
    let mut specs = Vec::with_capacity(view.len());

    for (index, record) in &view {
        let legend_index = match legend
            .iter()
            .position(|entry| entry.category == record.category)
        {
            Some(position) => {
                legend[position].count += 1;
                position
            }
            None => {
                legend.push(LegendEntry {
                    category: record.category.clone(),
                    count: 1,
                });
                legend.len() - 1
            }
        };

        let anchor = pos2(to_x(record.duration), to_y(record.base_spread));
        let lines = label_lines(record);
        specs.push(LabelSpec {
            anchor,
            size: config.text.box_size(&lines),
        });
        label_lines_by_record.push(lines);
        markers.push(Marker {
            id: RecordId(*index),
            position: anchor,
            legend_index,
        });
    }

    let outcome = relax_labels(&specs, plot_area, &config.layout);

    let mut labels = Vec::with_capacity(specs.len());
    let mut connectors = Vec::with_capacity(specs.len());
    for (((marker, spec), text_lines), position) in markers
        .iter()
        .zip(&specs)
        .zip(label_lines_by_record)
        .zip(outcome.positions)
    {
        let label = LabelBox {
            id: marker.id,
            anchor: spec.anchor,
            text_lines,
            size: spec.size,
            position,
        };
        connectors.push(Connector {
            id: marker.id,
            from: spec.anchor,
            to: connector_endpoint(spec.anchor, label.rect()),
        });
        labels.push(label);
    }

    debug!(
        tier = tier.label(),
        markers = markers.len(),
        converged = outcome.report.converged,
        "composed scene"
    );

    Scene {
        tier,
        canvas,
        plot_area,
        title: scene_title(filter),
        x_axis: axis("Duration", x_range, to_x),
        y_axis: axis("Base spread", y_range, to_y),
        legend,
        markers,
        labels,
        connectors,
        layout: outcome.report,
        font_size: config.text.font_size,
        line_height: config.text.line_height,
        text_padding: config.text.padding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::rects_overlap;

    fn dataset(count: usize) -> Dataset {
        Dataset::from_validated(
            (0..count)
                .map(|index| {
                    Record::new(
                        format!("Issuer{index}"),
                        format!("CODE{index}"),
                        (index % 9) as f64 * 1.5,
                        0.2 + (index % 7) as f64 * 0.15,
                        if index % 2 == 0 { "Even" } else { "Odd" },
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn tiers_follow_record_count() {
        assert_eq!(CanvasTier::for_count(0), CanvasTier::Small);
        assert_eq!(CanvasTier::for_count(20), CanvasTier::Small);
        assert_eq!(CanvasTier::for_count(21), CanvasTier::Medium);
        assert_eq!(CanvasTier::for_count(50), CanvasTier::Medium);
        assert_eq!(CanvasTier::for_count(51), CanvasTier::Large);
    }

    #[test]
    fn empty_view_gives_empty_small_scene() {
        let scene = compose_scene(
            &dataset(8),
            &CategoryFilter::Only("Nowhere".to_owned()),
            &SceneConfig::default(),
        );
        assert_eq!(scene.tier, CanvasTier::Small);
        assert_eq!(scene.canvas.size(), CanvasTier::Small.size());
        assert!(scene.markers.is_empty());
        assert!(scene.labels.is_empty());
        assert!(scene.connectors.is_empty());
        assert!(!scene.layout_degenerate());
        assert_eq!(scene.title, "Base spread vs duration\nCategory: Nowhere");
    }

    #[test]
    fn every_marker_gets_one_label_and_connector() {
        let records = dataset(30);
        let scene = compose_scene(&records, &CategoryFilter::All, &SceneConfig::default());
        assert_eq!(scene.tier, CanvasTier::Medium);
        assert_eq!(scene.markers.len(), 30);
        assert_eq!(scene.labels.len(), 30);
        assert_eq!(scene.connectors.len(), 30);
        for ((marker, label), connector) in scene.markers.iter().zip(&scene.labels).zip(&scene.connectors) {
            assert_eq!(marker.id, label.id);
            assert_eq!(marker.id, connector.id);
            assert_eq!(label.anchor, marker.position);
        }
    }

    #[test]
    fn category_filter_limits_markers_and_legend() {
        let scene = compose_scene(
            &dataset(10),
            &CategoryFilter::Only("Odd".to_owned()),
            &SceneConfig::default(),
        );
        assert_eq!(scene.markers.len(), 5);
        assert!(scene.markers.iter().all(|marker| marker.id.0 % 2 == 1));
        assert_eq!(
            scene.legend,
            vec![LegendEntry {
                category: "Odd".to_owned(),
                count: 5
            }]
        );
    }

    #[test]
    fn anchors_lie_inside_the_plot_area() {
        let scene = compose_scene(&dataset(12), &CategoryFilter::All, &SceneConfig::default());
        for marker in &scene.markers {
            assert!(scene.plot_area.contains(marker.position));
        }
        assert!(!scene.x_axis.ticks.is_empty());
        assert!(!scene.y_axis.ticks.is_empty());
    }

    #[test]
    fn converged_scene_has_no_overlapping_labels() {
        let scene = compose_scene(&dataset(4), &CategoryFilter::All, &SceneConfig::default());
        assert!(scene.layout.converged);
        for i in 0..scene.labels.len() {
            assert!(scene.plot_area.contains_rect(scene.labels[i].rect()));
            for j in (i + 1)..scene.labels.len() {
                assert!(!rects_overlap(scene.labels[i].rect(), scene.labels[j].rect()));
            }
        }
    }

    #[test]
    fn connectors_end_on_the_label_border() {
        let scene = compose_scene(&dataset(6), &CategoryFilter::All, &SceneConfig::default());
        for (label, connector) in scene.labels.iter().zip(&scene.connectors) {
            let rect = label.rect();
            let on_vertical = (connector.to.x - rect.min.x).abs() < 1e-4
                || (connector.to.x - rect.max.x).abs() < 1e-4;
            let on_horizontal = (connector.to.y - rect.min.y).abs() < 1e-4
                || (connector.to.y - rect.max.y).abs() < 1e-4;
            assert!(on_vertical || on_horizontal);
        }
    }

    #[test]
    fn single_point_range_is_widened() {
        let records = Dataset::from_validated(vec![Record::new("I", "C", 4.0, 0.0, "S")]);
        let scene = compose_scene(&records, &CategoryFilter::All, &SceneConfig::default());
        assert!(scene.x_axis.max > scene.x_axis.min);
        assert!(scene.y_axis.max > scene.y_axis.min);
        assert_eq!(scene.markers[0].position, scene.plot_area.center());
    }

    #[test]
    fn scene_carries_the_text_metrics_used_for_box_sizes() {
        let config = SceneConfig {
            text: TextMetrics {
                font_size: 11.0,
                char_width: 6.5,
                line_height: 14.0,
                padding: 4.0,
            },
            ..SceneConfig::default()
        };
        let scene = compose_scene(&dataset(3), &CategoryFilter::All, &config);
        assert_eq!(scene.font_size, 11.0);
        assert_eq!(scene.line_height, 14.0);
        assert_eq!(scene.text_padding, 4.0);
        for label in &scene.labels {
            let text_height = label.text_lines.len() as f32 * scene.line_height;
            assert_eq!(label.size.y, text_height + scene.text_padding * 2.0);
        }
    }

    #[test]
    fn label_text_matches_record_fields() {
        let record = Record::new("Emisor1", "Nemo1", 10.0, 0.5, "Sector1");
        assert_eq!(label_lines(&record), vec!["Emisor1", "Nemo1", "D: 10", "S: 0.5"]);
        let size = TextMetrics::default().box_size(&label_lines(&record));
        assert_eq!(size, vec2(7.0 * 5.6 + 6.0, 4.0 * 11.5 + 6.0));
    }
}
