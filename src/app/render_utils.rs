use eframe::egui::{Color32, Painter, Pos2, Rect, Vec2};

const CATEGORY_PALETTE: [Color32; 8] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(255, 127, 14),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(23, 190, 207),
];

pub(super) fn category_color(index: usize) -> Color32 {
    CATEGORY_PALETTE[index % CATEGORY_PALETTE.len()]
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * (0.25 + (factor * 0.75))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(236, 238, 241));
}

/// Maps scene canvas coordinates onto the screen rect. The canvas is fitted
/// into `rect`, then scaled by `zoom` around its centre and shifted by `pan`.
#[derive(Clone, Copy, Debug)]
pub(super) struct CanvasTransform {
    screen_center: Pos2,
    canvas_center: Pos2,
    scale: f32,
}

impl CanvasTransform {
    pub(super) fn new(rect: Rect, canvas: Rect, pan: Vec2, zoom: f32) -> Self {
        let fit = (rect.width() / canvas.width().max(1.0))
            .min(rect.height() / canvas.height().max(1.0))
            .max(0.01);
        Self {
            screen_center: rect.center() + pan,
            canvas_center: canvas.center(),
            scale: fit * zoom,
        }
    }

    pub(super) fn scale(&self) -> f32 {
        self.scale
    }

    pub(super) fn to_screen(&self, canvas: Pos2) -> Pos2 {
        self.screen_center + (canvas - self.canvas_center) * self.scale
    }

    pub(super) fn rect_to_screen(&self, canvas: Rect) -> Rect {
        Rect::from_min_max(self.to_screen(canvas.min), self.to_screen(canvas.max))
    }

    pub(super) fn to_canvas(&self, screen: Pos2) -> Pos2 {
        self.canvas_center + (screen - self.screen_center) / self.scale
    }
}

pub(super) fn rect_visible(rect: Rect, target: Rect) -> bool {
    !(target.max.x < rect.left()
        || target.min.x > rect.right()
        || target.max.y < rect.top()
        || target.min.y > rect.bottom())
}
