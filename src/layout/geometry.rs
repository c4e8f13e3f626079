use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

/// Depths below this are treated as touching, not overlapping.
pub const OVERLAP_EPSILON: f32 = 1e-3;

/// Overlap depth of two rectangles along each axis, if they overlap on both.
pub fn overlap_depth(a: Rect, b: Rect) -> Option<Vec2> {
    let depth_x = a.max.x.min(b.max.x) - a.min.x.max(b.min.x);
    let depth_y = a.max.y.min(b.max.y) - a.min.y.max(b.min.y);
    if depth_x > OVERLAP_EPSILON && depth_y > OVERLAP_EPSILON {
        Some(vec2(depth_x, depth_y))
    } else {
        None
    }
}

pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    overlap_depth(a, b).is_some()
}

/// Extra distance added to every push so separated boxes do not keep grazing.
const SEPARATION_SLACK: f32 = 0.5;
/// Weight given to the index-derived direction on axes where centres coincide.
const TIE_WEIGHT: f32 = 0.25;
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Push that separates `b` from `a`, to be split between them.
///
/// Each axis gets its overlap depth weighted by how far apart the centres are
/// along it, relative to the combined half extents; the dominant axis is
/// always resolved fully. Axes where the centres coincide take their weight
/// from `tie`.
pub(super) fn separation(a: Rect, b: Rect, tie: impl FnOnce() -> Vec2) -> Option<Vec2> {
    let depth = overlap_depth(a, b)?;
    let delta = b.center() - a.center();
    let extent = (a.size() + b.size()) * 0.5;

    let tie = if delta.x.abs() > OVERLAP_EPSILON && delta.y.abs() > OVERLAP_EPSILON {
        Vec2::ZERO
    } else {
        tie()
    };
    let weight = vec2(
        axis_weight(delta.x, extent.x, tie.x),
        axis_weight(delta.y, extent.y, tie.y),
    );
    let dominant = weight.x.abs().max(weight.y.abs());
    if dominant <= 0.0 {
        return None;
    }

    Some(vec2(
        (depth.x + SEPARATION_SLACK) * weight.x,
        (depth.y + SEPARATION_SLACK) * weight.y,
    ) / dominant)
}

fn axis_weight(delta: f32, extent: f32, tie: f32) -> f32 {
    if delta.abs() > OVERLAP_EPSILON {
        delta / extent.max(OVERLAP_EPSILON)
    } else {
        tie
    }
}

/// Stable direction from box `first` to box `second` for boxes whose centres
/// coincide. Indices sit on a sunflower spiral, so stacks fan out in 2-D.
pub(super) fn tie_direction(first: usize, second: usize) -> Vec2 {
    (spiral_point(second) - spiral_point(first)).normalized() * TIE_WEIGHT
}

fn spiral_point(index: usize) -> Vec2 {
    Vec2::angled(index as f32 * GOLDEN_ANGLE) * (index as f32 + 0.5).sqrt()
}

/// Unit offset of `slot` out of `slots` on search ring `ring`. Rings are
/// rotated against each other so their slots do not line up.
pub(super) fn ring_offset(ring: usize, slot: usize, slots: usize) -> Vec2 {
    Vec2::angled(ring as f32 * GOLDEN_ANGLE + slot as f32 * std::f32::consts::TAU / slots as f32)
}

pub(super) fn padded(position: Pos2, size: Vec2, half_padding: f32) -> Rect {
    Rect::from_min_size(position, size).expand(half_padding)
}

/// Position closest to `position` that keeps a box of `size` inside `bounds`.
/// A box larger than the bounds on an axis is pinned to the minimum edge.
pub(super) fn clamp_into(position: Pos2, size: Vec2, bounds: Rect) -> Pos2 {
    let x = if size.x <= bounds.width() {
        position.x.clamp(bounds.min.x, bounds.max.x - size.x)
    } else {
        bounds.min.x
    };
    let y = if size.y <= bounds.height() {
        position.y.clamp(bounds.min.y, bounds.max.y - size.y)
    } else {
        bounds.min.y
    };
    pos2(x, y)
}

pub(super) fn inside(rect: Rect, bounds: Rect) -> bool {
    rect.min.x >= bounds.min.x - OVERLAP_EPSILON
        && rect.min.y >= bounds.min.y - OVERLAP_EPSILON
        && rect.max.x <= bounds.max.x + OVERLAP_EPSILON
        && rect.max.y <= bounds.max.y + OVERLAP_EPSILON
}

pub(super) fn clamp_length(vector: Vec2, max_length: f32) -> Vec2 {
    let length_sq = vector.length_sq();
    if length_sq > max_length * max_length && length_sq > 0.0 {
        vector * (max_length / length_sq.sqrt())
    } else {
        vector
    }
}

pub(super) fn sanitize_bounds(bounds: Rect) -> Rect {
    if bounds.is_finite() && bounds.width() >= 0.0 && bounds.height() >= 0.0 {
        bounds
    } else {
        Rect::from_min_size(Pos2::ZERO, Vec2::ZERO)
    }
}

pub(super) fn sanitize_point(point: Pos2, fallback: Pos2) -> Pos2 {
    pos2(
        if point.x.is_finite() { point.x } else { fallback.x },
        if point.y.is_finite() { point.y } else { fallback.y },
    )
}

pub(super) fn sanitize_size(size: Vec2) -> Vec2 {
    let axis = |value: f32| if value.is_finite() { value.max(0.0) } else { 0.0 };
    vec2(axis(size.x), axis(size.y))
}

/// Point on the border of `rect` closest to `anchor`.
pub fn connector_endpoint(anchor: Pos2, rect: Rect) -> Pos2 {
    let clamped = pos2(
        anchor.x.clamp(rect.min.x, rect.max.x),
        anchor.y.clamp(rect.min.y, rect.max.y),
    );
    if clamped != anchor {
        return clamped;
    }

    let left = anchor.x - rect.min.x;
    let right = rect.max.x - anchor.x;
    let top = anchor.y - rect.min.y;
    let bottom = rect.max.y - anchor.y;
    let nearest = left.min(right).min(top).min(bottom);

    if nearest == left {
        pos2(rect.min.x, anchor.y)
    } else if nearest == right {
        pos2(rect.max.x, anchor.y)
    } else if nearest == top {
        pos2(anchor.x, rect.min.y)
    } else {
        pos2(anchor.x, rect.max.y)
    }
}
