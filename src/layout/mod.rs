mod geometry;

use eframe::egui::{Pos2, Rect, Vec2, vec2};
use tracing::{debug, warn};

pub use geometry::{OVERLAP_EPSILON, connector_endpoint, overlap_depth, rects_overlap};
use geometry::{
    clamp_into, clamp_length, inside, padded, ring_offset, sanitize_bounds, sanitize_point,
    sanitize_size, separation, tie_direction,
};

const PULL_FRACTIONS: [f32; 3] = [1.0, 0.5, 0.25];
/// Boxes still in conflict are moved to a free spot every this many iterations.
const RESEAT_INTERVAL: usize = 50;
const MAX_RESEAT_RINGS: usize = 512;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Naive placement of a box's top-left corner relative to its anchor.
    pub offset: Vec2,
    /// Minimum gap kept between neighbouring boxes.
    pub padding: f32,
    pub max_iterations: usize,
    pub convergence_threshold: f32,
    /// Largest distance a box may travel in one iteration.
    pub max_step: f32,
    /// Fraction of the remaining distance to the naive placement recovered per iteration.
    pub anchor_pull: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            offset: vec2(5.0, 5.0),
            padding: 2.0,
            max_iterations: 400,
            convergence_threshold: 0.05,
            max_step: 12.0,
            anchor_pull: 0.12,
        }
    }
}

/// One label to place: the data point it annotates and its box size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelSpec {
    pub anchor: Pos2,
    pub size: Vec2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutReport {
    /// The relaxation settled before the iteration budget ran out.
    pub converged: bool,
    pub iterations: usize,
    pub residual_overlaps: usize,
    pub out_of_bounds: usize,
}

impl LayoutReport {
    /// Best-effort result: some boxes still overlap or leave the bounds.
    pub fn is_degenerate(&self) -> bool {
        self.residual_overlaps > 0 || self.out_of_bounds > 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutOutcome {
    /// Top-left corner of each box, in input order.
    pub positions: Vec<Pos2>,
    pub report: LayoutReport,
}

/// Moves label boxes apart until none overlap and all sit inside `bounds`,
/// while pulling each box back toward its naive placement.
///
/// Each iteration pushes every overlapping pair apart (half the correction to
/// each box, on both axes, weighted by how far the centres are apart along
/// each) and projects boxes back inside the bounds. Once an iteration needs no
/// correction at all, boxes drift toward their naive placement wherever that
/// stays collision free. Every `RESEAT_INTERVAL` iterations, boxes that still
/// collide with a lower-index box jump to the nearest free spot around their
/// naive placement.
///
/// The loop stops once no box moved more than `convergence_threshold` and the
/// boxes neither overlap nor leave the bounds, or when `max_iterations` is
/// reached. Pairs are visited in input order, so equal input gives
/// bit-identical output.
pub fn relax_labels(labels: &[LabelSpec], bounds: Rect, config: &LayoutConfig) -> LayoutOutcome {
    let count = labels.len();
    if count == 0 {
        return LayoutOutcome {
            positions: Vec::new(),
            report: LayoutReport {
                converged: true,
                ..LayoutReport::default()
            },
        };
    }

    let bounds = sanitize_bounds(bounds);
    let half_padding = config.padding.max(0.0) * 0.5;
    let max_step = config.max_step.max(OVERLAP_EPSILON);
    let anchor_pull = config.anchor_pull.clamp(0.0, 1.0);

    let sizes = labels
        .iter()
        .map(|label| sanitize_size(label.size))
        .collect::<Vec<_>>();
    let targets = labels
        .iter()
        .zip(&sizes)
        .map(|(label, size)| {
            let naive = sanitize_point(label.anchor, bounds.center()) + config.offset;
            clamp_into(naive, *size, bounds)
        })
        .collect::<Vec<_>>();

    let mut positions = targets.clone();
    let mut corrections = vec![Vec2::ZERO; count];
    let mut corrected = vec![false; count];
    let mut converged = false;
    let mut iterations = 0usize;

    for _ in 0..config.max_iterations {
        iterations += 1;
        corrections.fill(Vec2::ZERO);
        corrected.fill(false);

        for i in 0..count {
            let rect_i = padded(positions[i], sizes[i], half_padding);
            for j in (i + 1)..count {
                let rect_j = padded(positions[j], sizes[j], half_padding);
                if let Some(push) = separation(rect_i, rect_j, || tie_direction(i, j)) {
                    corrections[i] -= push * 0.5;
                    corrections[j] += push * 0.5;
                    corrected[i] = true;
                    corrected[j] = true;
                }
            }
        }

        let mut max_displacement = 0.0_f32;

        if iterations % RESEAT_INTERVAL == 0 && corrected.contains(&true) {
            corrections.fill(Vec2::ZERO);
            corrected.fill(false);
            for index in 0..count {
                if !collides_with_lower(index, positions[index], &positions, &sizes, half_padding) {
                    continue;
                }
                if let Some(spot) =
                    find_free_spot(index, targets[index], &positions, &sizes, bounds, half_padding)
                {
                    max_displacement = max_displacement.max((spot - positions[index]).length());
                    positions[index] = spot;
                }
                corrected[index] = true;
            }
        }

        for index in 0..count {
            let start = positions[index];
            let moved = start + clamp_length(corrections[index], max_step);
            let projected = clamp_into(moved, sizes[index], bounds);
            if projected != moved || !inside(Rect::from_min_size(start, sizes[index]), bounds) {
                corrected[index] = true;
            }
            if corrected[index] {
                positions[index] = projected;
                max_displacement = max_displacement.max((projected - start).length());
            }
        }

        if !corrected.contains(&true) {
            for index in 0..count {
                let toward = targets[index] - positions[index];
                if toward.length_sq() <= f32::EPSILON {
                    continue;
                }

                let desired = clamp_length(toward * anchor_pull, max_step);
                for fraction in PULL_FRACTIONS {
                    let candidate =
                        clamp_into(positions[index] + desired * fraction, sizes[index], bounds);
                    if candidate == positions[index] {
                        break;
                    }
                    if !collides(index, candidate, &positions, &sizes, half_padding) {
                        max_displacement =
                            max_displacement.max((candidate - positions[index]).length());
                        positions[index] = candidate;
                        break;
                    }
                }
            }
        }

        if max_displacement < config.convergence_threshold
            && count_overlaps(&positions, &sizes) == 0
            && count_out_of_bounds(&positions, &sizes, bounds) == 0
        {
            converged = true;
            break;
        }
    }

    let report = LayoutReport {
        converged,
        iterations,
        residual_overlaps: count_overlaps(&positions, &sizes),
        out_of_bounds: count_out_of_bounds(&positions, &sizes, bounds),
    };

    if report.is_degenerate() {
        warn!(
            labels = count,
            iterations,
            residual_overlaps = report.residual_overlaps,
            out_of_bounds = report.out_of_bounds,
            "label layout did not fully converge"
        );
    } else {
        debug!(labels = count, iterations, converged, "label layout settled");
    }

    LayoutOutcome { positions, report }
}

fn collides(
    index: usize,
    candidate: Pos2,
    positions: &[Pos2],
    sizes: &[Vec2],
    half_padding: f32,
) -> bool {
    let rect = padded(candidate, sizes[index], half_padding);
    positions
        .iter()
        .zip(sizes)
        .enumerate()
        .any(|(other, (position, size))| {
            other != index && rects_overlap(rect, padded(*position, *size, half_padding))
        })
}

fn collides_with_lower(
    index: usize,
    candidate: Pos2,
    positions: &[Pos2],
    sizes: &[Vec2],
    half_padding: f32,
) -> bool {
    let rect = padded(candidate, sizes[index], half_padding);
    positions[..index]
        .iter()
        .zip(sizes)
        .any(|(position, size)| rects_overlap(rect, padded(*position, *size, half_padding)))
}

/// Nearest collision-free spot on rings of growing radius around `target`.
fn find_free_spot(
    index: usize,
    target: Pos2,
    positions: &[Pos2],
    sizes: &[Vec2],
    bounds: Rect,
    half_padding: f32,
) -> Option<Pos2> {
    let size = sizes[index];
    let step = (size.x.min(size.y) + half_padding * 2.0).max(4.0) * 0.5;
    let reach = bounds.size().length() + step;

    (1..=MAX_RESEAT_RINGS)
        .take_while(|ring| *ring as f32 * step <= reach)
        .flat_map(|ring| {
            let slots = (ring * 8).min(64);
            (0..slots).map(move |slot| ring_offset(ring, slot, slots) * (ring as f32 * step))
        })
        .map(|offset| clamp_into(target + offset, size, bounds))
        .find(|candidate| !collides(index, *candidate, positions, sizes, half_padding))
}

/// Number of overlapping box pairs.
pub fn count_overlaps(positions: &[Pos2], sizes: &[Vec2]) -> usize {
    let rects = positions
        .iter()
        .zip(sizes)
        .map(|(position, size)| Rect::from_min_size(*position, *size))
        .collect::<Vec<_>>();

    let mut overlaps = 0usize;
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects_overlap(rects[i], rects[j]) {
                overlaps += 1;
            }
        }
    }
    overlaps
}

fn count_out_of_bounds(positions: &[Pos2], sizes: &[Vec2], bounds: Rect) -> usize {
    positions
        .iter()
        .zip(sizes)
        .filter(|(position, size)| !inside(Rect::from_min_size(**position, **size), bounds))
        .count()
}
