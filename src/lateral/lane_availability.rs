// src/lateral/lane_availability.rs
//
// Is there room for a lane on the blinker side? Compares the road edge
// against the adjacent lane line on that side and looks for a gap at least
// one lane wide anywhere along the edge.

use crate::interp::{interp_many, linspace};
use crate::signal::{ModelFrame, Polyline};
use tracing::debug;

/// Narrowest gap (m) between lane line and road edge that counts as a lane
pub const MIN_LANE_WIDTH: f32 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkerSide {
    Left,
    Right,
}

impl BlinkerSide {
    fn edge_index(self) -> usize {
        match self {
            BlinkerSide::Left => 0,
            BlinkerSide::Right => 1,
        }
    }

    /// Lane lines are ordered far-left, left, right, far-right
    fn lane_line_index(self) -> usize {
        self.edge_index() + 1
    }
}

pub fn lane_available(model: &ModelFrame, side: BlinkerSide) -> bool {
    if !model.valid {
        return false;
    }
    let (Some(edge), Some(line)) = (
        model.road_edges.get(side.edge_index()),
        model.lane_lines.get(side.lane_line_index()),
    ) else {
        return false;
    };

    match max_gap(edge, line) {
        Some(gap) => {
            debug!("🛣️ {:?} lane gap {:.2}m", side, gap);
            gap >= MIN_LANE_WIDTH
        }
        None => false,
    }
}

/// Largest lateral distance between `edge` and `line`, sampled on a common
/// grid spanning the edge. None for malformed, mismatched or non-finite
/// curves.
fn max_gap(edge: &Polyline, line: &Polyline) -> Option<f32> {
    if !edge.is_well_formed() || !line.is_well_formed() || edge.x.len() != line.x.len() {
        return None;
    }
    let finite = |p: &Polyline| p.x.iter().chain(&p.y).all(|v| v.is_finite());
    if !finite(edge) || !finite(line) {
        return None;
    }

    let n = edge.x.len();
    let x = linspace(edge.x[0], edge.x[n - 1], n);
    let line_y = interp_many(&x, &line.x, &line.y);
    let edge_y = interp_many(&x, &edge.x, &edge.y);

    edge_y
        .iter()
        .zip(&line_y)
        .map(|(e, l)| (e - l).abs())
        .fold(None, |acc: Option<f32>, w| Some(acc.map_or(w, |m| m.max(w))))
        .filter(|gap| gap.is_finite())
}
