// src/lateral/desire.rs

use crate::types::{Desire, LaneChangeDirection, LaneChangeState};

/// Desire per (direction, state). Rows follow `LaneChangeDirection::index`,
/// columns follow `LaneChangeState::index`; the array type enforces that
/// every pair has an entry.
const DESIRES: [[Desire; LaneChangeState::COUNT]; LaneChangeDirection::COUNT] = [
    // None
    [Desire::None, Desire::None, Desire::None, Desire::None],
    // Left
    [
        Desire::None,
        Desire::None,
        Desire::LaneChangeLeft,
        Desire::LaneChangeLeft,
    ],
    // Right
    [
        Desire::None,
        Desire::None,
        Desire::LaneChangeRight,
        Desire::LaneChangeRight,
    ],
];

pub fn desire_for(direction: LaneChangeDirection, state: LaneChangeState) -> Desire {
    DESIRES[direction.index()][state.index()]
}
