//! Cross layout for tile expansion.
//!
//! Four siblings are placed above, left, right, and below a source tile.
//! Above/left placements that would sit too far in negative canvas space
//! flip to the opposite side at double spacing instead; right/below never
//! flip.

use crate::model::{Position, Size};

/// Where an expansion sibling sits relative to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossDirection {
    Above,
    Left,
    Right,
    Below,
}

impl CrossDirection {
    pub const ALL: [CrossDirection; 4] = [
        CrossDirection::Above,
        CrossDirection::Left,
        CrossDirection::Right,
        CrossDirection::Below,
    ];
}

/// A computed sibling slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub direction: CrossDirection,
    pub position: Position,
    /// True when the slot was moved to the opposite side of the source.
    pub flipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossLayout {
    /// Space between the source and each sibling.
    pub gap: f32,
    /// Fraction of a tile's size allowed into negative space before an
    /// above/left slot flips.
    pub edge_threshold: f32,
}

impl Default for CrossLayout {
    fn default() -> Self {
        Self {
            gap: 24.0,
            edge_threshold: 0.3,
        }
    }
}

impl CrossLayout {
    /// Compute the four sibling positions, in `CrossDirection::ALL` order.
    pub fn placements(&self, origin: Position, size: Size) -> [Placement; 4] {
        let step_x = size.width + self.gap;
        let step_y = size.height + self.gap;

        CrossDirection::ALL.map(|direction| {
            let (position, flipped) = match direction {
                CrossDirection::Above => {
                    let (y, flipped) =
                        self.flip_if_off_canvas(origin.y, step_y, size.height);
                    (Position::new(origin.x, y), flipped)
                }
                CrossDirection::Left => {
                    let (x, flipped) = self.flip_if_off_canvas(origin.x, step_x, size.width);
                    (Position::new(x, origin.y), flipped)
                }
                CrossDirection::Right => (Position::new(origin.x + step_x, origin.y), false),
                CrossDirection::Below => (Position::new(origin.x, origin.y + step_y), false),
            };
            Placement {
                direction,
                position,
                flipped,
            }
        })
    }

    fn flip_if_off_canvas(&self, origin: f32, step: f32, extent: f32) -> (f32, bool) {
        let candidate = origin - step;
        if candidate < -(extent * self.edge_threshold) {
            (origin + step * 2.0, true)
        } else {
            (candidate, false)
        }
    }
}
