//! Width-incompatibility diagnostics reported to the UI layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::point::Point;

/// A bundle whose contributors declared different bit widths.
///
/// Lists every `(point, width)` declaration that reached the bundle, sorted
/// by point. The bundle itself is marked invalid and resolves to NIL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidthIncompatibility {
    points: Vec<(Point, u32)>,
}

impl WidthIncompatibility {
    pub(crate) fn new(mut points: Vec<(Point, u32)>) -> Self {
        points.sort_unstable();
        points.dedup();
        Self { points }
    }

    /// Every width declaration on the bundle, sorted by point.
    pub fn points(&self) -> &[(Point, u32)] {
        &self.points
    }

    /// The distinct widths that were declared.
    pub fn widths(&self) -> BTreeSet<u32> {
        self.points.iter().map(|&(_, w)| w).collect()
    }

    /// Returns `true` if a declaration at `point` contributed to the conflict.
    pub fn involves(&self, point: Point) -> bool {
        self.points.iter().any(|&(p, _)| p == point)
    }
}

impl fmt::Display for WidthIncompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<String> = self.widths().iter().map(u32::to_string).collect();
        let points: BTreeSet<Point> = self.points.iter().map(|&(p, _)| p).collect();
        let points: Vec<String> = points.iter().map(Point::to_string).collect();
        write!(
            f,
            "incompatible widths {} at {}",
            widths.join(", "),
            points.join(", ")
        )
    }
}
