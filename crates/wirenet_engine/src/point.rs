//! Connection locations on the circuit canvas.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An immutable `(x, y)` grid coordinate identifying a connection location.
///
/// Points are the universal key of the engine: wires, tunnels, splitter ends,
/// pull resistors, and component ports all meet at points, and every value
/// query is answered per point.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal grid coordinate.
    pub x: i32,
    /// Vertical grid coordinate.
    pub y: i32,
}

impl Point {
    /// Creates a point at the given coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub(crate) fn to_le_bytes(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.x.to_le_bytes());
        out[4..].copy_from_slice(&self.y.to_le_bytes());
        out
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Point::new(10, -20).to_string(), "(10, -20)");
    }

    #[test]
    fn from_tuple() {
        assert_eq!(Point::from((3, 4)), Point::new(3, 4));
    }

    #[test]
    fn ordering_is_x_then_y() {
        assert!(Point::new(0, 5) < Point::new(1, 0));
        assert!(Point::new(1, 0) < Point::new(1, 1));
    }

    #[test]
    fn le_bytes_distinguish_axes() {
        assert_ne!(
            Point::new(1, 2).to_le_bytes(),
            Point::new(2, 1).to_le_bytes()
        );
    }
}
