//! Integer coordinate polygons.

use serde::{Deserialize, Serialize};

use crate::bbox::Bbox;
use crate::point::Point;
use crate::rect::Rect;
use crate::transform::{TransformMut, Transformation};

/// A simple polygon, with vertex coordinates given in order.
///
/// The closing edge from the last vertex back to the first is implicit.
#[derive(Debug, Default, Clone, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Polygon {
    /// Vector of points that make up the polygon.
    points: Vec<Point>,
}

impl Polygon {
    /// Creates a polygon with given vertices.
    pub fn from_verts(vec: Vec<Point>) -> Self {
        Self { points: vec }
    }

    /// Returns the vertices of the polygon.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Returns twice the signed area of the polygon.
    ///
    /// Positive for counter-clockwise vertex order, negative for clockwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let square = Polygon::from(Rect::from_sides(0, 0, 10, 10));
    /// assert_eq!(square.signed_area2(), 200);
    /// ```
    pub fn signed_area2(&self) -> i128 {
        let n = self.points.len();
        if n < 3 {
            return 0;
        }
        (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                i128::from(a.x) * i128::from(b.y) - i128::from(b.x) * i128::from(a.y)
            })
            .sum()
    }

    /// Returns `true` if the polygon encloses no area.
    ///
    /// Zero-area polygons arise when clipping produces slivers
    /// that collapse onto a line or a point.
    pub fn is_degenerate(&self) -> bool {
        self.signed_area2() == 0
    }
}

impl From<Rect> for Polygon {
    fn from(value: Rect) -> Self {
        Self::from_verts(value.corners().to_vec())
    }
}

impl Bbox for Polygon {
    fn bbox(&self) -> Option<Rect> {
        let left = self.points.iter().map(|p| p.x).min()?;
        let bot = self.points.iter().map(|p| p.y).min()?;
        let right = self.points.iter().map(|p| p.x).max()?;
        let top = self.points.iter().map(|p| p.y).max()?;
        Some(Rect::from_sides(left, bot, right, top))
    }
}

impl TransformMut for Polygon {
    fn transform_mut(&mut self, trans: Transformation) {
        self.points.transform_mut(trans);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clockwise_area_is_negative() {
        let poly = Polygon::from_verts(vec![
            Point::new(0, 0),
            Point::new(0, 10),
            Point::new(10, 10),
            Point::new(10, 0),
        ]);
        assert_eq!(poly.signed_area2(), -200);
        assert!(!poly.is_degenerate());
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let poly = Polygon::from_verts(vec![
            Point::new(0, 0),
            Point::new(5, 5),
            Point::new(10, 10),
        ]);
        assert!(poly.is_degenerate());
    }

    #[test]
    fn empty_polygon_has_no_bbox() {
        assert_eq!(Polygon::default().bbox(), None);
    }
}
