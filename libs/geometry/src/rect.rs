//! Axis-aligned rectangles.

use serde::{Deserialize, Serialize};

use crate::bbox::Bbox;
use crate::dir::Dir;
use crate::point::Point;
use crate::transform::{TransformMut, Transformation};

/// An axis-aligned rectangle, specified by lower-left and upper-right corners.
#[derive(
    Debug, Default, Copy, Clone, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Rect {
    /// The lower-left corner.
    p0: Point,
    /// The upper-right corner.
    p1: Point,
}

impl Rect {
    /// Creates a new rectangle from the given opposite corner points.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::new(Point::new(30, 20), Point::new(15, 40));
    /// assert_eq!(rect.left(), 15);
    /// assert_eq!(rect.bot(), 20);
    /// assert_eq!(rect.right(), 30);
    /// assert_eq!(rect.top(), 40);
    /// ```
    #[inline]
    pub fn new(lower_left: Point, upper_right: Point) -> Self {
        let p0 = lower_left;
        let p1 = upper_right;
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }

    /// Creates a rectangle from all 4 sides (left, bottom, right, top).
    ///
    /// # Panics
    ///
    /// This method panics if `left > right` or if `bot > top`.
    ///
    /// If you want sides to be sorted for you, consider using [`Rect::new`] instead.
    #[inline]
    pub fn from_sides(left: i64, bot: i64, right: i64, top: i64) -> Self {
        assert!(
            left <= right,
            "Rect::from_sides requires that left ({}) <= right ({})",
            left,
            right
        );
        assert!(
            bot <= top,
            "Rect::from_sides requires that bot ({}) <= top ({})",
            bot,
            top
        );
        Self::new(Point::new(left, bot), Point::new(right, top))
    }

    /// Creates a rectangle from all 4 sides (left, bottom, right, top),
    /// but returns `None` if the given sides would make the rectangle empty.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert_eq!(Rect::from_sides_option(10, 20, 0, 40), None);
    /// ```
    #[inline]
    pub fn from_sides_option(left: i64, bot: i64, right: i64, top: i64) -> Option<Self> {
        if left > right || bot > top {
            None
        } else {
            Some(Self::from_sides(left, bot, right, top))
        }
    }

    /// Creates a zero-area rectangle containing the given point.
    #[inline]
    pub const fn from_point(p: Point) -> Self {
        Self { p0: p, p1: p }
    }

    /// The lower-left corner.
    #[inline]
    pub const fn lower_left(&self) -> Point {
        self.p0
    }

    /// The upper-right corner.
    #[inline]
    pub const fn upper_right(&self) -> Point {
        self.p1
    }

    /// The left edge coordinate.
    #[inline]
    pub const fn left(&self) -> i64 {
        self.p0.x
    }

    /// The bottom edge coordinate.
    #[inline]
    pub const fn bot(&self) -> i64 {
        self.p0.y
    }

    /// The right edge coordinate.
    #[inline]
    pub const fn right(&self) -> i64 {
        self.p1.x
    }

    /// The top edge coordinate.
    #[inline]
    pub const fn top(&self) -> i64 {
        self.p1.y
    }

    /// The horizontal extent.
    #[inline]
    pub const fn width(&self) -> i64 {
        self.p1.x - self.p0.x
    }

    /// The vertical extent.
    #[inline]
    pub const fn height(&self) -> i64 {
        self.p1.y - self.p0.y
    }

    /// The area of the rectangle.
    #[inline]
    pub const fn area(&self) -> i64 {
        self.width() * self.height()
    }

    /// Returns `true` if the rectangle encloses no area.
    #[inline]
    pub const fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// The lower and upper coordinates of the rectangle in direction `dir`.
    pub const fn span(&self, dir: Dir) -> (i64, i64) {
        (self.p0.coord(dir), self.p1.coord(dir))
    }

    /// Returns the four corners in counter-clockwise order, starting at the lower left.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.p0,
            Point::new(self.p1.x, self.p0.y),
            self.p1,
            Point::new(self.p0.x, self.p1.y),
        ]
    }

    /// Computes the rectangular union of this rectangle with another rectangle.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let r1 = Rect::from_sides(0, 0, 100, 200);
    /// let r2 = Rect::from_sides(-50, 20, 90, 250);
    /// assert_eq!(r1.union(r2), Rect::from_sides(-50, 0, 100, 250));
    /// ```
    pub fn union(self, other: Self) -> Self {
        Self::new(
            Point::new(self.p0.x.min(other.p0.x), self.p0.y.min(other.p0.y)),
            Point::new(self.p1.x.max(other.p1.x), self.p1.y.max(other.p1.y)),
        )
    }

    /// Computes the overlap of this rectangle with another rectangle.
    ///
    /// Rectangles that merely touch along an edge or at a corner produce a
    /// degenerate (zero-area) result rather than `None`.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        Self::from_sides_option(
            self.left().max(other.left()),
            self.bot().max(other.bot()),
            self.right().min(other.right()),
            self.top().min(other.top()),
        )
    }
}

impl Bbox for Rect {
    fn bbox(&self) -> Option<Rect> {
        Some(*self)
    }
}

impl TransformMut for Rect {
    fn transform_mut(&mut self, trans: Transformation) {
        *self = Self::new(trans.apply(self.p0), trans.apply(self.p1));
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}) - ({}, {})",
            self.left(),
            self.bot(),
            self.right(),
            self.top()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Rotation, Transform};

    #[test]
    fn intersection_of_touching_rects_is_degenerate() {
        let r1 = Rect::from_sides(0, 0, 10, 10);
        let r2 = Rect::from_sides(10, 0, 20, 10);
        let overlap = r1.intersection(&r2).unwrap();
        assert!(overlap.is_degenerate());
        assert_eq!(r1.intersection(&Rect::from_sides(11, 0, 20, 10)), None);
    }

    #[test]
    fn transformed_rect_is_normalized() {
        let rect = Rect::from_sides(0, 0, 10, 20);
        let trans =
            Transformation::from_offset_and_orientation(Point::new(5, 5), false, Rotation::R90);
        assert_eq!(rect.transform(trans), Rect::from_sides(-15, 5, 5, 15));
    }
}
