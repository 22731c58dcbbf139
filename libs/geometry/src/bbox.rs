//! Axis-aligned rectangular bounding boxes.

use crate::rect::Rect;

/// A geometric shape that has a bounding box.
///
/// # Examples
///
/// ```
/// # use geometry::prelude::*;
/// let rect = Rect::from_sides(0, 0, 100, 200);
/// assert_eq!(rect.bbox(), Some(Rect::from_sides(0, 0, 100, 200)));
/// let empty: Vec<Rect> = Vec::new();
/// assert_eq!(empty.bbox(), None);
/// ```
pub trait Bbox {
    /// Computes the axis-aligned rectangular bounding box.
    ///
    /// If empty, this method should return `None`.
    fn bbox(&self) -> Option<Rect>;
}

/// Computes the smallest rectangle enclosing two possibly-empty bounding boxes.
pub trait BoundingUnion<T> {
    /// The resulting bounding box type.
    type Output;

    /// Returns the bounding union of `self` and `other`.
    fn bounding_union(&self, other: &T) -> Self::Output;
}

impl BoundingUnion<Option<Rect>> for Option<Rect> {
    type Output = Option<Rect>;

    fn bounding_union(&self, other: &Option<Rect>) -> Self::Output {
        match (self, other) {
            (Some(a), Some(b)) => Some(a.union(*b)),
            (Some(a), None) => Some(*a),
            (None, Some(b)) => Some(*b),
            (None, None) => None,
        }
    }
}

impl<T> Bbox for &T
where
    T: Bbox,
{
    fn bbox(&self) -> Option<Rect> {
        T::bbox(*self)
    }
}

impl<T: Bbox> Bbox for [T] {
    fn bbox(&self) -> Option<Rect> {
        let mut bbox = None;
        for item in self {
            bbox = bbox.bounding_union(&item.bbox());
        }
        bbox
    }
}

impl<T: Bbox> Bbox for Vec<T> {
    fn bbox(&self) -> Option<Rect> {
        self.as_slice().bbox()
    }
}

impl<T: Bbox> Bbox for Option<T> {
    fn bbox(&self) -> Option<Rect> {
        self.as_ref().and_then(|item| item.bbox())
    }
}

#[cfg(test)]
mod tests {
    use crate::{bbox::Bbox, point::Point, polygon::Polygon, rect::Rect};

    #[test]
    fn bbox_works_for_vecs() {
        let v = vec![
            Rect::from_sides(0, 0, 100, 200),
            Rect::from_sides(-50, 20, 90, 250),
        ];
        assert_eq!(v.bbox(), Some(Rect::from_sides(-50, 0, 100, 250)));
    }

    #[test]
    fn bbox_works_for_polygon() {
        let points = vec![
            Point { x: -10, y: 25 },
            Point { x: 0, y: 16 },
            Point { x: 40, y: -20 },
        ];
        let polygon = Polygon::from_verts(points);
        assert_eq!(polygon.bbox(), Some(Rect::from_sides(-10, -20, 40, 25)));
    }
}
