//! Transformation types and traits.

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// A transformation representing a Manhattan translation, rotation, and/or reflection of geometry.
///
/// This object does not support scaling of geometry, and as such all transformation matrices
/// should be unitary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transformation {
    /// The transformation matrix.
    mat: TransformationMatrix,
    /// The x-y translation applied after the transformation.
    b: Point,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

/// A Manhattan rotation: 0, 90, 180, or 270 degrees counterclockwise.
#[derive(
    Debug, Clone, Copy, Default, Eq, Hash, Ord, PartialOrd, PartialEq, Serialize, Deserialize,
)]
pub enum Rotation {
    /// 0 degrees; no rotation.
    #[default]
    R0,
    /// 90 degrees counterclockwise.
    R90,
    /// 180 degrees counterclockwise.
    R180,
    /// 270 degrees counterclockwise.
    R270,
}

impl Rotation {
    /// The angle of this rotation, in degrees.
    pub fn degrees(&self) -> f64 {
        match self {
            Rotation::R0 => 0.,
            Rotation::R90 => 90.,
            Rotation::R180 => 180.,
            Rotation::R270 => 270.,
        }
    }
}

/// Indicates that an angle was not a valid Manhattan angle.
///
/// Manhattan angles (in degrees) are 0, 90, 180, 270,
/// or any equivalent angle modulo 360 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonManhattanAngleError(pub f64);

impl std::fmt::Display for NonManhattanAngleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "angle {} is not a multiple of 90 degrees", self.0)
    }
}

impl std::error::Error for NonManhattanAngleError {}

impl TryFrom<f64> for Rotation {
    type Error = NonManhattanAngleError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let wrapped = ((value % 360.) + 360.) % 360.;
        if (wrapped - wrapped.round()).abs() > 1e-9 {
            return Err(NonManhattanAngleError(value));
        }
        match wrapped.round() as i64 {
            0 | 360 => Ok(Rotation::R0),
            90 => Ok(Rotation::R90),
            180 => Ok(Rotation::R180),
            270 => Ok(Rotation::R270),
            _ => Err(NonManhattanAngleError(value)),
        }
    }
}

/// A matrix representing a unitary transformation.
///
/// Can represent rotations, reflections, or combinations of rotations/reflections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformationMatrix([[i8; 2]; 2]);

impl TransformationMatrix {
    /// The identity transformation.
    ///
    /// Maps any point to itself.
    #[inline]
    pub const fn identity() -> Self {
        Self([[1, 0], [0, 1]])
    }

    /// A matrix representing a reflection across the x-axis.
    pub const fn reflect_vert() -> Self {
        Self([[1, 0], [0, -1]])
    }

    fn apply(&self, p: Point) -> Point {
        let m = &self.0;
        Point::new(
            i64::from(m[0][0]) * p.x + i64::from(m[0][1]) * p.y,
            i64::from(m[1][0]) * p.x + i64::from(m[1][1]) * p.y,
        )
    }
}

impl From<Rotation> for TransformationMatrix {
    fn from(value: Rotation) -> Self {
        Self(match value {
            Rotation::R0 => [[1, 0], [0, 1]],
            Rotation::R90 => [[0, -1], [1, 0]],
            Rotation::R180 => [[-1, 0], [0, -1]],
            Rotation::R270 => [[0, 1], [-1, 0]],
        })
    }
}

impl std::ops::Mul<TransformationMatrix> for TransformationMatrix {
    type Output = Self;

    fn mul(self, rhs: TransformationMatrix) -> Self::Output {
        let a = &self.0;
        let b = &rhs.0;
        Self([
            [
                a[0][0] * b[0][0] + a[0][1] * b[1][0],
                a[0][0] * b[0][1] + a[0][1] * b[1][1],
            ],
            [
                a[1][0] * b[0][0] + a[1][1] * b[1][0],
                a[1][0] * b[0][1] + a[1][1] * b[1][1],
            ],
        ])
    }
}

impl Transformation {
    /// Returns the identity transform, leaving any transformed object unmodified.
    pub const fn identity() -> Self {
        Self {
            mat: TransformationMatrix::identity(),
            b: Point::zero(),
        }
    }

    /// Returns a translation by `(x, y)`.
    pub const fn translate(x: i64, y: i64) -> Self {
        Self {
            mat: TransformationMatrix::identity(),
            b: Point::new(x, y),
        }
    }

    /// Creates a transformation that first optionally reflects across the x-axis,
    /// then rotates by `rotation`, then translates by `offset`.
    ///
    /// This is the order in which GDSII applies `STRANS` records.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let trans = Transformation::from_offset_and_orientation(Point::new(10, 0), true, Rotation::R90);
    /// // (1, 2) -> reflect -> (1, -2) -> rotate -> (2, 1) -> translate -> (12, 1)
    /// assert_eq!(trans.apply(Point::new(1, 2)), Point::new(12, 1));
    /// ```
    pub fn from_offset_and_orientation(offset: Point, reflect_vert: bool, rotation: Rotation) -> Self {
        let mut mat = TransformationMatrix::identity();
        if reflect_vert {
            mat = TransformationMatrix::reflect_vert() * mat;
        }
        mat = TransformationMatrix::from(rotation) * mat;
        Self { mat, b: offset }
    }

    /// Creates a new [`Transformation`] that is the cascade of `parent` and `child`.
    ///
    /// "Parents" and "children" refer to typical layout-instance hierarchies,
    /// in which each layer of instance has a nested set of transformations relative to its top-level parent.
    ///
    /// Note this operation *is not* commutative.
    /// For example the set of transformations:
    /// * (a) Reflect vertically, then
    /// * (b) Translate by (1,1)
    /// * (c) Place a point at (local coordinate) (1,1)
    ///
    /// Lands said point at (2,-2) in top-level space,
    /// whereas reversing the order of (a) and (b) lands it at (2,0).
    pub fn cascade(parent: Transformation, child: Transformation) -> Transformation {
        Self {
            mat: parent.mat * child.mat,
            b: parent.mat.apply(child.b) + parent.b,
        }
    }

    /// Applies this transformation to a single point.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        self.mat.apply(p) + self.b
    }

    /// The translation component of this transformation.
    #[inline]
    pub fn offset(&self) -> Point {
        self.b
    }
}

/// A trait for specifying how an object is changed by a transformation.
pub trait TransformMut {
    /// Applies matrix-vector [`Transformation`] `trans`.
    fn transform_mut(&mut self, trans: Transformation);
}

/// A trait for specifying how an object is changed by a transformation.
///
/// Takes in an owned copy of the shape and returns the transformed version.
pub trait Transform: TransformMut + Sized {
    /// Applies matrix-vector [`Transformation`] `trans`.
    ///
    /// Creates a new shape at a location equal to the transformation of the original.
    fn transform(mut self, trans: Transformation) -> Self {
        self.transform_mut(trans);
        self
    }
}

impl<T: TransformMut + Sized> Transform for T {}

impl<T: TransformMut> TransformMut for Vec<T> {
    fn transform_mut(&mut self, trans: Transformation) {
        for item in self.iter_mut() {
            item.transform_mut(trans);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotations_are_counterclockwise() {
        let p = Point::new(1, 0);
        let rot = |r| Transformation::from_offset_and_orientation(Point::zero(), false, r);
        assert_eq!(rot(Rotation::R90).apply(p), Point::new(0, 1));
        assert_eq!(rot(Rotation::R180).apply(p), Point::new(-1, 0));
        assert_eq!(rot(Rotation::R270).apply(p), Point::new(0, -1));
    }

    #[test]
    fn cascade_matches_sequential_application() {
        let parent =
            Transformation::from_offset_and_orientation(Point::new(1, 1), true, Rotation::R0);
        let child =
            Transformation::from_offset_and_orientation(Point::new(5, -3), false, Rotation::R90);
        let p = Point::new(2, 7);
        let cascaded = Transformation::cascade(parent, child);
        assert_eq!(cascaded.apply(p), parent.apply(child.apply(p)));
    }

    #[test]
    fn cascade_doc_example() {
        let reflect =
            Transformation::from_offset_and_orientation(Point::zero(), true, Rotation::R0);
        let shift = Transformation::translate(1, 1);
        let p = Point::new(1, 1);
        assert_eq!(
            Transformation::cascade(reflect, shift).apply(p),
            Point::new(2, -2)
        );
        assert_eq!(
            Transformation::cascade(shift, reflect).apply(p),
            Point::new(2, 0)
        );
    }

    #[test]
    fn rotation_from_angle() {
        assert_eq!(Rotation::try_from(-90.), Ok(Rotation::R270));
        assert_eq!(Rotation::try_from(450.), Ok(Rotation::R90));
        assert!(Rotation::try_from(45.).is_err());
    }
}
