//! An import prelude that re-exports commonly used items.

pub use crate::bbox::{Bbox, BoundingUnion};
pub use crate::dir::Dir;
pub use crate::intersect::{Intersect, Subtract};
pub use crate::point::Point;
pub use crate::polygon::Polygon;
pub use crate::rect::Rect;
pub use crate::transform::{Rotation, Transform, TransformMut, Transformation};
