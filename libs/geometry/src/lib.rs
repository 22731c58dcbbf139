//! 2-D geometric operations for checking integrated circuit layouts.
//!
//! All coordinates are integers in database units. Operations that
//! produce non-integral intermediate points (such as clipping a sloped
//! polygon edge against an axis-aligned line) round to the nearest unit.
//!
//! # Examples
//!
//! Clip a polygon against a [rectangle](crate::rect::Rect):
//!
//! ```
//! # use geometry::prelude::*;
//! let tri = Polygon::from_verts(vec![Point::new(0, 0), Point::new(100, 0), Point::new(0, 100)]);
//! let clipped = tri.intersect(&Rect::from_sides(0, 0, 10, 10));
//! assert_eq!(clipped.bbox(), Some(Rect::from_sides(0, 0, 10, 10)));
//! ```
#![warn(missing_docs)]

pub mod bbox;
pub mod dir;
pub mod intersect;
pub mod point;
pub mod polygon;
pub mod prelude;
pub mod rect;
pub mod transform;
