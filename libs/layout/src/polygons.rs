//! Flattened sets of layered polygons.

use std::collections::BTreeSet;

use geometry::prelude::*;

use crate::{GdsLayer, Shape};

/// A flat collection of polygons, each tagged with its layer.
///
/// Produced by [`Layout::flatten`](crate::Layout::flatten). Boolean operations
/// take rectangular operands and clip every member polygon independently, so
/// overlapping members are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolygonSet {
    shapes: Vec<Shape>,
}

impl PolygonSet {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.shapes.iter()
    }

    /// The distinct layers present in this set.
    pub fn layers(&self) -> BTreeSet<GdsLayer> {
        self.shapes.iter().map(Shape::layer).collect()
    }

    /// Keeps only the polygons on one of `layers`.
    pub fn filter(&self, layers: &[GdsLayer]) -> PolygonSet {
        self.shapes
            .iter()
            .filter(|s| layers.contains(&s.layer()))
            .cloned()
            .collect()
    }

    /// Keeps only the polygons on `layer`.
    pub fn on_layer(&self, layer: GdsLayer) -> PolygonSet {
        self.filter(&[layer])
    }

    /// Clips every polygon to `region`, dropping polygons with no area inside it.
    pub fn intersect(&self, region: &Rect) -> PolygonSet {
        self.shapes
            .iter()
            .filter_map(|s| {
                s.polygon()
                    .intersect(region)
                    .map(|clipped| Shape::new(s.layer(), clipped))
            })
            .collect()
    }

    /// Removes the area covered by `region` from every polygon.
    pub fn subtract(&self, region: &Rect) -> PolygonSet {
        self.shapes
            .iter()
            .flat_map(|s| {
                s.polygon()
                    .subtract(region)
                    .into_iter()
                    .map(move |piece| Shape::new(s.layer(), piece))
            })
            .collect()
    }

    /// Returns `true` if any polygon shares a non-zero area with `region`.
    ///
    /// Polygons that only touch the edge of `region` do not count.
    pub fn overlaps(&self, region: &Rect) -> bool {
        self.shapes
            .iter()
            .any(|s| s.polygon().intersect(region).is_some())
    }
}

impl Bbox for PolygonSet {
    fn bbox(&self) -> Option<Rect> {
        self.shapes.bbox()
    }
}

impl FromIterator<Shape> for PolygonSet {
    fn from_iter<T: IntoIterator<Item = Shape>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for PolygonSet {
    type Item = Shape;
    type IntoIter = std::vec::IntoIter<Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.into_iter()
    }
}

impl<'a> IntoIterator for &'a PolygonSet {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.iter()
    }
}
