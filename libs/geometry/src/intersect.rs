//! Intersections and differences of geometric objects.
//!
//! Polygons are clipped against convex regions bounded by axis-aligned
//! half-planes (Sutherland-Hodgman). A rectangle is the intersection of four
//! such half-planes; the complement of a rectangle is the union of four
//! disjoint convex regions, which is how differences are computed.

use crate::dir::Dir;
use crate::point::Point;
use crate::polygon::Polygon;
use crate::rect::Rect;

/// Trait for calculating the intersection with another geometric object.
pub trait Intersect<T: ?Sized> {
    /// The type of the output shape representing the intersection.
    type Output;
    /// Calculates the intersection of this shape with `other`.
    ///
    /// If no area of this shape lies within `other`,
    /// returns [`None`]. Shapes that only touch along an edge do not intersect.
    fn intersect(&self, other: &T) -> Option<Self::Output>;
}

/// Trait for removing the area covered by another geometric object.
pub trait Subtract<T: ?Sized> {
    /// The type of the pieces left over after subtraction.
    type Output;
    /// Returns the parts of this shape not covered by `other`.
    ///
    /// Returns an empty vector if `other` covers this shape entirely.
    fn subtract(&self, other: &T) -> Vec<Self::Output>;
}

#[derive(Debug, Clone, Copy)]
struct HalfPlane {
    /// `Horiz` bounds the x-coordinate; `Vert` bounds the y-coordinate.
    dir: Dir,
    bound: i64,
    keep_below: bool,
}

impl HalfPlane {
    const fn below(dir: Dir, bound: i64) -> Self {
        Self {
            dir,
            bound,
            keep_below: true,
        }
    }

    const fn above(dir: Dir, bound: i64) -> Self {
        Self {
            dir,
            bound,
            keep_below: false,
        }
    }

    fn contains(&self, p: Point) -> bool {
        if self.keep_below {
            p.coord(self.dir) <= self.bound
        } else {
            p.coord(self.dir) >= self.bound
        }
    }

    /// The point where segment `p -> q` crosses the boundary line.
    ///
    /// Must only be called when exactly one of `p` and `q` is inside.
    fn crossing(&self, p: Point, q: Point) -> Point {
        let other = self.dir.other();
        let (pa, qa) = (p.coord(self.dir), q.coord(self.dir));
        let (pb, qb) = (p.coord(other), q.coord(other));
        let num = i128::from(qb - pb) * i128::from(self.bound - pa);
        let den = i128::from(qa - pa);
        let b = pb + div_round(num, den);
        match self.dir {
            Dir::Horiz => Point::new(self.bound, b),
            Dir::Vert => Point::new(b, self.bound),
        }
    }
}

/// Divides `num` by `den`, rounding to the nearest integer (ties away from zero).
fn div_round(num: i128, den: i128) -> i64 {
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    let half = den / 2;
    let q = if num >= 0 {
        (num + half) / den
    } else {
        (num - half) / den
    };
    q as i64
}

fn clip_half_plane(points: &[Point], hp: HalfPlane) -> Vec<Point> {
    let n = points.len();
    let mut out = Vec::with_capacity(n + 2);
    for i in 0..n {
        let cur = points[i];
        let prev = points[(i + n - 1) % n];
        match (hp.contains(prev), hp.contains(cur)) {
            (true, true) => out.push(cur),
            (false, true) => {
                out.push(hp.crossing(prev, cur));
                out.push(cur);
            }
            (true, false) => out.push(hp.crossing(prev, cur)),
            (false, false) => {}
        }
    }
    out
}

fn clip_region(polygon: &Polygon, region: &[HalfPlane]) -> Option<Polygon> {
    let mut points = polygon.points().to_vec();
    for hp in region {
        if points.is_empty() {
            return None;
        }
        points = clip_half_plane(&points, *hp);
    }
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 3 {
        return None;
    }
    let clipped = Polygon::from_verts(points);
    if clipped.is_degenerate() {
        None
    } else {
        Some(clipped)
    }
}

fn rect_region(rect: &Rect) -> [HalfPlane; 4] {
    [
        HalfPlane::above(Dir::Horiz, rect.left()),
        HalfPlane::below(Dir::Horiz, rect.right()),
        HalfPlane::above(Dir::Vert, rect.bot()),
        HalfPlane::below(Dir::Vert, rect.top()),
    ]
}

impl Intersect<Rect> for Polygon {
    type Output = Polygon;

    /// Clips this polygon to `other`.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let poly = Polygon::from(Rect::from_sides(0, 0, 10, 10));
    /// assert!(poly.intersect(&Rect::from_sides(5, 5, 20, 20)).is_some());
    /// assert!(poly.intersect(&Rect::from_sides(10, 0, 20, 10)).is_none());
    /// ```
    fn intersect(&self, other: &Rect) -> Option<Self::Output> {
        clip_region(self, &rect_region(other))
    }
}

impl Intersect<Rect> for Rect {
    type Output = Rect;

    fn intersect(&self, other: &Rect) -> Option<Self::Output> {
        self.intersection(other).filter(|r| !r.is_degenerate())
    }
}

impl Subtract<Rect> for Polygon {
    type Output = Polygon;

    fn subtract(&self, other: &Rect) -> Vec<Self::Output> {
        let (l, r) = other.span(Dir::Horiz);
        let (b, t) = other.span(Dir::Vert);
        let regions: [&[HalfPlane]; 4] = [
            &[HalfPlane::below(Dir::Horiz, l)],
            &[HalfPlane::above(Dir::Horiz, r)],
            &[
                HalfPlane::above(Dir::Horiz, l),
                HalfPlane::below(Dir::Horiz, r),
                HalfPlane::below(Dir::Vert, b),
            ],
            &[
                HalfPlane::above(Dir::Horiz, l),
                HalfPlane::below(Dir::Horiz, r),
                HalfPlane::above(Dir::Vert, t),
            ],
        ];
        regions
            .iter()
            .filter_map(|region| clip_region(self, region))
            .collect()
    }
}
