// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types: bounding boxes and index entries.

use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Rect;

pub use kurbo::Point;

/// Axis-aligned bounding box in 2D.
///
/// A box is valid when `min_x <= max_x` and `min_y <= max_y`. Degenerate boxes
/// (a single point, or a segment) are valid. All predicates treat the edges as
/// part of the box.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    /// Minimum x (left)
    pub min_x: f64,
    /// Minimum y (bottom)
    pub min_y: f64,
    /// Maximum x (right)
    pub max_x: f64,
    /// Maximum y (top)
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new box from min/max corners.
    ///
    /// No validation happens here; see [`is_valid`][Self::is_valid].
    #[inline(always)]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// The degenerate box covering exactly one point.
    #[inline]
    pub const fn from_point(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    /// The box spanned by two opposite corners, in any order.
    #[inline]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    /// The square of half-width `radius` centered on `center`.
    ///
    /// ```
    /// use mbr_index::{BoundingBox, Point};
    ///
    /// let b = BoundingBox::around(Point::new(1.0, 1.0), 0.5);
    /// assert_eq!(b, BoundingBox::new(0.5, 0.5, 1.5, 1.5));
    /// ```
    #[inline]
    pub fn around(center: Point, radius: f64) -> Self {
        let r = radius.abs();
        Self::new(center.x - r, center.y - r, center.x + r, center.y + r)
    }

    /// Whether the min corner does not exceed the max corner on either axis.
    ///
    /// Boxes with NaN coordinates are never valid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// The smallest box enclosing both boxes.
    #[inline]
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grow this box in place so that it also encloses `other`.
    #[inline]
    pub fn expand(&mut self, other: &Self) {
        *self = self.union(other);
    }

    /// Whether the point lies inside the box or on its boundary.
    #[inline]
    pub fn contains_point(&self, p: Point) -> bool {
        self.min_x <= p.x && p.x <= self.max_x && self.min_y <= p.y && p.y <= self.max_y
    }

    /// Whether `other` lies entirely inside this box (shared edges allowed).
    #[inline]
    pub fn contains_box(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && other.max_x <= self.max_x
            && self.min_y <= other.min_y
            && other.max_y <= self.max_y
    }

    /// Determines whether this box overlaps with another in any way.
    ///
    /// The edge of a box is part of it, so two boxes that merely touch are
    /// considered to intersect.
    ///
    /// ```
    /// use mbr_index::BoundingBox;
    ///
    /// let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    /// assert!(a.intersects(&BoundingBox::new(10.0, 0.0, 20.0, 10.0)));
    /// assert!(!a.intersects(&BoundingBox::new(11.0, 0.0, 20.0, 10.0)));
    /// ```
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Squared Euclidean distance from `p` to the nearest point of the box.
    ///
    /// Zero when the point is inside. This is the ranking key of nearest-neighbor
    /// search; it avoids the square root.
    #[inline]
    pub fn distance_squared_to_point(&self, p: Point) -> f64 {
        let dx = axis_gap(p.x, self.min_x, self.max_x);
        let dy = axis_gap(p.y, self.min_y, self.max_y);
        dx * dx + dy * dy
    }

    /// Euclidean distance from `p` to the nearest point of the box (0 inside).
    ///
    /// For a box enclosing a shape this is a lower bound of the distance to the
    /// shape itself.
    #[inline]
    pub fn distance_to_point(&self, p: Point) -> f64 {
        self.distance_squared_to_point(p).sqrt()
    }

    /// Center of the box.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            0.5 * (self.min_x + self.max_x),
            0.5 * (self.min_y + self.max_y),
        )
    }

    /// Extent along x.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent along y.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Area of the box (zero for degenerate boxes).
    #[inline]
    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Half the perimeter. Used to tell apart splits of zero-area boxes.
    #[inline]
    pub fn margin(&self) -> f64 {
        self.width().max(0.0) + self.height().max(0.0)
    }
}

#[inline]
fn axis_gap(v: f64, min: f64, max: f64) -> f64 {
    if v < min {
        min - v
    } else if v > max {
        v - max
    } else {
        0.0
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({}, {}), ({}, {})]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl From<Rect> for BoundingBox {
    /// Converts a kurbo rectangle, normalizing flipped corners.
    fn from(rect: Rect) -> Self {
        let r = rect.abs();
        Self::new(r.x0, r.y0, r.x1, r.y1)
    }
}

impl From<BoundingBox> for Rect {
    fn from(b: BoundingBox) -> Self {
        Self::new(b.min_x, b.min_y, b.max_x, b.max_y)
    }
}

/// A bounding box paired with an opaque identifier.
///
/// The index never looks at `id`. Once inserted, an entry is only ever handed
/// back by shared reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<I> {
    /// Envelope used for all index decisions.
    pub bbox: BoundingBox,
    /// Caller payload.
    pub id: I,
}

impl<I> Entry<I> {
    /// Pair a box with an identifier.
    #[inline]
    pub const fn new(bbox: BoundingBox, id: I) -> Self {
        Self { bbox, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn union_is_componentwise() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(2.0, -1.0, 3.0, 0.5);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, -1.0, 3.0, 1.0));
        let mut c = a;
        c.expand(&b);
        assert_eq!(c, a.union(&b));
    }

    #[test]
    fn containment_includes_edges() {
        let b = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        assert!(b.contains_point(Point::new(0.0, 2.0)));
        assert!(b.contains_point(Point::new(1.0, 1.0)));
        assert!(!b.contains_point(Point::new(2.000_1, 1.0)));
        assert!(b.contains_box(&BoundingBox::new(0.0, 0.0, 2.0, 1.0)));
        assert!(!b.contains_box(&BoundingBox::new(-0.1, 0.0, 2.0, 1.0)));
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(a.intersects(&BoundingBox::new(1.0, 1.0, 2.0, 2.0)));
        assert!(a.intersects(&BoundingBox::from_point(Point::new(0.5, 0.5))));
        assert!(!a.intersects(&BoundingBox::new(1.5, 0.0, 2.0, 1.0)));
    }

    #[test]
    fn distance_to_point() {
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(b.distance_to_point(Point::new(0.5, 0.5)), 0.0);
        assert_eq!(b.distance_to_point(Point::new(1.0, 0.0)), 0.0);
        assert!((b.distance_to_point(Point::new(4.0, 5.0)) - 5.0).abs() < EPSILON);
        assert!((b.distance_to_point(Point::new(-2.0, 0.5)) - 2.0).abs() < EPSILON);
        assert!((b.distance_squared_to_point(Point::new(2.0, 2.0)) - 2.0).abs() < EPSILON);
    }

    #[test]
    fn validity() {
        assert!(BoundingBox::from_point(Point::new(3.0, 4.0)).is_valid());
        assert!(!BoundingBox::new(1.0, 0.0, 0.0, 1.0).is_valid());
        assert!(!BoundingBox::new(0.0, f64::NAN, 1.0, 1.0).is_valid());
    }

    #[test]
    fn rect_conversion_normalizes() {
        let b = BoundingBox::from(Rect::new(4.0, 3.0, 1.0, 2.0));
        assert_eq!(b, BoundingBox::new(1.0, 2.0, 4.0, 3.0));
        assert_eq!(Rect::from(b), Rect::new(1.0, 2.0, 4.0, 3.0));
        assert_eq!(
            BoundingBox::from_corners(Point::new(4.0, 3.0), Point::new(1.0, 2.0)),
            b
        );
    }

    #[test]
    fn margin_and_area() {
        let b = BoundingBox::new(5.0, 7.0, 10.0, 9.0);
        assert!((b.area() - 10.0).abs() < EPSILON);
        assert!((b.margin() - 7.0).abs() < EPSILON);
        let line = BoundingBox::new(0.0, 0.0, 3.0, 0.0);
        assert_eq!(line.area(), 0.0);
        assert!((line.margin() - 3.0).abs() < EPSILON);
    }
}
