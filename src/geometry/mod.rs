//! Geometric primitives for region resolution.
//!
//! This module provides the axis-aligned rectangle type and the overlap
//! measures used by suppression, overlap resolution and text attachment.

pub mod mapper;

pub use mapper::{CoordinateMapper, PageOrigin, DEFAULT_DPI, POINTS_PER_INCH};

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle given by its two corners.
///
/// `(x1, y1)` is the minimum corner and `(x2, y2)` the maximum corner. The
/// type itself does not enforce `x1 < x2`; use [`Rect::is_valid`] before
/// propagating a rectangle that came out of clipping or mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    /// Minimum x coordinate
    pub x1: f64,
    /// Minimum y coordinate
    pub y1: f64,
    /// Maximum x coordinate
    pub x2: f64,
    /// Maximum y coordinate
    pub y2: f64,
}

impl Rect {
    /// Create a new rectangle from its corners.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.width(), 100.0);
    /// assert_eq!(rect.height(), 50.0);
    /// ```
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Corner coordinates as `[x1, y1, x2, y2]`.
    pub fn coords(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Width of the rectangle (may be negative for malformed input).
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Height of the rectangle (may be negative for malformed input).
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// True when both width and height are strictly positive and all
    /// coordinates are finite.
    pub fn is_valid(&self) -> bool {
        self.coords().iter().all(|c| c.is_finite()) && self.width() > 0.0 && self.height() > 0.0
    }

    /// Compute the area of the rectangle, clamping negative extents to zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::Rect;
    ///
    /// assert_eq!(Rect::new(0.0, 0.0, 100.0, 50.0).area(), 5000.0);
    /// assert_eq!(Rect::new(10.0, 0.0, 5.0, 50.0).area(), 0.0);
    /// ```
    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Check if this rectangle overlaps another with strictly positive
    /// extent on both axes. Rectangles that only share an edge do not
    /// intersect.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::Rect;
    ///
    /// let r1 = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// let r2 = Rect::new(50.0, 50.0, 150.0, 150.0);
    /// let r3 = Rect::new(100.0, 0.0, 200.0, 100.0);
    ///
    /// assert!(r1.intersects(&r2));
    /// assert!(!r1.intersects(&r3));
    /// ```
    pub fn intersects(&self, other: &Rect) -> bool {
        let (w, h) = self.overlap_extent(other);
        w > 0.0 && h > 0.0
    }

    /// The overlap rectangle, or `None` when the rectangles do not intersect.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect::new(
            self.x1.max(other.x1),
            self.y1.max(other.y1),
            self.x2.min(other.x2),
            self.y2.min(other.y2),
        ))
    }

    /// Area of the overlap rectangle, 0 if the rectangles do not intersect.
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let (w, h) = self.overlap_extent(other);
        w.max(0.0) * h.max(0.0)
    }

    /// Intersection over union.
    ///
    /// Returns 0 when the union area is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::Rect;
    ///
    /// let a = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// let b = Rect::new(5.0, 5.0, 95.0, 95.0);
    /// assert!((a.iou(&b) - 0.81).abs() < 1e-9);
    /// ```
    pub fn iou(&self, other: &Rect) -> f64 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }

    /// Fraction of `self`'s area covered by its overlap with `outer`.
    ///
    /// Unlike [`Rect::iou`] this ignores the size of `outer`: a small box
    /// fully swallowed by a huge one scores 1.0. Returns 0 when `self` has
    /// zero area.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::Rect;
    ///
    /// let small = Rect::new(10.0, 10.0, 20.0, 20.0);
    /// let page = Rect::new(0.0, 0.0, 1000.0, 1000.0);
    /// assert_eq!(small.containment_ratio(&page), 1.0);
    /// assert!(page.containment_ratio(&small) < 0.001);
    /// ```
    pub fn containment_ratio(&self, outer: &Rect) -> f64 {
        let area = self.area();
        if area > 0.0 {
            self.intersection_area(outer) / area
        } else {
            0.0
        }
    }

    /// Check whether `inner` lies within `self` expanded by `tolerance` on
    /// every side.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::Rect;
    ///
    /// let outer = Rect::new(10.0, 10.0, 100.0, 100.0);
    /// let jittered = Rect::new(8.0, 12.0, 101.0, 90.0);
    /// assert!(!outer.contains(&jittered, 0.0));
    /// assert!(outer.contains(&jittered, 2.0));
    /// ```
    pub fn contains(&self, inner: &Rect, tolerance: f64) -> bool {
        inner.x1 >= self.x1 - tolerance
            && inner.y1 >= self.y1 - tolerance
            && inner.x2 <= self.x2 + tolerance
            && inner.y2 <= self.y2 + tolerance
    }

    fn overlap_extent(&self, other: &Rect) -> (f64, f64) {
        (
            self.x2.min(other.x2) - self.x1.max(other.x1),
            self.y2.min(other.y2) - self.y1.max(other.y1),
        )
    }
}

impl From<[f64; 4]> for Rect {
    fn from(c: [f64; 4]) -> Self {
        Rect::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        r.coords()
    }
}
