//! Axis-aligned rectangles on top of `glam` vectors.
//!
//! Rectangles are closed: edges and corners belong to the rectangle, so two
//! rectangles that only touch still intersect. The y axis grows downward, so
//! the "top" half of a frame is the one with the smaller y values.

use glam::DVec2;

use crate::QuadTreeError;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub origin: DVec2,
    pub size: DVec2,
}

impl Default for Rect {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: DVec2::ZERO,
        size: DVec2::ZERO,
    };

    /// The "no rectangle" value. It intersects nothing and is never stored.
    pub const NULL: Rect = Rect {
        origin: DVec2::INFINITY,
        size: DVec2::ZERO,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: DVec2::new(x, y),
            size: DVec2::new(width, height),
        }
    }

    pub fn from_origin_size(origin: DVec2, size: DVec2) -> Self {
        Self { origin, size }
    }

    pub fn from_min_max(min: DVec2, max: DVec2) -> Self {
        Self {
            origin: min,
            size: max - min,
        }
    }

    #[inline]
    pub fn min(&self) -> DVec2 {
        self.origin
    }

    #[inline]
    pub fn max(&self) -> DVec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    #[inline]
    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    #[inline]
    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.x
    }

    #[inline]
    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.size.y
    }

    /// Length of the shorter side.
    pub fn min_side(&self) -> f64 {
        self.size.min_element()
    }

    pub fn is_null(&self) -> bool {
        self.origin.x.is_infinite() || self.origin.y.is_infinite()
    }

    pub fn is_infinite(&self) -> bool {
        !self.is_null() && !self.size.is_finite()
    }

    /// True when every corner has finite coordinates.
    pub fn is_finite(&self) -> bool {
        self.origin.is_finite() && self.size.is_finite() && self.max().is_finite()
    }

    /// Null and infinite rectangles are well formed but have no usable extent.
    pub fn is_degenerate(&self) -> bool {
        self.is_null() || self.is_infinite()
    }

    /// Rejects NaN coordinates and negative sizes.
    pub fn validate(&self) -> Result<(), QuadTreeError> {
        if self.origin.is_nan() || self.size.is_nan() {
            return Err(QuadTreeError::InvalidGeometry {
                rect: *self,
                reason: "coordinates must not be NaN",
            });
        }
        if self.size.x < 0.0 || self.size.y < 0.0 {
            return Err(QuadTreeError::InvalidGeometry {
                rect: *self,
                reason: "size must not be negative",
            });
        }
        Ok(())
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        self.min_x() <= other.max_x()
            && other.min_x() <= self.max_x()
            && self.min_y() <= other.max_y()
            && other.min_y() <= self.max_y()
    }

    /// True when `other` lies entirely inside `self`, edges included.
    pub fn contains(&self, other: &Rect) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        self.min_x() <= other.min_x()
            && self.min_y() <= other.min_y()
            && other.max_x() <= self.max_x()
            && other.max_y() <= self.max_y()
    }

    /// The overlapping region, or [`Rect::NULL`] when the two are disjoint.
    pub fn intersection(&self, other: &Rect) -> Rect {
        if !self.intersects(other) {
            return Rect::NULL;
        }
        Rect::from_min_max(self.min().max(other.min()), self.max().min(other.max()))
    }

    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_null() {
            return *other;
        }
        if other.is_null() {
            return *self;
        }
        Rect::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    pub fn offset(&self, delta: DVec2) -> Rect {
        Rect {
            origin: self.origin + delta,
            size: self.size,
        }
    }

    /// Splits the rectangle into its four quadrants, ordered top-left,
    /// top-right, bottom-left, bottom-right.
    pub fn quarters(&self) -> [Rect; 4] {
        let half = self.size * 0.5;
        let tl = Rect::from_origin_size(self.origin, half);
        [
            tl,
            tl.offset(DVec2::new(half.x, 0.0)),
            tl.offset(DVec2::new(0.0, half.y)),
            tl.offset(half),
        ]
    }
}
