//! Vector and axis-aligned rectangle geometry
//!
//! Vectors are `glam::DVec2` values; the helpers here cover the few
//! operations glam spells differently (angle rotation, safe division,
//! zero-preserving sign). `Rect` is the AABB every hitbox, hurtbox and
//! arena segment is expressed in.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Rotate `v` counter-clockwise by `angle` radians
#[inline]
pub fn rotate(v: DVec2, angle: f64) -> DVec2 {
    DVec2::from_angle(angle).rotate(v)
}

/// Divide by a scalar; dividing by zero leaves the vector unchanged
#[inline]
pub fn safe_div(v: DVec2, scalar: f64) -> DVec2 {
    if scalar == 0.0 { v } else { v / scalar }
}

/// Sign of `value`, with zero mapping to zero (unlike `f64::signum`)
#[inline]
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Scalar linear interpolation
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Component-wise clamp that tolerates inverted bounds
#[inline]
pub fn clamp_vec(v: DVec2, min: DVec2, max: DVec2) -> DVec2 {
    DVec2::new(v.x.max(min.x).min(max.x), v.y.max(min.y).min(max.y))
}

/// Axis-aligned rectangle, origin at the top-left corner, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of `size` centered on `center`
    pub fn from_center(center: DVec2, size: DVec2) -> Self {
        Self::new(
            center.x - size.x / 2.0,
            center.y - size.y / 2.0,
            size.x,
            size.y,
        )
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }

    /// Open-interval overlap test: rectangles sharing only an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Closed containment test
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Area of the intersection, zero when disjoint
    pub fn overlap(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.left().max(other.left());
        let h = self.bottom().min(other.bottom()) - self.top().max(other.top());
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }

    /// Minimum translation that moves `other` out of `self`.
    ///
    /// Resolves along the axis of least overlap. The sign follows the
    /// relative centers, so adding the result to `other`'s position pushes
    /// it away from `self`. Returns zero when the rectangles do not intersect.
    pub fn penetration(&self, other: &Rect) -> DVec2 {
        if !self.intersects(other) {
            return DVec2::ZERO;
        }

        let overlap_x = (self.right() - other.left()).min(other.right() - self.left());
        let overlap_y = (self.bottom() - other.top()).min(other.bottom() - self.top());
        let center = self.center();
        let other_center = other.center();

        if overlap_x < overlap_y {
            if other_center.x < center.x {
                DVec2::new(-overlap_x, 0.0)
            } else {
                DVec2::new(overlap_x, 0.0)
            }
        } else if other_center.y < center.y {
            DVec2::new(0.0, -overlap_y)
        } else {
            DVec2::new(0.0, overlap_y)
        }
    }

    pub fn translate(&self, delta: DVec2) -> Rect {
        Rect::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    /// Scale about the center
    pub fn scale(&self, factor: f64) -> Rect {
        Rect::from_center(self.center(), self.size() * factor)
    }

    /// Grow (or shrink, for a negative margin) by `margin` on every side
    pub fn expand(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            (self.width + margin * 2.0).max(0.0),
            (self.height + margin * 2.0).max(0.0),
        )
    }
}
