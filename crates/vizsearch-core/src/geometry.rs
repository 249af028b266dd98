#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Scattered layouts work in visual-angle units around a fixation point at
//! the origin. Slot layouts work in display pixels on a ring.

use serde::Serialize;

/// A position relative to fixation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance from fixation.
    #[inline]
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Quadrant containing this point. Points on an axis belong to the
    /// non-negative side.
    #[inline]
    pub fn quadrant(&self) -> Quadrant {
        match (self.x < 0.0, self.y < 0.0) {
            (true, true) => Quadrant::BottomLeft,
            (false, true) => Quadrant::BottomRight,
            (true, false) => Quadrant::TopLeft,
            (false, false) => Quadrant::TopRight,
        }
    }
}

/// The four display quadrants, indexed 0..4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    BottomLeft = 0,
    BottomRight = 1,
    TopLeft = 2,
    TopRight = 3,
}

impl Quadrant {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A square centered on fixation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    half_width: f64,
}

impl Region {
    /// Square spanning `[-half_width, half_width]` on both axes.
    ///
    /// Returns `None` unless `half_width` is finite and positive.
    #[must_use]
    pub fn centered_square(half_width: f64) -> Option<Self> {
        (half_width.is_finite() && half_width > 0.0).then_some(Self { half_width })
    }

    #[inline]
    pub const fn half_width(&self) -> f64 {
        self.half_width
    }

    #[inline]
    pub fn contains(&self, point: &Point) -> bool {
        point.x.abs() <= self.half_width && point.y.abs() <= self.half_width
    }
}

/// Evenly spaced stimulus slots on a circle around fixation.
///
/// Slot `i` sits at `step / 2 + i * step - 90` degrees, so with twelve
/// slots the first one is at -75 degrees and the ring is symmetric about
/// the vertical midline: slots `0..n/2` fall on one side and `n/2..n` on
/// the other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotRing {
    slots: usize,
    radius: f64,
}

impl SlotRing {
    #[must_use]
    pub const fn new(slots: usize, radius: f64) -> Self {
        Self { slots, radius }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.slots
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.slots == 0
    }

    /// Angle of a slot in degrees.
    #[must_use]
    pub fn angle_deg(&self, slot: usize) -> f64 {
        let step = 360.0 / self.slots as f64;
        step / 2.0 + slot as f64 * step - 90.0
    }

    /// Display position of a slot, or `None` when out of range.
    #[must_use]
    pub fn position(&self, slot: usize) -> Option<Point> {
        if slot >= self.slots {
            return None;
        }
        let theta = self.angle_deg(slot).to_radians();
        Some(Point::new(
            self.radius * theta.cos(),
            self.radius * theta.sin(),
        ))
    }

    #[must_use]
    pub fn positions(&self) -> Vec<Point> {
        (0..self.slots).filter_map(|slot| self.position(slot)).collect()
    }
}
