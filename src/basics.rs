//! Foundation types: coordinates, points, rectangles and 16.16 fixed point.
//!
//! Everything in the rendering core works in integer device coordinates.
//! Where sub-pixel precision is needed (polygon edges, arc boundary lines)
//! values are carried as 16.16 fixed point.

// ============================================================================
// Coordinates
// ============================================================================

/// Device coordinate. Signed so that partially off-screen shapes clip
/// naturally instead of wrapping.
pub type Coord = i32;

/// A point in device coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle: origin plus extent.
///
/// A rectangle with non-positive `cx` or `cy` is empty.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: Coord,
    pub y: Coord,
    pub cx: Coord,
    pub cy: Coord,
}

impl Rect {
    pub const fn new(x: Coord, y: Coord, cx: Coord, cy: Coord) -> Self {
        Self { x, y, cx, cy }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cx <= 0 || self.cy <= 0
    }

    /// One past the right-most column.
    #[inline]
    pub fn right(&self) -> Coord {
        self.x + self.cx
    }

    /// One past the bottom-most row.
    #[inline]
    pub fn bottom(&self) -> Coord {
        self.y + self.cy
    }

    #[inline]
    pub fn area(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.cx as u32 * self.cy as u32
        }
    }
}

// ============================================================================
// 16.16 fixed point
// ============================================================================

/// 16.16 fixed point value.
pub type Fixed = i32;

/// 0.5 in 16.16 fixed point, used for round-to-nearest.
pub const FIXED0_5: Fixed = 1 << 15;

/// Convert an integer coordinate to 16.16 fixed point.
#[inline]
pub fn to_fixed(v: Coord) -> Fixed {
    v << 16
}

/// Truncate a 16.16 fixed point value back to an integer coordinate.
#[inline]
pub fn from_fixed(v: Fixed) -> Coord {
    v >> 16
}

/// Convert a float to 16.16 fixed point.
#[inline]
pub fn float_to_fixed(v: f64) -> Fixed {
    (v * 65536.0) as Fixed
}

/// Round a float to the nearest integer, away from zero on ties.
#[inline]
pub fn iround(v: f64) -> i32 {
    if v < 0.0 {
        (v - 0.5) as i32
    } else {
        (v + 0.5) as i32
    }
}

/// Integer division rounding to nearest instead of toward zero.
#[inline]
pub fn rounding_div(n: i32, d: i32) -> i32 {
    if (n < 0) != (d < 0) {
        (n - d / 2) / d
    } else {
        (n + d / 2) / d
    }
}

/// Sine of an angle in degrees.
#[inline]
pub fn sin_deg(deg: i32) -> f64 {
    libm::sin(deg as f64 * core::f64::consts::PI / 180.0)
}

/// Cosine of an angle in degrees.
#[inline]
pub fn cos_deg(deg: i32) -> f64 {
    libm::cos(deg as f64 * core::f64::consts::PI / 180.0)
}

// ============================================================================
// Tests
// ============================================================================
