//! Circles and ellipses, by Bresenham midpoint walks.

use crate::basics::Coord;
use crate::color::Color;
use crate::surface::{Display, Surface};

impl Surface {
    pub(crate) fn draw_circle(&mut self, x: Coord, y: Coord, radius: Coord, color: Color) {
        let mut a: Coord = 1;
        let mut b = radius;
        let mut p = 4 - radius;

        // The four cardinal points, then one octant mirrored eight ways.
        self.draw_pixel_clipped(x, y + b, color);
        self.draw_pixel_clipped(x, y - b, color);
        self.draw_pixel_clipped(x + b, y, color);
        self.draw_pixel_clipped(x - b, y, color);
        loop {
            self.draw_pixel_clipped(x + a, y + b, color);
            self.draw_pixel_clipped(x + a, y - b, color);
            self.draw_pixel_clipped(x + b, y + a, color);
            self.draw_pixel_clipped(x - b, y + a, color);
            self.draw_pixel_clipped(x - a, y + b, color);
            self.draw_pixel_clipped(x - a, y - b, color);
            self.draw_pixel_clipped(x + b, y - a, color);
            self.draw_pixel_clipped(x - b, y - a, color);
            if p < 0 {
                p += 3 + 2 * a;
                a += 1;
            } else {
                p += 5 + 2 * (a - b);
                a += 1;
                b -= 1;
            }
            if a >= b {
                break;
            }
        }
        self.draw_pixel_clipped(x + a, y + b, color);
        self.draw_pixel_clipped(x + a, y - b, color);
        self.draw_pixel_clipped(x - a, y + b, color);
        self.draw_pixel_clipped(x - a, y - b, color);
    }

    pub(crate) fn fill_circle(&mut self, x: Coord, y: Coord, radius: Coord, color: Color) {
        let mut a: Coord = 1;
        let mut b = radius;
        let mut p = 4 - radius;

        // Emit a run only when a coordinate is about to change, so rows are
        // painted exactly once.
        self.hline(x - b, x + b, y, color);
        self.draw_pixel_clipped(x, y + b, color);
        self.draw_pixel_clipped(x, y - b, color);
        loop {
            self.hline(x - b, x + b, y + a, color);
            self.hline(x - b, x + b, y - a, color);
            if p < 0 {
                p += 3 + 2 * a;
                a += 1;
            } else {
                self.hline(x - a, x + a, y + b, color);
                self.hline(x - a, x + a, y - b, color);
                p += 5 + 2 * (a - b);
                a += 1;
                b -= 1;
            }
            if a >= b {
                break;
            }
        }
        self.hline(x - b, x + b, y + a, color);
        self.hline(x - b, x + b, y - a, color);
    }

    pub(crate) fn draw_ellipse(
        &mut self,
        x: Coord,
        y: Coord,
        a: Coord,
        b: Coord,
        color: Color,
    ) {
        let mut dx: Coord = 0;
        let mut dy = b;
        let a2 = a as i64 * a as i64;
        let b2 = b as i64 * b as i64;
        let mut err = b2 - (2 * b as i64 - 1) * a2;

        loop {
            self.draw_pixel_clipped(x + dx, y + dy, color);
            self.draw_pixel_clipped(x - dx, y + dy, color);
            self.draw_pixel_clipped(x - dx, y - dy, color);
            self.draw_pixel_clipped(x + dx, y - dy, color);

            let e2 = 2 * err;
            if e2 < (2 * dx as i64 + 1) * b2 {
                dx += 1;
                err += (2 * dx as i64 + 1) * b2;
            }
            if e2 > -(2 * dy as i64 - 1) * a2 {
                dy -= 1;
                err -= (2 * dy as i64 - 1) * a2;
            }
            if dy < 0 {
                break;
            }
        }
    }

    pub(crate) fn fill_ellipse(
        &mut self,
        x: Coord,
        y: Coord,
        a: Coord,
        b: Coord,
        color: Color,
    ) {
        let mut dx: Coord = 0;
        let mut dy = b;
        let a2 = a as i64 * a as i64;
        let b2 = b as i64 * b as i64;
        let mut err = b2 - (2 * b as i64 - 1) * a2;

        loop {
            let e2 = 2 * err;
            if e2 < (2 * dx as i64 + 1) * b2 {
                dx += 1;
                err += (2 * dx as i64 + 1) * b2;
            }
            if e2 > -(2 * dy as i64 - 1) * a2 {
                self.hline(x - dx, x + dx, y + dy, color);
                // The center row has no distinct mirror.
                if dy != 0 {
                    self.hline(x - dx, x + dx, y - dy, color);
                }
                dy -= 1;
                err -= (2 * dy as i64 - 1) * a2;
            }
            if dy < 0 {
                break;
            }
        }
    }
}

impl Display {
    /// Draw the one-pixel outline of a circle.
    pub fn draw_circle(&self, x: Coord, y: Coord, radius: Coord, color: Color) {
        let mut s = self.lock();
        s.draw_circle(x, y, radius, color);
        s.end_paint();
    }

    /// Fill a circle.
    pub fn fill_circle(&self, x: Coord, y: Coord, radius: Coord, color: Color) {
        let mut s = self.lock();
        s.fill_circle(x, y, radius, color);
        s.end_paint();
    }

    /// Draw the one-pixel outline of an axis-aligned ellipse with
    /// half-axes `a` and `b`.
    pub fn draw_ellipse(&self, x: Coord, y: Coord, a: Coord, b: Coord, color: Color) {
        let mut s = self.lock();
        s.draw_ellipse(x, y, a, b, color);
        s.end_paint();
    }

    /// Fill an axis-aligned ellipse with half-axes `a` and `b`.
    pub fn fill_ellipse(&self, x: Coord, y: Coord, a: Coord, b: Coord, color: Color) {
        let mut s = self.lock();
        s.fill_ellipse(x, y, a, b, color);
        s.end_paint();
    }
}

// ============================================================================
// Tests
// ============================================================================
