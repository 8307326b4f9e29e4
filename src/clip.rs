//! Software clip rectangle.
//!
//! Each surface carries one active clip rectangle, stored as half-open
//! bounds (`x1`/`y1` are one past the last drawable column/row). Every
//! primitive is intersected against it before dispatch; the helpers here
//! adjust the primitive's coordinates in place and report whether anything
//! is left to draw.

use crate::basics::{Coord, Rect};

/// Active clip region, always a subset of the surface bounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Clip {
    pub x0: Coord,
    pub y0: Coord,
    /// Exclusive.
    pub x1: Coord,
    /// Exclusive.
    pub y1: Coord,
}

impl Clip {
    /// The whole surface.
    pub fn full(width: Coord, height: Coord) -> Clip {
        Clip {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    /// Install a new clip rectangle, intersected with the surface bounds.
    /// Degenerate input collapses to the empty rectangle.
    pub fn set(&mut self, r: Rect, width: Coord, height: Coord) {
        let mut x = r.x;
        let mut y = r.y;
        let mut cx = r.cx;
        let mut cy = r.cy;

        if x < 0 {
            cx += x;
            x = 0;
        }
        if y < 0 {
            cy += y;
            y = 0;
        }
        if cx <= 0 || cy <= 0 || x >= width || y >= height {
            x = 0;
            y = 0;
            cx = 0;
            cy = 0;
        }
        self.x0 = x;
        self.y0 = y;
        self.x1 = (x + cx).min(width);
        self.y1 = (y + cy).min(height);
    }

    #[inline]
    pub fn contains(&self, x: Coord, y: Coord) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// True when the whole rectangle lies inside the clip region.
    pub fn contains_rect(&self, r: &Rect) -> bool {
        r.x >= self.x0 && r.x + r.cx <= self.x1 && r.y >= self.y0 && r.y + r.cy <= self.y1
    }

    /// Clamp an inclusive horizontal span at row `y`. Returns the clipped
    /// endpoints, or `None` when nothing survives.
    pub fn clamp_hspan(&self, y: Coord, x0: Coord, x1: Coord) -> Option<(Coord, Coord)> {
        if y < self.y0 || y >= self.y1 {
            return None;
        }
        let x0 = x0.max(self.x0);
        let x1 = x1.min(self.x1 - 1);
        if x1 < x0 {
            None
        } else {
            Some((x0, x1))
        }
    }

    /// Clamp an inclusive vertical span at column `x`.
    pub fn clamp_vspan(&self, x: Coord, y0: Coord, y1: Coord) -> Option<(Coord, Coord)> {
        if x < self.x0 || x >= self.x1 {
            return None;
        }
        let y0 = y0.max(self.y0);
        let y1 = y1.min(self.y1 - 1);
        if y1 < y0 {
            None
        } else {
            Some((y0, y1))
        }
    }

    /// Intersect an area with the clip region.
    pub fn clip_area(&self, mut r: Rect) -> Option<Rect> {
        if r.x < self.x0 {
            r.cx -= self.x0 - r.x;
            r.x = self.x0;
        }
        if r.y < self.y0 {
            r.cy -= self.y0 - r.y;
            r.y = self.y0;
        }
        if r.x + r.cx > self.x1 {
            r.cx = self.x1 - r.x;
        }
        if r.y + r.cy > self.y1 {
            r.cy = self.y1 - r.y;
        }
        if r.is_empty() {
            None
        } else {
            Some(r)
        }
    }

    /// Intersect a blit destination with the clip region, shifting the
    /// source origin by the same amount the destination moved.
    pub fn clip_blit(
        &self,
        mut r: Rect,
        mut src_x: Coord,
        mut src_y: Coord,
    ) -> Option<(Rect, Coord, Coord)> {
        if r.x < self.x0 {
            let d = self.x0 - r.x;
            r.cx -= d;
            src_x += d;
            r.x = self.x0;
        }
        if r.y < self.y0 {
            let d = self.y0 - r.y;
            r.cy -= d;
            src_y += d;
            r.y = self.y0;
        }
        if r.x + r.cx > self.x1 {
            r.cx = self.x1 - r.x;
        }
        if r.y + r.cy > self.y1 {
            r.cy = self.y1 - r.y;
        }
        if r.is_empty() {
            None
        } else {
            Some((r, src_x, src_y))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clamps_to_bounds() {
        let mut c = Clip::full(100, 80);
        c.set(Rect::new(-10, -10, 200, 200), 100, 80);
        assert_eq!(c, Clip::full(100, 80));
    }

    #[test]
    fn test_set_degenerate_collapses_to_empty() {
        let mut c = Clip::full(100, 80);
        c.set(Rect::new(10, 10, 0, 5), 100, 80);
        assert_eq!((c.x0, c.y0, c.x1, c.y1), (0, 0, 0, 0));
        c.set(Rect::new(150, 10, 5, 5), 100, 80);
        assert_eq!((c.x0, c.y0, c.x1, c.y1), (0, 0, 0, 0));
    }

    #[test]
    fn test_set_full_bounds_idempotent() {
        let mut c = Clip::full(100, 80);
        c.set(Rect::new(0, 0, 100, 80), 100, 80);
        let once = c;
        c.set(Rect::new(0, 0, 100, 80), 100, 80);
        assert_eq!(c, once);
    }

    #[test]
    fn test_hspan_clamping() {
        let mut c = Clip::full(100, 80);
        c.set(Rect::new(10, 10, 20, 20), 100, 80);
        assert_eq!(c.clamp_hspan(15, 0, 99), Some((10, 29)));
        assert_eq!(c.clamp_hspan(9, 0, 99), None);
        assert_eq!(c.clamp_hspan(30, 0, 99), None);
        assert_eq!(c.clamp_hspan(15, 40, 50), None);
    }

    #[test]
    fn test_vspan_clamping() {
        let mut c = Clip::full(100, 80);
        c.set(Rect::new(10, 10, 20, 20), 100, 80);
        assert_eq!(c.clamp_vspan(15, 0, 99), Some((10, 29)));
        assert_eq!(c.clamp_vspan(9, 0, 99), None);
        assert_eq!(c.clamp_vspan(15, 35, 60), None);
    }

    #[test]
    fn test_clip_area() {
        let mut c = Clip::full(100, 80);
        c.set(Rect::new(10, 10, 20, 20), 100, 80);
        assert_eq!(
            c.clip_area(Rect::new(0, 0, 100, 80)),
            Some(Rect::new(10, 10, 20, 20))
        );
        assert_eq!(c.clip_area(Rect::new(50, 50, 10, 10)), None);
    }

    #[test]
    fn test_clip_blit_shifts_source() {
        let mut c = Clip::full(100, 80);
        c.set(Rect::new(10, 10, 20, 20), 100, 80);
        let (r, sx, sy) = c.clip_blit(Rect::new(5, 8, 10, 10), 0, 0).unwrap();
        assert_eq!(r, Rect::new(10, 10, 5, 8));
        assert_eq!((sx, sy), (5, 2));
    }

    #[test]
    fn test_contains_rect() {
        let c = Clip::full(100, 80);
        assert!(c.contains_rect(&Rect::new(0, 0, 100, 80)));
        assert!(!c.contains_rect(&Rect::new(0, 0, 101, 80)));
        assert!(!c.contains_rect(&Rect::new(-1, 0, 10, 10)));
    }
}
