//! Polygon outlines and convex polygon fill.
//!
//! The fill is a scanline walk in 16.16 fixed point: starting from the
//! topmost vertex, a left and a right edge are tracked by their x slope per
//! scanline, emitting one horizontal run per row and reseeding whichever
//! edge runs out first. The right-hand column of each run is left unpainted
//! so that adjacent polygons sharing an edge do not overdraw each other.

use crate::basics::{from_fixed, to_fixed, Coord, Point, FIXED0_5};
use crate::color::Color;
use crate::surface::{Display, Surface};

impl Surface {
    /// Fill a convex polygon whose vertices are relative to (`tx`,`ty`).
    /// Vertices may be in either winding order. Concave input paints
    /// something, but only the convex part is guaranteed.
    pub(crate) fn fill_convex_poly(
        &mut self,
        tx: Coord,
        ty: Coord,
        pts: &[Point],
        color: Color,
    ) {
        if pts.is_empty() {
            return;
        }
        let n = pts.len();
        let prev = |i: usize| if i == 0 { n - 1 } else { i - 1 };
        let next = |i: usize| if i == n - 1 { 0 } else { i + 1 };

        // Once every vertex has been consumed we are done.
        let mut cnt = n;

        let mut top = 0;
        for i in 1..n {
            if pts[i].y < pts[top].y {
                top = i;
            }
        }
        let mut lx = to_fixed(pts[top].x);
        let mut rx = lx;
        let mut y = pts[top].y;

        // Skip along any horizontal top edge to find the two slanted edges.
        let mut li = prev(top);
        while pts[li].y == y {
            if cnt == 0 {
                return;
            }
            lx = to_fixed(pts[li].x);
            li = prev(li);
            cnt -= 1;
        }
        let mut ri = next(top);
        while pts[ri].y == y {
            if cnt == 0 {
                return;
            }
            rx = to_fixed(pts[ri].x);
            ri = next(ri);
            cnt -= 1;
        }

        let mut lk = (to_fixed(pts[li].x) - lx) / (pts[li].y - y);
        let mut rk = (to_fixed(pts[ri].x) - rx) / (pts[ri].y - y);

        // Rounding correction.
        lx += FIXED0_5;
        rx += FIXED0_5;

        loop {
            let ymax = pts[ri].y.min(pts[li].y);

            while y < ymax {
                let lxc = from_fixed(lx);
                let rxc = from_fixed(rx);
                // The right-hand column stays unpainted for polygon joining.
                if lxc < rxc {
                    self.hline(tx + lxc, tx + rxc - 1, ty + y, color);
                } else if lxc > rxc {
                    self.hline(tx + rxc, tx + lxc - 1, ty + y, color);
                }
                lx += lk;
                rx += rk;
                y += 1;
            }

            if cnt == 0 {
                return;
            }
            cnt -= 1;

            // Reseed whichever edge ended, skipping horizontal segments.
            if ymax == pts[li].y {
                li = prev(li);
                while pts[li].y == y {
                    if cnt == 0 {
                        return;
                    }
                    lx = to_fixed(pts[li].x);
                    li = prev(li);
                    cnt -= 1;
                }
                lk = (to_fixed(pts[li].x) - lx) / (pts[li].y - y);
                lx += FIXED0_5;
            } else {
                ri = next(ri);
                while pts[ri].y == y {
                    if cnt == 0 {
                        return;
                    }
                    rx = to_fixed(pts[ri].x);
                    ri = next(ri);
                    cnt -= 1;
                }
                rk = (to_fixed(pts[ri].x) - rx) / (pts[ri].y - y);
                rx += FIXED0_5;
            }
        }
    }
}

impl Display {
    /// Draw the outline of a polygon whose vertices are relative to
    /// (`tx`,`ty`). The last vertex is joined back to the first.
    pub fn draw_poly(&self, tx: Coord, ty: Coord, pts: &[Point], color: Color) {
        if pts.len() < 2 {
            return;
        }
        let mut s = self.lock();
        for w in pts.windows(2) {
            s.line(
                tx + w[0].x,
                ty + w[0].y,
                tx + w[1].x,
                ty + w[1].y,
                color,
            );
        }
        let first = pts[0];
        let last = pts[pts.len() - 1];
        s.line(tx + last.x, ty + last.y, tx + first.x, ty + first.y, color);
        s.end_paint();
    }

    /// Fill a convex polygon whose vertices are relative to (`tx`,`ty`).
    pub fn fill_convex_poly(&self, tx: Coord, ty: Coord, pts: &[Point], color: Color) {
        let mut s = self.lock();
        s.fill_convex_poly(tx, ty, pts, color);
        s.end_paint();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::framebuffer_display;

    fn lit_count(fb: &[Color], w: Coord, color: Color) -> usize {
        let _ = w;
        fb.iter().filter(|&&c| c == color).count()
    }

    #[test]
    fn test_fill_rectangle_as_poly() {
        let (d, fb) = framebuffer_display(20, 20);
        let pts = [
            Point { x: 0, y: 0 },
            Point { x: 10, y: 0 },
            Point { x: 10, y: 6 },
            Point { x: 0, y: 6 },
        ];
        d.fill_convex_poly(2, 3, &pts, Color::RED);
        let fb = fb.lock();
        // Interior rows are painted; right column is left out for joining.
        assert_eq!(fb[4 * 20 + 2], Color::RED);
        assert_eq!(fb[4 * 20 + 11], Color::RED);
        assert_eq!(fb[4 * 20 + 12], Color::BLACK);
        assert_eq!(fb[3 * 20 + 5], Color::RED);
        assert_eq!(fb[2 * 20 + 5], Color::BLACK);
    }

    #[test]
    fn test_fill_triangle_covers_apex_columns() {
        let (d, fb) = framebuffer_display(32, 32);
        let pts = [
            Point { x: 8, y: 0 },
            Point { x: 16, y: 14 },
            Point { x: 0, y: 14 },
        ];
        d.fill_convex_poly(4, 4, &pts, Color::GREEN);
        let fb = fb.lock();
        // Widens monotonically from the apex.
        let mut last = 0;
        for y in 1..14 {
            let lit = lit_count(&fb[(4 + y) * 32..(5 + y) * 32], 32, Color::GREEN);
            assert!(lit >= last, "row {} narrower than previous", y);
            last = lit;
        }
        // Nothing outside the bounding box.
        for y in 0..32 {
            for x in 0..32 {
                if fb[y * 32 + x] == Color::GREEN {
                    assert!((4..=20).contains(&x) && (4..=18).contains(&y));
                }
            }
        }
    }

    #[test]
    fn test_fill_winding_order_irrelevant() {
        let cw = [
            Point { x: 0, y: 0 },
            Point { x: 12, y: 0 },
            Point { x: 12, y: 8 },
            Point { x: 0, y: 8 },
        ];
        let ccw = [
            Point { x: 0, y: 0 },
            Point { x: 0, y: 8 },
            Point { x: 12, y: 8 },
            Point { x: 12, y: 0 },
        ];
        let (a, fa) = framebuffer_display(20, 20);
        let (b, fbb) = framebuffer_display(20, 20);
        a.fill_convex_poly(1, 1, &cw, Color::BLUE);
        b.fill_convex_poly(1, 1, &ccw, Color::BLUE);
        assert_eq!(*fa.lock(), *fbb.lock());
    }

    #[test]
    fn test_draw_poly_closes_shape() {
        let (d, fb) = framebuffer_display(20, 20);
        let pts = [
            Point { x: 0, y: 0 },
            Point { x: 8, y: 0 },
            Point { x: 8, y: 8 },
            Point { x: 0, y: 8 },
        ];
        d.draw_poly(2, 2, &pts, Color::WHITE);
        let fb = fb.lock();
        // The closing edge from last back to first vertex is drawn.
        assert_eq!(fb[6 * 20 + 2], Color::WHITE);
        assert_eq!(fb[5 * 20 + 5], Color::BLACK);
    }

    #[test]
    fn test_degenerate_polys_draw_nothing() {
        let (d, fb) = framebuffer_display(20, 20);
        d.fill_convex_poly(0, 0, &[], Color::RED);
        d.fill_convex_poly(0, 0, &[Point { x: 3, y: 3 }], Color::RED);
        assert_eq!(lit_count(&fb.lock(), 20, Color::RED), 0);
    }
}
