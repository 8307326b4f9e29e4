//! Line and box drawing.
//!
//! General lines are Bresenham walks over clipped pixels; horizontal and
//! vertical cases collapse to the run primitives. Thick lines are built as
//! filled convex polygons around the line's normal vector, with optional
//! octagonal end caps approximating round ends without trigonometry.

use crate::basics::{rounding_div, Coord, Point, Rect};
use crate::color::Color;
use crate::surface::{Display, Surface};

impl Surface {
    /// Clipped line between two inclusive endpoints.
    pub(crate) fn line(&mut self, x0: Coord, y0: Coord, x1: Coord, y1: Coord, color: Color) {
        if y0 == y1 {
            self.hline(x0, x1, y0, color);
            return;
        }
        if x0 == x1 {
            self.vline(x0, y0, y1, color);
            return;
        }

        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let addx = if x1 >= x0 { 1 } else { -1 };
        let addy = if y1 >= y0 { 1 } else { -1 };

        let mut x = x0;
        let mut y = y0;

        if dx >= dy {
            let mut p = 2 * dy - dx;
            let diff = p - dx;
            for _ in 0..=dx {
                self.draw_pixel_clipped(x, y, color);
                if p < 0 {
                    p += 2 * dy;
                    x += addx;
                } else {
                    p += diff;
                    x += addx;
                    y += addy;
                }
            }
        } else {
            let mut p = 2 * dx - dy;
            let diff = p - dy;
            for _ in 0..=dy {
                self.draw_pixel_clipped(x, y, color);
                if p < 0 {
                    p += 2 * dx;
                    y += addy;
                } else {
                    p += diff;
                    x += addx;
                    y += addy;
                }
            }
        }
    }
}

impl Display {
    /// Draw a one-pixel line between two inclusive endpoints.
    pub fn draw_line(&self, x0: Coord, y0: Coord, x1: Coord, y1: Coord, color: Color) {
        let mut s = self.lock();
        s.line(x0, y0, x1, y1, color);
        s.end_paint();
    }

    /// Draw the one-pixel outline of a rectangle.
    pub fn draw_box(&self, rect: Rect, color: Color) {
        if rect.is_empty() {
            return;
        }
        let x = rect.x;
        let mut y = rect.y;
        let x1 = rect.x + rect.cx - 1;
        let mut y1 = rect.y + rect.cy - 1;

        let mut s = self.lock();
        if x1 - x > 2 {
            s.hline(x, x1, y, color);
            if y != y1 {
                s.hline(x, x1, y1, color);
                if y1 - y > 2 {
                    y += 1;
                    y1 -= 1;
                    s.vline(x, y, y1, color);
                    s.vline(x1, y, y1, color);
                }
            }
        } else {
            s.vline(x, y, y1, color);
            if x != x1 {
                s.vline(x1, y, y1, color);
            }
        }
        s.end_paint();
    }

    /// Draw a line of the given pixel width. With `round` the ends are
    /// octagonal caps centered on the endpoints, otherwise square caps
    /// flush with them.
    pub fn draw_thick_line(
        &self,
        mut x0: Coord,
        mut y0: Coord,
        x1: Coord,
        y1: Coord,
        color: Color,
        width: Coord,
        round: bool,
    ) {
        let mut dx = x1 - x0;
        let mut dy = y1 - y0;

        // A zero-length line still draws a dot.
        if dx == 0 && dy == 0 {
            dx = 1;
        }

        let (mut nx, ny) = normal_vector(dx, dy, width);
        if nx == 0 && ny == 0 {
            nx = 1;
        }

        // Center the stroke on the ideal line even when the width is odd.
        x0 -= rounding_div(nx, 2);
        y0 -= rounding_div(ny, 2);

        if !round {
            let pts = [
                Point { x: 0, y: 0 },
                Point { x: nx, y: ny },
                Point { x: dx + nx, y: dy + ny },
                Point { x: dx, y: dy },
            ];
            let mut s = self.lock();
            s.fill_convex_poly(x0, y0, &pts, color);
            s.end_paint();
        } else {
            // Octagonal caps. Scale factors over 256:
            //   75  = sin(45) / (1 + sqrt(2))   diagonal segment
            //   106 = 1 / (1 + sqrt(2))         octagon side
            //   53  = half of an octagon side
            //   150 = octagon height minus one side
            let nx2 = rounding_div(nx * 75 + ny * 75, 256);
            let ny2 = rounding_div(-nx * 75 + ny * 75, 256);

            // Shift so the cap octagons are centered on the endpoints.
            x0 += ny * 53 / 256;
            y0 -= nx * 53 / 256;
            dx -= ny * 106 / 256;
            dy += nx * 106 / 256;

            let pts = [
                Point { x: 0, y: 0 },
                Point { x: nx2, y: ny2 },
                Point { x: nx2 + nx * 106 / 256, y: ny2 + ny * 106 / 256 },
                Point { x: nx, y: ny },
                Point { x: dx + nx, y: dy + ny },
                Point { x: dx + nx - nx2, y: dy + ny - ny2 },
                Point { x: dx + nx * 150 / 256 - nx2, y: dy + ny * 150 / 256 - ny2 },
                Point { x: dx, y: dy },
            ];
            let mut s = self.lock();
            s.fill_convex_poly(x0, y0, &pts, color);
            s.end_paint();
        }
    }
}

/// Compute a vector normal to (`dx`,`dy`) with length `norm`, using only
/// integer arithmetic.
fn normal_vector(dx: Coord, dy: Coord, norm: Coord) -> (Coord, Coord) {
    let mut dx2 = dx as i64;
    let mut dy2 = dy as i64;
    let norm_sq = norm as i64 * norm as i64;
    // Extra factor of 512 buys accuracy in the division below.
    let norm_sq2 = norm_sq * 512;

    // Scale so that len_sq / 2 <= norm_sq * 512 <= len_sq * 2.
    let mut len_sq = dx2 * dx2 + dy2 * dy2;
    if len_sq < norm_sq2 {
        while len_sq != 0 && len_sq < norm_sq2 {
            len_sq <<= 2;
            dx2 <<= 1;
            dy2 <<= 1;
        }
    } else {
        while len_sq != 0 && len_sq > norm_sq2 {
            len_sq >>= 2;
            dx2 >>= 1;
            dy2 >>= 1;
        }
    }

    // Bisection search for div = sqrt(len_sq / norm_sq). The scaling above
    // bounds it to the range 16..=32.
    let mut div: i64 = 24;
    let mut step: i64 = 8;
    let mut best: i64 = 256;
    let mut nx: Coord = 0;
    let mut ny: Coord = 0;

    loop {
        let dx = dx2 / div;
        let dy = dy2 / div;
        let len_sq = dx * dx + dy * dy;
        let delta = len_sq - norm_sq;
        let abs_delta = delta.abs();

        if abs_delta < best {
            nx = dy as Coord;
            ny = -dx as Coord;
            best = abs_delta;
        }

        if delta > 0 {
            div += step;
        } else if delta < 0 {
            div -= step;
        } else {
            break;
        }

        if step == 0 {
            break;
        }
        // One final round with step 0 refines the last candidate.
        step >>= 1;
    }

    (nx, ny)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::framebuffer_display;

    #[test]
    fn test_horizontal_line_pixels() {
        let (d, fb) = framebuffer_display(16, 16);
        d.draw_line(2, 5, 9, 5, Color::RED);
        let fb = fb.lock();
        for x in 2..=9 {
            assert_eq!(fb[5 * 16 + x], Color::RED);
        }
        assert_eq!(fb[5 * 16 + 1], Color::BLACK);
        assert_eq!(fb[5 * 16 + 10], Color::BLACK);
    }

    #[test]
    fn test_line_endpoint_order_irrelevant() {
        let (a, fa) = framebuffer_display(16, 16);
        let (b, fbb) = framebuffer_display(16, 16);
        a.draw_line(1, 2, 12, 9, Color::WHITE);
        b.draw_line(12, 9, 1, 2, Color::WHITE);
        assert_eq!(*fa.lock(), *fbb.lock());
    }

    #[test]
    fn test_diagonal_line_hits_endpoints() {
        let (d, fb) = framebuffer_display(16, 16);
        d.draw_line(0, 0, 10, 7, Color::GREEN);
        let fb = fb.lock();
        assert_eq!(fb[0], Color::GREEN);
        assert_eq!(fb[7 * 16 + 10], Color::GREEN);
        // One pixel per column for a shallow line.
        for x in 0..=10 {
            let lit = (0..16).filter(|y| fb[y * 16 + x] == Color::GREEN).count();
            assert_eq!(lit, 1, "column {}", x);
        }
    }

    #[test]
    fn test_line_clipped_to_region() {
        let (d, fb) = framebuffer_display(16, 16);
        d.set_clip(Rect::new(4, 4, 4, 4));
        d.draw_line(0, 0, 15, 15, Color::RED);
        let fb = fb.lock();
        for y in 0..16 {
            for x in 0..16 {
                let inside = (4..8).contains(&x) && (4..8).contains(&y);
                let lit = fb[y * 16 + x] == Color::RED;
                assert!(!lit || inside, "pixel {},{} escaped the clip", x, y);
            }
        }
        assert_eq!(fb[4 * 16 + 4], Color::RED);
    }

    #[test]
    fn test_box_outline_only() {
        let (d, fb) = framebuffer_display(16, 16);
        d.draw_box(Rect::new(2, 2, 6, 5), Color::BLUE);
        let fb = fb.lock();
        for x in 2..8 {
            assert_eq!(fb[2 * 16 + x], Color::BLUE);
            assert_eq!(fb[6 * 16 + x], Color::BLUE);
        }
        for y in 2..7 {
            assert_eq!(fb[y * 16 + 2], Color::BLUE);
            assert_eq!(fb[y * 16 + 7], Color::BLUE);
        }
        assert_eq!(fb[4 * 16 + 4], Color::BLACK);
    }

    #[test]
    fn test_degenerate_boxes() {
        let (d, fb) = framebuffer_display(16, 16);
        d.draw_box(Rect::new(3, 3, 1, 1), Color::RED);
        assert_eq!(fb.lock()[3 * 16 + 3], Color::RED);
        d.draw_box(Rect::new(5, 5, 0, 4), Color::RED);
        assert_eq!(fb.lock()[5 * 16 + 5], Color::BLACK);
    }

    #[test]
    fn test_normal_vector_length() {
        for &(dx, dy, w) in &[(10, 0, 4), (0, 10, 4), (7, 7, 5), (100, 3, 8), (-5, 12, 3)] {
            let (nx, ny) = normal_vector(dx, dy, w);
            let len = ((nx * nx + ny * ny) as f64).sqrt();
            assert!(
                (len - w as f64).abs() <= 1.5,
                "normal of ({},{}) width {} came out {},{} (len {})",
                dx,
                dy,
                w,
                nx,
                ny,
                len
            );
            // Close to perpendicular; integer scaling may leave a small skew.
            let dot = (nx * dx + ny * dy).abs();
            assert!(
                dot <= dx.abs() + dy.abs(),
                "normal of ({},{}) too skewed (dot {})",
                dx,
                dy,
                dot
            );
        }
    }

    #[test]
    fn test_thick_horizontal_line_covers_width() {
        let (d, fb) = framebuffer_display(32, 32);
        d.draw_thick_line(4, 16, 27, 16, Color::WHITE, 5, false);
        let fb = fb.lock();
        // Middle column should be the requested width tall.
        let lit = (0..32).filter(|y| fb[y * 32 + 15] == Color::WHITE).count();
        assert!((4..=6).contains(&lit), "stroke width came out {}", lit);
    }
}
