//! Streaming pixel delivery.
//!
//! A [`DisplayStream`] walks a destination window in row-major order and
//! accepts one color per pixel, so a decoder can push pixels as it produces
//! them without buffering a frame. The session holds the surface lock for
//! its whole lifetime and is closed by [`end`](DisplayStream::end) or by
//! drop, which flushes anything still pending.
//!
//! The delivery path is picked once at session start: a hardware write
//! window when the driver streams natively, otherwise the pixels are
//! batched through the line buffer into blits, coalesced into fill runs,
//! or written one by one, depending on what the driver can do.

use spin::MutexGuard;

use crate::basics::{Coord, Rect};
use crate::color::Color;
use crate::dispatch::{BlitTier, FillTier};
use crate::driver::{AreaOp, BlitOp, PixelOp};
use crate::surface::{Display, Surface, LINEBUF_SIZE};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum StreamMode {
    /// Driver write window, one `write_color` per pixel.
    Hardware,
    /// Batch into the line buffer, emit as blits.
    LineBuf,
    /// Coalesce equal-colored runs, emit as fills.
    Runs,
    /// One driver pixel per fed pixel.
    Pixel,
}

struct Session {
    mode: StreamMode,
    /// Current cursor.
    x: Coord,
    y: Coord,
    /// Window origin and exclusive end.
    x1: Coord,
    y1: Coord,
    x2: Coord,
    y2: Coord,
    /// LineBuf: pixels buffered ahead of the cursor.
    buffered: usize,
    /// Runs: length and color of the pending run.
    run_len: Coord,
    run_color: Color,
}

/// An open streaming session on a display.
pub struct DisplayStream<'a> {
    surface: MutexGuard<'a, Surface>,
    session: Option<Session>,
}

impl Display {
    /// Open a streaming session over `rect`.
    ///
    /// The window must lie entirely inside the active clip region; if it
    /// does not, the session opens inert and every fed pixel is discarded.
    pub fn stream(&self, rect: Rect) -> DisplayStream<'_> {
        let mut surface = self.lock();
        if rect.is_empty()
            || !(surface.strategy.hw_clip || surface.clip.contains_rect(&rect))
        {
            return DisplayStream {
                surface,
                session: None,
            };
        }

        let mode = if surface.strategy.stream_write {
            surface.close_screen_window();
            surface.driver.write_start(rect);
            if surface.strategy.cursor {
                surface.driver.write_pos(rect.x, rect.y);
            }
            StreamMode::Hardware
        } else {
            match surface.strategy.blit {
                BlitTier::Hardware => StreamMode::LineBuf,
                _ => match surface.strategy.fill {
                    FillTier::Hardware => StreamMode::Runs,
                    _ => StreamMode::Pixel,
                },
            }
        };

        DisplayStream {
            surface,
            session: Some(Session {
                mode,
                x: rect.x,
                y: rect.y,
                x1: rect.x,
                y1: rect.y,
                x2: rect.x + rect.cx,
                y2: rect.y + rect.cy,
                buffered: 0,
                run_len: 0,
                run_color: Color::BLACK,
            }),
        }
    }
}

impl<'a> DisplayStream<'a> {
    /// True when the session failed validation and discards pixels.
    pub fn is_inert(&self) -> bool {
        self.session.is_none()
    }

    /// Feed the next pixel. The cursor advances in row-major order and
    /// wraps from the last pixel of the window back to the first.
    pub fn feed(&mut self, color: Color) {
        let s = match &mut self.session {
            Some(s) => s,
            None => return,
        };
        let surface = &mut *self.surface;
        match s.mode {
            StreamMode::Hardware => surface.driver.write_color(color),
            StreamMode::LineBuf => {
                surface.linebuf[s.buffered] = color;
                s.buffered += 1;
                if s.buffered == LINEBUF_SIZE {
                    flush_linebuf(surface, s);
                }
                if s.x + s.buffered as Coord >= s.x2 {
                    if s.buffered > 0 {
                        flush_linebuf(surface, s);
                    }
                    wrap_line(s);
                }
            }
            StreamMode::Runs => {
                if s.run_len == 0 || s.run_color == color {
                    s.run_color = color;
                    s.run_len += 1;
                } else {
                    flush_run(surface, s);
                    s.run_color = color;
                    s.run_len = 1;
                }
                if s.x + s.run_len >= s.x2 {
                    flush_run(surface, s);
                    wrap_line(s);
                }
            }
            StreamMode::Pixel => {
                surface.driver.draw_pixel(&PixelOp {
                    x: s.x,
                    y: s.y,
                    color,
                });
                s.x += 1;
                if s.x >= s.x2 {
                    wrap_line(s);
                }
            }
        }
    }

    /// Close the session, flushing anything pending.
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        let s = match self.session.take() {
            Some(s) => s,
            None => return,
        };
        let surface = &mut *self.surface;
        let mut s = s;
        match s.mode {
            StreamMode::Hardware => surface.driver.write_stop(),
            StreamMode::LineBuf => {
                if s.buffered > 0 {
                    flush_linebuf(surface, &mut s);
                }
            }
            StreamMode::Runs => {
                if s.run_len > 0 {
                    flush_run(surface, &mut s);
                }
            }
            StreamMode::Pixel => {}
        }
        surface.end_paint();
    }
}

impl<'a> Drop for DisplayStream<'a> {
    fn drop(&mut self) {
        self.finish();
    }
}

fn wrap_line(s: &mut Session) {
    s.x = s.x1;
    s.y += 1;
    if s.y >= s.y2 {
        s.y = s.y1;
    }
}

fn flush_linebuf(surface: &mut Surface, s: &mut Session) {
    let n = s.buffered;
    let op = BlitOp {
        rect: Rect::new(s.x, s.y, n as Coord, 1),
        src_x: 0,
        src_y: 0,
        stride: n as Coord,
        pixels: &surface.linebuf[..n],
    };
    surface.driver.blit_area(&op);
    s.x += n as Coord;
    s.buffered = 0;
}

fn flush_run(surface: &mut Surface, s: &mut Session) {
    if s.run_len == 1 {
        surface.driver.draw_pixel(&PixelOp {
            x: s.x,
            y: s.y,
            color: s.run_color,
        });
    } else {
        surface.driver.fill_area(&AreaOp {
            rect: Rect::new(s.x, s.y, s.run_len, 1),
            color: s.run_color,
        });
    }
    s.x += s.run_len;
    s.run_len = 0;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Capabilities;
    use crate::testutil::{Call, RecordingDriver};

    fn checkerboard(w: Coord, h: Coord) -> Vec<Color> {
        (0..w * h)
            .map(|i| {
                let (x, y) = (i % w, i / w);
                if (x + y) % 2 == 0 {
                    Color::WHITE
                } else {
                    Color::BLUE
                }
            })
            .collect()
    }

    fn stream_and_check(caps: Capabilities) {
        let (drv, _log) = RecordingDriver::new(16, 16, caps);
        let fb = drv.framebuffer();
        let d = crate::surface::Display::new(Box::new(drv)).unwrap();

        let rect = Rect::new(2, 3, 7, 5);
        let pixels = checkerboard(rect.cx, rect.cy);
        let mut stream = d.stream(rect);
        assert!(!stream.is_inert());
        for &c in &pixels {
            stream.feed(c);
        }
        stream.end();

        let fb = fb.lock();
        for y in 0..rect.cy {
            for x in 0..rect.cx {
                assert_eq!(
                    fb[((rect.y + y) * 16 + rect.x + x) as usize],
                    pixels[(y * rect.cx + x) as usize],
                    "mismatch at {},{}",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_stream_hardware_window() {
        stream_and_check(Capabilities::STREAM_WRITE);
    }

    #[test]
    fn test_stream_linebuf_over_blit() {
        stream_and_check(Capabilities::DRAW_PIXEL | Capabilities::BLIT_AREA);
    }

    #[test]
    fn test_stream_fill_runs() {
        stream_and_check(Capabilities::DRAW_PIXEL | Capabilities::FILL_AREA);
    }

    #[test]
    fn test_stream_pixel_fallback() {
        stream_and_check(Capabilities::DRAW_PIXEL);
    }

    #[test]
    fn test_stream_window_outside_clip_is_inert() {
        let (drv, log) = RecordingDriver::new(16, 16, Capabilities::DRAW_PIXEL);
        let d = crate::surface::Display::new(Box::new(drv)).unwrap();
        d.set_clip(Rect::new(0, 0, 8, 8));
        let mut stream = d.stream(Rect::new(4, 4, 8, 8));
        assert!(stream.is_inert());
        stream.feed(Color::RED);
        stream.end();
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_stream_cursor_wraps_to_origin() {
        let (drv, _log) = RecordingDriver::new(8, 8, Capabilities::DRAW_PIXEL);
        let fb = drv.framebuffer();
        let d = crate::surface::Display::new(Box::new(drv)).unwrap();
        let mut stream = d.stream(Rect::new(0, 0, 2, 2));
        for _ in 0..4 {
            stream.feed(Color::RED);
        }
        // Fifth pixel lands back on the first cell.
        stream.feed(Color::GREEN);
        stream.end();
        assert_eq!(fb.lock()[0], Color::GREEN);
        assert_eq!(fb.lock()[1], Color::RED);
    }

    #[test]
    fn test_stream_run_coalescing_emits_fills() {
        let (drv, log) = RecordingDriver::new(
            16,
            16,
            Capabilities::DRAW_PIXEL | Capabilities::FILL_AREA,
        );
        let d = crate::surface::Display::new(Box::new(drv)).unwrap();
        let mut stream = d.stream(Rect::new(0, 0, 6, 1));
        for _ in 0..5 {
            stream.feed(Color::RED);
        }
        stream.feed(Color::BLUE);
        stream.end();
        let calls = log.lock();
        assert_eq!(
            *calls,
            vec![
                Call::Fill {
                    rect: Rect::new(0, 0, 5, 1),
                    color: Color::RED
                },
                Call::Pixel {
                    x: 5,
                    y: 0,
                    color: Color::BLUE
                },
            ]
        );
    }

    #[test]
    fn test_drop_flushes_pending() {
        let (drv, _log) = RecordingDriver::new(
            16,
            16,
            Capabilities::DRAW_PIXEL | Capabilities::BLIT_AREA,
        );
        let fb = drv.framebuffer();
        let d = crate::surface::Display::new(Box::new(drv)).unwrap();
        {
            let mut stream = d.stream(Rect::new(0, 0, 10, 1));
            for _ in 0..3 {
                stream.feed(Color::GREEN);
            }
            // dropped with 3 pixels still buffered
        }
        assert_eq!(fb.lock()[2], Color::GREEN);
        assert_eq!(fb.lock()[3], Color::BLACK);
    }
}
