//! In-memory display driver used by the test suites.
//!
//! [`RecordingDriver`] keeps a framebuffer and a log of every primitive the
//! engine invoked, both behind shared handles so tests can inspect them after
//! the driver has been moved into a display. The advertised capability set is
//! chosen per test, which is how the tier fallbacks get exercised.

use std::sync::Arc;

use spin::Mutex;

use crate::basics::{Coord, Rect};
use crate::color::{Color, PixelFormat};
use crate::driver::{
    AreaOp, BlitOp, Capabilities, ControlRequest, DisplayDriver, DriverInfo, PixelOp, ScrollOp,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Pixel { x: Coord, y: Coord, color: Color },
    Fill { rect: Rect, color: Color },
    Blit { rect: Rect, src_x: Coord, src_y: Coord },
    Clear(Color),
    Scroll { rect: Rect, lines: Coord },
    SetClip(Rect),
    WriteStart(Rect),
    WritePos { x: Coord, y: Coord },
    WriteColor(Color),
    WriteStop,
    ReadStart(Rect),
    ReadStop,
    Control,
    Flush,
}

pub struct RecordingDriver {
    caps: Capabilities,
    width: Coord,
    height: Coord,
    fb: Arc<Mutex<Vec<Color>>>,
    log: Arc<Mutex<Vec<Call>>>,
    // write window state
    win: Rect,
    wx: Coord,
    wy: Coord,
    // read window state
    rwin: Rect,
    rx: Coord,
    ry: Coord,
}

impl RecordingDriver {
    pub fn new(
        width: Coord,
        height: Coord,
        caps: Capabilities,
    ) -> (RecordingDriver, Arc<Mutex<Vec<Call>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let drv = RecordingDriver {
            caps,
            width,
            height,
            fb: Arc::new(Mutex::new(vec![Color::BLACK; (width * height) as usize])),
            log: Arc::clone(&log),
            win: Rect::new(0, 0, width, height),
            wx: 0,
            wy: 0,
            rwin: Rect::new(0, 0, width, height),
            rx: 0,
            ry: 0,
        };
        (drv, log)
    }

    /// Shared framebuffer handle, `width * height` row-major.
    pub fn framebuffer(&self) -> Arc<Mutex<Vec<Color>>> {
        Arc::clone(&self.fb)
    }

    fn set(&mut self, x: Coord, y: Coord, color: Color) {
        if x >= 0 && x < self.width && y >= 0 && y < self.height {
            self.fb.lock()[(y * self.width + x) as usize] = color;
        }
    }

    fn get(&self, x: Coord, y: Coord) -> Color {
        if x >= 0 && x < self.width && y >= 0 && y < self.height {
            self.fb.lock()[(y * self.width + x) as usize]
        } else {
            Color::BLACK
        }
    }
}

impl DisplayDriver for RecordingDriver {
    fn info(&self) -> DriverInfo {
        DriverInfo {
            width: self.width,
            height: self.height,
            format: PixelFormat::Rgb888,
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn draw_pixel(&mut self, op: &PixelOp) {
        self.log.lock().push(Call::Pixel {
            x: op.x,
            y: op.y,
            color: op.color,
        });
        self.set(op.x, op.y, op.color);
    }

    fn fill_area(&mut self, op: &AreaOp) {
        self.log.lock().push(Call::Fill {
            rect: op.rect,
            color: op.color,
        });
        for y in op.rect.y..op.rect.bottom() {
            for x in op.rect.x..op.rect.right() {
                self.set(x, y, op.color);
            }
        }
    }

    fn blit_area(&mut self, op: &BlitOp) {
        self.log.lock().push(Call::Blit {
            rect: op.rect,
            src_x: op.src_x,
            src_y: op.src_y,
        });
        for row in 0..op.rect.cy {
            let base = ((op.src_y + row) * op.stride + op.src_x) as usize;
            for i in 0..op.rect.cx as usize {
                self.set(op.rect.x + i as Coord, op.rect.y + row, op.pixels[base + i]);
            }
        }
    }

    fn clear(&mut self, color: Color) {
        self.log.lock().push(Call::Clear(color));
        self.fb.lock().fill(color);
    }

    fn read_pixel(&mut self, x: Coord, y: Coord) -> Color {
        self.get(x, y)
    }

    fn vertical_scroll(&mut self, op: &ScrollOp) {
        self.log.lock().push(Call::Scroll {
            rect: op.rect,
            lines: op.lines,
        });
        let r = op.rect;
        if op.lines > 0 {
            for y in r.y..r.bottom() - op.lines {
                for x in r.x..r.right() {
                    let c = self.get(x, y + op.lines);
                    self.set(x, y, c);
                }
            }
        } else {
            for y in (r.y - op.lines..r.bottom()).rev() {
                for x in r.x..r.right() {
                    let c = self.get(x, y + op.lines);
                    self.set(x, y, c);
                }
            }
        }
    }

    fn set_clip(&mut self, rect: Rect) {
        self.log.lock().push(Call::SetClip(rect));
    }

    fn write_start(&mut self, area: Rect) {
        self.log.lock().push(Call::WriteStart(area));
        self.win = area;
        self.wx = area.x;
        self.wy = area.y;
    }

    fn write_pos(&mut self, x: Coord, y: Coord) {
        self.log.lock().push(Call::WritePos { x, y });
        self.wx = x;
        self.wy = y;
    }

    fn write_color(&mut self, color: Color) {
        self.log.lock().push(Call::WriteColor(color));
        let (x, y) = (self.wx, self.wy);
        self.set(x, y, color);
        self.wx += 1;
        if self.wx >= self.win.right() {
            self.wx = self.win.x;
            self.wy += 1;
            if self.wy >= self.win.bottom() {
                self.wy = self.win.y;
            }
        }
    }

    fn write_stop(&mut self) {
        self.log.lock().push(Call::WriteStop);
    }

    fn read_start(&mut self, area: Rect) {
        self.log.lock().push(Call::ReadStart(area));
        self.rwin = area;
        self.rx = area.x;
        self.ry = area.y;
    }

    fn read_color(&mut self) -> Color {
        let c = self.get(self.rx, self.ry);
        self.rx += 1;
        if self.rx >= self.rwin.right() {
            self.rx = self.rwin.x;
            self.ry += 1;
            if self.ry >= self.rwin.bottom() {
                self.ry = self.rwin.y;
            }
        }
        c
    }

    fn read_stop(&mut self) {
        self.log.lock().push(Call::ReadStop);
    }

    fn control(&mut self, req: ControlRequest) -> bool {
        self.log.lock().push(Call::Control);
        if let ControlRequest::Orientation(o) = req {
            use crate::driver::Orientation;
            match o {
                Orientation::Deg90 | Orientation::Deg270 => {
                    // Swap the panel axes like a rotated controller would.
                    core::mem::swap(&mut self.width, &mut self.height);
                    let len = (self.width * self.height) as usize;
                    self.fb.lock().resize(len, Color::BLACK);
                }
                _ => {}
            }
        }
        true
    }

    fn flush(&mut self) {
        self.log.lock().push(Call::Flush);
    }
}

/// A display over a fully in-memory driver with every capability, plus the
/// framebuffer handle. Convenient for pixel-exact rendering checks.
pub fn framebuffer_display(
    width: Coord,
    height: Coord,
) -> (crate::surface::Display, Arc<Mutex<Vec<Color>>>) {
    let (drv, _log) = RecordingDriver::new(
        width,
        height,
        Capabilities::DRAW_PIXEL
            | Capabilities::FILL_AREA
            | Capabilities::BLIT_AREA
            | Capabilities::CLEAR
            | Capabilities::READ_PIXEL,
    );
    let fb = drv.framebuffer();
    let d = crate::surface::Display::new(Box::new(drv)).unwrap();
    (d, fb)
}
