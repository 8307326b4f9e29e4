//! Per-display state and the public drawing surface.
//!
//! A [`Surface`] owns one driver plus everything the engine tracks for it:
//! dimensions, orientation, the software clip, the resolved capability
//! strategy and a small line buffer used by scroll emulation and streaming.
//! [`Display`] wraps a surface in a `spin::Mutex` and is the public handle;
//! every drawing entry point locks the surface for its whole duration.
//! [`DisplayManager`] is the registry that owns displays and tracks which
//! one is the default.

use std::sync::Arc;

use log::debug;
use spin::{Mutex, MutexGuard};

use crate::basics::{Coord, Rect};
use crate::clip::Clip;
use crate::color::{Color, PixelFormat};
use crate::dispatch::{
    BlitTier, ClearTier, FillTier, PixelTier, ReadTier, RegisterError, ScrollTier, Strategy,
};
use crate::driver::{
    AreaOp, BlitOp, ControlRequest, DisplayDriver, Orientation, PixelOp, ScrollOp,
};

/// Pixels held by the per-surface line buffer.
pub(crate) const LINEBUF_SIZE: usize = 128;

// ============================================================================
// Surface
// ============================================================================

pub(crate) struct Surface {
    pub(crate) driver: Box<dyn DisplayDriver>,
    pub(crate) width: Coord,
    pub(crate) height: Coord,
    pub(crate) format: PixelFormat,
    pub(crate) orientation: Orientation,
    pub(crate) clip: Clip,
    pub(crate) strategy: Strategy,
    /// A full-screen write window is currently open for cursor writes.
    pub(crate) scr_stream: bool,
    pub(crate) autoflush: bool,
    pub(crate) linebuf: [Color; LINEBUF_SIZE],
}

impl Surface {
    pub(crate) fn new(driver: Box<dyn DisplayDriver>) -> Result<Surface, RegisterError> {
        let strategy = Strategy::resolve(driver.capabilities())?;
        let info = driver.info();
        debug!(
            "display registered: {}x{} {:?}, pixel tier {:?}, fill tier {:?}, blit tier {:?}",
            info.width, info.height, info.format, strategy.pixel, strategy.fill, strategy.blit
        );
        Ok(Surface {
            driver,
            width: info.width,
            height: info.height,
            format: info.format,
            orientation: Orientation::Deg0,
            clip: Clip::full(info.width, info.height),
            strategy,
            scr_stream: false,
            autoflush: false,
            linebuf: [Color::BLACK; LINEBUF_SIZE],
        })
    }

    // ------------------------------------------------------------------------
    // Cursor-stream window management
    // ------------------------------------------------------------------------

    /// Open a full-screen write window for cursor-positioned writes. Stays
    /// open until something needs its own window or the call finishes.
    pub(crate) fn open_screen_window(&mut self) {
        self.driver
            .write_start(Rect::new(0, 0, self.width, self.height));
        self.scr_stream = true;
    }

    pub(crate) fn close_screen_window(&mut self) {
        if self.scr_stream {
            self.driver.write_stop();
            self.scr_stream = false;
        }
    }

    /// Runs at the end of every public drawing call.
    pub(crate) fn end_paint(&mut self) {
        self.close_screen_window();
        if self.autoflush && self.strategy.can_flush {
            self.driver.flush();
        }
    }

    // ------------------------------------------------------------------------
    // Pixel
    // ------------------------------------------------------------------------

    /// Emit one pixel without clipping.
    pub(crate) fn draw_pixel_raw(&mut self, x: Coord, y: Coord, color: Color) {
        match self.strategy.pixel {
            PixelTier::Hardware => self.driver.draw_pixel(&PixelOp { x, y, color }),
            PixelTier::CursorStream => {
                if !self.scr_stream {
                    self.open_screen_window();
                }
                self.driver.write_pos(x, y);
                self.driver.write_color(color);
            }
            PixelTier::Stream => {
                self.driver.write_start(Rect::new(x, y, 1, 1));
                self.driver.write_color(color);
                self.driver.write_stop();
            }
        }
    }

    pub(crate) fn draw_pixel_clipped(&mut self, x: Coord, y: Coord, color: Color) {
        if !self.strategy.hw_clip && !self.clip.contains(x, y) {
            return;
        }
        self.draw_pixel_raw(x, y, color);
    }

    // ------------------------------------------------------------------------
    // Runs
    // ------------------------------------------------------------------------

    /// Clipped inclusive horizontal run from `x` to `x1` at row `y`.
    pub(crate) fn hline(&mut self, mut x: Coord, mut x1: Coord, y: Coord, color: Color) {
        if x1 < x {
            core::mem::swap(&mut x, &mut x1);
        }
        if !self.strategy.hw_clip {
            match self.clip.clamp_hspan(y, x, x1) {
                Some((a, b)) => {
                    x = a;
                    x1 = b;
                }
                None => return,
            }
        }
        if x == x1 {
            self.draw_pixel_raw(x, y, color);
            return;
        }
        let len = x1 - x + 1;
        match self.strategy.fill {
            FillTier::Hardware => self.driver.fill_area(&AreaOp {
                rect: Rect::new(x, y, len, 1),
                color,
            }),
            FillTier::Stream => {
                if self.strategy.cursor {
                    if !self.scr_stream {
                        self.open_screen_window();
                    }
                    self.driver.write_pos(x, y);
                    for _ in 0..len {
                        self.driver.write_color(color);
                    }
                } else {
                    self.driver.write_start(Rect::new(x, y, len, 1));
                    for _ in 0..len {
                        self.driver.write_color(color);
                    }
                    self.driver.write_stop();
                }
            }
            FillTier::Pixel => {
                for xx in x..=x1 {
                    self.driver.draw_pixel(&PixelOp { x: xx, y, color });
                }
            }
        }
    }

    /// Clipped inclusive vertical run from `y` to `y1` at column `x`.
    pub(crate) fn vline(&mut self, x: Coord, mut y: Coord, mut y1: Coord, color: Color) {
        if y1 < y {
            core::mem::swap(&mut y, &mut y1);
        }
        if !self.strategy.hw_clip {
            match self.clip.clamp_vspan(x, y, y1) {
                Some((a, b)) => {
                    y = a;
                    y1 = b;
                }
                None => return,
            }
        }
        if y == y1 {
            self.draw_pixel_raw(x, y, color);
            return;
        }
        let len = y1 - y + 1;
        match self.strategy.fill {
            FillTier::Hardware => self.driver.fill_area(&AreaOp {
                rect: Rect::new(x, y, 1, len),
                color,
            }),
            FillTier::Stream => {
                self.close_screen_window();
                self.driver.write_start(Rect::new(x, y, 1, len));
                if self.strategy.cursor {
                    self.driver.write_pos(x, y);
                }
                for _ in 0..len {
                    self.driver.write_color(color);
                }
                self.driver.write_stop();
            }
            FillTier::Pixel => {
                for yy in y..=y1 {
                    self.driver.draw_pixel(&PixelOp { x, y: yy, color });
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Area fill
    // ------------------------------------------------------------------------

    /// Fill an already-clipped rectangle.
    pub(crate) fn fill_area_raw(&mut self, rect: Rect, color: Color) {
        if rect.is_empty() {
            return;
        }
        match self.strategy.fill {
            FillTier::Hardware => self.driver.fill_area(&AreaOp { rect, color }),
            FillTier::Stream => {
                self.close_screen_window();
                self.driver.write_start(rect);
                if self.strategy.cursor {
                    self.driver.write_pos(rect.x, rect.y);
                }
                for _ in 0..rect.area() {
                    self.driver.write_color(color);
                }
                self.driver.write_stop();
            }
            FillTier::Pixel => {
                for y in rect.y..rect.bottom() {
                    for x in rect.x..rect.right() {
                        self.driver.draw_pixel(&PixelOp { x, y, color });
                    }
                }
            }
        }
    }

    pub(crate) fn fill_area(&mut self, rect: Rect, color: Color) {
        if self.strategy.hw_clip {
            self.fill_area_raw(rect, color);
        } else if let Some(r) = self.clip.clip_area(rect) {
            self.fill_area_raw(r, color);
        }
    }

    // ------------------------------------------------------------------------
    // Blit
    // ------------------------------------------------------------------------

    /// Copy a window of `pixels` (row-major, `stride` pixels per row,
    /// starting at `src_x`,`src_y`) to the clipped destination rectangle.
    pub(crate) fn blit(
        &mut self,
        rect: Rect,
        src_x: Coord,
        src_y: Coord,
        stride: Coord,
        pixels: &[Color],
    ) {
        let (mut rect, src_x, src_y) = if self.strategy.hw_clip {
            (rect, src_x, src_y)
        } else {
            match self.clip.clip_blit(rect, src_x, src_y) {
                Some(v) => v,
                None => return,
            }
        };
        // The source window cannot extend past the end of a buffer row.
        if src_x + rect.cx > stride {
            rect.cx = stride - src_x;
        }
        if rect.is_empty() {
            return;
        }

        match self.strategy.blit {
            BlitTier::Hardware => self.driver.blit_area(&BlitOp {
                rect,
                src_x,
                src_y,
                stride,
                pixels,
            }),
            BlitTier::Stream => {
                self.close_screen_window();
                self.driver.write_start(rect);
                if self.strategy.cursor {
                    self.driver.write_pos(rect.x, rect.y);
                }
                for row in 0..rect.cy {
                    let base = ((src_y + row) * stride + src_x) as usize;
                    for i in 0..rect.cx as usize {
                        self.driver.write_color(pixels[base + i]);
                    }
                }
                self.driver.write_stop();
            }
            BlitTier::FillRuns => {
                for row in 0..rect.cy {
                    let base = ((src_y + row) * stride + src_x) as usize;
                    let y = rect.y + row;
                    let mut i = 0usize;
                    while i < rect.cx as usize {
                        let color = pixels[base + i];
                        let mut run = 1usize;
                        while i + run < rect.cx as usize && pixels[base + i + run] == color {
                            run += 1;
                        }
                        let x = rect.x + i as Coord;
                        if run == 1 {
                            self.driver.draw_pixel(&PixelOp { x, y, color });
                        } else {
                            self.driver.fill_area(&AreaOp {
                                rect: Rect::new(x, y, run as Coord, 1),
                                color,
                            });
                        }
                        i += run;
                    }
                }
            }
            BlitTier::Pixel => {
                for row in 0..rect.cy {
                    let base = ((src_y + row) * stride + src_x) as usize;
                    let y = rect.y + row;
                    for i in 0..rect.cx as usize {
                        self.driver.draw_pixel(&PixelOp {
                            x: rect.x + i as Coord,
                            y,
                            color: pixels[base + i],
                        });
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Clear / read / scroll
    // ------------------------------------------------------------------------

    /// Clear the whole screen. Clearing deliberately ignores the clip region.
    pub(crate) fn clear(&mut self, color: Color) {
        let full = Rect::new(0, 0, self.width, self.height);
        match self.strategy.clear {
            ClearTier::Hardware => self.driver.clear(color),
            ClearTier::Fill => self.driver.fill_area(&AreaOp { rect: full, color }),
            ClearTier::Stream => {
                self.driver.write_start(full);
                if self.strategy.cursor {
                    self.driver.write_pos(0, 0);
                }
                for _ in 0..full.area() {
                    self.driver.write_color(color);
                }
                self.driver.write_stop();
            }
            ClearTier::Pixel => {
                for y in 0..self.height {
                    for x in 0..self.width {
                        self.driver.draw_pixel(&PixelOp { x, y, color });
                    }
                }
            }
        }
    }

    pub(crate) fn read_pixel(&mut self, x: Coord, y: Coord) -> Option<Color> {
        match self.strategy.read {
            ReadTier::Hardware => Some(self.driver.read_pixel(x, y)),
            ReadTier::Stream => {
                self.close_screen_window();
                self.driver.read_start(Rect::new(x, y, 1, 1));
                let c = self.driver.read_color();
                self.driver.read_stop();
                Some(c)
            }
            ReadTier::Unavailable => None,
        }
    }

    /// Write `linebuf[..n]` to the row starting at (`x`,`y`), using the best
    /// available write path. Used by scroll emulation.
    fn write_row(&mut self, x: Coord, y: Coord, n: usize) {
        let rect = Rect::new(x, y, n as Coord, 1);
        match self.strategy.blit {
            BlitTier::Hardware => {
                let op = BlitOp {
                    rect,
                    src_x: 0,
                    src_y: 0,
                    stride: n as Coord,
                    pixels: &self.linebuf[..n],
                };
                self.driver.blit_area(&op);
            }
            BlitTier::Stream => {
                self.driver.write_start(rect);
                if self.strategy.cursor {
                    self.driver.write_pos(x, y);
                }
                for j in 0..n {
                    self.driver.write_color(self.linebuf[j]);
                }
                self.driver.write_stop();
            }
            BlitTier::FillRuns => {
                let mut j = 0usize;
                while j < n {
                    let color = self.linebuf[j];
                    let mut run = 1usize;
                    while j + run < n && self.linebuf[j + run] == color {
                        run += 1;
                    }
                    let rx = x + j as Coord;
                    if run == 1 {
                        self.driver.draw_pixel(&PixelOp { x: rx, y, color });
                    } else {
                        self.driver.fill_area(&AreaOp {
                            rect: Rect::new(rx, y, run as Coord, 1),
                            color,
                        });
                    }
                    j += run;
                }
            }
            BlitTier::Pixel => {
                for j in 0..n {
                    self.driver.draw_pixel(&PixelOp {
                        x: x + j as Coord,
                        y,
                        color: self.linebuf[j],
                    });
                }
            }
        }
    }

    /// Scroll the contents of `rect` vertically by `lines` rows (positive
    /// scrolls up) and fill the vacated rows with `bg`.
    pub(crate) fn vertical_scroll(&mut self, rect: Rect, lines: Coord, bg: Color) {
        if lines == 0 {
            return;
        }
        let r = if self.strategy.hw_clip {
            rect
        } else {
            match self.clip.clip_area(rect) {
                Some(r) => r,
                None => return,
            }
        };

        let mut abslines = lines.abs();
        let mut cy = r.cy;
        if abslines >= cy {
            abslines = cy;
            cy = 0;
        } else {
            match self.strategy.scroll {
                ScrollTier::Hardware => {
                    self.driver.vertical_scroll(&ScrollOp { rect: r, lines, bg });
                    cy -= abslines;
                }
                ScrollTier::Emulated => {
                    cy -= abslines;
                    let (mut fy, dy) = if lines < 0 { (r.y + cy - 1, -1) } else { (r.y, 1) };
                    for _ in 0..cy {
                        let mut ix: Coord = 0;
                        while ix < r.cx {
                            let fx = (r.cx - ix).min(LINEBUF_SIZE as Coord);
                            match self.strategy.read {
                                ReadTier::Hardware => {
                                    for j in 0..fx as usize {
                                        self.linebuf[j] = self
                                            .driver
                                            .read_pixel(r.x + ix + j as Coord, fy + lines);
                                    }
                                }
                                ReadTier::Stream => {
                                    self.driver
                                        .read_start(Rect::new(r.x + ix, fy + lines, fx, 1));
                                    for j in 0..fx as usize {
                                        self.linebuf[j] = self.driver.read_color();
                                    }
                                    self.driver.read_stop();
                                }
                                ReadTier::Unavailable => return,
                            }
                            self.write_row(r.x + ix, fy, fx as usize);
                            ix += fx;
                        }
                        fy += dy;
                    }
                }
                ScrollTier::Unavailable => return,
            }
        }

        // Fill the vacated gap.
        let gap_y = if lines > 0 { r.y + cy } else { r.y };
        self.fill_area_raw(Rect::new(r.x, gap_y, r.cx, abslines), bg);
    }

    // ------------------------------------------------------------------------
    // Clip / control
    // ------------------------------------------------------------------------

    pub(crate) fn set_clip(&mut self, rect: Rect) {
        if self.strategy.hw_clip {
            self.driver.set_clip(rect);
        }
        self.clip.set(rect, self.width, self.height);
    }

    pub(crate) fn control(&mut self, req: ControlRequest) -> bool {
        if !self.strategy.can_control {
            return false;
        }
        // Resolve aspect-relative orientations against the current panel
        // shape before the driver sees them.
        let req = match req {
            ControlRequest::Orientation(Orientation::Landscape) => {
                ControlRequest::Orientation(if self.width >= self.height {
                    Orientation::Deg0
                } else {
                    Orientation::Deg90
                })
            }
            ControlRequest::Orientation(Orientation::Portrait) => {
                ControlRequest::Orientation(if self.width >= self.height {
                    Orientation::Deg90
                } else {
                    Orientation::Deg0
                })
            }
            other => other,
        };
        let ok = self.driver.control(req);
        if ok {
            if let ControlRequest::Orientation(o) = req {
                self.orientation = o;
                let info = self.driver.info();
                self.width = info.width;
                self.height = info.height;
                // Orientation changes reset the clip to the new full bounds.
                let full = Rect::new(0, 0, self.width, self.height);
                if self.strategy.hw_clip {
                    self.driver.set_clip(full);
                }
                self.clip = Clip::full(self.width, self.height);
                debug!("orientation now {:?} ({}x{})", o, self.width, self.height);
            }
        }
        ok
    }

    pub(crate) fn flush_now(&mut self) {
        if self.strategy.can_flush {
            self.driver.flush();
        }
    }
}

// ============================================================================
// Display
// ============================================================================

/// A registered display: the public, lockable drawing handle.
pub struct Display {
    pub(crate) surface: Mutex<Surface>,
}

impl Display {
    /// Wrap a driver in a display surface, resolving its capability
    /// strategy. Fails when the driver advertises no way to write pixels.
    pub fn new(driver: Box<dyn DisplayDriver>) -> Result<Display, RegisterError> {
        Ok(Display {
            surface: Mutex::new(Surface::new(driver)?),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Surface> {
        self.surface.lock()
    }

    pub fn width(&self) -> Coord {
        self.lock().width
    }

    pub fn height(&self) -> Coord {
        self.lock().height
    }

    pub fn format(&self) -> PixelFormat {
        self.lock().format
    }

    pub fn orientation(&self) -> Orientation {
        self.lock().orientation
    }

    /// Flush after every drawing call when the driver supports flushing.
    pub fn set_autoflush(&self, on: bool) {
        self.lock().autoflush = on;
    }

    pub fn flush(&self) {
        self.lock().flush_now();
    }

    pub fn draw_pixel(&self, x: Coord, y: Coord, color: Color) {
        let mut s = self.lock();
        s.draw_pixel_clipped(x, y, color);
        s.end_paint();
    }

    /// Read one pixel back, or `None` when the driver cannot read.
    pub fn get_pixel(&self, x: Coord, y: Coord) -> Option<Color> {
        self.lock().read_pixel(x, y)
    }

    /// Clear the whole screen, ignoring the clip region.
    pub fn clear(&self, color: Color) {
        let mut s = self.lock();
        s.clear(color);
        s.end_paint();
    }

    pub fn fill_area(&self, rect: Rect, color: Color) {
        let mut s = self.lock();
        s.fill_area(rect, color);
        s.end_paint();
    }

    /// Copy a rectangle out of a row-major pixel buffer onto the display.
    pub fn blit(&self, rect: Rect, src_x: Coord, src_y: Coord, stride: Coord, pixels: &[Color]) {
        let mut s = self.lock();
        s.blit(rect, src_x, src_y, stride, pixels);
        s.end_paint();
    }

    pub fn vertical_scroll(&self, rect: Rect, lines: Coord, bg: Color) {
        let mut s = self.lock();
        s.vertical_scroll(rect, lines, bg);
        s.end_paint();
    }

    /// Install a clip rectangle, intersected with the surface bounds.
    pub fn set_clip(&self, rect: Rect) {
        self.lock().set_clip(rect);
    }

    /// Reset the clip region to the full surface.
    pub fn reset_clip(&self) {
        let mut s = self.lock();
        let full = Rect::new(0, 0, s.width, s.height);
        s.set_clip(full);
    }

    /// Returns true when the driver accepted the orientation change.
    pub fn set_orientation(&self, o: Orientation) -> bool {
        self.lock().control(ControlRequest::Orientation(o))
    }

    pub fn set_backlight(&self, percent: u8) -> bool {
        self.lock().control(ControlRequest::Backlight(percent))
    }

    pub fn set_contrast(&self, percent: u8) -> bool {
        self.lock().control(ControlRequest::Contrast(percent))
    }
}

// ============================================================================
// DisplayManager
// ============================================================================

/// Registry of displays. The first registered display becomes the default
/// until [`set_default`](DisplayManager::set_default) says otherwise.
pub struct DisplayManager {
    displays: Vec<Arc<Display>>,
    default: Option<usize>,
}

impl DisplayManager {
    pub fn new() -> DisplayManager {
        DisplayManager {
            displays: Vec::new(),
            default: None,
        }
    }

    pub fn register(
        &mut self,
        driver: Box<dyn DisplayDriver>,
    ) -> Result<Arc<Display>, RegisterError> {
        let display = Arc::new(Display::new(driver)?);
        self.displays.push(Arc::clone(&display));
        if self.default.is_none() {
            self.default = Some(self.displays.len() - 1);
        }
        Ok(display)
    }

    pub fn count(&self) -> usize {
        self.displays.len()
    }

    pub fn get(&self, index: usize) -> Option<Arc<Display>> {
        self.displays.get(index).cloned()
    }

    pub fn default_display(&self) -> Option<Arc<Display>> {
        self.default.and_then(|i| self.get(i))
    }

    /// Returns false when the index does not name a registered display.
    pub fn set_default(&mut self, index: usize) -> bool {
        if index < self.displays.len() {
            self.default = Some(index);
            true
        } else {
            false
        }
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Capabilities;
    use crate::testutil::{Call, RecordingDriver};

    #[test]
    fn test_register_pixel_only() {
        let (drv, log) = RecordingDriver::new(64, 48, Capabilities::DRAW_PIXEL);
        let d = Display::new(Box::new(drv)).unwrap();
        assert_eq!(d.width(), 64);
        assert_eq!(d.height(), 48);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_register_rejects_unwritable_driver() {
        let (drv, _log) = RecordingDriver::new(64, 48, Capabilities::READ_PIXEL);
        assert!(Display::new(Box::new(drv)).is_err());
    }

    #[test]
    fn test_fill_on_pixel_only_surface_is_exactly_area_pixels() {
        let (drv, log) = RecordingDriver::new(64, 48, Capabilities::DRAW_PIXEL);
        let d = Display::new(Box::new(drv)).unwrap();
        d.fill_area(Rect::new(0, 0, 10, 10), Color::RED);

        let calls = log.lock();
        assert_eq!(calls.len(), 100);
        for call in calls.iter() {
            match call {
                Call::Pixel { x, y, color } => {
                    assert!(*x >= 0 && *x < 10 && *y >= 0 && *y < 10);
                    assert_eq!(*color, Color::RED);
                }
                other => panic!("unexpected driver call {:?}", other),
            }
        }
    }

    #[test]
    fn test_fill_uses_hardware_fill_when_available() {
        let (drv, log) = RecordingDriver::new(
            64,
            48,
            Capabilities::DRAW_PIXEL | Capabilities::FILL_AREA,
        );
        let d = Display::new(Box::new(drv)).unwrap();
        d.fill_area(Rect::new(5, 6, 7, 8), Color::BLUE);
        let calls = log.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            Call::Fill {
                rect: Rect::new(5, 6, 7, 8),
                color: Color::BLUE
            }
        );
    }

    #[test]
    fn test_fill_clips_to_surface() {
        let (drv, log) = RecordingDriver::new(8, 8, Capabilities::DRAW_PIXEL);
        let d = Display::new(Box::new(drv)).unwrap();
        d.fill_area(Rect::new(-4, -4, 100, 100), Color::GREEN);
        assert_eq!(log.lock().len(), 64);
    }

    #[test]
    fn test_clear_ignores_clip() {
        let (drv, log) = RecordingDriver::new(8, 4, Capabilities::DRAW_PIXEL);
        let d = Display::new(Box::new(drv)).unwrap();
        d.set_clip(Rect::new(0, 0, 2, 2));
        d.clear(Color::WHITE);
        assert_eq!(log.lock().len(), 32);
    }

    #[test]
    fn test_pixel_outside_clip_dropped() {
        let (drv, log) = RecordingDriver::new(32, 32, Capabilities::DRAW_PIXEL);
        let d = Display::new(Box::new(drv)).unwrap();
        d.set_clip(Rect::new(10, 10, 5, 5));
        d.draw_pixel(0, 0, Color::RED);
        d.draw_pixel(12, 12, Color::RED);
        let calls = log.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            Call::Pixel {
                x: 12,
                y: 12,
                color: Color::RED
            }
        );
    }

    #[test]
    fn test_pixel_via_cursor_stream() {
        let (drv, log) = RecordingDriver::new(
            16,
            16,
            Capabilities::STREAM_WRITE | Capabilities::STREAM_POS,
        );
        let d = Display::new(Box::new(drv)).unwrap();
        d.draw_pixel(3, 4, Color::RED);
        let calls = log.lock();
        // Full-screen window, position, one color, window closed at end.
        assert_eq!(
            *calls,
            vec![
                Call::WriteStart(Rect::new(0, 0, 16, 16)),
                Call::WritePos { x: 3, y: 4 },
                Call::WriteColor(Color::RED),
                Call::WriteStop,
            ]
        );
    }

    #[test]
    fn test_blit_fill_runs_coalesces() {
        let (drv, log) = RecordingDriver::new(
            16,
            16,
            Capabilities::DRAW_PIXEL | Capabilities::FILL_AREA,
        );
        let d = Display::new(Box::new(drv)).unwrap();
        let row = [
            Color::RED,
            Color::RED,
            Color::RED,
            Color::BLUE,
            Color::GREEN,
            Color::GREEN,
        ];
        d.blit(Rect::new(0, 0, 6, 1), 0, 0, 6, &row);
        let calls = log.lock();
        assert_eq!(
            *calls,
            vec![
                Call::Fill {
                    rect: Rect::new(0, 0, 3, 1),
                    color: Color::RED
                },
                Call::Pixel {
                    x: 3,
                    y: 0,
                    color: Color::BLUE
                },
                Call::Fill {
                    rect: Rect::new(4, 0, 2, 1),
                    color: Color::GREEN
                },
            ]
        );
    }

    #[test]
    fn test_blit_respects_source_stride() {
        let (drv, log) = RecordingDriver::new(16, 16, Capabilities::DRAW_PIXEL);
        let d = Display::new(Box::new(drv)).unwrap();
        // 4x2 buffer, blit the right 2x2 window.
        let buf = [
            Color::RED,
            Color::RED,
            Color::BLUE,
            Color::GREEN,
            Color::RED,
            Color::RED,
            Color::WHITE,
            Color::BLACK,
        ];
        d.blit(Rect::new(0, 0, 2, 2), 2, 0, 4, &buf);
        let calls = log.lock();
        assert_eq!(calls.len(), 4);
        assert_eq!(
            calls[0],
            Call::Pixel {
                x: 0,
                y: 0,
                color: Color::BLUE
            }
        );
        assert_eq!(
            calls[3],
            Call::Pixel {
                x: 1,
                y: 1,
                color: Color::BLACK
            }
        );
    }

    #[test]
    fn test_get_pixel_unavailable_without_read_support() {
        let (drv, _log) = RecordingDriver::new(16, 16, Capabilities::DRAW_PIXEL);
        let d = Display::new(Box::new(drv)).unwrap();
        assert_eq!(d.get_pixel(0, 0), None);
    }

    #[test]
    fn test_scroll_emulation_moves_rows() {
        let (drv, _log) = RecordingDriver::new(
            8,
            8,
            Capabilities::DRAW_PIXEL | Capabilities::FILL_AREA | Capabilities::READ_PIXEL,
        );
        let fb = drv.framebuffer();
        let d = Display::new(Box::new(drv)).unwrap();
        d.clear(Color::BLACK);
        d.fill_area(Rect::new(0, 2, 8, 1), Color::RED);
        // Scroll the whole surface up one row.
        d.vertical_scroll(Rect::new(0, 0, 8, 8), 1, Color::WHITE);
        let fb = fb.lock();
        assert_eq!(fb[8 + 3], Color::RED); // row 2 moved to row 1
        assert_eq!(fb[2 * 8 + 3], Color::BLACK);
        assert_eq!(fb[7 * 8 + 3], Color::WHITE); // vacated bottom row
    }

    #[test]
    fn test_randomized_primitives_stay_inside_clip() {
        // Plain 64-bit LCG, musl rand() constants. Deterministic on purpose.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move |m: Coord| -> Coord {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((seed >> 33) % m as u64) as Coord
        };

        let (drv, log) = RecordingDriver::new(64, 64, Capabilities::DRAW_PIXEL);
        let d = Display::new(Box::new(drv)).unwrap();

        for _ in 0..50 {
            let clip = Rect::new(next(48), next(48), 1 + next(20), 1 + next(20));
            d.set_clip(clip);
            log.lock().clear();

            match next(4) {
                0 => d.fill_area(Rect::new(next(64) - 8, next(64) - 8, next(40), next(40)), Color::RED),
                1 => d.draw_line(next(80) - 8, next(80) - 8, next(80) - 8, next(80) - 8, Color::GREEN),
                2 => d.draw_circle(next(64), next(64), next(20), Color::BLUE),
                _ => d.fill_circle(next(64), next(64), next(20), Color::WHITE),
            }

            for call in log.lock().iter() {
                if let Call::Pixel { x, y, .. } = call {
                    assert!(
                        *x >= clip.x
                            && *x < clip.right()
                            && *y >= clip.y
                            && *y < clip.bottom(),
                        "pixel ({}, {}) escaped clip {:?}",
                        x,
                        y,
                        clip
                    );
                }
            }
        }
    }

    #[test]
    fn test_manager_default_display() {
        let mut mgr = DisplayManager::new();
        assert!(mgr.default_display().is_none());
        let (a, _) = RecordingDriver::new(8, 8, Capabilities::DRAW_PIXEL);
        let (b, _) = RecordingDriver::new(16, 16, Capabilities::DRAW_PIXEL);
        mgr.register(Box::new(a)).unwrap();
        mgr.register(Box::new(b)).unwrap();
        assert_eq!(mgr.count(), 2);
        assert_eq!(mgr.default_display().unwrap().width(), 8);
        assert!(mgr.set_default(1));
        assert_eq!(mgr.default_display().unwrap().width(), 16);
        assert!(!mgr.set_default(5));
    }
}
