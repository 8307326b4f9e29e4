//! The display-driver boundary.
//!
//! A display controller is plugged into the engine as a [`DisplayDriver`]
//! implementation. Drivers implement only the primitives their hardware
//! actually has and advertise them through [`Capabilities`]; the engine
//! resolves the advertised set into a concrete rendering strategy when the
//! display is registered and never calls a primitive that was not advertised.
//!
//! Each primitive receives an explicit operation value ([`PixelOp`],
//! [`AreaOp`], [`BlitOp`], [`ScrollOp`]) describing that one call.

use crate::basics::{Coord, Rect};
use crate::color::{Color, PixelFormat};

// ============================================================================
// Capabilities
// ============================================================================

bitflags::bitflags! {
    /// Hardware primitives a driver implements.
    ///
    /// At least one of `DRAW_PIXEL` or `STREAM_WRITE` is required; everything
    /// else is an optional acceleration the dispatcher will prefer when
    /// present.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        /// Single pixel write.
        const DRAW_PIXEL   = 1 << 0;
        /// Rectangular solid fill.
        const FILL_AREA    = 1 << 1;
        /// Rectangular copy from a pixel buffer.
        const BLIT_AREA    = 1 << 2;
        /// Whole screen clear.
        const CLEAR        = 1 << 3;
        /// Single pixel read-back.
        const READ_PIXEL   = 1 << 4;
        /// Hardware vertical scroll.
        const SCROLL       = 1 << 5;
        /// Hardware clip rectangle.
        const SET_CLIP     = 1 << 6;
        /// Windowed streaming write (`write_start`/`write_color`/`write_stop`).
        const STREAM_WRITE = 1 << 7;
        /// Cursor repositioning within an open write window (`write_pos`).
        const STREAM_POS   = 1 << 8;
        /// Windowed streaming read (`read_start`/`read_color`/`read_stop`).
        const STREAM_READ  = 1 << 9;
        /// Orientation/backlight/contrast control requests.
        const CONTROL      = 1 << 10;
        /// Explicit framebuffer flush.
        const FLUSH        = 1 << 11;
    }
}

// ============================================================================
// Operation values
// ============================================================================

/// Static facts about a display panel.
#[derive(Copy, Clone, Debug)]
pub struct DriverInfo {
    /// Panel width in the current orientation.
    pub width: Coord,
    /// Panel height in the current orientation.
    pub height: Coord,
    /// Native pixel format of the controller.
    pub format: PixelFormat,
}

/// One pixel write.
#[derive(Copy, Clone, Debug)]
pub struct PixelOp {
    pub x: Coord,
    pub y: Coord,
    pub color: Color,
}

/// One solid rectangle fill. The rectangle is already clipped.
#[derive(Copy, Clone, Debug)]
pub struct AreaOp {
    pub rect: Rect,
    pub color: Color,
}

/// One rectangular copy out of a caller-owned pixel buffer.
///
/// `pixels` is a row-major buffer with `stride` pixels per row; the source
/// window starts at (`src_x`, `src_y`) within it. The destination rectangle
/// is already clipped and never larger than the source window.
#[derive(Copy, Clone, Debug)]
pub struct BlitOp<'a> {
    pub rect: Rect,
    pub src_x: Coord,
    pub src_y: Coord,
    pub stride: Coord,
    pub pixels: &'a [Color],
}

/// One hardware vertical scroll: shift the contents of `rect` by `lines`
/// rows (positive = up) and fill the vacated rows with `bg`.
#[derive(Copy, Clone, Debug)]
pub struct ScrollOp {
    pub rect: Rect,
    pub lines: Coord,
    pub bg: Color,
}

/// Display orientation.
///
/// `Landscape` and `Portrait` are resolved against the panel's aspect ratio
/// before the driver sees them; drivers only ever receive a concrete
/// rotation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Orientation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
    Landscape,
    Portrait,
}

/// A control request forwarded to the driver.
#[derive(Copy, Clone, Debug)]
pub enum ControlRequest {
    Orientation(Orientation),
    Backlight(u8),
    Contrast(u8),
}

// ============================================================================
// DisplayDriver
// ============================================================================

/// The vtable a display controller exposes to the engine.
///
/// Only [`info`](DisplayDriver::info) and
/// [`capabilities`](DisplayDriver::capabilities) are mandatory. Every other
/// method has a no-op default; a driver overrides exactly the set matching
/// its capability flags. The engine guarantees it never invokes a method
/// whose flag was not advertised, so the defaults are unreachable in a
/// correctly-declared driver.
pub trait DisplayDriver: Send {
    fn info(&self) -> DriverInfo;
    fn capabilities(&self) -> Capabilities;

    fn draw_pixel(&mut self, op: &PixelOp) {
        let _ = op;
    }

    fn fill_area(&mut self, op: &AreaOp) {
        let _ = op;
    }

    fn blit_area(&mut self, op: &BlitOp) {
        let _ = op;
    }

    fn clear(&mut self, color: Color) {
        let _ = color;
    }

    fn read_pixel(&mut self, x: Coord, y: Coord) -> Color {
        let _ = (x, y);
        Color::BLACK
    }

    fn vertical_scroll(&mut self, op: &ScrollOp) {
        let _ = op;
    }

    fn set_clip(&mut self, rect: Rect) {
        let _ = rect;
    }

    /// Open a write window. Subsequent `write_color` calls walk it in
    /// row-major order.
    fn write_start(&mut self, area: Rect) {
        let _ = area;
    }

    /// Reposition the write cursor within the open window.
    fn write_pos(&mut self, x: Coord, y: Coord) {
        let _ = (x, y);
    }

    fn write_color(&mut self, color: Color) {
        let _ = color;
    }

    fn write_stop(&mut self) {}

    /// Open a read window. Subsequent `read_color` calls walk it in
    /// row-major order.
    fn read_start(&mut self, area: Rect) {
        let _ = area;
    }

    fn read_color(&mut self) -> Color {
        Color::BLACK
    }

    fn read_stop(&mut self) {}

    /// Returns true when the request was applied.
    fn control(&mut self, req: ControlRequest) -> bool {
        let _ = req;
        false
    }

    fn flush(&mut self) {}
}
