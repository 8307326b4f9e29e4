//! # microgfx
//!
//! A 2D rendering engine for small embedded displays. Drivers expose the
//! primitives their panel hardware accelerates; the engine dispatches every
//! drawing operation to the cheapest primitive the driver offers and
//! synthesizes the rest in software.
//!
//! Features:
//!
//! - Capability-tiered dispatch: pixel, fill, blit, clear, scroll and read
//!   each pick hardware, windowed-streaming or pixel-fallback paths
//! - Bresenham rasterizers for lines, circles, ellipses, arcs, sectors,
//!   polygon fills and thick lines
//! - Per-display clipping, orientation and software rotation
//! - A display registry with thread-safe handles
//! - Image rendering: native raw, BMP (incl. RLE and bitfields), GIF
//!   (incl. animation and transparency) and PNG (all standard color modes)
//!
//! ## Architecture
//!
//! Drawing flows through three layers:
//!
//! 1. **Surface** — public operations, locking, clipping, orientation
//! 2. **Dispatch** — capability inspection picks a tier per operation
//! 3. **Driver** — the hardware (or in-memory) implementation
//!
//! Image decoders sit on top and emit pixels through the same surface
//! operations, so they inherit clipping and dispatch for free.

// Foundation types
pub mod basics;
pub mod clip;
pub mod color;

// Driver interface and dispatch
pub mod dispatch;
pub mod driver;
pub mod stream;
pub mod surface;

// Rasterizers
pub mod arc;
pub mod circle;
pub mod line;
pub mod polygon;

// Image rendering
pub mod image;
mod image_bmp;
mod image_gif;
mod image_native;
mod image_png;
mod inflate;

#[cfg(test)]
pub(crate) mod testutil;
