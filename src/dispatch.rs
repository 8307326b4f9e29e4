//! Capability tier resolution.
//!
//! Each drawing primitive can be satisfied by several driver features,
//! ranked from cheapest to most expensive. The ranking is resolved exactly
//! once, when a display is registered, from the driver's advertised
//! [`Capabilities`] into a [`Strategy`] of closed tier enums; the hot paths
//! then match on a tier instead of re-testing capability flags per call.

use thiserror::Error;

use crate::driver::Capabilities;

// ============================================================================
// Tiers
// ============================================================================

/// How a single pixel write is emitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelTier {
    /// Hardware pixel primitive.
    Hardware,
    /// Cursor-positioned write inside a lazily-opened full-screen window.
    CursorStream,
    /// Generic streaming write through a one-pixel window.
    Stream,
}

/// How a solid fill (and the run part of h/v lines) is emitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillTier {
    Hardware,
    /// Streaming write over the fill window.
    Stream,
    /// Pixel-by-pixel loop.
    Pixel,
}

/// How a rectangular buffer copy is emitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlitTier {
    Hardware,
    Stream,
    /// Coalesce runs of identical color into hardware fills.
    FillRuns,
    Pixel,
}

/// How a whole-screen clear is emitted. Clearing ignores the clip region.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClearTier {
    Hardware,
    Fill,
    Stream,
    Pixel,
}

/// How a pixel read-back is satisfied.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadTier {
    Hardware,
    Stream,
    Unavailable,
}

/// How a vertical scroll is satisfied.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScrollTier {
    Hardware,
    /// Read each line back and rewrite it at its new position.
    Emulated,
    Unavailable,
}

// ============================================================================
// Strategy
// ============================================================================

/// Registration failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    /// The driver advertises neither a pixel write nor a streaming write,
    /// so no drawing request could ever be satisfied.
    #[error("driver advertises no pixel write path")]
    NoPixelPath,
}

/// The resolved per-display rendering strategy.
#[derive(Copy, Clone, Debug)]
pub struct Strategy {
    pub pixel: PixelTier,
    pub fill: FillTier,
    pub blit: BlitTier,
    pub clear: ClearTier,
    pub read: ReadTier,
    pub scroll: ScrollTier,
    /// Hardware clip rectangle available; software clip tests pass through.
    pub hw_clip: bool,
    /// `write_pos` is available inside an open write window.
    pub cursor: bool,
    /// Windowed streaming writes are available at all.
    pub stream_write: bool,
    pub can_control: bool,
    pub can_flush: bool,
}

impl Strategy {
    /// Rank the advertised capabilities into concrete tiers.
    pub fn resolve(caps: Capabilities) -> Result<Strategy, RegisterError> {
        if !caps.intersects(Capabilities::DRAW_PIXEL | Capabilities::STREAM_WRITE) {
            return Err(RegisterError::NoPixelPath);
        }

        let cursor = caps.contains(Capabilities::STREAM_WRITE | Capabilities::STREAM_POS);

        let pixel = if caps.contains(Capabilities::DRAW_PIXEL) {
            PixelTier::Hardware
        } else if cursor {
            PixelTier::CursorStream
        } else {
            PixelTier::Stream
        };

        let fill = if caps.contains(Capabilities::FILL_AREA) {
            FillTier::Hardware
        } else if caps.contains(Capabilities::STREAM_WRITE) {
            FillTier::Stream
        } else {
            FillTier::Pixel
        };

        let blit = if caps.contains(Capabilities::BLIT_AREA) {
            BlitTier::Hardware
        } else if caps.contains(Capabilities::STREAM_WRITE) {
            BlitTier::Stream
        } else if caps.contains(Capabilities::FILL_AREA) {
            BlitTier::FillRuns
        } else {
            BlitTier::Pixel
        };

        let clear = if caps.contains(Capabilities::CLEAR) {
            ClearTier::Hardware
        } else if caps.contains(Capabilities::FILL_AREA) {
            ClearTier::Fill
        } else if caps.contains(Capabilities::STREAM_WRITE) {
            ClearTier::Stream
        } else {
            ClearTier::Pixel
        };

        let read = if caps.contains(Capabilities::READ_PIXEL) {
            ReadTier::Hardware
        } else if caps.contains(Capabilities::STREAM_READ) {
            ReadTier::Stream
        } else {
            ReadTier::Unavailable
        };

        let scroll = if caps.contains(Capabilities::SCROLL) {
            ScrollTier::Hardware
        } else if read != ReadTier::Unavailable {
            ScrollTier::Emulated
        } else {
            ScrollTier::Unavailable
        };

        Ok(Strategy {
            pixel,
            fill,
            blit,
            clear,
            read,
            scroll,
            hw_clip: caps.contains(Capabilities::SET_CLIP),
            cursor,
            stream_write: caps.contains(Capabilities::STREAM_WRITE),
            can_control: caps.contains(Capabilities::CONTROL),
            can_flush: caps.contains(Capabilities::FLUSH),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_pixel_path_is_rejected() {
        let err = Strategy::resolve(Capabilities::FILL_AREA | Capabilities::CLEAR);
        assert_eq!(err.unwrap_err(), RegisterError::NoPixelPath);
        assert!(Strategy::resolve(Capabilities::empty()).is_err());
    }

    #[test]
    fn test_pixel_only_driver() {
        let s = Strategy::resolve(Capabilities::DRAW_PIXEL).unwrap();
        assert_eq!(s.pixel, PixelTier::Hardware);
        assert_eq!(s.fill, FillTier::Pixel);
        assert_eq!(s.blit, BlitTier::Pixel);
        assert_eq!(s.clear, ClearTier::Pixel);
        assert_eq!(s.read, ReadTier::Unavailable);
        assert_eq!(s.scroll, ScrollTier::Unavailable);
        assert!(!s.cursor);
    }

    #[test]
    fn test_stream_only_driver() {
        let s = Strategy::resolve(Capabilities::STREAM_WRITE).unwrap();
        assert_eq!(s.pixel, PixelTier::Stream);
        assert_eq!(s.fill, FillTier::Stream);
        assert_eq!(s.blit, BlitTier::Stream);
        assert_eq!(s.clear, ClearTier::Stream);
    }

    #[test]
    fn test_cursor_stream_preferred_over_generic() {
        let s = Strategy::resolve(Capabilities::STREAM_WRITE | Capabilities::STREAM_POS).unwrap();
        assert_eq!(s.pixel, PixelTier::CursorStream);
        assert!(s.cursor);
    }

    #[test]
    fn test_hardware_wins_every_tier() {
        let s = Strategy::resolve(Capabilities::all()).unwrap();
        assert_eq!(s.pixel, PixelTier::Hardware);
        assert_eq!(s.fill, FillTier::Hardware);
        assert_eq!(s.blit, BlitTier::Hardware);
        assert_eq!(s.clear, ClearTier::Hardware);
        assert_eq!(s.read, ReadTier::Hardware);
        assert_eq!(s.scroll, ScrollTier::Hardware);
        assert!(s.hw_clip && s.can_flush && s.can_control);
    }

    #[test]
    fn test_fill_runs_blit_needs_fill_without_stream() {
        let s = Strategy::resolve(Capabilities::DRAW_PIXEL | Capabilities::FILL_AREA).unwrap();
        assert_eq!(s.blit, BlitTier::FillRuns);
        assert_eq!(s.clear, ClearTier::Fill);
    }

    #[test]
    fn test_scroll_emulation_needs_read() {
        let s = Strategy::resolve(Capabilities::DRAW_PIXEL | Capabilities::READ_PIXEL).unwrap();
        assert_eq!(s.scroll, ScrollTier::Emulated);
        let s = Strategy::resolve(Capabilities::DRAW_PIXEL | Capabilities::STREAM_READ).unwrap();
        assert_eq!(s.read, ReadTier::Stream);
        assert_eq!(s.scroll, ScrollTier::Emulated);
    }
}
