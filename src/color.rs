//! Working color type and native pixel formats.
//!
//! The rendering core computes in 8-bit-per-channel RGB. Each display
//! declares the native wire format its controller actually stores;
//! [`PixelFormat`] packs and unpacks between the two. The packing is a plain
//! shift (no bit replication) so that `pack(unpack(x)) == x` for every
//! representable native value.

// ============================================================================
// Color
// ============================================================================

/// 24-bit working color.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);

    /// Perceptual luma approximation: `(r + 2g + b) / 4`.
    #[inline]
    pub fn luma(self) -> u8 {
        ((self.r as u16 + ((self.g as u16) << 1) + self.b as u16) >> 2) as u8
    }

    /// A gray color with all channels set to `l`.
    #[inline]
    pub const fn from_luma(l: u8) -> Color {
        Color::rgb(l, l, l)
    }

    /// Blend `fg` over `bg` with the given alpha (0 = all background,
    /// 255 = all foreground).
    pub fn blend(fg: Color, bg: Color, alpha: u8) -> Color {
        let fg_ratio = alpha as u16 + 1;
        let bg_ratio = 256 - alpha as u16;

        let r = (fg.r as u16 * fg_ratio + bg.r as u16 * bg_ratio) >> 8;
        let g = (fg.g as u16 * fg_ratio + bg.g as u16 * bg_ratio) >> 8;
        let b = (fg.b as u16 * fg_ratio + bg.b as u16 * bg_ratio) >> 8;

        Color::rgb(r as u8, g as u8, b as u8)
    }

    /// A color that contrasts with `self`, channel by channel.
    pub fn contrast(self) -> Color {
        Color::rgb(
            if self.r > 128 { 0 } else { 255 },
            if self.g > 128 { 0 } else { 255 },
            if self.b > 128 { 0 } else { 255 },
        )
    }
}

// ============================================================================
// PixelFormat
// ============================================================================

/// Native pixel format of a display controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16 bits per pixel, 5/6/5.
    Rgb565,
    /// 24 bits per pixel, 8/8/8.
    Rgb888,
    /// 8-bit grayscale.
    Gray8,
}

impl PixelFormat {
    /// Wire identifier used by the native image container header.
    pub fn code(self) -> u16 {
        match self {
            PixelFormat::Rgb565 => 0x0565,
            PixelFormat::Rgb888 => 0x0888,
            PixelFormat::Gray8 => 0x0008,
        }
    }

    pub fn from_code(code: u16) -> Option<PixelFormat> {
        match code {
            0x0565 => Some(PixelFormat::Rgb565),
            0x0888 => Some(PixelFormat::Rgb888),
            0x0008 => Some(PixelFormat::Gray8),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Rgb888 => 3,
            PixelFormat::Gray8 => 1,
        }
    }

    /// Pack a working color into the native representation.
    pub fn pack(self, c: Color) -> u32 {
        match self {
            PixelFormat::Rgb565 => {
                (((c.r as u32) >> 3) << 11) | (((c.g as u32) >> 2) << 5) | ((c.b as u32) >> 3)
            }
            PixelFormat::Rgb888 => ((c.r as u32) << 16) | ((c.g as u32) << 8) | c.b as u32,
            PixelFormat::Gray8 => c.luma() as u32,
        }
    }

    /// Unpack a native value into a working color.
    pub fn unpack(self, raw: u32) -> Color {
        match self {
            PixelFormat::Rgb565 => Color::rgb(
                (((raw >> 11) & 0x1F) << 3) as u8,
                (((raw >> 5) & 0x3F) << 2) as u8,
                ((raw & 0x1F) << 3) as u8,
            ),
            PixelFormat::Rgb888 => {
                Color::rgb((raw >> 16) as u8, (raw >> 8) as u8, raw as u8)
            }
            PixelFormat::Gray8 => Color::from_luma(raw as u8),
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
    fn test_blend_endpoints() {
        let fg = Color::rgb(200, 100, 40);
        let bg = Color::rgb(10, 20, 30);
        assert_eq!(Color::blend(fg, bg, 255), fg);
        // alpha 0 keeps the background exactly
        assert_eq!(Color::blend(fg, bg, 0), bg);
    }

    #[test]
    fn test_blend_midpoint() {
        let c = Color::blend(Color::WHITE, Color::BLACK, 128);
        assert!(c.r >= 127 && c.r <= 129);
        assert_eq!(c.r, c.g);
        assert_eq!(c.g, c.b);
    }

    #[test]
    fn test_contrast() {
        assert_eq!(Color::WHITE.contrast(), Color::BLACK);
        assert_eq!(Color::BLACK.contrast(), Color::WHITE);
        assert_eq!(Color::rgb(200, 10, 200).contrast(), Color::rgb(0, 255, 0));
    }

    #[test]
    fn test_luma_white() {
        assert_eq!(Color::WHITE.luma(), 255);
        assert_eq!(Color::BLACK.luma(), 0);
    }

    #[test]
    fn test_rgb565_pack_unpack_round_trip() {
        // Every representable RGB565 value must survive unpack -> pack.
        for raw in 0..=0xFFFFu32 {
            let c = PixelFormat::Rgb565.unpack(raw);
            assert_eq!(PixelFormat::Rgb565.pack(c), raw);
        }
    }

    #[test]
    fn test_rgb888_pack_unpack_round_trip() {
        for raw in [0u32, 0xFFFFFF, 0x123456, 0x00FF00, 0xFF00FF] {
            let c = PixelFormat::Rgb888.unpack(raw);
            assert_eq!(PixelFormat::Rgb888.pack(c), raw);
        }
    }

    #[test]
    fn test_format_codes() {
        for fmt in [PixelFormat::Rgb565, PixelFormat::Rgb888, PixelFormat::Gray8] {
            assert_eq!(PixelFormat::from_code(fmt.code()), Some(fmt));
        }
        assert_eq!(PixelFormat::from_code(0x4242), None);
    }
}
