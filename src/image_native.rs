//! Pre-rasterized native image container.
//!
//! An 8-byte header `"NI" <width:be16> <height:be16> <format:be16>` is
//! followed by raw row-major pixel data packed in the declared pixel
//! format, big-endian. The format must match the target display, so a draw
//! is nothing more than unpacking rows straight into blits.

use crate::basics::{Coord, Rect};
use crate::color::{Color, PixelFormat};
use crate::image::{ImageError, ImageResult, ImageStream};
use crate::surface::Display;

const HEADER_LEN: u64 = 8;

pub(crate) struct NativeImage {
    pub(crate) width: Coord,
    pub(crate) height: Coord,
    format: PixelFormat,
    cache: Option<Vec<Color>>,
}

impl NativeImage {
    pub(crate) fn open(stream: &mut dyn ImageStream) -> ImageResult<NativeImage> {
        let mut magic = [0u8; 2];
        if stream.read(&mut magic)? != 2 || &magic != b"NI" {
            return Err(ImageError::BadFormat);
        }

        let width = stream.read_be_u16()? as Coord;
        let height = stream.read_be_u16()? as Coord;
        let code = stream.read_be_u16()?;
        if width <= 0 || height <= 0 {
            return Err(ImageError::BadData);
        }
        let format = PixelFormat::from_code(code).ok_or(ImageError::Unsupported)?;

        Ok(NativeImage {
            width,
            height,
            format,
            cache: None,
        })
    }

    /// Unpack one pixel starting at `buf[i]`.
    fn unpack(&self, buf: &[u8], i: usize) -> Color {
        let raw = match self.format.bytes_per_pixel() {
            1 => buf[i] as u32,
            2 => u16::from_be_bytes([buf[i], buf[i + 1]]) as u32,
            _ => u32::from_be_bytes([0, buf[i], buf[i + 1], buf[i + 2]]),
        };
        self.format.unpack(raw)
    }

    pub(crate) fn cache(&mut self, stream: &mut dyn ImageStream) -> ImageResult<()> {
        if self.cache.is_some() {
            return Ok(());
        }
        let bpp = self.format.bytes_per_pixel();
        let rowbytes = self.width as usize * bpp;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(self.width as usize * self.height as usize)
            .map_err(|_| ImageError::NoMemory)?;

        stream.seek_to(HEADER_LEN)?;
        let mut row = vec![0u8; rowbytes];
        for _ in 0..self.height {
            stream.read_exact_buf(&mut row)?;
            for x in 0..self.width as usize {
                pixels.push(self.unpack(&row, x * bpp));
            }
        }
        self.cache = Some(pixels);
        Ok(())
    }

    pub(crate) fn draw(
        &mut self,
        stream: &mut dyn ImageStream,
        display: &Display,
        dest: Rect,
        sx: Coord,
        sy: Coord,
    ) -> ImageResult<()> {
        if self.format != display.format() {
            return Err(ImageError::Unsupported);
        }

        if let Some(pixels) = &self.cache {
            display.blit(dest, sx, sy, self.width, pixels);
            return Ok(());
        }

        // Decode one row span at a time straight out of the stream.
        let bpp = self.format.bytes_per_pixel();
        let mut raw = vec![0u8; dest.cx as usize * bpp];
        let mut row = vec![Color::BLACK; dest.cx as usize];
        for dy in 0..dest.cy {
            let offset =
                HEADER_LEN + ((sy + dy) as u64 * self.width as u64 + sx as u64) * bpp as u64;
            stream.seek_to(offset)?;
            stream.read_exact_buf(&mut raw)?;
            for x in 0..dest.cx as usize {
                row[x] = self.unpack(&raw, x * bpp);
            }
            display.blit(
                Rect::new(dest.x, dest.y + dy, dest.cx, 1),
                0,
                0,
                dest.cx,
                &row,
            );
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
