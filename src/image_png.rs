//! PNG decoder.
//!
//! Decodes non-interlaced PNG in every standard color mode: grayscale at
//! 1/2/4/8/16 bits, RGB at 8/16, palette at 1/2/4/8, and the gray+alpha
//! and RGBA variants. The compressed stream runs through the resumable
//! [`Inflate`] engine one byte at a time, so only two scanlines plus the
//! inflate window are ever resident. Drawing streams straight from the
//! IDAT chunks unless the image has been cached first.
//!
//! Key-color transparency (tRNS), palette alpha and the bKGD background
//! chunk are honoured. Interlaced images are rejected as unsupported.
//! Chunk CRCs and the zlib Adler-32 trailer are not verified.

use crate::basics::{Coord, Rect};
use crate::color::Color;
use crate::image::{ImageError, ImageFlags, ImageResult, ImageStream};
use crate::inflate::{read_zlib_header, ByteSource, Inflate};
use crate::surface::Display;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Pixels buffered per blit while streaming scanlines out.
const BLIT_BUFFER_SIZE: usize = 32;

/// Alpha below this renders as fully transparent when no background color
/// was declared; above it the pixel is drawn opaque.
const ALPHA_CLIFF: u8 = 32;

#[derive(Copy, Clone, PartialEq, Eq)]
enum ColorMode {
    Gray,
    Rgb,
    Palette,
    GrayAlpha,
    RgbAlpha,
}

pub(crate) struct PngImage {
    pub(crate) width: Coord,
    pub(crate) height: Coord,
    bitdepth: u8,
    mode: ColorMode,
    /// Bits per pixel.
    bpp: u32,
    /// Key-color transparency from a tRNS chunk (gray and RGB modes).
    transparent: bool,
    trans_r: u16,
    trans_g: u16,
    trans_b: u16,
    /// Declared background from a bKGD chunk, used for alpha compositing.
    background: Option<Color>,
    palette: Vec<Color>,
    pal_alpha: Vec<u8>,
    /// Concatenated IDAT payloads once cached.
    cache: Option<Vec<u8>>,
}

// ============================================================================
// Chunk parsing
// ============================================================================

impl PngImage {
    pub(crate) fn open(stream: &mut dyn ImageStream) -> ImageResult<PngImage> {
        let mut sig = [0u8; 8];
        if stream.read(&mut sig)? != 8 || sig != SIGNATURE {
            return Err(ImageError::BadFormat);
        }

        let mut img = PngImage {
            width: 0,
            height: 0,
            bitdepth: 0,
            mode: ColorMode::Gray,
            bpp: 0,
            transparent: false,
            trans_r: 0,
            trans_g: 0,
            trans_b: 0,
            background: None,
            palette: Vec::new(),
            pal_alpha: Vec::new(),
            cache: None,
        };
        let mut header_done = false;

        let mut pos: u64 = 8;
        loop {
            stream.seek_to(pos)?;
            let mut hdr = [0u8; 8];
            stream.read_exact_buf(&mut hdr)?;
            let len = u32::from_be_bytes([hdr[0], hdr[1], hdr[2], hdr[3]]);
            let ctype = [hdr[4], hdr[5], hdr[6], hdr[7]];
            pos += len as u64 + 12;

            match &ctype {
                b"IHDR" => {
                    if header_done {
                        return Err(ImageError::BadData);
                    }
                    let mut buf = [0u8; 13];
                    if len < 13 {
                        return Err(ImageError::BadData);
                    }
                    stream.read_exact_buf(&mut buf)?;

                    // Dimensions above 65535 are not worth supporting on
                    // the displays this targets.
                    if buf[0] != 0 || buf[1] != 0 || buf[4] != 0 || buf[5] != 0 {
                        return Err(ImageError::Unsupported);
                    }
                    img.width = u16::from_be_bytes([buf[2], buf[3]]) as Coord;
                    img.height = u16::from_be_bytes([buf[6], buf[7]]) as Coord;
                    if img.width <= 0 || img.height <= 0 {
                        return Err(ImageError::Unsupported);
                    }
                    img.bitdepth = buf[8];
                    // Compression and filter methods must be zero; interlace
                    // (Adam7) is not supported.
                    if buf[10] != 0 || buf[11] != 0 || buf[12] != 0 {
                        return Err(ImageError::Unsupported);
                    }

                    img.mode = match buf[9] {
                        0 => ColorMode::Gray,
                        2 => ColorMode::Rgb,
                        3 => ColorMode::Palette,
                        4 => ColorMode::GrayAlpha,
                        6 => ColorMode::RgbAlpha,
                        _ => return Err(ImageError::Unsupported),
                    };
                    let depth_ok = match img.mode {
                        ColorMode::Gray => matches!(img.bitdepth, 1 | 2 | 4 | 8 | 16),
                        ColorMode::Rgb => matches!(img.bitdepth, 8 | 16),
                        ColorMode::Palette => matches!(img.bitdepth, 1 | 2 | 4 | 8),
                        ColorMode::GrayAlpha => matches!(img.bitdepth, 8 | 16),
                        ColorMode::RgbAlpha => matches!(img.bitdepth, 8 | 16),
                    };
                    if !depth_ok {
                        return Err(ImageError::Unsupported);
                    }
                    img.bpp = img.bitdepth as u32
                        * match img.mode {
                            ColorMode::Gray | ColorMode::Palette => 1,
                            ColorMode::GrayAlpha => 2,
                            ColorMode::Rgb => 3,
                            ColorMode::RgbAlpha => 4,
                        };
                    header_done = true;
                }

                b"PLTE" => {
                    if !header_done {
                        return Err(ImageError::BadData);
                    }
                    if img.mode != ColorMode::Palette {
                        continue;
                    }
                    if len > 3 * 256 || !img.palette.is_empty() {
                        return Err(ImageError::BadData);
                    }
                    let count = len as usize / 3;
                    let mut rgb = [0u8; 3];
                    for _ in 0..count {
                        stream.read_exact_buf(&mut rgb)?;
                        img.palette.push(Color::rgb(rgb[0], rgb[1], rgb[2]));
                        img.pal_alpha.push(255);
                    }
                }

                b"tRNS" => {
                    if !header_done {
                        return Err(ImageError::BadData);
                    }
                    match img.mode {
                        ColorMode::Palette => {
                            if len as usize > img.palette.len() {
                                return Err(ImageError::BadData);
                            }
                            for i in 0..len as usize {
                                img.pal_alpha[i] = stream.read_u8()?;
                            }
                        }
                        ColorMode::Gray => {
                            if len != 2 {
                                return Err(ImageError::BadData);
                            }
                            img.transparent = true;
                            img.trans_r = stream.read_be_u16()?;
                        }
                        ColorMode::Rgb => {
                            if len != 6 {
                                return Err(ImageError::BadData);
                            }
                            img.transparent = true;
                            img.trans_r = stream.read_be_u16()?;
                            img.trans_g = stream.read_be_u16()?;
                            img.trans_b = stream.read_be_u16()?;
                        }
                        _ => return Err(ImageError::Unsupported),
                    }
                }

                b"bKGD" => {
                    if !header_done {
                        return Err(ImageError::BadData);
                    }
                    match img.mode {
                        ColorMode::Palette => {
                            if img.palette.is_empty() || len < 1 {
                                return Err(ImageError::BadData);
                            }
                            let idx = stream.read_u8()? as usize;
                            if idx >= img.palette.len() {
                                return Err(ImageError::BadData);
                            }
                            img.background = Some(img.palette[idx]);
                        }
                        ColorMode::Gray | ColorMode::GrayAlpha => {
                            if len < 2 {
                                return Err(ImageError::BadData);
                            }
                            let mut buf = [0u8; 2];
                            stream.read_exact_buf(&mut buf)?;
                            let luma = match img.bitdepth {
                                1 | 2 | 4 => scale_sample(buf[1], img.bitdepth),
                                8 => buf[1],
                                _ => buf[0],
                            };
                            img.background = Some(Color::from_luma(luma));
                        }
                        ColorMode::Rgb | ColorMode::RgbAlpha => {
                            if len < 6 {
                                return Err(ImageError::BadData);
                            }
                            let mut buf = [0u8; 6];
                            stream.read_exact_buf(&mut buf)?;
                            img.background = Some(if img.bitdepth == 16 {
                                Color::rgb(buf[0], buf[2], buf[4])
                            } else {
                                Color::rgb(buf[1], buf[3], buf[5])
                            });
                        }
                    }
                }

                b"IDAT" => {
                    if !header_done {
                        return Err(ImageError::BadData);
                    }
                    if img.mode == ColorMode::Palette && img.palette.is_empty() {
                        return Err(ImageError::BadData);
                    }
                    return Ok(img);
                }

                // IEND before any image data.
                b"IEND" => return Err(ImageError::BadData),

                _ => {}
            }
        }
    }

    pub(crate) fn flags(&self) -> ImageFlags {
        let translucent = self.transparent
            || matches!(self.mode, ColorMode::GrayAlpha | ColorMode::RgbAlpha)
            || self.pal_alpha.iter().any(|&a| a != 255);
        if translucent {
            ImageFlags::TRANSPARENT
        } else {
            ImageFlags::empty()
        }
    }

    /// Load every IDAT payload into one contiguous buffer so draws skip
    /// the chunk walk and stream seeks.
    pub(crate) fn cache(&mut self, stream: &mut dyn ImageStream) -> ImageResult<()> {
        if self.cache.is_some() {
            return Ok(());
        }

        // First pass sizes the buffer.
        let mut total = 0usize;
        let mut pos: u64 = 8;
        loop {
            stream.seek_to(pos)?;
            let mut hdr = [0u8; 8];
            stream.read_exact_buf(&mut hdr)?;
            let len = u32::from_be_bytes([hdr[0], hdr[1], hdr[2], hdr[3]]);
            pos += len as u64 + 12;
            match &[hdr[4], hdr[5], hdr[6], hdr[7]] {
                b"IDAT" => total += len as usize,
                b"IEND" => {
                    if total == 0 {
                        return Err(ImageError::BadData);
                    }
                    break;
                }
                _ => {}
            }
        }

        let mut data = Vec::new();
        data.try_reserve_exact(total).map_err(|_| ImageError::NoMemory)?;

        let mut pos: u64 = 8;
        loop {
            stream.seek_to(pos)?;
            let mut hdr = [0u8; 8];
            stream.read_exact_buf(&mut hdr)?;
            let len = u32::from_be_bytes([hdr[0], hdr[1], hdr[2], hdr[3]]);
            pos += len as u64 + 12;
            match &[hdr[4], hdr[5], hdr[6], hdr[7]] {
                b"IDAT" => {
                    let start = data.len();
                    data.resize(start + len as usize, 0);
                    stream.read_exact_buf(&mut data[start..])?;
                }
                b"IEND" => break,
                _ => {}
            }
        }
        self.cache = Some(data);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------------

    pub(crate) fn draw(
        &mut self,
        stream: &mut dyn ImageStream,
        display: &Display,
        dest: Rect,
        sx: Coord,
        sy: Coord,
    ) -> ImageResult<()> {
        let bytewidth = (self.bpp as usize + 7) / 8;
        let scanbytes = (self.width as usize * self.bpp as usize + 7) / 8;

        let mut source = match &self.cache {
            Some(data) => PngSource::Cache { data, pos: 0 },
            None => PngSource::Chunks {
                stream,
                chunklen: 0,
                chunknext: 8,
                done: false,
            },
        };
        if !read_zlib_header(&mut source) {
            return Err(ImageError::BadData);
        }
        let mut z = Inflate::new();

        let mut out = RowBlit {
            display,
            dest,
            sx,
            sy,
            ix: 0,
            iy: 0,
            cnt: 0,
            buf: [Color::BLACK; BLIT_BUFFER_SIZE],
        };

        // Two scanlines ping-pong so each filter sees its predecessor.
        let mut lines = vec![0u8; scanbytes * 2];
        let (line_a, line_b) = lines.split_at_mut(scanbytes);
        let mut flip = false;

        for y in 0..sy + dest.cy {
            let (cur, prev) = if flip {
                (&mut *line_b, &*line_a)
            } else {
                (&mut *line_a, &*line_b)
            };
            let prev = if y > 0 { Some(prev) } else { None };
            unfilter_row(&mut z, &mut source, cur, prev, bytewidth)?;

            if out.start_row(y) {
                self.expand_row(cur, &mut out);
                out.flush();
            }
            flip = !flip;
        }
        Ok(())
    }

    /// Convert one unfiltered scanline to colors and feed the blitter.
    fn expand_row(&self, line: &[u8], out: &mut RowBlit) {
        match (self.mode, self.bitdepth) {
            (ColorMode::Gray, 1 | 2 | 4) => {
                let depth = self.bitdepth;
                let mask = (1u8 << depth) - 1;
                for &byte in line {
                    let mut bits = 8;
                    while bits != 0 {
                        let px = (byte >> (bits - depth)) & mask;
                        bits -= depth;
                        if self.transparent && px as u16 == self.trans_r {
                            self.key_pixel(out);
                            continue;
                        }
                        out.color(Color::from_luma(scale_sample(px, depth)));
                    }
                }
            }
            (ColorMode::Gray, 8) => {
                for &px in line {
                    if self.transparent && px as u16 == self.trans_r {
                        self.key_pixel(out);
                        continue;
                    }
                    out.color(Color::from_luma(px));
                }
            }
            (ColorMode::Gray, _) => {
                for px in line.chunks_exact(2) {
                    if self.transparent && u16::from_be_bytes([px[0], px[1]]) == self.trans_r {
                        self.key_pixel(out);
                        continue;
                    }
                    out.color(Color::from_luma(px[0]));
                }
            }
            (ColorMode::Rgb, 8) => {
                for px in line.chunks_exact(3) {
                    if self.transparent
                        && px[0] as u16 == self.trans_r
                        && px[1] as u16 == self.trans_g
                        && px[2] as u16 == self.trans_b
                    {
                        self.key_pixel(out);
                        continue;
                    }
                    out.color(Color::rgb(px[0], px[1], px[2]));
                }
            }
            (ColorMode::Rgb, _) => {
                for px in line.chunks_exact(6) {
                    if self.transparent
                        && u16::from_be_bytes([px[0], px[1]]) == self.trans_r
                        && u16::from_be_bytes([px[2], px[3]]) == self.trans_g
                        && u16::from_be_bytes([px[4], px[5]]) == self.trans_b
                    {
                        self.key_pixel(out);
                        continue;
                    }
                    out.color(Color::rgb(px[0], px[2], px[4]));
                }
            }
            (ColorMode::Palette, 8) => {
                for &idx in line {
                    self.palette_pixel(idx as usize, out);
                }
            }
            (ColorMode::Palette, _) => {
                let depth = self.bitdepth;
                let mask = (1u8 << depth) - 1;
                for &byte in line {
                    let mut bits = 8;
                    while bits != 0 {
                        let idx = (byte >> (bits - depth)) & mask;
                        bits -= depth;
                        self.palette_pixel(idx as usize, out);
                    }
                }
            }
            (ColorMode::GrayAlpha, 8) => {
                for px in line.chunks_exact(2) {
                    self.alpha_pixel(Color::from_luma(px[0]), px[1], out);
                }
            }
            (ColorMode::GrayAlpha, _) => {
                for px in line.chunks_exact(4) {
                    self.alpha_pixel(Color::from_luma(px[0]), px[2], out);
                }
            }
            (ColorMode::RgbAlpha, 8) => {
                for px in line.chunks_exact(4) {
                    self.alpha_pixel(Color::rgb(px[0], px[1], px[2]), px[3], out);
                }
            }
            (ColorMode::RgbAlpha, _) => {
                for px in line.chunks_exact(8) {
                    self.alpha_pixel(Color::rgb(px[0], px[2], px[4]), px[6], out);
                }
            }
        }
    }

    /// A pixel matching the transparency key: background color if one was
    /// declared, otherwise skipped.
    fn key_pixel(&self, out: &mut RowBlit) {
        match self.background {
            Some(bg) => out.color(bg),
            None => out.transparent(),
        }
    }

    fn palette_pixel(&self, idx: usize, out: &mut RowBlit) {
        if idx >= self.palette.len() {
            out.color(Color::BLACK);
            return;
        }
        self.alpha_pixel(self.palette[idx], self.pal_alpha[idx], out);
    }

    fn alpha_pixel(&self, color: Color, alpha: u8, out: &mut RowBlit) {
        if alpha != 255 {
            if let Some(bg) = self.background {
                out.color(Color::blend(color, bg, alpha));
                return;
            }
        }
        if alpha < ALPHA_CLIFF {
            out.transparent();
            return;
        }
        out.color(color);
    }
}

/// Scale a 1/2/4-bit sample to 8 bits, rounding the top half up.
#[inline]
fn scale_sample(px: u8, depth: u8) -> u8 {
    let mut px = px << (8 - depth);
    if px >= 0x80 {
        px += (1u8 << (8 - depth)) - 1;
    }
    px
}

// ============================================================================
// Compressed data sources
// ============================================================================

/// Feeds the inflater either from the in-memory cache or by walking the
/// IDAT chunks in the file.
enum PngSource<'a> {
    Cache {
        data: &'a [u8],
        pos: usize,
    },
    Chunks {
        stream: &'a mut dyn ImageStream,
        chunklen: u32,
        chunknext: u64,
        done: bool,
    },
}

impl<'a> ByteSource for PngSource<'a> {
    fn next_byte(&mut self) -> Option<u8> {
        match self {
            PngSource::Cache { data, pos } => {
                let b = data.get(*pos).copied();
                if b.is_some() {
                    *pos += 1;
                }
                b
            }
            PngSource::Chunks {
                stream,
                chunklen,
                chunknext,
                done,
            } => {
                if *done {
                    return None;
                }
                while *chunklen == 0 {
                    if stream.seek_to(*chunknext).is_err() {
                        *done = true;
                        return None;
                    }
                    let mut hdr = [0u8; 8];
                    if stream.read_exact_buf(&mut hdr).is_err() {
                        *done = true;
                        return None;
                    }
                    let len = u32::from_be_bytes([hdr[0], hdr[1], hdr[2], hdr[3]]);
                    *chunknext += len as u64 + 12;
                    match &[hdr[4], hdr[5], hdr[6], hdr[7]] {
                        b"IDAT" => *chunklen = len,
                        b"IEND" => {
                            *done = true;
                            return None;
                        }
                        _ => {}
                    }
                }
                match stream.read_u8() {
                    Ok(b) => {
                        *chunklen -= 1;
                        Some(b)
                    }
                    Err(_) => {
                        *done = true;
                        None
                    }
                }
            }
        }
    }
}

// ============================================================================
// Scanline unfiltering
// ============================================================================

fn unfilter_row(
    z: &mut Inflate,
    source: &mut dyn ByteSource,
    cur: &mut [u8],
    prev: Option<&[u8]>,
    bytewidth: usize,
) -> ImageResult<()> {
    let ft = z.get_byte(source).ok_or(ImageError::BadData)?;
    if ft > 4 {
        return Err(ImageError::BadData);
    }
    for b in cur.iter_mut() {
        *b = z.get_byte(source).ok_or(ImageError::BadData)?;
    }

    match ft {
        1 => {
            for i in bytewidth..cur.len() {
                cur[i] = cur[i].wrapping_add(cur[i - bytewidth]);
            }
        }
        2 => {
            if let Some(prev) = prev {
                for i in 0..cur.len() {
                    cur[i] = cur[i].wrapping_add(prev[i]);
                }
            }
        }
        3 => match prev {
            Some(prev) => {
                for i in 0..bytewidth {
                    cur[i] = cur[i].wrapping_add(prev[i] / 2);
                }
                for i in bytewidth..cur.len() {
                    let avg = (cur[i - bytewidth] as u16 + prev[i] as u16) / 2;
                    cur[i] = cur[i].wrapping_add(avg as u8);
                }
            }
            None => {
                for i in bytewidth..cur.len() {
                    cur[i] = cur[i].wrapping_add(cur[i - bytewidth] / 2);
                }
            }
        },
        4 => match prev {
            Some(prev) => {
                for i in 0..bytewidth {
                    cur[i] = cur[i].wrapping_add(prev[i]);
                }
                for i in bytewidth..cur.len() {
                    let p = paeth(cur[i - bytewidth], prev[i], prev[i - bytewidth]);
                    cur[i] = cur[i].wrapping_add(p);
                }
            }
            None => {
                for i in bytewidth..cur.len() {
                    cur[i] = cur[i].wrapping_add(cur[i - bytewidth]);
                }
            }
        },
        _ => {}
    }
    Ok(())
}

/// Paeth predictor: whichever of left/up/up-left is closest to their sum
/// minus twice the corner.
fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a, b, c) = (a as i16, b as i16, c as i16);
    let pa = (b - c).abs();
    let pb = (a - c).abs();
    let pc = (a + b - 2 * c).abs();
    if pc < pa && pc < pb {
        c as u8
    } else if pb < pa {
        b as u8
    } else {
        a as u8
    }
}

// ============================================================================
// Output windowing
// ============================================================================

/// Batches decoded pixels into short horizontal blits, clipped to the
/// requested source window. `ix` is the image column of the first buffered
/// pixel; transparent pixels force a flush and a one-column skip.
struct RowBlit<'a> {
    display: &'a Display,
    dest: Rect,
    sx: Coord,
    sy: Coord,
    ix: Coord,
    iy: Coord,
    cnt: usize,
    buf: [Color; BLIT_BUFFER_SIZE],
}

impl<'a> RowBlit<'a> {
    fn start_row(&mut self, y: Coord) -> bool {
        if y < self.sy || y >= self.sy + self.dest.cy {
            return false;
        }
        self.ix = 0;
        self.iy = y;
        true
    }

    fn color(&mut self, c: Color) {
        let col = self.ix + self.cnt as Coord;
        if col < self.sx || col >= self.sx + self.dest.cx {
            self.flush();
            self.ix += 1;
            return;
        }
        if self.cnt >= self.buf.len() {
            self.flush();
        }
        self.buf[self.cnt] = c;
        self.cnt += 1;
    }

    fn transparent(&mut self) {
        self.flush();
        self.ix += 1;
    }

    fn flush(&mut self) {
        let x = self.dest.x + self.ix - self.sx;
        let y = self.dest.y + self.iy - self.sy;
        match self.cnt {
            0 => return,
            1 => self.display.draw_pixel(x, y, self.buf[0]),
            n => self.display.blit(
                Rect::new(x, y, n as Coord, 1),
                0,
                0,
                n as Coord,
                &self.buf[..n],
            ),
        }
        self.ix += self.cnt as Coord;
        self.cnt = 0;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;
    use crate::testutil::framebuffer_display;
    use std::io::Cursor;

    // 2x2 RGB8: red, blue / green, white.
    const RGB8_2X2: [u8; 75] = [
        137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82, 0, 0, 0, 2, 0, 0, 0, 2, 8,
        2, 0, 0, 0, 253, 212, 154, 115, 0, 0, 0, 18, 73, 68, 65, 84, 120, 218, 99, 248, 207, 0,
        4, 255, 65, 232, 255, 255, 255, 0, 31, 238, 5, 251, 151, 174, 28, 81, 0, 0, 0, 0, 73, 69,
        78, 68, 174, 66, 96, 130,
    ];

    // 4x1 1-bit grayscale, pixel bits 1010.
    const GRAY1_4X1: [u8; 67] = [
        137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82, 0, 0, 0, 4, 0, 0, 0, 1, 1,
        0, 0, 0, 0, 209, 71, 50, 96, 0, 0, 0, 10, 73, 68, 65, 84, 120, 218, 99, 88, 0, 0, 0, 162,
        0, 161, 113, 5, 203, 65, 0, 0, 0, 0, 73, 69, 78, 68, 174, 66, 96, 130,
    ];

    // 2x2 8-bit palette {red, green}, tRNS alpha {255, 0}; indexes
    // 0,1 / 1,0 so the green pixels are fully transparent.
    const PAL8_2X2: [u8; 101] = [
        137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82, 0, 0, 0, 2, 0, 0, 0, 2, 8,
        3, 0, 0, 0, 69, 104, 253, 22, 0, 0, 0, 6, 80, 76, 84, 69, 255, 0, 0, 0, 255, 0, 210, 135,
        239, 113, 0, 0, 0, 2, 116, 82, 78, 83, 255, 0, 229, 183, 48, 74, 0, 0, 0, 12, 73, 68, 65,
        84, 120, 218, 99, 96, 96, 4, 66, 0, 0, 12, 0, 3, 21, 158, 24, 252, 0, 0, 0, 0, 73, 69,
        78, 68, 174, 66, 96, 130,
    ];

    // 2x2 8-bit grayscale using the sub filter on row 0 and the up filter
    // on row 1; pixels 10,30 / 15,40.
    const GRAY8_FILTERED: [u8; 71] = [
        137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82, 0, 0, 0, 2, 0, 0, 0, 2, 8,
        0, 0, 0, 0, 87, 221, 82, 248, 0, 0, 0, 14, 73, 68, 65, 84, 120, 218, 99, 228, 18, 97, 98,
        229, 2, 0, 0, 168, 0, 49, 109, 233, 243, 130, 0, 0, 0, 0, 73, 69, 78, 68, 174, 66, 96,
        130,
    ];

    #[test]
    fn test_open_reads_dimensions() {
        let img = Image::open(Box::new(Cursor::new(RGB8_2X2.to_vec()))).unwrap();
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 2);
        assert_eq!(img.flags(), ImageFlags::empty());
    }

    #[test]
    fn test_bad_signature_is_bad_format() {
        let mut data = RGB8_2X2.to_vec();
        data[0] = 0;
        assert_eq!(
            Image::open(Box::new(Cursor::new(data))).unwrap_err(),
            ImageError::BadFormat
        );
    }

    #[test]
    fn test_interlaced_rejected() {
        let mut data = RGB8_2X2.to_vec();
        data[28] = 1; // interlace byte of IHDR
        assert_eq!(
            Image::open(Box::new(Cursor::new(data))).unwrap_err(),
            ImageError::Unsupported
        );
    }

    #[test]
    fn test_draw_rgb8() {
        let mut img = Image::open(Box::new(Cursor::new(RGB8_2X2.to_vec()))).unwrap();
        let (d, fb) = framebuffer_display(4, 4);
        img.draw(&d, Rect::new(0, 0, 2, 2), 0, 0).unwrap();
        let fb = fb.lock();
        assert_eq!(fb[0], Color::RED);
        assert_eq!(fb[1], Color::BLUE);
        assert_eq!(fb[4], Color::GREEN);
        assert_eq!(fb[5], Color::WHITE);
    }

    #[test]
    fn test_draw_gray1_scaling() {
        let mut img = Image::open(Box::new(Cursor::new(GRAY1_4X1.to_vec()))).unwrap();
        let (d, fb) = framebuffer_display(4, 1);
        img.draw(&d, Rect::new(0, 0, 4, 1), 0, 0).unwrap();
        let fb = fb.lock();
        assert_eq!(fb[0], Color::WHITE);
        assert_eq!(fb[1], Color::BLACK);
        assert_eq!(fb[2], Color::WHITE);
        assert_eq!(fb[3], Color::BLACK);
    }

    #[test]
    fn test_palette_alpha_skips_pixels() {
        let mut img = Image::open(Box::new(Cursor::new(PAL8_2X2.to_vec()))).unwrap();
        assert!(img.flags().contains(ImageFlags::TRANSPARENT));

        let (d, fb) = framebuffer_display(2, 2);
        d.clear(Color::GRAY);
        img.draw(&d, Rect::new(0, 0, 2, 2), 0, 0).unwrap();
        let fb = fb.lock();
        // Index 1 has alpha 0, so those pixels keep the cleared color.
        assert_eq!(fb[0], Color::RED);
        assert_eq!(fb[1], Color::GRAY);
        assert_eq!(fb[2], Color::GRAY);
        assert_eq!(fb[3], Color::RED);
    }

    #[test]
    fn test_sub_and_up_filters() {
        let mut img = Image::open(Box::new(Cursor::new(GRAY8_FILTERED.to_vec()))).unwrap();
        let (d, fb) = framebuffer_display(2, 2);
        img.draw(&d, Rect::new(0, 0, 2, 2), 0, 0).unwrap();
        let fb = fb.lock();
        assert_eq!(fb[0], Color::from_luma(10));
        assert_eq!(fb[1], Color::from_luma(30));
        assert_eq!(fb[2], Color::from_luma(15));
        assert_eq!(fb[3], Color::from_luma(40));
    }

    #[test]
    fn test_sub_window_draw() {
        let mut img = Image::open(Box::new(Cursor::new(RGB8_2X2.to_vec()))).unwrap();
        let (d, fb) = framebuffer_display(4, 4);
        // Just the bottom-right source pixel, drawn at (2,2).
        img.draw(&d, Rect::new(2, 2, 1, 1), 1, 1).unwrap();
        let fb = fb.lock();
        assert_eq!(fb[2 * 4 + 2], Color::WHITE);
        assert_eq!(fb[0], Color::BLACK);
    }

    #[test]
    fn test_cached_draw_matches_streamed() {
        let mut img1 = Image::open(Box::new(Cursor::new(RGB8_2X2.to_vec()))).unwrap();
        let mut img2 = Image::open(Box::new(Cursor::new(RGB8_2X2.to_vec()))).unwrap();
        img2.cache().unwrap();

        let (a, fa) = framebuffer_display(4, 4);
        let (b, fbb) = framebuffer_display(4, 4);
        img1.draw(&a, Rect::new(0, 0, 2, 2), 0, 0).unwrap();
        img2.draw(&b, Rect::new(0, 0, 2, 2), 0, 0).unwrap();
        assert_eq!(*fa.lock(), *fbb.lock());
    }

    #[test]
    fn test_missing_idat_is_bad_data() {
        // Signature + IHDR + IEND with no image data.
        let mut data = Vec::new();
        data.extend_from_slice(&RGB8_2X2[..33]);
        data.extend_from_slice(&RGB8_2X2[63..]);
        assert_eq!(
            Image::open(Box::new(Cursor::new(data))).unwrap_err(),
            ImageError::BadData
        );
    }
}
