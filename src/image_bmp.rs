//! Windows BMP decoder.
//!
//! Handles the 12-byte legacy core header and the modern >=40-byte info
//! header; 1/2/4/8-bit palette images (with RLE4/RLE8 compression for the
//! 4- and 8-bit depths), 16- and 32-bit images with optional channel bit
//! masks, and plain 24-bit images. Rows are decoded one at a time and fed
//! to the display through the blit path; top-down and bottom-up files only
//! differ in which file row maps to which image row.

use crate::basics::{Coord, Rect};
use crate::color::Color;
use crate::image::{ImageError, ImageResult, ImageStream};
use crate::surface::Display;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Compression {
    Rgb,
    Rle8,
    Rle4,
    Bitfields,
}

/// One channel extraction mask with its top bit pre-located so a raw
/// 16/32-bit value normalizes to 0-255 with a single shift.
#[derive(Copy, Clone)]
struct ChannelMask {
    mask: u32,
    hi: i32,
}

impl ChannelMask {
    fn new(mask: u32) -> ChannelMask {
        ChannelMask {
            mask,
            hi: 31 - mask.leading_zeros() as i32,
        }
    }

    fn apply(&self, raw: u32) -> u8 {
        if self.mask == 0 {
            return 0;
        }
        let v = raw & self.mask;
        if self.hi >= 7 {
            (v >> (self.hi - 7)) as u8
        } else {
            (v << (7 - self.hi)) as u8
        }
    }
}

pub(crate) struct BmpImage {
    pub(crate) width: Coord,
    pub(crate) height: Coord,
    bpp: u16,
    compression: Compression,
    top_down: bool,
    data_offset: u64,
    row_bytes: usize,
    palette: Vec<Color>,
    masks: [ChannelMask; 3],
    cache: Option<Vec<Color>>,
}

impl BmpImage {
    pub(crate) fn open(stream: &mut dyn ImageStream) -> ImageResult<BmpImage> {
        let mut magic = [0u8; 2];
        if stream.read(&mut magic)? != 2 || &magic != b"BM" {
            return Err(ImageError::BadFormat);
        }

        // Rest of BITMAPFILEHEADER.
        let _filesize = stream.read_le_u32()?;
        let _reserved = stream.read_le_u32()?;
        let data_offset = stream.read_le_u32()? as u64;

        let hdrsize = stream.read_le_u32()?;
        let width;
        let height;
        let bpp;
        let mut top_down = false;
        let mut compression = Compression::Rgb;
        let mut clrused = 0u32;
        let core = hdrsize == 12;
        if core {
            width = stream.read_le_u16()? as Coord;
            height = stream.read_le_u16()? as Coord;
            let planes = stream.read_le_u16()?;
            bpp = stream.read_le_u16()?;
            if planes != 1 {
                return Err(ImageError::BadData);
            }
            if !matches!(bpp, 1 | 4 | 8 | 24) {
                return Err(ImageError::BadData);
            }
        } else if hdrsize >= 40 {
            let w = stream.read_le_u32()? as i32;
            let h = stream.read_le_u32()? as i32;
            let planes = stream.read_le_u16()?;
            bpp = stream.read_le_u16()?;
            compression = match stream.read_le_u32()? {
                0 => Compression::Rgb,
                1 => Compression::Rle8,
                2 => Compression::Rle4,
                3 => Compression::Bitfields,
                _ => return Err(ImageError::Unsupported),
            };
            let _sizeimage = stream.read_le_u32()?;
            let _xppm = stream.read_le_u32()?;
            let _yppm = stream.read_le_u32()?;
            clrused = stream.read_le_u32()?;
            let _clrimportant = stream.read_le_u32()?;
            stream.skip(hdrsize as u64 - 40)?;

            if planes != 1 {
                return Err(ImageError::BadData);
            }
            width = w as Coord;
            if h < 0 {
                top_down = true;
                height = -h as Coord;
            } else {
                height = h as Coord;
            }
        } else {
            return Err(ImageError::BadData);
        }
        if width <= 0 || height <= 0 {
            return Err(ImageError::BadData);
        }

        // Depth/compression combinations we know how to decode.
        match (bpp, compression) {
            (1 | 2 | 4 | 8, Compression::Rgb) => {}
            (8, Compression::Rle8) => {}
            (4, Compression::Rle4) => {}
            (16 | 32, Compression::Rgb | Compression::Bitfields) => {}
            (24, Compression::Rgb) => {}
            _ => return Err(ImageError::Unsupported),
        }

        // Channel masks for the direct-color depths.
        let mut masks = match bpp {
            16 => [
                ChannelMask::new(0x7C00),
                ChannelMask::new(0x03E0),
                ChannelMask::new(0x001F),
            ],
            32 => [
                ChannelMask::new(0x00FF_0000),
                ChannelMask::new(0x0000_FF00),
                ChannelMask::new(0x0000_00FF),
            ],
            _ => [ChannelMask::new(0); 3],
        };
        if compression == Compression::Bitfields {
            masks = [
                ChannelMask::new(stream.read_le_u32()?),
                ChannelMask::new(stream.read_le_u32()?),
                ChannelMask::new(stream.read_le_u32()?),
            ];
        }

        // Palette for the indexed depths.
        let mut palette = Vec::new();
        if bpp <= 8 {
            let entries = if clrused != 0 {
                clrused as usize
            } else {
                1usize << bpp
            };
            if entries > 256 {
                return Err(ImageError::BadData);
            }
            let esize = if core { 3 } else { 4 };
            let mut e = [0u8; 4];
            for _ in 0..entries {
                stream.read_exact_buf(&mut e[..esize])?;
                // Entries are stored blue, green, red.
                palette.push(Color {
                    r: e[2],
                    g: e[1],
                    b: e[0],
                });
            }
        }

        let row_bytes = ((width as usize * bpp as usize + 31) / 32) * 4;

        Ok(BmpImage {
            width,
            height,
            bpp,
            compression,
            top_down,
            data_offset,
            row_bytes,
            palette,
            masks,
            cache: None,
        })
    }

    fn pal(&self, idx: u8) -> Color {
        self.palette.get(idx as usize).copied().unwrap_or(Color::BLACK)
    }

    /// Expand pixels `sx..sx+out.len()` of a raw file row.
    fn expand_span(&self, row: &[u8], sx: Coord, out: &mut [Color]) {
        match self.bpp {
            1 | 2 | 4 => {
                let bpp = self.bpp as usize;
                let mask = (1u8 << bpp) - 1;
                for (i, c) in out.iter_mut().enumerate() {
                    let bit = (sx as usize + i) * bpp;
                    let shift = 8 - bpp - bit % 8;
                    *c = self.pal((row[bit / 8] >> shift) & mask);
                }
            }
            8 => {
                for (i, c) in out.iter_mut().enumerate() {
                    *c = self.pal(row[sx as usize + i]);
                }
            }
            16 => {
                for (i, c) in out.iter_mut().enumerate() {
                    let j = (sx as usize + i) * 2;
                    let raw = u16::from_le_bytes([row[j], row[j + 1]]) as u32;
                    *c = self.mask_color(raw);
                }
            }
            24 => {
                for (i, c) in out.iter_mut().enumerate() {
                    let j = (sx as usize + i) * 3;
                    *c = Color {
                        r: row[j + 2],
                        g: row[j + 1],
                        b: row[j],
                    };
                }
            }
            _ => {
                for (i, c) in out.iter_mut().enumerate() {
                    let j = (sx as usize + i) * 4;
                    let raw = u32::from_le_bytes([row[j], row[j + 1], row[j + 2], row[j + 3]]);
                    *c = self.mask_color(raw);
                }
            }
        }
    }

    fn mask_color(&self, raw: u32) -> Color {
        Color {
            r: self.masks[0].apply(raw),
            g: self.masks[1].apply(raw),
            b: self.masks[2].apply(raw),
        }
    }

    /// Decode the RLE pixel stream sequentially, handing each completed row
    /// of palette indices (in file order, which for RLE is bottom-up) to
    /// `emit`.
    fn decode_rle(
        &self,
        stream: &mut dyn ImageStream,
        emit: &mut dyn FnMut(Coord, &[u8]),
    ) -> ImageResult<()> {
        let rle4 = self.compression == Compression::Rle4;
        let width = self.width as usize;
        let mut row = vec![0u8; width];
        let mut x = 0usize;
        let mut file_row: Coord = 0;

        stream.seek_to(self.data_offset)?;
        while file_row < self.height {
            let n = stream.read_u8()?;
            let c = stream.read_u8()?;
            if n > 0 {
                // Encoded run: n copies of c (alternating nibbles for RLE4).
                for i in 0..n as usize {
                    if x >= width {
                        break;
                    }
                    row[x] = if rle4 {
                        if i % 2 == 0 {
                            c >> 4
                        } else {
                            c & 0x0F
                        }
                    } else {
                        c
                    };
                    x += 1;
                }
            } else {
                match c {
                    0 => {
                        // End of line.
                        emit(file_row, &row);
                        row.fill(0);
                        x = 0;
                        file_row += 1;
                    }
                    1 => {
                        // End of bitmap; the current partial row still counts.
                        emit(file_row, &row);
                        return Ok(());
                    }
                    2 => {
                        // Delta: skipped pixels are left at index zero.
                        let dx = stream.read_u8()? as usize;
                        let dy = stream.read_u8()? as Coord;
                        if dy > 0 {
                            emit(file_row, &row);
                            row.fill(0);
                            file_row += 1;
                            for _ in 1..dy {
                                if file_row >= self.height {
                                    return Ok(());
                                }
                                emit(file_row, &row);
                                file_row += 1;
                            }
                        }
                        x = (x + dx).min(width);
                    }
                    cnt => {
                        // Absolute run of cnt literal pixels, padded so the
                        // stream stays on a 16-bit boundary.
                        let cnt = cnt as usize;
                        let bytes = if rle4 { (cnt + 1) / 2 } else { cnt };
                        let mut buf = vec![0u8; bytes + bytes % 2];
                        stream.read_exact_buf(&mut buf)?;
                        for i in 0..cnt {
                            if x >= width {
                                break;
                            }
                            row[x] = if rle4 {
                                if i % 2 == 0 {
                                    buf[i / 2] >> 4
                                } else {
                                    buf[i / 2] & 0x0F
                                }
                            } else {
                                buf[i]
                            };
                            x += 1;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn cache(&mut self, stream: &mut dyn ImageStream) -> ImageResult<()> {
        if self.cache.is_some() {
            return Ok(());
        }
        let w = self.width as usize;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(w * self.height as usize)
            .map_err(|_| ImageError::NoMemory)?;
        pixels.resize(w * self.height as usize, self.pal(0));

        match self.compression {
            Compression::Rle4 | Compression::Rle8 => {
                let palette = &self.palette;
                let height = self.height;
                self.decode_rle(stream, &mut |file_row, row| {
                    let img_row = (height - 1 - file_row) as usize;
                    for (i, &idx) in row.iter().enumerate() {
                        pixels[img_row * w + i] = palette
                            .get(idx as usize)
                            .copied()
                            .unwrap_or(Color::BLACK);
                    }
                })?;
            }
            _ => {
                let mut raw = vec![0u8; self.row_bytes];
                for r in 0..self.height {
                    let file_row = if self.top_down { r } else { self.height - 1 - r };
                    stream
                        .seek_to(self.data_offset + file_row as u64 * self.row_bytes as u64)?;
                    stream.read_exact_buf(&mut raw)?;
                    self.expand_span(&raw, 0, &mut pixels[r as usize * w..(r as usize + 1) * w]);
                }
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
        if let Some(pixels) = &self.cache {
            display.blit(dest, sx, sy, self.width, pixels);
            return Ok(());
        }

        match self.compression {
            Compression::Rle4 | Compression::Rle8 => {
                let palette = &self.palette;
                let height = self.height;
                let mut span = vec![Color::BLACK; dest.cx as usize];
                self.decode_rle(stream, &mut |file_row, row| {
                    let img_row = height - 1 - file_row;
                    if img_row < sy || img_row >= sy + dest.cy {
                        return;
                    }
                    for (i, c) in span.iter_mut().enumerate() {
                        *c = palette
                            .get(row[sx as usize + i] as usize)
                            .copied()
                            .unwrap_or(Color::BLACK);
                    }
                    display.blit(
                        Rect::new(dest.x, dest.y + img_row - sy, dest.cx, 1),
                        0,
                        0,
                        dest.cx,
                        &span,
                    );
                })?;
            }
            _ => {
                let mut raw = vec![0u8; self.row_bytes];
                let mut span = vec![Color::BLACK; dest.cx as usize];
                for dy in 0..dest.cy {
                    let r = sy + dy;
                    let file_row = if self.top_down { r } else { self.height - 1 - r };
                    stream
                        .seek_to(self.data_offset + file_row as u64 * self.row_bytes as u64)?;
                    stream.read_exact_buf(&mut raw)?;
                    self.expand_span(&raw, sx, &mut span);
                    display.blit(
                        Rect::new(dest.x, dest.y + dy, dest.cx, 1),
                        0,
                        0,
                        dest.cx,
                        &span,
                    );
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
