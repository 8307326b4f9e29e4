//! GIF decoder.
//!
//! Handles GIF87a and GIF89a: global and local palettes, interlacing,
//! frame transparency, frame disposal, Netscape loop counts and multi-frame
//! animation. Frames decode on the fly from the stream through a 12-bit
//! LZW decoder, or can be cached as palette indices for fast redraws of
//! looping animations.
//!
//! Frame disposal "restore to previous" is rendered as a clear to the
//! background color, which the format allows.

use crate::basics::{Coord, Rect};
use crate::color::Color;
use crate::image::{Delay, ImageError, ImageFlags, ImageResult, ImageStream};
use crate::surface::Display;

/// Pixels buffered per blit while drawing.
const BLIT_BUFFER_SIZE: usize = 32;

const MAX_CODE_BITS: u8 = 12;
/// Largest real LZW code.
const CODE_MAX: u16 = 4095;
/// Sentinel for "no code": above every real and special code.
const CODE_NONE: u16 = 4098;

// Per-frame flags.
const FRAME_INTERLACE: u8 = 0x01;
const FRAME_TRANSPARENT: u8 = 0x02;
const FRAME_DISPOSE_CLEAR: u8 = 0x04;
const FRAME_DISPOSE_RESTORE: u8 = 0x08;

/// Interlaced GIFs store rows in four passes.
const INTERLACE_PASSES: [(Coord, Coord); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];
const SEQUENTIAL_PASS: [(Coord, Coord); 1] = [(0, 1)];

#[derive(Copy, Clone, Default)]
struct FrameInfo {
    /// File position of the frame's first block (extensions included).
    posstart: u64,
    /// File position of the local palette.
    pospal: u64,
    /// File position of the LZW minimum-code-size byte.
    posimg: u64,
    /// File position just past the image data, or 0 if not yet known.
    posend: u64,
    x: Coord,
    y: Coord,
    width: Coord,
    height: Coord,
    /// Local palette entries, 0 meaning "use the global palette".
    palsize: u16,
    flags: u8,
    /// Transparent palette index, valid when FRAME_TRANSPARENT is set.
    paltrans: u8,
    /// Frame delay in 1/100ths of a second.
    delay: u16,
}

#[derive(Copy, Clone, Default)]
struct DisposeInfo {
    flags: u8,
    x: Coord,
    y: Coord,
    width: Coord,
    height: Coord,
}

/// A fully decoded frame held as palette indices.
struct FrameCache {
    frame: FrameInfo,
    palette: Vec<Color>,
    bits: Vec<u8>,
}

/// What advancing to the next frame found.
enum FrameEvent {
    Ready,
    Loop,
    Eof,
}

pub(crate) struct GifImage {
    pub(crate) width: Coord,
    pub(crate) height: Coord,
    pub(crate) flags: ImageFlags,
    /// Background palette index from the screen descriptor.
    bgcolor: u8,
    global_palette: Vec<Color>,
    frame0pos: u64,
    looping: bool,
    loop_forever: bool,
    loops: u16,
    frame: FrameInfo,
    dispose: DisposeInfo,
    /// Cached frames ordered by their start position in the file.
    caches: Vec<FrameCache>,
    curcache: Option<usize>,
}

// ============================================================================
// LZW decoding
// ============================================================================

struct LzwDecoder {
    blocksz: u8,
    /// Minimum code size from the image data header.
    bitsperpixel: u8,
    bitspercode: u8,
    shiftbits: u8,
    shiftdata: u32,
    maxcodesz: u16,
    code_clear: u16,
    code_eof: u16,
    code_max: u16,
    code_last: u16,
    stackcnt: usize,
    buf: [u8; BLIT_BUFFER_SIZE],
    prefix: Vec<u16>,
    suffix: Vec<u8>,
    stack: Vec<u8>,
}

impl LzwDecoder {
    fn new(min_code_size: u8) -> LzwDecoder {
        let code_clear = 1u16 << min_code_size;
        LzwDecoder {
            blocksz: 0,
            bitsperpixel: min_code_size,
            bitspercode: min_code_size + 1,
            shiftbits: 0,
            shiftdata: 0,
            maxcodesz: 1 << (min_code_size + 1),
            code_clear,
            code_eof: code_clear + 1,
            code_max: code_clear + 2,
            code_last: CODE_NONE,
            stackcnt: 0,
            buf: [0; BLIT_BUFFER_SIZE],
            prefix: vec![CODE_NONE; CODE_MAX as usize + 1],
            suffix: vec![0; CODE_MAX as usize + 1],
            stack: vec![0; CODE_MAX as usize + 1],
        }
    }

    #[inline]
    fn at_eof(&self) -> bool {
        self.code_last == self.code_eof
    }

    /// Walk the prefix chain down to the first pixel of a code.
    fn first_pixel(&self, mut code: u16) -> u16 {
        let mut guard = 0;
        while code > self.code_clear && guard <= CODE_MAX {
            if code > CODE_MAX {
                return CODE_NONE;
            }
            code = self.prefix[code as usize];
            guard += 1;
        }
        code
    }

    /// Decode up to a buffer's worth of pixel indices into `self.buf`.
    ///
    /// Returns the count decoded. Zero means either genuine end of image
    /// data (`at_eof()` is then true) or corrupt LZW data.
    fn get_bytes(&mut self, stream: &mut dyn ImageStream) -> usize {
        let mut cnt = 0;

        if self.at_eof() {
            return 0;
        }

        while cnt < self.buf.len() {
            // Drain the pixel stack first.
            if self.stackcnt > 0 {
                self.stackcnt -= 1;
                self.buf[cnt] = self.stack[self.stackcnt];
                cnt += 1;
                continue;
            }

            // Accumulate enough bits for one code, starting new data
            // sub-blocks as needed. Some encoders just end the file, so a
            // short read is treated as the EOF code.
            while self.shiftbits < self.bitspercode {
                if self.blocksz == 0 {
                    match stream.read_u8() {
                        Ok(n) if n != 0 => self.blocksz = n,
                        _ => {
                            self.code_last = self.code_eof;
                            return cnt;
                        }
                    }
                }
                match stream.read_u8() {
                    Ok(b) => {
                        self.shiftdata |= (b as u32) << self.shiftbits;
                        self.shiftbits += 8;
                        self.blocksz -= 1;
                    }
                    Err(_) => {
                        self.code_last = self.code_eof;
                        return cnt;
                    }
                }
            }
            let code = (self.shiftdata & ((1u32 << self.bitspercode) - 1)) as u16;
            self.shiftdata >>= self.bitspercode;
            self.shiftbits -= self.bitspercode;

            // Grow the code size once the table fills, capped at 12 bits.
            if self.code_max < CODE_MAX + 2 {
                self.code_max += 1;
                if self.code_max > self.maxcodesz && self.bitspercode < MAX_CODE_BITS {
                    self.maxcodesz <<= 1;
                    self.bitspercode += 1;
                }
            }

            if code == self.code_eof {
                // Skip whatever data sub-blocks remain.
                loop {
                    let pos = stream.position();
                    let _ = stream.seek_to(pos + self.blocksz as u64);
                    match stream.read_u8() {
                        Ok(n) if n != 0 => self.blocksz = n,
                        _ => break,
                    }
                }
                self.code_last = self.code_eof;
                break;
            }

            if code == self.code_clear {
                for p in self.prefix.iter_mut() {
                    *p = CODE_NONE;
                }
                self.code_max = self.code_eof + 1;
                self.bitspercode = self.bitsperpixel + 1;
                self.maxcodesz = 1 << self.bitspercode;
                self.code_last = CODE_NONE;
                continue;
            }

            if code < self.code_clear {
                // A raw pixel.
                self.buf[cnt] = code as u8;
                cnt += 1;
            } else {
                // Trace the prefix chain, pushing suffixes on the stack.
                let mut prefix;
                if self.prefix[code as usize] != CODE_NONE {
                    prefix = code;
                } else if code == self.code_max - 2 && self.stackcnt < self.stack.len() {
                    // The one legal forward reference: the code being
                    // defined right now, whose suffix is the first pixel
                    // of the previous code.
                    prefix = self.code_last;
                    let px = self.first_pixel(self.code_last) as u8;
                    self.suffix[(self.code_max - 2) as usize] = px;
                    self.stack[self.stackcnt] = px;
                    self.stackcnt += 1;
                } else {
                    return 0;
                }

                // The stack doubles as the loop guard against cycles in a
                // corrupt prefix table.
                while self.stackcnt < self.stack.len()
                    && prefix > self.code_clear
                    && prefix <= CODE_MAX
                {
                    self.stack[self.stackcnt] = self.suffix[prefix as usize];
                    self.stackcnt += 1;
                    prefix = self.prefix[prefix as usize];
                }
                if self.stackcnt >= self.stack.len() || prefix > CODE_MAX {
                    return 0;
                }
                self.stack[self.stackcnt] = prefix as u8;
                self.stackcnt += 1;
            }

            // Define the next table entry from the previous code.
            if self.code_last != CODE_NONE
                && self.prefix[(self.code_max - 2) as usize] == CODE_NONE
            {
                self.prefix[(self.code_max - 2) as usize] = self.code_last;
                let src = if code == self.code_max - 2 {
                    self.code_last
                } else {
                    code
                };
                self.suffix[(self.code_max - 2) as usize] = self.first_pixel(src) as u8;
            }
            self.code_last = code;
        }
        cnt
    }
}

// ============================================================================
// Container parsing
// ============================================================================

impl GifImage {
    pub(crate) fn open(stream: &mut dyn ImageStream) -> ImageResult<GifImage> {
        let mut hdr = [0u8; 6];
        if stream.read(&mut hdr)? != 6 {
            return Err(ImageError::BadFormat);
        }
        if &hdr[0..4] != b"GIF8" || (hdr[4] != b'7' && hdr[4] != b'9') || hdr[5] != b'a' {
            return Err(ImageError::BadFormat);
        }

        // Logical screen descriptor.
        let mut lsd = [0u8; 7];
        stream.read_exact_buf(&mut lsd)?;
        let mut img = GifImage {
            width: u16::from_le_bytes([lsd[0], lsd[1]]) as Coord,
            height: u16::from_le_bytes([lsd[2], lsd[3]]) as Coord,
            flags: ImageFlags::empty(),
            bgcolor: lsd[5],
            global_palette: Vec::new(),
            frame0pos: 0,
            looping: false,
            loop_forever: false,
            loops: 0,
            frame: FrameInfo::default(),
            dispose: DisposeInfo::default(),
            caches: Vec::new(),
            curcache: None,
        };

        if lsd[4] & 0x80 != 0 {
            let palsize = 2usize << (lsd[4] & 0x07);
            let mut rgb = [0u8; 3];
            for _ in 0..palsize {
                stream.read_exact_buf(&mut rgb)?;
                img.global_palette.push(Color::rgb(rgb[0], rgb[1], rgb[2]));
            }
        }
        img.frame0pos = stream.position();

        match img.init_frame(stream) {
            Ok(FrameEvent::Ready) => Ok(img),
            Err(ImageError::Unsupported) => Err(ImageError::Unsupported),
            Err(ImageError::NoMemory) => Err(ImageError::NoMemory),
            // A trailer or loop before the first frame is malformed.
            _ => Err(ImageError::BadData),
        }
    }

    /// Parse blocks from the current file position up to the next image
    /// descriptor, filling in `self.frame`.
    fn init_frame(&mut self, stream: &mut dyn ImageStream) -> ImageResult<FrameEvent> {
        // Keep the outgoing frame's disposal wishes.
        self.dispose = DisposeInfo {
            flags: self.frame.flags,
            x: self.frame.x,
            y: self.frame.y,
            width: self.frame.width,
            height: self.frame.height,
        };

        // A cached frame at this position restores instantly.
        let pos = stream.position();
        for (i, cache) in self.caches.iter().enumerate() {
            if cache.frame.posstart > pos {
                break;
            }
            if cache.frame.posstart == pos {
                self.frame = cache.frame;
                self.curcache = Some(i);
                return Ok(FrameEvent::Ready);
            }
        }

        self.curcache = None;
        self.frame.posstart = pos;
        self.frame.flags = 0;
        self.frame.delay = 0;
        self.frame.palsize = 0;

        loop {
            match stream.read_u8()? {
                // Image descriptor.
                0x2C => {
                    let mut buf = [0u8; 9];
                    stream.read_exact_buf(&mut buf)?;
                    self.frame.x = u16::from_le_bytes([buf[0], buf[1]]) as Coord;
                    self.frame.y = u16::from_le_bytes([buf[2], buf[3]]) as Coord;
                    self.frame.width = u16::from_le_bytes([buf[4], buf[5]]) as Coord;
                    self.frame.height = u16::from_le_bytes([buf[6], buf[7]]) as Coord;
                    if buf[8] & 0x80 != 0 {
                        self.frame.palsize = 2 << (buf[8] & 0x07);
                    }
                    if buf[8] & 0x40 != 0 {
                        self.frame.flags |= FRAME_INTERLACE;
                    }
                    self.frame.pospal = stream.position();
                    self.frame.posimg = self.frame.pospal + self.frame.palsize as u64 * 3;
                    self.frame.posend = 0;

                    if self.frame.posstart != self.frame0pos {
                        self.flags |= ImageFlags::ANIMATED;
                    }
                    return Ok(FrameEvent::Ready);
                }

                // Extension.
                0x21 => match stream.read_u8()? {
                    // Graphic control.
                    0xF9 => {
                        let mut buf = [0u8; 6];
                        stream.read_exact_buf(&mut buf)?;
                        if buf[0] != 4 || buf[5] != 0 {
                            return Err(ImageError::BadData);
                        }
                        match buf[1] & 0x1C {
                            0x00 | 0x04 => {}
                            0x08 => self.frame.flags |= FRAME_DISPOSE_CLEAR,
                            // 0x10 shows up from buggy encoders meaning 0x0C.
                            0x0C | 0x10 => self.frame.flags |= FRAME_DISPOSE_RESTORE,
                            _ => return Err(ImageError::Unsupported),
                        }
                        if buf[1] & 0x01 != 0 {
                            self.frame.flags |= FRAME_TRANSPARENT;
                            // Set once, never cleared.
                            self.flags |= ImageFlags::TRANSPARENT;
                        }
                        if buf[1] & 0x02 != 0 {
                            self.flags |= ImageFlags::MULTIPAGE;
                        } else {
                            self.flags &= !ImageFlags::MULTIPAGE;
                        }
                        self.frame.delay = u16::from_le_bytes([buf[2], buf[3]]);
                        self.frame.paltrans = buf[4];
                    }

                    // Application: only the Netscape loop count matters.
                    0xFF => {
                        if !self.looping {
                            let mut buf = [0u8; 16];
                            stream.read_exact_buf(&mut buf)?;
                            if buf[0] != 11 && buf[12] != 3 {
                                return Err(ImageError::BadData);
                            }
                            if &buf[1..12] == b"NETSCAPE2.0" && buf[13] == 1 {
                                self.loops = u16::from_le_bytes([buf[14], buf[15]]);
                                self.looping = true;
                                if self.loops == 0 {
                                    self.loop_forever = true;
                                }
                            }
                        }
                        skip_data_blocks(stream)?;
                    }

                    // Graphic rendering blocks such as plain text would
                    // need to be drawn; everything else is skippable.
                    other => {
                        if other <= 0x7F {
                            return Err(ImageError::Unsupported);
                        }
                        skip_data_blocks(stream)?;
                    }
                },

                // Trailer.
                0x3B => {
                    if !self.looping {
                        return Ok(FrameEvent::Eof);
                    }
                    if !self.loop_forever {
                        if self.loops == 0 {
                            return Ok(FrameEvent::Eof);
                        }
                        self.loops -= 1;
                    }
                    stream.seek_to(self.frame0pos)?;
                    return Ok(FrameEvent::Loop);
                }

                _ => return Err(ImageError::Unsupported),
            }
        }
    }

    /// Read the frame's palette and position the stream at its image data.
    fn start_decode(
        &self,
        stream: &mut dyn ImageStream,
    ) -> ImageResult<(LzwDecoder, Vec<Color>)> {
        let palette = if self.frame.palsize > 0 {
            stream.seek_to(self.frame.pospal)?;
            let mut pal = Vec::with_capacity(self.frame.palsize as usize);
            let mut rgb = [0u8; 3];
            for _ in 0..self.frame.palsize {
                stream.read_exact_buf(&mut rgb)?;
                pal.push(Color::rgb(rgb[0], rgb[1], rgb[2]));
            }
            pal
        } else if !self.global_palette.is_empty() {
            self.global_palette.clone()
        } else {
            return Err(ImageError::BadData);
        };

        stream.seek_to(self.frame.posimg)?;
        let min_code_size = stream.read_u8()?;
        if min_code_size >= MAX_CODE_BITS {
            return Err(ImageError::BadData);
        }
        Ok((LzwDecoder::new(min_code_size), palette))
    }

    fn passes(&self) -> &'static [(Coord, Coord)] {
        if self.frame.flags & FRAME_INTERLACE != 0 {
            &INTERLACE_PASSES
        } else {
            &SEQUENTIAL_PASS
        }
    }

    /// Decode the current frame into a palette-index cache so redraws and
    /// animation loops avoid the LZW pass.
    pub(crate) fn cache(&mut self, stream: &mut dyn ImageStream) -> ImageResult<()> {
        if self.curcache.is_some() {
            return Ok(());
        }

        let frame = self.frame;
        let (mut dec, palette) = self.start_decode(stream)?;

        let mut bits = Vec::new();
        bits.try_reserve_exact(frame.width as usize * frame.height as usize)
            .map_err(|_| ImageError::NoMemory)?;
        bits.resize(frame.width as usize * frame.height as usize, 0);

        let fill = if frame.flags & FRAME_TRANSPARENT != 0 {
            frame.paltrans
        } else {
            0
        };

        let mut cnt = 0;
        let mut qi = 0;
        for &(start, step) in self.passes() {
            let mut my = start;
            while my < frame.height {
                let row = my as usize * frame.width as usize;
                for mx in 0..frame.width as usize {
                    if cnt == 0 {
                        cnt = dec.get_bytes(stream);
                        if cnt == 0 {
                            if !dec.at_eof() {
                                return Err(ImageError::BadData);
                            }
                            // Early EOF: treat the remainder as transparent.
                            dec.buf = [fill; BLIT_BUFFER_SIZE];
                            cnt = BLIT_BUFFER_SIZE;
                        }
                        qi = 0;
                    }
                    bits[row + mx] = dec.buf[qi];
                    qi += 1;
                    cnt -= 1;
                }
                my += step;
            }
        }

        // Extra data blocks are tolerated.
        while dec.get_bytes(stream) != 0 {}
        self.frame.posend = stream.position();

        let entry = FrameCache {
            frame: self.frame,
            palette,
            bits,
        };
        let idx = self
            .caches
            .partition_point(|c| c.frame.posstart < entry.frame.posstart);
        self.caches.insert(idx, entry);
        self.curcache = Some(idx);
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
        bg: Color,
    ) -> ImageResult<()> {
        let (mut x, mut y, mut cx, mut cy) = (dest.x, dest.y, dest.cx, dest.cy);
        let (mut sx, mut sy) = (sx, sy);

        // Dispose of the previous frame inside the requested window.
        if self.dispose.flags & (FRAME_DISPOSE_CLEAR | FRAME_DISPOSE_RESTORE) != 0 {
            let mx = self.dispose.x.max(sx);
            let my = self.dispose.y.max(sy);
            let fx = (self.dispose.x + self.dispose.width).min(sx + cx);
            let fy = (self.dispose.y + self.dispose.height).min(sy + cy);
            if fx > mx && fy > my {
                // Restoring is rendered as a clear. When the disposed frame
                // was transparent (or the background index is invalid) the
                // caller's background color stands in.
                let fill = if self.dispose.flags & FRAME_TRANSPARENT != 0
                    || self.bgcolor as usize >= self.global_palette.len()
                {
                    bg
                } else {
                    self.global_palette[self.bgcolor as usize]
                };
                display.fill_area(Rect::new(x + mx - sx, y + my - sy, fx - mx, fy - my), fill);
            }
        }

        // Clip the window to this frame's rectangle.
        let fx = self.frame.x + self.frame.width;
        let fy = self.frame.y + self.frame.height;
        if sx >= fx || sy >= fy || sx + cx < self.frame.x || sy + cy < self.frame.y {
            return Ok(());
        }
        if sx < self.frame.x {
            let d = self.frame.x - sx;
            x += d;
            cx -= d;
            sx = self.frame.x;
        }
        if sy < self.frame.y {
            let d = self.frame.y - sy;
            y += d;
            cy -= d;
            sy = self.frame.y;
        }
        if sx + cx > fx {
            cx = fx - sx;
        }
        if sy + cy > fy {
            cy = fy - sy;
        }

        // Frame-relative window from here on.
        sx -= self.frame.x;
        sy -= self.frame.y;
        let fx = sx + cx;
        let fy = sy + cy;

        let transparent = self.frame.flags & FRAME_TRANSPARENT != 0;
        let paltrans = self.frame.paltrans;

        if let Some(idx) = self.curcache {
            // Cached path: replay the stored palette indices.
            let cache = &self.caches[idx];
            for my in sy..fy {
                let row = my as usize * self.frame.width as usize;
                let mut run = PixelRun::new(display, x - sx, y + my - sy);
                for mx in sx..fx {
                    let col = cache.bits[row + mx as usize];
                    if transparent && col == paltrans {
                        run.skip();
                        continue;
                    }
                    run.push(mx, palette_color(&cache.palette, col));
                }
                run.flush();
            }
            return Ok(());
        }

        // Streaming path: decode the whole frame, emitting only the
        // window.
        let (mut dec, palette) = self.start_decode(stream)?;
        let mut cnt = 0;
        let mut qi = 0;
        for &(start, step) in self.passes() {
            let mut my = start;
            while my < self.frame.height {
                let mut run = PixelRun::new(display, x - sx, y + my - sy);
                let mut mx = 0;
                while mx < self.frame.width {
                    if cnt == 0 {
                        cnt = dec.get_bytes(stream);
                        if cnt == 0 {
                            if !dec.at_eof() {
                                return Err(ImageError::BadData);
                            }
                            // Early EOF: the rest of the frame stays
                            // undrawn.
                            break;
                        }
                        qi = 0;
                    }
                    if my >= sy && my < fy && mx >= sx && mx < fx {
                        let col = dec.buf[qi];
                        if transparent && col == paltrans {
                            run.skip();
                        } else {
                            run.push(mx, palette_color(&palette, col));
                        }
                    } else {
                        run.flush();
                    }
                    qi += 1;
                    cnt -= 1;
                    mx += 1;
                }
                run.flush();
                my += step;
            }
        }

        while dec.get_bytes(stream) != 0 {}
        self.frame.posend = stream.position();
        Ok(())
    }

    /// Advance to the next frame, returning the delay the current frame
    /// asked for, or [`Delay::Infinite`] when the animation is over.
    pub(crate) fn next_frame(&mut self, stream: &mut dyn ImageStream) -> Delay {
        let delay = self.frame.delay as u32 * 10;

        if self.frame.posend == 0 {
            // The frame was never decoded, so walk its data blocks to find
            // where it ends.
            if stream.seek_to(self.frame.posimg + 1).is_err() {
                return Delay::Infinite;
            }
            loop {
                match stream.read_u8() {
                    Ok(0) => break,
                    Ok(n) => {
                        let pos = stream.position();
                        if stream.seek_to(pos + n as u64).is_err() {
                            return Delay::Infinite;
                        }
                    }
                    Err(_) => return Delay::Infinite,
                }
            }
            self.frame.posend = stream.position();
        }

        if stream.seek_to(self.frame.posend).is_err() {
            return Delay::Infinite;
        }

        // At most one loop-back, so a broken file cannot cycle forever.
        for _ in 0..2 {
            match self.init_frame(stream) {
                Ok(FrameEvent::Ready) => return Delay::Millis(delay),
                Ok(FrameEvent::Loop) => continue,
                _ => return Delay::Infinite,
            }
        }
        Delay::Infinite
    }
}

#[inline]
fn palette_color(palette: &[Color], idx: u8) -> Color {
    palette.get(idx as usize).copied().unwrap_or(Color::BLACK)
}

/// Skip 0-terminated data sub-blocks.
fn skip_data_blocks(stream: &mut dyn ImageStream) -> ImageResult<()> {
    loop {
        match stream.read_u8()? {
            0 => return Ok(()),
            n => {
                let pos = stream.position();
                stream.seek_to(pos + n as u64)?;
            }
        }
    }
}

// ============================================================================
// Pixel run batching
// ============================================================================

/// Batches consecutive opaque pixels of one row into a single blit.
/// `x0`/`y0` are the display coordinates of image column 0 on this row.
struct PixelRun<'a> {
    display: &'a Display,
    x0: Coord,
    y0: Coord,
    start: Coord,
    cnt: usize,
    buf: [Color; BLIT_BUFFER_SIZE],
}

impl<'a> PixelRun<'a> {
    fn new(display: &'a Display, x0: Coord, y0: Coord) -> PixelRun<'a> {
        PixelRun {
            display,
            x0,
            y0,
            start: 0,
            cnt: 0,
            buf: [Color::BLACK; BLIT_BUFFER_SIZE],
        }
    }

    fn push(&mut self, mx: Coord, c: Color) {
        if self.cnt == 0 {
            self.start = mx;
        }
        self.buf[self.cnt] = c;
        self.cnt += 1;
        if self.cnt >= BLIT_BUFFER_SIZE {
            self.flush();
        }
    }

    /// A transparent pixel ends the current run.
    fn skip(&mut self) {
        self.flush();
    }

    fn flush(&mut self) {
        let x = self.x0 + self.start;
        match self.cnt {
            0 => return,
            1 => self.display.draw_pixel(x, self.y0, self.buf[0]),
            n => self.display.blit(
                Rect::new(x, self.y0, n as Coord, 1),
                0,
                0,
                n as Coord,
                &self.buf[..n],
            ),
        }
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

    // LZW data for a 2x2 frame with indices 1,0,0,1: minimum code size 2,
    // one 3-byte sub-block holding clear,1,0,0,1,eof.
    const LZW_2X2: [u8; 6] = [0x02, 0x03, 0x0C, 0x10, 0x05, 0x00];

    fn lsd(w: u16, h: u16, global: bool) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(b"GIF89a");
        v.extend_from_slice(&w.to_le_bytes());
        v.extend_from_slice(&h.to_le_bytes());
        v.push(if global { 0x80 } else { 0x00 });
        v.push(0); // background index
        v.push(0); // aspect ratio
        v
    }

    fn descriptor(x: u16, y: u16, w: u16, h: u16) -> Vec<u8> {
        let mut v = vec![0x2C];
        v.extend_from_slice(&x.to_le_bytes());
        v.extend_from_slice(&y.to_le_bytes());
        v.extend_from_slice(&w.to_le_bytes());
        v.extend_from_slice(&h.to_le_bytes());
        v.push(0);
        v
    }

    // 2x2, palette {black, red}, pixels red,black / black,red.
    fn minimal_gif() -> Vec<u8> {
        let mut v = lsd(2, 2, true);
        v.extend_from_slice(&[0, 0, 0, 255, 0, 0]);
        v.extend_from_slice(&descriptor(0, 0, 2, 2));
        v.extend_from_slice(&LZW_2X2);
        v.push(0x3B);
        v
    }

    // Two frames; the first carries a graphic control block with a delay
    // of 10 hundredths.
    fn animated_gif(gcb_flags: u8) -> Vec<u8> {
        let mut v = lsd(2, 2, true);
        v.extend_from_slice(&[0, 0, 0, 255, 0, 0]);
        v.extend_from_slice(&[0x21, 0xF9, 0x04, gcb_flags, 10, 0, 1, 0]);
        v.extend_from_slice(&descriptor(0, 0, 2, 2));
        v.extend_from_slice(&LZW_2X2);
        v.extend_from_slice(&descriptor(0, 0, 2, 2));
        v.extend_from_slice(&LZW_2X2);
        v.push(0x3B);
        v
    }

    #[test]
    fn test_open_minimal() {
        let img = Image::open(Box::new(Cursor::new(minimal_gif()))).unwrap();
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 2);
        assert_eq!(img.flags(), ImageFlags::empty());
    }

    #[test]
    fn test_bad_header_is_bad_format() {
        let mut data = minimal_gif();
        data[3] = b'9';
        data[4] = b'9';
        assert_eq!(
            Image::open(Box::new(Cursor::new(data))).unwrap_err(),
            ImageError::BadFormat
        );
    }

    #[test]
    fn test_draw_decodes_lzw() {
        let mut img = Image::open(Box::new(Cursor::new(minimal_gif()))).unwrap();
        let (d, fb) = framebuffer_display(4, 4);
        img.draw(&d, Rect::new(0, 0, 2, 2), 0, 0).unwrap();
        let fb = fb.lock();
        assert_eq!(fb[0], Color::RED);
        assert_eq!(fb[1], Color::BLACK);
        assert_eq!(fb[4], Color::BLACK);
        assert_eq!(fb[5], Color::RED);
    }

    #[test]
    fn test_cached_draw_matches_streamed() {
        let mut img1 = Image::open(Box::new(Cursor::new(minimal_gif()))).unwrap();
        let mut img2 = Image::open(Box::new(Cursor::new(minimal_gif()))).unwrap();
        img2.cache().unwrap();

        let (a, fa) = framebuffer_display(4, 4);
        let (b, fbb) = framebuffer_display(4, 4);
        img1.draw(&a, Rect::new(0, 0, 2, 2), 0, 0).unwrap();
        img2.draw(&b, Rect::new(0, 0, 2, 2), 0, 0).unwrap();
        assert_eq!(*fa.lock(), *fbb.lock());
    }

    #[test]
    fn test_transparent_pixels_skipped() {
        // Transparency flag with index 1 (red) transparent.
        let mut v = lsd(2, 2, true);
        v.extend_from_slice(&[0, 0, 0, 255, 0, 0]);
        v.extend_from_slice(&[0x21, 0xF9, 0x04, 0x01, 0, 0, 1, 0]);
        v.extend_from_slice(&descriptor(0, 0, 2, 2));
        v.extend_from_slice(&LZW_2X2);
        v.push(0x3B);

        let mut img = Image::open(Box::new(Cursor::new(v))).unwrap();
        assert!(img.flags().contains(ImageFlags::TRANSPARENT));

        let (d, fb) = framebuffer_display(2, 2);
        d.clear(Color::GRAY);
        img.draw(&d, Rect::new(0, 0, 2, 2), 0, 0).unwrap();
        let fb = fb.lock();
        assert_eq!(fb[0], Color::GRAY);
        assert_eq!(fb[1], Color::BLACK);
        assert_eq!(fb[2], Color::BLACK);
        assert_eq!(fb[3], Color::GRAY);
    }

    #[test]
    fn test_next_frame_returns_delay() {
        let mut img = Image::open(Box::new(Cursor::new(animated_gif(0x00)))).unwrap();
        let (d, _fb) = framebuffer_display(2, 2);
        img.draw(&d, Rect::new(0, 0, 2, 2), 0, 0).unwrap();

        // Delay of 10 hundredths = 100ms, and a second frame exists.
        assert_eq!(img.next_frame(), Delay::Millis(100));
        assert!(img.flags().contains(ImageFlags::ANIMATED));

        // After the last frame the trailer ends a non-looping animation.
        assert_eq!(img.next_frame(), Delay::Infinite);
    }

    #[test]
    fn test_next_frame_without_draw() {
        // next_frame must find the frame end by walking sub-blocks when
        // the frame was never decoded.
        let mut img = Image::open(Box::new(Cursor::new(animated_gif(0x00)))).unwrap();
        assert_eq!(img.next_frame(), Delay::Millis(100));
    }

    #[test]
    fn test_frame_offset_draw() {
        // 4x4 screen with a 2x2 frame at (1,1).
        let mut v = lsd(4, 4, true);
        v.extend_from_slice(&[0, 0, 0, 255, 0, 0]);
        v.extend_from_slice(&descriptor(1, 1, 2, 2));
        v.extend_from_slice(&LZW_2X2);
        v.push(0x3B);

        let mut img = Image::open(Box::new(Cursor::new(v))).unwrap();
        let (d, fb) = framebuffer_display(4, 4);
        img.draw(&d, Rect::new(0, 0, 4, 4), 0, 0).unwrap();
        let fb = fb.lock();
        assert_eq!(fb[1 * 4 + 1], Color::RED);
        assert_eq!(fb[1 * 4 + 2], Color::BLACK);
        assert_eq!(fb[2 * 4 + 1], Color::BLACK);
        assert_eq!(fb[2 * 4 + 2], Color::RED);
        // Outside the frame stays untouched.
        assert_eq!(fb[0], Color::BLACK);
    }

    #[test]
    fn test_dispose_clear_fills_background() {
        // Frame 1 asks for dispose-to-background; frame 2 follows.
        let mut img = Image::open(Box::new(Cursor::new(animated_gif(0x08)))).unwrap();
        let (d, fb) = framebuffer_display(2, 2);
        img.draw(&d, Rect::new(0, 0, 2, 2), 0, 0).unwrap();
        assert_eq!(img.next_frame(), Delay::Millis(100));

        // Frame 2's draw first clears the disposed area to the background
        // palette entry (index 0 = black), then draws the frame.
        img.draw(&d, Rect::new(0, 0, 2, 2), 0, 0).unwrap();
        let fb = fb.lock();
        assert_eq!(fb[0], Color::RED);
        assert_eq!(fb[3], Color::RED);
    }
}
