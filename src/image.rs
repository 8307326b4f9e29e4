//! Image framework.
//!
//! [`Image::open`] probes the byte stream against each format decoder in
//! turn; the first one whose magic bytes match owns the image from then on.
//! All formats share the same surface area: query dimensions and flags,
//! optionally [`cache`](Image::cache) the decode, [`draw`](Image::draw) a
//! sub-rectangle to a display, and [`next_frame`](Image::next_frame) to
//! advance an animation.

use std::fmt;
use std::io;

use bitflags::bitflags;
use log::trace;
use thiserror::Error;

use crate::basics::{Coord, Rect};
use crate::color::Color;
use crate::image_bmp::BmpImage;
use crate::image_gif::GifImage;
use crate::image_native::NativeImage;
use crate::image_png::PngImage;
use crate::surface::Display;

/// What went wrong decoding an image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ImageError {
    /// The magic bytes did not match this format.
    #[error("not a recognised image format")]
    BadFormat,
    /// The format matched but the stream is malformed or truncated.
    #[error("malformed image data")]
    BadData,
    /// Well-formed, but uses a feature this decoder does not implement.
    #[error("unsupported image feature")]
    Unsupported,
    /// An allocation failed.
    #[error("out of memory")]
    NoMemory,
    /// The underlying stream could not be read at all.
    #[error("image stream unavailable")]
    NoSuchFile,
}

pub type ImageResult<T> = Result<T, ImageError>;

/// Recommended wait before drawing the next animation frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Delay {
    Millis(u32),
    /// Static image, or the animation has finished.
    Infinite,
}

bitflags! {
    /// Properties discovered while parsing the image.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ImageFlags: u8 {
        /// More than one frame.
        const ANIMATED    = 1 << 0;
        /// At least one frame has transparent pixels.
        const TRANSPARENT = 1 << 1;
        /// The current frame wants a user action, not a timer, to advance.
        const MULTIPAGE   = 1 << 2;
    }
}

// ============================================================================
// Byte stream
// ============================================================================

/// Seekable byte source feeding the decoders.
///
/// Implemented for anything `io::Read + io::Seek`, so files and in-memory
/// cursors both work.
pub trait ImageStream {
    /// Read up to `buf.len()` bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> ImageResult<usize>;
    fn seek_to(&mut self, pos: u64) -> ImageResult<()>;
    fn position(&mut self) -> u64;

    fn read_exact_buf(&mut self, buf: &mut [u8]) -> ImageResult<()> {
        let mut done = 0;
        while done < buf.len() {
            let n = self.read(&mut buf[done..])?;
            if n == 0 {
                return Err(ImageError::BadData);
            }
            done += n;
        }
        Ok(())
    }

    fn read_u8(&mut self) -> ImageResult<u8> {
        let mut b = [0u8; 1];
        self.read_exact_buf(&mut b)?;
        Ok(b[0])
    }

    fn read_le_u16(&mut self) -> ImageResult<u16> {
        let mut b = [0u8; 2];
        self.read_exact_buf(&mut b)?;
        Ok(u16::from_le_bytes(b))
    }

    fn read_le_u32(&mut self) -> ImageResult<u32> {
        let mut b = [0u8; 4];
        self.read_exact_buf(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }

    fn read_be_u16(&mut self) -> ImageResult<u16> {
        let mut b = [0u8; 2];
        self.read_exact_buf(&mut b)?;
        Ok(u16::from_be_bytes(b))
    }

    fn read_be_u32(&mut self) -> ImageResult<u32> {
        let mut b = [0u8; 4];
        self.read_exact_buf(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }

    fn skip(&mut self, n: u64) -> ImageResult<()> {
        let pos = self.position();
        self.seek_to(pos + n)
    }
}

impl<T: io::Read + io::Seek> ImageStream for T {
    fn read(&mut self, buf: &mut [u8]) -> ImageResult<usize> {
        io::Read::read(self, buf).map_err(|_| ImageError::NoSuchFile)
    }

    fn seek_to(&mut self, pos: u64) -> ImageResult<()> {
        io::Seek::seek(self, io::SeekFrom::Start(pos))
            .map(|_| ())
            .map_err(|_| ImageError::NoSuchFile)
    }

    fn position(&mut self) -> u64 {
        io::Seek::stream_position(self).unwrap_or(0)
    }
}

// ============================================================================
// Image handle
// ============================================================================

pub(crate) enum Decoder {
    Native(NativeImage),
    Bmp(BmpImage),
    Gif(GifImage),
    Png(PngImage),
}

/// One opened image of any supported format.
pub struct Image {
    stream: Box<dyn ImageStream>,
    decoder: Decoder,
    /// Background used for disposal and alpha blending.
    bg: Color,
}

impl Image {
    /// Probe `stream` against every known format and open it with the first
    /// decoder whose magic bytes match.
    pub fn open(mut stream: Box<dyn ImageStream>) -> ImageResult<Image> {
        let decoder = Self::probe(&mut *stream)?;
        Ok(Image {
            stream,
            decoder,
            bg: Color::WHITE,
        })
    }

    fn probe(stream: &mut dyn ImageStream) -> ImageResult<Decoder> {
        stream.seek_to(0)?;
        match NativeImage::open(stream) {
            Ok(d) => {
                trace!("image opened as native, {}x{}", d.width, d.height);
                return Ok(Decoder::Native(d));
            }
            Err(ImageError::BadFormat) => {}
            Err(e) => return Err(e),
        }
        stream.seek_to(0)?;
        match BmpImage::open(stream) {
            Ok(d) => {
                trace!("image opened as bmp, {}x{}", d.width, d.height);
                return Ok(Decoder::Bmp(d));
            }
            Err(ImageError::BadFormat) => {}
            Err(e) => return Err(e),
        }
        stream.seek_to(0)?;
        match GifImage::open(stream) {
            Ok(d) => {
                trace!("image opened as gif, {}x{}", d.width, d.height);
                return Ok(Decoder::Gif(d));
            }
            Err(ImageError::BadFormat) => {}
            Err(e) => return Err(e),
        }
        stream.seek_to(0)?;
        match PngImage::open(stream) {
            Ok(d) => {
                trace!("image opened as png, {}x{}", d.width, d.height);
                return Ok(Decoder::Png(d));
            }
            Err(ImageError::BadFormat) => {}
            Err(e) => return Err(e),
        }
        Err(ImageError::BadFormat)
    }

    pub fn width(&self) -> Coord {
        match &self.decoder {
            Decoder::Native(d) => d.width,
            Decoder::Bmp(d) => d.width,
            Decoder::Gif(d) => d.width,
            Decoder::Png(d) => d.width,
        }
    }

    pub fn height(&self) -> Coord {
        match &self.decoder {
            Decoder::Native(d) => d.height,
            Decoder::Bmp(d) => d.height,
            Decoder::Gif(d) => d.height,
            Decoder::Png(d) => d.height,
        }
    }

    pub fn flags(&self) -> ImageFlags {
        match &self.decoder {
            Decoder::Native(_) | Decoder::Bmp(_) => ImageFlags::empty(),
            Decoder::Gif(d) => d.flags,
            Decoder::Png(d) => d.flags(),
        }
    }

    /// Background color used when disposing animation frames and when
    /// blending translucent pixels without a declared background.
    pub fn set_background(&mut self, bg: Color) {
        self.bg = bg;
    }

    /// Eagerly decode into memory so subsequent draws avoid the stream.
    pub fn cache(&mut self) -> ImageResult<()> {
        let stream = &mut *self.stream;
        match &mut self.decoder {
            Decoder::Native(d) => d.cache(stream),
            Decoder::Bmp(d) => d.cache(stream),
            Decoder::Gif(d) => d.cache(stream),
            Decoder::Png(d) => d.cache(stream),
        }
    }

    /// Draw the image window starting at source offset (`sx`,`sy`), sized
    /// `dest.cx` by `dest.cy`, at the destination position (`dest.x`,
    /// `dest.y`).
    pub fn draw(&mut self, display: &Display, dest: Rect, sx: Coord, sy: Coord) -> ImageResult<()> {
        let mut dest = dest;
        // Clamp the source window to the image bounds.
        if sx < 0 || sy < 0 || sx >= self.width() || sy >= self.height() {
            return Ok(());
        }
        if sx + dest.cx > self.width() {
            dest.cx = self.width() - sx;
        }
        if sy + dest.cy > self.height() {
            dest.cy = self.height() - sy;
        }
        if dest.is_empty() {
            return Ok(());
        }

        let stream = &mut *self.stream;
        let bg = self.bg;
        match &mut self.decoder {
            Decoder::Native(d) => d.draw(stream, display, dest, sx, sy),
            Decoder::Bmp(d) => d.draw(stream, display, dest, sx, sy),
            Decoder::Gif(d) => d.draw(stream, display, dest, sx, sy, bg),
            Decoder::Png(d) => d.draw(stream, display, dest, sx, sy),
        }
    }

    /// Advance to the next animation frame. Returns the delay to wait
    /// before drawing it, or [`Delay::Infinite`] for static or exhausted
    /// images.
    pub fn next_frame(&mut self) -> Delay {
        let stream = &mut *self.stream;
        match &mut self.decoder {
            Decoder::Native(_) | Decoder::Bmp(_) | Decoder::Png(_) => Delay::Infinite,
            Decoder::Gif(d) => d.next_frame(stream),
        }
    }
}

// The stream box keeps `Image` from deriving Debug.
impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = match self.decoder {
            Decoder::Native(_) => "native",
            Decoder::Bmp(_) => "bmp",
            Decoder::Gif(_) => "gif",
            Decoder::Png(_) => "png",
        };
        f.debug_struct("Image")
            .field("format", &format)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("flags", &self.flags())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
