//! Resumable DEFLATE decompressor.
//!
//! Decompressed bytes are produced one at a time from a circular window
//! that doubles as the LZ77 sliding dictionary. Whenever the window fills,
//! the decoder records exactly where it stopped (mid literal copy, mid
//! block, or mid back-reference) and suspends; the next byte request drains
//! the window and resumes from the recorded state. That keeps peak memory
//! at one window regardless of image size.
//!
//! Stored, fixed-Huffman and dynamic-Huffman block types are supported.
//! Checksums (the zlib Adler-32 trailer) are deliberately not verified.

/// Byte-at-a-time source of compressed input.
pub(crate) trait ByteSource {
    fn next_byte(&mut self) -> Option<u8>;
}

/// Validate the two-byte zlib header: method 8, a 32K-or-smaller window,
/// no preset dictionary, and a correct FCHECK residue.
pub(crate) fn read_zlib_header(src: &mut dyn ByteSource) -> bool {
    let b0 = match src.next_byte() {
        Some(b) => b,
        None => return false,
    };
    let b1 = match src.next_byte() {
        Some(b) => b,
        None => return false,
    };
    ((b0 as u16) << 8 | b1 as u16) % 31 == 0
        && (b0 & 0x0F) == 8
        && (b0 & 0x80) == 0
        && (b1 & 0x20) == 0
}

const DEFAULT_WINDOW: usize = 32768;

// Length and distance code expansions.
const LBITS: [u8; 30] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0, 6,
];
const LBASE: [u16; 30] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115,
    131, 163, 195, 227, 258, 323,
];
const DBITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12,
    13, 13,
];
const DBASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Order the code-length alphabet lengths appear in a dynamic block header.
const CLEN_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Canonical Huffman decode table: per-length code counts plus the
/// code-to-symbol translation in canonical order.
struct Tree {
    counts: [u16; 16],
    symbols: [u16; 288],
}

impl Tree {
    fn empty() -> Tree {
        Tree {
            counts: [0; 16],
            symbols: [0; 288],
        }
    }

    fn build(&mut self, lengths: &[u8]) {
        self.counts = [0; 16];
        for &l in lengths {
            self.counts[l as usize] += 1;
        }
        self.counts[0] = 0;

        let mut offs = [0u16; 16];
        let mut sum = 0;
        for i in 0..16 {
            offs[i] = sum;
            sum += self.counts[i];
        }
        for (sym, &l) in lengths.iter().enumerate() {
            if l != 0 {
                self.symbols[offs[l as usize] as usize] = sym as u16;
                offs[l as usize] += 1;
            }
        }
    }
}

/// Where to pick up after the window filled.
enum Resume {
    /// Start the next block.
    NewBlock,
    /// Continue copying a stored block, this many bytes left.
    Copy(usize),
    /// Continue symbol decoding inside a compressed block.
    Block,
    /// Continue a back-reference copy inside a compressed block.
    Offset { length: usize, offset: usize },
}

pub(crate) struct Inflate {
    data: u8,
    bits: u8,
    eof: bool,
    final_block: bool,
    resume: Resume,
    /// Consumer and producer positions in the window. Equal positions mean
    /// drained, unless `full` says the producer lapped the consumer.
    bufpos: usize,
    bufend: usize,
    full: bool,
    window: Vec<u8>,
    ltree: Tree,
    dtree: Tree,
    /// Scratch code lengths while decoding dynamic trees.
    lengths: [u8; 288 + 32],
}

impl Inflate {
    pub(crate) fn new() -> Inflate {
        Inflate::with_window(DEFAULT_WINDOW)
    }

    /// Window must be a power of two. Small windows are only useful for
    /// exercising the suspend/resume paths.
    pub(crate) fn with_window(size: usize) -> Inflate {
        debug_assert!(size.is_power_of_two());
        Inflate {
            data: 0,
            bits: 0,
            eof: false,
            final_block: false,
            resume: Resume::NewBlock,
            bufpos: 0,
            bufend: 0,
            full: false,
            window: vec![0; size],
            ltree: Tree::empty(),
            dtree: Tree::empty(),
            lengths: [0; 288 + 32],
        }
    }

    #[inline]
    fn wrap(&self, pos: usize) -> usize {
        pos & (self.window.len() - 1)
    }

    // ------------------------------------------------------------------------
    // Bit input
    // ------------------------------------------------------------------------

    fn get_bit(&mut self, src: &mut dyn ByteSource) -> u32 {
        if self.eof {
            return 1;
        }
        if self.bits == 0 {
            match src.next_byte() {
                Some(b) => {
                    self.data = b;
                    self.bits = 8;
                }
                None => {
                    self.eof = true;
                    return 1;
                }
            }
        }
        self.bits -= 1;
        let bit = (self.data & 1) as u32;
        self.data >>= 1;
        bit
    }

    /// LSB-first multi-bit read.
    fn get_bits(&mut self, src: &mut dyn ByteSource, num: u32) -> u32 {
        let mut val = 0;
        for i in 0..num {
            if self.get_bit(src) == 1 {
                val += 1 << i;
            }
        }
        val
    }

    fn decode_symbol(&mut self, src: &mut dyn ByteSource, dist: bool) -> u16 {
        let mut sum: i32 = 0;
        let mut cur: i32 = 0;
        let mut len = 0usize;
        loop {
            cur = 2 * cur + self.get_bit(src) as i32;
            if self.eof {
                return 0;
            }
            len += 1;
            if len >= 16 {
                self.eof = true;
                return 0;
            }
            let count = if dist {
                self.dtree.counts[len]
            } else {
                self.ltree.counts[len]
            } as i32;
            sum += count;
            cur -= count;
            if cur < 0 {
                break;
            }
        }
        let idx = (sum + cur) as usize;
        if dist {
            self.dtree.symbols[idx]
        } else {
            self.ltree.symbols[idx]
        }
    }

    // ------------------------------------------------------------------------
    // Tree construction
    // ------------------------------------------------------------------------

    fn build_fixed_trees(&mut self) {
        self.ltree.counts = [0; 16];
        self.ltree.counts[7] = 24;
        self.ltree.counts[8] = 152;
        self.ltree.counts[9] = 112;
        for i in 0..24 {
            self.ltree.symbols[i] = 256 + i as u16;
        }
        for i in 0..144 {
            self.ltree.symbols[24 + i] = i as u16;
        }
        for i in 0..8 {
            self.ltree.symbols[24 + 144 + i] = 280 + i as u16;
        }
        for i in 0..112 {
            self.ltree.symbols[24 + 144 + 8 + i] = 144 + i as u16;
        }

        self.dtree.counts = [0; 16];
        self.dtree.counts[5] = 32;
        for i in 0..32 {
            self.dtree.symbols[i] = i as u16;
        }
    }

    fn decode_trees(&mut self, src: &mut dyn ByteSource) -> bool {
        let hlit = self.get_bits(src, 5) as usize + 257;
        let hdist = self.get_bits(src, 5) as usize + 1;
        let hclen = self.get_bits(src, 4) as usize + 4;
        if self.eof || hlit > 288 || hdist > 32 {
            return false;
        }

        // Code lengths for the code-length alphabet, in their fixed order.
        let mut clen = [0u8; 19];
        for i in 0..hclen {
            clen[CLEN_ORDER[i]] = self.get_bits(src, 3) as u8;
        }
        if self.eof {
            return false;
        }
        self.ltree.build(&clen);

        // Decode the literal/length and distance code lengths in one run.
        // A repeat must not run past the declared hlit + hdist total.
        let total = hlit + hdist;
        let mut num = 0;
        while num < total {
            let symbol = self.decode_symbol(src, false);
            if self.eof {
                return false;
            }
            match symbol {
                16 => {
                    if num == 0 {
                        return false;
                    }
                    let val = self.lengths[num - 1];
                    let repeat = self.get_bits(src, 2) as usize + 3;
                    if num + repeat > total {
                        return false;
                    }
                    for _ in 0..repeat {
                        self.lengths[num] = val;
                        num += 1;
                    }
                }
                17 => {
                    let repeat = self.get_bits(src, 3) as usize + 3;
                    if num + repeat > total {
                        return false;
                    }
                    for _ in 0..repeat {
                        self.lengths[num] = 0;
                        num += 1;
                    }
                }
                18 => {
                    let repeat = self.get_bits(src, 7) as usize + 11;
                    if num + repeat > total {
                        return false;
                    }
                    for _ in 0..repeat {
                        self.lengths[num] = 0;
                        num += 1;
                    }
                }
                s if s < 16 => {
                    self.lengths[num] = s as u8;
                    num += 1;
                }
                _ => return false,
            }
        }

        let (lit, dist) = self.lengths.split_at(hlit);
        self.ltree.build(lit);
        self.dtree.build(&dist[..hdist]);
        true
    }

    // ------------------------------------------------------------------------
    // Block decoding
    // ------------------------------------------------------------------------

    /// Copy stored bytes from the input, suspending when the window fills.
    fn copy_input(&mut self, src: &mut dyn ByteSource, mut length: usize) -> bool {
        while length > 0 {
            length -= 1;
            let b = match src.next_byte() {
                Some(b) => b,
                None => {
                    self.eof = true;
                    return false;
                }
            };
            self.window[self.bufend] = b;
            self.bufend = self.wrap(self.bufend + 1);
            if self.bufend == self.bufpos {
                self.full = true;
                self.resume = Resume::Copy(length);
                return true;
            }
        }
        self.resume = Resume::NewBlock;
        true
    }

    fn stored_block(&mut self, src: &mut dyn ByteSource) -> bool {
        // Stored blocks restart on a byte boundary.
        self.bits = 0;

        let mut hdr = [0u8; 4];
        for b in hdr.iter_mut() {
            *b = match src.next_byte() {
                Some(v) => v,
                None => {
                    self.eof = true;
                    return false;
                }
            };
        }
        let length = u16::from_le_bytes([hdr[0], hdr[1]]);
        let check = u16::from_le_bytes([hdr[2], hdr[3]]);
        if length != !check {
            self.eof = true;
            return false;
        }
        self.copy_input(src, length as usize)
    }

    fn inflate_block(&mut self, src: &mut dyn ByteSource) -> bool {
        loop {
            let symbol = self.decode_symbol(src, false);
            if self.eof {
                return false;
            }

            if symbol == 256 {
                self.resume = Resume::NewBlock;
                return true;
            }

            if symbol < 256 {
                self.window[self.bufend] = symbol as u8;
                self.bufend = self.wrap(self.bufend + 1);
                if self.bufend == self.bufpos {
                    self.full = true;
                    self.resume = Resume::Block;
                    return true;
                }
                continue;
            }

            let symbol = (symbol - 257) as usize;
            if symbol >= LBITS.len() {
                self.eof = true;
                return false;
            }
            let length =
                self.get_bits(src, LBITS[symbol] as u32) as usize + LBASE[symbol] as usize;
            if self.eof || length >= self.window.len() {
                self.eof = true;
                return false;
            }

            let dist = self.decode_symbol(src, true) as usize;
            if self.eof || dist >= DBITS.len() {
                self.eof = true;
                return false;
            }
            let offset =
                self.get_bits(src, DBITS[dist] as u32) as usize + DBASE[dist] as usize;
            if self.eof || offset >= self.window.len() {
                self.eof = true;
                return false;
            }

            // Source position in the window, allowing for wrap.
            let from = if offset > self.bufend {
                self.bufend + self.window.len() - offset
            } else {
                self.bufend - offset
            };
            if !self.copy_window(length, from) {
                return true;
            }
        }
    }

    /// Copy a back-reference; returns false when suspended on a full window.
    fn copy_window(&mut self, mut length: usize, mut offset: usize) -> bool {
        while length > 0 {
            length -= 1;
            self.window[self.bufend] = self.window[offset];
            self.bufend = self.wrap(self.bufend + 1);
            offset = self.wrap(offset + 1);
            if self.bufend == self.bufpos {
                self.full = true;
                self.resume = Resume::Offset { length, offset };
                return false;
            }
        }
        true
    }

    fn start_block(&mut self, src: &mut dyn ByteSource) -> bool {
        if self.eof || self.final_block {
            return false;
        }
        if self.get_bit(src) == 1 {
            self.final_block = true;
        }
        match self.get_bits(src, 2) {
            0 => self.stored_block(src),
            1 => {
                self.build_fixed_trees();
                self.inflate_block(src)
            }
            2 => self.decode_trees(src) && self.inflate_block(src),
            _ => {
                self.eof = true;
                false
            }
        }
    }

    /// Produce the next decompressed byte, or `None` once the stream is
    /// exhausted or found malformed.
    pub(crate) fn get_byte(&mut self, src: &mut dyn ByteSource) -> Option<u8> {
        while !self.full && self.bufpos == self.bufend {
            let ok = match self.resume {
                Resume::NewBlock => self.start_block(src),
                Resume::Copy(length) => self.copy_input(src, length),
                Resume::Block => self.inflate_block(src),
                Resume::Offset { length, offset } => {
                    if self.copy_window(length, offset) {
                        self.inflate_block(src)
                    } else {
                        true
                    }
                }
            };
            if !ok {
                return None;
            }
        }
        if !self.full && self.bufpos == self.bufend {
            return None;
        }
        let b = self.window[self.bufpos];
        self.bufpos = self.wrap(self.bufpos + 1);
        self.full = false;
        Some(b)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct SliceSource<'a> {
        data: &'a [u8],
        pos: usize,
    }

    impl<'a> SliceSource<'a> {
        fn new(data: &'a [u8]) -> SliceSource<'a> {
            SliceSource { data, pos: 0 }
        }
    }

    impl<'a> ByteSource for SliceSource<'a> {
        fn next_byte(&mut self) -> Option<u8> {
            let b = self.data.get(self.pos).copied();
            if b.is_some() {
                self.pos += 1;
            }
            b
        }
    }

    fn inflate_all(zlib: &[u8], window: usize) -> Vec<u8> {
        let mut src = SliceSource::new(zlib);
        assert!(read_zlib_header(&mut src));
        let mut z = Inflate::with_window(window);
        let mut out = Vec::new();
        while let Some(b) = z.get_byte(&mut src) {
            out.push(b);
        }
        out
    }

    #[test]
    fn test_zlib_header_validation() {
        let mut ok = SliceSource::new(&[0x78, 0x01]);
        assert!(read_zlib_header(&mut ok));
        // Bad FCHECK residue.
        let mut bad = SliceSource::new(&[0x78, 0x02]);
        assert!(!read_zlib_header(&mut bad));
        // Preset dictionary flag.
        let mut dict = SliceSource::new(&[0x78, 0x20]);
        assert!(!read_zlib_header(&mut dict));
        // Method other than deflate.
        let mut meth = SliceSource::new(&[0x79, 0x00]);
        assert!(!read_zlib_header(&mut meth));
    }

    #[test]
    fn test_fixed_huffman_literals() {
        // "aaaaa" with fixed Huffman codes.
        let data = [0x78, 0x01, 0x4B, 0x04, 0x01, 0x00];
        assert_eq!(inflate_all(&data, 32768), b"aaaaa");
    }

    #[test]
    fn test_stored_block_across_tiny_window() {
        // 40 literal bytes through a 16-byte window forces several
        // suspend/resume cycles of the stored-copy state.
        let raw: Vec<u8> = (1..=40).collect();
        let mut data = vec![0x78, 0x01, 0x01, 40, 0, !40, 0xFF];
        data.extend_from_slice(&raw);
        assert_eq!(inflate_all(&data, 16), raw);
    }

    #[test]
    fn test_backref_across_tiny_window() {
        // 20 literals then a length-10 distance-5 match; a 16-byte window
        // suspends both mid-block and mid-back-reference.
        let data = [
            0x78, 0x01, 115, 116, 114, 118, 113, 117, 115, 247, 240, 244, 242, 246, 241, 245,
            243, 15, 8, 12, 10, 14, 65, 16, 0,
        ];
        let mut expect: Vec<u8> = (65..85).collect();
        expect.extend_from_slice(&[80, 81, 82, 83, 84, 80, 81, 82, 83, 84]);
        assert_eq!(inflate_all(&data, 16), expect);
    }

    #[test]
    fn test_dynamic_huffman_block() {
        let data = [
            120, 218, 237, 140, 209, 9, 128, 48, 12, 5, 87, 121, 19, 56, 77, 23, 8, 237, 195, 4,
            180, 150, 36, 40, 110, 111, 193, 33, 252, 241, 243, 184, 227, 138, 18, 205, 98, 108,
            114, 131, 125, 181, 254, 162, 100, 85, 6, 40, 85, 49, 220, 118, 75, 59, 137, 60, 144,
            179, 159, 74, 6, 35, 161, 226, 237, 18, 159, 194, 232, 11, 202, 255, 250, 236, 245,
            0, 237, 24, 168, 193,
        ];
        let expect =
            b"The display engine dispatches each primitive to the cheapest hardware tier. "
                .repeat(6);
        assert_eq!(inflate_all(&data, 32768), expect);
    }

    #[test]
    fn test_output_exactly_fills_window() {
        // A stored block the same size as the window: the producer laps the
        // consumer exactly once and every byte must still come out.
        let raw: Vec<u8> = (1..=16).collect();
        let mut data = vec![0x78, 0x01, 0x01, 16, 0, !16, 0xFF];
        data.extend_from_slice(&raw);
        assert_eq!(inflate_all(&data, 16), raw);
    }

    #[test]
    fn test_truncated_stream_stops() {
        let data = [0x78, 0x01, 0x4B];
        let out = inflate_all(&data, 32768);
        assert!(out.len() <= 1);
    }

    #[test]
    fn test_bad_stored_length_check() {
        let data = [0x78, 0x01, 0x01, 5, 0, 0xFF, 0xFF, 1, 2, 3, 4, 5];
        assert!(inflate_all(&data, 32768).is_empty());
    }
}
