//! The 512 symbol XPRESS Huffman alphabet.
//!
//! Symbols 0x000-0x0FF are literal bytes. Symbols 0x100-0x1FF are match classes built as
//! `0x100 | (offset_bits << 4) | min(15, length - 3)`, where `offset_bits` is the position of the
//! highest set bit of the raw offset. The raw offset bits below that highest bit follow the symbol
//! in the bitstream, and a saturated length nibble is followed by length extension bytes.
//!
//! Symbol 0x100 doubles as the end of stream marker. It is only the end of the stream when no set
//! bit is pending after it; otherwise it is a match with offset 1 and length 3.

/// Nominal number of uncompressed bytes per chunk.
pub const CHUNK_SIZE: usize = 0x10000;
/// Largest back-reference distance.
pub const MAX_OFFSET: usize = 0xFFFF;
/// Shortest match worth a back-reference. Lengths are stored with this bias removed.
pub const MIN_MATCH: usize = 3;
pub const SYMBOLS: usize = 0x200;
/// Size of the nibble-packed code length table at the start of every chunk.
pub const HALF_SYMBOLS: usize = 0x100;
pub const STREAM_END: u16 = 0x100;
/// Code length table plus two words of minimal bitstream.
pub const MIN_DATA: usize = HALF_SYMBOLS + 4;
/// A length nibble of this value means extension bytes follow.
pub const LENGTH_NIBBLE_MAX: u32 = 0xF;

/// Position of the highest set bit, 0 for both 0 and 1.
#[inline(always)]
pub fn highbit(x: u32) -> u8 {
    if x == 0 {
        0
    } else {
        (31 - x.leading_zeros()) as u8
    }
}

/// Match class symbol for a raw offset and a length with the minimum match already removed.
#[inline(always)]
pub fn match_symbol(offset: u16, length: u32) -> u16 {
    0x100 | (highbit(offset as u32) as u16) << 4 | length.min(LENGTH_NIBBLE_MAX) as u16
}

/// A decoded symbol, with the 0x100 overlap resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Literal(u8),
    Match { offset_bits: u8, length_nibble: u8 },
    EndOfStream,
}

/// Resolve one decoded symbol. `pending` tells whether any set bit follows it in the bitstream.
pub fn classify(symbol: u16, pending: bool) -> Decoded {
    if symbol == STREAM_END && !pending {
        Decoded::EndOfStream
    } else if symbol < 0x100 {
        Decoded::Literal(symbol as u8)
    } else {
        Decoded::Match {
            offset_bits: ((symbol >> 4) & 0xF) as u8,
            length_nibble: (symbol & 0xF) as u8,
        }
    }
}
