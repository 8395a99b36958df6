//! The compression module manages both directions of the XPRESS Huffman codec.
//!
//! XPRESS Huffman compression happens in the following steps, one 64 KiB chunk at a time:
//! - Tokenize: find LZ77 matches (which may reach back into earlier chunks) and write literals and
//!   matches to an intermediate token stream, counting the 512 symbols they map to.
//! - Build a canonical huffman code from the counts, limited to 15 bits.
//! - Pack: write the code length table, then walk the token stream again writing codes, length
//!   extensions and offset bits to the bitstream.
//!
//! The last chunk ends with symbol 0x100 followed by zero bits. An empty input still produces one
//! 260 byte chunk that holds nothing but that symbol.
//!
//! Decompression runs each chunk through a small state machine: decode a symbol, then either emit a
//! literal, copy a match, or stop at the end of stream marker. A chunk also ends once it has put out
//! 64 KiB and no set bits are pending.
//!

pub mod compress;
pub mod compress_chunk;
pub mod decompress;
pub mod pack;
pub mod tokenize;
