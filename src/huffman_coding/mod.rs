//! The huffman module provides the canonical huffman codes used by every XPRESS Huffman chunk.
//!
//! Each chunk of up to 64 KiB gets its own code over the 512 symbol alphabet. Only the code lengths
//! are transmitted (as a 256 byte nibble table); both sides derive the same canonical codes from
//! them. Lengths must fit in a nibble, so no code is longer than 15 bits.
//!
//! The process of encoding and decoding each chunk is inherently sequential.
//!

pub mod huffman;
pub mod huffman_code_from_weights;
