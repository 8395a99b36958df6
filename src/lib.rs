//! Rust implementation of the Microsoft XPRESS Huffman compression format.
//!
//! XPRESS Huffman (MS-XCA "LZ77+Huffman") is used by Windows hibernation files, Windows Update
//! delta payloads, WIM images and several network protocols. Input is cut into 64 KiB chunks; each
//! chunk carries a 256 byte table of code lengths for a 512 symbol alphabet, followed by a
//! bitstream of huffman codes, offset bits and raw length extension bytes. Back-references may
//! reach up to 65535 bytes back, also into earlier chunks.
//!
//! Both directions work on caller supplied slices and report the number of bytes written:
//!
//! ```
//! let input = b"hello hello hello hello";
//! let mut packed = vec![0; xpress_huff::max_compressed_size(input.len())];
//! let n = xpress_huff::compress(input, &mut packed).unwrap();
//!
//! let mut unpacked = vec![0; input.len()];
//! let m = xpress_huff::decompress(&packed[..n], &mut unpacked).unwrap();
//! assert_eq!(&unpacked[..m], input);
//! ```
//!
//! The stream does not record its decompressed size. `decompress_to_vec` grows the output until it
//! fits, up to a limit.
//!
//! The `xpress-huff` binary compresses and decompresses files:
//!
//! `$> xpress-huff -z test.txt`
//!
//! This will compress the file and create the file test.txt.xph.
//! The input file will be deleted unless `-k` is given.
//!
#![warn(rust_2018_idioms)]

pub mod bitstream;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;

pub use compression::compress::{compress, compress_to_vec, compress_with, max_compressed_size};
pub use compression::decompress::{decompress, decompress_to_vec};
pub use error::XpressError;
pub use tools::dictionary::{Dictionary, Match, MatchFinder};
