//! The tools module provides several helper functions for the XPRESS Huffman codec.
//!
//! The tools are:
//! - cli: Command line interface.
//! - dictionary: The LZ77 match source, spanning every chunk of one compress call.
//! - files: Input and output file handling for the binary.
//! - length_code: Escalating byte/word/dword length extensions, shared by encoder and decoder.
//! - symbol: The 512 symbol alphabet and its format constants.
//!
pub mod cli;
pub mod dictionary;
pub mod files;
pub mod length_code;
pub mod symbol;
