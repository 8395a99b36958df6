//! The bitstream module forms the I/O subsystem for the XPRESS Huffman codec.
//!
//! The XPRESS Huffman bitstream is not a plain bit-packed stream. Huffman codes and offset bits are
//! packed MSB-first into 16-bit little-endian words, while length extensions are written as whole
//! raw bytes *between* those words. The writer keeps two 16-bit slots reserved ahead of the raw
//! cursor so that the reader, which always has 16 to 32 bits preloaded, sees raw bytes at exactly
//! the point where the writer put them.
//!
//! This I/O subsystem is designed to interface with the other modules of this crate. It is not
//! intended for more general use.
//!
pub mod bitreader;
pub mod bitwriter;

use crate::error::XpressError;

/// Writes whole little-endian values outside of the bit queue.
pub trait RawWrite {
    fn put_u8(&mut self, value: u8) -> Result<(), XpressError>;
    fn put_u16(&mut self, value: u16) -> Result<(), XpressError>;
    fn put_u32(&mut self, value: u32) -> Result<(), XpressError>;
}

/// Reads whole little-endian values outside of the bit queue. `None` means truncated input.
pub trait RawRead {
    fn get_u8(&mut self) -> Option<u8>;
    fn get_u16(&mut self) -> Option<u16>;
    fn get_u32(&mut self) -> Option<u32>;
}

/// The intermediate token buffer is a growable Vec, so writes never fail.
impl RawWrite for Vec<u8> {
    fn put_u8(&mut self, value: u8) -> Result<(), XpressError> {
        self.push(value);
        Ok(())
    }
    fn put_u16(&mut self, value: u16) -> Result<(), XpressError> {
        self.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }
    fn put_u32(&mut self, value: u32) -> Result<(), XpressError> {
        self.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }
}
