//! Escalating length extension, shared by the tokenizer, the symbol packer and the decoder.
//!
//! A length (with the minimum match of 3 already removed) is written as:
//! - one byte holding `length - bias`, when that is below 0xFF
//! - otherwise 0xFF, then a u16 holding the full length, when it fits and is not zero
//! - otherwise 0xFF, a zero u16, then a u32 holding the full length
//!
//! The intermediate token stream uses a bias of 0. The bitstream only writes an extension after a
//! saturated length nibble, so there the bias is 15 and the first byte holds `length - 15`.

use crate::bitstream::{RawRead, RawWrite};
use crate::error::XpressError;

/// Bias of the intermediate token stream.
pub const TOKEN_BIAS: u32 = 0;
/// Bias of the bitstream, equal to the saturated length nibble.
pub const NIBBLE_BIAS: u32 = 0xF;

/// Write the extension for `length` (>= `bias`).
pub fn encode_escalating<W: RawWrite>(
    sink: &mut W,
    length: u32,
    bias: u32,
) -> Result<(), XpressError> {
    debug_assert!(length >= bias);
    if length - bias < 0xFF {
        return sink.put_u8((length - bias) as u8);
    }
    sink.put_u8(0xFF)?;
    if length <= 0xFFFF {
        sink.put_u16(length as u16)
    } else {
        sink.put_u16(0)?;
        sink.put_u32(length)
    }
}

/// Read an extension written by `encode_escalating` with the same bias.
pub fn decode_escalating<R: RawRead>(source: &mut R, bias: u32) -> Result<u32, XpressError> {
    let first = source.get_u8().ok_or(XpressError::InvalidData(
        "unable to read extra byte for length",
    ))?;
    if first != 0xFF {
        return Ok(first as u32 + bias);
    }
    let mut length = source.get_u16().ok_or(XpressError::InvalidData(
        "unable to read two bytes for length",
    ))? as u32;
    if length == 0 {
        length = source.get_u32().ok_or(XpressError::InvalidData(
            "unable to read four bytes for length",
        ))?;
    }
    if length < bias {
        return Err(XpressError::InvalidData("invalid length specified"));
    }
    Ok(length)
}
