//! Second compression pass: turn the intermediate token stream into a finished chunk.
//!
//! A chunk is the 256 byte code length table followed by the bitstream. For a match the packer
//! writes, in this order: the symbol code, the length extension (only when the length nibble is
//! saturated), then the offset bits below the highest set bit.
use log::{error, trace};

use super::tokenize::TokenReader;
use crate::bitstream::bitwriter::BitWriter;
use crate::bitstream::RawRead;
use crate::error::XpressError;
use crate::huffman_coding::huffman::HuffmanEncoder;
use crate::tools::length_code::{decode_escalating, encode_escalating, NIBBLE_BIAS, TOKEN_BIAS};
use crate::tools::symbol::{highbit, match_symbol, HALF_SYMBOLS, LENGTH_NIBBLE_MAX, MIN_DATA};

const TRUNCATED: XpressError = XpressError::Internal("truncated intermediate token stream");

/// Encode `tokens` into `output` using `encoder`. Returns the chunk size in bytes.
pub fn pack(
    tokens: &[u8],
    output: &mut [u8],
    encoder: &HuffmanEncoder,
) -> Result<usize, XpressError> {
    if output.len() < MIN_DATA {
        return Err(XpressError::InsufficientBuffer);
    }
    let (table, stream) = output.split_at_mut(HALF_SYMBOLS);
    table.copy_from_slice(&encoder.length_table());

    let mut bw = BitWriter::new(stream)?;
    let mut tr = TokenReader::new(tokens);
    let mut groups = 0_usize;
    while !tr.is_empty() {
        let mut mask = tr.get_u32().ok_or(TRUNCATED)?;
        groups += 1;
        for _ in 0..32 {
            if tr.is_empty() {
                break;
            }
            if mask & 1 == 1 {
                let offset = tr.get_u16().ok_or(TRUNCATED)?;
                let length = decode_escalating(&mut tr, TOKEN_BIAS).map_err(|_| {
                    error!("Length field cut short in group {}", groups);
                    TRUNCATED
                })?;
                let offset_bits = highbit(offset as u32);
                encoder.encode(match_symbol(offset, length), &mut bw)?;
                if length >= LENGTH_NIBBLE_MAX {
                    encode_escalating(&mut bw, length, NIBBLE_BIAS)?;
                }
                bw.write_bits(offset as u32 & ((1 << offset_bits) - 1), offset_bits)?;
            } else {
                let literal = tr.get_u8().ok_or(TRUNCATED)?;
                encoder.encode(literal as u16, &mut bw)?;
            }
            mask >>= 1;
        }
    }
    let written = bw.finish() + HALF_SYMBOLS;
    trace!("Packed {} token groups into {} bytes", groups, written);
    Ok(written)
}
