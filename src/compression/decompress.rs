use std::io;

use log::{debug, error, info, trace};

use crate::bitstream::bitreader::BitReader;
use crate::error::XpressError;
use crate::huffman_coding::huffman::HuffmanDecoder;
use crate::tools::cli::{Mode, XpOpts};
use crate::tools::files::{read_input, write_output, Job};
use crate::tools::length_code::{decode_escalating, NIBBLE_BIAS};
use crate::tools::symbol::{
    classify, Decoded, CHUNK_SIZE, HALF_SYMBOLS, LENGTH_NIBBLE_MAX, MIN_DATA, MIN_MATCH,
};

const NO_STREAM_END: XpressError = XpressError::InvalidData("missing end of stream symbol");

/// What one chunk decoded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkResult {
    /// Compressed bytes used by the chunk.
    pub consumed: usize,
    /// Bytes appended to the output.
    pub produced: usize,
    /// The end of stream symbol was read.
    pub end_of_stream: bool,
}

/// Decode one chunk from the start of `input`, appending at `output[out_pos..]`. Earlier output
/// stays reachable for back-references.
pub(crate) fn decompress_chunk(
    input: &[u8],
    output: &mut [u8],
    out_pos: usize,
) -> Result<ChunkResult, XpressError> {
    if input.len() < MIN_DATA {
        return Err(XpressError::InvalidData("less than 260 input bytes"));
    }
    let lengths = HuffmanDecoder::unpack_table(&input[..HALF_SYMBOLS]);
    let decoder = HuffmanDecoder::from_lengths(&lengths)?;
    let mut br = BitReader::new(&input[HALF_SYMBOLS..])
        .ok_or(XpressError::InvalidData("less than 260 input bytes"))?;

    let mut i = out_pos;
    let mut end_of_stream = false;
    loop {
        let symbol = decoder
            .decode(&mut br)
            .ok_or(XpressError::InvalidData("unable to read enough bits for symbol"))?;

        match classify(symbol, !br.mask_is_zero()) {
            Decoded::EndOfStream => {
                end_of_stream = true;
                break;
            }
            Decoded::Literal(byte) => {
                if i == output.len() {
                    return Err(XpressError::InsufficientBuffer);
                }
                output[i] = byte;
                i += 1;
            }
            Decoded::Match {
                offset_bits,
                length_nibble,
            } => {
                let residual = br
                    .peek(offset_bits)
                    .ok_or(XpressError::InvalidData("unable to read bits for offset"))?;
                let offset = (1_usize << offset_bits) + residual as usize;
                if offset > i {
                    return Err(XpressError::InvalidData("illegal offset"));
                }
                let mut length = length_nibble as u32;
                if length == LENGTH_NIBBLE_MAX {
                    length = decode_escalating(&mut br, NIBBLE_BIAS)?;
                }
                br.skip(offset_bits);
                let length = length as usize + MIN_MATCH;
                if length > output.len() - i {
                    return Err(XpressError::InsufficientBuffer);
                }
                copy_match(output, i, offset, length);
                i += length;
            }
        }

        if i - out_pos >= CHUNK_SIZE && br.mask_is_zero() {
            break;
        }
    }

    let result = ChunkResult {
        consumed: br.position() + HALF_SYMBOLS,
        produced: i - out_pos,
        end_of_stream,
    };
    trace!("Chunk decoded: {:?}", result);
    Ok(result)
}

/// Copy `length` bytes from `offset` back. Overlapping copies repeat the pattern.
fn copy_match(output: &mut [u8], at: usize, offset: usize, length: usize) {
    let from = at - offset;
    if offset == 1 {
        let byte = output[from];
        output[at..at + length].fill(byte);
    } else if offset >= length {
        output.copy_within(from..from + length, at);
    } else {
        for k in 0..length {
            output[at + k] = output[from + k];
        }
    }
}

/// Decompress `input` into `output`. Returns the decompressed size.
pub fn decompress(input: &[u8], output: &mut [u8]) -> Result<usize, XpressError> {
    let mut in_pos = 0;
    let mut out_pos = 0;
    let mut chunks = 0;

    loop {
        let chunk = decompress_chunk(&input[in_pos..], output, out_pos).map_err(|e| {
            error!(
                "Xpress Huffman decompression error in chunk {}: {}",
                chunks + 1,
                e
            );
            e
        })?;
        in_pos += chunk.consumed;
        out_pos += chunk.produced;
        chunks += 1;
        debug!(
            "Chunk {}: {} bytes in, {} bytes out",
            chunks, chunk.consumed, chunk.produced
        );
        if chunk.end_of_stream {
            break;
        }
        if in_pos == input.len() {
            error!(
                "Xpress Huffman input ended after chunk {} without an end of stream symbol",
                chunks
            );
            return Err(NO_STREAM_END);
        }
    }

    info!(
        "Decompressed {} bytes into {} bytes in {} chunks",
        in_pos, out_pos, chunks
    );
    Ok(out_pos)
}

/// Decompress into a new vec of at most `limit` bytes. The stream does not record its size, so
/// the output buffer is doubled and decoding restarted until it fits.
pub fn decompress_to_vec(input: &[u8], limit: usize) -> Result<Vec<u8>, XpressError> {
    let mut capacity = input.len().saturating_mul(4).max(CHUNK_SIZE).min(limit);
    loop {
        let mut output = vec![0_u8; capacity];
        match decompress(input, &mut output) {
            Ok(n) => {
                output.truncate(n);
                return Ok(output);
            }
            Err(XpressError::InsufficientBuffer) if capacity < limit => {
                capacity = capacity.saturating_mul(2).min(limit);
                debug!("Growing output buffer to {} bytes", capacity);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Decompress (or just test) every input named in opts <XpOpts>.
pub fn decompress_files(opts: &XpOpts) -> io::Result<()> {
    for job in Job::for_decompression(opts) {
        let data = read_input(&job)?;
        let unpacked = decompress_to_vec(&data, opts.max_output)?;
        if opts.op_mode == Mode::Test {
            info!("{}: ok, {} bytes", job.source_name(), unpacked.len());
            continue;
        }
        info!(
            "{}: {} -> {} bytes",
            job.source_name(),
            data.len(),
            unpacked.len()
        );
        write_output(&job, opts, &unpacked)?;
    }
    Ok(())
}
