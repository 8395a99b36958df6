use log::{debug, trace};

use super::pack::pack;
use super::tokenize::{tokenize, ChunkScratch};
use crate::error::XpressError;
use crate::huffman_coding::huffman::HuffmanEncoder;
use crate::tools::dictionary::MatchFinder;
use crate::tools::symbol::{MIN_DATA, STREAM_END};

/// Result of compressing one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOutput {
    /// Input bytes consumed.
    pub consumed: usize,
    /// Compressed bytes written.
    pub written: usize,
    /// This chunk carries the end of stream symbol.
    pub end_of_stream: bool,
}

/// Write the chunk of an empty stream: a code where only the end of stream symbol has a
/// (one bit) code, followed by a zero bitstream.
fn write_empty_chunk(output: &mut [u8]) {
    output[..MIN_DATA].fill(0);
    output[STREAM_END as usize / 2] = 0x01;
}

/// Called by the stream driver, this compresses `input[start..start + len]` into one chunk at the
/// start of `output`. `len` is zero only for an empty stream.
pub fn compress_chunk<M: MatchFinder>(
    input: &[u8],
    start: usize,
    len: usize,
    output: &mut [u8],
    scratch: &mut ChunkScratch,
    finder: &mut M,
) -> Result<ChunkOutput, XpressError> {
    if output.len() < MIN_DATA {
        return Err(XpressError::InsufficientBuffer);
    }
    if len == 0 {
        write_empty_chunk(output);
        trace!("Wrote the empty stream chunk");
        return Ok(ChunkOutput {
            consumed: 0,
            written: MIN_DATA,
            end_of_stream: true,
        });
    }

    finder.fill(start, len);
    let tokenized = tokenize(input, start, len, scratch, finder)?;
    let encoder = HuffmanEncoder::from_counts(&scratch.counts)?;
    let written = pack(&scratch.tokens[..tokenized.written], output, &encoder)?;

    debug!(
        "Chunk at {}: {} bytes in, {} token bytes, {} bytes out{}",
        start,
        tokenized.consumed,
        tokenized.written,
        written,
        if tokenized.end_of_stream {
            " (end of stream)"
        } else {
            ""
        }
    );
    Ok(ChunkOutput {
        consumed: tokenized.consumed,
        written,
        end_of_stream: tokenized.end_of_stream,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tools::dictionary::Dictionary;

    #[test]
    fn empty_chunk_test() {
        let mut out = vec![0xAA_u8; 300];
        let mut scratch = ChunkScratch::new(0);
        let mut d = Dictionary::new(&[]);
        let chunk = compress_chunk(&[], 0, 0, &mut out, &mut scratch, &mut d).unwrap();
        assert_eq!(
            chunk,
            ChunkOutput {
                consumed: 0,
                written: MIN_DATA,
                end_of_stream: true
            }
        );
        let mut expected = vec![0_u8; MIN_DATA];
        expected[0x80] = 1;
        assert_eq!(&out[..MIN_DATA], &expected[..]);
        // Nothing past the chunk is touched
        assert_eq!(out[MIN_DATA], 0xAA);
    }

    #[test]
    fn output_too_small_test() {
        let input = b"some input";
        let mut out = vec![0_u8; MIN_DATA - 1];
        let mut scratch = ChunkScratch::new(input.len());
        let mut d = Dictionary::new(input);
        assert_eq!(
            compress_chunk(input, 0, input.len(), &mut out, &mut scratch, &mut d),
            Err(XpressError::InsufficientBuffer)
        );
    }

    #[test]
    fn single_chunk_test() {
        let input = b"abracadabra abracadabra";
        let mut out = vec![0_u8; 1024];
        let mut scratch = ChunkScratch::new(input.len());
        let mut d = Dictionary::new(input);
        let chunk = compress_chunk(input, 0, input.len(), &mut out, &mut scratch, &mut d).unwrap();
        assert_eq!(chunk.consumed, input.len());
        assert!(chunk.end_of_stream);
        assert!(chunk.written >= MIN_DATA);
        // 'a' and the end of stream symbol both got codes
        assert_ne!(out[b'a' as usize / 2] & 0x0F, 0);
        assert_ne!(out[0x80] & 0x0F, 0);
    }
}
