//! First compression pass: reduce one chunk to LZ77 tokens and count the symbols they will become.
//!
//! The intermediate token stream is a sequence of groups of up to 32 tokens. Each group starts with
//! a u32 mask, least significant bit first, one bit per token: 0 for a literal, 1 for a match.
//! - A literal is the raw byte.
//! - A match is a u16 offset followed by `length - 3` in the escalating byte/word/dword form.
//!
//! At the end of the whole input one more match token is added with offset 0 and length 3. It
//! becomes symbol 0x100 with no offset bits, the end of stream marker. Its three zero bytes also
//! serve as the look-ahead the packer needs for the last length field.
//!
//! The stream only lives long enough for the packer to walk it once the huffman code is known.
//!
use log::trace;

use crate::bitstream::{RawRead, RawWrite};
use crate::error::XpressError;
use crate::tools::dictionary::{Match, MatchFinder};
use crate::tools::length_code::{encode_escalating, TOKEN_BIAS};
use crate::tools::symbol::{
    match_symbol, CHUNK_SIZE, MAX_OFFSET, MIN_MATCH, STREAM_END, SYMBOLS,
};

const BAD_OFFSET: XpressError = XpressError::Internal("match offset out of range");

/// Chunk scoped buffers, owned by the caller and reused for every chunk of a stream.
pub struct ChunkScratch {
    /// Intermediate token stream of the current chunk.
    pub tokens: Vec<u8>,
    /// Symbol frequencies of the current chunk.
    pub counts: [u32; SYMBOLS],
}

impl ChunkScratch {
    /// Size the token buffer for the worst case: every 32 input bytes can take 36 bytes of tokens,
    /// plus a spare mask, the end of stream token and a long length field.
    pub fn new(input_len: usize) -> Self {
        let capacity = if input_len > CHUNK_SIZE {
            CHUNK_SIZE / 32 * 36 + 36 + 4 + 7
        } else {
            input_len / 32 * 36 + 36 + 4 + 7
        };
        Self {
            tokens: Vec::with_capacity(capacity),
            counts: [0; SYMBOLS],
        }
    }
}

/// What one tokenize pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenized {
    /// Bytes of intermediate token stream.
    pub written: usize,
    /// Input bytes consumed. All of the chunk, unless a future finder stops early.
    pub consumed: usize,
    /// The end of stream token was appended.
    pub end_of_stream: bool,
}

fn patch_mask(tokens: &mut [u8], at: usize, mask: u32) {
    tokens[at..at + 4].copy_from_slice(&mask.to_le_bytes());
}

/// Tokenize `input[start..start + len]` (len > 0) into `scratch`. The finder must already be
/// filled for this chunk. The end of stream token is added when the chunk ends the input.
pub fn tokenize<M: MatchFinder>(
    input: &[u8],
    start: usize,
    len: usize,
    scratch: &mut ChunkScratch,
    finder: &mut M,
) -> Result<Tokenized, XpressError> {
    debug_assert!(len > 0 && start + len <= input.len());
    let out = &mut scratch.tokens;
    let counts = &mut scratch.counts;
    out.clear();
    counts.fill(0);

    let end = start + len;
    let last_chunk = end == input.len();
    let mut pos = start;
    let mut mask_at = out.len();
    out.put_u32(0)?;
    let mut mask = 0_u32;
    let mut slot = 0_u32;

    while pos < end {
        // Start a new group when the mask is full
        if slot == 32 {
            patch_mask(out, mask_at, mask);
            mask_at = out.len();
            out.put_u32(0)?;
            mask = 0;
            slot = 0;
        }

        let rem = end - pos;
        let found = if rem >= MIN_MATCH {
            finder.find(pos)
        } else {
            None
        };
        if let Some(m) = found {
            if m.offset == 0 || m.offset > MAX_OFFSET || m.offset > pos {
                return Err(BAD_OFFSET);
            }
        }
        // Matches do not cross the end of the chunk. Offset 1 with length 3 is symbol 0x100,
        // which the decoder may read as the end of stream, so it goes out as a literal.
        let found = found
            .map(|m| Match {
                length: m.length.min(rem),
                offset: m.offset,
            })
            .filter(|m| m.length >= MIN_MATCH && (m.offset != 1 || m.length != MIN_MATCH));
        match found {
            Some(m) => {
                let length = m.length;
                let offset = m.offset as u16;
                let stored = (length - MIN_MATCH) as u32;
                out.put_u16(offset)?;
                encode_escalating(out, stored, TOKEN_BIAS)?;
                mask |= 1 << slot;
                counts[match_symbol(offset, stored) as usize] += 1;
                pos += length;
            }
            None => {
                let literal = input[pos];
                out.push(literal);
                counts[literal as usize] += 1;
                pos += 1;
            }
        }
        slot += 1;
    }

    let consumed = pos - start;
    let end_of_stream = last_chunk && start + consumed == end;
    if end_of_stream {
        if slot == 32 {
            patch_mask(out, mask_at, mask);
            mask_at = out.len();
            out.put_u32(0)?;
            mask = 1;
        } else {
            mask |= 1 << slot;
        }
        // offset 0, length 3
        out.extend_from_slice(&[0, 0, 0]);
        counts[STREAM_END as usize] += 1;
    }
    patch_mask(out, mask_at, mask);

    trace!(
        "Tokenized {} bytes at {} into {} token bytes",
        consumed,
        start,
        out.len()
    );
    Ok(Tokenized {
        written: out.len(),
        consumed,
        end_of_stream,
    })
}

/// Walks an intermediate token stream.
pub struct TokenReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> TokenReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }
}

impl RawRead for TokenReader<'_> {
    fn get_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|b| b[0])
    }

    fn get_u16(&mut self) -> Option<u16> {
        self.take::<2>().map(u16::from_le_bytes)
    }

    fn get_u32(&mut self) -> Option<u32> {
        self.take::<4>().map(u32::from_le_bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tools::dictionary::Dictionary;

    fn run(input: &[u8], start: usize, len: usize) -> (Vec<u8>, [u32; SYMBOLS], Tokenized) {
        let mut scratch = ChunkScratch::new(input.len());
        let mut d = Dictionary::new(input);
        let mut s = 0;
        while s < start + len {
            let l = (start + len - s).min(CHUNK_SIZE);
            d.fill(s, l);
            s += l;
        }
        let t = tokenize(input, start, len, &mut scratch, &mut d).unwrap();
        (scratch.tokens.clone(), scratch.counts, t)
    }

    #[test]
    fn literals_and_match_test() {
        let (tokens, counts, t) = run(b"abcabcabc", 0, 9);
        assert_eq!(
            tokens,
            vec![0x18, 0, 0, 0, b'a', b'b', b'c', 3, 0, 3, 0, 0, 0]
        );
        assert_eq!(
            t,
            Tokenized {
                written: 13,
                consumed: 9,
                end_of_stream: true
            }
        );
        assert_eq!(counts[b'a' as usize], 1);
        assert_eq!(counts[0x113], 1);
        assert_eq!(counts[STREAM_END as usize], 1);
        assert_eq!(counts.iter().sum::<u32>(), 5);
    }

    #[test]
    fn full_group_then_end_test() {
        let input: Vec<u8> = (0..32).collect();
        let (tokens, counts, t) = run(&input, 0, 32);
        assert_eq!(t.written, 4 + 32 + 4 + 3);
        assert_eq!(&tokens[..4], &[0, 0, 0, 0]);
        assert_eq!(&tokens[36..], &[1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(counts[STREAM_END as usize], 1);
    }

    #[test]
    fn second_group_end_bit_test() {
        let input: Vec<u8> = (0..40).collect();
        let (tokens, _, t) = run(&input, 0, 40);
        // 8 literals in the second group, end of stream is the ninth token
        assert_eq!(&tokens[36..40], &[0x00, 0x01, 0, 0]);
        assert_eq!(t.written, 4 + 32 + 4 + 8 + 3);
    }

    #[test]
    fn not_last_chunk_test() {
        let input: Vec<u8> = (0..40).collect();
        let (tokens, counts, t) = run(&input, 0, 20);
        assert_eq!(t.written, 24);
        assert!(!t.end_of_stream);
        assert_eq!(&tokens[..4], &[0, 0, 0, 0]);
        assert_eq!(counts[STREAM_END as usize], 0);
    }

    #[test]
    fn clamp_to_chunk_test() {
        let input = [b'a'; 100];
        let (tokens, counts, t) = run(&input, 0, 50);
        assert_eq!(tokens, vec![0b10, 0, 0, 0, b'a', 1, 0, 46]);
        assert_eq!(t.consumed, 50);
        assert_eq!(counts[0x10F], 1);
    }

    #[test]
    fn short_run_at_chunk_end_test() {
        let input = b"xaaaabcdef";
        // The offset 1, length 3 match becomes literals, in the last chunk too
        let (tokens, counts, _) = run(input, 0, 5);
        assert_eq!(tokens, vec![0, 0, 0, 0, b'x', b'a', b'a', b'a', b'a']);
        assert_eq!(counts[STREAM_END as usize], 0);
        let (tokens, counts, _) = run(&input[..5], 0, 5);
        assert_eq!(
            tokens,
            vec![0b100000, 0, 0, 0, b'x', b'a', b'a', b'a', b'a', 0, 0, 0]
        );
        assert_eq!(counts[STREAM_END as usize], 1);
    }

    /// Replays a fixed list of matches by position.
    struct Scripted(Vec<(usize, Match)>);

    impl MatchFinder for Scripted {
        fn fill(&mut self, _start: usize, _len: usize) {}
        fn find(&mut self, pos: usize) -> Option<Match> {
            self.0.iter().find(|(p, _)| *p == pos).map(|(_, m)| *m)
        }
    }

    #[test]
    fn finder_offset_checked_test() {
        let input = [b'a'; 50];
        for offset in [0, 11, MAX_OFFSET + 1] {
            let mut finder = Scripted(vec![(10, Match { length: 5, offset })]);
            let mut scratch = ChunkScratch::new(input.len());
            assert_eq!(
                tokenize(&input, 0, 50, &mut scratch, &mut finder),
                Err(BAD_OFFSET)
            );
        }
        let mut finder = Scripted(vec![(10, Match { length: 5, offset: 10 })]);
        let mut scratch = ChunkScratch::new(input.len());
        assert!(tokenize(&input, 0, 50, &mut scratch, &mut finder).is_ok());
    }

    #[test]
    fn finder_short_run_becomes_literal_test() {
        let input = [b'a'; 8];
        let mut finder = Scripted(vec![(1, Match { length: 3, offset: 1 })]);
        let mut scratch = ChunkScratch::new(input.len());
        let t = tokenize(&input, 0, 8, &mut scratch, &mut finder).unwrap();
        assert_eq!(t.consumed, 8);
        assert_eq!(scratch.counts[b'a' as usize], 8);
        assert_eq!(scratch.counts[STREAM_END as usize], 1);
    }

    #[test]
    fn long_match_escalates_test() {
        let input = vec![0_u8; 1000];
        let (tokens, _, _) = run(&input, 0, 1000);
        // literal, then offset 1 with 996 stored as 0xFF + u16, then the end token
        assert_eq!(
            tokens,
            vec![0b110, 0, 0, 0, 0, 1, 0, 0xFF, 0xE4, 0x03, 0, 0, 0]
        );
    }

    #[test]
    fn cross_chunk_match_test() {
        let mut input = vec![0_u8; CHUNK_SIZE + 100];
        let mut x = 99_u32;
        for b in input.iter_mut() {
            x = x.wrapping_mul(1103515245).wrapping_add(12345);
            *b = (x >> 16) as u8;
        }
        let (head, rest) = input.split_at_mut(CHUNK_SIZE);
        rest[..40].copy_from_slice(&head[CHUNK_SIZE - 40..]);
        let (tokens, _, _) = run(&input, CHUNK_SIZE, 100);
        assert_eq!(tokens[0] & 1, 1);
        assert_eq!(u16::from_le_bytes([tokens[4], tokens[5]]), 40);
    }

    #[test]
    fn token_reader_test() {
        let data = [1, 2, 3, 4, 5, 6, 7];
        let mut tr = TokenReader::new(&data);
        assert_eq!(tr.get_u32(), Some(0x04030201));
        assert_eq!(tr.get_u16(), Some(0x0605));
        assert!(!tr.is_empty());
        assert_eq!(tr.get_u16(), None);
        assert_eq!(tr.get_u8(), Some(7));
        assert!(tr.is_empty());
    }
}
