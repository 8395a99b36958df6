//! Match Source for the LZ77 stage.
//!
//! The Dictionary borrows the whole input for the duration of a compress call, so back-references
//! can reach into earlier chunks. Before a chunk is tokenized it is filled: every position of the
//! chunk is linked to the previous position starting with the same three bytes. Finding a match is
//! then a walk along that chain, never further back than MAX_OFFSET.
//!

use log::trace;
use rustc_hash::FxHashMap;

use super::symbol::{CHUNK_SIZE, MAX_OFFSET, MIN_MATCH};

/// A back-reference: copy `length` bytes from `offset` bytes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub length: usize,
    pub offset: usize,
}

/// Supplies matches to the tokenizer.
pub trait MatchFinder {
    /// Index the positions `start..start + len` of the input. Called once per chunk, in order,
    /// before any `find` inside that chunk.
    fn fill(&mut self, start: usize, len: usize);
    /// The best match of at least MIN_MATCH bytes at `pos`, if any. Lengths may run past the
    /// end of the chunk; the caller clamps them.
    fn find(&mut self, pos: usize) -> Option<Match>;
}

/// Chain links are kept for two chunks, enough to cover MAX_OFFSET behind any filled position.
const WINDOW: usize = 2 * CHUNK_SIZE;
const NO_LINK: usize = usize::MAX;

/// Hash chain match finder over the whole input.
pub struct Dictionary<'a> {
    data: &'a [u8],
    /// Most recent position for each 3 byte prefix.
    heads: FxHashMap<[u8; 3], usize>,
    /// prev[pos % WINDOW] is the previous position with the same prefix as pos.
    prev: Vec<usize>,
    /// How many chain links to follow per search.
    depth: usize,
}

impl<'a> Dictionary<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_level(data, 6)
    }

    /// Level 1 (fastest) to 9 (best compression).
    pub fn with_level(data: &'a [u8], level: u8) -> Self {
        let depth = match level.clamp(1, 9) {
            1 => 4,
            2 => 8,
            3 => 16,
            4 => 32,
            5 => 64,
            6 => 128,
            7 => 256,
            8 => 1024,
            _ => 4096,
        };
        Self {
            data,
            heads: FxHashMap::default(),
            prev: vec![NO_LINK; WINDOW.min(data.len().max(1))],
            depth,
        }
    }

    fn prefix(&self, pos: usize) -> [u8; 3] {
        [self.data[pos], self.data[pos + 1], self.data[pos + 2]]
    }

    fn slot(&self, pos: usize) -> usize {
        pos % self.prev.len()
    }

    /// Count matching bytes between two positions, at most `max_len`.
    fn match_len(&self, candidate: usize, pos: usize, max_len: usize) -> usize {
        self.data[candidate..]
            .iter()
            .zip(&self.data[pos..])
            .take(max_len)
            .take_while(|(a, b)| a == b)
            .count()
    }
}

impl MatchFinder for Dictionary<'_> {
    fn fill(&mut self, start: usize, len: usize) {
        let end = (start + len).min(self.data.len().saturating_sub(MIN_MATCH - 1));
        for pos in start..end {
            let key = self.prefix(pos);
            let link = self.heads.insert(key, pos).unwrap_or(NO_LINK);
            let slot = self.slot(pos);
            self.prev[slot] = link;
        }
        trace!("Dictionary filled {}..{}", start, end.max(start));
    }

    fn find(&mut self, pos: usize) -> Option<Match> {
        if pos + MIN_MATCH > self.data.len() {
            return None;
        }
        // No chunk could use more than this
        let max_len = (self.data.len() - pos).min(CHUNK_SIZE);
        let mut best: Option<Match> = None;
        let mut candidate = self.prev[self.slot(pos)];
        for _ in 0..self.depth {
            if candidate == NO_LINK || candidate >= pos || pos - candidate > MAX_OFFSET {
                break;
            }
            let length = self.match_len(candidate, pos, max_len);
            if length >= MIN_MATCH && best.map_or(true, |b| length > b.length) {
                best = Some(Match {
                    length,
                    offset: pos - candidate,
                });
                if length == max_len {
                    break;
                }
            }
            candidate = self.prev[self.slot(candidate)];
        }
        best
    }
}
