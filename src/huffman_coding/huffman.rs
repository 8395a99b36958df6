use log::{error, trace};

use super::huffman_code_from_weights::{improve_code_len_from_weights, MAX_CODE_LENGTH};
use crate::bitstream::bitreader::BitReader;
use crate::bitstream::bitwriter::BitWriter;
use crate::error::XpressError;
use crate::tools::symbol::{HALF_SYMBOLS, STREAM_END, SYMBOLS};

/// Count how many codes there are of each length (index 0 is unused).
fn length_counts(lengths: &[u8; SYMBOLS]) -> [u16; MAX_CODE_LENGTH as usize + 1] {
    let mut counts = [0_u16; MAX_CODE_LENGTH as usize + 1];
    for &len in lengths.iter() {
        counts[len as usize] += 1;
    }
    counts[0] = 0;
    counts
}

/// Symbol 0x100 only means end of stream when no set bit follows it. If its own code were all
/// zeros, an end of stream right after an offset 1, length 3 match would hide that match.
///
/// The all zero code goes to the first symbol in (length, symbol) order, so hand it to another
/// symbol: swap lengths with the first symbol of the next longer length, or failing that make
/// 0x100 one bit longer, or give literal 0 a spare code when 0x100 is alone.
fn keep_stream_end_code_nonzero(lengths: &mut [u8; SYMBOLS]) {
    let end = STREAM_END as usize;
    let len = lengths[end];
    if len == 0 {
        return;
    }
    let sorts_first = lengths
        .iter()
        .enumerate()
        .all(|(sym, &l)| l == 0 || l > len || (l == len && sym >= end));
    if !sorts_first {
        return;
    }

    let longer = (0..SYMBOLS)
        .filter(|&sym| lengths[sym] > len)
        .min_by_key(|&sym| (lengths[sym], sym));
    if let Some(sym) = longer {
        lengths.swap(sym, end);
    } else if lengths.iter().enumerate().any(|(sym, &l)| l != 0 && sym != end) {
        if len < MAX_CODE_LENGTH {
            lengths[end] = len + 1;
        }
    } else {
        lengths[0] = len;
    }
    trace!("Moved the end of stream code off the all zero code");
}

/// Canonical huffman encoder for one chunk.
pub struct HuffmanEncoder {
    lengths: [u8; SYMBOLS],
    codes: [u16; SYMBOLS],
}

impl HuffmanEncoder {
    /// Build the code for a chunk from its symbol frequencies.
    pub fn from_counts(counts: &[u32; SYMBOLS]) -> Result<Self, XpressError> {
        let mut lengths = improve_code_len_from_weights(counts);
        if lengths.iter().all(|&l| l == 0) {
            error!("Huffman code requested for a chunk without symbols");
            return Err(XpressError::Internal("no symbols to build a code from"));
        }
        keep_stream_end_code_nonzero(&mut lengths);
        Ok(Self::from_lengths(lengths))
    }

    /// Assign canonical codes to a set of code lengths. Codes increase with (length, symbol).
    pub fn from_lengths(lengths: [u8; SYMBOLS]) -> Self {
        let counts = length_counts(&lengths);
        let mut next_code = [0_u16; MAX_CODE_LENGTH as usize + 1];
        let mut code = 0_u16;
        for len in 1..=MAX_CODE_LENGTH as usize {
            code = (code + counts[len - 1]) << 1;
            next_code[len] = code;
        }
        let mut codes = [0_u16; SYMBOLS];
        for (sym, &len) in lengths.iter().enumerate() {
            if len != 0 {
                codes[sym] = next_code[len as usize];
                next_code[len as usize] += 1;
            }
        }
        Self { lengths, codes }
    }

    pub fn lengths(&self) -> &[u8; SYMBOLS] {
        &self.lengths
    }

    /// The 256 byte table written at the start of a chunk: low nibble for the even symbol,
    /// high nibble for the odd one.
    pub fn length_table(&self) -> [u8; HALF_SYMBOLS] {
        let mut table = [0_u8; HALF_SYMBOLS];
        for (i, pair) in self.lengths.chunks_exact(2).enumerate() {
            table[i] = pair[1] << 4 | pair[0];
        }
        table
    }

    /// Put the code for `symbol` on the stream.
    pub fn encode(&self, symbol: u16, bw: &mut BitWriter<'_>) -> Result<(), XpressError> {
        let len = self.lengths[symbol as usize];
        if len == 0 {
            error!("Symbol {:#05x} has no huffman code", symbol);
            return Err(XpressError::Internal("symbol has no huffman code"));
        }
        bw.write_bits(self.codes[symbol as usize] as u32, len)
    }
}

/// Canonical huffman decoder for one chunk.
pub struct HuffmanDecoder {
    /// Codes per length.
    counts: [u16; MAX_CODE_LENGTH as usize + 1],
    /// Symbols ordered by (length, symbol).
    symbols: Vec<u16>,
}

impl HuffmanDecoder {
    /// Unpack the 256 byte nibble table at the start of a chunk into 512 code lengths.
    pub fn unpack_table(table: &[u8]) -> [u8; SYMBOLS] {
        let mut lengths = [0_u8; SYMBOLS];
        for (i, &byte) in table.iter().take(HALF_SYMBOLS).enumerate() {
            lengths[2 * i] = byte & 0xF;
            lengths[2 * i + 1] = byte >> 4;
        }
        lengths
    }

    /// Build a decoder. Incomplete codes are accepted, empty or over-subscribed ones are not.
    pub fn from_lengths(lengths: &[u8; SYMBOLS]) -> Result<Self, XpressError> {
        let counts = length_counts(lengths);
        let mut left = 1_i32;
        for &count in counts.iter().skip(1) {
            left <<= 1;
            left -= count as i32;
            if left < 0 {
                return Err(XpressError::InvalidData(
                    "unable to resolve huffman codes: over-subscribed",
                ));
            }
        }
        if counts.iter().all(|&c| c == 0) {
            return Err(XpressError::InvalidData(
                "unable to resolve huffman codes: no codes",
            ));
        }

        let mut symbols = Vec::with_capacity(SYMBOLS);
        for len in 1..=MAX_CODE_LENGTH {
            symbols.extend(
                lengths
                    .iter()
                    .enumerate()
                    .filter(|(_, &l)| l == len)
                    .map(|(sym, _)| sym as u16),
            );
        }
        trace!("Huffman decoder with {} codes", symbols.len());
        Ok(Self { counts, symbols })
    }

    /// Decode one symbol, or None if the buffered bits end before a code is complete.
    pub fn decode(&self, br: &mut BitReader<'_>) -> Option<u16> {
        let avail = br.available_bits().min(MAX_CODE_LENGTH);
        // Left align what we have in a MAX_CODE_LENGTH bit window
        let window = br.peek(avail)? << (MAX_CODE_LENGTH - avail);

        let mut code = 0_u32;
        let mut first = 0_u32;
        let mut index = 0_usize;
        for len in 1..=MAX_CODE_LENGTH {
            if len > avail {
                return None;
            }
            code |= (window >> (MAX_CODE_LENGTH - len)) & 1;
            let count = self.counts[len as usize] as u32;
            if code < first + count {
                br.skip(len);
                return Some(self.symbols[index + (code - first) as usize]);
            }
            index += count as usize;
            first = (first + count) << 1;
            code <<= 1;
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bitstream::bitreader::BitReader;
    use crate::bitstream::bitwriter::BitWriter;

    fn lengths_of(pairs: &[(usize, u8)]) -> [u8; SYMBOLS] {
        let mut lengths = [0_u8; SYMBOLS];
        for &(sym, len) in pairs {
            lengths[sym] = len;
        }
        lengths
    }

    #[test]
    fn canonical_codes_test() {
        let enc = HuffmanEncoder::from_lengths(lengths_of(&[
            (0x100, 1),
            (b'a' as usize, 2),
            (b'b' as usize, 3),
            (0x1FF, 3),
        ]));
        assert_eq!(enc.codes[0x100], 0b0);
        assert_eq!(enc.codes[b'a' as usize], 0b10);
        assert_eq!(enc.codes[b'b' as usize], 0b110);
        assert_eq!(enc.codes[0x1FF], 0b111);
    }

    #[test]
    fn length_table_test() {
        let enc = HuffmanEncoder::from_lengths(lengths_of(&[(0, 3), (1, 5), (0x100, 1), (0x1FF, 7)]));
        let table = enc.length_table();
        assert_eq!(table[0], 0x53);
        assert_eq!(table[0x80], 0x01);
        assert_eq!(table[0xFF], 0x70);
        assert_eq!(&HuffmanDecoder::unpack_table(&table), enc.lengths());
    }

    #[test]
    fn encode_decode_test() {
        let mut counts = [0_u32; SYMBOLS];
        for (i, c) in counts.iter_mut().enumerate() {
            *c = if i % 3 == 0 { (i as u32 % 50) + 1 } else { 0 };
        }
        let enc = HuffmanEncoder::from_counts(&counts).unwrap();
        let dec = HuffmanDecoder::from_lengths(enc.lengths()).unwrap();

        let message: Vec<u16> = (0..SYMBOLS as u16).filter(|s| s % 3 == 0).rev().collect();
        let mut buf = vec![0_u8; 4096];
        let used = {
            let mut bw = BitWriter::new(&mut buf).unwrap();
            for &sym in &message {
                enc.encode(sym, &mut bw).unwrap();
            }
            bw.finish()
        };
        let mut br = BitReader::new(&buf[..used]).unwrap();
        for &sym in &message {
            assert_eq!(dec.decode(&mut br), Some(sym));
        }
    }

    #[test]
    fn missing_code_test() {
        let enc = HuffmanEncoder::from_lengths(lengths_of(&[(1, 1), (2, 1)]));
        let mut buf = [0_u8; 8];
        let mut bw = BitWriter::new(&mut buf).unwrap();
        assert!(matches!(enc.encode(3, &mut bw), Err(XpressError::Internal(_))));
        assert!(HuffmanEncoder::from_counts(&[0; SYMBOLS]).is_err());
    }

    #[test]
    fn stream_end_code_not_zero_test() {
        // Alone, 0x100 would get the one bit code 0
        let mut counts = [0_u32; SYMBOLS];
        counts[STREAM_END as usize] = 2;
        let enc = HuffmanEncoder::from_counts(&counts).unwrap();
        assert_eq!(enc.lengths()[0], 1);
        assert_eq!(enc.codes[STREAM_END as usize], 1);

        // Most frequent symbol by far
        let mut counts = [0_u32; SYMBOLS];
        counts[STREAM_END as usize] = 1000;
        counts[b'a' as usize] = 1;
        counts[b'b' as usize] = 1;
        let enc = HuffmanEncoder::from_counts(&counts).unwrap();
        assert_ne!(enc.codes[STREAM_END as usize], 0);
        assert!(HuffmanDecoder::from_lengths(enc.lengths()).is_ok());

        // Sharing the shortest length only with higher symbols
        let mut counts = [0_u32; SYMBOLS];
        counts[STREAM_END as usize] = 5;
        counts[0x101] = 5;
        let enc = HuffmanEncoder::from_counts(&counts).unwrap();
        assert_ne!(enc.codes[STREAM_END as usize], 0);
        assert!(HuffmanDecoder::from_lengths(enc.lengths()).is_ok());

        // Left alone when a literal already sorts first
        let mut counts = [0_u32; SYMBOLS];
        counts[STREAM_END as usize] = 1;
        counts[b'a' as usize] = 1;
        let enc = HuffmanEncoder::from_counts(&counts).unwrap();
        assert_eq!(enc.lengths()[STREAM_END as usize], 1);
        assert_eq!(enc.codes[STREAM_END as usize], 1);
    }

    #[test]
    fn invalid_tables_test() {
        assert!(HuffmanDecoder::from_lengths(&[0; SYMBOLS]).is_err());
        // Three codes of length 1 cannot exist
        let over = lengths_of(&[(1, 1), (2, 1), (3, 1)]);
        assert!(HuffmanDecoder::from_lengths(&over).is_err());
        // A lone length 1 code is incomplete but usable
        let single = lengths_of(&[(0x100, 1)]);
        assert!(HuffmanDecoder::from_lengths(&single).is_ok());
    }

    #[test]
    fn incomplete_code_test() {
        let dec = HuffmanDecoder::from_lengths(&lengths_of(&[(0x100, 1)])).unwrap();
        let data = [0x00, 0x00, 0x00, 0x00];
        let mut br = BitReader::new(&data).unwrap();
        assert_eq!(dec.decode(&mut br), Some(0x100));
        // A set bit leads nowhere in this code
        let data = [0x00, 0x80, 0x00, 0x00];
        let mut br = BitReader::new(&data).unwrap();
        assert_eq!(dec.decode(&mut br), None);
    }
}
