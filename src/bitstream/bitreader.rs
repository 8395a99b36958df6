//! BitReader: A module for the XPRESS Huffman decoder.
//!
//! Reads the bit-packed part of a chunk. Between 16 and 32 bits are kept preloaded in a queue,
//! refilled one little-endian word at a time from the raw cursor. Raw bytes are read from that
//! same cursor, which is what keeps them in step with the writer.
//!
//! NOTE: The reader is handed everything that is left of the input, not just one chunk. It never
//! reads past the words the writer reserved for the chunk, so `position()` after the last symbol
//! is the size of the chunk's bitstream.
//!

use super::RawRead;

#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Preloaded bits, MSB aligned. Bits below the valid ones are always zero.
    queue: u32,
    /// Count of valid bits in the queue.
    q_bits: u8,
    /// Raw cursor.
    index: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new BitReader, preloading the first two words. Returns None if `data` holds
    /// fewer than 4 bytes.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        let hi = u16::from_le_bytes([data[0], data[1]]) as u32;
        let lo = u16::from_le_bytes([data[2], data[3]]) as u32;
        Some(Self {
            data,
            queue: hi << 16 | lo,
            q_bits: 32,
            index: 4,
        })
    }

    /// Return the next `n` bits (n <= 16) without consuming them, or None if fewer are buffered.
    pub fn peek(&self, n: u8) -> Option<u32> {
        if n > self.q_bits {
            return None;
        }
        if n == 0 {
            return Some(0);
        }
        Some(self.queue >> (32 - n as u32))
    }

    /// Consume `n` bits (n <= 16, at most `available_bits()`), then refill if the queue is low.
    pub fn skip(&mut self, n: u8) {
        debug_assert!(n <= 16 && n <= self.q_bits);
        if n == 0 {
            return;
        }
        self.queue <<= n as u32;
        self.q_bits -= n;
        if self.q_bits < 16 && self.index + 2 <= self.data.len() {
            let word = u16::from_le_bytes([self.data[self.index], self.data[self.index + 1]]);
            self.queue |= (word as u32) << (16 - self.q_bits as u32);
            self.q_bits += 16;
            self.index += 2;
        }
    }

    /// Bits currently buffered.
    pub fn available_bits(&self) -> u8 {
        self.q_bits
    }

    /// True when no set bit is left among the buffered bits.
    pub fn mask_is_zero(&self) -> bool {
        self.queue == 0
    }

    /// Raw bytes left behind the raw cursor.
    pub fn remaining_raw_bytes(&self) -> usize {
        self.data.len() - self.index
    }

    /// Bytes used so far, counting the preloaded words.
    pub fn position(&self) -> usize {
        self.index
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining_raw_bytes() < n {
            return None;
        }
        let bytes = &self.data[self.index..self.index + n];
        self.index += n;
        Some(bytes)
    }
}

impl RawRead for BitReader<'_> {
    fn get_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn get_u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    fn get_u32(&mut self) -> Option<u32> {
        self.take(4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
