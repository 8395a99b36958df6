use super::RawWrite;
use crate::error::XpressError;

/// Writes the bit-packed part of one chunk into a caller supplied, fixed size buffer.
pub struct BitWriter<'a> {
    /// Output buffer used to write the bitstream. Never written past its end.
    output: &'a mut [u8],
    /// Byte positions of the two reserved 16-bit words. slots[0] receives the next full word.
    slots: [usize; 2],
    /// Private queue to hold bits, MSB aligned, waiting to be put into slots[0].
    queue: u32,
    /// Count of valid bits in the queue.
    q_bits: u8,
    /// Raw cursor: where the next raw byte (or reserved slot) goes.
    index: usize,
}

impl<'a> BitWriter<'a> {
    /// Create a new BitWriter over `output`. The first four bytes are reserved for the two
    /// leading 16-bit words, so the buffer must hold at least that much.
    pub fn new(output: &'a mut [u8]) -> Result<Self, XpressError> {
        if output.len() < 4 {
            return Err(XpressError::InsufficientBuffer);
        }
        Ok(Self {
            output,
            slots: [0, 2],
            queue: 0,
            q_bits: 0,
            index: 4,
        })
    }

    /// Put the low `n` bits (n <= 16) of `bits` on the stream, most significant bit first.
    pub fn write_bits(&mut self, bits: u32, n: u8) -> Result<(), XpressError> {
        debug_assert!(n <= 16);
        if n == 0 {
            return Ok(());
        }
        let bits = bits & (0xffff_ffff >> (32 - n as u32));
        self.q_bits += n;
        self.queue |= bits << (32 - self.q_bits as u32);

        // More than a word is waiting, so the oldest slot is complete
        if self.q_bits > 16 {
            let word = (self.queue >> 16) as u16;
            self.store_word(self.slots[0], word);
            self.queue <<= 16;
            self.q_bits -= 16;
            self.slots[0] = self.slots[1];
            self.slots[1] = self.reserve(2)?;
        }
        Ok(())
    }

    /// Flush the pending bits into the current slot and zero the spare slot. Returns the
    /// number of bytes used. Flush MUST be called before the output is read.
    pub fn finish(mut self) -> usize {
        let word = (self.queue >> 16) as u16;
        self.store_word(self.slots[0], word);
        self.store_word(self.slots[1], 0);
        self.queue = 0;
        self.q_bits = 0;
        self.index
    }

    /// Bytes used so far, counting both reserved slots.
    pub fn position(&self) -> usize {
        self.index
    }

    fn store_word(&mut self, at: usize, word: u16) {
        self.output[at..at + 2].copy_from_slice(&word.to_le_bytes());
    }

    /// Claim `n` bytes at the raw cursor, returning where they start.
    fn reserve(&mut self, n: usize) -> Result<usize, XpressError> {
        if self.index + n > self.output.len() {
            return Err(XpressError::InsufficientBuffer);
        }
        let at = self.index;
        self.index += n;
        Ok(at)
    }
}

impl RawWrite for BitWriter<'_> {
    fn put_u8(&mut self, value: u8) -> Result<(), XpressError> {
        let at = self.reserve(1)?;
        self.output[at] = value;
        Ok(())
    }

    fn put_u16(&mut self, value: u16) -> Result<(), XpressError> {
        let at = self.reserve(2)?;
        self.output[at..at + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn put_u32(&mut self, value: u32) -> Result<(), XpressError> {
        let at = self.reserve(4)?;
        self.output[at..at + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}
