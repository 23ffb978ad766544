//! Carry-propagating binary range encoder.

use super::{
    BinEncoder, FLUSH_BYTES, MAX_BYPASS_BITS, PROB_BITS, RangeCoderError, TOP_VALUE,
    bypass_chunk_len,
};
use byteorder::WriteBytesExt;
use std::io::Write;

#[cfg(feature = "debug-logging")]
use log::trace;

/// Range encoder writing determined bytes to `W` as they are resolved.
pub struct RangeEncoder<W: Write> {
    writer: Option<W>,
    low: u64,        // 32-bit window plus one carry bit
    range: u32,      // interval width, >= TOP_VALUE between bins
    cache: u8,       // last byte not yet written (may still receive a carry)
    cache_size: u64, // pending 0xFF bytes queued behind `cache`
    bytes_written: u64,
    finished: bool,
    #[cfg(test)]
    carries_into_run: u64,
}

impl<W: Write> RangeEncoder<W> {
    /// Creates a new encoder that writes to the given sink.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            low: 0,
            range: 0xFFFF_FFFF,
            cache: 0,
            cache_size: 0,
            bytes_written: 0,
            finished: false,
            #[cfg(test)]
            carries_into_run: 0,
        }
    }

    /// Bytes handed to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Bytes determined in value but held back until a carry can no longer
    /// reach them (the cached byte plus queued `0xFF` bytes).
    pub fn pending_bytes(&self) -> u64 {
        1 + self.cache_size
    }

    /// True once [`flush`](Self::flush) has run.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Terminates the coded unit. The output ends on a byte boundary and
    /// holds everything a decoder needs to resolve every bin coded so far.
    ///
    /// May be called exactly once; the encoder accepts no bins afterwards,
    /// even if writing the final bytes failed.
    pub fn flush(&mut self) -> Result<(), RangeCoderError> {
        self.ensure_active()?;
        self.finished = true;
        for _ in 0..FLUSH_BYTES {
            self.shift_low()?;
        }
        self.writer
            .as_mut()
            .ok_or(RangeCoderError::Finished)?
            .flush()?;
        Ok(())
    }

    /// Flushes if needed and returns the sink.
    pub fn finish(mut self) -> Result<W, RangeCoderError> {
        if !self.finished {
            self.flush()?;
        }
        self.writer.take().ok_or(RangeCoderError::Finished)
    }

    #[inline]
    fn ensure_active(&self) -> Result<(), RangeCoderError> {
        if self.finished {
            Err(RangeCoderError::Finished)
        } else {
            Ok(())
        }
    }

    #[inline]
    fn normalize(&mut self) -> Result<(), RangeCoderError> {
        while self.range < TOP_VALUE {
            self.shift_low()?;
            self.range <<= 8;
        }
        Ok(())
    }

    /// Moves the top byte of the 32-bit window out of `low`, resolving any
    /// carry into the cached byte and the queued `0xFF` run.
    fn shift_low(&mut self) -> Result<(), RangeCoderError> {
        let carry = (self.low >> 32) as u8;
        let low32 = self.low as u32;

        if low32 < 0xFF00_0000 || carry != 0 {
            #[cfg(test)]
            if carry != 0 && self.cache_size > 0 {
                self.carries_into_run += 1;
            }
            let writer = self.writer.as_mut().ok_or(RangeCoderError::Finished)?;
            writer.write_u8(self.cache.wrapping_add(carry))?;
            let run_byte = 0xFFu8.wrapping_add(carry);
            for _ in 0..self.cache_size {
                writer.write_u8(run_byte)?;
            }
            self.bytes_written += 1 + self.cache_size;
            self.cache = (low32 >> 24) as u8;
            self.cache_size = 0;
        } else {
            self.cache_size += 1;
        }

        self.low = (low32 << 8) as u64;
        Ok(())
    }
}

impl<W: Write> BinEncoder for RangeEncoder<W> {
    #[inline]
    fn encode_context_bin(&mut self, symbol: bool, p: u16) -> Result<(), RangeCoderError> {
        self.ensure_active()?;
        if p == 0 {
            return Err(RangeCoderError::ZeroProbability);
        }

        #[cfg(feature = "debug-logging")]
        trace!("ctx bin: symbol={}, p={}, range=0x{:08x}", symbol as u8, p, self.range);

        let bound = (self.range >> PROB_BITS) * p as u32;
        if symbol {
            self.range = bound;
        } else {
            self.low += bound as u64;
            self.range -= bound;
        }
        self.normalize()
    }

    #[inline]
    fn encode_bypass_bin(&mut self, symbol: bool) -> Result<(), RangeCoderError> {
        self.ensure_active()?;

        #[cfg(feature = "debug-logging")]
        trace!("bypass bin: symbol={}", symbol as u8);

        self.range >>= 1;
        if symbol {
            self.low += self.range as u64;
        }
        self.normalize()
    }

    fn encode_bypass_bits(&mut self, value: u32, n: u32) -> Result<(), RangeCoderError> {
        self.ensure_active()?;
        if n > MAX_BYPASS_BITS {
            return Err(RangeCoderError::InvalidBitCount(n));
        }

        #[cfg(feature = "debug-logging")]
        trace!("bypass batch: n={}, value=0x{:x}", n, value);

        let mut remaining = n;
        while remaining > 0 {
            let chunk = bypass_chunk_len(self.range).min(remaining);
            for _ in 0..chunk {
                remaining -= 1;
                self.range >>= 1;
                if (value >> remaining) & 1 != 0 {
                    self.low += self.range as u64;
                }
            }
            self.normalize()?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for RangeEncoder<W> {
    fn drop(&mut self) {
        if !self.finished && self.writer.is_some() && !std::thread::panicking() {
            let _ = self.flush();
        }
    }
}
