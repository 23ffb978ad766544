//! Binary range decoder, the mirror of [`RangeEncoder`](super::RangeEncoder).

use super::{
    BinDecoder, FLUSH_BYTES, MAX_BYPASS_BITS, PROB_BITS, RangeCoderError, TOP_VALUE,
    bypass_chunk_len,
};
use byteorder::ReadBytesExt;
use log::warn;
use std::io::{ErrorKind, Read};

#[cfg(feature = "debug-logging")]
use log::trace;

/// Range decoder reading one coded unit from `R`.
///
/// Exactly the bytes produced by the matching encoder are consumed, so the
/// reader is left positioned at the start of whatever follows the unit.
pub struct RangeDecoder<R: Read> {
    reader: R,
    range: u32,
    code: u32,
    consumed: usize,
}

impl<R: Read> RangeDecoder<R> {
    /// Primes the decoder with the first bytes of a unit.
    pub fn new(reader: R) -> Result<Self, RangeCoderError> {
        let mut decoder = Self {
            reader,
            range: 0xFFFF_FFFF,
            code: 0,
            consumed: 0,
        };

        let lead = decoder.next_byte()?;
        if lead != 0 {
            warn!("range decoder: unit starts with 0x{:02x}, expected 0x00", lead);
            return Err(RangeCoderError::Corrupt(format!(
                "leading byte 0x{:02x} is not zero",
                lead
            )));
        }
        for _ in 1..FLUSH_BYTES {
            decoder.code = (decoder.code << 8) | decoder.next_byte()? as u32;
        }
        if decoder.code == decoder.range {
            warn!("range decoder: initial code lies outside the interval");
            return Err(RangeCoderError::Corrupt(
                "initial code lies outside the coding interval".to_string(),
            ));
        }
        Ok(decoder)
    }

    /// Bytes read from the source so far.
    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }

    /// Returns the source, positioned after the last byte consumed.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn next_byte(&mut self) -> Result<u8, RangeCoderError> {
        match self.reader.read_u8() {
            Ok(byte) => {
                self.consumed += 1;
                Ok(byte)
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                warn!(
                    "range decoder: byte stream exhausted after {} bytes",
                    self.consumed
                );
                Err(RangeCoderError::UnexpectedEof {
                    consumed: self.consumed,
                })
            }
            Err(e) => Err(RangeCoderError::Io(e)),
        }
    }

    #[inline]
    fn normalize(&mut self) -> Result<(), RangeCoderError> {
        while self.range < TOP_VALUE {
            self.code = (self.code << 8) | self.next_byte()? as u32;
            self.range <<= 8;
        }
        Ok(())
    }
}

impl<R: Read> BinDecoder for RangeDecoder<R> {
    #[inline]
    fn decode_context_bin(&mut self, p: u16) -> Result<bool, RangeCoderError> {
        if p == 0 {
            return Err(RangeCoderError::ZeroProbability);
        }

        let bound = (self.range >> PROB_BITS) * p as u32;
        let symbol = if self.code < bound {
            self.range = bound;
            true
        } else {
            self.code -= bound;
            self.range -= bound;
            false
        };

        #[cfg(feature = "debug-logging")]
        trace!("ctx bin: symbol={}, p={}", symbol as u8, p);

        self.normalize()?;
        Ok(symbol)
    }

    #[inline]
    fn decode_bypass_bin(&mut self) -> Result<bool, RangeCoderError> {
        self.range >>= 1;
        let symbol = self.code >= self.range;
        if symbol {
            self.code -= self.range;
        }

        #[cfg(feature = "debug-logging")]
        trace!("bypass bin: symbol={}", symbol as u8);

        self.normalize()?;
        Ok(symbol)
    }

    fn decode_bypass_bits(&mut self, n: u32) -> Result<u32, RangeCoderError> {
        if n > MAX_BYPASS_BITS {
            return Err(RangeCoderError::InvalidBitCount(n));
        }

        let mut value = 0u32;
        let mut remaining = n;
        while remaining > 0 {
            let chunk = bypass_chunk_len(self.range).min(remaining);
            for _ in 0..chunk {
                self.range >>= 1;
                let bit = self.code >= self.range;
                if bit {
                    self.code -= self.range;
                }
                value = (value << 1) | bit as u32;
            }
            remaining -= chunk;
            self.normalize()?;
        }

        #[cfg(feature = "debug-logging")]
        trace!("bypass batch: n={}, value=0x{:x}", n, value);

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::{BinEncoder, RangeEncoder};
    use std::io::Cursor;

    #[test]
    fn test_context_bins_roundtrip() {
        let probs = [1u16, 2, 255, 4096, 32768, 60000, 65534, 65535];
        let symbols: Vec<(bool, u16)> = (0..2000)
            .map(|i| ((i * 7 + i / 3) % 5 < 2, probs[i % probs.len()]))
            .collect();

        let mut enc = RangeEncoder::new(Vec::new());
        for &(s, p) in &symbols {
            enc.encode_context_bin(s, p).unwrap();
        }
        let data = enc.finish().unwrap();

        let mut dec = RangeDecoder::new(Cursor::new(&data)).unwrap();
        for &(s, p) in &symbols {
            assert_eq!(dec.decode_context_bin(p).unwrap(), s);
        }
        assert_eq!(dec.bytes_consumed(), data.len());
    }

    #[test]
    fn test_mixed_bins_roundtrip() {
        let mut enc = RangeEncoder::new(Vec::new());
        for i in 0..300u32 {
            enc.encode_context_bin(i % 4 == 0, 20_000).unwrap();
            enc.encode_bypass_bin(i % 3 == 0).unwrap();
            enc.encode_bypass_bits(i.wrapping_mul(0x9E37_79B9), i % 33).unwrap();
        }
        let data = enc.finish().unwrap();

        let mut dec = RangeDecoder::new(data.as_slice()).unwrap();
        for i in 0..300u32 {
            assert_eq!(dec.decode_context_bin(20_000).unwrap(), i % 4 == 0);
            assert_eq!(dec.decode_bypass_bin().unwrap(), i % 3 == 0);
            let n = i % 33;
            let expected = if n == 0 {
                0
            } else {
                i.wrapping_mul(0x9E37_79B9) & (u32::MAX >> (32 - n))
            };
            assert_eq!(dec.decode_bypass_bits(n).unwrap(), expected);
        }
        assert_eq!(dec.bytes_consumed(), data.len());
    }

    #[test]
    fn test_single_and_batched_decode_agree() {
        let mut enc = RangeEncoder::new(Vec::new());
        for i in 0..64u32 {
            enc.encode_bypass_bits(i * 12345, 20).unwrap();
        }
        let data = enc.finish().unwrap();

        let mut batched = RangeDecoder::new(data.as_slice()).unwrap();
        let mut single = RangeDecoder::new(data.as_slice()).unwrap();
        for i in 0..64u32 {
            let mut v = 0u32;
            for _ in 0..20 {
                v = (v << 1) | single.decode_bypass_bin().unwrap() as u32;
            }
            assert_eq!(batched.decode_bypass_bits(20).unwrap(), i * 12345);
            assert_eq!(v, i * 12345);
        }
    }

    #[test]
    fn test_truncated_stream_reports_eof() {
        let mut enc = RangeEncoder::new(Vec::new());
        for i in 0..200u32 {
            enc.encode_bypass_bits(i, 16).unwrap();
        }
        let data = enc.finish().unwrap();
        let cut = &data[..data.len() / 2];

        let mut dec = RangeDecoder::new(cut).unwrap();
        let mut result = Ok(0);
        for _ in 0..200 {
            result = dec.decode_bypass_bits(16);
            if result.is_err() {
                break;
            }
        }
        let err = result.unwrap_err();
        assert!(err.is_corruption());
        assert!(matches!(
            err,
            RangeCoderError::UnexpectedEof { consumed } if consumed == cut.len()
        ));
    }

    #[test]
    fn test_short_header_reports_eof() {
        let err = RangeDecoder::new(&[0u8, 0, 0][..]).err().unwrap();
        assert!(matches!(err, RangeCoderError::UnexpectedEof { consumed: 3 }));
    }

    #[test]
    fn test_nonzero_lead_byte_is_corrupt() {
        let err = RangeDecoder::new(&[1u8, 0, 0, 0, 0][..]).err().unwrap();
        assert!(matches!(err, RangeCoderError::Corrupt(_)));
    }
}
