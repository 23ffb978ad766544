//! Binary range coder used as the arithmetic back end of the binarizer.
//!
//! Two kinds of bins are supported:
//! - context-coded bins, whose probability of a `1` is supplied by the caller
//!   on a 16-bit scale, and
//! - bypass bins, coded at exactly one half (singly or in MSB-first batches).
//!
//! The byte sink is any `std::io::Write` and the byte source any `std::io::Read`.

pub mod range_decoder;
pub mod range_encoder;
pub mod recorder;

pub use range_decoder::RangeDecoder;
pub use range_encoder::RangeEncoder;
pub use recorder::{BinEvent, BinRecorder};

use thiserror::Error;

/// Number of bits in the probability scale (probabilities are `p / 65536`).
pub const PROB_BITS: u32 = 16;

/// Number of top bits kept in `range` before a byte is shifted out.
pub const NUM_TOP_BITS: u32 = 24;

/// Renormalization threshold for `range`.
pub const TOP_VALUE: u32 = 1 << NUM_TOP_BITS;

/// Bytes shifted out on flush; the decoder primes itself with the same count.
pub const FLUSH_BYTES: usize = 5;

/// Widest bypass batch accepted in a single call.
pub const MAX_BYPASS_BITS: u32 = 32;

/// Errors raised by the range encoder and decoder.
#[derive(Error, Debug)]
pub enum RangeCoderError {
    #[error("I/O error during range coding: {0}")]
    Io(#[from] std::io::Error),
    #[error("Range coder already flushed")]
    Finished,
    #[error("Context bin probability of 0 would leave an empty interval")]
    ZeroProbability,
    #[error("Bypass batch of {0} bits exceeds 32")]
    InvalidBitCount(u32),
    #[error("Byte stream ended after {consumed} bytes while a bin was unresolved")]
    UnexpectedEof { consumed: usize },
    #[error("Corrupt range coder stream: {0}")]
    Corrupt(String),
}

impl RangeCoderError {
    /// True when the error means the coded data itself is bad.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            RangeCoderError::UnexpectedEof { .. } | RangeCoderError::Corrupt(_)
        )
    }
}

/// Bin-level encoding interface driven by the binarizer.
pub trait BinEncoder {
    /// Encodes `symbol` with `p / 65536` as the probability of a `1`.
    fn encode_context_bin(&mut self, symbol: bool, p: u16) -> Result<(), RangeCoderError>;

    /// Encodes `symbol` at probability one half.
    fn encode_bypass_bin(&mut self, symbol: bool) -> Result<(), RangeCoderError>;

    /// Encodes the low `n` bits of `value`, most significant first.
    fn encode_bypass_bits(&mut self, value: u32, n: u32) -> Result<(), RangeCoderError> {
        if n > MAX_BYPASS_BITS {
            return Err(RangeCoderError::InvalidBitCount(n));
        }
        for i in (0..n).rev() {
            self.encode_bypass_bin((value >> i) & 1 != 0)?;
        }
        Ok(())
    }
}

/// Bin-level decoding interface; the exact inverse of [`BinEncoder`].
pub trait BinDecoder {
    /// Decodes one context bin; `p` must match the value used when encoding.
    fn decode_context_bin(&mut self, p: u16) -> Result<bool, RangeCoderError>;

    /// Decodes one bypass bin.
    fn decode_bypass_bin(&mut self) -> Result<bool, RangeCoderError>;

    /// Decodes `n` bypass bins into an integer, most significant first.
    fn decode_bypass_bits(&mut self, n: u32) -> Result<u32, RangeCoderError> {
        if n > MAX_BYPASS_BITS {
            return Err(RangeCoderError::InvalidBitCount(n));
        }
        let mut value = 0u32;
        for _ in 0..n {
            value = (value << 1) | self.decode_bypass_bin()? as u32;
        }
        Ok(value)
    }
}

impl<T: BinEncoder + ?Sized> BinEncoder for &mut T {
    fn encode_context_bin(&mut self, symbol: bool, p: u16) -> Result<(), RangeCoderError> {
        (**self).encode_context_bin(symbol, p)
    }

    fn encode_bypass_bin(&mut self, symbol: bool) -> Result<(), RangeCoderError> {
        (**self).encode_bypass_bin(symbol)
    }

    fn encode_bypass_bits(&mut self, value: u32, n: u32) -> Result<(), RangeCoderError> {
        (**self).encode_bypass_bits(value, n)
    }
}

impl<T: BinDecoder + ?Sized> BinDecoder for &mut T {
    fn decode_context_bin(&mut self, p: u16) -> Result<bool, RangeCoderError> {
        (**self).decode_context_bin(p)
    }

    fn decode_bypass_bin(&mut self) -> Result<bool, RangeCoderError> {
        (**self).decode_bypass_bin()
    }

    fn decode_bypass_bits(&mut self, n: u32) -> Result<u32, RangeCoderError> {
        (**self).decode_bypass_bits(n)
    }
}

/// Number of bypass bins that can be coded from `range` before the single-bin
/// form would renormalize. The last bin of the chunk is the one that drops
/// `range` below [`TOP_VALUE`].
#[inline]
pub(crate) fn bypass_chunk_len(range: u32) -> u32 {
    debug_assert!(range >= TOP_VALUE);
    let log2 = 31 - range.leading_zeros();
    log2 - (NUM_TOP_BITS - 1)
}
