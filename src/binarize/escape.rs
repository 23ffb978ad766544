//! Order-0 Exp-Golomb escape coded entirely with bypass bins.

use super::BinarizeError;
use crate::coder::{BinDecoder, BinEncoder};

/// Longest unary prefix a 32-bit payload can produce.
pub const MAX_PREFIX_LEN: u32 = 31;

/// Codes `rem` as `floor(log2(rem + 1))` zero bins followed by the
/// `log2 + 1` bits of `rem + 1`, MSB first. The leading payload bit is always
/// 1 and terminates the prefix.
pub fn encode_exp_golomb0<E: BinEncoder + ?Sized>(
    coder: &mut E,
    rem: u32,
) -> Result<(), BinarizeError> {
    let val = rem as u64 + 1;
    let log2v = 63 - val.leading_zeros();
    if log2v > MAX_PREFIX_LEN {
        // Only reachable for rem == u32::MAX.
        return Err(BinarizeError::MagnitudeOverflow(val));
    }

    for _ in 0..log2v {
        coder.encode_bypass_bin(false)?;
    }
    coder.encode_bypass_bits(val as u32, log2v + 1)?;
    Ok(())
}

/// Inverse of [`encode_exp_golomb0`]. The terminating 1 is consumed while
/// counting the prefix, so only `log2` payload bits are read afterwards.
pub fn decode_exp_golomb0<D: BinDecoder + ?Sized>(coder: &mut D) -> Result<u64, BinarizeError> {
    let mut log2v = 0u32;
    while !coder.decode_bypass_bin()? {
        log2v += 1;
        if log2v > MAX_PREFIX_LEN {
            log::warn!("escape prefix exceeded {} zero bins", MAX_PREFIX_LEN);
            return Err(BinarizeError::CorruptEscape { prefix_len: log2v });
        }
    }

    let tail = coder.decode_bypass_bits(log2v)? as u64;
    let val = (1u64 << log2v) | tail;
    Ok(val - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::{BinEvent, BinRecorder};

    #[test]
    fn test_zero_remainder_is_single_one() {
        let mut rec = BinRecorder::new();
        encode_exp_golomb0(&mut rec, 0).unwrap();
        assert_eq!(rec.events(), &[BinEvent::BypassBatch { bits: 1, n: 1 }]);
    }

    #[test]
    fn test_codeword_layout() {
        // rem 3 -> val 4 = 100b -> 00 100
        let mut rec = BinRecorder::new();
        encode_exp_golomb0(&mut rec, 3).unwrap();
        let bits: Vec<bool> = rec.bypass_bits().iter().map(|b| *b).collect();
        assert_eq!(bits, vec![false, false, true, false, false]);
    }

    #[test]
    fn test_largest_remainder_fits() {
        let mut rec = BinRecorder::new();
        encode_exp_golomb0(&mut rec, u32::MAX - 1).unwrap();
        assert_eq!(rec.bin_count(), 63);
        let mut rec = BinRecorder::new();
        assert!(encode_exp_golomb0(&mut rec, u32::MAX).is_err());
    }
}
