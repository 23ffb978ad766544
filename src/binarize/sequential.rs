//! Truncated-unary + sign + Exp-Golomb-0 binarization of one coefficient.

use super::escape::{decode_exp_golomb0, encode_exp_golomb0};
use super::{BinarizeError, ProbabilityTable};
use crate::coder::{BinDecoder, BinEncoder};

/// Largest magnitude a negative coefficient may have.
const MAX_NEGATIVE_MAGNITUDE: u64 = 1 << 31;

/// Binarizes `value` and feeds the bins to `coder`.
///
/// For each explicit position `k` a context bin is coded with the table's
/// probability for `k`: `1` if the magnitude equals `k`, `0` otherwise. The
/// sign follows the first `0` as a bypass bin, so zero carries no sign.
/// Magnitudes at or beyond the explicit limit continue with an Exp-Golomb-0
/// escape of `|value| - explicit_limit`.
pub fn encode_sequential<E: BinEncoder + ?Sized>(
    coder: &mut E,
    value: i32,
    table: &ProbabilityTable,
) -> Result<(), BinarizeError> {
    let abs_val = value.unsigned_abs();
    let explicit_limit = table.explicit_limit();

    for k in 0..explicit_limit {
        let p = table.coding_probability(k);
        if abs_val as usize == k {
            coder.encode_context_bin(true, p)?;
            return Ok(());
        }
        coder.encode_context_bin(false, p)?;
        if k == 0 {
            coder.encode_bypass_bin(value < 0)?;
        }
    }

    // abs_val >= explicit_limit here, so the subtraction cannot wrap.
    let rem = abs_val - explicit_limit as u32;
    encode_exp_golomb0(coder, rem)
}

/// Reads one coefficient binarized by [`encode_sequential`] with the same table.
pub fn decode_sequential<D: BinDecoder + ?Sized>(
    coder: &mut D,
    table: &ProbabilityTable,
) -> Result<i32, BinarizeError> {
    let explicit_limit = table.explicit_limit();
    let mut negative = false;

    for k in 0..explicit_limit {
        if coder.decode_context_bin(table.coding_probability(k))? {
            return apply_sign(k as u64, negative);
        }
        if k == 0 {
            negative = coder.decode_bypass_bin()?;
        }
    }

    let rem = decode_exp_golomb0(coder)?;
    apply_sign(rem + explicit_limit as u64, negative)
}

/// Validates `probs` as a table, then binarizes `value`.
pub fn encode_with_probs<E: BinEncoder + ?Sized>(
    coder: &mut E,
    value: i32,
    probs: &[u32],
) -> Result<(), BinarizeError> {
    let table = ProbabilityTable::new(probs.to_vec())?;
    encode_sequential(coder, value, &table)
}

/// Validates `probs` as a table, then decodes one value.
pub fn decode_with_probs<D: BinDecoder + ?Sized>(
    coder: &mut D,
    probs: &[u32],
) -> Result<i32, BinarizeError> {
    let table = ProbabilityTable::new(probs.to_vec())?;
    decode_sequential(coder, &table)
}

fn apply_sign(magnitude: u64, negative: bool) -> Result<i32, BinarizeError> {
    if negative {
        if magnitude > MAX_NEGATIVE_MAGNITUDE {
            return Err(BinarizeError::MagnitudeOverflow(magnitude));
        }
        Ok((magnitude as i64).wrapping_neg() as i32)
    } else {
        i32::try_from(magnitude).map_err(|_| BinarizeError::MagnitudeOverflow(magnitude))
    }
}
