//! Externally supplied stop probabilities for the truncated-unary prefix.

use super::BinarizeError;

/// Full scale of a probability (probability 1.0).
pub const PROB_SCALE: u32 = 1 << 16;

/// Smallest probability handed to the range coder.
pub const MIN_CODING_PROB: u16 = 1;

/// Largest probability handed to the range coder.
pub const MAX_CODING_PROB: u16 = (PROB_SCALE - 1) as u16;

/// Clamps a raw table entry into the range the coder can use without
/// collapsing the interval. Both coding directions go through here.
#[inline]
pub fn clamp_probability(raw: u32) -> u16 {
    raw.clamp(MIN_CODING_PROB as u32, MAX_CODING_PROB as u32) as u16
}

/// Ordered stop probabilities, one per truncated-unary position.
///
/// Entry `k` is the probability (scaled by 65536) that the prefix stops at
/// `k`. The last entry is the escape slot and is never coded: reaching it
/// falls through to Exp-Golomb coding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbabilityTable {
    probs: Vec<u32>,
}

impl ProbabilityTable {
    /// Validates and wraps raw entries on the `[0, 65536]` scale.
    pub fn new(probs: Vec<u32>) -> Result<Self, BinarizeError> {
        if probs.len() < 2 {
            return Err(BinarizeError::InvalidProbCount(probs.len()));
        }
        if let Some((index, &value)) = probs.iter().enumerate().find(|(_, p)| **p > PROB_SCALE) {
            return Err(BinarizeError::ProbabilityOutOfScale { index, value });
        }
        Ok(Self { probs })
    }

    /// Builds a table from the usual 16-bit representation.
    pub fn from_u16(probs: &[u16]) -> Result<Self, BinarizeError> {
        Self::new(probs.iter().map(|&p| p as u32).collect())
    }

    /// Converts a symmetric discrete CDF into conditional stop probabilities.
    ///
    /// `cdf[offset]` holds `P(x < 0)` and `cdf[offset + 1]` holds `P(x <= 0)`;
    /// the final element is the tail mass. Each magnitude `k` gets
    /// `P(|x| = k) / P(|x| >= k)`, with both signs of `k` folded together, and
    /// the last entry gets the escape probability.
    pub fn from_cdf(cdf: &[f64], offset: usize) -> Result<Self, BinarizeError> {
        let len = cdf.len();
        if offset + 2 > len {
            return Err(BinarizeError::InvalidCdf(format!(
                "offset {} leaves no zero bucket in a CDF of length {}",
                offset, len
            )));
        }
        if let Some(i) = cdf.iter().position(|v| !v.is_finite()) {
            return Err(BinarizeError::InvalidCdf(format!(
                "non-finite value at index {}",
                i
            )));
        }

        let mut probs = Vec::with_capacity(len.saturating_sub(offset));
        let mut remaining = 1.0f64;

        let mut push_conditional = |mass: f64, remaining: &mut f64| {
            if *remaining > 0.0 {
                probs.push(mass / *remaining);
                *remaining -= mass;
            } else {
                probs.push(0.0);
            }
        };

        push_conditional(cdf[offset + 1] - cdf[offset], &mut remaining);

        let mut k = 1;
        while offset + k + 1 < len - 1 {
            let one_side = cdf[offset + k + 1] - cdf[offset + k];
            push_conditional(2.0 * one_side, &mut remaining);
            k += 1;
        }

        let tail = cdf[len - 1];
        probs.push(if remaining > 0.0 {
            (tail / remaining).min(1.0)
        } else {
            1.0
        });

        Self::new(probs.into_iter().map(quantize).collect())
    }

    /// Number of entries, including the escape slot.
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    /// `new` guarantees `len() >= 2`.
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Number of positions coded as context bins.
    pub fn explicit_limit(&self) -> usize {
        self.probs.len() - 1
    }

    /// Raw entries as supplied.
    pub fn raw(&self) -> &[u32] {
        &self.probs
    }

    /// Probability actually given to the coder for position `k`.
    #[inline]
    pub fn coding_probability(&self, k: usize) -> u16 {
        clamp_probability(self.probs[k])
    }
}

impl TryFrom<Vec<u32>> for ProbabilityTable {
    type Error = BinarizeError;

    fn try_from(probs: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(probs)
    }
}

impl TryFrom<&[u16]> for ProbabilityTable {
    type Error = BinarizeError;

    fn try_from(probs: &[u16]) -> Result<Self, Self::Error> {
        Self::from_u16(probs)
    }
}

/// Scales a probability to the 16-bit scale, saturating at both ends.
fn quantize(p: f64) -> u32 {
    (p * PROB_SCALE as f64).round().clamp(0.0, PROB_SCALE as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp_probability(0), 1);
        assert_eq!(clamp_probability(1), 1);
        assert_eq!(clamp_probability(32768), 32768);
        assert_eq!(clamp_probability(65535), 65535);
        assert_eq!(clamp_probability(65536), 65535);
    }

    #[test]
    fn test_rejects_short_table() {
        assert!(matches!(
            ProbabilityTable::new(vec![32768]),
            Err(BinarizeError::InvalidProbCount(1))
        ));
        assert!(matches!(
            ProbabilityTable::new(vec![]),
            Err(BinarizeError::InvalidProbCount(0))
        ));
    }

    #[test]
    fn test_rejects_out_of_scale() {
        let err = ProbabilityTable::new(vec![100, 70000, 5]).unwrap_err();
        assert!(matches!(
            err,
            BinarizeError::ProbabilityOutOfScale { index: 1, value: 70000 }
        ));
        assert!(err.is_config());
    }

    #[test]
    fn test_degenerate_entries_kept_raw_but_clamped_for_coding() {
        let table = ProbabilityTable::new(vec![0, 65536, 7]).unwrap();
        assert_eq!(table.raw(), &[0, 65536, 7]);
        assert_eq!(table.coding_probability(0), 1);
        assert_eq!(table.coding_probability(1), 65535);
        assert_eq!(table.explicit_limit(), 2);
    }

    #[test]
    fn test_from_cdf_uniform_magnitudes() {
        // P(x<0)=0.25 at offset 1, P(x=0)=0.5, P(x=1)=0.125 each side, tail 0.125.
        let cdf = [0.125, 0.25, 0.75, 0.875, 0.125];
        let table = ProbabilityTable::from_cdf(&cdf, 1).unwrap();
        // zero: 0.5 / 1.0; |x|=1: 0.25 / 0.5; escape: 0.125 / 0.25 -> 0.5
        assert_eq!(table.raw(), &[32768, 32768, 32768]);
    }

    #[test]
    fn test_from_cdf_exhausted_mass() {
        let cdf = [0.0, 1.0, 1.0, 0.0];
        let table = ProbabilityTable::from_cdf(&cdf, 0).unwrap();
        // All mass sits at zero; later positions get 0 and the escape 1.0.
        assert_eq!(table.raw(), &[65536, 0, 65536]);
        assert_eq!(table.coding_probability(0), 65535);
        assert_eq!(table.coding_probability(1), 1);
    }

    #[test]
    fn test_from_cdf_rejects_bad_input() {
        assert!(matches!(
            ProbabilityTable::from_cdf(&[0.5], 0),
            Err(BinarizeError::InvalidCdf(_))
        ));
        assert!(matches!(
            ProbabilityTable::from_cdf(&[0.0, f64::NAN, 1.0], 0),
            Err(BinarizeError::InvalidCdf(_))
        ));
    }
}
