//! Sequential binarization of signed coefficients.
//!
//! A value is coded as a truncated-unary run of context bins (one probability
//! per position, taken from a [`ProbabilityTable`]), a bypass sign bin after the
//! first "continue", and an order-0 Exp-Golomb escape once the table's explicit
//! positions are exhausted.

pub mod escape;
pub mod sequential;
pub mod table;

pub use sequential::{decode_sequential, decode_with_probs, encode_sequential, encode_with_probs};
pub use table::{
    MAX_CODING_PROB, MIN_CODING_PROB, PROB_SCALE, ProbabilityTable, clamp_probability,
};

use crate::coder::RangeCoderError;
use thiserror::Error;

/// Errors raised while binarizing or debinarizing a value.
#[derive(Error, Debug)]
pub enum BinarizeError {
    #[error("Probability table needs at least 2 entries, got {0}")]
    InvalidProbCount(usize),
    #[error("Probability {value} at index {index} is outside the 16-bit scale")]
    ProbabilityOutOfScale { index: usize, value: u32 },
    #[error("Invalid CDF: {0}")]
    InvalidCdf(String),
    #[error("Escape prefix of {prefix_len} zero bins exceeds the coefficient range")]
    CorruptEscape { prefix_len: u32 },
    #[error("Decoded magnitude {0} does not fit a 32-bit coefficient")]
    MagnitudeOverflow(u64),
    #[error("Range coder error: {0}")]
    Coder(#[from] RangeCoderError),
}

impl BinarizeError {
    /// True when the error means the coded data itself is bad.
    pub fn is_corruption(&self) -> bool {
        match self {
            BinarizeError::CorruptEscape { .. } | BinarizeError::MagnitudeOverflow(_) => true,
            BinarizeError::Coder(e) => e.is_corruption(),
            _ => false,
        }
    }

    /// True when the error comes from a bad probability table.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            BinarizeError::InvalidProbCount(_)
                | BinarizeError::ProbabilityOutOfScale { .. }
                | BinarizeError::InvalidCdf(_)
        )
    }
}
