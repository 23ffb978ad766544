//! In-memory bin sink that records the events a binarizer emits.
//!
//! Useful for inspecting a binarization without running the range coder, and
//! for estimating how many bins a value will cost.

use super::{BinEncoder, MAX_BYPASS_BITS, RangeCoderError};
use bitvec::prelude::*;

/// One bin handed to a [`BinEncoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinEvent {
    /// Context-coded bin with `p / 65536` as the probability of a `1`.
    Context { symbol: bool, p: u16 },
    /// Single bypass bin.
    Bypass(bool),
    /// `n` bypass bins carrying the low bits of `bits`, MSB first.
    BypassBatch { bits: u32, n: u32 },
}

impl BinEvent {
    /// Number of bins this event stands for.
    pub fn bin_count(&self) -> usize {
        match *self {
            BinEvent::Context { .. } | BinEvent::Bypass(_) => 1,
            BinEvent::BypassBatch { n, .. } => n as usize,
        }
    }
}

/// Records every bin in emission order.
#[derive(Debug, Default, Clone)]
pub struct BinRecorder {
    events: Vec<BinEvent>,
}

impl BinRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[BinEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Total bins recorded, counting each batched bit separately.
    pub fn bin_count(&self) -> usize {
        self.events.iter().map(BinEvent::bin_count).sum()
    }

    /// The context-coded bins as `(symbol, p)` pairs.
    pub fn context_bins(&self) -> Vec<(bool, u16)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                BinEvent::Context { symbol, p } => Some((symbol, p)),
                _ => None,
            })
            .collect()
    }

    /// Every bypass bin, single or batched, in the order it was coded.
    pub fn bypass_bits(&self) -> BitVec<u8, Msb0> {
        let mut bits = BitVec::new();
        for event in &self.events {
            match *event {
                BinEvent::Bypass(bit) => bits.push(bit),
                BinEvent::BypassBatch { bits: value, n } => {
                    for i in (0..n).rev() {
                        bits.push((value >> i) & 1 != 0);
                    }
                }
                BinEvent::Context { .. } => {}
            }
        }
        bits
    }
}

impl BinEncoder for BinRecorder {
    fn encode_context_bin(&mut self, symbol: bool, p: u16) -> Result<(), RangeCoderError> {
        if p == 0 {
            return Err(RangeCoderError::ZeroProbability);
        }
        self.events.push(BinEvent::Context { symbol, p });
        Ok(())
    }

    fn encode_bypass_bin(&mut self, symbol: bool) -> Result<(), RangeCoderError> {
        self.events.push(BinEvent::Bypass(symbol));
        Ok(())
    }

    fn encode_bypass_bits(&mut self, value: u32, n: u32) -> Result<(), RangeCoderError> {
        if n > MAX_BYPASS_BITS {
            return Err(RangeCoderError::InvalidBitCount(n));
        }
        let bits = if n == 0 { 0 } else { value & (u32::MAX >> (32 - n)) };
        self.events.push(BinEvent::BypassBatch { bits, n });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let mut rec = BinRecorder::new();
        rec.encode_context_bin(false, 100).unwrap();
        rec.encode_bypass_bin(true).unwrap();
        rec.encode_bypass_bits(0b1101, 4).unwrap();

        assert_eq!(
            rec.events(),
            &[
                BinEvent::Context { symbol: false, p: 100 },
                BinEvent::Bypass(true),
                BinEvent::BypassBatch { bits: 0b1101, n: 4 },
            ]
        );
        assert_eq!(rec.bin_count(), 6);
        assert_eq!(rec.context_bins(), vec![(false, 100)]);
        assert_eq!(rec.bypass_bits(), bitvec![u8, Msb0; 1, 1, 1, 0, 1]);
    }

    #[test]
    fn test_batch_masks_high_bits() {
        let mut rec = BinRecorder::new();
        rec.encode_bypass_bits(0xFFFF_FFF5, 3).unwrap();
        assert_eq!(rec.events(), &[BinEvent::BypassBatch { bits: 0b101, n: 3 }]);
    }

    #[test]
    fn test_zero_probability_rejected() {
        let mut rec = BinRecorder::new();
        assert!(rec.encode_context_bin(true, 0).is_err());
        assert!(rec.events().is_empty());
    }
}
