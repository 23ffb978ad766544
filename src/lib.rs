//! # Sequential Binary Coefficient Coder
//!
//! Entropy-coding back end for quantized coefficients. A signed value and a
//! table of externally computed stop probabilities are turned into
//! arithmetic-coded bins, and decoded back exactly.
//!
//! This library is organized into several modules:
//! - `utils`: Crate-wide error handling
//! - `coder`: Binary range coder with context-coded and bypass bins
//! - `binarize`: Truncated-unary / sign / Exp-Golomb-0 binarization and the
//!   probability table it consumes
//! - `unit`: Coded units (many values, one flush) and parallel unit helpers

// Re-export commonly used types at the crate root
pub use utils::error::{CabacError, Result};

pub mod utils {
    pub mod error;
}

pub mod binarize;
pub mod coder;
pub mod unit;

// Public API exports
pub use binarize::{
    BinarizeError, ProbabilityTable, clamp_probability, decode_sequential, encode_sequential,
};
pub use coder::{
    BinDecoder, BinEncoder, BinEvent, BinRecorder, RangeCoderError, RangeDecoder, RangeEncoder,
};
pub use unit::{
    UnitDecoder, UnitEncoder, UnitParams, decode_unit, decode_units, encode_unit, encode_units,
};

// Constants
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
