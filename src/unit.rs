//! Coded units: a run of coefficients sharing one range coder and one flush.
//!
//! Units are independent of each other. Each unit's bytes end on a byte
//! boundary and a decoder consumes exactly those bytes, so units can be
//! concatenated and read back from one stream. Independent units may be
//! coded in parallel with the `rayon` feature.

use crate::binarize::{ProbabilityTable, decode_sequential, encode_sequential};
use crate::coder::{RangeDecoder, RangeEncoder};
use crate::utils::error::{CabacError, Result};
use log::{debug, warn};
use std::io::{Read, Write};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Parameters for whole-unit helpers.
#[derive(Debug, Clone)]
pub struct UnitParams {
    /// Treat bytes left over after the last value as corruption.
    pub require_exhausted: bool,
    /// Initial capacity of the output buffer, in bytes.
    pub capacity_hint: usize,
}

impl Default for UnitParams {
    fn default() -> Self {
        Self {
            require_exhausted: true,
            capacity_hint: 256,
        }
    }
}

/// Encodes a sequence of coefficients into one coded unit.
pub struct UnitEncoder<W: Write> {
    coder: RangeEncoder<W>,
    values_coded: usize,
}

impl<W: Write> UnitEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            coder: RangeEncoder::new(writer),
            values_coded: 0,
        }
    }

    /// Binarizes and codes one value with its probability table.
    pub fn encode_value(&mut self, value: i32, table: &ProbabilityTable) -> Result<()> {
        encode_sequential(&mut self.coder, value, table)?;
        self.values_coded += 1;
        Ok(())
    }

    pub fn values_coded(&self) -> usize {
        self.values_coded
    }

    /// Flushes the unit and returns the sink.
    pub fn finish(self) -> Result<W> {
        let values = self.values_coded;
        let writer = self.coder.finish()?;
        debug!("unit encoder: finished after {} values", values);
        Ok(writer)
    }
}

/// Decodes coefficients from one coded unit.
pub struct UnitDecoder<R: Read> {
    coder: RangeDecoder<R>,
    values_decoded: usize,
}

impl<R: Read> UnitDecoder<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            coder: RangeDecoder::new(reader)?,
            values_decoded: 0,
        })
    }

    /// Decodes one value; `table` must be the one used to encode it.
    pub fn decode_value(&mut self, table: &ProbabilityTable) -> Result<i32> {
        let value = decode_sequential(&mut self.coder, table)?;
        self.values_decoded += 1;
        Ok(value)
    }

    pub fn values_decoded(&self) -> usize {
        self.values_decoded
    }

    pub fn bytes_consumed(&self) -> usize {
        self.coder.bytes_consumed()
    }

    /// Returns the source, positioned at the end of this unit.
    pub fn into_inner(self) -> R {
        self.coder.into_inner()
    }
}

/// Picks the table for value `i`: one table per value, or one shared table.
fn table_for(tables: &[ProbabilityTable], i: usize) -> &ProbabilityTable {
    if tables.len() == 1 {
        &tables[0]
    } else {
        &tables[i]
    }
}

fn check_tables(tables: &[ProbabilityTable], count: usize) -> Result<()> {
    if tables.len() == 1 || tables.len() == count {
        Ok(())
    } else {
        Err(CabacError::InvalidArg(format!(
            "{} probability tables for {} values; expected 1 or {}",
            tables.len(),
            count,
            count
        )))
    }
}

/// Encodes `values` into a single flushed unit.
///
/// `tables` holds either one table per value or a single table for all values.
pub fn encode_unit(
    values: &[i32],
    tables: &[ProbabilityTable],
    params: &UnitParams,
) -> Result<Vec<u8>> {
    check_tables(tables, values.len())?;
    debug!("encode_unit: {} values", values.len());

    let mut encoder = UnitEncoder::new(Vec::with_capacity(params.capacity_hint));
    for (i, &value) in values.iter().enumerate() {
        encoder.encode_value(value, table_for(tables, i))?;
    }
    let data = encoder.finish()?;

    debug!("encode_unit: {} values -> {} bytes", values.len(), data.len());
    Ok(data)
}

/// Decodes `count` values from a unit produced by [`encode_unit`].
pub fn decode_unit(
    data: &[u8],
    count: usize,
    tables: &[ProbabilityTable],
    params: &UnitParams,
) -> Result<Vec<i32>> {
    check_tables(tables, count)?;

    let mut decoder = UnitDecoder::new(data)?;
    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        values.push(decoder.decode_value(table_for(tables, i))?);
    }

    let consumed = decoder.bytes_consumed();
    if params.require_exhausted && consumed != data.len() {
        warn!(
            "decode_unit: {} trailing bytes after {} values",
            data.len() - consumed,
            count
        );
        return Err(CabacError::Corrupt(format!(
            "{} of {} bytes left after decoding {} values",
            data.len() - consumed,
            data.len(),
            count
        )));
    }

    debug!("decode_unit: {} bytes -> {} values", consumed, count);
    Ok(values)
}

/// Encodes independent units, each with its own coder. With the `rayon`
/// feature the units are coded in parallel. Output order matches input.
pub fn encode_units(
    units: &[Vec<i32>],
    tables: &[ProbabilityTable],
    params: &UnitParams,
) -> Result<Vec<Vec<u8>>> {
    #[cfg(feature = "rayon")]
    let iter = units.par_iter();
    #[cfg(not(feature = "rayon"))]
    let iter = units.iter();

    iter.map(|values| encode_unit(values, tables, params)).collect()
}

/// Decodes independent units; `counts[i]` values are read from `units[i]`.
pub fn decode_units(
    units: &[&[u8]],
    counts: &[usize],
    tables: &[ProbabilityTable],
    params: &UnitParams,
) -> Result<Vec<Vec<i32>>> {
    if units.len() != counts.len() {
        return Err(CabacError::InvalidArg(format!(
            "{} units but {} value counts",
            units.len(),
            counts.len()
        )));
    }

    #[cfg(feature = "rayon")]
    let iter = units.par_iter().zip(counts.par_iter());
    #[cfg(not(feature = "rayon"))]
    let iter = units.iter().zip(counts.iter());

    iter.map(|(data, &count)| decode_unit(data, count, tables, params))
        .collect()
}
