//! Shannon-Fano coding over single bytes.
//!
//! Symbols are sorted by descending frequency, ties keeping ascending
//! symbol order, and segments split recursively at the first index where
//! the left cumulative sum reaches half the segment total. Left parts
//! extend codes with 0, right parts with 1. The same sort and split rules
//! run on both sides, so the table never needs to be serialized.

use super::{encode_with_table, CodeTable, CodeWord, Codec, DECODE_GATE_BITS};
use crate::bitio::BitUnpacker;
use crate::config::Algorithm;
use crate::control::{ControlToken, ProgressTicker};
use crate::error::{Error, Result};
use crate::freq::FrequencyTable;

/// Builds the Shannon-Fano code table for a frequency table. A table with
/// one symbol assigns it the code "0".
pub fn build_codes(freq: &FrequencyTable) -> Result<CodeTable> {
    if freq.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut symbols: Vec<(u8, u32)> = freq.iter().collect();
    // Stable sort: equal counts stay in ascending symbol order.
    symbols.sort_by(|a, b| b.1.cmp(&a.1));

    let mut table = CodeTable::new();
    if let [(symbol, _)] = symbols.as_slice() {
        table.insert(*symbol, CodeWord::EMPTY.push(false));
        return Ok(table);
    }
    split(&symbols, CodeWord::EMPTY, &mut table);
    Ok(table)
}

/// Assigns codes to a descending-frequency segment. The cut lands strictly
/// inside the segment, so both halves shrink and the recursion terminates.
fn split(segment: &[(u8, u32)], prefix: CodeWord, table: &mut CodeTable) {
    if let [(symbol, _)] = segment {
        table.insert(*symbol, prefix);
        return;
    }
    let total: u64 = segment.iter().map(|&(_, count)| count as u64).sum();
    let half = total / 2;
    let mut acc = 0u64;
    let mut cut = 0usize;
    for (index, &(_, count)) in segment.iter().enumerate() {
        acc += count as u64;
        if acc >= half {
            cut = index;
            break;
        }
    }
    split(&segment[..=cut], prefix.push(false), table);
    split(&segment[cut + 1..], prefix.push(true), table);
}

#[derive(Debug, Default)]
pub struct ShannonFanoCodec;

impl ShannonFanoCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for ShannonFanoCodec {
    fn algorithm(&self) -> Algorithm {
        Algorithm::ShannonFano
    }

    fn encode(
        &self,
        data: &[u8],
        freq: &FrequencyTable,
        ctrl: &ControlToken,
    ) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        let table = build_codes(freq)?;
        encode_with_table(data, &table, ctrl)
    }

    fn decode(
        &self,
        payload: &[u8],
        freq: &FrequencyTable,
        ctrl: &ControlToken,
    ) -> Result<Vec<u8>> {
        let table = build_codes(freq)?;
        let reverse = table.reverse();
        let max_len = table.max_code_len();

        let mut unpacker = BitUnpacker::new(payload)?;
        let mut ticker = ProgressTicker::new(unpacker.bit_len());
        let mut output = Vec::new();
        let mut acc = 0u64;
        let mut acc_len = 0u8;
        let mut consumed = 0u64;
        ctrl.checkpoint()?;

        while let Some(bit) = unpacker.next_bit() {
            consumed += 1;
            if consumed % DECODE_GATE_BITS == 0 {
                ctrl.checkpoint()?;
                ticker.tick(consumed, ctrl);
            }
            acc = acc << 1 | bit as u64;
            acc_len += 1;
            if acc_len > max_len {
                return Err(Error::InvalidFormat(format!(
                    "no code matches the accumulated {} bits",
                    acc_len
                )));
            }
            if let Some(&symbol) = reverse.get(&(acc, acc_len)) {
                output.push(symbol);
                acc = 0;
                acc_len = 0;
            }
        }
        // Bits that end mid-code carry no symbol and are dropped.
        ctrl.report_progress(100);
        Ok(output)
    }
}
