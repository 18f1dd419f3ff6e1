//! Entropy codecs and the code-table machinery they share.
//!
//! Both codecs derive a deterministic prefix-free code table from a
//! [`FrequencyTable`] and pack codes through [`BitPacker`]. The decoder
//! rebuilds the identical table from the same frequencies, so no code
//! table is ever serialized, only the frequencies.

pub mod huffman;
pub mod shannon;

pub use huffman::HuffmanCodec;
pub use shannon::ShannonFanoCodec;

use crate::bitio::BitPacker;
use crate::config::Algorithm;
use crate::control::{ControlToken, ProgressTicker};
use crate::error::{Error, Result};
use crate::freq::FrequencyTable;
use std::collections::HashMap;

/// Gate polling interval on the decode side, in bits.
pub(crate) const DECODE_GATE_BITS: u64 = 8;

/// One prefix-free code, held MSB-first in the low `len` bits of `bits`.
///
/// 64 bits covers every table this crate accepts: counts fit in u32 and at
/// most 256 symbols exist, which keeps code depth well below 64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeWord {
    pub bits: u64,
    pub len: u8,
}

impl CodeWord {
    pub const EMPTY: CodeWord = CodeWord { bits: 0, len: 0 };

    /// Extends the code by one bit on the right.
    pub fn push(self, bit: bool) -> CodeWord {
        debug_assert!(self.len < 64);
        CodeWord {
            bits: self.bits << 1 | bit as u64,
            len: self.len + 1,
        }
    }
}

/// Symbol-to-code mapping produced by a table builder.
#[derive(Debug, Clone)]
pub struct CodeTable {
    codes: [Option<CodeWord>; 256],
}

impl CodeTable {
    pub fn new() -> Self {
        Self { codes: [None; 256] }
    }

    pub fn insert(&mut self, symbol: u8, code: CodeWord) {
        self.codes[symbol as usize] = Some(code);
    }

    pub fn get(&self, symbol: u8) -> Option<CodeWord> {
        self.codes[symbol as usize]
    }

    pub fn len(&self) -> usize {
        self.codes.iter().filter(|code| code.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.iter().all(|code| code.is_none())
    }

    /// Assigned codes, ascending by symbol.
    pub fn iter(&self) -> impl Iterator<Item = (u8, CodeWord)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(symbol, code)| code.map(|c| (symbol as u8, c)))
    }

    /// Decode-side lookup keyed by `(bits, len)`.
    pub fn reverse(&self) -> HashMap<(u64, u8), u8> {
        self.iter()
            .map(|(symbol, code)| ((code.bits, code.len), symbol))
            .collect()
    }

    pub fn max_code_len(&self) -> u8 {
        self.iter().map(|(_, code)| code.len).max().unwrap_or(0)
    }
}

impl Default for CodeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Common interface of the two entropy codecs.
///
/// Payloads are the packed code bits followed by the exact bit count (see
/// [`crate::bitio`]); the frequency table is the only side channel between
/// encode and decode.
pub trait Codec: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    /// Encodes `data` with codes derived from `freq`, the table built over
    /// this exact buffer.
    fn encode(&self, data: &[u8], freq: &FrequencyTable, ctrl: &ControlToken)
        -> Result<Vec<u8>>;

    /// Decodes a payload produced by [`Codec::encode`] under the same table.
    fn decode(&self, payload: &[u8], freq: &FrequencyTable, ctrl: &ControlToken)
        -> Result<Vec<u8>>;
}

/// Creates the codec for an algorithm tag.
pub fn codec_for(algorithm: Algorithm) -> Box<dyn Codec> {
    match algorithm {
        Algorithm::Huffman => Box::new(HuffmanCodec::new()),
        Algorithm::ShannonFano => Box::new(ShannonFanoCodec::new()),
    }
}

/// Packs every byte of `data` through `table`, polling the control token per
/// symbol and reporting whole-percent progress.
pub(crate) fn encode_with_table(
    data: &[u8],
    table: &CodeTable,
    ctrl: &ControlToken,
) -> Result<Vec<u8>> {
    let mut packer = BitPacker::new();
    let mut ticker = ProgressTicker::new(data.len() as u64);
    for (index, &byte) in data.iter().enumerate() {
        ctrl.checkpoint()?;
        ticker.tick(index as u64, ctrl);
        let code = table.get(byte).ok_or_else(|| {
            Error::InvalidFormat(format!("symbol {} missing from the code table", byte))
        })?;
        packer.push_bits(code.bits, code.len);
    }
    ctrl.report_progress(100);
    packer.finish()
}

#[cfg(test)]
pub(crate) fn assert_prefix_free(table: &CodeTable) {
    let codes: Vec<(u8, CodeWord)> = table.iter().collect();
    for (sym_a, a) in &codes {
        for (sym_b, b) in &codes {
            if sym_a == sym_b {
                continue;
            }
            if a.len <= b.len && b.bits >> (b.len - a.len) == a.bits {
                panic!(
                    "code for {} ({:0width$b}) is a prefix of the code for {}",
                    sym_a,
                    a.bits,
                    sym_b,
                    width = a.len as usize
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_word_push() {
        let code = CodeWord::EMPTY.push(true).push(false).push(true);
        assert_eq!(code.bits, 0b101);
        assert_eq!(code.len, 3);
    }

    #[test]
    fn test_code_table_iter_and_reverse() {
        let mut table = CodeTable::new();
        table.insert(b'a', CodeWord { bits: 0b0, len: 1 });
        table.insert(b'b', CodeWord { bits: 0b10, len: 2 });
        table.insert(b'c', CodeWord { bits: 0b11, len: 2 });

        assert_eq!(table.len(), 3);
        assert_eq!(table.max_code_len(), 2);

        let reverse = table.reverse();
        assert_eq!(reverse.get(&(0b0, 1)), Some(&b'a'));
        assert_eq!(reverse.get(&(0b10, 2)), Some(&b'b'));
        assert_eq!(reverse.get(&(0b11, 2)), Some(&b'c'));
        assert_eq!(reverse.get(&(0b1, 1)), None);
    }

    #[test]
    fn test_factory_dispatch() {
        assert_eq!(codec_for(Algorithm::Huffman).algorithm(), Algorithm::Huffman);
        assert_eq!(
            codec_for(Algorithm::ShannonFano).algorithm(),
            Algorithm::ShannonFano
        );
    }

    #[test]
    fn test_encode_rejects_untabled_symbol() {
        let mut table = CodeTable::new();
        table.insert(b'a', CodeWord { bits: 0, len: 1 });
        let ctrl = ControlToken::new();
        let err = encode_with_table(b"ab", &table, &ctrl).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }
}
