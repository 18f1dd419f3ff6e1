//! Byte frequency tables.
//!
//! Both codecs derive their code tables from a `FrequencyTable`, and the
//! table travels with each compressed payload so the decoder can rebuild the
//! exact same codes. Iteration order is ascending by symbol; the codecs rely
//! on that when breaking ties, so the order is part of the format contract.

use crate::error::{Error, Result};

/// Histogram of byte values over a buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u32; 256],
}

impl FrequencyTable {
    /// Counts every byte in `data`. Counts saturate at `u32::MAX`; buffers
    /// big enough to get there are rejected later by the 32-bit packed
    /// bit-length bound.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut counts = [0u32; 256];
        for &byte in data {
            counts[byte as usize] = counts[byte as usize].saturating_add(1);
        }
        Self { counts }
    }

    /// Rebuilds a table from stored `(symbol, count)` pairs, as read from an
    /// archive header. Duplicate symbols and zero counts are rejected.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u8, u32)>,
    {
        let mut counts = [0u32; 256];
        for (symbol, count) in pairs {
            if count == 0 {
                return Err(Error::InvalidFormat(format!(
                    "zero frequency for symbol {}",
                    symbol
                )));
            }
            if counts[symbol as usize] != 0 {
                return Err(Error::InvalidFormat(format!(
                    "duplicate frequency entry for symbol {}",
                    symbol
                )));
            }
            counts[symbol as usize] = count;
        }
        Ok(Self { counts })
    }

    pub fn count(&self, symbol: u8) -> u32 {
        self.counts[symbol as usize]
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Number of byte values that occur at least once.
    pub fn distinct_symbols(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Present symbols with their counts, ascending by symbol value.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(symbol, &count)| (symbol as u8, count))
    }
}

impl std::fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
