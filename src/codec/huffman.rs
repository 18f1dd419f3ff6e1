//! Huffman coding over single bytes.
//!
//! The tree is rebuilt from the frequency table on both sides, so its shape
//! must be fully deterministic: the merge queue orders candidates by
//! (weight, creation sequence), leaves are created in ascending symbol
//! order, and each merge takes the first node extracted as the left child.
//! Left edges read as 0, right edges as 1.

use super::{encode_with_table, CodeTable, CodeWord, Codec, DECODE_GATE_BITS};
use crate::bitio::BitUnpacker;
use crate::config::Algorithm;
use crate::control::{ControlToken, ProgressTicker};
use crate::error::{Error, Result};
use crate::freq::FrequencyTable;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf { symbol: u8 },
    Internal { left: usize, right: usize },
}

/// Arena-allocated Huffman tree. Nodes link by index; the root is the last
/// node standing after the merge loop.
#[derive(Debug)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize,
}

impl HuffmanTree {
    /// Builds the tree for a frequency table. A table with one symbol
    /// yields a tree whose root is that leaf.
    pub fn build(freq: &FrequencyTable) -> Result<Self> {
        if freq.is_empty() {
            return Err(Error::EmptyInput);
        }

        let distinct = freq.distinct_symbols();
        let mut nodes = Vec::with_capacity(distinct * 2);
        let mut heap = BinaryHeap::with_capacity(distinct);

        for (symbol, count) in freq.iter() {
            let id = nodes.len();
            nodes.push(Node::Leaf { symbol });
            heap.push(Reverse((count as u64, id)));
        }

        while let Some(Reverse((left_weight, left))) = heap.pop() {
            let Some(Reverse((right_weight, right))) = heap.pop() else {
                return Ok(Self { nodes, root: left });
            };
            let id = nodes.len();
            nodes.push(Node::Internal { left, right });
            heap.push(Reverse((left_weight + right_weight, id)));
        }

        Err(Error::EmptyInput)
    }

    /// Derives the code table by walking root-to-leaf, 0 for left and 1 for
    /// right. A single-leaf tree assigns its symbol the code "0".
    pub fn codes(&self) -> CodeTable {
        let mut table = CodeTable::new();
        match self.nodes[self.root] {
            Node::Leaf { symbol } => {
                table.insert(symbol, CodeWord::EMPTY.push(false));
            }
            Node::Internal { .. } => {
                let mut stack = vec![(self.root, CodeWord::EMPTY)];
                while let Some((id, prefix)) = stack.pop() {
                    match self.nodes[id] {
                        Node::Leaf { symbol } => table.insert(symbol, prefix),
                        Node::Internal { left, right } => {
                            stack.push((right, prefix.push(true)));
                            stack.push((left, prefix.push(false)));
                        }
                    }
                }
            }
        }
        table
    }

    fn decode_payload(&self, payload: &[u8], ctrl: &ControlToken) -> Result<Vec<u8>> {
        let mut unpacker = BitUnpacker::new(payload)?;
        let mut ticker = ProgressTicker::new(unpacker.bit_len());
        let mut output = Vec::new();
        let mut consumed = 0u64;
        ctrl.checkpoint()?;

        if let Node::Leaf { symbol } = self.nodes[self.root] {
            // Degenerate tree: every bit is one occurrence of the symbol.
            while unpacker.next_bit().is_some() {
                consumed += 1;
                if consumed % DECODE_GATE_BITS == 0 {
                    ctrl.checkpoint()?;
                    ticker.tick(consumed, ctrl);
                }
                output.push(symbol);
            }
            ctrl.report_progress(100);
            return Ok(output);
        }

        let mut node = self.root;
        while let Some(bit) = unpacker.next_bit() {
            consumed += 1;
            if consumed % DECODE_GATE_BITS == 0 {
                ctrl.checkpoint()?;
                ticker.tick(consumed, ctrl);
            }
            if let Node::Internal { left, right } = self.nodes[node] {
                node = if bit { right } else { left };
            }
            if let Node::Leaf { symbol } = self.nodes[node] {
                output.push(symbol);
                node = self.root;
            }
        }
        // Bits that end mid-path carry no symbol and are dropped.
        ctrl.report_progress(100);
        Ok(output)
    }
}

#[derive(Debug, Default)]
pub struct HuffmanCodec;

impl HuffmanCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for HuffmanCodec {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Huffman
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
        let tree = HuffmanTree::build(freq)?;
        let table = tree.codes();
        encode_with_table(data, &table, ctrl)
    }

    fn decode(
        &self,
        payload: &[u8],
        freq: &FrequencyTable,
        ctrl: &ControlToken,
    ) -> Result<Vec<u8>> {
        let tree = HuffmanTree::build(freq)?;
        tree.decode_payload(payload, ctrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::assert_prefix_free;

    fn round_trip(data: &[u8]) -> Vec<u8> {
        let ctrl = ControlToken::new();
        let freq = FrequencyTable::from_bytes(data);
        let codec = HuffmanCodec::new();
        let payload = codec.encode(data, &freq, &ctrl).unwrap();
        codec.decode(&payload, &freq, &ctrl).unwrap()
    }

    #[test]
    fn test_round_trip_text() {
        let data = b"abracadabra".to_vec();
        assert_eq!(round_trip(&data), data);
    }

    #[test]
    fn test_round_trip_all_byte_values() {
        let mut data = Vec::new();
        for round in 0..4u16 {
            for byte in 0..=255u8 {
                if byte as u16 % (round + 1) == 0 {
                    data.push(byte);
                }
            }
        }
        assert_eq!(round_trip(&data), data);
    }

    #[test]
    fn test_single_symbol_gets_code_zero() {
        let freq = FrequencyTable::from_bytes(b"aaaa");
        let tree = HuffmanTree::build(&freq).unwrap();
        let table = tree.codes();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(b'a'), Some(CodeWord { bits: 0, len: 1 }));
    }

    #[test]
    fn test_single_symbol_round_trip_and_layout() {
        let data = b"aaaa";
        let ctrl = ControlToken::new();
        let freq = FrequencyTable::from_bytes(data);
        let codec = HuffmanCodec::new();
        let payload = codec.encode(data, &freq, &ctrl).unwrap();
        // Four zero bits in one padded byte, then the bit count.
        assert_eq!(payload, vec![0x00, 4, 0, 0, 0]);
        assert_eq!(codec.decode(&payload, &freq, &ctrl).unwrap(), data);
    }

    #[test]
    fn test_equal_weights_build_a_deterministic_tree() {
        let freq = FrequencyTable::from_bytes(b"abcd");
        let table = HuffmanTree::build(&freq).unwrap().codes();
        assert_eq!(table.get(b'a'), Some(CodeWord { bits: 0b00, len: 2 }));
        assert_eq!(table.get(b'b'), Some(CodeWord { bits: 0b01, len: 2 }));
        assert_eq!(table.get(b'c'), Some(CodeWord { bits: 0b10, len: 2 }));
        assert_eq!(table.get(b'd'), Some(CodeWord { bits: 0b11, len: 2 }));
    }

    #[test]
    fn test_codes_are_prefix_free() {
        let data: Vec<u8> = (0..2000u32).map(|i| (i * i % 251) as u8).collect();
        let freq = FrequencyTable::from_bytes(&data);
        let table = HuffmanTree::build(&freq).unwrap().codes();
        assert_prefix_free(&table);
    }

    #[test]
    fn test_frequent_symbols_get_shorter_codes() {
        let mut data = vec![b'x'; 100];
        data.extend_from_slice(b"yz");
        let freq = FrequencyTable::from_bytes(&data);
        let table = HuffmanTree::build(&freq).unwrap().codes();
        let x = table.get(b'x').unwrap();
        let y = table.get(b'y').unwrap();
        assert!(x.len < y.len);
    }

    #[test]
    fn test_incomplete_trailing_path_is_dropped() {
        // Codes from "abcd" are a=00 b=01 c=10 d=11; five bits "00011"
        // decode as "ab" with one dangling bit.
        let freq = FrequencyTable::from_bytes(b"abcd");
        let payload = vec![0b0001_1000, 5, 0, 0, 0];
        let ctrl = ControlToken::new();
        let decoded = HuffmanCodec::new().decode(&payload, &freq, &ctrl).unwrap();
        assert_eq!(decoded, b"ab");
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let ctrl = ControlToken::new();
        let freq = FrequencyTable::from_bytes(b"");
        let codec = HuffmanCodec::new();
        assert!(matches!(
            codec.encode(b"", &freq, &ctrl),
            Err(Error::EmptyInput)
        ));
        assert!(matches!(
            codec.decode(&[0, 0, 0, 0], &freq, &ctrl),
            Err(Error::EmptyInput)
        ));
    }
}
