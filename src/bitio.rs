//! Bit-level packing of variable-length codes.
//!
//! Codes are packed MSB-first into a byte buffer. The final partial byte is
//! zero-padded and the exact number of payload bits is appended as a 4-byte
//! little-endian integer, so the unpacker knows where real bits end and
//! padding begins.

use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

/// Accumulates bits MSB-first and produces the packed payload.
#[derive(Debug, Default)]
pub struct BitPacker {
    bytes: Vec<u8>,
    current: u8,
    used: u8,
    total_bits: u64,
}

impl BitPacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bit(&mut self, bit: bool) {
        if bit {
            self.current |= 1 << (7 - self.used);
        }
        self.used += 1;
        self.total_bits += 1;
        if self.used == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.used = 0;
        }
    }

    /// Appends the low `len` bits of `bits`, most significant first.
    pub fn push_bits(&mut self, bits: u64, len: u8) {
        for shift in (0..len).rev() {
            self.push_bit((bits >> shift) & 1 == 1);
        }
    }

    /// Number of bits pushed so far.
    pub fn bit_len(&self) -> u64 {
        self.total_bits
    }

    /// Pads the last byte with zeros and appends the exact bit count.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.total_bits > u32::MAX as u64 {
            return Err(Error::TooLarge(self.total_bits));
        }
        if self.used > 0 {
            self.bytes.push(self.current);
        }
        self.bytes.write_u32::<LittleEndian>(self.total_bits as u32)?;
        Ok(self.bytes)
    }
}

/// Reads bits MSB-first from a packed payload, stopping at the declared
/// bit count so padding is never yielded.
#[derive(Debug)]
pub struct BitUnpacker<'a> {
    data: &'a [u8],
    position: u64,
    bit_len: u64,
}

impl<'a> BitUnpacker<'a> {
    /// Splits `payload` into packed bytes and the trailing bit count.
    pub fn new(payload: &'a [u8]) -> Result<Self> {
        if payload.len() < 4 {
            return Err(Error::InvalidFormat(
                "payload too short to hold a bit count".to_string(),
            ));
        }
        let (data, tail) = payload.split_at(payload.len() - 4);
        let bit_len = LittleEndian::read_u32(tail) as u64;
        if bit_len > data.len() as u64 * 8 {
            return Err(Error::InvalidFormat(format!(
                "declared bit count {} exceeds the {} packed bits present",
                bit_len,
                data.len() * 8
            )));
        }
        Ok(Self { data, position: 0, bit_len })
    }

    pub fn next_bit(&mut self) -> Option<bool> {
        if self.position >= self.bit_len {
            return None;
        }
        let byte = self.data[(self.position / 8) as usize];
        let bit = (byte >> (7 - self.position % 8)) & 1;
        self.position += 1;
        Some(bit == 1)
    }

    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    pub fn bits_remaining(&self) -> u64 {
        self.bit_len - self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_partial_byte() {
        let mut packer = BitPacker::new();
        packer.push_bit(true);
        packer.push_bit(false);
        packer.push_bit(true);
        packer.push_bit(true);
        assert_eq!(packer.bit_len(), 4);
        let payload = packer.finish().unwrap();
        assert_eq!(payload, vec![0b1011_0000, 4, 0, 0, 0]);
    }

    #[test]
    fn test_pack_exact_byte_boundary() {
        let mut packer = BitPacker::new();
        packer.push_bits(0b1010_1010, 8);
        let payload = packer.finish().unwrap();
        assert_eq!(payload, vec![0b1010_1010, 8, 0, 0, 0]);
    }

    #[test]
    fn test_push_bits_is_msb_first() {
        let mut packer = BitPacker::new();
        packer.push_bits(0b101, 3);
        packer.push_bits(0b01, 2);
        let payload = packer.finish().unwrap();
        assert_eq!(payload[0], 0b1010_1000);
    }

    #[test]
    fn test_empty_packer_produces_only_the_count() {
        let payload = BitPacker::new().finish().unwrap();
        assert_eq!(payload, vec![0, 0, 0, 0]);
        let mut unpacker = BitUnpacker::new(&payload).unwrap();
        assert_eq!(unpacker.next_bit(), None);
    }

    #[test]
    fn test_unpack_round_trip() {
        let bits = [true, false, true, true, false, false, true, false, true, true, true];
        let mut packer = BitPacker::new();
        for &bit in &bits {
            packer.push_bit(bit);
        }
        let payload = packer.finish().unwrap();

        let mut unpacker = BitUnpacker::new(&payload).unwrap();
        assert_eq!(unpacker.bit_len(), bits.len() as u64);
        let mut restored = Vec::new();
        while let Some(bit) = unpacker.next_bit() {
            restored.push(bit);
        }
        assert_eq!(restored, bits);
    }

    #[test]
    fn test_padding_is_not_yielded() {
        let mut packer = BitPacker::new();
        packer.push_bits(0b11, 2);
        let payload = packer.finish().unwrap();
        let mut unpacker = BitUnpacker::new(&payload).unwrap();
        assert_eq!(unpacker.next_bit(), Some(true));
        assert_eq!(unpacker.next_bit(), Some(true));
        assert_eq!(unpacker.next_bit(), None);
        assert_eq!(unpacker.next_bit(), None);
    }

    #[test]
    fn test_unpacker_rejects_short_payload() {
        let err = BitUnpacker::new(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_unpacker_rejects_overlong_bit_count() {
        // One packed byte but a declared count of 9 bits.
        let payload = vec![0xFF, 9, 0, 0, 0];
        let err = BitUnpacker::new(&payload).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }
}
