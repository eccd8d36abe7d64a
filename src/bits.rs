//! Bit-addressed cursor over a byte buffer. Bit order within a byte is
//! MSB-first; byte order for multi-byte values is selected per-field by
//! [`Endian`].

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// A run of bits in the order they were read off the wire (MSB-first
/// within each byte). Reversing this across its full length is how the
/// engine realizes little-endian `Bits`/`BitSet` semantics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitString(pub Vec<bool>);

impl BitString {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn reversed(&self) -> BitString {
        let mut bits = self.0.clone();
        bits.reverse();
        BitString(bits)
    }

    /// Interprets the run as an unsigned big-endian integer (first bit is
    /// most significant).
    pub fn to_u64(&self) -> u64 {
        let mut val = 0u64;
        for &bit in &self.0 {
            val = (val << 1) | (bit as u64);
        }
        val
    }

    pub fn from_u64(value: u64, len: usize) -> BitString {
        let mut bits = Vec::with_capacity(len);
        for i in (0..len).rev() {
            bits.push((value >> i) & 1 == 1);
        }
        BitString(bits)
    }

    /// Indices (from the start of the, possibly already-reversed, run)
    /// of bits that are set, for `BitSet` semantics.
    pub fn set_indices(&self) -> Vec<u32> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i as u32))
            .collect()
    }

    pub fn from_indices(indices: &[u32], len: usize) -> BitString {
        let mut bits = vec![false; len];
        for &i in indices {
            if (i as usize) < len {
                bits[i as usize] = true;
            }
        }
        BitString(bits)
    }
}

pub struct BitReader<'b> {
    data: &'b [u8],
    byte_index: usize,
    bit_index: u8,
}

impl<'b> BitReader<'b> {
    pub fn new(data: &'b [u8]) -> Self {
        BitReader {
            data,
            byte_index: 0,
            bit_index: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.byte_index * 8 + self.bit_index as usize
    }

    pub fn bytes(&self) -> &'b [u8] {
        self.data
    }

    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.position()
    }

    fn get_bit(&mut self) -> Result<bool> {
        if self.byte_index >= self.data.len() {
            return Err(Error::InsufficientBytes(self.position()));
        }
        let byte = self.data[self.byte_index];
        let bit = (byte >> (7 - self.bit_index)) & 1 == 1;
        self.bit_index += 1;
        if self.bit_index == 8 {
            self.bit_index = 0;
            self.byte_index += 1;
        }
        Ok(bit)
    }

    pub fn get_bits(&mut self, n: usize) -> Result<BitString> {
        let mut bits = Vec::with_capacity(n);
        for _ in 0..n {
            bits.push(self.get_bit()?);
        }
        Ok(BitString(bits))
    }

    /// Reads `n_bytes` whole bytes, MSB-first within each byte, in
    /// stream order (big-endian byte order regardless of `endian` --
    /// callers reorder for little-endian).
    fn get_raw_bytes(&mut self, n_bytes: usize) -> Result<Vec<u8>> {
        if self.bit_index == 0 {
            let end = self.byte_index + n_bytes;
            if end > self.data.len() {
                return Err(Error::InsufficientBytes(self.position()));
            }
            let out = self.data[self.byte_index..end].to_vec();
            self.byte_index = end;
            Ok(out)
        } else {
            let bits = self.get_bits(n_bytes * 8)?;
            Ok(pack_bits(&bits.0))
        }
    }

    fn get_uint(&mut self, n_bytes: usize, endian: Endian) -> Result<u64> {
        let mut bytes = self.get_raw_bytes(n_bytes)?;
        if endian == Endian::Little {
            bytes.reverse();
        }
        let mut val = 0u64;
        for b in bytes {
            val = (val << 8) | b as u64;
        }
        Ok(val)
    }

    pub fn get_u8(&mut self, endian: Endian) -> Result<u8> {
        Ok(self.get_uint(1, endian)? as u8)
    }

    pub fn get_i8(&mut self, endian: Endian) -> Result<i8> {
        Ok(self.get_u8(endian)? as i8)
    }

    pub fn get_u16(&mut self, endian: Endian) -> Result<u16> {
        Ok(self.get_uint(2, endian)? as u16)
    }

    pub fn get_i16(&mut self, endian: Endian) -> Result<i16> {
        Ok(self.get_u16(endian)? as i16)
    }

    pub fn get_u32(&mut self, endian: Endian) -> Result<u32> {
        Ok(self.get_uint(4, endian)? as u32)
    }

    pub fn get_i32(&mut self, endian: Endian) -> Result<i32> {
        Ok(self.get_u32(endian)? as i32)
    }

    pub fn get_u64(&mut self, endian: Endian) -> Result<u64> {
        self.get_uint(8, endian)
    }

    pub fn get_i64(&mut self, endian: Endian) -> Result<i64> {
        Ok(self.get_u64(endian)? as i64)
    }

    pub fn get_f32(&mut self, endian: Endian) -> Result<f32> {
        Ok(f32::from_bits(self.get_u32(endian)?))
    }

    pub fn get_f64(&mut self, endian: Endian) -> Result<f64> {
        Ok(f64::from_bits(self.get_u64(endian)?))
    }

    /// Arbitrary-width integer, returned as big-endian magnitude bytes
    /// plus sign. `n_bits` need not be a multiple of 8.
    pub fn get_big_int_bytes(&mut self, n_bits: usize, endian: Endian) -> Result<Vec<u8>> {
        let n_bytes = n_bits.div_ceil(8);
        let pad = n_bytes * 8 - n_bits;
        let bits = self.get_bits(n_bits)?;
        let mut padded = vec![false; pad];
        padded.extend(bits.0);
        let mut bytes = pack_bits(&padded);
        if endian == Endian::Little {
            bytes.reverse();
        }
        Ok(bytes)
    }

    pub fn get_text(&mut self, n_bytes: usize) -> Result<Vec<u8>> {
        self.get_raw_bytes(n_bytes)
    }

    /// All bytes up to (not including) the first `terminator`, optionally
    /// consuming it. Requires byte alignment.
    pub fn get_bytes_until(&mut self, terminator: u8, consume: bool) -> Result<Vec<u8>> {
        debug_assert_eq!(self.bit_index, 0, "terminated reads must be byte-aligned");
        let rest = &self.data[self.byte_index..];
        let found = rest
            .iter()
            .position(|&b| b == terminator)
            .ok_or(Error::InsufficientBytes(self.position()))?;
        let out = rest[..found].to_vec();
        self.byte_index += found + if consume { 1 } else { 0 };
        Ok(out)
    }

    pub fn skip(&mut self, n_bits: usize) -> Result<()> {
        if n_bits > self.remaining_bits() {
            return Err(Error::InsufficientBytes(self.position()));
        }
        let total = self.position() + n_bits;
        self.byte_index = total / 8;
        self.bit_index = (total % 8) as u8;
        Ok(())
    }

    pub fn skip_until(&mut self, terminator: u8, consume: bool) -> Result<()> {
        self.get_bytes_until(terminator, consume).map(|_| ())
    }
}

fn pack_bits(bits: &[bool]) -> Vec<u8> {
    debug_assert_eq!(bits.len() % 8, 0);
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u8, |acc, &bit| (acc << 1) | bit as u8)
        })
        .collect()
}

pub struct BitWriter {
    buf: Vec<u8>,
    bit_index: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        BitWriter {
            buf: Vec::new(),
            bit_index: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.buf.len() * 8 - (if self.bit_index > 0 { 8 - self.bit_index as usize } else { 0 })
    }

    fn put_bit(&mut self, bit: bool) {
        if self.bit_index == 0 {
            self.buf.push(0);
        }
        if bit {
            let last = self.buf.last_mut().unwrap();
            *last |= 1 << (7 - self.bit_index);
        }
        self.bit_index += 1;
        if self.bit_index == 8 {
            self.bit_index = 0;
        }
    }

    pub fn put_bits(&mut self, bits: &BitString) {
        for &bit in &bits.0 {
            self.put_bit(bit);
        }
    }

    fn put_raw_bytes(&mut self, bytes: &[u8]) {
        if self.bit_index == 0 {
            self.buf.extend_from_slice(bytes);
        } else {
            for &byte in bytes {
                for i in (0..8).rev() {
                    self.put_bit((byte >> i) & 1 == 1);
                }
            }
        }
    }

    fn put_uint(&mut self, value: u64, n_bytes: usize, endian: Endian) {
        let mut bytes: Vec<u8> = (0..n_bytes)
            .rev()
            .map(|i| (value >> (i * 8)) as u8)
            .collect();
        if endian == Endian::Little {
            bytes.reverse();
        }
        self.put_raw_bytes(&bytes);
    }

    pub fn put_u8(&mut self, value: u8, endian: Endian) {
        self.put_uint(value as u64, 1, endian)
    }

    pub fn put_i8(&mut self, value: i8, endian: Endian) {
        self.put_u8(value as u8, endian)
    }

    pub fn put_u16(&mut self, value: u16, endian: Endian) {
        self.put_uint(value as u64, 2, endian)
    }

    pub fn put_i16(&mut self, value: i16, endian: Endian) {
        self.put_u16(value as u16, endian)
    }

    pub fn put_u32(&mut self, value: u32, endian: Endian) {
        self.put_uint(value as u64, 4, endian)
    }

    pub fn put_i32(&mut self, value: i32, endian: Endian) {
        self.put_u32(value as u32, endian)
    }

    pub fn put_u64(&mut self, value: u64, endian: Endian) {
        self.put_uint(value, 8, endian)
    }

    pub fn put_i64(&mut self, value: i64, endian: Endian) {
        self.put_u64(value as u64, endian)
    }

    pub fn put_f32(&mut self, value: f32, endian: Endian) {
        self.put_u32(value.to_bits(), endian)
    }

    pub fn put_f64(&mut self, value: f64, endian: Endian) {
        self.put_u64(value.to_bits(), endian)
    }

    pub fn put_big_int_bytes(&mut self, bytes: &[u8], n_bits: usize, endian: Endian) {
        let mut bytes = bytes.to_vec();
        if endian == Endian::Little {
            bytes.reverse();
        }
        let n_bytes = n_bits.div_ceil(8);
        let pad = n_bytes * 8 - n_bits;
        let mut bits = Vec::with_capacity(n_bytes * 8);
        for byte in &bytes {
            for i in (0..8).rev() {
                bits.push((byte >> i) & 1 == 1);
            }
        }
        self.put_bits(&BitString(bits[pad..].to_vec()));
    }

    pub fn put_text(&mut self, bytes: &[u8]) {
        self.put_raw_bytes(bytes);
    }

    pub fn put_terminator(&mut self, terminator: u8) {
        self.put_raw_bytes(&[terminator]);
    }

    pub fn flush(&mut self) {
        if self.bit_index != 0 {
            self.bit_index = 0;
        }
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.flush();
        self.buf
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Overwrites a previously-written, byte-aligned range. Used to
    /// back-patch checksum fields after a provisional encode pass.
    pub fn patch_bytes(&mut self, start: usize, bytes: &[u8]) {
        self.buf[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endianness_duality() {
        let be_bytes = [0x00, 0x00, 0x01, 0x2C];
        let mut r = BitReader::new(&be_bytes);
        assert_eq!(r.get_u32(Endian::Big).unwrap(), 300);

        let le_bytes = [0x2C, 0x01, 0x00, 0x00];
        let mut r = BitReader::new(&le_bytes);
        assert_eq!(r.get_u32(Endian::Little).unwrap(), 300);
    }

    #[test]
    fn write_then_read_roundtrip() {
        let mut w = BitWriter::new();
        w.put_u32(0xDEADBEEF, Endian::Big);
        w.put_u16(0x1234, Endian::Little);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.get_u32(Endian::Big).unwrap(), 0xDEADBEEF);
        assert_eq!(r.get_u16(Endian::Little).unwrap(), 0x1234);
    }

    #[test]
    fn bitset_little_endian_reversal() {
        let bytes = [0xF0, 0x0F];
        let mut r = BitReader::new(&bytes);
        let bits = r.get_bits(12).unwrap();
        let reversed = bits.reversed();
        assert_eq!(reversed.set_indices(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn terminated_text() {
        let bytes = b"Hello\x00world";
        let mut r = BitReader::new(bytes);
        let text = r.get_bytes_until(0, true).unwrap();
        assert_eq!(text, b"Hello");
        assert_eq!(r.position(), 6 * 8);
    }

    #[test]
    fn insufficient_bytes() {
        let bytes = [0x01];
        let mut r = BitReader::new(&bytes);
        assert!(r.get_u32(Endian::Big).is_err());
    }
}
