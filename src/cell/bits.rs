// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Bit strings.

use core::fmt;

/// A growable, MSB-first bit buffer.
///
/// Bits past `len` in the last byte are always zero, so two strings with the
/// same bits compare and hash equal.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitString {
    bytes: Vec<u8>,
    len: usize,
}

impl BitString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            len: bytes.len() * 8,
        }
    }

    /// Takes the first `len` bits of `bytes`. Panics if `bytes` is too short.
    pub fn from_bytes_len(bytes: &[u8], len: usize) -> Self {
        let mut bytes = bytes[..len.div_ceil(8)].to_vec();
        if len % 8 != 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= 0xffu8 << (8 - len % 8);
            }
        }
        Self { bytes, len }
    }

    pub fn from_uint(value: u64, bits: usize) -> Self {
        let mut out = Self::with_capacity(bits);
        out.push_uint(value, bits);
        out
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len);
        self.bytes[index / 8] & (0x80 >> (index % 8)) != 0
    }

    pub fn push(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            self.bytes[self.len / 8] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    /// Appends the low `bits` bits of `value`, most significant first.
    pub fn push_uint(&mut self, value: u64, bits: usize) {
        debug_assert!(bits <= 64);
        for i in (0..bits).rev() {
            self.push((value >> i) & 1 == 1);
        }
    }

    pub fn extend(&mut self, other: &BitString) {
        if self.len % 8 == 0 {
            self.bytes.extend_from_slice(&other.bytes);
            self.len += other.len;
            return;
        }
        for i in 0..other.len {
            self.push(other.get(i));
        }
    }

    /// Copies bits `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> BitString {
        debug_assert!(start <= end && end <= self.len);
        if start % 8 == 0 {
            return Self::from_bytes_len(&self.bytes[start / 8..], end - start);
        }
        let mut out = Self::with_capacity(end - start);
        for i in start..end {
            out.push(self.get(i));
        }
        out
    }

    /// Interprets up to 64 bits as a big-endian unsigned integer.
    pub fn to_uint(&self) -> u64 {
        debug_assert!(self.len <= 64);
        (0..self.len).fold(0u64, |acc, i| (acc << 1) | self.get(i) as u64)
    }

    pub fn common_prefix_len(&self, other: &BitString, from: usize) -> usize {
        let end = self.len.min(other.len);
        (from..end)
            .take_while(|&i| self.get(i) == other.get(i))
            .count()
    }

    pub fn is_uniform(&self) -> bool {
        self.len > 0 && (0..self.len).all(|i| self.get(i) == self.get(0))
    }

    /// Raw bytes, zero padded.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes with the completion tag appended when `len` is not byte aligned.
    pub fn padded_bytes(&self) -> Vec<u8> {
        let mut out = self.bytes.clone();
        if self.len % 8 != 0 {
            out[self.len / 8] |= 0x80 >> (self.len % 8);
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len % 8 == 0 {
            return write!(f, "{}", hex::encode_upper(&self.bytes));
        }
        // Fift-style: hex of the padded bytes with a trailing underscore.
        let padded = self.padded_bytes();
        let nibbles = self.len.div_ceil(4);
        let hex = hex::encode_upper(&padded);
        if self.len % 4 == 0 {
            write!(f, "{}", &hex[..nibbles])
        } else {
            write!(f, "{}_", &hex[..nibbles])
        }
    }
}

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitString({}, {})", self.len, self)
    }
}
