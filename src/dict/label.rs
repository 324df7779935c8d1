// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Edge labels (`HmLabel`).
//!
//! ```text
//! hml_short$0  len:(Unary ~n) s:(n * Bit)
//! hml_long$10  n:(#<= m) s:(n * Bit)
//! hml_same$11  v:Bit n:(#<= m)
//! ```

use crate::cell::{BitString, CellBuilder, CellSlice};
use crate::error::{KernelError, Result};

/// Width of a `#<= m` field.
pub(crate) fn len_bits(max_len: usize) -> usize {
    (usize::BITS - max_len.leading_zeros()) as usize
}

pub(crate) fn read_label(slice: &mut CellSlice, max_len: usize) -> Result<BitString> {
    let label = if !slice.load_bit()? {
        let mut n = 0;
        while slice.load_bit()? {
            n += 1;
            if n > max_len {
                break;
            }
        }
        check_len(n, max_len)?;
        slice.load_bits(n)?
    } else if !slice.load_bit()? {
        let n = slice.load_uint(len_bits(max_len))? as usize;
        check_len(n, max_len)?;
        slice.load_bits(n)?
    } else {
        let bit = slice.load_bit()?;
        let n = slice.load_uint(len_bits(max_len))? as usize;
        check_len(n, max_len)?;
        let mut out = BitString::with_capacity(n);
        for _ in 0..n {
            out.push(bit);
        }
        out
    };
    Ok(label)
}

fn check_len(n: usize, max_len: usize) -> Result<()> {
    if n > max_len {
        return Err(KernelError::MalformedDictionary(format!(
            "label of {n} bits exceeds remaining key width {max_len}"
        )));
    }
    Ok(())
}

/// Writes `label` with the shortest of the three encodings.
pub(crate) fn write_label(b: &mut CellBuilder, label: &BitString, max_len: usize) -> Result<()> {
    let n = label.len();
    let k = len_bits(max_len);
    let short_cost = 2 * n + 2;
    let long_cost = 2 + k + n;
    let same_cost = 3 + k;

    if label.is_uniform() && same_cost < short_cost.min(long_cost) {
        b.store_uint(0b11, 2)?;
        b.store_bit(label.get(0))?;
        b.store_uint(n as u64, k)?;
    } else if short_cost <= long_cost {
        b.store_bit(false)?;
        for _ in 0..n {
            b.store_bit(true)?;
        }
        b.store_bit(false)?;
        b.store_bits(label)?;
    } else {
        b.store_uint(0b10, 2)?;
        b.store_uint(n as u64, k)?;
        b.store_bits(label)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_back(label: &BitString, max_len: usize) -> (BitString, usize) {
        let mut b = CellBuilder::new();
        write_label(&mut b, label, max_len).unwrap();
        let used = b.bits_used();
        let mut s = CellSlice::new(b.build_ref().unwrap());
        (read_label(&mut s, max_len).unwrap(), used)
    }

    #[test]
    fn test_len_bits() {
        assert_eq!(len_bits(0), 0);
        assert_eq!(len_bits(1), 1);
        assert_eq!(len_bits(16), 5);
        assert_eq!(len_bits(256), 9);
    }

    #[test]
    fn test_uniform_label_uses_same_encoding() {
        let zeros = BitString::from_uint(0, 32);
        let (decoded, used) = read_back(&zeros, 32);
        assert_eq!(decoded, zeros);
        assert_eq!(used, 3 + 6);
    }

    #[test]
    fn test_short_label_for_tiny_keys() {
        let label = BitString::from_uint(0b10, 2);
        let (decoded, used) = read_back(&label, 64);
        assert_eq!(decoded, label);
        assert_eq!(used, 6);
    }

    #[test]
    fn test_oversized_label_is_malformed() {
        let mut b = CellBuilder::new();
        b.store_uint(0b10, 2).unwrap();
        b.store_uint(9, 4).unwrap();
        b.store_uint(0, 9).unwrap();
        let mut s = CellSlice::new(b.build_ref().unwrap());
        assert!(matches!(
            read_label(&mut s, 8),
            Err(KernelError::MalformedDictionary(_))
        ));
    }
}
