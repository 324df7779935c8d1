// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Bag-of-cells serialization.
//!
//! Format:
//! ```text
//! [u32 BE] magic b5ee9c72
//! [u8]     has_idx:1 has_crc32c:1 has_cache_bits:1 flags:2 size:3
//! [u8]     off_bytes
//! [size]   cell count
//! [size]   root count
//! [size]   absent count
//! [off]    total cell data size
//! [size..] root indices
//! [off..]  optional index
//! cells:   d1 d2 data refs[size..]
//! [u32]    optional crc32c
//! ```
//! Cells are written parents first, so every reference points forward.

use std::io::{Cursor, Read};
use std::sync::Arc;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use rustc_hash::FxHashMap;

use super::{BitString, Cell, CellKind, CellRef};
use crate::config::BOC_MAGIC;
use crate::error::{KernelError, Result};

type CellKey = ([u8; 32], CellKind);

fn invalid(msg: impl Into<String>) -> KernelError {
    KernelError::InvalidBoc(msg.into())
}

fn truncated(_: std::io::Error) -> KernelError {
    invalid("truncated input")
}

fn bytes_for(value: usize) -> usize {
    let mut n = 1;
    while n < 8 && (value >> (8 * n)) != 0 {
        n += 1;
    }
    n
}

/// Orders the reachable cells parents first, deduplicated by hash and kind.
fn topological_order(root: &CellRef) -> Vec<CellRef> {
    fn visit(cell: &CellRef, seen: &mut FxHashMap<CellKey, ()>, post: &mut Vec<CellRef>) {
        if seen.insert((*cell.hash(), cell.kind()), ()).is_some() {
            return;
        }
        for child in cell.refs() {
            visit(child, seen, post);
        }
        post.push(cell.clone());
    }

    let mut seen = FxHashMap::default();
    let mut post = Vec::new();
    visit(root, &mut seen, &mut post);
    post.reverse();
    post
}

pub fn to_boc(root: &CellRef) -> Result<Vec<u8>> {
    let cells = topological_order(root);
    let index: FxHashMap<CellKey, usize> = cells
        .iter()
        .enumerate()
        .map(|(i, c)| ((*c.hash(), c.kind()), i))
        .collect();

    let size = bytes_for(cells.len());
    let total: usize = cells
        .iter()
        .map(|c| 2 + c.data().as_bytes().len() + c.refs().len() * size)
        .sum();
    let off_bytes = bytes_for(total);

    let mut out = Vec::with_capacity(total + 32);
    out.write_u32::<BigEndian>(BOC_MAGIC)?;
    out.write_u8(size as u8)?;
    out.write_u8(off_bytes as u8)?;
    out.write_uint::<BigEndian>(cells.len() as u64, size)?;
    out.write_uint::<BigEndian>(1, size)?;
    out.write_uint::<BigEndian>(0, size)?;
    out.write_uint::<BigEndian>(total as u64, off_bytes)?;
    out.write_uint::<BigEndian>(0, size)?;

    for cell in &cells {
        out.extend_from_slice(&cell.descriptors());
        out.extend_from_slice(&cell.data().padded_bytes());
        for child in cell.refs() {
            let child_index = index[&(*child.hash(), child.kind())];
            out.write_uint::<BigEndian>(child_index as u64, size)?;
        }
    }

    Ok(out)
}

struct RawCell {
    exotic: bool,
    level_mask: u8,
    data: BitString,
    refs: Vec<usize>,
}

/// Parses a bag of cells and returns its roots.
pub fn parse_boc(bytes: &[u8]) -> Result<Vec<CellRef>> {
    let mut rdr = Cursor::new(bytes);
    let magic = rdr.read_u32::<BigEndian>().map_err(truncated)?;
    if magic != BOC_MAGIC {
        return Err(invalid(format!("bad magic {magic:08x}")));
    }

    let flags = rdr.read_u8().map_err(truncated)?;
    let has_idx = flags & 0x80 != 0;
    let has_crc = flags & 0x40 != 0;
    let size = (flags & 0x07) as usize;
    if !(1..=4).contains(&size) {
        return Err(invalid(format!("ref size {size} out of range")));
    }
    let off_bytes = rdr.read_u8().map_err(truncated)? as usize;
    if !(1..=8).contains(&off_bytes) {
        return Err(invalid(format!("offset size {off_bytes} out of range")));
    }

    let cell_count = rdr.read_uint::<BigEndian>(size).map_err(truncated)? as usize;
    let root_count = rdr.read_uint::<BigEndian>(size).map_err(truncated)? as usize;
    let _absent = rdr.read_uint::<BigEndian>(size).map_err(truncated)?;
    let data_size = rdr.read_uint::<BigEndian>(off_bytes).map_err(truncated)? as usize;
    if root_count == 0 || root_count > cell_count {
        return Err(invalid(format!("{root_count} roots for {cell_count} cells")));
    }
    // Every cell needs at least its two descriptor bytes.
    if cell_count.saturating_mul(2) > bytes.len() {
        return Err(invalid(format!("{cell_count} cells cannot fit in {} bytes", bytes.len())));
    }

    let mut roots = Vec::with_capacity(root_count);
    for _ in 0..root_count {
        let root = rdr.read_uint::<BigEndian>(size).map_err(truncated)? as usize;
        if root >= cell_count {
            return Err(invalid(format!("root index {root} out of range")));
        }
        roots.push(root);
    }
    if has_idx {
        let skip = cell_count * off_bytes;
        rdr.set_position(rdr.position() + skip as u64);
    }

    let data_start = rdr.position() as usize;
    if data_start.checked_add(data_size).map_or(true, |end| end > bytes.len()) {
        return Err(invalid("truncated cell data"));
    }

    let mut raw = Vec::with_capacity(cell_count);
    for i in 0..cell_count {
        raw.push(read_raw_cell(&mut rdr, i, cell_count, size)?);
    }
    if rdr.position() as usize != data_start + data_size {
        return Err(invalid("cell data size mismatch"));
    }
    // crc32c trailer is accepted but not verified.
    let trailer = bytes.len() - (data_start + data_size);
    if trailer != if has_crc { 4 } else { 0 } {
        return Err(invalid(format!("{trailer} unexpected trailing bytes")));
    }

    // Children always come later, so build back to front.
    let mut built: Vec<Option<CellRef>> = vec![None; cell_count];
    for i in (0..cell_count).rev() {
        let RawCell {
            exotic,
            level_mask,
            data,
            refs,
        } = &raw[i];
        let children = refs
            .iter()
            .map(|&r| built[r].clone().ok_or_else(|| invalid("dangling reference")))
            .collect::<Result<Vec<_>>>()?;
        let kind = match (*exotic, data.len()) {
            (false, _) => CellKind::Ordinary,
            (true, bits) if bits < 8 => return Err(invalid("exotic cell without tag")),
            (true, _) => CellKind::from_tag(data.as_bytes()[0])?,
        };
        let cell = Cell::from_parts(kind, data.clone(), children)?;
        if cell.level_mask() != *level_mask {
            return Err(invalid(format!(
                "level mask mismatch in cell {i}: stored {level_mask}, computed {}",
                cell.level_mask()
            )));
        }
        built[i] = Some(Arc::new(cell));
    }

    roots
        .into_iter()
        .map(|r| built[r].clone().ok_or_else(|| invalid("missing root")))
        .collect()
}

fn read_raw_cell(
    rdr: &mut Cursor<&[u8]>,
    index: usize,
    cell_count: usize,
    size: usize,
) -> Result<RawCell> {
    let d1 = rdr.read_u8().map_err(truncated)?;
    let d2 = rdr.read_u8().map_err(truncated)?;
    let ref_count = (d1 & 0x07) as usize;
    let exotic = d1 & 0x08 != 0;
    let with_hashes = d1 & 0x10 != 0;
    let level_mask = d1 >> 5;
    if ref_count > 4 {
        return Err(invalid(format!("cell {index} has {ref_count} refs")));
    }
    if with_hashes {
        let hash_count = level_mask.count_ones() as u64 + 1;
        rdr.set_position(rdr.position() + hash_count * (32 + 2));
    }

    let byte_len = (d2 as usize).div_ceil(2);
    let mut buf = vec![0u8; byte_len];
    rdr.read_exact(&mut buf)
        .map_err(|_| invalid(format!("truncated data in cell {index}")))?;
    let bit_len = if d2 % 2 == 0 {
        byte_len * 8
    } else {
        let last = buf[byte_len - 1];
        if last == 0 {
            return Err(invalid(format!("missing completion tag in cell {index}")));
        }
        byte_len * 8 - last.trailing_zeros() as usize - 1
    };

    let mut refs = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        let r = rdr.read_uint::<BigEndian>(size).map_err(truncated)? as usize;
        if r <= index || r >= cell_count {
            return Err(invalid(format!("cell {index} references {r}")));
        }
        refs.push(r);
    }

    Ok(RawCell {
        exotic,
        level_mask,
        data: BitString::from_bytes_len(&buf, bit_len),
        refs,
    })
}

/// Parses a bag of cells that must hold exactly one root.
pub fn from_boc(bytes: &[u8]) -> Result<CellRef> {
    let mut roots = parse_boc(bytes)?;
    if roots.len() != 1 {
        return Err(invalid(format!("expected one root, found {}", roots.len())));
    }
    Ok(roots.remove(0))
}
