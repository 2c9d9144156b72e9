use std::io::{Cursor, Read, Seek, SeekFrom};

use byteordered::{ByteOrdered, Endianness};

use crate::error::{BigWigError, Result};
use crate::file::SeekableRead;

pub(crate) const CIR_TREE_MAGIC: u32 = 0x2468_ACE0;

/// A data block located by the spatial index: `size` bytes at `offset`.
/// `start_base` is kept so the final block list can be sorted genomically.
#[derive(Copy, Clone, Debug)]
pub(crate) struct BlockRef {
    pub(crate) offset: u64,
    pub(crate) size: u64,
    pub(crate) start_base: u32,
}

/// The validated R-tree root header. The node walk itself happens per query,
/// starting from `root_offset`.
#[derive(Copy, Clone, Debug)]
pub(crate) struct IndexHeader {
    pub(crate) root_offset: u64,
    pub(crate) item_count: u64,
}

/// The bounding box of one index item, spanning from (start_chrom, start_base)
/// to (end_chrom, end_base). Boxes may straddle a chromosome boundary because
/// contigs are laid out contiguously on disk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ItemBounds {
    pub(crate) start_chrom: u32,
    pub(crate) start_base: u32,
    pub(crate) end_chrom: u32,
    pub(crate) end_base: u32,
}

/// Outcome of testing one index item against the query interval. Items within
/// a node are sorted in ascending genomic order, so a box starting past the
/// query chromosome ends the scan of that node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Overlap {
    /// The box intersects the query interval.
    Yes,
    /// The box cannot intersect; later items in the node still can.
    No,
    /// The box and every later item in the node are past the query.
    PastQuery,
}

pub(crate) fn overlaps(bounds: ItemBounds, chrom: u32, start: u32, end: u32) -> Overlap {
    if chrom < bounds.start_chrom {
        return Overlap::PastQuery;
    }
    if chrom > bounds.end_chrom {
        return Overlap::No;
    }
    if bounds.start_chrom != bounds.end_chrom {
        // The box straddles a chromosome boundary. Base ranges only constrain
        // the two edge chromosomes; anything strictly between is covered.
        if chrom == bounds.start_chrom {
            if bounds.start_base >= end {
                return Overlap::No;
            }
        } else if chrom == bounds.end_chrom && bounds.end_base <= start {
            return Overlap::No;
        }
        Overlap::Yes
    } else if bounds.start_base < end && bounds.end_base > start {
        Overlap::Yes
    } else {
        Overlap::No
    }
}

/// Reads and validates the 48-byte index header at `offset`. The root node
/// immediately follows it.
pub(crate) fn read_index_header<R: SeekableRead>(
    read: &mut R,
    endianness: Endianness,
    offset: u64,
) -> Result<IndexHeader> {
    read.seek(SeekFrom::Start(offset))?;

    let mut header_bytes = [0u8; 48];
    read.read_exact(&mut header_bytes)?;
    let mut header_data = ByteOrdered::runtime(Cursor::new(&header_bytes[..]), endianness);
    let magic = header_data.read_u32()?;
    if magic != CIR_TREE_MAGIC {
        return Err(BigWigError::Format(
            "magic number of index not what was expected".to_string(),
        ));
    }
    let _block_size = header_data.read_u32()?;
    let item_count = header_data.read_u64()?;
    let _start_chrom = header_data.read_u32()?;
    let _start_base = header_data.read_u32()?;
    let _end_chrom = header_data.read_u32()?;
    let _end_base = header_data.read_u32()?;
    let _end_file_offset = header_data.read_u64()?;
    let _items_per_leaf = header_data.read_u32()?;
    let _reserved = header_data.read_u32()?;

    Ok(IndexHeader {
        root_offset: offset + 48,
        item_count,
    })
}

/// Recursively searches the index for every block whose bounding box
/// intersects `[start, end)` on `chrom`. The returned list is sorted by block
/// start base. An empty list is a valid outcome (region has no signal).
pub(crate) fn overlapping_blocks<R: SeekableRead>(
    read: &mut R,
    endianness: Endianness,
    root_offset: u64,
    chrom: u32,
    start: u32,
    end: u32,
) -> Result<Vec<BlockRef>> {
    let mut blocks = Vec::new();
    search_node(read, endianness, root_offset, chrom, start, end, &mut blocks)?;
    blocks.sort_by_key(|b| b.start_base);
    Ok(blocks)
}

fn search_node<R: SeekableRead>(
    read: &mut R,
    endianness: Endianness,
    node_offset: u64,
    chrom: u32,
    start: u32,
    end: u32,
    blocks: &mut Vec<BlockRef>,
) -> Result<()> {
    read.seek(SeekFrom::Start(node_offset))?;

    let mut node_bytes = [0u8; 4];
    read.read_exact(&mut node_bytes)?;
    let mut node_data = ByteOrdered::runtime(Cursor::new(&node_bytes[..]), endianness);
    let is_leaf = node_data.read_u8()?;
    let _reserved = node_data.read_u8()?;
    let count = node_data.read_u16()?;
    if is_leaf > 1 {
        return Err(BigWigError::Format(format!(
            "unexpected index node flag: {}",
            is_leaf
        )));
    }

    let item_len = if is_leaf == 1 { 32 } else { 24 };
    let mut items_bytes = vec![0u8; count as usize * item_len];
    read.read_exact(&mut items_bytes)?;
    let mut items = ByteOrdered::runtime(Cursor::new(&items_bytes[..]), endianness);

    let mut children = Vec::new();
    for _ in 0..count {
        let bounds = ItemBounds {
            start_chrom: items.read_u32()?,
            start_base: items.read_u32()?,
            end_chrom: items.read_u32()?,
            end_base: items.read_u32()?,
        };
        if is_leaf == 1 {
            let data_offset = items.read_u64()?;
            let data_size = items.read_u64()?;
            match overlaps(bounds, chrom, start, end) {
                Overlap::Yes => blocks.push(BlockRef {
                    offset: data_offset,
                    size: data_size,
                    start_base: bounds.start_base,
                }),
                Overlap::No => {}
                Overlap::PastQuery => break,
            }
        } else {
            let child_offset = items.read_u64()?;
            match overlaps(bounds, chrom, start, end) {
                Overlap::Yes => children.push(child_offset),
                Overlap::No => {}
                Overlap::PastQuery => break,
            }
        }
    }

    for child_offset in children {
        search_node(read, endianness, child_offset, chrom, start, end, blocks)?;
    }
    Ok(())
}
