use std::io::{Cursor, Read, Seek, SeekFrom};

use byteordered::{ByteOrdered, Endianness};

use crate::error::{BigWigError, Result};
use crate::file::SeekableRead;

pub(crate) const CHROM_TREE_MAGIC: u32 = 0x78CA_8C91;

/// Info on a chromosome present in a bigWig file.
#[derive(Clone, Debug)]
pub struct ChromEntry {
    pub name: String,
    pub length: u32,
    pub(crate) id: u32,
}

impl PartialEq for ChromEntry {
    fn eq(&self, other: &ChromEntry) -> bool {
        self.name == other.name
    }
}

/// Walks the chromosome B+-tree rooted at `offset` and collects every
/// (name, id, length) entry. Called once at open time.
pub(crate) fn read_chrom_tree<R: SeekableRead>(
    read: &mut R,
    endianness: Endianness,
    offset: u64,
) -> Result<Vec<ChromEntry>> {
    read.seek(SeekFrom::Start(offset))?;

    let mut header_bytes = [0u8; 32];
    read.read_exact(&mut header_bytes)?;
    let mut header_data = ByteOrdered::runtime(Cursor::new(&header_bytes[..]), endianness);
    let magic = header_data.read_u32()?;
    if magic != CHROM_TREE_MAGIC {
        return Err(BigWigError::Format(
            "magic number of chromosome tree not what was expected".to_string(),
        ));
    }
    let _block_size = header_data.read_u32()?;
    let key_size = header_data.read_u32()?;
    let val_size = header_data.read_u32()?;
    let item_count = header_data.read_u64()?;
    let _reserved = header_data.read_u64()?;
    if val_size != 8 {
        return Err(BigWigError::Format(format!(
            "chromosome tree value size is {} (expected 8)",
            val_size
        )));
    }

    let mut chroms = Vec::with_capacity(item_count as usize);
    read_chrom_tree_block(read, endianness, key_size, &mut chroms)?;
    Ok(chroms)
}

fn read_chrom_tree_block<R: SeekableRead>(
    read: &mut R,
    endianness: Endianness,
    key_size: u32,
    chroms: &mut Vec<ChromEntry>,
) -> Result<()> {
    let mut node_bytes = [0u8; 4];
    read.read_exact(&mut node_bytes)?;
    let mut node_data = ByteOrdered::runtime(Cursor::new(&node_bytes[..]), endianness);
    let is_leaf = node_data.read_u8()?;
    let _reserved = node_data.read_u8()?;
    let count = node_data.read_u16()?;

    if is_leaf == 1 {
        let mut item_bytes = vec![0u8; key_size as usize + 8];
        for _ in 0..count {
            read.read_exact(&mut item_bytes)?;
            let key = match std::str::from_utf8(&item_bytes[..key_size as usize]) {
                Ok(s) => s.trim_matches(char::from(0)).to_owned(),
                Err(_) => {
                    return Err(BigWigError::Format(
                        "chromosome name is not valid utf-8".to_string(),
                    ));
                }
            };
            let mut value_data =
                ByteOrdered::runtime(Cursor::new(&item_bytes[key_size as usize..]), endianness);
            let id = value_data.read_u32()?;
            let length = value_data.read_u32()?;
            chroms.push(ChromEntry {
                name: key,
                length,
                id,
            });
        }
    } else {
        // Keys of non-leaf items are only useful for pruning; a full walk
        // visits every child regardless, so they are skipped here.
        let mut item_bytes = vec![0u8; key_size as usize + 8];
        let mut children = Vec::with_capacity(count as usize);
        for _ in 0..count {
            read.read_exact(&mut item_bytes)?;
            let mut value_data =
                ByteOrdered::runtime(Cursor::new(&item_bytes[key_size as usize..]), endianness);
            children.push(value_data.read_u64()?);
        }
        for child_offset in children {
            read.seek(SeekFrom::Start(child_offset))?;
            read_chrom_tree_block(read, endianness, key_size, chroms)?;
        }
    }
    Ok(())
}
