use std::io::{Cursor, Read, Seek, SeekFrom};

use byteordered::{ByteOrdered, Endianness};

use crate::error::{BigWigError, Result};
use crate::file::SeekableRead;

pub(crate) const BIGWIG_MAGIC: u32 = 0x888F_FC26;

/// Header info for a bigWig file.
///
/// Note that internal properties like file offsets are not public. Reading
/// data is available through [`BigWigReader`](crate::BigWigReader).
#[derive(Copy, Clone, Debug)]
pub struct FileHeader {
    /// The byte order established by the magic number; used for every
    /// multi-byte read in the file.
    pub endianness: Endianness,
    pub version: u16,
    pub field_count: u16,
    pub defined_field_count: u16,

    pub(crate) zoom_levels: u16,
    pub(crate) chromosome_tree_offset: u64,
    pub(crate) full_data_offset: u64,
    pub(crate) full_index_offset: u64,
    pub(crate) auto_sql_offset: u64,
    pub(crate) total_summary_offset: u64,
    pub(crate) uncompress_buf_size: u32,
}

/// A zoom level: a pre-aggregated, lower-resolution copy of the signal data.
/// Parsed but not consumed by range queries.
#[derive(Copy, Clone, Debug)]
pub struct ZoomLevel {
    pub reduction_level: u32,
    pub(crate) data_offset: u64,
    pub(crate) index_offset: u64,
}

/// The whole-file summary of the signal values.
#[derive(Copy, Clone, Debug)]
pub struct Summary {
    pub bases_covered: u64,
    pub min_val: f64,
    pub max_val: f64,
    pub sum: f64,
    pub sum_squares: f64,
}

/// Reads the fixed 64-byte header, the zoom level table following it, and the
/// total summary record. Leaves the stream position unspecified.
pub(crate) fn read_info<R: SeekableRead>(
    read: &mut R,
) -> Result<(FileHeader, Vec<ZoomLevel>, Summary)> {
    let mut header_bytes = [0u8; 64];
    read.read_exact(&mut header_bytes)?;

    let mut probe = ByteOrdered::runtime(Cursor::new(&header_bytes[..]), Endianness::Big);
    let magic = probe.read_u32()?;
    let endianness = if magic == BIGWIG_MAGIC {
        Endianness::Big
    } else if magic.swap_bytes() == BIGWIG_MAGIC {
        Endianness::Little
    } else {
        return Err(BigWigError::Format(
            "magic number of file does not belong to bigWig".to_string(),
        ));
    };

    let mut header_data = ByteOrdered::runtime(probe.into_inner(), endianness);
    let version = header_data.read_u16()?;
    let zoom_levels = header_data.read_u16()?;
    let chromosome_tree_offset = header_data.read_u64()?;
    let full_data_offset = header_data.read_u64()?;
    let full_index_offset = header_data.read_u64()?;
    let field_count = header_data.read_u16()?;
    let defined_field_count = header_data.read_u16()?;
    let auto_sql_offset = header_data.read_u64()?;
    let total_summary_offset = header_data.read_u64()?;
    let uncompress_buf_size = header_data.read_u32()?;
    let _reserved = header_data.read_u64()?;

    let header = FileHeader {
        endianness,
        version,
        zoom_levels,
        chromosome_tree_offset,
        full_data_offset,
        full_index_offset,
        field_count,
        defined_field_count,
        auto_sql_offset,
        total_summary_offset,
        uncompress_buf_size,
    };

    let mut zooms = Vec::with_capacity(header.zoom_levels as usize);
    for _ in 0..header.zoom_levels {
        let mut zoom_bytes = [0u8; 24];
        read.read_exact(&mut zoom_bytes)?;
        let mut zoom_data = ByteOrdered::runtime(Cursor::new(&zoom_bytes[..]), endianness);
        let reduction_level = zoom_data.read_u32()?;
        let _reserved = zoom_data.read_u32()?;
        let data_offset = zoom_data.read_u64()?;
        let index_offset = zoom_data.read_u64()?;
        zooms.push(ZoomLevel {
            reduction_level,
            data_offset,
            index_offset,
        });
    }

    read.seek(SeekFrom::Start(header.total_summary_offset))?;
    let mut summary_bytes = [0u8; 40];
    read.read_exact(&mut summary_bytes)?;
    let mut summary_data = ByteOrdered::runtime(Cursor::new(&summary_bytes[..]), endianness);
    let summary = Summary {
        bases_covered: summary_data.read_u64()?,
        min_val: summary_data.read_f64()?,
        max_val: summary_data.read_f64()?,
        sum: summary_data.read_f64()?,
        sum_squares: summary_data.read_f64()?,
    };

    Ok((header, zooms, summary))
}
