use std::io::{Cursor, Read, Seek, SeekFrom};

use byteordered::{ByteOrdered, Endianness};
use libdeflater::{DecompressionError, Decompressor};

use crate::error::{BigWigError, Result};
use crate::file::SeekableRead;
use crate::rtree::BlockRef;

/// One signal interval: `[start, end)` with a single-precision value.
/// Intervals are returned as stored in the file, filtered against the query
/// window but not clamped to it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
    pub value: f32,
}

/// Fetches one data block, decompresses it if the file declares a
/// decompression buffer, and appends every record intersecting
/// `[start, end)` on `chrom` to `intervals`.
///
/// Blocks whose local header names a different chromosome are discarded
/// whole; their bounding box overlapped the query only because boxes may span
/// chromosome boundaries.
pub(crate) fn extract_overlapping_intervals<R: SeekableRead>(
    read: &mut R,
    endianness: Endianness,
    uncompress_buf_size: u32,
    block: &BlockRef,
    chrom: u32,
    start: u32,
    end: u32,
    intervals: &mut Vec<Interval>,
) -> Result<()> {
    read.seek(SeekFrom::Start(block.offset))?;
    let mut raw_data = vec![0u8; block.size as usize];
    read.read_exact(&mut raw_data)?;

    let block_data = if uncompress_buf_size > 0 {
        let mut decompressor = Decompressor::new();
        let mut outbuf = vec![0u8; uncompress_buf_size as usize];
        let decompressed = decompressor
            .zlib_decompress(&raw_data, &mut outbuf)
            .map_err(|e| match e {
                DecompressionError::InsufficientSpace => BigWigError::Format(
                    "data block exceeds the declared decompression buffer".to_string(),
                ),
                DecompressionError::BadData => {
                    BigWigError::Format("could not decompress data block".to_string())
                }
            })?;
        outbuf.truncate(decompressed);
        outbuf
    } else {
        raw_data
    };

    let mut data = ByteOrdered::runtime(Cursor::new(block_data), endianness);
    let block_chrom = data.read_u32()?;
    let block_start = data.read_u32()?;
    let _block_end = data.read_u32()?;
    let item_step = data.read_u32()?;
    let item_span = data.read_u32()?;
    let section_type = data.read_u8()?;
    let _reserved = data.read_u8()?;
    let item_count = data.read_u16()?;

    if block_chrom != chrom {
        return Ok(());
    }

    let mut curr_start = block_start;
    for _ in 0..item_count {
        let (record_start, record_end, value) = match section_type {
            1 => {
                // bedGraph: explicit (start, end, value)
                let record_start = data.read_u32()?;
                let record_end = data.read_u32()?;
                (record_start, record_end, data.read_f32()?)
            }
            2 => {
                // variable step
                let record_start = data.read_u32()?;
                (record_start, record_start + item_span, data.read_f32()?)
            }
            3 => {
                // fixed step
                let record_start = curr_start;
                curr_start += item_step;
                (record_start, record_start + item_span, data.read_f32()?)
            }
            unknown => {
                return Err(BigWigError::Format(format!(
                    "unknown record type while parsing a data block: {}",
                    unknown
                )));
            }
        };
        if start < record_end && end > record_start {
            intervals.push(Interval {
                start: record_start,
                end: record_end,
                value,
            });
        }
    }
    Ok(())
}
