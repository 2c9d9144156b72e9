use std::path::Path;

use log::debug;

use crate::block::{self, Interval};
use crate::chroms::{self, ChromEntry};
use crate::error::{BigWigError, Result};
use crate::file::{Reopen, ReopenableFile, SeekableRead};
use crate::header::{self, FileHeader, Summary, ZoomLevel};
use crate::rtree::{self, IndexHeader};

#[cfg(feature = "remote")]
use crate::file::remote::RemoteFile;

/// A reader for querying a bigWig file.
///
/// The header, chromosome index, and spatial index root are parsed at open
/// time; data blocks are located and decoded per query. All querying methods
/// take `&mut self` since they share one seek/read cursor: a caller that
/// wants to query from several threads opens one reader per thread (see
/// [`BigWigReader::reopen`]).
pub struct BigWigReader<R> {
    read: R,
    header: FileHeader,
    zoom_levels: Vec<ZoomLevel>,
    summary: Summary,
    chroms: Vec<ChromEntry>,
    index: IndexHeader,
}

impl BigWigReader<ReopenableFile> {
    /// Opens a bigWig file from a local path.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        BigWigReader::open(ReopenableFile::open(path)?)
    }
}

#[cfg(feature = "remote")]
impl BigWigReader<RemoteFile> {
    /// Opens a bigWig file served over HTTP, accessed with range requests.
    pub fn open_url(url: &str) -> Result<Self> {
        BigWigReader::open(RemoteFile::new(url))
    }
}

impl<R: SeekableRead> BigWigReader<R> {
    /// Opens a bigWig file from anything that implements `Read`, `Seek`, and
    /// `Send`.
    pub fn open(mut read: R) -> Result<Self> {
        let (header, zoom_levels, summary) = header::read_info(&mut read)?;
        let chroms =
            chroms::read_chrom_tree(&mut read, header.endianness, header.chromosome_tree_offset)?;
        let index =
            rtree::read_index_header(&mut read, header.endianness, header.full_index_offset)?;
        debug!(
            "opened bigWig: version {}, {} chromosomes, {} zoom levels, {} indexed blocks",
            header.version,
            chroms.len(),
            zoom_levels.len(),
            index.item_count,
        );
        Ok(BigWigReader {
            read,
            header,
            zoom_levels,
            summary,
            chroms,
            index,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn zoom_levels(&self) -> &[ZoomLevel] {
        &self.zoom_levels
    }

    pub fn chroms(&self) -> &[ChromEntry] {
        &self.chroms
    }

    pub fn contains_chrom(&self, name: &str) -> bool {
        self.chroms.iter().any(|c| c.name == name)
    }

    fn chrom_id(&self, name: &str) -> Result<u32> {
        self.chroms
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
            .ok_or_else(|| BigWigError::UnknownChrom(name.to_string()))
    }

    /// Returns every stored interval intersecting `[start, end)` on `chrom`.
    ///
    /// Results are ordered by block, then by record order within a block.
    /// An empty result means the region carries no signal.
    pub fn values(&mut self, chrom: &str, start: u32, end: u32) -> Result<Vec<Interval>> {
        let chrom_id = self.chrom_id(chrom)?;
        let blocks = rtree::overlapping_blocks(
            &mut self.read,
            self.header.endianness,
            self.index.root_offset,
            chrom_id,
            start,
            end,
        )?;
        debug!(
            "query {}:{}-{} matched {} blocks",
            chrom,
            start,
            end,
            blocks.len()
        );
        let mut intervals = Vec::new();
        for block in &blocks {
            block::extract_overlapping_intervals(
                &mut self.read,
                self.header.endianness,
                self.header.uncompress_buf_size,
                block,
                chrom_id,
                start,
                end,
                &mut intervals,
            )?;
        }
        Ok(intervals)
    }

    /// Like [`BigWigReader::values`], with the query given as a
    /// `"chrom:start-end"` region string.
    pub fn values_in_region(&mut self, region: &str) -> Result<Vec<Interval>> {
        let (chrom, start, end) = parse_region(region)?;
        self.values(chrom, start, end)
    }

    /// Returns the value stored at a single position, or `None` if the file
    /// carries no datum there.
    ///
    /// `offset` shifts the queried coordinate, letting callers with 1-based
    /// positions (e.g. VCF) pass `-1`. More than one stored interval covering
    /// the position is reported as [`BigWigError::Ambiguous`] rather than a
    /// silently picked value.
    pub fn value_at(&mut self, chrom: &str, position: u32, offset: i32) -> Result<Option<f32>> {
        let shifted = i64::from(position) + i64::from(offset);
        let start = u32::try_from(shifted).map_err(|_| {
            BigWigError::Argument(format!(
                "position {} with offset {} is out of range",
                position, offset
            ))
        })?;
        let end = start.checked_add(1).ok_or_else(|| {
            BigWigError::Argument(format!(
                "position {} with offset {} is out of range",
                position, offset
            ))
        })?;

        let intervals = self.values(chrom, start, end)?;
        match intervals.len() {
            0 => Ok(None),
            1 => Ok(Some(intervals[0].value)),
            count => Err(BigWigError::Ambiguous {
                chrom: chrom.to_string(),
                position,
                count,
            }),
        }
    }

    /// Returns one value per base of `[start, end)`. Positions with no data
    /// are `f32::NAN`.
    pub fn values_per_base(&mut self, chrom: &str, start: u32, end: u32) -> Result<Vec<f32>> {
        if end < start {
            return Err(BigWigError::Argument(format!(
                "inverted range: {}:{}-{}",
                chrom, start, end
            )));
        }
        let intervals = self.values(chrom, start, end)?;
        let mut values = vec![f32::NAN; (end - start) as usize];
        for interval in intervals {
            let from = interval.start.max(start);
            let to = interval.end.min(end);
            for value in &mut values[(from - start) as usize..(to - start) as usize] {
                *value = interval.value;
            }
        }
        Ok(values)
    }
}

impl<R: SeekableRead + Reopen> BigWigReader<R> {
    /// Derives an independent reader over the same content, with its own
    /// cursor. The already-parsed header and indexes are reused.
    pub fn reopen(&self) -> Result<Self> {
        Ok(BigWigReader {
            read: self.read.reopen()?,
            header: self.header,
            zoom_levels: self.zoom_levels.clone(),
            summary: self.summary,
            chroms: self.chroms.clone(),
            index: self.index,
        })
    }
}

fn parse_region(region: &str) -> Result<(&str, u32, u32)> {
    let malformed = || {
        BigWigError::Argument(format!(
            "region is not formatted correctly, expected 'chrom:start-end': {}",
            region
        ))
    };
    let parts: Vec<&str> = region.split(':').collect();
    if parts.len() != 2 {
        return Err(malformed());
    }
    let bounds: Vec<&str> = parts[1].split('-').collect();
    if bounds.len() != 2 {
        return Err(malformed());
    }
    let start = bounds[0].parse().map_err(|_| malformed())?;
    let end = bounds[1].parse().map_err(|_| malformed())?;
    Ok((parts[0], start, end))
}
