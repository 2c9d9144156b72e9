use std::io;

use thiserror::Error;

/// Possible errors encountered when reading a bigWig file.
#[derive(Error, Debug)]
pub enum BigWigError {
    /// The file (or a section of it) is not a valid bigWig container. The
    /// file cannot be trusted further; there is no partial recovery.
    #[error("invalid bigWig file: {}", .0)]
    Format(String),
    /// The queried chromosome is not present in the file. Recoverable; the
    /// caller may skip the contig.
    #[error("chromosome not found in file: {}", .0)]
    UnknownChrom(String),
    /// A caller-supplied argument (such as a region string) was malformed.
    #[error("invalid argument: {}", .0)]
    Argument(String),
    /// A single-position query matched more than one stored interval.
    #[error("found {count} overlapping intervals for a single position: {chrom}:{position}")]
    Ambiguous {
        chrom: String,
        position: u32,
        count: usize,
    },
    #[error("error occurred: {}", .0)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, BigWigError>;
