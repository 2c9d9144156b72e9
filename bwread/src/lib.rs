/*!
Bwread provides a read-only API for querying bigWig genomic signal files.

The file format is defined in this paper: <https://doi.org/10.1093/bioinformatics/btq351>.
A bigWig file embeds a B+-tree mapping chromosome names to internal ids and
an R-tree locating compressed data blocks by genomic bounding box; both are
walked here to answer interval queries.

The entrypoints are [`BigWigReader::open`], which takes any type that
implements [`Read`][std::io::Read], [`Seek`][std::io::Seek], and `Send`,
[`BigWigReader::open_file`] for local paths, and (with the `remote` feature)
[`BigWigReader::open_url`] for files served over HTTP.

The main query method is [`BigWigReader::values`], which returns every stored
[`Interval`] overlapping a half-open region:

```no_run
use bwread::BigWigReader;

# fn main() -> bwread::Result<()> {
let mut reader = BigWigReader::open_file("signal.bw")?;
for interval in reader.values("chr17", 59000, 60000)? {
    println!("{}-{}: {}", interval.start, interval.end, interval.value);
}
# Ok(())
# }
```

[`BigWigReader::value_at`] and [`BigWigReader::values_in_region`] cover the
single-position and region-string forms; [`BigWigReader::values_per_base`]
expands a region into one value per base.

A reader owns one stateful cursor, so queries take `&mut self`. To query from
several workers, derive one reader per worker with [`BigWigReader::reopen`]:
the file content is shared, the cursors are not.
*/

mod block;
mod chroms;
mod error;
mod header;
mod reader;
mod rtree;

pub mod file;

pub use block::Interval;
pub use chroms::ChromEntry;
pub use error::{BigWigError, Result};
pub use header::{FileHeader, Summary, ZoomLevel};
pub use reader::BigWigReader;
