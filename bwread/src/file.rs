use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

#[cfg(feature = "remote")]
pub mod remote;

/// A helper trait for things that implement `Read`, `Seek`, and `Send`
pub trait SeekableRead: Seek + Read + Send {}
impl<T> SeekableRead for T where T: Seek + Read + Send {}

/// Indicates something that can be *reopened*. Importantly, reopening must be
/// independent with respect to seeks and reads from the original object, so a
/// reopened stream can be handed to another worker.
pub trait Reopen: Sized {
    fn reopen(&self) -> io::Result<Self>;
}

/// A local file that remembers its path, so an independent handle over the
/// same content can be opened at any time.
pub struct ReopenableFile {
    path: PathBuf,
    file: File,
}

impl ReopenableFile {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_owned();
        let file = File::open(&path)?;
        Ok(ReopenableFile { path, file })
    }
}

impl Reopen for ReopenableFile {
    fn reopen(&self) -> io::Result<Self> {
        ReopenableFile::open(&self.path)
    }
}

impl Read for ReopenableFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for ReopenableFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}
