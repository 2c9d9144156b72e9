use std::io::{self, Cursor, Read, Seek, SeekFrom};

use crate::file::Reopen;

const READ_SIZE: u64 = 64 * 1024; // 64 KB readahead

/// A remote file accessed over HTTP range requests.
///
/// Reads are served from a single in-memory readahead chunk; a read outside
/// the chunk triggers one range request of at least `READ_SIZE` bytes.
pub struct RemoteFile {
    url: String,
    current_position: u64,
    chunk: Option<(u64, Cursor<Vec<u8>>)>,
}

impl RemoteFile {
    pub fn new(url: &str) -> RemoteFile {
        RemoteFile {
            url: url.to_string(),
            current_position: 0,
            chunk: None,
        }
    }

    fn fetch_chunk(&mut self, want: u64) -> io::Result<()> {
        let len = want.max(READ_SIZE);
        let resp = attohttpc::get(&self.url)
            .header(
                "range",
                format!(
                    "bytes={}-{}",
                    self.current_position,
                    self.current_position + len - 1
                ),
            )
            .send()?;
        if !resp.is_success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("range request failed with status {}", resp.status()),
            ));
        }
        let bytes = resp.bytes()?;
        self.chunk = Some((self.current_position, Cursor::new(bytes)));
        Ok(())
    }
}

impl Read for RemoteFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let covered = self.chunk.as_ref().map_or(false, |(start, cursor)| {
            let end = *start + cursor.get_ref().len() as u64;
            *start <= self.current_position && self.current_position < end
        });
        if !covered {
            self.fetch_chunk(buf.len() as u64)?;
        }
        let read = match self.chunk.as_mut() {
            Some((start, cursor)) => {
                cursor.set_position(self.current_position - *start);
                cursor.read(buf)?
            }
            None => 0,
        };
        self.current_position += read as u64;
        Ok(read)
    }
}

impl Seek for RemoteFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.current_position = match pos {
            SeekFrom::Start(s) => s,
            SeekFrom::End(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "cannot seek a remote file from its end",
                ));
            }
            SeekFrom::Current(s) => {
                if s >= 0 {
                    self.current_position + s as u64
                } else {
                    self.current_position
                        .checked_sub(s.unsigned_abs())
                        .ok_or_else(|| {
                            io::Error::new(io::ErrorKind::InvalidInput, "seeked before byte 0")
                        })?
                }
            }
        };
        Ok(self.current_position)
    }
}

impl Clone for RemoteFile {
    fn clone(&self) -> Self {
        RemoteFile::new(&self.url)
    }
}

impl Reopen for RemoteFile {
    fn reopen(&self) -> io::Result<RemoteFile> {
        Ok(RemoteFile::new(&self.url))
    }
}
