//! Output sink for codecs that hand over entry bytes in chunks without a
//! visible end-of-entry boundary.
//!
//! The sink remembers which output paths are in progress. The first chunk for
//! a path truncates the target, later chunks append. Once the caller
//! [`finish`](ChunkSink::finish)es a path it leaves the in-progress set, so a
//! later item with the same path starts from an empty file again.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct ChunkSink {
    in_progress: HashMap<PathBuf, u64>,
    open: Option<(PathBuf, BufWriter<File>)>,
}

impl ChunkSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one chunk for `target`.
    pub fn write(&mut self, target: &Path, chunk: &[u8]) -> io::Result<()> {
        let reuse = matches!(&self.open, Some((path, _)) if path == target);
        if !reuse {
            self.close()?;
            let append = self.in_progress.contains_key(target);
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .append(append)
                .truncate(!append)
                .open(target)?;
            self.open = Some((target.to_path_buf(), BufWriter::new(file)));
        }

        if let Some((_, writer)) = self.open.as_mut() {
            writer.write_all(chunk)?;
        }
        *self.in_progress.entry(target.to_path_buf()).or_insert(0) += chunk.len() as u64;
        Ok(())
    }

    /// Close `target` and return how many bytes it received, or `None` if no
    /// chunk was ever written for it.
    pub fn finish(&mut self, target: &Path) -> io::Result<Option<u64>> {
        if matches!(&self.open, Some((path, _)) if path == target) {
            self.close()?;
        }
        Ok(self.in_progress.remove(target))
    }

    /// Drain `reader` into `target` in chunks of at most `buffer_size` bytes
    /// and return how many bytes were read.
    pub fn write_from<R: Read + ?Sized>(
        &mut self,
        target: &Path,
        reader: &mut R,
        buffer_size: usize,
    ) -> io::Result<u64> {
        // A zero-length buffer would read as end-of-stream straight away.
        let mut buf = vec![0u8; buffer_size.max(1)];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => return Ok(total),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.write(target, &buf[..n])?;
            total += n as u64;
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some((_, mut writer)) = self.open.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for ChunkSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
