use super::{check_range, Storage, StorageError};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Storage backed by a pre-allocated file of exactly `capacity` bytes.
///
/// The file is the flat slot array: no header, no positions. Each access uses
/// positional I/O against the open handle, so there is no shared seek cursor
/// and a producer write never disturbs a concurrent consumer read.
///
/// Every `write` is flushed, so the bytes have been handed to the OS when it
/// returns. Nothing is guaranteed across a crash;
/// call [`FileStorage::sync`] if the bytes must reach the device.
#[derive(Debug)]
pub struct FileStorage {
    file: File,
    path: PathBuf,
    capacity: usize,
}

impl FileStorage {
    /// Creates (or truncates) the file at `path` and sizes it to `capacity`
    /// zero bytes.
    pub fn create(path: impl AsRef<Path>, capacity: usize) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        // Pre-size so later writes never grow the file.
        file.set_len(capacity as u64)?;
        file.sync_all()?;

        debug!(path = %path.display(), capacity, "created file storage");

        Ok(Self {
            file,
            path,
            capacity,
        })
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes file contents to the device.
    pub fn sync(&self) -> Result<(), StorageError> {
        self.file.sync_data()?;
        Ok(())
    }
}

// SAFETY: all access goes through positional syscalls on `&File`, which the
// OS serializes per call; disjoint ranges never observe each other's bytes.
unsafe impl Storage for FileStorage {
    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn write(&self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        check_range(offset, data.len(), self.capacity)?;
        write_all_at(&self.file, data, offset as u64)?;
        (&self.file).flush()?;
        Ok(())
    }

    fn read(&self, offset: usize, out: &mut [u8]) -> Result<(), StorageError> {
        check_range(offset, out.len(), self.capacity)?;
        read_exact_at(&self.file, out, offset as u64)?;
        Ok(())
    }
}

#[cfg(unix)]
fn write_all_at(file: &File, data: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(data, offset)
}

#[cfg(unix)]
fn read_exact_at(file: &File, out: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(out, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut data: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !data.is_empty() {
        match file.seek_write(data, offset) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => {
                data = &data[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut out: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !out.is_empty() {
        match file.seek_read(out, offset) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => {
                out = &mut std::mem::take(&mut out)[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
