//! Byte-addressable, fixed-capacity storage backends.
//!
//! A [`RingBuffer`](crate::RingBuffer) never touches memory directly. It hands
//! byte ranges to a [`Storage`] implementation, which may be an in-process
//! buffer ([`MemoryStorage`]) or a pre-allocated file ([`FileStorage`]).

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::invariants::debug_assert_range_in_capacity;
use std::io;
use thiserror::Error;

/// Error types for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The byte range `[offset, offset + len)` does not fit in the storage.
    #[error("access of {len} bytes at offset {offset} exceeds capacity {capacity}")]
    OutOfRange {
        /// Start of the rejected access.
        offset: usize,
        /// Length of the rejected access.
        len: usize,
        /// Fixed capacity of the storage.
        capacity: usize,
    },
    /// The backing medium failed (file open, resize, read or write).
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Returns true for the out-of-range variant.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}

/// Capability contract for byte-addressable storage of fixed capacity.
///
/// `write` and `read` copy whole ranges or nothing: a request with
/// `offset + len > capacity()` returns [`StorageError::OutOfRange`] and leaves
/// both the storage and the caller's buffer untouched.
///
/// The trait does not require `Sync`: a backend may be unsafe to share in
/// general (see [`MemoryStorage`]) while still being safe to share under the
/// ring buffer's single-producer/single-consumer protocol.
///
/// # Safety
///
/// Implementations must allow one thread to call `write` while another calls
/// `read` on a *disjoint* byte range of the same instance without undefined
/// behaviour. [`RingBuffer`](crate::RingBuffer) shares its storage between a
/// producer and a consumer thread and relies on this; it never issues
/// overlapping concurrent accesses.
pub unsafe trait Storage: Send {
    /// Returns the fixed capacity in bytes.
    fn capacity(&self) -> usize;

    /// Copies `data` into the medium starting at `offset`.
    fn write(&self, offset: usize, data: &[u8]) -> Result<(), StorageError>;

    /// Fills `out` with the bytes starting at `offset`.
    fn read(&self, offset: usize, out: &mut [u8]) -> Result<(), StorageError>;
}

// SAFETY: forwards to the boxed implementation, which upholds the contract.
unsafe impl<S: Storage + ?Sized> Storage for Box<S> {
    #[inline]
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    #[inline]
    fn write(&self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        (**self).write(offset, data)
    }

    #[inline]
    fn read(&self, offset: usize, out: &mut [u8]) -> Result<(), StorageError> {
        (**self).read(offset, out)
    }
}

/// Validates `[offset, offset + len)` against `capacity`.
///
/// Shared by both backends so they report identical errors.
#[inline]
pub(crate) fn check_range(offset: usize, len: usize, capacity: usize) -> Result<(), StorageError> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => {
            debug_assert_range_in_capacity!(offset, len, capacity);
            Ok(())
        }
        _ => Err(StorageError::OutOfRange {
            offset,
            len,
            capacity,
        }),
    }
}
