use super::{check_range, Storage, StorageError};
use std::cell::UnsafeCell;
use std::ptr;

/// In-process storage backed by a fixed, zero-initialized heap block.
///
/// Every byte sits in its own `UnsafeCell`, so the producer and consumer of a
/// [`RingBuffer`](crate::RingBuffer) can copy into and out of disjoint ranges
/// through `&self` without ever forming a reference to the whole block.
///
/// `MemoryStorage` is `Send` but deliberately not `Sync`: outside a ring
/// buffer nothing stops two threads from writing the same range.
pub struct MemoryStorage {
    /// Fixed-size block. `Box<[_]>` rather than `Vec<_>`: the size never changes.
    bytes: Box<[UnsafeCell<u8>]>,
}

impl MemoryStorage {
    /// Allocates a zero-filled block of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        let zeroed = vec![0u8; capacity].into_boxed_slice();
        // SAFETY: `UnsafeCell<u8>` is `repr(transparent)` over `u8`, so the
        // slice layout and the allocation are identical.
        let bytes = unsafe { Box::from_raw(Box::into_raw(zeroed) as *mut [UnsafeCell<u8>]) };
        Self { bytes }
    }

    #[inline]
    fn base(&self) -> *mut u8 {
        // `raw_get` keeps provenance over the whole slice, not just one cell.
        UnsafeCell::raw_get(self.bytes.as_ptr())
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("capacity", &self.bytes.len())
            .finish()
    }
}

// SAFETY: writes and reads copy through raw pointers into per-byte
// `UnsafeCell`s; no `&`/`&mut` to the block is created, so a concurrent write
// and read on disjoint ranges touch disjoint memory and cannot race.
unsafe impl Storage for MemoryStorage {
    #[inline]
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn write(&self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        check_range(offset, data.len(), self.capacity())?;
        // SAFETY: `offset + data.len() <= capacity` was checked above, and
        // `data` cannot alias the block since no API hands out references to it.
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), self.base().add(offset), data.len());
        }
        Ok(())
    }

    fn read(&self, offset: usize, out: &mut [u8]) -> Result<(), StorageError> {
        check_range(offset, out.len(), self.capacity())?;
        // SAFETY: bounds checked above; `out` is a distinct caller buffer.
        unsafe {
            ptr::copy_nonoverlapping(self.base().add(offset), out.as_mut_ptr(), out.len());
        }
        Ok(())
    }
}
