use crate::storage::{FileStorage, MemoryStorage, Storage, StorageError};
use std::path::PathBuf;

/// Where a ring buffer keeps its slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Backend {
    /// Heap block owned by the process.
    #[default]
    Memory,
    /// Pre-allocated file at the given path (truncated on open).
    File(PathBuf),
}

/// Configuration for a RingBuffer and its storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Storage size in bytes (default: 64 KiB)
    pub capacity: usize,
    /// Storage medium
    pub backend: Backend,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates an in-memory configuration with custom settings.
    pub const fn new(capacity: usize, enable_metrics: bool) -> Self {
        Self {
            capacity,
            backend: Backend::Memory,
            enable_metrics,
        }
    }

    /// In-memory storage of `capacity` bytes.
    pub const fn memory(capacity: usize) -> Self {
        Self::new(capacity, false)
    }

    /// File-backed storage of `capacity` bytes at `path`.
    pub fn file(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            capacity,
            backend: Backend::File(path.into()),
            enable_metrics: false,
        }
    }

    /// Turns metrics collection on or off.
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Returns how many records of `record_size` bytes fit in the storage.
    #[inline]
    pub const fn slot_capacity(&self, record_size: usize) -> usize {
        match self.capacity.checked_div(record_size) {
            Some(slots) => slots,
            None => 0,
        }
    }

    /// Constructs the configured storage backend.
    pub fn open_storage(&self) -> Result<Box<dyn Storage>, StorageError> {
        Ok(match &self.backend {
            Backend::Memory => Box::new(MemoryStorage::new(self.capacity)),
            Backend::File(path) => Box::new(FileStorage::create(path, self.capacity)?),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(64 * 1024, false)
    }
}

/// Small in-memory configuration (4 KiB, fits in L1 cache)
pub const LOW_LATENCY_CONFIG: Config = Config::new(4 * 1024, false);

/// Large in-memory configuration (8 MiB)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(8 * 1024 * 1024, false);
