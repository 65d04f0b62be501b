use crate::invariants::{
    debug_assert_bounded_count, debug_assert_monotonic, debug_assert_pull_not_past_push,
    debug_assert_range_in_capacity,
};
use crate::record::{decode_into, encode_slice};
use crate::storage::{Storage, StorageError};
use crate::metrics::Metrics;
use crate::{Config, MetricsSnapshot, Record};
use crossbeam_utils::{Backoff, CachePadded};
use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// ## Sequence Numbers
//
// `push` and `pull` are unbounded u64 sequence numbers, not wrapped slot
// indices. The slot of sequence `s` is `s % slot_capacity`, computed only when
// deriving a storage offset. `push - pull` is therefore always the exact number
// of published, unconsumed records, whatever lap either side is on.
//
// One slot is kept free: at most `slot_capacity - 1` records are held at once.
//
// ## Memory Ordering Protocol
//
// **Producer (push):**
// 1. Load `push` with Relaxed (only the producer writes it)
// 2. Check room against the producer's cached `pull`
// 3. If the cache says no room: load `pull` with Acquire and re-check
// 4. Write record bytes to storage (no ordering needed - protected by protocol)
// 5. Store `push` with Release (publishes the bytes to the consumer)
//
// **Consumer (pull):**
// 1. Load `pull` with Relaxed (only the consumer writes it)
// 2. Check availability against the consumer's cached `push`
// 3. If the cache says not enough: load `push` with Acquire and re-check
// 4. Read record bytes from storage (no ordering needed - protected by protocol)
// 5. Store `pull` with Release (hands the slots back to the producer)
//
// ## Single-Writer State
//
// `producer` and `consumer` below are accessed through UnsafeCell without
// atomics. Each has exactly one user: the one `Producer` or the one `Consumer`
// handed out by `split(&mut self)`, whose methods take `&mut self`.
//
// Storage bytes in `[pull, push)` belong to the consumer, the rest to the
// producer; the two never touch the same byte concurrently.
//
// =============================================================================

/// Producer-private state.
struct ProducerSide {
    /// Last observed `pull`; may lag, never leads.
    cached_pull: u64,
    /// Encoding buffer, grown on demand and reused.
    scratch: Vec<u8>,
}

/// Consumer-private state.
struct ConsumerSide {
    /// Last observed `push`; may lag, never leads.
    cached_push: u64,
    /// Decoding buffer, grown on demand and reused.
    scratch: Vec<u8>,
}

/// Fixed-capacity SPSC ring buffer of `T` records over a byte storage `S`.
///
/// The ring buffer owns its storage and splits it into
/// `storage.capacity() / T::SIZE` slots. Records are moved in and out through
/// the [`Producer`] and [`Consumer`] returned by [`split`](Self::split).
///
/// # Example
///
/// ```
/// use slotring_rs::{MemoryStorage, RingBuffer};
///
/// let mut ring = RingBuffer::<u64, _>::new(MemoryStorage::new(64));
/// let (mut producer, mut consumer) = ring.split();
///
/// assert!(producer.push(&[1, 2, 3]).unwrap());
///
/// let mut out = [0u64; 3];
/// assert!(consumer.pull(&mut out).unwrap());
/// assert_eq!(out, [1, 2, 3]);
///
/// // Nothing left: the pull is rejected and `out` is untouched.
/// assert!(!consumer.pull(&mut out[..1]).unwrap());
/// ```
pub struct RingBuffer<T, S> {
    // === PRODUCER HOT ===
    /// Push sequence (written by producer, read by consumer)
    push: CachePadded<AtomicU64>,
    producer: CachePadded<UnsafeCell<ProducerSide>>,

    // === CONSUMER HOT ===
    /// Pull sequence (written by consumer, read by producer)
    pull: CachePadded<AtomicU64>,
    consumer: CachePadded<UnsafeCell<ConsumerSide>>,

    // === COLD STATE ===
    slot_capacity: usize,
    enable_metrics: bool,
    metrics: Metrics,
    storage: S,

    // Records cross as bytes; no `T` is ever stored.
    _record: PhantomData<fn(T) -> T>,
}

// Safety: the UnsafeCell state is only touched through the unique Producer or
// Consumer (see `split`), and `S: Storage` guarantees that one concurrent
// writer and one concurrent reader on disjoint ranges is sound.
unsafe impl<T, S: Storage> Sync for RingBuffer<T, S> {}

impl<T: Record, S: Storage> RingBuffer<T, S> {
    /// Creates a ring buffer that owns `storage`, with metrics disabled.
    pub fn new(storage: S) -> Self {
        Self::build(storage, false)
    }

    /// Creates a ring buffer over `storage`, taking the metrics flag from `config`.
    ///
    /// The storage is used as given; `config.capacity` and `config.backend` only
    /// matter to [`Config::open_storage`].
    pub fn with_config(storage: S, config: &Config) -> Self {
        Self::build(storage, config.enable_metrics)
    }

    fn build(storage: S, enable_metrics: bool) -> Self {
        let slot_capacity = storage.capacity().checked_div(T::SIZE).unwrap_or(0);

        debug!(
            storage_capacity = storage.capacity(),
            record_size = T::SIZE,
            slot_capacity,
            "ring buffer created"
        );

        Self {
            push: CachePadded::new(AtomicU64::new(0)),
            producer: CachePadded::new(UnsafeCell::new(ProducerSide {
                cached_pull: 0,
                scratch: Vec::new(),
            })),
            pull: CachePadded::new(AtomicU64::new(0)),
            consumer: CachePadded::new(UnsafeCell::new(ConsumerSide {
                cached_push: 0,
                scratch: Vec::new(),
            })),
            slot_capacity,
            enable_metrics,
            metrics: Metrics::new(),
            storage,
            _record: PhantomData,
        }
    }

    /// Returns the unique producer and consumer for this ring buffer.
    ///
    /// Both borrow the ring buffer mutably, so no second pair can exist while
    /// they are alive. Dropping them leaves the contents and positions intact;
    /// a later `split` continues where they left off.
    pub fn split(&mut self) -> (Producer<'_, T, S>, Consumer<'_, T, S>) {
        let ring: &Self = self;
        (Producer { ring }, Consumer { ring })
    }

    // ---------------------------------------------------------------------
    // CAPACITY & STATUS
    // ---------------------------------------------------------------------

    /// Number of record slots in the storage.
    #[inline]
    pub fn slot_capacity(&self) -> usize {
        self.slot_capacity
    }

    /// Maximum records held at once (`slot_capacity - 1`).
    #[inline]
    pub fn usable_capacity(&self) -> usize {
        self.slot_capacity.saturating_sub(1)
    }

    /// Byte capacity of the underlying storage.
    #[inline]
    pub fn storage_capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Returns the current number of published, unconsumed records.
    #[inline]
    pub fn len(&self) -> usize {
        let push = self.push.load(Ordering::Acquire);
        let pull = self.pull.load(Ordering::Acquire);
        push.saturating_sub(pull) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.usable_capacity()
    }

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    /// Consumes the ring buffer and returns its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    // ---------------------------------------------------------------------
    // STORAGE ADDRESSING
    // ---------------------------------------------------------------------

    /// Returns the storage offset of sequence `seq` and how many of `byte_len`
    /// bytes fit before the end of the slot region; the rest wraps to offset 0.
    #[inline]
    fn segments(&self, seq: u64, byte_len: usize) -> (usize, usize) {
        let region = self.slot_capacity * T::SIZE;
        let offset = (seq % self.slot_capacity as u64) as usize * T::SIZE;
        let first = byte_len.min(region - offset);
        debug_assert_range_in_capacity!(offset, first, region);
        (offset, first)
    }

    fn write_slots(&self, seq: u64, bytes: &[u8]) -> Result<(), StorageError> {
        let (offset, first) = self.segments(seq, bytes.len());
        self.storage.write(offset, &bytes[..first])?;
        if first < bytes.len() {
            self.storage.write(0, &bytes[first..])?;
        }
        Ok(())
    }

    fn read_slots(&self, seq: u64, bytes: &mut [u8]) -> Result<(), StorageError> {
        let (offset, first) = self.segments(seq, bytes.len());
        let (head, tail) = bytes.split_at_mut(first);
        self.storage.read(offset, head)?;
        if !tail.is_empty() {
            self.storage.read(0, tail)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // PRODUCER PATH
    // ---------------------------------------------------------------------

    /// Appends all of `records` or none of them.
    ///
    /// # Safety
    ///
    /// Only the unique `Producer` may call this, through `&mut self`.
    unsafe fn push_impl(&self, records: &[T]) -> Result<bool, StorageError> {
        let n = records.len();
        if n == 0 {
            return Ok(true);
        }

        // SAFETY: caller is the unique producer; nothing else touches this cell.
        let side = &mut *self.producer.get();

        let usable = self.usable_capacity() as u64;
        let push = self.push.load(Ordering::Relaxed);
        let next_push = push.wrapping_add(n as u64);

        // Fast path: cached pull. Slow path refreshes it only when needed.
        if next_push.wrapping_sub(side.cached_pull) > usable {
            side.cached_pull = self.pull.load(Ordering::Acquire);
            if next_push.wrapping_sub(side.cached_pull) > usable {
                if self.enable_metrics {
                    self.metrics.record_full();
                }
                trace!(requested = n, usable, "push rejected: ring full");
                return Ok(false);
            }
        }

        let byte_len = n * T::SIZE;
        if side.scratch.len() < byte_len {
            side.scratch.resize(byte_len, 0);
        }
        let bytes = &mut side.scratch[..byte_len];
        encode_slice(records, bytes);

        if let Err(err) = self.write_slots(push, bytes) {
            warn!(error = %err, push, records = n, "push aborted by storage error");
            return Err(err);
        }

        debug_assert_bounded_count!(next_push.wrapping_sub(side.cached_pull), usable);
        debug_assert_monotonic!("push", push, next_push);

        self.push.store(next_push, Ordering::Release);

        if self.enable_metrics {
            self.metrics.record_push(n as u64);
        }
        Ok(true)
    }

    /// Room for this many more records, as seen by the producer.
    fn free_slots(&self) -> usize {
        let push = self.push.load(Ordering::Relaxed);
        let pull = self.pull.load(Ordering::Acquire);
        self.usable_capacity().saturating_sub(push.wrapping_sub(pull) as usize)
    }

    // ---------------------------------------------------------------------
    // CONSUMER PATH
    // ---------------------------------------------------------------------

    /// Reads exactly `n` records as bytes and hands them to `sink`, or
    /// rejects without calling it.
    ///
    /// # Safety
    ///
    /// Only the unique `Consumer` may call this, through `&mut self`.
    unsafe fn pull_impl<F>(&self, n: usize, sink: F) -> Result<bool, StorageError>
    where
        F: FnOnce(&[u8]),
    {
        if n == 0 {
            return Ok(true);
        }

        // SAFETY: caller is the unique consumer; nothing else touches this cell.
        let side = &mut *self.consumer.get();

        let pull = self.pull.load(Ordering::Relaxed);
        let next_pull = pull.wrapping_add(n as u64);

        if next_pull > side.cached_push {
            side.cached_push = self.push.load(Ordering::Acquire);
            if next_pull > side.cached_push {
                if self.enable_metrics {
                    self.metrics.record_empty();
                }
                trace!(
                    requested = n,
                    available = side.cached_push - pull,
                    "pull rejected: not enough records"
                );
                return Ok(false);
            }
        }

        let byte_len = n * T::SIZE;
        if side.scratch.len() < byte_len {
            side.scratch.resize(byte_len, 0);
        }
        let bytes = &mut side.scratch[..byte_len];

        if let Err(err) = self.read_slots(pull, bytes) {
            warn!(error = %err, pull, records = n, "pull aborted by storage error");
            return Err(err);
        }
        sink(bytes);

        debug_assert_pull_not_past_push!(next_pull, side.cached_push);
        debug_assert_monotonic!("pull", pull, next_pull);

        self.pull.store(next_pull, Ordering::Release);

        if self.enable_metrics {
            self.metrics.record_pull(n as u64);
        }
        Ok(true)
    }

    /// Records ready to pull, as seen by the consumer.
    fn available(&self) -> usize {
        let pull = self.pull.load(Ordering::Relaxed);
        let push = self.push.load(Ordering::Acquire);
        push.wrapping_sub(pull) as usize
    }
}

impl<T: Record> RingBuffer<T, Box<dyn Storage>> {
    /// Opens the storage described by `config` and builds a ring buffer over it.
    pub fn from_config(config: &Config) -> Result<Self, StorageError> {
        let storage = config.open_storage()?;
        Ok(Self::with_config(storage, config))
    }
}

impl<T, S: Storage> fmt::Debug for RingBuffer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("slot_capacity", &self.slot_capacity)
            .field("push", &self.push.load(Ordering::Relaxed))
            .field("pull", &self.pull.load(Ordering::Relaxed))
            .field("storage_capacity", &self.storage.capacity())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------
// HANDLES
// ---------------------------------------------------------------------

/// Write half of a [`RingBuffer`]. Obtained from [`RingBuffer::split`].
pub struct Producer<'a, T, S> {
    ring: &'a RingBuffer<T, S>,
}

impl<T: Record, S: Storage> Producer<'_, T, S> {
    /// Appends every record in `records`, in order, or nothing.
    ///
    /// Returns `Ok(false)` when the ring lacks room for the whole batch
    /// (including when `records.len()` exceeds the usable capacity). An empty
    /// batch is accepted as a no-op. A storage error leaves the batch
    /// unpublished.
    #[inline]
    pub fn push(&mut self, records: &[T]) -> Result<bool, StorageError> {
        // SAFETY: `self` is the unique producer and is borrowed mutably.
        unsafe { self.ring.push_impl(records) }
    }

    /// Appends a single record.
    #[inline]
    pub fn push_one(&mut self, record: T) -> Result<bool, StorageError> {
        self.push(std::slice::from_ref(&record))
    }

    /// Push with adaptive backoff. Spins, yields, then gives up with `Ok(false)`.
    pub fn push_with_backoff(&mut self, records: &[T]) -> Result<bool, StorageError> {
        let backoff = Backoff::new();
        loop {
            if self.push(records)? {
                return Ok(true);
            }
            if backoff.is_completed() {
                return Ok(false);
            }
            backoff.snooze();
        }
    }

    /// How many records could be pushed right now.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.ring.free_slots()
    }

    /// The ring buffer this producer writes to.
    #[inline]
    pub fn ring(&self) -> &RingBuffer<T, S> {
        self.ring
    }
}

/// Read half of a [`RingBuffer`]. Obtained from [`RingBuffer::split`].
pub struct Consumer<'a, T, S> {
    ring: &'a RingBuffer<T, S>,
}

impl<T: Record, S: Storage> Consumer<'_, T, S> {
    /// Fills `out` with the next `out.len()` records, or leaves it untouched.
    ///
    /// Returns `Ok(false)` when fewer than `out.len()` records are published.
    /// An empty `out` is accepted as a no-op.
    #[inline]
    pub fn pull(&mut self, out: &mut [T]) -> Result<bool, StorageError> {
        let n = out.len();
        // SAFETY: `self` is the unique consumer and is borrowed mutably.
        unsafe { self.ring.pull_impl(n, |bytes| decode_into(bytes, out)) }
    }

    /// Takes the next record, if one is published.
    pub fn pull_one(&mut self) -> Result<Option<T>, StorageError> {
        let mut record = None;
        // SAFETY: `self` is the unique consumer and is borrowed mutably.
        unsafe {
            self.ring
                .pull_impl(1, |bytes| record = Some(T::decode(bytes)))?;
        }
        Ok(record)
    }

    /// Pull with adaptive backoff. Spins, yields, then gives up with `Ok(false)`.
    pub fn pull_with_backoff(&mut self, out: &mut [T]) -> Result<bool, StorageError> {
        let backoff = Backoff::new();
        loop {
            if self.pull(out)? {
                return Ok(true);
            }
            if backoff.is_completed() {
                return Ok(false);
            }
            backoff.snooze();
        }
    }

    /// How many records are ready to pull right now.
    #[inline]
    pub fn available(&self) -> usize {
        self.ring.available()
    }

    /// The ring buffer this consumer reads from.
    #[inline]
    pub fn ring(&self) -> &RingBuffer<T, S> {
        self.ring
    }
}
