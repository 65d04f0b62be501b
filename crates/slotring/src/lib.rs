//! slotring - Lock-Free SPSC Ring Buffer over Pluggable Storage
//!
//! A fixed-capacity circular buffer of fixed-size records. One producer and one
//! consumer exchange records across threads using only two atomic sequence
//! counters; the record bytes live in a [`Storage`] backend that may be an
//! in-process block ([`MemoryStorage`]) or a pre-allocated file
//! ([`FileStorage`]).
//!
//! # Key Features
//!
//! - Whole-batch push/pull: a batch is transferred completely or not at all
//! - Non-blocking: full and empty are ordinary `Ok(false)` outcomes
//! - Acquire/release handshake on unbounded u64 sequences (no lap ambiguity)
//! - Explicit little-endian [`Record`] encoding, so files are portable
//! - Single producer / single consumer enforced at compile time by [`RingBuffer::split`]
//!
//! # Example
//!
//! ```
//! use slotring_rs::{Config, RingBuffer};
//!
//! let config = Config::memory(1024);
//! let mut ring = RingBuffer::<(i32, i32), _>::from_config(&config).unwrap();
//! assert_eq!(ring.slot_capacity(), 128);
//!
//! let (mut producer, mut consumer) = ring.split();
//!
//! std::thread::scope(|s| {
//!     s.spawn(move || {
//!         for i in 0..1000 {
//!             while !producer.push(&[(i, i * 2)]).unwrap() {
//!                 std::thread::yield_now();
//!             }
//!         }
//!     });
//!
//!     let mut out = [(0, 0); 1];
//!     for i in 0..1000 {
//!         while !consumer.pull(&mut out).unwrap() {
//!             std::thread::yield_now();
//!         }
//!         assert_eq!(out[0], (i, i * 2));
//!     }
//! });
//! ```

mod config;
mod invariants;
mod metrics;
mod record;
mod ring;
pub mod storage;

pub use config::{Backend, Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use metrics::MetricsSnapshot;
pub use record::Record;
pub use ring::{Consumer, Producer, RingBuffer};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
