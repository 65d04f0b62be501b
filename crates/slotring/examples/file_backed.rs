//! Streams ticks from a producer thread to the main thread through a
//! file-backed ring buffer, then prints the metrics.
//!
//! Run with: `RUST_LOG=debug cargo run --example file_backed`

use anyhow::{bail, Context, Result};
use slotring_rs::{Config, Record, RingBuffer};
use std::thread;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Tick {
    seq: u64,
    price: f64,
}

impl Record for Tick {
    const SIZE: usize = 16;

    fn encode(&self, buf: &mut [u8]) {
        self.seq.encode(&mut buf[..8]);
        self.price.encode(&mut buf[8..]);
    }

    fn decode(buf: &[u8]) -> Self {
        Self {
            seq: u64::decode(&buf[..8]),
            price: f64::decode(&buf[8..]),
        }
    }
}

const TICKS: u64 = 200_000;
const BATCH: usize = 32;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let dir = tempfile::tempdir().context("creating scratch directory")?;
    let path = dir.path().join("ticks.ring");
    let config = Config::file(&path, 4096 * Tick::SIZE).with_metrics(true);

    let mut ring = RingBuffer::<Tick, _>::from_config(&config)
        .with_context(|| format!("opening ring buffer at {}", path.display()))?;
    info!(slots = ring.slot_capacity(), path = %path.display(), "ring buffer ready");

    let start = Instant::now();
    let (mut producer, mut consumer) = ring.split();

    let received = thread::scope(|s| -> Result<u64> {
        let producer_thread = s.spawn(move || -> Result<()> {
            let mut batch = [Tick::default(); BATCH];
            let mut seq = 0;
            while seq < TICKS {
                for tick in &mut batch {
                    *tick = Tick {
                        seq,
                        price: 100.0 + (seq % 50) as f64 * 0.25,
                    };
                    seq += 1;
                }
                while !producer.push(&batch)? {
                    thread::yield_now();
                }
            }
            Ok(())
        });

        let mut out = [Tick::default(); BATCH];
        let mut expected = 0;
        while expected < TICKS {
            if !consumer.pull(&mut out)? {
                if producer_thread.is_finished() && consumer.available() < BATCH {
                    break;
                }
                thread::yield_now();
                continue;
            }
            for tick in &out {
                if tick.seq != expected {
                    bail!("out of order: expected {}, got {}", expected, tick.seq);
                }
                expected += 1;
            }
        }

        match producer_thread.join() {
            Ok(result) => result?,
            Err(_) => bail!("producer thread panicked"),
        }
        Ok(expected)
    })?;

    let elapsed = start.elapsed();
    let metrics = ring.metrics();
    info!(
        received,
        elapsed_ms = elapsed.as_millis() as u64,
        full_rejections = metrics.full_rejections,
        empty_rejections = metrics.empty_rejections,
        "transfer complete"
    );
    println!(
        "{} ticks in {:?} ({:.2} M/s)",
        received,
        elapsed,
        received as f64 / elapsed.as_secs_f64() / 1e6
    );
    Ok(())
}
