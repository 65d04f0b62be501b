use slotring_rs::{Config, FileStorage, MemoryStorage, Record, RingBuffer, Storage};
use std::thread;

const MAX_SIZE: usize = 8 * 1024 * 1024;
const DEFAULT_INDEX: i32 = 12;
const DEFAULT_VALUE: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Data {
    index: i32,
    value: i32,
}

impl Record for Data {
    const SIZE: usize = 8;

    fn encode(&self, buf: &mut [u8]) {
        self.index.encode(&mut buf[..4]);
        self.value.encode(&mut buf[4..]);
    }

    fn decode(buf: &[u8]) -> Self {
        Self {
            index: i32::decode(&buf[..4]),
            value: i32::decode(&buf[4..]),
        }
    }
}

fn default_data() -> Data {
    Data {
        index: DEFAULT_INDEX,
        value: DEFAULT_VALUE,
    }
}

fn write_and_read_integers<S: Storage>(storage: &S) {
    let data: Vec<i64> = (100..105).collect();
    let mut bytes = Vec::with_capacity(40);
    for value in &data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    storage.write(0, &bytes).unwrap();

    for (i, expected) in data.iter().enumerate() {
        let mut slot = [0u8; 8];
        storage.read(i * 8, &mut slot).unwrap();
        assert_eq!(i64::from_le_bytes(slot), *expected, "slot {}", i);
    }
}

#[test]
fn test_write_and_read_from_memory_storage() {
    write_and_read_integers(&MemoryStorage::new(40));
}

#[test]
fn test_write_and_read_from_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    write_and_read_integers(&FileStorage::create(dir.path().join("test.buf"), 40).unwrap());
}

#[test]
fn test_single_threaded_push_and_pull() {
    let mut ring = RingBuffer::<Data, _>::new(MemoryStorage::new(MAX_SIZE));
    assert_eq!(ring.slot_capacity(), 1_048_576);

    let (mut producer, mut consumer) = ring.split();
    let data = [default_data(); 5];

    assert!(producer.push(&data).unwrap());

    let mut out = [Data::default(); 5];
    assert!(consumer.pull(&mut out).unwrap());
    for (read, written) in out.iter().zip(&data) {
        assert_eq!(read.index, written.index);
        assert_eq!(read.value, written.value);
    }

    // Nothing left to pull until the producer pushes again.
    assert!(!consumer.pull(&mut out).unwrap());
    assert_eq!(consumer.pull_one().unwrap(), None);
}

fn run_concurrent<S: Storage>(mut ring: RingBuffer<Data, S>, data: &[Data]) -> Vec<Data> {
    let (mut producer, mut consumer) = ring.split();
    let expected = data.len();

    thread::scope(|s| {
        s.spawn(move || {
            for batch in data.chunks(8) {
                while !producer.push(batch).unwrap() {
                    thread::yield_now();
                }
            }
        });

        let handle = s.spawn(move || {
            let mut read = Vec::with_capacity(expected);
            let mut buf = [Data::default(); 4];
            while read.len() < expected {
                if consumer.pull(&mut buf).unwrap() {
                    read.extend_from_slice(&buf);
                } else {
                    thread::yield_now();
                }
            }
            read
        });

        handle.join().unwrap()
    })
}

#[test]
fn test_multi_threaded_push_and_pull() {
    let data = vec![default_data(); 1024];
    let ring = RingBuffer::<Data, _>::new(MemoryStorage::new(MAX_SIZE));

    let read = run_concurrent(ring, &data);
    assert_eq!(read, data);
}

#[test]
fn test_multi_threaded_preserves_order_across_laps() {
    // 33 slots: batches of 8 and 4 straddle the storage end on most laps.
    let data: Vec<Data> = (0..20_000)
        .map(|i| Data {
            index: i,
            value: i.wrapping_mul(31),
        })
        .collect();
    let ring = RingBuffer::<Data, _>::new(MemoryStorage::new(33 * Data::SIZE));

    let read = run_concurrent(ring, &data);
    assert_eq!(read.len(), data.len());
    for (i, (got, want)) in read.iter().zip(&data).enumerate() {
        assert_eq!(got, want, "FIFO violation at {}", i);
    }
}

#[test]
fn test_multi_threaded_over_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::create(dir.path().join("concurrent.buf"), 64 * Data::SIZE).unwrap();
    let data: Vec<Data> = (0..1024).map(|i| Data { index: i, value: -i }).collect();

    let read = run_concurrent(RingBuffer::new(storage), &data);
    assert_eq!(read, data);
}

#[test]
fn test_file_and_memory_storage_are_equivalent() {
    let dir = tempfile::tempdir().unwrap();
    let mut on_disk =
        RingBuffer::<Data, _>::new(FileStorage::create(dir.path().join("parity.buf"), 10 * Data::SIZE).unwrap());
    let mut in_memory = RingBuffer::<Data, _>::new(MemoryStorage::new(10 * Data::SIZE));

    let (mut p_file, mut c_file) = on_disk.split();
    let (mut p_mem, mut c_mem) = in_memory.split();

    let mut next = 0;
    for round in 0..40usize {
        let push_len = round % 5 + 1;
        let batch: Vec<Data> = (0..push_len)
            .map(|_| {
                next += 1;
                Data { index: next, value: next * 7 }
            })
            .collect();
        assert_eq!(p_file.push(&batch).unwrap(), p_mem.push(&batch).unwrap());

        let mut out_file = vec![Data::default(); round % 4 + 1];
        let mut out_mem = out_file.clone();
        assert_eq!(c_file.pull(&mut out_file).unwrap(), c_mem.pull(&mut out_mem).unwrap());
        assert_eq!(out_file, out_mem, "round {}", round);
    }

    assert_eq!(on_disk.len(), in_memory.len());
}

#[test]
fn test_file_layout_is_flat_slot_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.buf");
    let config = Config::file(&path, 4 * Data::SIZE);

    let mut ring = RingBuffer::<Data, _>::from_config(&config).unwrap();
    let (mut producer, _) = ring.split();
    assert!(producer.push(&[Data { index: 1, value: 2 }, Data { index: 3, value: 4 }]).unwrap());
    drop(ring);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 32);
    assert_eq!(&bytes[..8], &[1, 0, 0, 0, 2, 0, 0, 0]);
    assert_eq!(&bytes[8..16], &[3, 0, 0, 0, 4, 0, 0, 0]);
    assert!(bytes[16..].iter().all(|&b| b == 0));
}

#[test]
fn test_from_config_failure_produces_no_ring() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::file(dir.path().join("no").join("such").join("dir.buf"), 64);

    let result = RingBuffer::<u64, _>::from_config(&config);
    assert!(result.is_err());
}

#[test]
fn test_full_detection_until_pull() {
    let mut ring = RingBuffer::<u32, _>::new(MemoryStorage::new(16 * 4));
    let (mut producer, mut consumer) = ring.split();

    let mut pushed = 0u32;
    while producer.push_one(pushed).unwrap() {
        pushed += 1;
    }
    assert_eq!(pushed, 15);

    for _ in 0..10 {
        assert!(!producer.push_one(99).unwrap());
    }

    assert_eq!(consumer.pull_one().unwrap(), Some(0));
    assert!(producer.push_one(pushed).unwrap());

    let mut out = vec![0u32; 15];
    assert!(consumer.pull(&mut out).unwrap());
    assert_eq!(out, (1..=15).collect::<Vec<_>>());
}
