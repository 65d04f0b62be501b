//! Fixed-size, little-endian record encoding.
//!
//! A [`RingBuffer`](crate::RingBuffer) stores records as raw bytes in its
//! storage, one record per slot. The byte form is defined by [`Record`] rather
//! than by the in-memory layout of `T`, so a file written on one machine reads
//! back identically on another.

/// A plain, fixed-size value that can live in one ring buffer slot.
///
/// `encode` and `decode` operate on a buffer of exactly [`Record::SIZE`] bytes.
///
/// # Example
///
/// ```
/// use slotring_rs::Record;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Default)]
/// struct Tick {
///     id: u32,
///     price: f32,
/// }
///
/// impl Record for Tick {
///     const SIZE: usize = 8;
///
///     fn encode(&self, buf: &mut [u8]) {
///         self.id.encode(&mut buf[..4]);
///         self.price.encode(&mut buf[4..]);
///     }
///
///     fn decode(buf: &[u8]) -> Self {
///         Self {
///             id: u32::decode(&buf[..4]),
///             price: f32::decode(&buf[4..]),
///         }
///     }
/// }
///
/// let mut bytes = [0u8; Tick::SIZE];
/// Tick { id: 7, price: 1.5 }.encode(&mut bytes);
/// assert_eq!(Tick::decode(&bytes), Tick { id: 7, price: 1.5 });
/// ```
pub trait Record: Sized {
    /// Encoded size in bytes. Also the slot size.
    const SIZE: usize;

    /// Writes `self` into `buf` (`buf.len() == Self::SIZE`).
    fn encode(&self, buf: &mut [u8]);

    /// Reads a value back from `buf` (`buf.len() == Self::SIZE`).
    fn decode(buf: &[u8]) -> Self;
}

macro_rules! impl_record_le {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Record for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn encode(&self, buf: &mut [u8]) {
                    buf.copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn decode(buf: &[u8]) -> Self {
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    bytes.copy_from_slice(buf);
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_record_le!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl Record for bool {
    const SIZE: usize = 1;

    #[inline]
    fn encode(&self, buf: &mut [u8]) {
        buf[0] = u8::from(*self);
    }

    #[inline]
    fn decode(buf: &[u8]) -> Self {
        buf[0] != 0
    }
}

impl<R: Record, const N: usize> Record for [R; N] {
    const SIZE: usize = R::SIZE * N;

    fn encode(&self, buf: &mut [u8]) {
        encode_slice(self, buf);
    }

    fn decode(buf: &[u8]) -> Self {
        std::array::from_fn(|i| R::decode(&buf[i * R::SIZE..(i + 1) * R::SIZE]))
    }
}

impl<A: Record, B: Record> Record for (A, B) {
    const SIZE: usize = A::SIZE + B::SIZE;

    fn encode(&self, buf: &mut [u8]) {
        let (a, b) = buf.split_at_mut(A::SIZE);
        self.0.encode(a);
        self.1.encode(b);
    }

    fn decode(buf: &[u8]) -> Self {
        let (a, b) = buf.split_at(A::SIZE);
        (A::decode(a), B::decode(b))
    }
}

/// Encodes `records` back to back into `out` (`out.len() == records.len() * R::SIZE`).
pub(crate) fn encode_slice<R: Record>(records: &[R], out: &mut [u8]) {
    debug_assert_eq!(out.len(), records.len() * R::SIZE);
    if R::SIZE == 0 {
        return;
    }
    for (record, chunk) in records.iter().zip(out.chunks_exact_mut(R::SIZE)) {
        record.encode(chunk);
    }
}

/// Decodes `out.len()` records from `bytes`.
pub(crate) fn decode_into<R: Record>(bytes: &[u8], out: &mut [R]) {
    debug_assert_eq!(bytes.len(), out.len() * R::SIZE);
    if R::SIZE == 0 {
        return;
    }
    for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(R::SIZE)) {
        *slot = R::decode(chunk);
    }
}
