//! Debug assertion macros for ring buffer invariants.
//!
//! These checks are only active in debug builds (`debug_assert!`), so there is
//! zero overhead in release builds.
//!
//! Used by `RingBuffer<T, S>` and the storage backends.

// =============================================================================
// Bounded count: 0 <= push - pull <= usable capacity
// =============================================================================

/// Assert that the number of published records stays within usable capacity.
///
/// Used in: `push_impl()` before publishing the new push sequence
macro_rules! debug_assert_bounded_count {
    ($count:expr, $usable:expr) => {
        debug_assert!(
            $count <= $usable,
            "bounded count violated: {} records exceed usable capacity {}",
            $count,
            $usable
        )
    };
}

/// Assert that the pull sequence never overtakes the push sequence.
///
/// Used in: `pull_impl()` before publishing the new pull sequence
macro_rules! debug_assert_pull_not_past_push {
    ($new_pull:expr, $push:expr) => {
        debug_assert!(
            $new_pull <= $push,
            "pull sequence {} advanced beyond push sequence {}",
            $new_pull,
            $push
        )
    };
}

// =============================================================================
// Monotonic progress: sequences only grow
// =============================================================================

/// Assert that a sequence number only increases.
///
/// Used in: `push_impl()` for push, `pull_impl()` for pull
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "{} sequence decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

// =============================================================================
// Storage range: ring arithmetic never produces an out-of-range access
// =============================================================================

/// Assert that a byte range fits inside storage.
///
/// Used in: `storage::check_range()` and the ring's segment split
macro_rules! debug_assert_range_in_capacity {
    ($offset:expr, $len:expr, $capacity:expr) => {
        debug_assert!(
            $offset + $len <= $capacity,
            "byte range [{}, {}) exceeds storage capacity {}",
            $offset,
            $offset + $len,
            $capacity
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_pull_not_past_push;
pub(crate) use debug_assert_range_in_capacity;
