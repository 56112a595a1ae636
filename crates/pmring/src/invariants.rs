//! Debug assertion macros for ring buffer index invariants.
//!
//! Active only in debug builds (`debug_assert!`), so the release hot path
//! carries no overhead. Every head/tail update in `Ring<T>` goes through one
//! of these.

/// Assert that the item count never exceeds the occupancy bound (one less
/// than the slot count; the sacrificed slot).
///
/// Holds as `0 ≤ (tail - head) ≤ bound` after every publish.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $bound:expr) => {
        debug_assert!(
            $count <= $bound,
            "ring count {} exceeds occupancy bound {}",
            $count,
            $bound
        )
    };
}

/// Assert that head does not advance past tail.
macro_rules! debug_assert_head_not_past_tail {
    ($new_head:expr, $tail:expr) => {
        debug_assert!(
            $new_head <= $tail,
            "ring head {} advanced beyond tail {}",
            $new_head,
            $tail
        )
    };
}

/// Assert that a sequence index only increases.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "ring {} decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

/// Assert that a slot read lands inside the initialized range `[head, tail)`.
macro_rules! debug_assert_initialized_read {
    ($pos:expr, $head:expr, $tail:expr) => {
        debug_assert!(
            $pos >= $head && $pos < $tail,
            "reading slot at seq {} outside initialized range [{}, {})",
            $pos,
            $head,
            $tail
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_head_not_past_tail;
pub(crate) use debug_assert_initialized_read;
pub(crate) use debug_assert_monotonic;
