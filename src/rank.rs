//! Order/degree type shared by every tree node, plus the numeric bounds the
//! engines rely on.
//!
//! A binomial tree of order `k` holds `2^k` nodes and a Fibonacci tree of
//! degree `k` holds at least `F(k+2)` nodes, so the order of any tree that
//! fits in memory is far below 255. `u8` is enough and keeps nodes small.

/// Tree order (binomial, skew-binomial) or child count (Fibonacci).
pub type Rank = u8;

/// Increment a rank, panicking on overflow.
///
/// Overflow would need a tree with more than `2^255` nodes, so reaching it
/// means a link was applied to trees of mismatched order.
///
/// ```rust
/// use mergeable_heaps::rank::checked_increment;
///
/// assert_eq!(checked_increment(3), 4);
/// ```
#[inline]
pub fn checked_increment(rank: Rank) -> Rank {
    rank.checked_add(1).expect("rank overflow: linked trees of mismatched order")
}

/// Decrement a rank, stopping at zero.
///
/// ```rust
/// use mergeable_heaps::rank::saturating_decrement;
///
/// assert_eq!(saturating_decrement(1), 0);
/// assert_eq!(saturating_decrement(0), 0);
/// ```
#[inline]
pub fn saturating_decrement(rank: Rank) -> Rank {
    rank.saturating_sub(1)
}

/// Minimum number of nodes in a Fibonacci-heap subtree whose root has
/// `degree` children: `F(degree + 2)` with `F(1) = F(2) = 1`.
///
/// Saturates at `usize::MAX`.
pub fn fibonacci_size_bound(degree: Rank) -> usize {
    // F(2) = 1, F(3) = 2; walk forward `degree` steps.
    let (mut lo, mut hi): (usize, usize) = (1, 2);
    if degree == 0 {
        return lo;
    }
    for _ in 1..degree {
        let next = lo.saturating_add(hi);
        lo = hi;
        hi = next;
    }
    hi
}

/// Capacity hint for a degree-indexed table covering a heap of `len` nodes.
///
/// The maximum Fibonacci-heap degree is `log_phi(n) ~= 1.44 * log2(n)`.
#[inline]
pub fn degree_table_hint(len: usize) -> usize {
    let log2 = len.max(1).ilog2() as usize;
    log2 + log2 / 2 + 2
}
