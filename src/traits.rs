//! Common traits for mergeable heap engines
//!
//! This module provides a two-tier trait hierarchy:
//!
//! - [`Heap`]: insert, find/extract the minimum, union, containment and the
//!   draining [`Sorted`] iterator. Every engine implements it.
//! - [`DecreaseKeyHeap`]: adds `decrease_key`. Only engines that keep parent
//!   links implement it, so calling `decrease_key` on a forest engine is a
//!   compile error rather than a runtime failure.
//!
//! Heaps store `(key, value)` pairs and are min-heaps over `K`.

use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use thiserror::Error;

/// Error type for heap operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum HeapError {
    /// `find_min` or `extract_min` on a heap with no elements
    #[error("heap is empty")]
    EmptyHeap,
    /// The handle refers to a removed node or to another heap instance
    #[error("handle does not refer to a node in this heap")]
    InvalidHandle,
    /// `decrease_key` was asked to make a key larger
    #[error("new key is greater than the current key")]
    KeyIncreaseRejected,
}

/// A handle to an element in the heap, returned by [`Heap::insert`].
///
/// Handles are plain values: copying one does not keep the element alive,
/// and a handle whose element has been extracted is simply stale.
pub trait Handle: Copy + Eq + Hash + fmt::Debug {}

/// Base trait for mergeable min-heaps
///
/// # Example
///
/// ```rust
/// use mergeable_heaps::Heap;
/// use mergeable_heaps::binomial::BinomialHeap;
///
/// let mut heap = BinomialHeap::new();
/// heap.insert(3, "three");
/// heap.insert(1, "one");
/// heap.insert(2, "two");
///
/// assert_eq!(heap.find_min(), Ok((&1, &"one")));
/// assert_eq!(heap.extract_min(), Ok((1, "one")));
/// assert_eq!(heap.len(), 2);
/// ```
pub trait Heap<K: Ord, V>: Sized {
    /// Opaque identifier of an inserted element
    type Handle: Handle;

    /// Creates a new empty heap
    fn new() -> Self;

    /// Creates a new empty heap with room for `capacity` nodes
    fn with_capacity(capacity: usize) -> Self;

    /// Returns the number of elements in the heap
    fn len(&self) -> usize;

    /// Returns true if the heap is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts a key-value pair, returning a handle to the new element
    ///
    /// # Time Complexity
    /// - Fibonacci: O(1)
    /// - Skew binomial: O(1)
    /// - Binomial: O(log n) worst case, O(1) amortized
    fn insert(&mut self, key: K, value: V) -> Self::Handle;

    /// Returns the minimum key and its value
    ///
    /// # Errors
    /// [`HeapError::EmptyHeap`] if the heap has no elements.
    ///
    /// # Time Complexity
    /// O(1) for all engines; each caches its minimum root.
    fn find_min(&self) -> Result<(&K, &V), HeapError>;

    /// Removes and returns the minimum key and its value
    ///
    /// # Errors
    /// [`HeapError::EmptyHeap`] if the heap has no elements.
    ///
    /// # Time Complexity
    /// O(log n), amortized for the Fibonacci heap.
    fn extract_min(&mut self) -> Result<(K, V), HeapError>;

    /// Returns true if some element has a key equal to `key`
    ///
    /// # Time Complexity
    /// O(n)
    fn contains(&self, key: &K) -> bool;

    /// Moves every element of `other` into this heap
    ///
    /// Handles previously returned by `other` are invalidated unless this
    /// heap was empty, in which case `other` is adopted as-is.
    fn merge(&mut self, other: Self);

    /// Like [`find_min`](Heap::find_min) but returns `None` on an empty heap
    fn peek(&self) -> Option<(&K, &V)> {
        self.find_min().ok()
    }

    /// Like [`extract_min`](Heap::extract_min) but returns `None` on an empty heap
    fn pop(&mut self) -> Option<(K, V)> {
        self.extract_min().ok()
    }

    /// Consumes the heap, yielding its elements in ascending key order
    ///
    /// ```rust
    /// use mergeable_heaps::Heap;
    /// use mergeable_heaps::fibonacci::FibonacciHeap;
    ///
    /// let heap: FibonacciHeap<i32, ()> = [5, 3, 8, 1].into_iter().map(|k| (k, ())).collect();
    /// let keys: Vec<i32> = heap.sorted().map(|(k, _)| k).collect();
    /// assert_eq!(keys, vec![1, 3, 5, 8]);
    /// ```
    fn sorted(self) -> Sorted<Self, K, V> {
        Sorted {
            heap: self,
            _marker: PhantomData,
        }
    }
}

/// Extended heap trait with `decrease_key` support
///
/// # Example
///
/// ```rust
/// use mergeable_heaps::{DecreaseKeyHeap, Heap};
/// use mergeable_heaps::fibonacci::FibonacciHeap;
///
/// let mut heap = FibonacciHeap::new();
/// let handle = heap.insert(10, "item");
/// heap.insert(7, "other");
/// heap.decrease_key(&handle, 5).unwrap();
/// assert_eq!(heap.find_min(), Ok((&5, &"item")));
/// ```
pub trait DecreaseKeyHeap<K: Ord, V>: Heap<K, V> {
    /// Lowers the key of the element identified by `handle` to `new_key`
    ///
    /// A `new_key` equal to the current key is accepted and changes nothing
    /// structurally.
    ///
    /// # Errors
    /// - [`HeapError::InvalidHandle`] if the element was extracted or the
    ///   handle belongs to another heap.
    /// - [`HeapError::KeyIncreaseRejected`] if `new_key` is greater than the
    ///   current key.
    ///
    /// On error the heap is unchanged.
    ///
    /// # Time Complexity
    /// O(1) amortized for the Fibonacci heap.
    fn decrease_key(&mut self, handle: &Self::Handle, new_key: K) -> Result<(), HeapError>;
}

/// Draining iterator returned by [`Heap::sorted`]
///
/// Single-pass: it owns the heap and extracts one minimum per step. Once the
/// heap is exhausted it keeps returning `None`.
pub struct Sorted<H, K, V> {
    heap: H,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<H: Heap<K, V>, K: Ord, V> Iterator for Sorted<H, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.heap.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.heap.len();
        (len, Some(len))
    }
}

impl<H: Heap<K, V>, K: Ord, V> ExactSizeIterator for Sorted<H, K, V> {}

impl<H: Heap<K, V>, K: Ord, V> FusedIterator for Sorted<H, K, V> {}

impl<H: fmt::Debug, K, V> fmt::Debug for Sorted<H, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sorted").field("heap", &self.heap).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(HeapError::EmptyHeap.to_string(), "heap is empty");
        assert_eq!(
            HeapError::KeyIncreaseRejected.to_string(),
            "new key is greater than the current key"
        );
    }
}
