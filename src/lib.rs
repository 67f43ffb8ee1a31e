//! Mergeable Heap Data Structures for Rust
//!
//! This crate provides priority queues whose main selling point is cheap
//! union (`merge`) of two heaps, plus `decrease_key` where the structure
//! supports it.
//!
//! # Engines
//!
//! - **Fibonacci Heap**: O(1) amortized insert and decrease_key; O(log n) amortized extract_min;
//!   O(1) root ring splice on merge
//! - **Binomial Heap**: O(log n) insert (O(1) amortized) and extract_min; O(log n) carry merge
//! - **Skew Binomial Heap**: O(1) worst-case insert; O(log n) extract_min and union
//!
//! Nodes live in a per-heap arena, so `merge` also moves the absorbed heap's
//! nodes into this heap's arena. That transfer is linear in the size of the
//! absorbed heap.
//!
//! Every engine implements [`Heap`]. Only [`fibonacci::FibonacciHeap`] keeps
//! parent links and implements [`DecreaseKeyHeap`].
//!
//! # Example
//!
//! ```rust
//! use mergeable_heaps::fibonacci::FibonacciHeap;
//! use mergeable_heaps::{DecreaseKeyHeap, Heap};
//!
//! let mut heap = FibonacciHeap::new();
//! let handle1 = heap.insert(5, "item1");
//! heap.insert(3, "item2");
//! heap.decrease_key(&handle1, 1).unwrap();
//! assert_eq!(heap.find_min(), Ok((&1, &"item1")));
//! ```
//!
//! # Features
//!
//! - `check-invariants`: run the full structural `validate()` after every
//!   mutating operation and panic on the first violation.

pub mod binomial;
pub mod fibonacci;
pub mod invariants;
mod pretty;
pub mod rank;
pub mod skew_binomial;
pub mod storage;
pub mod traits;

pub use invariants::InvariantError;
pub use traits::{DecreaseKeyHeap, Handle, Heap, HeapError, Sorted};
