//! Property-based tests using proptest
//!
//! These tests generate random sequences of operations and verify
//! that the heap invariants are always maintained, both against a sorted
//! model and through each engine's structural `validate()`.

use mergeable_heaps::binomial::BinomialHeap;
use mergeable_heaps::fibonacci::FibonacciHeap;
use mergeable_heaps::skew_binomial::SkewBinomialHeap;
use mergeable_heaps::{DecreaseKeyHeap, Heap, InvariantError};
use proptest::prelude::*;

/// Engines expose `validate` as an inherent method; this lets the generic
/// helpers call it.
trait Validate {
    fn check(&self) -> Result<(), InvariantError>;
}

impl Validate for BinomialHeap<i32, i32> {
    fn check(&self) -> Result<(), InvariantError> {
        self.validate()
    }
}

impl Validate for SkewBinomialHeap<i32, i32> {
    fn check(&self) -> Result<(), InvariantError> {
        self.validate()
    }
}

impl Validate for FibonacciHeap<i32, i32> {
    fn check(&self) -> Result<(), InvariantError> {
        self.validate()
    }
}

fn ops_strategy(max: usize) -> impl Strategy<Value = Vec<(bool, i32)>> {
    prop::collection::vec((prop::bool::ANY, -100i32..100), 0..max)
}

/// Test that insert and extract maintain the heap property
fn test_insert_extract_invariant<H>(ops: Vec<(bool, i32)>) -> Result<(), TestCaseError>
where
    H: Heap<i32, i32> + Validate,
{
    let mut heap = H::new();
    let mut model: Vec<i32> = Vec::new();

    for (should_extract, key) in ops {
        if should_extract && !model.is_empty() {
            let (extracted, _) = heap
                .extract_min()
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let expected = model.iter().copied().min();
            prop_assert_eq!(Some(extracted), expected);
            if let Some(pos) = model.iter().position(|&k| k == extracted) {
                model.swap_remove(pos);
            }
        } else {
            heap.insert(key, key);
            model.push(key);
        }

        prop_assert_eq!(heap.len(), model.len());
        prop_assert_eq!(heap.peek().map(|(k, _)| *k), model.iter().copied().min());
        prop_assert_eq!(heap.check(), Ok(()));
    }

    Ok(())
}

/// Test `sorted` is a heap sort of the inserted keys
fn test_sorted_invariant<H: Heap<i32, i32>>(keys: Vec<i32>) -> Result<(), TestCaseError> {
    let mut heap = H::new();
    for &key in &keys {
        heap.insert(key, key);
    }

    let drained: Vec<i32> = heap.sorted().map(|(k, _)| k).collect();
    let mut expected = keys;
    expected.sort_unstable();
    prop_assert_eq!(drained, expected);
    Ok(())
}

/// Test merge keeps every element and the structure valid
fn test_merge_invariant<H>(left: Vec<i32>, right: Vec<i32>) -> Result<(), TestCaseError>
where
    H: Heap<i32, i32> + Validate,
{
    let mut heap1 = H::new();
    let mut heap2 = H::new();
    for &key in &left {
        heap1.insert(key, key);
    }
    for &key in &right {
        heap2.insert(key, key);
    }

    heap1.merge(heap2);
    prop_assert_eq!(heap1.check(), Ok(()));
    prop_assert_eq!(heap1.len(), left.len() + right.len());

    for key in left.iter().chain(&right) {
        prop_assert!(heap1.contains(key));
    }

    let mut expected: Vec<i32> = left.into_iter().chain(right).collect();
    expected.sort_unstable();
    let drained: Vec<i32> = heap1.sorted().map(|(k, _)| k).collect();
    prop_assert_eq!(drained, expected);
    Ok(())
}

/// Test decrease_key keeps the heap consistent with a model
fn test_decrease_key_invariant<H>(
    initial: Vec<i32>,
    decreases: Vec<(usize, i32)>,
) -> Result<(), TestCaseError>
where
    H: DecreaseKeyHeap<i32, i32> + Validate,
{
    let mut heap = H::new();
    let mut handles = Vec::new();
    // model[i] is the current key of element i
    let mut model: Vec<i32> = Vec::new();
    for (i, &key) in initial.iter().enumerate() {
        handles.push(heap.insert(key, i as i32));
        model.push(key);
    }
    // Build some trees before decreasing.
    let (first, value) = heap
        .extract_min()
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(Some(first), model.iter().copied().min());
    let removed = value as usize;

    for (index, delta) in decreases {
        let i = index % handles.len();
        if i == removed {
            continue;
        }
        let new_key = model[i] - delta;
        heap
            .decrease_key(&handles[i], new_key)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        model[i] = new_key;

        let expected_min = model
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != removed)
            .map(|(_, &k)| k)
            .min();
        prop_assert_eq!(heap.peek().map(|(k, _)| *k), expected_min);
        prop_assert_eq!(heap.check(), Ok(()));
    }

    let mut expected: Vec<i32> = model
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != removed)
        .map(|(_, &k)| k)
        .collect();
    expected.sort_unstable();
    let drained: Vec<i32> = heap.sorted().map(|(k, _)| k).collect();
    prop_assert_eq!(drained, expected);
    Ok(())
}

// Generate test cases for each heap implementation

proptest! {
    #[test]
    fn test_binomial_insert_extract_invariant(ops in ops_strategy(200)) {
        test_insert_extract_invariant::<BinomialHeap<i32, i32>>(ops)?;
    }

    #[test]
    fn test_binomial_sorted_invariant(keys in prop::collection::vec(-1000i32..1000, 0..200)) {
        test_sorted_invariant::<BinomialHeap<i32, i32>>(keys)?;
    }

    #[test]
    fn test_binomial_merge_invariant(
        left in prop::collection::vec(-100i32..100, 0..60),
        right in prop::collection::vec(-100i32..100, 0..60)
    ) {
        test_merge_invariant::<BinomialHeap<i32, i32>>(left, right)?;
    }

    #[test]
    fn test_skew_binomial_insert_extract_invariant(ops in ops_strategy(200)) {
        test_insert_extract_invariant::<SkewBinomialHeap<i32, i32>>(ops)?;
    }

    #[test]
    fn test_skew_binomial_sorted_invariant(keys in prop::collection::vec(-1000i32..1000, 0..200)) {
        test_sorted_invariant::<SkewBinomialHeap<i32, i32>>(keys)?;
    }

    #[test]
    fn test_skew_binomial_merge_invariant(
        left in prop::collection::vec(-100i32..100, 0..60),
        right in prop::collection::vec(-100i32..100, 0..60)
    ) {
        test_merge_invariant::<SkewBinomialHeap<i32, i32>>(left, right)?;
    }

    #[test]
    fn test_fibonacci_insert_extract_invariant(ops in ops_strategy(200)) {
        test_insert_extract_invariant::<FibonacciHeap<i32, i32>>(ops)?;
    }

    #[test]
    fn test_fibonacci_sorted_invariant(keys in prop::collection::vec(-1000i32..1000, 0..200)) {
        test_sorted_invariant::<FibonacciHeap<i32, i32>>(keys)?;
    }

    #[test]
    fn test_fibonacci_merge_invariant(
        left in prop::collection::vec(-100i32..100, 0..60),
        right in prop::collection::vec(-100i32..100, 0..60)
    ) {
        test_merge_invariant::<FibonacciHeap<i32, i32>>(left, right)?;
    }

    #[test]
    fn test_fibonacci_decrease_key_invariant(
        initial in prop::collection::vec(-100i32..100, 2..60),
        decreases in prop::collection::vec((0usize..60, 0i32..50), 0..60)
    ) {
        test_decrease_key_invariant::<FibonacciHeap<i32, i32>>(initial, decreases)?;
    }
}
