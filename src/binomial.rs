//! Binomial Heap implementation
//!
//! A binomial heap is a collection of binomial trees with:
//! - O(log n) worst-case insert, O(1) amortized over a run of inserts
//! - O(1) find_min (cached minimum root)
//! - O(log n) extract_min
//! - O(log n) forest union on merge, plus a node transfer linear in the
//!   absorbed heap's size
//!
//! # Algorithm Overview
//!
//! A binomial heap maintains a forest of binomial trees, where:
//! - Each tree satisfies the heap property
//! - At most one tree of each order (0, 1, 2, ..., log n)
//! - This is analogous to the binary representation of n
//!
//! **Binomial Tree Bₖ**: Recursively defined:
//! - B₀ is a single node
//! - Bₖ is formed by linking two B_{k-1} trees
//! - Bₖ has exactly 2ᵏ nodes, and its root's children are B_{k-1}, ..., B₀
//!
//! **Key Operations**:
//! - **Insert**: add a one-tree forest (like adding 1 to a binary number)
//! - **Extract-min**: remove the minimum root and add its children back
//! - **Merge**: add two forests order by order with carry propagation
//!
//! Nodes keep no parent link, so this engine offers no `decrease_key`; it
//! implements [`Heap`] only.

use std::fmt;

use smallvec::SmallVec;
use tracing::trace;

use crate::invariants::{check_invariants, InvariantError};
use crate::pretty;
use crate::rank::{checked_increment, Rank};
use crate::storage::{Arena, NodeKey, RawHandle};
use crate::traits::{Handle, Heap, HeapError};

/// A forest indexed by order, as passed to the carry adder
type Forest = SmallVec<[Option<NodeKey>; 32]>;

/// Handle to an element in a Binomial heap
///
/// Binomial handles cannot be used for `decrease_key`; they identify the
/// element and become stale once it is extracted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BinomialHandle(RawHandle);

impl Handle for BinomialHandle {}

/// Internal node structure for binomial heap
///
/// **Binomial Tree Structure**: a node of order k has exactly k children,
/// linked leftmost-first through `sibling` in decreasing order
/// k-1, k-2, ..., 0.
struct Node<K, V> {
    key: K,
    value: V,
    /// Leftmost (highest-order) child
    child: Option<NodeKey>,
    /// Next sibling to the right (next lower order)
    sibling: Option<NodeKey>,
    /// Order of the tree rooted here
    order: Rank,
}

/// Binomial Heap
///
/// # Example
///
/// ```rust
/// use mergeable_heaps::binomial::BinomialHeap;
/// use mergeable_heaps::Heap;
///
/// let mut heap = BinomialHeap::new();
/// heap.insert(5, "five");
/// heap.insert(1, "one");
/// assert_eq!(heap.find_min(), Ok((&1, &"one")));
/// assert_eq!(heap.tree_orders(), vec![1]);
/// ```
pub struct BinomialHeap<K, V> {
    arena: Arena<Node<K, V>>,
    /// Trees indexed by order. Never ends in `None`.
    trees: Vec<Option<NodeKey>>,
    /// Root with the minimum key, `None` iff the heap is empty
    min: Option<NodeKey>,
}

impl<K: Ord, V> Heap<K, V> for BinomialHeap<K, V> {
    type Handle = BinomialHandle;

    fn new() -> Self {
        Self::with_capacity(0)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            trees: Vec::new(),
            min: None,
        }
    }

    fn len(&self) -> usize {
        self.arena.len()
    }

    /// Inserts a new element into the heap
    ///
    /// **Time Complexity**: O(log n) worst-case, O(1) amortized
    ///
    /// **Algorithm**: wrap the pair in a B₀ tree and add the one-tree forest
    /// `[B₀]` to the heap's forest. The carry ripples only while consecutive
    /// orders are occupied, exactly like incrementing a binary counter, and
    /// the adder stops as soon as no carry remains.
    ///
    /// The tree the ripple finally writes contains the new node and every
    /// root it absorbed, so comparing that one root against the cached
    /// minimum keeps the cache exact without a rescan.
    fn insert(&mut self, key: K, value: V) -> Self::Handle {
        let node = self.arena.insert(Node {
            key,
            value,
            child: None,
            sibling: None,
            order: 0,
        });

        if let Some(root) = self.add_forest(&[Some(node)]) {
            let replaces_min = match self.min {
                Some(min) => self.arena[root].key <= self.arena[min].key,
                None => true,
            };
            if replaces_min {
                self.min = Some(root);
            }
        }

        check_invariants!(self);
        BinomialHandle(self.arena.handle(node))
    }

    fn find_min(&self) -> Result<(&K, &V), HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;
        let node = &self.arena[min];
        Ok((&node.key, &node.value))
    }

    /// Removes and returns the minimum element
    ///
    /// **Time Complexity**: O(log n) worst-case
    ///
    /// **Algorithm**:
    /// 1. Detach the cached minimum root from its order slot
    /// 2. Fracture its children: a Bₖ root has children B_{k-1}, ..., B₀
    /// 3. Reverse them so the child of order i sits at index i
    /// 4. Add that forest back into the heap with the carry adder
    /// 5. Rescan the O(log n) roots for the new minimum
    fn extract_min(&mut self) -> Result<(K, V), HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;
        let node = self.arena.remove(min).ok_or(HeapError::EmptyHeap)?;

        let order = node.order as usize;
        debug_assert_eq!(self.trees.get(order).copied().flatten(), Some(min));
        self.trees[order] = None;
        self.trim();

        let fractures = self.fracture(node.child);
        debug_assert_eq!(fractures.len(), order);
        self.add_forest(&fractures);
        self.refresh_min();

        check_invariants!(self);
        Ok((node.key, node.value))
    }

    fn contains(&self, key: &K) -> bool {
        self.arena.values().any(|node| node.key == *key)
    }

    /// Merges another heap into this heap
    ///
    /// **Time Complexity**: O(log n) for the carry addition, plus moving the
    /// other heap's nodes into this heap's arena.
    fn merge(&mut self, other: Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }

        let BinomialHeap { arena, trees, .. } = other;
        let map = self.arena.absorb(arena, |node, map| {
            node.child = map.get_opt(node.child);
            node.sibling = map.get_opt(node.sibling);
        });
        let theirs: Forest = trees.iter().map(|&tree| map.get_opt(tree)).collect();

        self.add_forest(&theirs);
        self.refresh_min();
        check_invariants!(self);
    }
}

impl<K: Ord, V> BinomialHeap<K, V> {
    /// Orders of the trees currently in the forest, ascending
    ///
    /// For a heap of n elements this is the positions of the set bits of n.
    pub fn tree_orders(&self) -> Vec<Rank> {
        self.trees
            .iter()
            .enumerate()
            .filter_map(|(order, tree)| tree.map(|_| order as Rank))
            .collect()
    }

    /// Links two binomial trees of the same order into one of order+1
    ///
    /// **Time Complexity**: O(1)
    ///
    /// The root with the larger key becomes the leftmost child of the other.
    /// On equal keys `a` stays the root.
    fn link(&mut self, a: NodeKey, b: NodeKey) -> NodeKey {
        debug_assert_eq!(self.arena[a].order, self.arena[b].order);
        let (root, child) = if self.arena[a].key <= self.arena[b].key {
            (a, b)
        } else {
            (b, a)
        };

        let old_first = self.arena[root].child.replace(child);
        self.arena[child].sibling = old_first;
        let root_node = &mut self.arena[root];
        root_node.order = checked_increment(root_node.order);
        root
    }

    /// One-bit full adder over trees of a single order
    ///
    /// Returns `(sum, carry)`: the tree left at this order and the tree
    /// carried to the next one.
    ///
    /// | a | b | carry-in | sum      | carry-out  |
    /// |---|---|----------|----------|------------|
    /// | - | - | -        | -        | -          |
    /// | x | - | -        | x        | -          |
    /// | x | y | -        | -        | link(x, y) |
    /// | x | y | c        | c        | link(x, y) |
    fn full_adder(
        &mut self,
        a: Option<NodeKey>,
        b: Option<NodeKey>,
        carry: Option<NodeKey>,
    ) -> (Option<NodeKey>, Option<NodeKey>) {
        match (a, b, carry) {
            (None, None, None) => (None, None),
            (Some(x), None, None) | (None, Some(x), None) | (None, None, Some(x)) => {
                (Some(x), None)
            }
            (None, Some(y), Some(c)) => (None, Some(self.link(c, y))),
            (Some(x), None, Some(c)) => (None, Some(self.link(x, c))),
            (Some(x), Some(y), None) => (None, Some(self.link(x, y))),
            (Some(x), Some(y), Some(c)) => (Some(c), Some(self.link(x, y))),
        }
    }

    /// Adds `other` into the forest, order by order (ripple-carry addition)
    ///
    /// `other[i]` must be a tree of order i or `None`. Returns the last tree
    /// written into the forest, which for a one-tree `other` is the tree now
    /// holding it.
    ///
    /// **Algorithm**:
    /// 1. For each order from 0 up, feed (ours, theirs, carry) to the adder
    /// 2. Store the sum at this order and move the carry to the next
    /// 3. Stop early once `other` is used up and no carry remains
    /// 4. A carry out of the top order becomes a new highest tree
    fn add_forest(&mut self, other: &[Option<NodeKey>]) -> Option<NodeKey> {
        let width = self.trees.len().max(other.len());
        self.trees.resize(width, None);

        let mut carry = None;
        let mut last = None;
        for order in 0..width {
            let ours = self.trees[order].take();
            let theirs = other.get(order).copied().flatten();
            let (sum, next) = self.full_adder(ours, theirs, carry);
            self.trees[order] = sum;
            carry = next;
            if sum.is_some() {
                last = sum;
            }
            if carry.is_none() && order + 1 >= other.len() {
                break;
            }
        }
        if let Some(top) = carry {
            self.trees.push(Some(top));
            last = Some(top);
        }
        self.trim();

        trace!(width, trees = self.trees.len(), "binomial carry merge");
        last
    }

    /// Detaches the children of a removed root as a forest indexed by order
    fn fracture(&mut self, first_child: Option<NodeKey>) -> Forest {
        let mut fractures = Forest::new();
        let mut current = first_child;
        while let Some(child) = current {
            current = self.arena[child].sibling.take();
            fractures.push(Some(child));
        }
        // Children run from order k-1 down to 0.
        fractures.reverse();
        fractures
    }

    fn trim(&mut self) {
        while let Some(None) = self.trees.last() {
            self.trees.pop();
        }
    }

    /// Finds and updates the minimum pointer by scanning all roots
    fn refresh_min(&mut self) {
        self.min = None;
        for &root in self.trees.iter().flatten() {
            let replaces_min = match self.min {
                Some(min) => self.arena[root].key < self.arena[min].key,
                None => true,
            };
            if replaces_min {
                self.min = Some(root);
            }
        }
    }

    fn children(&self, node: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::with_capacity(self.arena[node].order as usize);
        let mut current = self.arena[node].child;
        while let Some(child) = current {
            out.push(child);
            current = self.arena[child].sibling;
        }
        out
    }

    /// Checks every structural invariant of the forest
    ///
    /// - slot i holds a tree whose root records order i, and no slot trails empty
    /// - every node of order k has children of orders k-1, ..., 0, so a tree
    ///   of order k holds exactly 2ᵏ nodes
    /// - parents never have larger keys than their children
    /// - the cached minimum is a minimal root
    /// - every arena node is reachable from exactly one root
    pub fn validate(&self) -> Result<(), InvariantError> {
        if let Some(None) = self.trees.last() {
            return Err(InvariantError::OrderSequence {
                orders: self.tree_orders(),
            });
        }

        let mut reachable = 0;
        for (order, root) in self.trees.iter().enumerate() {
            let Some(root) = *root else { continue };
            let recorded = self.arena[root].order;
            if recorded as usize != order {
                return Err(InvariantError::OrderSequence {
                    orders: self.tree_orders(),
                });
            }

            let nodes = self.validate_tree(root)?;
            if nodes != 1usize << order {
                return Err(InvariantError::BinomialSize {
                    order: recorded,
                    nodes,
                });
            }
            reachable += nodes;
        }

        if reachable != self.len() {
            return Err(InvariantError::LengthMismatch {
                reachable,
                len: self.len(),
            });
        }

        match self.min {
            None if self.trees.is_empty() => Ok(()),
            None => Err(InvariantError::StaleMinimum),
            Some(min) => {
                let min_order = self.arena.get(min).map(|node| node.order as usize);
                let is_root = min_order
                    .and_then(|order| self.trees.get(order).copied().flatten())
                    == Some(min);
                let is_minimal = is_root
                    && self
                        .trees
                        .iter()
                        .flatten()
                        .all(|&root| self.arena[root].key >= self.arena[min].key);
                if is_minimal {
                    Ok(())
                } else {
                    Err(InvariantError::StaleMinimum)
                }
            }
        }
    }

    /// Validates one tree, returning its node count
    fn validate_tree(&self, root: NodeKey) -> Result<usize, InvariantError> {
        let mut count = 0;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            count += 1;
            let parent = &self.arena[node];
            let children = self.children(node);
            if children.len() != parent.order as usize {
                return Err(InvariantError::DegreeMismatch {
                    recorded: parent.order,
                    actual: children.len(),
                });
            }
            for (i, &child) in children.iter().enumerate() {
                let expected = parent.order as usize - 1 - i;
                if self.arena[child].order as usize != expected {
                    return Err(InvariantError::BinomialSize {
                        order: parent.order,
                        nodes: count,
                    });
                }
                if self.arena[child].key < parent.key {
                    return Err(InvariantError::HeapOrder {
                        parent_rank: parent.order,
                    });
                }
                stack.push(child);
            }
        }
        Ok(count)
    }

    /// Renders the forest, one `T<order>` block per tree, lowest order first
    pub fn pretty(&self) -> String
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        let roots: Vec<(usize, NodeKey)> = self
            .trees
            .iter()
            .enumerate()
            .filter_map(|(order, tree)| tree.map(|root| (order, root)))
            .collect();
        pretty::render(
            &roots,
            |node| self.children(node),
            |node| {
                let n = &self.arena[node];
                (&n.key, &n.value)
            },
        )
    }
}

impl<K: Ord, V> Default for BinomialHeap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for BinomialHeap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut heap = Self::with_capacity(iter.size_hint().0);
        heap.extend(iter);
        heap
    }
}

impl<K: Ord, V> Extend<(K, V)> for BinomialHeap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for BinomialHeap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinomialHeap")
            .field("len", &self.len())
            .field("min", &self.peek())
            .field("orders", &self.tree_orders())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn heap_of(keys: impl IntoIterator<Item = i32>) -> BinomialHeap<i32, ()> {
        keys.into_iter().map(|k| (k, ())).collect()
    }

    #[test]
    fn test_orders_follow_binary_representation() {
        for n in 0..64i32 {
            let heap = heap_of(0..n);
            let expected: Vec<Rank> = (0..8).filter(|bit| n & (1 << bit) != 0).collect();
            assert_eq!(heap.tree_orders(), expected, "n = {n}");
            heap.validate().unwrap();
        }
    }

    #[test]
    fn test_merge_five_and_three_is_eight() {
        let mut five = heap_of([10, 20, 30, 40, 50]);
        let three = heap_of([5, 15, 25]);
        assert_eq!(five.tree_orders(), vec![0, 2]);
        assert_eq!(three.tree_orders(), vec![0, 1]);

        five.merge(three);
        assert_eq!(five.tree_orders(), vec![3]);
        assert_eq!(five.len(), 8);
        assert_eq!(five.find_min(), Ok((&5, &())));
        five.validate().unwrap();
    }

    #[test]
    fn test_full_adder_three_inputs() {
        // Two order-1 trees meeting a carried order-1 tree.
        let mut heap = heap_of([1, 2, 3, 4, 5, 6]);
        let mut other = heap_of([0, 7]);
        assert_eq!(heap.tree_orders(), vec![1, 2]);
        assert_eq!(other.tree_orders(), vec![1]);

        heap.insert(8, ());
        other.insert(9, ());
        // 7 + 3 = 10 = 0b1010
        heap.merge(other);
        assert_eq!(heap.tree_orders(), vec![1, 3]);
        heap.validate().unwrap();

        let keys: Vec<i32> = heap.sorted().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_extract_min_restores_forest() {
        let mut heap = heap_of([4, 8, 1, 6, 3, 7, 2, 5]);
        assert_eq!(heap.tree_orders(), vec![3]);

        assert_eq!(heap.extract_min(), Ok((1, ())));
        // 7 = 0b111
        assert_eq!(heap.tree_orders(), vec![0, 1, 2]);
        heap.validate().unwrap();
        assert_eq!(heap.find_min(), Ok((&2, &())));
    }

    #[test]
    fn test_link_prefers_first_on_ties() {
        let mut heap: BinomialHeap<i32, &str> = BinomialHeap::new();
        heap.insert(1, "first");
        heap.insert(1, "second");
        // The carry (the resident tree) is linked first and keeps the root.
        assert_eq!(heap.find_min(), Ok((&1, &"first")));
    }

    #[test]
    fn test_empty_heap_errors() {
        let mut heap: BinomialHeap<i32, i32> = BinomialHeap::new();
        assert_eq!(heap.find_min(), Err(HeapError::EmptyHeap));
        assert_eq!(heap.extract_min(), Err(HeapError::EmptyHeap));
        assert!(!heap.contains(&0));
        heap.validate().unwrap();
    }

    #[test]
    fn test_contains_tracks_extraction() {
        let mut heap = heap_of([3, 1, 2]);
        assert!(heap.contains(&2));
        heap.extract_min().unwrap();
        heap.extract_min().unwrap();
        assert!(!heap.contains(&2));
        assert!(heap.contains(&3));
    }

    #[test]
    fn test_pretty_labels_by_order() {
        let heap = heap_of([1, 2, 3, 4]);
        assert!(heap.pretty().starts_with("T2----(1, ())\n"));
    }

    #[test]
    fn test_pretty() {
        let heap: BinomialHeap<i32, char> = [(3, 'c'), (1, 'a'), (2, 'b')].into_iter().collect();
        let expected = "\
T0----(2, 'b')
T1----(1, 'a')
|    S0----(3, 'c')
";
        assert_eq!(heap.pretty(), expected);
        assert_eq!(BinomialHeap::<i32, char>::new().pretty(), "Nothing\n");
    }
}
