//! Skew Binomial Heap implementation
//!
//! A skew binomial heap extends binomial heaps with additional flexibility:
//! - O(1) worst-case insert
//! - O(1) find_min (cached minimum root)
//! - O(log n) extract_min
//! - O(log n) forest union on merge, plus a node transfer linear in the
//!   absorbed heap's size
//!
//! The forest follows the skew-binary number system: apart from one pair of
//! equal smallest orders, every order appears at most once. Inserting a
//! singleton either pushes it or skew-links it with that smallest pair, so no
//! carry ever ripples on insert.
//!
//! The forest is kept as a stack: the largest order sits at index 0 and the
//! smallest on top.

use std::cmp::Reverse;
use std::fmt;

use smallvec::SmallVec;
use tracing::trace;

use crate::invariants::{check_invariants, InvariantError};
use crate::pretty;
use crate::rank::{checked_increment, Rank};
use crate::storage::{Arena, NodeKey, RawHandle};
use crate::traits::{Handle, Heap, HeapError};

/// Order-0 trees pulled out of a union, re-inserted afterwards
type Singletons = SmallVec<[NodeKey; 8]>;

/// Handle to an element in a Skew binomial heap
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SkewBinomialHandle(RawHandle);

impl Handle for SkewBinomialHandle {}

struct Node<K, V> {
    key: K,
    value: V,
    child: Option<NodeKey>,
    sibling: Option<NodeKey>,
    order: Rank,
}

/// Skew Binomial Heap
///
/// ```rust
/// use mergeable_heaps::skew_binomial::SkewBinomialHeap;
/// use mergeable_heaps::Heap;
///
/// let mut heap: SkewBinomialHeap<u32, ()> = (0..3).map(|k| (k, ())).collect();
/// // Two singletons and a skew-linked third: orders [1]
/// assert_eq!(heap.tree_orders(), vec![1]);
/// heap.insert(7, ());
/// assert_eq!(heap.tree_orders(), vec![0, 1]);
/// ```
pub struct SkewBinomialHeap<K, V> {
    arena: Arena<Node<K, V>>,
    /// Roots, largest order first
    forest: Vec<NodeKey>,
    min: Option<NodeKey>,
}

impl<K: Ord, V> Heap<K, V> for SkewBinomialHeap<K, V> {
    type Handle = SkewBinomialHandle;

    fn new() -> Self {
        Self::with_capacity(0)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            forest: Vec::new(),
            min: None,
        }
    }

    fn len(&self) -> usize {
        self.arena.len()
    }

    /// Inserts a new element into the heap
    ///
    /// **Time Complexity**: O(1) worst-case
    fn insert(&mut self, key: K, value: V) -> Self::Handle {
        let node = self.arena.insert(Node {
            key,
            value,
            child: None,
            sibling: None,
            order: 0,
        });

        let root = self.insert_singleton(node);
        let replaces_min = match self.min {
            Some(min) => self.arena[root].key <= self.arena[min].key,
            None => true,
        };
        if replaces_min {
            self.min = Some(root);
        }

        check_invariants!(self);
        SkewBinomialHandle(self.arena.handle(node))
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
    /// The minimum root leaves the forest and its children, sorted by order,
    /// are unioned back with the remaining trees.
    fn extract_min(&mut self) -> Result<(K, V), HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;
        let position = self
            .forest
            .iter()
            .position(|&root| root == min)
            .ok_or(HeapError::EmptyHeap)?;
        let node = self.arena.remove(min).ok_or(HeapError::EmptyHeap)?;
        self.forest.remove(position);

        let mut fractures = Vec::new();
        let mut current = node.child;
        while let Some(child) = current {
            current = self.arena[child].sibling.take();
            fractures.push(child);
        }
        // Stable, so equal orders keep their relative position.
        fractures.sort_by_key(|&child| Reverse(self.arena[child].order));

        let forest = std::mem::take(&mut self.forest);
        self.union(forest, fractures);

        check_invariants!(self);
        Ok((node.key, node.value))
    }

    fn contains(&self, key: &K) -> bool {
        self.arena.values().any(|node| node.key == *key)
    }

    /// Merges another heap into this heap
    ///
    /// **Time Complexity**: O(log n) for the union, plus moving the other
    /// heap's nodes into this heap's arena.
    fn merge(&mut self, other: Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }

        let SkewBinomialHeap { arena, forest, .. } = other;
        let map = self.arena.absorb(arena, |node, map| {
            node.child = map.get_opt(node.child);
            node.sibling = map.get_opt(node.sibling);
        });
        let theirs: Vec<NodeKey> = forest.into_iter().map(|root| map.get(root)).collect();

        let ours = std::mem::take(&mut self.forest);
        self.union(ours, theirs);
        check_invariants!(self);
    }
}

impl<K: Ord, V> SkewBinomialHeap<K, V> {
    /// Orders of the trees in the forest, smallest first
    pub fn tree_orders(&self) -> Vec<Rank> {
        self.forest
            .iter()
            .rev()
            .map(|&root| self.arena[root].order)
            .collect()
    }

    /// Pushes an order-0 tree, skew-linking it with the smallest pair if
    /// their orders are equal. Returns the root that now holds `node`.
    fn insert_singleton(&mut self, node: NodeKey) -> NodeKey {
        let root = match self.forest[..] {
            [.., second, first] if self.arena[first].order == self.arena[second].order => {
                self.forest.truncate(self.forest.len() - 2);
                self.skew_link(first, second, node)
            }
            _ => node,
        };
        self.forest.push(root);
        root
    }

    /// Links two trees of order r with a singleton into one tree of order r+1
    ///
    /// Type A, when the singleton is strictly smaller than both roots: the
    /// singleton becomes the root with the two trees as its children.
    /// Type B otherwise: the trees link normally and the singleton becomes
    /// the new root's leftmost child.
    fn skew_link(&mut self, first: NodeKey, second: NodeKey, singleton: NodeKey) -> NodeKey {
        debug_assert_eq!(self.arena[first].order, self.arena[second].order);
        let key = &self.arena[singleton].key;
        if key < &self.arena[first].key && key < &self.arena[second].key {
            trace!(order = self.arena[first].order, "skew link type A");
            self.arena[first].sibling = Some(second);
            let order = checked_increment(self.arena[first].order);
            let root = &mut self.arena[singleton];
            root.child = Some(first);
            root.order = order;
            singleton
        } else {
            trace!(order = self.arena[first].order, "skew link type B");
            let root = self.link(first, second);
            let old_first = self.arena[root].child.replace(singleton);
            self.arena[singleton].sibling = old_first;
            root
        }
    }

    /// Links two trees of equal order; the larger root becomes the leftmost
    /// child, and `a` wins ties.
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

    /// Replaces the forest with the union of two root stacks
    ///
    /// 1. Pull the order-0 trees off the top of both stacks
    /// 2. Link a repeated smallest pair on each side until its orders are unique
    /// 3. Ripple-carry add the two sides, smallest order first
    /// 4. Skew-insert the pulled singletons
    fn union(&mut self, mut ours: Vec<NodeKey>, mut theirs: Vec<NodeKey>) {
        let mut singletons = Singletons::new();
        self.take_singletons(&mut ours, &mut singletons);
        self.take_singletons(&mut theirs, &mut singletons);
        self.normalize(&mut ours);
        self.normalize(&mut theirs);

        let mut result = Vec::with_capacity(ours.len() + theirs.len() + 1);
        let mut carry = None;
        loop {
            let order = [ours.last().copied(), theirs.last().copied(), carry]
                .into_iter()
                .flatten()
                .map(|root| self.arena[root].order)
                .min();
            let Some(order) = order else { break };

            let a = self.pop_order(&mut ours, order);
            let b = self.pop_order(&mut theirs, order);
            let c = carry.take();
            let (sum, next) = self.full_adder(a, b, c);
            result.extend(sum);
            carry = next;
        }
        result.reverse();
        self.forest = result;

        trace!(
            trees = self.forest.len(),
            singletons = singletons.len(),
            "skew binomial union"
        );
        for singleton in singletons {
            self.insert_singleton(singleton);
        }
        self.refresh_min();
    }

    fn take_singletons(&self, forest: &mut Vec<NodeKey>, out: &mut Singletons) {
        while let Some(&top) = forest.last() {
            if self.arena[top].order != 0 {
                break;
            }
            out.extend(forest.pop());
        }
    }

    fn normalize(&mut self, forest: &mut Vec<NodeKey>) {
        while let [.., second, first] = forest[..] {
            if self.arena[first].order != self.arena[second].order {
                break;
            }
            forest.truncate(forest.len() - 2);
            let root = self.link(first, second);
            forest.push(root);
        }
    }

    /// Pops the top of `forest` if it has the given order
    fn pop_order(&self, forest: &mut Vec<NodeKey>, order: Rank) -> Option<NodeKey> {
        match forest.last() {
            Some(&top) if self.arena[top].order == order => forest.pop(),
            _ => None,
        }
    }

    fn refresh_min(&mut self) {
        self.min = None;
        for &root in &self.forest {
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
        let mut out = Vec::new();
        let mut current = self.arena[node].child;
        while let Some(child) = current {
            out.push(child);
            current = self.arena[child].sibling;
        }
        out
    }

    /// Checks the forest shape, heap order, tree sizes and the cached minimum
    ///
    /// A skew tree of order r holds between 2^r and 2^(r+1) - 1 nodes.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let orders: Vec<Rank> = self.forest.iter().map(|&root| self.arena[root].order).collect();
        for (i, pair) in orders.windows(2).enumerate() {
            if pair[0] < pair[1] {
                return Err(InvariantError::OrderSequence {
                    orders: self.tree_orders(),
                });
            }
            if pair[0] == pair[1] && i + 2 != orders.len() {
                return Err(InvariantError::DuplicateOrder { order: pair[0] });
            }
        }

        let mut reachable = 0;
        for &root in &self.forest {
            let order = self.arena[root].order;
            let mut nodes = 0;
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                nodes += 1;
                for child in self.children(node) {
                    if self.arena[child].key < self.arena[node].key {
                        return Err(InvariantError::HeapOrder {
                            parent_rank: self.arena[node].order,
                        });
                    }
                    stack.push(child);
                }
            }
            let lower = 1usize << order;
            if nodes < lower || nodes >= lower << 1 {
                return Err(InvariantError::BinomialSize { order, nodes });
            }
            reachable += nodes;
        }

        if reachable != self.len() {
            return Err(InvariantError::LengthMismatch {
                reachable,
                len: self.len(),
            });
        }

        let min_ok = match self.min {
            None => self.forest.is_empty(),
            Some(min) => {
                self.forest.contains(&min)
                    && self
                        .forest
                        .iter()
                        .all(|&root| self.arena[root].key >= self.arena[min].key)
            }
        };
        if min_ok {
            Ok(())
        } else {
            Err(InvariantError::StaleMinimum)
        }
    }

    /// Renders the forest in stack order, `T0` being the largest tree
    pub fn pretty(&self) -> String
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        let roots: Vec<(usize, NodeKey)> = self.forest.iter().copied().enumerate().collect();
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

impl<K: Ord, V> Default for SkewBinomialHeap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for SkewBinomialHeap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut heap = Self::with_capacity(iter.size_hint().0);
        heap.extend(iter);
        heap
    }
}

impl<K: Ord, V> Extend<(K, V)> for SkewBinomialHeap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for SkewBinomialHeap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkewBinomialHeap")
            .field("len", &self.len())
            .field("min", &self.peek())
            .field("orders", &self.tree_orders())
            .finish()
    }
}
