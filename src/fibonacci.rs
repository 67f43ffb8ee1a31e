//! Fibonacci Heap implementation
//!
//! A Fibonacci heap is a data structure for priority queue operations with:
//! - O(1) amortized insert and decrease_key
//! - O(1) root ring splice on merge, plus a node transfer linear in the
//!   absorbed heap's size
//! - O(log n) amortized extract_min
//!
//! The structure consists of a collection of heap-ordered trees. Roots are linked
//! in a circular doubly linked list. The heap maintains the minimum node pointer.
//!
//! Rings live in an arena: `next`/`prev` are node keys and a node alone in its
//! ring points at itself. `parent` is a back-link used only by cuts.

use std::fmt;

use slotmap::SecondaryMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::invariants::{check_invariants, InvariantError};
use crate::pretty;
use crate::rank::{
    checked_increment, degree_table_hint, fibonacci_size_bound, saturating_decrement, Rank,
};
use crate::storage::{Arena, NodeKey, RawHandle};
use crate::traits::{DecreaseKeyHeap, Handle, Heap, HeapError};

/// Handle to an element in a Fibonacci heap
///
/// The handle stays valid until its element is extracted, including across
/// consolidation and cuts. It is rejected by any other heap instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FibonacciHandle(RawHandle);

impl Handle for FibonacciHandle {}

struct Node<K, V> {
    key: K,
    value: V,
    parent: Option<NodeKey>,
    /// Any one child; the rest are reached through its ring
    child: Option<NodeKey>,
    next: NodeKey,
    prev: NodeKey,
    degree: Rank,
    marked: bool,
}

/// Fibonacci Heap
///
/// # Example
///
/// ```rust
/// use mergeable_heaps::fibonacci::FibonacciHeap;
/// use mergeable_heaps::{DecreaseKeyHeap, Heap};
///
/// let mut heap = FibonacciHeap::new();
/// let handle = heap.insert(5, "item");
/// heap.decrease_key(&handle, 1).unwrap();
/// assert_eq!(heap.find_min(), Ok((&1, &"item")));
/// ```
pub struct FibonacciHeap<K, V> {
    arena: Arena<Node<K, V>>,
    min: Option<NodeKey>,
}

impl<K: Ord, V> Heap<K, V> for FibonacciHeap<K, V> {
    type Handle = FibonacciHandle;

    fn new() -> Self {
        Self::with_capacity(0)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            min: None,
        }
    }

    fn len(&self) -> usize {
        self.arena.len()
    }

    fn insert(&mut self, key: K, value: V) -> Self::Handle {
        let node = self.arena.insert_with_key(|this| Node {
            key,
            value,
            parent: None,
            child: None,
            next: this,
            prev: this,
            degree: 0,
            marked: false,
        });
        self.add_root(node);

        check_invariants!(self);
        FibonacciHandle(self.arena.handle(node))
    }

    fn find_min(&self) -> Result<(&K, &V), HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;
        let node = &self.arena[min];
        Ok((&node.key, &node.value))
    }

    /// Removes and returns the minimum element
    ///
    /// The minimum's children join the root ring, then equal-degree roots
    /// are linked until every root degree is unique.
    fn extract_min(&mut self) -> Result<(K, V), HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;
        let rest = self.unlink(min);

        let child = self.arena[min].child.take();
        if let Some(first) = child {
            // Children become roots: clear their parent links and marks.
            let mut curr = first;
            loop {
                let node = &mut self.arena[curr];
                node.parent = None;
                node.marked = false;
                curr = node.next;
                if curr == first {
                    break;
                }
            }
        }

        let node = self.arena.remove(min).ok_or(HeapError::EmptyHeap)?;
        self.min = None;

        let start = match (rest, child) {
            (Some(root), Some(first)) => {
                self.splice(root, first);
                Some(root)
            }
            (ring, None) | (None, ring) => ring,
        };
        if let Some(start) = start {
            self.consolidate(start);
        }

        check_invariants!(self);
        Ok((node.key, node.value))
    }

    fn contains(&self, key: &K) -> bool {
        self.arena.values().any(|node| node.key == *key)
    }

    /// Splices the other heap's root ring into this one
    ///
    /// The ring splice is O(1); moving the other heap's nodes into this
    /// heap's arena is linear in their number.
    fn merge(&mut self, other: Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }

        let FibonacciHeap { arena, min } = other;
        let map = self.arena.absorb(arena, |node, map| {
            node.parent = map.get_opt(node.parent);
            node.child = map.get_opt(node.child);
            node.next = map.get(node.next);
            node.prev = map.get(node.prev);
        });

        if let (Some(ours), Some(theirs)) = (self.min, map.get_opt(min)) {
            self.splice(ours, theirs);
            if self.arena[theirs].key < self.arena[ours].key {
                self.min = Some(theirs);
            }
        }
        check_invariants!(self);
    }
}

impl<K: Ord, V> DecreaseKeyHeap<K, V> for FibonacciHeap<K, V> {
    /// Decreases the key of an element
    ///
    /// **Time Complexity**: O(1) amortized
    ///
    /// A child whose new key is below its parent's is cut to the root ring,
    /// then its former parent is cascading-cut: marked ancestors are cut in
    /// turn, and the first unmarked non-root ancestor gets marked.
    fn decrease_key(&mut self, handle: &Self::Handle, new_key: K) -> Result<(), HeapError> {
        let node = self.arena.resolve(&handle.0)?;
        if new_key > self.arena[node].key {
            return Err(HeapError::KeyIncreaseRejected);
        }
        self.arena[node].key = new_key;

        match self.arena[node].parent {
            None => {
                if let Some(min) = self.min {
                    if self.arena[node].key < self.arena[min].key {
                        self.min = Some(node);
                    }
                }
            }
            Some(parent) => {
                if self.arena[node].key < self.arena[parent].key {
                    self.cut(node, parent);
                    self.cascading_cut(parent);
                }
            }
        }

        check_invariants!(self);
        Ok(())
    }
}

impl<K: Ord, V> FibonacciHeap<K, V> {
    /// Degrees of the roots, in ring order starting at the minimum
    pub fn root_degrees(&self) -> Vec<Rank> {
        match self.min {
            Some(min) => self
                .ring(min)
                .into_iter()
                .map(|root| self.arena[root].degree)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Joins the rings containing `a` and `b`
    fn splice(&mut self, a: NodeKey, b: NodeKey) {
        let a_next = self.arena[a].next;
        let b_next = self.arena[b].next;
        self.arena[a].next = b_next;
        self.arena[b_next].prev = a;
        self.arena[b].next = a_next;
        self.arena[a_next].prev = b;
    }

    /// Removes `node` from its ring, leaving it a singleton ring
    ///
    /// Returns a remaining member of the old ring, if any.
    fn unlink(&mut self, node: NodeKey) -> Option<NodeKey> {
        let next = self.arena[node].next;
        if next == node {
            return None;
        }
        let prev = self.arena[node].prev;
        self.arena[prev].next = next;
        self.arena[next].prev = prev;
        let n = &mut self.arena[node];
        n.next = node;
        n.prev = node;
        Some(next)
    }

    /// Splices a singleton ring into the root ring and updates the minimum
    fn add_root(&mut self, node: NodeKey) {
        match self.min {
            Some(min) => {
                self.splice(min, node);
                if self.arena[node].key < self.arena[min].key {
                    self.min = Some(node);
                }
            }
            None => self.min = Some(node),
        }
    }

    /// Members of the ring containing `start`, beginning with `start`
    fn ring(&self, start: NodeKey) -> Vec<NodeKey> {
        let mut out = vec![start];
        let mut curr = self.arena[start].next;
        while curr != start {
            out.push(curr);
            curr = self.arena[curr].next;
        }
        out
    }

    /// Links roots of equal degree until all root degrees are distinct
    ///
    /// The ring is snapshotted first because linking unlinks roots from it.
    fn consolidate(&mut self, start: NodeKey) {
        let roots = self.ring(start);
        let mut table: SmallVec<[Option<NodeKey>; 16]> =
            SmallVec::with_capacity(degree_table_hint(self.len()));
        let mut links = 0usize;

        for &root in &roots {
            let mut curr = root;
            loop {
                let degree = self.arena[curr].degree as usize;
                if degree >= table.len() {
                    table.resize(degree + 1, None);
                }
                let Some(other) = table[degree].take() else {
                    table[degree] = Some(curr);
                    break;
                };
                let (winner, loser) = if self.arena[other].key < self.arena[curr].key {
                    (other, curr)
                } else {
                    (curr, other)
                };
                self.link(loser, winner);
                links += 1;
                curr = winner;
            }

            // `<=` moves the minimum onto a root that just absorbed the old one.
            let replaces_min = match self.min {
                Some(min) => self.arena[curr].key <= self.arena[min].key,
                None => true,
            };
            if replaces_min {
                self.min = Some(curr);
            }
        }

        trace!(roots = roots.len(), links, slots = table.len(), "fibonacci consolidate");
    }

    /// Makes root `child` a child of root `parent`
    fn link(&mut self, child: NodeKey, parent: NodeKey) {
        self.unlink(child);
        let c = &mut self.arena[child];
        c.parent = Some(parent);
        c.marked = false;

        match self.arena[parent].child {
            Some(first) => self.splice(first, child),
            None => self.arena[parent].child = Some(child),
        }
        let p = &mut self.arena[parent];
        p.degree = checked_increment(p.degree);
    }

    /// Cuts `node` from `parent` and makes it an unmarked root
    fn cut(&mut self, node: NodeKey, parent: NodeKey) {
        let sibling = self.unlink(node);
        let p = &mut self.arena[parent];
        if p.child == Some(node) {
            p.child = sibling;
        }
        p.degree = saturating_decrement(p.degree);

        let n = &mut self.arena[node];
        n.parent = None;
        n.marked = false;
        self.add_root(node);
    }

    fn cascading_cut(&mut self, start: NodeKey) {
        let mut curr = start;
        let mut cuts = 0usize;
        while let Some(parent) = self.arena[curr].parent {
            if !self.arena[curr].marked {
                self.arena[curr].marked = true;
                break;
            }
            self.cut(curr, parent);
            cuts += 1;
            curr = parent;
        }
        if cuts > 0 {
            debug!(cuts, "cascading cut");
        }
    }

    /// Checks ring links, parent links, degrees, heap order, the F(k+2) size
    /// bound, unmarked roots and the cached minimum.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let Some(min) = self.min else {
            return if self.is_empty() {
                Ok(())
            } else {
                Err(InvariantError::StaleMinimum)
            };
        };
        if self.arena.get(min).is_none() {
            return Err(InvariantError::StaleMinimum);
        }

        let roots = self.checked_ring(min)?;
        let mut preorder = Vec::with_capacity(self.len());
        for &root in &roots {
            let node = &self.arena[root];
            if node.parent.is_some() {
                return Err(InvariantError::ParentLink);
            }
            if node.marked {
                return Err(InvariantError::MarkedRoot);
            }
            if node.key < self.arena[min].key {
                return Err(InvariantError::StaleMinimum);
            }

            let mut stack = vec![root];
            while let Some(curr) = stack.pop() {
                preorder.push(curr);
                if preorder.len() > self.len() {
                    return Err(InvariantError::LengthMismatch {
                        reachable: preorder.len(),
                        len: self.len(),
                    });
                }
                let parent = &self.arena[curr];
                let children = match parent.child {
                    Some(first) => self.checked_ring(first)?,
                    None => Vec::new(),
                };
                if children.len() != parent.degree as usize {
                    return Err(InvariantError::DegreeMismatch {
                        recorded: parent.degree,
                        actual: children.len(),
                    });
                }
                for child in children {
                    if self.arena[child].parent != Some(curr) {
                        return Err(InvariantError::ParentLink);
                    }
                    if self.arena[child].key < parent.key {
                        return Err(InvariantError::HeapOrder {
                            parent_rank: parent.degree,
                        });
                    }
                    stack.push(child);
                }
            }
        }

        if preorder.len() != self.len() {
            return Err(InvariantError::LengthMismatch {
                reachable: preorder.len(),
                len: self.len(),
            });
        }

        // Children follow their parent in preorder, so a reverse pass sees
        // every subtree complete before its root.
        let mut sizes: SecondaryMap<NodeKey, usize> = SecondaryMap::with_capacity(preorder.len());
        for &node in preorder.iter().rev() {
            let size = 1 + sizes.get(node).copied().unwrap_or(0);
            sizes.insert(node, size);
            let degree = self.arena[node].degree;
            if size < fibonacci_size_bound(degree) {
                return Err(InvariantError::DegreeBound { degree, nodes: size });
            }
            if let Some(parent) = self.arena[node].parent {
                let below = sizes.get(parent).copied().unwrap_or(0);
                sizes.insert(parent, below + size);
            }
        }
        Ok(())
    }

    /// Ring members with mirrored `next`/`prev` links, bounded by the heap size
    fn checked_ring(&self, start: NodeKey) -> Result<Vec<NodeKey>, InvariantError> {
        let mut out = vec![start];
        let mut curr = start;
        loop {
            let next = self
                .arena
                .get(curr)
                .map(|node| node.next)
                .ok_or(InvariantError::BrokenRing)?;
            if self.arena.get(next).map(|node| node.prev) != Some(curr) {
                return Err(InvariantError::BrokenRing);
            }
            if next == start {
                return Ok(out);
            }
            if out.len() >= self.len() {
                return Err(InvariantError::BrokenRing);
            }
            out.push(next);
            curr = next;
        }
    }

    /// Renders the root ring starting at the minimum
    pub fn pretty(&self) -> String
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        let roots: Vec<(usize, NodeKey)> = match self.min {
            Some(min) => self.ring(min).into_iter().enumerate().collect(),
            None => Vec::new(),
        };
        pretty::render(
            &roots,
            |node| match self.arena[node].child {
                Some(first) => self.ring(first),
                None => Vec::new(),
            },
            |node| {
                let n = &self.arena[node];
                (&n.key, &n.value)
            },
        )
    }
}

impl<K: Ord, V> Default for FibonacciHeap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for FibonacciHeap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut heap = Self::with_capacity(iter.size_hint().0);
        heap.extend(iter);
        heap
    }
}

impl<K: Ord, V> Extend<(K, V)> for FibonacciHeap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for FibonacciHeap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FibonacciHeap")
            .field("len", &self.len())
            .field("min", &self.peek())
            .field("root_degrees", &self.root_degrees())
            .finish()
    }
}
