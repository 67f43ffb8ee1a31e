//! Arena node storage shared by every engine
//!
//! Tree nodes link to each other through [`NodeKey`]s into a per-heap
//! [`Arena`] instead of through owning pointers. This lets the Fibonacci
//! heap keep cyclic sibling rings and parent back-links without reference
//! cycles, and lets every engine detect stale handles: slotmap keys are
//! generational, so a key whose node was removed never resolves again.
//!
//! Each arena carries a [`HeapId`] unique to the heap instance that created
//! it. Handles record the id, which is how a handle from an unrelated heap is
//! rejected even when its slot index happens to be live here.

use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::traits::HeapError;

new_key_type! {
    /// Stable index of a node inside an [`Arena`]
    pub struct NodeKey;
}

/// Identity of the heap instance that owns an arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapId(u64);

impl HeapId {
    fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        HeapId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle payload common to every engine: owning heap plus node key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle {
    pub(crate) heap: HeapId,
    pub(crate) node: NodeKey,
}

/// Old-key to new-key translation produced by [`Arena::absorb`]
pub(crate) struct KeyMap(SecondaryMap<NodeKey, NodeKey>);

impl KeyMap {
    /// Translates a key of the absorbed arena. Every absorbed key is present.
    #[inline]
    pub(crate) fn get(&self, old: NodeKey) -> NodeKey {
        self.0[old]
    }

    #[inline]
    pub(crate) fn get_opt(&self, old: Option<NodeKey>) -> Option<NodeKey> {
        old.map(|k| self.get(k))
    }
}

/// Slot-map backed node arena owned by a single heap
#[derive(Debug)]
pub(crate) struct Arena<N> {
    id: HeapId,
    nodes: SlotMap<NodeKey, N>,
}

impl<N> Arena<N> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            id: HeapId::fresh(),
            nodes: SlotMap::with_capacity_and_key(capacity),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn insert(&mut self, node: N) -> NodeKey {
        self.nodes.insert(node)
    }

    /// Inserts a node that needs its own key, e.g. to point a ring at itself
    #[inline]
    pub(crate) fn insert_with_key(&mut self, f: impl FnOnce(NodeKey) -> N) -> NodeKey {
        self.nodes.insert_with_key(f)
    }

    #[inline]
    pub(crate) fn remove(&mut self, key: NodeKey) -> Option<N> {
        self.nodes.remove(key)
    }

    #[inline]
    pub(crate) fn get(&self, key: NodeKey) -> Option<&N> {
        self.nodes.get(key)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &N> {
        self.nodes.values()
    }

    pub(crate) fn handle(&self, node: NodeKey) -> RawHandle {
        RawHandle { heap: self.id, node }
    }

    /// Resolves a handle to a live node of this arena
    pub(crate) fn resolve(&self, handle: &RawHandle) -> Result<NodeKey, HeapError> {
        if handle.heap == self.id && self.nodes.contains_key(handle.node) {
            Ok(handle.node)
        } else {
            Err(HeapError::InvalidHandle)
        }
    }

    /// Moves every node of `other` into this arena.
    ///
    /// Nodes receive new keys, so `relink` is called once per moved node to
    /// rewrite its links through the returned [`KeyMap`].
    pub(crate) fn absorb(
        &mut self,
        other: Arena<N>,
        mut relink: impl FnMut(&mut N, &KeyMap),
    ) -> KeyMap {
        let mut map = SecondaryMap::with_capacity(other.nodes.len());
        self.nodes.reserve(other.nodes.len());
        for (old, node) in other.nodes {
            let new = self.nodes.insert(node);
            map.insert(old, new);
        }
        let map = KeyMap(map);
        for (_, &new) in map.0.iter() {
            relink(&mut self.nodes[new], &map);
        }
        map
    }
}

impl<N> Index<NodeKey> for Arena<N> {
    type Output = N;

    #[inline]
    fn index(&self, key: NodeKey) -> &N {
        &self.nodes[key]
    }
}

impl<N> IndexMut<NodeKey> for Arena<N> {
    #[inline]
    fn index_mut(&mut self, key: NodeKey) -> &mut N {
        &mut self.nodes[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_basic() {
        let mut arena: Arena<i32> = Arena::with_capacity(4);
        let key = arena.insert(42);
        assert_eq!(arena[key], 42);

        arena[key] = 100;
        assert_eq!(arena.get(key), Some(&100));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_handle_becomes_invalid_after_remove() {
        let mut arena: Arena<i32> = Arena::with_capacity(4);
        let key = arena.insert(7);
        let handle = arena.handle(key);

        assert_eq!(arena.resolve(&handle), Ok(key));
        assert_eq!(arena.remove(key), Some(7));
        assert_eq!(arena.resolve(&handle), Err(HeapError::InvalidHandle));

        // The freed slot is reused with a new generation.
        let reused = arena.insert(8);
        assert_ne!(reused, key);
        assert_eq!(arena.resolve(&handle), Err(HeapError::InvalidHandle));
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut a: Arena<i32> = Arena::with_capacity(4);
        let mut b: Arena<i32> = Arena::with_capacity(4);
        let ka = a.insert(1);
        let kb = b.insert(2);

        // Same slot layout, different heaps.
        assert_eq!(a.resolve(&b.handle(kb)), Err(HeapError::InvalidHandle));
        assert_eq!(a.resolve(&a.handle(ka)), Ok(ka));
    }

    #[test]
    fn test_absorb_relinks() {
        // Nodes are (value, link to another node).
        let mut a: Arena<(i32, Option<NodeKey>)> = Arena::with_capacity(4);
        a.insert((0, None));

        let mut b: Arena<(i32, Option<NodeKey>)> = Arena::with_capacity(4);
        let first = b.insert((1, None));
        let second = b.insert((2, Some(first)));

        let map = a.absorb(b, |node, map| node.1 = map.get_opt(node.1));
        assert_eq!(a.len(), 3);

        let new_second = map.get(second);
        let new_first = map.get(first);
        assert_eq!(a[new_second], (2, Some(new_first)));
        assert_eq!(a[new_first], (1, None));
    }
}
