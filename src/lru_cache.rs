//! Bounded recency cache of element identifiers ([`LruElementSet`]).
//!
//! Grounded on `original_source/.../model/LRUScAddrSet.{hpp,cpp}`: a doubly
//! linked list of elements plus a hashmap from element to its list position,
//! so both `contains` and `insert` promote to most-recently-used in O(1)
//! amortized time. The C++ original backs the list with `std::list<ScAddr>`
//! and an iterator-valued map; here the list is a slab (`Vec<Node>`) addressed
//! by index, since Rust iterators into a mutating `Vec` don't stay valid the
//! way C++ `std::list` iterators do.

use std::collections::HashMap;

use thiserror::Error;

use crate::element::ElementId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LruError {
    #[error("LRU element set capacity must be >= 1, got {0}")]
    ZeroCapacity(usize),
}

const NONE: usize = usize::MAX;

struct Node {
    element: ElementId,
    prev: usize,
    next: usize,
}

/// Bounded recency cache of element identifiers. `insert` and `contains` both
/// count as a use; inserting into a full cache evicts the least-recently-used
/// entry first.
pub struct LruElementSet {
    max_size: usize,
    slab: Vec<Node>,
    free: Vec<usize>,
    index: HashMap<ElementId, usize>,
    head: usize,
    tail: usize,
}

impl LruElementSet {
    pub fn new(max_size: usize) -> Result<Self, LruError> {
        if max_size == 0 {
            return Err(LruError::ZeroCapacity(max_size));
        }
        Ok(LruElementSet {
            max_size,
            slab: Vec::with_capacity(max_size),
            free: Vec::new(),
            index: HashMap::with_capacity(max_size),
            head: NONE,
            tail: NONE,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns true if present, promoting it to most-recently-used on hit.
    pub fn contains(&mut self, element: ElementId) -> bool {
        match self.index.get(&element).copied() {
            Some(slot) => {
                self.move_to_front(slot);
                true
            }
            None => false,
        }
    }

    /// Insert an element, promoting it if already present. Evicts the
    /// least-recently-used entry before insertion if the cache is full.
    pub fn insert(&mut self, element: ElementId) {
        if let Some(&slot) = self.index.get(&element) {
            self.move_to_front(slot);
            return;
        }
        if self.index.len() >= self.max_size {
            self.evict_lru();
        }
        let slot = self.push_front_new(element);
        self.index.insert(element, slot);
    }

    pub fn clear(&mut self) {
        self.slab.clear();
        self.free.clear();
        self.index.clear();
        self.head = NONE;
        self.tail = NONE;
    }

    fn detach(&mut self, slot: usize) {
        let (prev, next) = (self.slab[slot].prev, self.slab[slot].next);
        if prev != NONE {
            self.slab[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NONE {
            self.slab[next].prev = prev;
        } else {
            self.tail = prev;
        }
    }

    fn attach_front(&mut self, slot: usize) {
        self.slab[slot].prev = NONE;
        self.slab[slot].next = self.head;
        if self.head != NONE {
            self.slab[self.head].prev = slot;
        }
        self.head = slot;
        if self.tail == NONE {
            self.tail = slot;
        }
    }

    fn move_to_front(&mut self, slot: usize) {
        if self.head == slot {
            return;
        }
        self.detach(slot);
        self.attach_front(slot);
    }

    fn push_front_new(&mut self, element: ElementId) -> usize {
        let node = Node {
            element,
            prev: NONE,
            next: NONE,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slab[slot] = node;
                slot
            }
            None => {
                self.slab.push(node);
                self.slab.len() - 1
            }
        };
        self.attach_front(slot);
        slot
    }

    fn evict_lru(&mut self) {
        let slot = self.tail;
        if slot == NONE {
            return;
        }
        self.detach(slot);
        let element = self.slab[slot].element;
        self.index.remove(&element);
        self.free.push(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(n: u64) -> ElementId {
        ElementId::new(n)
    }

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(LruElementSet::new(0), Err(LruError::ZeroCapacity(0)));
    }

    #[test]
    fn eviction_drops_least_recently_used() {
        let mut cache = LruElementSet::new(3).unwrap();
        cache.insert(e(1));
        cache.insert(e(2));
        cache.insert(e(3));
        cache.insert(e(4));
        assert!(!cache.contains(e(1)));
        assert!(cache.contains(e(2)));
        assert!(cache.contains(e(3)));
        assert!(cache.contains(e(4)));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn contains_hit_promotes_to_mru() {
        let mut cache = LruElementSet::new(3).unwrap();
        cache.insert(e(1));
        cache.insert(e(2));
        cache.insert(e(3));
        // touch 1, making 2 the LRU
        assert!(cache.contains(e(1)));
        cache.insert(e(4));
        assert!(!cache.contains(e(2)));
        assert!(cache.contains(e(1)));
        assert!(cache.contains(e(3)));
        assert!(cache.contains(e(4)));
    }

    #[test]
    fn clear_empties_the_set() {
        let mut cache = LruElementSet::new(2).unwrap();
        cache.insert(e(1));
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert!(!cache.contains(e(1)));
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut cache = LruElementSet::new(5).unwrap();
        for i in 0..100 {
            cache.insert(e(i));
        }
        assert_eq!(cache.len(), 5);
    }
}
