//! The three search-filtering policies (spec.md §4.3), modeled as an
//! abstract contract (design notes §9: "a simple virtual-call pattern or
//! enum+match works equally well" — here a small trait, since the LRU cache
//! only two of the three variants need is naturally per-impl state).

use crate::element::ElementId;
use crate::element::ElementType;
use crate::lru_cache::LruElementSet;
use crate::store::GraphStore;

pub trait SearchFilter {
    /// Whether `element` (looked up as `element_type`) is admissible given
    /// the declared `input_structures`.
    fn accepts(
        &mut self,
        store: &dyn GraphStore,
        element: ElementId,
        element_type: ElementType,
        input_structures: &[ElementId],
    ) -> bool;

    /// Cleared at the start of each top-level search to avoid staleness if
    /// the KB changed since the previous invocation (spec.md §5).
    fn clear(&mut self) {}
}

/// Any embedding is valid.
#[derive(Default)]
pub struct Unrestricted;

impl SearchFilter for Unrestricted {
    fn accepts(&mut self, _: &dyn GraphStore, _: ElementId, _: ElementType, _: &[ElementId]) -> bool {
        true
    }
}

/// Every matched element must belong to at least one declared input
/// structure. Uses an [`LruElementSet`] as a positive-membership cache
/// across repeated tests during one search.
pub struct WholeStructure {
    lru: LruElementSet,
}

impl WholeStructure {
    pub fn new(lru_capacity: usize) -> Result<Self, crate::lru_cache::LruError> {
        Ok(WholeStructure {
            lru: LruElementSet::new(lru_capacity)?,
        })
    }
}

impl SearchFilter for WholeStructure {
    fn accepts(
        &mut self,
        store: &dyn GraphStore,
        element: ElementId,
        _element_type: ElementType,
        input_structures: &[ElementId],
    ) -> bool {
        if self.lru.contains(element) {
            return true;
        }
        let found = input_structures
            .iter()
            .any(|&structure| store.is_member_of_structure(element, structure));
        if found {
            self.lru.insert(element);
        }
        found
    }

    fn clear(&mut self) {
        self.lru.clear();
    }
}

/// Non-edge elements are always admissible; edge elements must belong to at
/// least one input structure.
pub struct AccessEdgeOnly {
    lru: LruElementSet,
}

impl AccessEdgeOnly {
    pub fn new(lru_capacity: usize) -> Result<Self, crate::lru_cache::LruError> {
        Ok(AccessEdgeOnly {
            lru: LruElementSet::new(lru_capacity)?,
        })
    }
}

impl SearchFilter for AccessEdgeOnly {
    fn accepts(
        &mut self,
        store: &dyn GraphStore,
        element: ElementId,
        element_type: ElementType,
        input_structures: &[ElementId],
    ) -> bool {
        if !element_type.is_edge() {
            return true;
        }
        if self.lru.contains(element) {
            return true;
        }
        let found = input_structures
            .iter()
            .any(|&structure| store.is_member_of_structure(element, structure));
        if found {
            self.lru.insert(element);
        }
        found
    }

    fn clear(&mut self) {
        self.lru.clear();
    }
}
