//! Solution tree recorder (C7): records the chain of rule applications that
//! led to a result, tagging the chain root with success or failure at the
//! end. Grounded on `original_source/.../generator/SolutionTreeGenerator.hpp`'s
//! "chain of solution nodes, tagged at the end, safe on an empty chain" shape,
//! expressed here purely through [`GraphStore`]'s existing primitives (no
//! solution-specific host relation is required beyond what §6 already lists).

use std::collections::HashSet;

use crate::element::{ElementId, ElementType};
use crate::replacements::Binding;
use crate::store::GraphStore;

pub struct SolutionTree {
    root: ElementId,
    last: Option<ElementId>,
}

impl SolutionTree {
    pub fn new(store: &mut dyn GraphStore) -> Self {
        SolutionTree {
            root: store.create_struct_node(),
            last: None,
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Append a solution node linked to `formula`, with the binding's values
    /// attached by variable role, chained after the previous node (or the
    /// root, if this is the first).
    pub fn add_node(&mut self, store: &mut dyn GraphStore, formula: ElementId, binding: &Binding, variables: &HashSet<ElementId>) {
        let node = store.create_struct_node();
        store.create_edge(node, formula, ElementType::COMMON_EDGE);
        for &variable in variables {
            if let Some(&value) = binding.get(&variable) {
                store.create_edge(node, value, ElementType::ACCESS_EDGE);
            }
        }
        let previous = self.last.unwrap_or(self.root);
        store.create_edge(previous, node, ElementType::COMMON_EDGE);
        self.last = Some(node);
    }

    /// Attach the chain to `output_structure` and tag it success/failure.
    /// Safe to call with an empty chain (no `add_node` calls ever made).
    pub fn create_solution(self, store: &mut dyn GraphStore, output_structure: ElementId, target_achieved: bool) -> ElementId {
        store.add_to_structure(output_structure, self.root);
        store.tag_success(self.root, target_achieved);
        self.root
    }
}
