//! Template manager (C4): turns a flat argument list into candidate parameter
//! bindings for a formula's free variables, and carries the generation-policy
//! flag the expression tree (C6) consults when evaluating atoms.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;

use crate::element::{ElementId, ElementType};
use crate::policy::GenerationType;
use crate::replacements::Binding;
use crate::searcher::{SearchError, TemplateSearcher};
use crate::store::GraphStore;

#[derive(Debug, Error)]
pub enum TemplateManagerError {
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// A variable is a candidate for an argument when either side declares no
/// node/edge constraint, or both agree on node-vs-edge.
fn type_compatible(argument_type: ElementType, variable_type: ElementType) -> bool {
    let constrained = variable_type.is_node() || variable_type.is_edge();
    if !constrained {
        return true;
    }
    variable_type.is_node() == argument_type.is_node()
        && variable_type.is_edge() == argument_type.is_edge()
}

pub struct TemplateManager {
    generation_type: GenerationType,
}

impl TemplateManager {
    pub fn new(generation_type: GenerationType) -> Self {
        TemplateManager { generation_type }
    }

    pub fn generation_type(&self) -> GenerationType {
        self.generation_type
    }

    pub fn set_generation_type(&mut self, generation_type: GenerationType) {
        self.generation_type = generation_type;
    }

    /// Enumerate `formula`'s free variables via the searcher, then build the
    /// Cartesian product of type-consistent argument assignments, deduplicated.
    pub fn candidate_bindings(
        &self,
        store: &dyn GraphStore,
        searcher: &TemplateSearcher,
        formula: ElementId,
        arguments: &[ElementId],
    ) -> Vec<Binding> {
        let variables: Vec<ElementId> = {
            let set: HashSet<ElementId> = searcher.get_variables(store, formula);
            set.into_iter().collect()
        };
        if variables.is_empty() {
            return vec![Binding::new()];
        }

        let mut bindings: Vec<Binding> = vec![Binding::new()];
        for &variable in &variables {
            let variable_type = store.element_type(variable);
            let candidates: Vec<ElementId> = arguments
                .iter()
                .copied()
                .filter(|&argument| type_compatible(store.element_type(argument), variable_type))
                .collect();
            if candidates.is_empty() {
                return Vec::new();
            }
            let mut next = Vec::with_capacity(bindings.len() * candidates.len());
            for existing in &bindings {
                for &candidate in &candidates {
                    let mut extended = existing.clone();
                    extended.insert(variable, candidate);
                    next.push(extended);
                }
            }
            bindings = next;
        }

        dedup_bindings(bindings)
    }
}

fn dedup_bindings(bindings: Vec<Binding>) -> Vec<Binding> {
    let mut seen: HashSet<Vec<(ElementId, ElementId)>> = HashSet::new();
    let mut result = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let key: BTreeSet<(ElementId, ElementId)> = binding.iter().map(|(&k, &v)| (k, v)).collect();
        let key: Vec<(ElementId, ElementId)> = key.into_iter().collect();
        if seen.insert(key) {
            result.push(binding);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searcher::SearchPolicy;
    use crate::store::memory::MemoryStore;
    use crate::store::TemplateTriple;

    #[test]
    fn enumerates_type_consistent_cartesian_product() {
        let mut store = MemoryStore::new();
        let relation = store.create_node(ElementType::NODE | ElementType::CONST);
        let x = store.new_variable();
        let y = store.new_variable();
        let formula = store.define_atomic_formula(vec![TemplateTriple {
            source: crate::store::TemplateElement::Var(x),
            connector: crate::store::TemplateElement::Const(relation),
            target: crate::store::TemplateElement::Var(y),
        }]);

        let alice = store.create_node(ElementType::NODE | ElementType::CONST);
        let bob = store.create_node(ElementType::NODE | ElementType::CONST);

        let searcher = TemplateSearcher::new(SearchPolicy::Unrestricted, 8).unwrap();
        let manager = TemplateManager::new(GenerationType::GenerateAll);
        let bindings = manager.candidate_bindings(&store, &searcher, formula, &[alice, bob]);

        // x and y are both node-typed (no finer declared constraint), so the
        // full 2x2 Cartesian product survives.
        assert_eq!(bindings.len(), 4);
    }

    #[test]
    fn no_candidates_for_a_variable_yields_no_bindings() {
        let mut store = MemoryStore::new();
        let relation = store.create_node(ElementType::NODE | ElementType::CONST);
        let x = store.new_variable();
        let formula = store.define_atomic_formula(vec![TemplateTriple {
            source: crate::store::TemplateElement::Var(x),
            connector: crate::store::TemplateElement::Const(relation),
            target: crate::store::TemplateElement::Const(relation),
        }]);

        let searcher = TemplateSearcher::new(SearchPolicy::Unrestricted, 8).unwrap();
        let manager = TemplateManager::new(GenerationType::GenerateAll);
        let bindings = manager.candidate_bindings(&store, &searcher, formula, &[]);
        assert!(bindings.is_empty());
    }
}
