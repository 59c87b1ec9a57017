//! Template searcher family (C3): turns a formula + partial binding into a
//! [`Replacements`] table of every admissible embedding, applying whichever
//! structure-membership policy (spec.md §4.3) the caller configured.

mod filter;

use std::collections::HashSet;

use thiserror::Error;

use crate::element::ElementId;
use crate::lru_cache::LruError;
use crate::policy::{FillingType, ReplacementsUsingType};
use crate::replacements::{self, Binding, Replacements, ReplacementsError};
use crate::store::{GraphStore, StoreError, TemplateElement};

pub use filter::{AccessEdgeOnly, SearchFilter, Unrestricted, WholeStructure};

/// Which membership policy a [`TemplateSearcher`] enforces. Selection mirrors
/// `DirectInferenceManager`'s `searchInKbWhenGenerating` + input-structure
/// presence: no input structures given means [`Unrestricted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchPolicy {
    Unrestricted,
    WholeStructure,
    AccessEdgeOnly,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Lru(#[from] LruError),
    #[error(transparent)]
    Replacements(#[from] ReplacementsError),
}

/// Searches a graph store for embeddings of a formula's template, filtering
/// matches by the configured [`SearchPolicy`] and by content-identity checks
/// on link elements (spec.md §4.3).
pub struct TemplateSearcher {
    filter: Box<dyn SearchFilter>,
    input_structures: Vec<ElementId>,
    replacements_using_type: ReplacementsUsingType,
    filling_type: FillingType,
    arguments: Vec<ElementId>,
}

impl TemplateSearcher {
    pub fn new(policy: SearchPolicy, lru_capacity: usize) -> Result<Self, SearchError> {
        let filter: Box<dyn SearchFilter> = match policy {
            SearchPolicy::Unrestricted => Box::new(Unrestricted),
            SearchPolicy::WholeStructure => Box::new(WholeStructure::new(lru_capacity)?),
            SearchPolicy::AccessEdgeOnly => Box::new(AccessEdgeOnly::new(lru_capacity)?),
        };
        Ok(TemplateSearcher {
            filter,
            input_structures: Vec::new(),
            replacements_using_type: ReplacementsUsingType::All,
            filling_type: FillingType::GeneratedOnly,
            arguments: Vec::new(),
        })
    }

    pub fn set_input_structures(&mut self, structures: Vec<ElementId>) {
        self.input_structures = structures;
    }

    pub fn set_replacements_using_type(&mut self, kind: ReplacementsUsingType) {
        self.replacements_using_type = kind;
    }

    pub fn replacements_using_type(&self) -> ReplacementsUsingType {
        self.replacements_using_type
    }

    pub fn set_output_structure_filling_type(&mut self, kind: FillingType) {
        self.filling_type = kind;
    }

    pub fn output_structure_filling_type(&self) -> FillingType {
        self.filling_type
    }

    pub fn set_arguments(&mut self, arguments: Vec<ElementId>) {
        self.arguments = arguments;
    }

    pub fn add_param(&mut self, element: ElementId) {
        self.arguments.push(element);
    }

    pub fn arguments(&self) -> &[ElementId] {
        &self.arguments
    }

    /// Cleared at the start of each top-level search (spec.md §5) so a stale
    /// positive-membership cache can't outlive the KB state it was built on.
    pub fn clear_cache(&mut self) {
        self.filter.clear();
    }

    pub fn get_variables(&self, store: &dyn GraphStore, formula: ElementId) -> HashSet<ElementId> {
        store.get_variables(formula)
    }

    pub fn get_constants(&self, store: &dyn GraphStore, formula: ElementId) -> HashSet<ElementId> {
        store.get_constants(formula)
    }

    /// Every embedding of `formula` consistent with `binding`, restricted to
    /// `variables` as the output columns.
    pub fn search(
        &mut self,
        store: &dyn GraphStore,
        formula: ElementId,
        binding: &Binding,
        variables: &HashSet<ElementId>,
    ) -> Result<Replacements, SearchError> {
        let allowed: HashSet<ElementId> = variables.union(&store.get_variables(formula)).copied().collect();
        replacements::validate_binding(binding, &allowed)?;
        let template = store.build_template(formula, binding)?;
        let stop_after_first = self.replacements_using_type.stop_after_first();
        let raw = store.search_template(&template, stop_after_first)?;

        let mut accepted = Vec::with_capacity(raw.len());
        // `row` only carries variables the backtrack search discovered fresh;
        // variables already pinned by the caller's `binding` (e.g. the
        // per-argument probe `candidate_bindings` runs) never appear in it.
        // Merge the two so neither the output replacements nor the filter
        // below silently drop a pre-bound variable's value.
        'rows: for row in raw {
            let mut merged = binding.clone();
            merged.extend(row.iter().map(|(&k, &v)| (k, v)));

            // Check membership for every element the template's triples
            // actually resolve to under this row — constants and connecting
            // edges included, not only the matched variables — mirroring
            // `original_source/.../TemplateSearcherInStructures.cpp`'s
            // `HelperSmartSearchTemplate` filter, which tests every item of
            // the matched triple.
            for triple in &template.triples {
                for position in [triple.source, triple.connector, triple.target] {
                    let value = match position {
                        TemplateElement::Const(value) => value,
                        TemplateElement::Var(variable) => match merged.get(&variable) {
                            Some(&value) => value,
                            None => continue 'rows,
                        },
                    };
                    let element_type = store.element_type(value);
                    if !self
                        .filter
                        .accepts(store, value, element_type, &self.input_structures)
                    {
                        continue 'rows;
                    }
                }
            }
            if template.with_links {
                for (variable, expected) in &template.link_checks {
                    if let Some(&value) = merged.get(variable) {
                        if store.get_link_content(value).as_deref() != Some(expected.as_str()) {
                            continue 'rows;
                        }
                    }
                }
            }
            accepted.push(merged);
            if stop_after_first {
                break;
            }
        }

        let keys: Vec<ElementId> = variables.iter().copied().collect();
        Ok(Replacements::from_bindings(&keys, &accepted))
    }

    /// Search once per candidate binding, unioning the results column-wise
    /// (used by the template manager when enumerating argument combinations).
    pub fn search_many(
        &mut self,
        store: &dyn GraphStore,
        formula: ElementId,
        bindings: &[Binding],
        variables: &HashSet<ElementId>,
    ) -> Result<Replacements, SearchError> {
        let mut accumulated = Replacements::new();
        for binding in bindings {
            let found = self.search(store, formula, binding, variables)?;
            accumulated = crate::replacements::unite(&accumulated, &found);
            if self.replacements_using_type.stop_after_first() && accumulated.columns() > 0 {
                break;
            }
        }
        Ok(accumulated)
    }
}
