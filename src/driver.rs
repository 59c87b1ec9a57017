//! Inference driver (C8): iterates priority-ordered rule sets, invoking the
//! expression tree built for each rule's main formula, restarting at the
//! top-priority set after any successful generation, until the target is
//! satisfied or every rule set is exhausted without producing anything new.
//!
//! Grounded on `original_source/.../manager/DirectInferenceManager.cpp`'s
//! `applyInference`/`useFormula`: the `indexOfFormulaSet = -1` restart (here,
//! resetting a `usize` index via a sentinel rather than relying on signed
//! wraparound) and the "check target before entering the rule-set loop"
//! early return are carried over verbatim; `add_node(formula, binding,
//! variables)` replaces the original's empty-params solution node with the
//! richer recording spec.md §4.6 calls for.

use log::{debug, trace};

use crate::element::ElementId;
use crate::errors::InferenceError;
use crate::expr_tree::{self, EvalContext};
use crate::policy::{FillingType, GenerationType, ReplacementsUsingType};
use crate::replacements::Replacements;
use crate::searcher::{SearchPolicy, TemplateSearcher};
use crate::solution::SolutionTree;
use crate::store::GraphStore;
use crate::template_manager::TemplateManager;

/// Flow configuration for one `apply_inference` call (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceFlowConfig {
    /// Whether the driver should build and attach a solution tree at all, or
    /// skip straight to a success/failure verdict with an empty chain.
    pub generate_solution_tree: bool,
    /// Enables the atom's "search without replacements" pre-generation probe
    /// (spec.md §9 open question — the "with" variant is the specified
    /// default).
    pub search_in_kb_when_generating: bool,
    /// `REPLACEMENTS_ALL` when true, `REPLACEMENTS_FIRST` when false.
    pub replacements_all: bool,
}

impl Default for InferenceFlowConfig {
    fn default() -> Self {
        InferenceFlowConfig {
            generate_solution_tree: true,
            search_in_kb_when_generating: true,
            replacements_all: true,
        }
    }
}

impl InferenceFlowConfig {
    fn replacements_using_type(self) -> ReplacementsUsingType {
        if self.replacements_all {
            ReplacementsUsingType::All
        } else {
            ReplacementsUsingType::First
        }
    }
}

/// Owns the per-invocation policy (LRU cap, generation/filling type) that
/// the searcher and template manager are configured with. One driver
/// instance corresponds to one `apply_inference` call in spec.md's lifecycle
/// model (§5): nothing here is shared across invocations.
pub struct InferenceDriver {
    lru_capacity: usize,
    generation_type: GenerationType,
    filling_type: FillingType,
}

impl InferenceDriver {
    pub fn new(lru_capacity: usize) -> Self {
        InferenceDriver {
            lru_capacity,
            generation_type: GenerationType::GenerateUniqueFormulas,
            filling_type: FillingType::GeneratedOnly,
        }
    }

    pub fn with_generation_type(mut self, generation_type: GenerationType) -> Self {
        self.generation_type = generation_type;
        self
    }

    pub fn with_filling_type(mut self, filling_type: FillingType) -> Self {
        self.filling_type = filling_type;
        self
    }

    /// Whether `target` is satisfiable by some binding of `argument_vector`
    /// without applying any rule — spec.md §4.7 step 3 / §8 property 11.
    fn is_target_achieved(
        &self,
        store: &mut dyn GraphStore,
        searcher: &mut TemplateSearcher,
        target: ElementId,
        argument_vector: &[ElementId],
    ) -> Result<bool, InferenceError> {
        let variables = store.get_variables(target);
        if argument_vector.is_empty() {
            let replacements = searcher.search(store, target, &crate::replacements::Binding::new(), &variables)?;
            return Ok(replacements.columns() > 0);
        }
        let manager = TemplateManager::new(self.generation_type);
        let bindings = manager.candidate_bindings(store, searcher, target, argument_vector);
        for binding in &bindings {
            let replacements = searcher.search(store, target, binding, &variables)?;
            if replacements.columns() > 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Entry point matching spec.md §6's invocation shape: target, formula
    /// set, arguments, input structures, flow config -> solution element.
    pub fn apply_inference(
        &self,
        store: &mut dyn GraphStore,
        target: ElementId,
        formulas_set: ElementId,
        arguments: ElementId,
        input_structure: Option<ElementId>,
        flow: InferenceFlowConfig,
    ) -> Result<ElementId, InferenceError> {
        let output_structure = store.create_struct_node();
        let argument_vector = store.elements_of_type_in(arguments, crate::element::ElementType::NODE);

        let policy = if input_structure.is_some() {
            SearchPolicy::WholeStructure
        } else {
            SearchPolicy::Unrestricted
        };
        let mut searcher = TemplateSearcher::new(policy, self.lru_capacity)?;
        if let Some(structure) = input_structure {
            searcher.set_input_structures(vec![structure]);
        }
        searcher.set_arguments(argument_vector.clone());
        searcher.set_replacements_using_type(flow.replacements_using_type());
        searcher.set_output_structure_filling_type(self.filling_type);

        let manager = TemplateManager::new(self.generation_type);
        let mut solution = SolutionTree::new(store);

        let mut target_achieved = self.is_target_achieved(store, &mut searcher, target, &argument_vector)?;
        if target_achieved {
            debug!("target already achieved before any rule fires");
            return Ok(solution.create_solution(store, output_structure, target_achieved));
        }

        let rule_sets = store.priority_rule_sets(formulas_set);
        if rule_sets.is_empty() {
            return Err(InferenceError::ItemNotFound(formulas_set));
        }

        debug!("starting rule application across {} rule sets", rule_sets.len());

        let mut set_index: usize = 0;
        'outer: while set_index < rule_sets.len() {
            let rules = rule_sets[set_index].clone();
            trace!("trying rule set {} ({} rules)", set_index + 1, rules.len());

            for rule in rules {
                let Some(main_formula) = store.main_formula_of_rule(rule) else {
                    continue;
                };

                searcher.clear_cache();
                let mut tree = expr_tree::build(store, main_formula);
                let variables = store.get_variables(main_formula);

                let mut ctx = EvalContext {
                    store: &mut *store,
                    searcher: &mut searcher,
                    manager: &manager,
                    output_structure: Some(output_structure),
                    arguments: argument_vector.clone(),
                    search_in_kb_when_generating: flow.search_in_kb_when_generating,
                };

                let result = tree.compute(&mut ctx, &Replacements::unconstrained())?;
                trace!("rule {:?} generated = {}", rule, result.is_generated);

                if result.is_generated {
                    if flow.generate_solution_tree {
                        solution.add_node(store, main_formula, &result.replacements.to_param_bindings().first().cloned().unwrap_or_default(), &variables);
                    }
                    target_achieved = self.is_target_achieved(store, &mut searcher, target, &argument_vector)?;
                    if target_achieved {
                        debug!("target achieved after rule {:?}", rule);
                        break 'outer;
                    }
                    set_index = 0;
                    continue 'outer;
                }
            }
            set_index += 1;
        }

        Ok(solution.create_solution(store, output_structure, target_achieved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::store::memory::MemoryStore;
    use crate::store::{TemplateElement, TemplateTriple};

    /// A lower-priority rule set's conclusion feeds a higher-priority rule
    /// set's premise, so the target can only be reached by firing set 0,
    /// restarting at set 0 (which now fails, already-generated), then falling
    /// through to set 1 — the priority-restart loop spec.md §4.7 describes.
    #[test]
    fn restarts_at_highest_priority_set_after_each_generation() {
        let mut store = MemoryStore::new();
        let is_a = store.create_node(ElementType::NODE | ElementType::CONST);
        let candidate_class = store.create_node(ElementType::NODE | ElementType::CONST);
        let intermediate_class = store.create_node(ElementType::NODE | ElementType::CONST);
        let target_class = store.create_node(ElementType::NODE | ElementType::CONST);
        let dog = store.create_node(ElementType::NODE | ElementType::CONST);
        store.assert_fact(dog, is_a, candidate_class);

        let x = store.new_variable();
        let premise_0 = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(candidate_class),
        }]);
        let conclusion_0 = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(intermediate_class),
        }]);
        let rule_0_formula = store.define_implication(premise_0, conclusion_0);
        let rule_0 = store.define_rule(rule_0_formula);

        let premise_1 = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(intermediate_class),
        }]);
        let conclusion_1 = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(target_class),
        }]);
        let rule_1_formula = store.define_implication(premise_1, conclusion_1);
        let rule_1 = store.define_rule(rule_1_formula);

        let rule_set = store.define_rule_priority_list(vec![vec![rule_0], vec![rule_1]]);
        let arguments = store.define_argument_set(vec![dog]);

        let driver = InferenceDriver::new(64);
        let target = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Const(dog),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(target_class),
        }]);
        driver
            .apply_inference(&mut store, target, rule_set, arguments, None, InferenceFlowConfig::default())
            .expect("inference should not error");

        assert!(store.edge_exists(dog, is_a, intermediate_class));
        assert!(store.edge_exists(dog, is_a, target_class));
    }

    #[test]
    fn missing_rule_set_is_reported_as_item_not_found() {
        let mut store = MemoryStore::new();
        let is_a = store.create_node(ElementType::NODE | ElementType::CONST);
        let target_class = store.create_node(ElementType::NODE | ElementType::CONST);
        let dog = store.create_node(ElementType::NODE | ElementType::CONST);
        let x = store.new_variable();
        let target = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(target_class),
        }]);
        let empty_rule_set = store.define_rule_priority_list(vec![]);
        let arguments = store.define_argument_set(vec![dog]);

        let driver = InferenceDriver::new(64);
        let err = driver
            .apply_inference(&mut store, target, empty_rule_set, arguments, None, InferenceFlowConfig::default())
            .unwrap_err();
        assert!(matches!(err, InferenceError::ItemNotFound(_)));
    }
}
