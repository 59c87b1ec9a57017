//! N-ary conjunction: intersect on find, thread-and-generate left to right
//! with find-only children reordered first (spec.md §4.5, design notes §9).

use crate::replacements::{intersect, Binding, Replacements};

use super::{EvalContext, ExpressionError, ExpressionNode, LogicFormulaResult};

pub struct ConjunctionNode {
    operands: Vec<Box<dyn ExpressionNode>>,
}

impl ConjunctionNode {
    pub fn new(operands: Vec<Box<dyn ExpressionNode>>) -> Self {
        ConjunctionNode { operands }
    }

    /// Stable left-to-right among generators, but find-only children first
    /// (design notes §9: tie-break among generators is unspecified by
    /// source behavior, so a plain stable sort on the find-only flag is the
    /// simplest faithful choice).
    fn generation_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.operands.len()).collect();
        order.sort_by_key(|&i| self.operands[i].is_find_only() as u8 ^ 1);
        order
    }
}

impl ExpressionNode for ConjunctionNode {
    fn check(&mut self, ctx: &mut EvalContext, binding: &Binding) -> Result<LogicFormulaResult, ExpressionError> {
        let mut truth = true;
        for operand in &mut self.operands {
            if !operand.check(ctx, binding)?.truth {
                truth = false;
                break;
            }
        }
        Ok(LogicFormulaResult {
            truth,
            is_generated: false,
            replacements: Replacements::new(),
        })
    }

    /// Children are threaded via `compute`, not `find`, so an atom with no
    /// upstream bindings can still bootstrap off the argument vector
    /// (spec.md §4.5) when this conjunction sits under an implication's
    /// `generate`. `find` keeps its own strict never-generates recursion
    /// below.
    fn compute(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let mut accumulated = input.clone();
        for operand in &mut self.operands {
            let out = operand.compute(ctx, &accumulated)?;
            if !out.truth {
                return Ok(LogicFormulaResult::failure());
            }
            accumulated = intersect(&accumulated, &out.replacements);
        }
        Ok(LogicFormulaResult {
            truth: true,
            is_generated: false,
            replacements: accumulated,
        })
    }

    fn find(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let mut accumulated = input.clone();
        for operand in &mut self.operands {
            let out = operand.find(ctx, &accumulated)?;
            if !out.truth {
                return Ok(LogicFormulaResult::failure());
            }
            accumulated = intersect(&accumulated, &out.replacements);
        }
        Ok(LogicFormulaResult {
            truth: true,
            is_generated: false,
            replacements: accumulated,
        })
    }

    fn generate(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let order = self.generation_order();
        let mut current = input.clone();
        let mut any_generated = false;
        for index in order {
            let out = self.operands[index].generate(ctx, &current)?;
            if !out.truth {
                return Ok(LogicFormulaResult {
                    truth: false,
                    is_generated: any_generated,
                    replacements: Replacements::new(),
                });
            }
            any_generated |= out.is_generated;
            current = out.replacements;
        }
        Ok(LogicFormulaResult {
            truth: true,
            is_generated: any_generated,
            replacements: current,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementId, ElementType};
    use crate::expr_tree::{build, EvalContext};
    use crate::policy::GenerationType;
    use crate::searcher::{SearchPolicy, TemplateSearcher};
    use crate::store::memory::MemoryStore;
    use crate::store::{GraphStore, TemplateElement, TemplateTriple};
    use crate::template_manager::TemplateManager;

    fn setup() -> (MemoryStore, ElementId, ElementId, ElementId, ElementId, ElementId) {
        let mut store = MemoryStore::new();
        let is_a = store.create_node(ElementType::NODE | ElementType::CONST);
        let has_trait = store.create_node(ElementType::NODE | ElementType::CONST);
        let candidate_class = store.create_node(ElementType::NODE | ElementType::CONST);
        let four_legs = store.create_node(ElementType::NODE | ElementType::CONST);
        let dog = store.create_node(ElementType::NODE | ElementType::CONST);
        store.assert_fact(dog, is_a, candidate_class);
        store.assert_fact(dog, has_trait, four_legs);
        (store, is_a, has_trait, candidate_class, four_legs, dog)
    }

    #[test]
    fn compute_intersects_both_conjuncts() {
        let (mut store, is_a, has_trait, candidate_class, four_legs, dog) = setup();
        let x = store.new_variable();

        let atom_candidate = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(candidate_class),
        }]);
        let atom_trait = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(has_trait),
            target: TemplateElement::Const(four_legs),
        }]);

        let conjunction_formula = store.define_conjunction(vec![atom_candidate, atom_trait]);
        let mut tree = build(&store, conjunction_formula);
        let mut searcher = TemplateSearcher::new(SearchPolicy::Unrestricted, 8).unwrap();
        let manager = TemplateManager::new(GenerationType::GenerateUniqueFormulas);
        let mut ctx = EvalContext {
            store: &mut store,
            searcher: &mut searcher,
            manager: &manager,
            output_structure: None,
            arguments: vec![dog],
            search_in_kb_when_generating: true,
        };

        let result = tree.compute(&mut ctx, &crate::replacements::Replacements::unconstrained()).unwrap();
        assert!(result.truth);
        assert_eq!(result.replacements.value_at(x, 0), Some(dog));
    }

    #[test]
    fn compute_fails_when_one_conjunct_has_no_match() {
        let (mut store, is_a, has_trait, candidate_class, _four_legs, _dog) = setup();
        let x = store.new_variable();
        let unrelated_target = store.create_node(ElementType::NODE | ElementType::CONST);
        let atom_candidate = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(candidate_class),
        }]);
        let atom_never_matches = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(has_trait),
            target: TemplateElement::Const(unrelated_target),
        }]);

        let conjunction_formula = store.define_conjunction(vec![atom_candidate, atom_never_matches]);
        let mut tree = build(&store, conjunction_formula);
        let mut searcher = TemplateSearcher::new(SearchPolicy::Unrestricted, 8).unwrap();
        let manager = TemplateManager::new(GenerationType::GenerateUniqueFormulas);
        let mut ctx = EvalContext {
            store: &mut store,
            searcher: &mut searcher,
            manager: &manager,
            output_structure: None,
            arguments: Vec::new(),
            search_in_kb_when_generating: true,
        };

        let result = tree
            .compute(&mut ctx, &crate::replacements::Replacements::unconstrained())
            .unwrap();
        assert!(!result.truth);
    }
}
