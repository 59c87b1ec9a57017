//! N-ary disjunction: union on find, truth is logical OR (spec.md §4.5).

use crate::replacements::{unite, Binding, Replacements};

use super::{EvalContext, ExpressionError, ExpressionNode, LogicFormulaResult};

pub struct DisjunctionNode {
    operands: Vec<Box<dyn ExpressionNode>>,
}

impl DisjunctionNode {
    pub fn new(operands: Vec<Box<dyn ExpressionNode>>) -> Self {
        DisjunctionNode { operands }
    }
}

impl ExpressionNode for DisjunctionNode {
    fn check(&mut self, ctx: &mut EvalContext, binding: &Binding) -> Result<LogicFormulaResult, ExpressionError> {
        let mut truth = false;
        for operand in &mut self.operands {
            if operand.check(ctx, binding)?.truth {
                truth = true;
                break;
            }
        }
        Ok(LogicFormulaResult {
            truth,
            is_generated: false,
            replacements: Replacements::new(),
        })
    }

    /// Children via `compute`, for the same argument-bootstrap reason as
    /// `ConjunctionNode::compute`.
    fn compute(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let mut truth = false;
        let mut accumulated = Replacements::new();
        for operand in &mut self.operands {
            let out = operand.compute(ctx, input)?;
            if out.truth {
                truth = true;
            }
            accumulated = unite(&accumulated, &out.replacements);
        }
        Ok(LogicFormulaResult {
            truth,
            is_generated: false,
            replacements: accumulated,
        })
    }

    fn find(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let mut truth = false;
        let mut accumulated = Replacements::new();
        for operand in &mut self.operands {
            let out = operand.find(ctx, input)?;
            if out.truth {
                truth = true;
            }
            accumulated = unite(&accumulated, &out.replacements);
        }
        Ok(LogicFormulaResult {
            truth,
            is_generated: false,
            replacements: accumulated,
        })
    }

    fn generate(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let mut truth = false;
        let mut any_generated = false;
        let mut accumulated = Replacements::new();
        for operand in &mut self.operands {
            let out = operand.generate(ctx, input)?;
            if out.truth {
                truth = true;
            }
            any_generated |= out.is_generated;
            accumulated = unite(&accumulated, &out.replacements);
        }
        Ok(LogicFormulaResult {
            truth,
            is_generated: any_generated,
            replacements: accumulated,
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

    fn setup() -> (MemoryStore, ElementId, ElementId, ElementId, ElementId) {
        let mut store = MemoryStore::new();
        let is_a = store.create_node(ElementType::NODE | ElementType::CONST);
        let cat_class = store.create_node(ElementType::NODE | ElementType::CONST);
        let dog_class = store.create_node(ElementType::NODE | ElementType::CONST);
        let dog = store.create_node(ElementType::NODE | ElementType::CONST);
        store.assert_fact(dog, is_a, dog_class);
        (store, is_a, cat_class, dog_class, dog)
    }

    #[test]
    fn compute_is_true_when_only_one_branch_matches() {
        let (mut store, is_a, cat_class, dog_class, dog) = setup();
        let x = store.new_variable();

        let atom_cat = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(cat_class),
        }]);
        let atom_dog = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(dog_class),
        }]);
        let disjunction_formula = store.define_disjunction(vec![atom_cat, atom_dog]);
        let mut tree = build(&store, disjunction_formula);
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
    fn compute_is_false_when_no_branch_matches() {
        let (mut store, is_a, cat_class, _dog_class, _dog) = setup();
        let x = store.new_variable();
        let unrelated = store.create_node(ElementType::NODE | ElementType::CONST);

        let atom_cat = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(cat_class),
        }]);
        let atom_never_matches = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(unrelated),
        }]);
        let disjunction_formula = store.define_disjunction(vec![atom_cat, atom_never_matches]);
        let mut tree = build(&store, disjunction_formula);
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

        let result = tree.compute(&mut ctx, &crate::replacements::Replacements::unconstrained()).unwrap();
        assert!(!result.truth);
    }
}
