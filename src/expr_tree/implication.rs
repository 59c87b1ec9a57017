//! Implication (premise -> conclusion) and equivalence (both directions),
//! spec.md §4.5. The driver evaluates a rule's main formula — typically an
//! implication — via `generate`: a false premise is vacuous success without
//! touching the KB; a true premise attempts to generate the conclusion.

use crate::replacements::{intersect, Binding, Replacements};

use super::{EvalContext, ExpressionError, ExpressionNode, LogicFormulaResult};

pub struct ImplicationNode {
    premise: Box<dyn ExpressionNode>,
    conclusion: Box<dyn ExpressionNode>,
}

impl ImplicationNode {
    pub fn new(premise: Box<dyn ExpressionNode>, conclusion: Box<dyn ExpressionNode>) -> Self {
        ImplicationNode { premise, conclusion }
    }
}

impl ExpressionNode for ImplicationNode {
    fn check(&mut self, ctx: &mut EvalContext, binding: &Binding) -> Result<LogicFormulaResult, ExpressionError> {
        let premise_result = self.premise.check(ctx, binding)?;
        if !premise_result.truth {
            return Ok(LogicFormulaResult {
                truth: true,
                is_generated: false,
                replacements: Replacements::new(),
            });
        }
        let conclusion_result = self.conclusion.check(ctx, binding)?;
        Ok(LogicFormulaResult {
            truth: conclusion_result.truth,
            is_generated: false,
            replacements: Replacements::new(),
        })
    }

    /// A rule's root is typically an implication, so this is where
    /// generation actually gets triggered from the driver's top-level
    /// `compute` call: a false premise is vacuous success, a true premise
    /// attempts to generate the conclusion (spec.md §4.5) — unlike every
    /// other node kind, whose `compute` is a pure find with no side effect.
    fn compute(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        self.generate(ctx, input)
    }

    fn find(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let premise_result = self.premise.find(ctx, input)?;
        if !premise_result.truth {
            return Ok(LogicFormulaResult {
                truth: true,
                is_generated: false,
                replacements: input.clone(),
            });
        }
        let conclusion_result = self.conclusion.find(ctx, &premise_result.replacements)?;
        Ok(LogicFormulaResult {
            truth: conclusion_result.truth,
            is_generated: false,
            replacements: conclusion_result.replacements,
        })
    }

    fn generate(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        // Unlike `find`, the premise is evaluated via `compute` so an atomic
        // (or conjoined) premise with no upstream bindings can bootstrap off
        // the argument vector (spec.md §4.5 argument-vector propagation).
        let premise_result = self.premise.compute(ctx, input)?;
        if !premise_result.truth {
            return Ok(LogicFormulaResult {
                truth: true,
                is_generated: false,
                replacements: input.clone(),
            });
        }
        let conclusion_result = self.conclusion.generate(ctx, &premise_result.replacements)?;
        Ok(LogicFormulaResult {
            truth: conclusion_result.truth,
            is_generated: conclusion_result.is_generated,
            replacements: conclusion_result.replacements,
        })
    }
}

/// Both directions of implication evaluated independently, combined by
/// logical AND on truth and natural join on replacements.
pub struct EquivalenceNode {
    forward: ImplicationNode,
    backward: ImplicationNode,
}

impl EquivalenceNode {
    pub fn new(forward: ImplicationNode, backward: ImplicationNode) -> Self {
        EquivalenceNode { forward, backward }
    }
}

impl ExpressionNode for EquivalenceNode {
    fn check(&mut self, ctx: &mut EvalContext, binding: &Binding) -> Result<LogicFormulaResult, ExpressionError> {
        let forward = self.forward.check(ctx, binding)?;
        let backward = self.backward.check(ctx, binding)?;
        Ok(LogicFormulaResult {
            truth: forward.truth && backward.truth,
            is_generated: false,
            replacements: Replacements::new(),
        })
    }

    fn compute(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        self.generate(ctx, input)
    }

    fn find(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let forward = self.forward.find(ctx, input)?;
        let backward = self.backward.find(ctx, input)?;
        Ok(LogicFormulaResult {
            truth: forward.truth && backward.truth,
            is_generated: false,
            replacements: intersect(&forward.replacements, &backward.replacements),
        })
    }

    fn generate(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let forward = self.forward.generate(ctx, input)?;
        let backward = self.backward.generate(ctx, input)?;
        Ok(LogicFormulaResult {
            truth: forward.truth && backward.truth,
            is_generated: forward.is_generated || backward.is_generated,
            replacements: intersect(&forward.replacements, &backward.replacements),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::expr_tree::{build, EvalContext};
    use crate::policy::GenerationType;
    use crate::searcher::{SearchPolicy, TemplateSearcher};
    use crate::store::memory::MemoryStore;
    use crate::store::{GraphStore, TemplateElement, TemplateTriple};
    use crate::template_manager::TemplateManager;

    #[test]
    fn generate_is_vacuously_true_when_premise_never_matches() {
        let mut store = MemoryStore::new();
        let is_a = store.create_node(ElementType::NODE | ElementType::CONST);
        let candidate_class = store.create_node(ElementType::NODE | ElementType::CONST);
        let mammal_class = store.create_node(ElementType::NODE | ElementType::CONST);
        let cat = store.create_node(ElementType::NODE | ElementType::CONST);
        // `cat` is never asserted as a member of `candidate_class`.
        let x = store.new_variable();
        let premise = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(candidate_class),
        }]);
        let conclusion = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(mammal_class),
        }]);
        let rule_formula = store.define_implication(premise, conclusion);
        let mut tree = build(&store, rule_formula);
        let mut searcher = TemplateSearcher::new(SearchPolicy::Unrestricted, 8).unwrap();
        let manager = TemplateManager::new(GenerationType::GenerateUniqueFormulas);
        let mut ctx = EvalContext {
            store: &mut store,
            searcher: &mut searcher,
            manager: &manager,
            output_structure: None,
            arguments: vec![cat],
            search_in_kb_when_generating: true,
        };

        let result = tree.compute(&mut ctx, &crate::replacements::Replacements::unconstrained()).unwrap();
        assert!(result.truth);
        assert!(!result.is_generated);
        assert!(!ctx.store.edge_exists(cat, is_a, mammal_class));
    }

    #[test]
    fn generate_fires_conclusion_when_premise_holds() {
        let mut store = MemoryStore::new();
        let is_a = store.create_node(ElementType::NODE | ElementType::CONST);
        let candidate_class = store.create_node(ElementType::NODE | ElementType::CONST);
        let mammal_class = store.create_node(ElementType::NODE | ElementType::CONST);
        let dog = store.create_node(ElementType::NODE | ElementType::CONST);
        store.assert_fact(dog, is_a, candidate_class);
        let x = store.new_variable();
        let premise = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(candidate_class),
        }]);
        let conclusion = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(mammal_class),
        }]);
        let rule_formula = store.define_implication(premise, conclusion);
        let mut tree = build(&store, rule_formula);
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
        assert!(result.is_generated);
        assert!(ctx.store.edge_exists(dog, is_a, mammal_class));
    }

    #[test]
    fn equivalence_is_true_only_when_both_directions_hold() {
        let mut store = MemoryStore::new();
        let is_a = store.create_node(ElementType::NODE | ElementType::CONST);
        let class_a = store.create_node(ElementType::NODE | ElementType::CONST);
        let class_b = store.create_node(ElementType::NODE | ElementType::CONST);
        let dog = store.create_node(ElementType::NODE | ElementType::CONST);
        store.assert_fact(dog, is_a, class_a);
        store.assert_fact(dog, is_a, class_b);
        let x = store.new_variable();
        let atom_a = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(class_a),
        }]);
        let atom_b = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Var(x),
            connector: TemplateElement::Const(is_a),
            target: TemplateElement::Const(class_b),
        }]);
        let equivalence_formula = store.define_equivalence(atom_a, atom_b);
        let mut tree = build(&store, equivalence_formula);
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

        let binding: crate::replacements::Binding = [(x, dog)].into_iter().collect();
        let input = crate::replacements::Replacements::from_bindings(&[x], &[binding]);
        let result = tree.find(&mut ctx, &input).unwrap();
        assert!(result.truth);
    }
}
