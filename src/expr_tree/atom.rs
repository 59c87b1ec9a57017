//! Atomic formula node: the only node kind that actually touches the
//! searcher/store directly. Grounded on
//! `original_source/.../logic/TemplateExpressionNode.cpp`; simplified from
//! its dual-searcher (`templateSearcher` vs. `templateSearcherInKb`) design
//! down to one ephemeral unrestricted probe for the "search without
//! replacements" pre-generation step, per spec.md §4.5 / §9.

use std::collections::HashSet;

use crate::element::ElementId;
use crate::policy::{FillingType, GenerationType};
use crate::replacements::{intersect, subtract, Binding, Replacements};
use crate::searcher::{SearchPolicy, TemplateSearcher};
use crate::store::GraphStore;

use super::{EvalContext, ExpressionError, ExpressionNode, LogicFormulaResult};

pub struct AtomNode {
    formula: ElementId,
    variables: HashSet<ElementId>,
}

impl AtomNode {
    pub fn new(store: &dyn GraphStore, formula: ElementId) -> Self {
        AtomNode {
            formula,
            variables: store.get_variables(formula),
        }
    }

    fn publish(&self, ctx: &mut EvalContext, binding: &Binding) {
        let Some(structure) = ctx.output_structure else {
            return;
        };
        for &variable in &self.variables {
            if let Some(&value) = binding.get(&variable) {
                ctx.store.add_to_structure(structure, value);
            }
        }
    }

    fn publish_constants(&self, ctx: &mut EvalContext) {
        let Some(structure) = ctx.output_structure else {
            return;
        };
        for constant in ctx.store.get_constants(self.formula) {
            ctx.store.add_to_structure(structure, constant);
        }
    }
}

impl ExpressionNode for AtomNode {
    fn check(&mut self, ctx: &mut EvalContext, binding: &Binding) -> Result<LogicFormulaResult, ExpressionError> {
        let replacements = ctx.searcher.search(ctx.store, self.formula, binding, &self.variables)?;
        Ok(LogicFormulaResult {
            truth: replacements.columns() > 0,
            is_generated: false,
            replacements,
        })
    }

    /// Unlike `find`, consults the root argument vector to bootstrap bindings
    /// when nothing upstream has constrained this atom's variables yet
    /// (spec.md §4.5 "argument-vector propagation" — arguments build
    /// *initial* bindings, they don't override bindings a prior conjunct
    /// already produced).
    fn compute(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let bindings = if !input.is_empty_keys() {
            input.to_param_bindings()
        } else if !ctx.arguments.is_empty() {
            ctx.manager
                .candidate_bindings(ctx.store, ctx.searcher, self.formula, &ctx.arguments)
        } else {
            vec![Binding::new()]
        };
        let replacements = ctx
            .searcher
            .search_many(ctx.store, self.formula, &bindings, &self.variables)?;
        Ok(LogicFormulaResult {
            truth: replacements.columns() > 0,
            is_generated: false,
            replacements,
        })
    }

    fn find(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let bindings = if input.is_empty_keys() {
            vec![Binding::new()]
        } else {
            input.to_param_bindings()
        };
        let replacements = ctx
            .searcher
            .search_many(ctx.store, self.formula, &bindings, &self.variables)?;
        Ok(LogicFormulaResult {
            truth: replacements.columns() > 0,
            is_generated: false,
            replacements,
        })
    }

    fn generate(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        if input.columns() == 0 {
            return Ok(LogicFormulaResult::failure());
        }

        let result_without_replacements = if ctx.search_in_kb_when_generating {
            let mut probe = TemplateSearcher::new(SearchPolicy::Unrestricted, 1)?;
            probe.search(ctx.store, self.formula, &Binding::new(), &self.variables)?
        } else {
            Replacements::empty_with_keys(self.variables.iter().copied())
        };

        // Subtract directly against the unrestricted probe rather than
        // against `intersect(result_without_replacements, input)`: when
        // nothing pre-exists, `result_without_replacements` is the
        // zero-columns-with-keys empty relation, and `intersect`'s own
        // degenerate short-circuit (spec.md §4.1 "if A has zero columns,
        // return a deep copy of B") would make that "existing" set equal to
        // the full caller input — silently cancelling every generation for
        // the single most common case, a rule firing for the first time.
        // `original_source/.../logic/TemplateExpressionNode.cpp::generate`
        // subtracts `resultWithoutReplacements` from `replacements` directly
        // for the same reason.
        let to_generate = match ctx.manager.generation_type() {
            GenerationType::GenerateUniqueFormulas => subtract(input, &result_without_replacements),
            GenerationType::GenerateAll => input.clone(),
        };
        let existing = intersect(&result_without_replacements, input);

        let bindings = if to_generate.is_empty_keys() {
            vec![Binding::new()]
        } else {
            to_generate.to_param_bindings()
        };

        let stop_after_first = ctx.searcher.replacements_using_type().stop_after_first();
        let mut generated = Replacements::new();
        let mut any_generated = false;

        for binding in bindings {
            if stop_after_first && any_generated {
                break;
            }
            let template = ctx.store.build_template(self.formula, &binding)?;
            let generated_binding = ctx.store.generate_template(&template)?;

            let mut full_binding = Binding::new();
            for &variable in &self.variables {
                let value = generated_binding
                    .get(&variable)
                    .or_else(|| binding.get(&variable))
                    .copied()
                    .ok_or(ExpressionError::InvalidState(variable))?;
                full_binding.insert(variable, value);
            }
            generated.insert_column(&full_binding);
            any_generated = true;
            self.publish(ctx, &full_binding);
        }

        if any_generated && matches!(ctx.searcher.output_structure_filling_type(), FillingType::SearchedAndGenerated) {
            for binding in existing.to_param_bindings() {
                self.publish(ctx, &binding);
            }
        }

        if any_generated {
            self.publish_constants(ctx);
        }

        Ok(LogicFormulaResult {
            truth: any_generated,
            is_generated: any_generated,
            replacements: intersect(&existing, &generated),
        })
    }
}
