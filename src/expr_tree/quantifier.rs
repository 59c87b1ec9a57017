//! Universal / existential quantification (spec.md §4.5).
//!
//! The graph store exposes no "all elements of a type" enumeration that
//! would let a universal quantifier range over an open domain, so the bound
//! variable's candidate domain is taken from the caller's replacements (the
//! "premise context" spec.md refers to): if the caller doesn't already
//! constrain the bound variable, a universal is vacuously true over an empty
//! domain rather than silently ranging over the whole KB. This is a
//! deliberate scope decision, not a source-grounded behavior — see
//! DESIGN.md.

use std::collections::HashSet;

use crate::element::ElementId;
use crate::replacements::{intersect, unite, Binding, Replacements};

use super::{EvalContext, ExpressionError, ExpressionNode, LogicFormulaResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierKind {
    Universal,
    Existential,
}

pub struct QuantifierNode {
    kind: QuantifierKind,
    bound_var: ElementId,
    body: Box<dyn ExpressionNode>,
}

impl QuantifierNode {
    pub fn new(kind: QuantifierKind, bound_var: ElementId, body: Box<dyn ExpressionNode>) -> Self {
        QuantifierNode { kind, bound_var, body }
    }

    fn domain(&self, input: &Replacements) -> Vec<ElementId> {
        if !input.key_set().contains(&self.bound_var) {
            return Vec::new();
        }
        input
            .to_param_bindings()
            .into_iter()
            .filter_map(|binding| binding.get(&self.bound_var).copied())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect()
    }

    fn restrict(&self, input: &Replacements, value: ElementId) -> Replacements {
        let mut single = Binding::new();
        single.insert(self.bound_var, value);
        intersect(input, &Replacements::from_bindings(&[self.bound_var], &[single]))
    }
}

impl ExpressionNode for QuantifierNode {
    fn check(&mut self, ctx: &mut EvalContext, binding: &Binding) -> Result<LogicFormulaResult, ExpressionError> {
        // Under one concrete binding, "exists" and "forall" collapse to the
        // same question.
        let body_result = self.body.check(ctx, binding)?;
        Ok(LogicFormulaResult {
            truth: body_result.truth,
            is_generated: false,
            replacements: Replacements::new(),
        })
    }

    fn compute(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        self.find(ctx, input)
    }

    fn find(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        match self.kind {
            QuantifierKind::Existential => {
                let body_result = self.body.find(ctx, input)?;
                Ok(LogicFormulaResult {
                    truth: body_result.truth,
                    is_generated: false,
                    replacements: body_result.replacements.remove_rows(&[self.bound_var]),
                })
            }
            QuantifierKind::Universal => {
                let domain = self.domain(input);
                if domain.is_empty() {
                    return Ok(LogicFormulaResult {
                        truth: true,
                        is_generated: false,
                        replacements: input.clone(),
                    });
                }
                let mut accumulated = Replacements::new();
                for value in domain {
                    let restricted = self.restrict(input, value);
                    let body_result = self.body.find(ctx, &restricted)?;
                    if !body_result.truth {
                        return Ok(LogicFormulaResult::failure());
                    }
                    accumulated = unite(&accumulated, &body_result.replacements);
                }
                Ok(LogicFormulaResult {
                    truth: true,
                    is_generated: false,
                    replacements: accumulated.remove_rows(&[self.bound_var]),
                })
            }
        }
    }

    fn generate(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        match self.kind {
            QuantifierKind::Existential => {
                let body_result = self.body.generate(ctx, input)?;
                Ok(LogicFormulaResult {
                    truth: body_result.truth,
                    is_generated: body_result.is_generated,
                    replacements: body_result.replacements.remove_rows(&[self.bound_var]),
                })
            }
            QuantifierKind::Universal => {
                let domain = self.domain(input);
                if domain.is_empty() {
                    return Ok(LogicFormulaResult {
                        truth: true,
                        is_generated: false,
                        replacements: input.clone(),
                    });
                }
                let mut accumulated = Replacements::new();
                let mut any_generated = false;
                for value in domain {
                    let restricted = self.restrict(input, value);
                    let body_result = self.body.generate(ctx, &restricted)?;
                    if !body_result.truth {
                        return Ok(LogicFormulaResult {
                            truth: false,
                            is_generated: any_generated,
                            replacements: Replacements::new(),
                        });
                    }
                    any_generated |= body_result.is_generated;
                    accumulated = unite(&accumulated, &body_result.replacements);
                }
                Ok(LogicFormulaResult {
                    truth: true,
                    is_generated: any_generated,
                    replacements: accumulated.remove_rows(&[self.bound_var]),
                })
            }
        }
    }
}
