//! Negation: flips truth; never generates (spec.md §4.5).

use crate::replacements::{Binding, Replacements};

use super::{EvalContext, ExpressionError, ExpressionNode, LogicFormulaResult};

pub struct NegationNode {
    body: Box<dyn ExpressionNode>,
}

impl NegationNode {
    pub fn new(body: Box<dyn ExpressionNode>) -> Self {
        NegationNode { body }
    }
}

impl ExpressionNode for NegationNode {
    fn is_find_only(&self) -> bool {
        true
    }

    fn check(&mut self, ctx: &mut EvalContext, binding: &Binding) -> Result<LogicFormulaResult, ExpressionError> {
        let body_result = self.body.check(ctx, binding)?;
        Ok(LogicFormulaResult {
            truth: !body_result.truth,
            is_generated: false,
            replacements: Replacements::new(),
        })
    }

    fn compute(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        self.find(ctx, input)
    }

    fn find(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        let body_result = self.body.find(ctx, input)?;
        let truth = !body_result.truth;
        let replacements = if truth { input.clone() } else { Replacements::new() };
        Ok(LogicFormulaResult {
            truth,
            is_generated: false,
            replacements,
        })
    }

    /// Negation has nothing to generate; it degrades to `find`.
    fn generate(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError> {
        self.find(ctx, input)
    }
}
