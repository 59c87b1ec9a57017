//! Logic expression tree (C6): a DAG built once per rule, rooted at the
//! formula, whose nodes each implement `check` / `compute` / `find` /
//! `generate` over [`Replacements`]. Built by [`build`], dispatching on
//! [`crate::store::GraphStore::classify_formula`] the way the teacher's
//! `query_planner::logical_expr` visitors dispatch on AST node kind.
//!
//! Modeled as a tagged variant with a small shared trait rather than a class
//! hierarchy (design notes §9: "a simple virtual-call pattern or enum+match
//! works equally well"). The tree owns its children exclusively and is
//! discarded after one rule evaluation.

mod atom;
mod conjunction;
mod disjunction;
mod implication;
mod negation;
mod quantifier;

use thiserror::Error;

use crate::element::ElementId;
use crate::formula::FormulaKind;
use crate::replacements::Replacements;
use crate::searcher::{SearchError, TemplateSearcher};
use crate::store::{GraphStore, StoreError};
use crate::template_manager::TemplateManager;

pub use atom::AtomNode;
pub use conjunction::ConjunctionNode;
pub use disjunction::DisjunctionNode;
pub use implication::{EquivalenceNode, ImplicationNode};
pub use negation::NegationNode;
pub use quantifier::{QuantifierKind, QuantifierNode};

#[derive(Debug, Error)]
pub enum ExpressionError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("generation for variable {0} has no binding in either the generation result or the input parameters")]
    InvalidState(ElementId),
}

/// Truth value, generation flag, and substitution table produced by a node
/// evaluation (spec.md §4.5).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicFormulaResult {
    pub truth: bool,
    pub is_generated: bool,
    pub replacements: Replacements,
}

impl LogicFormulaResult {
    pub fn failure() -> Self {
        LogicFormulaResult {
            truth: false,
            is_generated: false,
            replacements: Replacements::new(),
        }
    }
}

/// Shared state threaded through every node of one tree evaluation: the
/// mutable graph store, the configured searcher/manager, the (optional)
/// output structure newly generated elements are published to, the root
/// argument vector, and the `searchInKbWhenGenerating` flow flag.
pub struct EvalContext<'a> {
    pub store: &'a mut dyn GraphStore,
    pub searcher: &'a mut TemplateSearcher,
    pub manager: &'a TemplateManager,
    pub output_structure: Option<ElementId>,
    pub arguments: Vec<ElementId>,
    pub search_in_kb_when_generating: bool,
}

/// Shared node interface (spec.md §4.5). `check` is a quick truth test under
/// one concrete binding; `compute` is the general evaluation entry point
/// (may search, never generates); `find` searches only; `generate` attempts
/// to extend the KB for unsatisfied atoms and requires non-empty input.
pub trait ExpressionNode {
    fn check(&mut self, ctx: &mut EvalContext, binding: &crate::replacements::Binding) -> Result<LogicFormulaResult, ExpressionError>;
    fn compute(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError>;
    fn find(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError>;
    fn generate(&mut self, ctx: &mut EvalContext, input: &Replacements) -> Result<LogicFormulaResult, ExpressionError>;

    /// True for node kinds that never generate (currently only negation) —
    /// consulted by conjunction reordering (§9: find-only children first).
    fn is_find_only(&self) -> bool {
        false
    }
}

/// Build the expression tree for `formula`, dispatching on its classified
/// connective kind. Recurses into operands/body via the store's accessors.
pub fn build(store: &dyn GraphStore, formula: ElementId) -> Box<dyn ExpressionNode> {
    match store.classify_formula(formula) {
        FormulaKind::Atom => Box::new(AtomNode::new(store, formula)),
        FormulaKind::Negation => {
            let body = store
                .formula_negated(formula)
                .expect("negation formula must have one operand");
            Box::new(NegationNode::new(build(store, body)))
        }
        FormulaKind::Conjunction => {
            let operands = store
                .formula_operands(formula)
                .into_iter()
                .map(|op| build(store, op))
                .collect();
            Box::new(ConjunctionNode::new(operands))
        }
        FormulaKind::Disjunction => {
            let operands = store
                .formula_operands(formula)
                .into_iter()
                .map(|op| build(store, op))
                .collect();
            Box::new(DisjunctionNode::new(operands))
        }
        FormulaKind::Implication => {
            let (premise, conclusion) = store
                .formula_binary(formula)
                .expect("implication formula must have premise and conclusion");
            Box::new(ImplicationNode::new(build(store, premise), build(store, conclusion)))
        }
        FormulaKind::Equivalence => {
            let (left, right) = store
                .formula_binary(formula)
                .expect("equivalence formula must have two operands");
            Box::new(EquivalenceNode::new(
                ImplicationNode::new(build(store, left), build(store, right)),
                ImplicationNode::new(build(store, right), build(store, left)),
            ))
        }
        FormulaKind::Universal => {
            let (bound_var, body) = store
                .formula_quantifier(formula)
                .expect("universal formula must have a bound variable and body");
            Box::new(QuantifierNode::new(QuantifierKind::Universal, bound_var, build(store, body)))
        }
        FormulaKind::Existential => {
            let (bound_var, body) = store
                .formula_quantifier(formula)
                .expect("existential formula must have a bound variable and body");
            Box::new(QuantifierNode::new(QuantifierKind::Existential, bound_var, build(store, body)))
        }
    }
}
