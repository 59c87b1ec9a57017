//! Formula classification (C5): given a formula's root element, decide which
//! connective it denotes so the expression-tree builder (C6) knows which node
//! kind to construct.
//!
//! The classification itself is a property of the graph store (connective
//! markers are domain keynodes the host supplies, per spec.md §6), so
//! [`crate::store::GraphStore::classify_formula`] does the actual inspection;
//! this module only names the result type and documents each variant's shape,
//! the way `query_planner::types::QueryType` names the clickhouse teacher's
//! classification result next to `get_query_type`.

use crate::element::ElementId;

/// The connective (or lack of one) at a formula's root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormulaKind {
    /// The formula is itself a template: no recognized connective.
    Atom,
    /// Unary: negates its single operand.
    Negation,
    /// N-ary, operands evaluated left-to-right (after C9 reordering).
    Conjunction,
    /// N-ary, truth is the logical OR of operands.
    Disjunction,
    /// Binary: premise -> conclusion.
    Implication,
    /// Binary, symmetric: both directions of implication must hold.
    Equivalence,
    /// Bound variable + body; succeeds iff the body succeeds for every
    /// admissible binding of the bound variable.
    Universal,
    /// Bound variable + body; succeeds iff there is some admissible binding.
    Existential,
}

impl FormulaKind {
    pub fn is_atom(self) -> bool {
        matches!(self, FormulaKind::Atom)
    }

    pub fn arity_is_nary(self) -> bool {
        matches!(self, FormulaKind::Conjunction | FormulaKind::Disjunction)
    }

    pub fn arity_is_binary(self) -> bool {
        matches!(self, FormulaKind::Implication | FormulaKind::Equivalence)
    }

    pub fn is_quantifier(self) -> bool {
        matches!(self, FormulaKind::Universal | FormulaKind::Existential)
    }
}

/// A rule: a formula whose root is marked with the main-key-element relation.
/// `main_formula` is the implication (typically) actually evaluated; `root`
/// is the rule wrapper element the priority rule sets enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rule {
    pub root: ElementId,
    pub main_formula: ElementId,
}
