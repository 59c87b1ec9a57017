//! `GraphStore`: the port through which the core talks to the semantic graph
//! knowledge base. Per spec.md §1 the store itself (element allocation,
//! iteration, edge-existence checks, template build/search primitives) is an
//! external collaborator — out of scope for this crate — so this module only
//! names the contract (§6 "Required host primitives") and, for tests and the
//! demo binary, one concrete in-memory implementation.

use std::collections::HashSet;

use thiserror::Error;

use crate::element::{ElementId, ElementType};
use crate::formula::FormulaKind;
use crate::replacements::Binding;

pub mod memory;

/// One element of a [`Template`] pattern triple: either pinned to a concrete
/// value or left as a variable to be bound by the search/generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateElement {
    Const(ElementId),
    Var(ElementId),
}

impl TemplateElement {
    pub fn as_var(self) -> Option<ElementId> {
        match self {
            TemplateElement::Var(v) => Some(v),
            TemplateElement::Const(_) => None,
        }
    }
}

/// One (source, connector, target) triple of a template pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateTriple {
    pub source: TemplateElement,
    pub connector: TemplateElement,
    pub target: TemplateElement,
}

/// A subgraph pattern built from a formula root plus a partial binding.
/// Built by the store (see [`GraphStore::build_template`]); consumed by
/// [`GraphStore::search_template`] / [`GraphStore::generate_template`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    pub triples: Vec<TemplateTriple>,
    pub variables: HashSet<ElementId>,
    /// True when every link element in the pattern must additionally match
    /// literal content (spec.md §4.3 "content-identity check").
    pub with_links: bool,
    /// `(variable, expected content)` pairs checked against
    /// [`GraphStore::get_link_content`] on every embedding when `with_links`.
    pub link_checks: Vec<(ElementId, String)>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("template could not be built for formula {formula} under the given binding")]
    TemplateNotBuilt { formula: ElementId },
    #[error("unknown element {0}")]
    UnknownElement(ElementId),
}

/// Everything the inference core needs from the knowledge base. Spec.md §6
/// lists these as "Required host primitives"; method names here are the
/// idiomatic-Rust equivalent of that list, grouped by the component that
/// calls them (C3 search, C4/C6 template build+generate, C5 classification,
/// C7/C8 structure bookkeeping).
pub trait GraphStore {
    // -- element allocation / inspection --
    fn create_node(&mut self, element_type: ElementType) -> ElementId;
    fn create_edge(&mut self, source: ElementId, target: ElementId, element_type: ElementType) -> ElementId;
    fn element_type(&self, element: ElementId) -> ElementType;
    fn edge_exists(&self, source: ElementId, target: ElementId, edge_relation: ElementId) -> bool;
    fn resolve_idtf(&self, idtf: &str) -> Option<ElementId>;

    // -- link content (C3 content-identity check) --
    fn get_link_content(&self, link: ElementId) -> Option<String>;
    fn set_link_content(&mut self, link: ElementId, content: String);

    // -- formula classification (C5) --
    fn classify_formula(&self, formula: ElementId) -> FormulaKind;
    /// Ordered operands of an n-ary (conjunction/disjunction) formula.
    fn formula_operands(&self, formula: ElementId) -> Vec<ElementId>;
    /// (premise, conclusion) of an implication/equivalence formula.
    fn formula_binary(&self, formula: ElementId) -> Option<(ElementId, ElementId)>;
    /// Single operand of a negation formula.
    fn formula_negated(&self, formula: ElementId) -> Option<ElementId>;
    /// (bound variable, body) of a quantifier formula.
    fn formula_quantifier(&self, formula: ElementId) -> Option<(ElementId, ElementId)>;
    fn is_template_with_links(&self, formula: ElementId) -> bool;
    fn get_variables(&self, formula: ElementId) -> HashSet<ElementId>;
    fn get_constants(&self, formula: ElementId) -> HashSet<ElementId>;

    // -- template build / search / generate (C3, C6 atoms) --
    fn build_template(&self, formula: ElementId, binding: &Binding) -> Result<Template, StoreError>;
    /// Unrestricted embeddings of `template` in the KB. `stop_after_first`
    /// implements `REPLACEMENTS_FIRST`.
    fn search_template(&self, template: &Template, stop_after_first: bool) -> Result<Vec<Binding>, StoreError>;
    /// Instantiate `template`, creating whichever pattern elements do not
    /// already exist, returning the binding of template variables to the
    /// (possibly freshly created) elements.
    fn generate_template(&mut self, template: &Template) -> Result<Binding, StoreError>;

    // -- input-structure membership (C3 whole-structure / access-edge-only policies) --
    fn is_member_of_structure(&self, element: ElementId, structure: ElementId) -> bool;

    // -- rule sets / rules (C8 driver) --
    /// The `rrel_1`-chained list of rule sets under `formulas_set`, each an
    /// unordered vector of rule elements.
    fn priority_rule_sets(&self, formulas_set: ElementId) -> Vec<Vec<ElementId>>;
    /// The `rrel_main_key_sc_element`-marked formula root of a rule.
    fn main_formula_of_rule(&self, rule: ElementId) -> Option<ElementId>;

    fn elements_of_type_in(&self, container: ElementId, element_type: ElementType) -> Vec<ElementId>;

    // -- output / solution structure bookkeeping (C7/C8) --
    fn create_struct_node(&mut self) -> ElementId;
    fn add_to_structure(&mut self, structure: ElementId, element: ElementId);
    fn tag_success(&mut self, solution: ElementId, success: bool);
}
