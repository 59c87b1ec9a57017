//! A small in-memory [`GraphStore`] used by the demo binary and the test
//! suite. Not part of the spec'd interface — the real store is an external
//! collaborator — but something has to stand in for it so the core is
//! exercisable end to end.
//!
//! Facts are stored as a flat set of resolved `(source, connector, target)`
//! triples (edges are first-class elements, so the connector position is
//! itself an `ElementId`). Formula structure is stored separately as
//! `TemplateElement` triples with `Var`/`Const` positions, the way the real
//! store would expose a formula's pattern to [`GraphStore::build_template`].

use std::collections::{HashMap, HashSet};

use crate::element::{ElementId, ElementType};
use crate::formula::FormulaKind;
use crate::replacements::Binding;
use crate::store::{GraphStore, StoreError, Template, TemplateElement, TemplateTriple};

#[derive(Default)]
pub struct MemoryStore {
    next_id: u64,
    types: HashMap<ElementId, ElementType>,
    idtf: HashMap<String, ElementId>,
    link_content: HashMap<ElementId, String>,

    facts: HashSet<(ElementId, ElementId, ElementId)>,

    formula_kind: HashMap<ElementId, FormulaKind>,
    formula_pattern: HashMap<ElementId, Vec<TemplateTriple>>,
    formula_operands: HashMap<ElementId, Vec<ElementId>>,
    formula_binary: HashMap<ElementId, (ElementId, ElementId)>,
    formula_negated: HashMap<ElementId, ElementId>,
    formula_quantifier: HashMap<ElementId, (ElementId, ElementId)>,
    formula_with_links: HashSet<ElementId>,
    formula_link_checks: HashMap<ElementId, Vec<(ElementId, String)>>,

    structure_members: HashMap<ElementId, HashSet<ElementId>>,
    container_members: HashMap<ElementId, Vec<ElementId>>,
    priority_lists: HashMap<ElementId, Vec<Vec<ElementId>>>,
    rule_main_formula: HashMap<ElementId, ElementId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn fresh_id(&mut self) -> ElementId {
        self.next_id += 1;
        ElementId::new(self.next_id)
    }

    /// Allocate a bare variable placeholder: an `ElementId` that never backs a
    /// real node/edge, used only inside [`TemplateElement::Var`] positions.
    pub fn new_variable(&mut self) -> ElementId {
        let id = self.fresh_id();
        self.types.insert(id, ElementType::VAR);
        id
    }

    pub fn set_idtf(&mut self, element: ElementId, idtf: impl Into<String>) {
        self.idtf.insert(idtf.into(), element);
    }

    pub fn create_link(&mut self, content: impl Into<String>) -> ElementId {
        let id = self.create_node(ElementType::NODE | ElementType::CONST | ElementType::LINK);
        self.link_content.insert(id, content.into());
        id
    }

    /// Assert a concrete fact directly (bypassing generation) — used by tests
    /// to seed pre-existing knowledge.
    pub fn assert_fact(&mut self, source: ElementId, connector: ElementId, target: ElementId) {
        self.facts.insert((source, connector, target));
    }

    pub fn define_atomic_formula(&mut self, triples: Vec<TemplateTriple>) -> ElementId {
        let id = self.fresh_id();
        self.types.insert(id, ElementType::NODE | ElementType::CONST);
        self.formula_kind.insert(id, FormulaKind::Atom);
        self.formula_pattern.insert(id, triples);
        id
    }

    pub fn mark_template_with_links(&mut self, formula: ElementId, checks: Vec<(ElementId, String)>) {
        self.formula_with_links.insert(formula);
        self.formula_link_checks.insert(formula, checks);
    }

    pub fn define_conjunction(&mut self, operands: Vec<ElementId>) -> ElementId {
        let id = self.fresh_id();
        self.formula_kind.insert(id, FormulaKind::Conjunction);
        self.formula_operands.insert(id, operands);
        id
    }

    pub fn define_disjunction(&mut self, operands: Vec<ElementId>) -> ElementId {
        let id = self.fresh_id();
        self.formula_kind.insert(id, FormulaKind::Disjunction);
        self.formula_operands.insert(id, operands);
        id
    }

    pub fn define_negation(&mut self, body: ElementId) -> ElementId {
        let id = self.fresh_id();
        self.formula_kind.insert(id, FormulaKind::Negation);
        self.formula_negated.insert(id, body);
        id
    }

    pub fn define_implication(&mut self, premise: ElementId, conclusion: ElementId) -> ElementId {
        let id = self.fresh_id();
        self.formula_kind.insert(id, FormulaKind::Implication);
        self.formula_binary.insert(id, (premise, conclusion));
        id
    }

    pub fn define_equivalence(&mut self, left: ElementId, right: ElementId) -> ElementId {
        let id = self.fresh_id();
        self.formula_kind.insert(id, FormulaKind::Equivalence);
        self.formula_binary.insert(id, (left, right));
        id
    }

    pub fn define_universal(&mut self, bound_var: ElementId, body: ElementId) -> ElementId {
        let id = self.fresh_id();
        self.formula_kind.insert(id, FormulaKind::Universal);
        self.formula_quantifier.insert(id, (bound_var, body));
        id
    }

    pub fn define_existential(&mut self, bound_var: ElementId, body: ElementId) -> ElementId {
        let id = self.fresh_id();
        self.formula_kind.insert(id, FormulaKind::Existential);
        self.formula_quantifier.insert(id, (bound_var, body));
        id
    }

    pub fn define_rule(&mut self, main_formula: ElementId) -> ElementId {
        let id = self.fresh_id();
        self.rule_main_formula.insert(id, main_formula);
        id
    }

    pub fn define_rule_priority_list(&mut self, rule_sets: Vec<Vec<ElementId>>) -> ElementId {
        let id = self.fresh_id();
        self.priority_lists.insert(id, rule_sets);
        id
    }

    pub fn define_argument_set(&mut self, elements: Vec<ElementId>) -> ElementId {
        let id = self.fresh_id();
        self.container_members.insert(id, elements);
        id
    }

    fn collect_vars(&self, formula: ElementId, out: &mut HashSet<ElementId>) {
        match self.formula_kind.get(&formula) {
            Some(FormulaKind::Atom) => {
                if let Some(triples) = self.formula_pattern.get(&formula) {
                    for t in triples {
                        for pos in [t.source, t.connector, t.target] {
                            if let TemplateElement::Var(v) = pos {
                                out.insert(v);
                            }
                        }
                    }
                }
            }
            Some(FormulaKind::Conjunction) | Some(FormulaKind::Disjunction) => {
                if let Some(ops) = self.formula_operands.get(&formula) {
                    for &op in ops {
                        self.collect_vars(op, out);
                    }
                }
            }
            Some(FormulaKind::Negation) => {
                if let Some(&body) = self.formula_negated.get(&formula) {
                    self.collect_vars(body, out);
                }
            }
            Some(FormulaKind::Implication) | Some(FormulaKind::Equivalence) => {
                if let Some(&(a, b)) = self.formula_binary.get(&formula) {
                    self.collect_vars(a, out);
                    self.collect_vars(b, out);
                }
            }
            Some(FormulaKind::Universal) | Some(FormulaKind::Existential) => {
                if let Some(&(bound, body)) = self.formula_quantifier.get(&formula) {
                    out.insert(bound);
                    self.collect_vars(body, out);
                }
            }
            None => {}
        }
    }

    fn collect_consts(&self, formula: ElementId, out: &mut HashSet<ElementId>) {
        match self.formula_kind.get(&formula) {
            Some(FormulaKind::Atom) => {
                if let Some(triples) = self.formula_pattern.get(&formula) {
                    for t in triples {
                        for pos in [t.source, t.connector, t.target] {
                            if let TemplateElement::Const(c) = pos {
                                out.insert(c);
                            }
                        }
                    }
                }
            }
            Some(FormulaKind::Conjunction) | Some(FormulaKind::Disjunction) => {
                if let Some(ops) = self.formula_operands.get(&formula) {
                    for &op in ops {
                        self.collect_consts(op, out);
                    }
                }
            }
            Some(FormulaKind::Negation) => {
                if let Some(&body) = self.formula_negated.get(&formula) {
                    self.collect_consts(body, out);
                }
            }
            Some(FormulaKind::Implication) | Some(FormulaKind::Equivalence) => {
                if let Some(&(a, b)) = self.formula_binary.get(&formula) {
                    self.collect_consts(a, out);
                    self.collect_consts(b, out);
                }
            }
            Some(FormulaKind::Universal) | Some(FormulaKind::Existential) => {
                if let Some(&(_, body)) = self.formula_quantifier.get(&formula) {
                    self.collect_consts(body, out);
                }
            }
            None => {}
        }
    }

    fn resolve(element: TemplateElement, binding: &HashMap<ElementId, ElementId>) -> Option<ElementId> {
        match element {
            TemplateElement::Const(c) => Some(c),
            TemplateElement::Var(v) => binding.get(&v).copied(),
        }
    }

    fn backtrack(
        &self,
        triples: &[TemplateTriple],
        index: usize,
        current: &mut HashMap<ElementId, ElementId>,
        results: &mut Vec<Binding>,
        stop_after_first: bool,
    ) {
        if !results.is_empty() && stop_after_first {
            return;
        }
        if index == triples.len() {
            results.push(current.clone());
            return;
        }
        let t = triples[index];
        let known_source = Self::resolve(t.source, current);
        let known_connector = Self::resolve(t.connector, current);
        let known_target = Self::resolve(t.target, current);

        for &(s, c, tg) in &self.facts {
            if let Some(ks) = known_source {
                if ks != s {
                    continue;
                }
            }
            if let Some(kc) = known_connector {
                if kc != c {
                    continue;
                }
            }
            if let Some(kt) = known_target {
                if kt != tg {
                    continue;
                }
            }

            let mut inserted = Vec::new();
            let mut ok = true;
            for (pos, value) in [(t.source, s), (t.connector, c), (t.target, tg)] {
                if let TemplateElement::Var(v) = pos {
                    if let Some(&existing) = current.get(&v) {
                        if existing != value {
                            ok = false;
                            break;
                        }
                    } else {
                        current.insert(v, value);
                        inserted.push(v);
                    }
                }
            }
            if ok {
                self.backtrack(triples, index + 1, current, results, stop_after_first);
            }
            for v in inserted {
                current.remove(&v);
            }
            if !results.is_empty() && stop_after_first {
                return;
            }
        }
    }
}

impl GraphStore for MemoryStore {
    fn create_node(&mut self, element_type: ElementType) -> ElementId {
        let id = self.fresh_id();
        self.types.insert(id, element_type | ElementType::NODE);
        id
    }

    fn create_edge(&mut self, source: ElementId, target: ElementId, element_type: ElementType) -> ElementId {
        let id = self.fresh_id();
        self.types.insert(id, element_type | ElementType::EDGE);
        self.facts.insert((source, id, target));
        id
    }

    fn element_type(&self, element: ElementId) -> ElementType {
        self.types.get(&element).copied().unwrap_or(ElementType::empty())
    }

    fn edge_exists(&self, source: ElementId, target: ElementId, edge_relation: ElementId) -> bool {
        self.facts.contains(&(source, edge_relation, target))
    }

    fn resolve_idtf(&self, idtf: &str) -> Option<ElementId> {
        self.idtf.get(idtf).copied()
    }

    fn get_link_content(&self, link: ElementId) -> Option<String> {
        self.link_content.get(&link).cloned()
    }

    fn set_link_content(&mut self, link: ElementId, content: String) {
        self.link_content.insert(link, content);
    }

    fn classify_formula(&self, formula: ElementId) -> FormulaKind {
        self.formula_kind.get(&formula).copied().unwrap_or(FormulaKind::Atom)
    }

    fn formula_operands(&self, formula: ElementId) -> Vec<ElementId> {
        self.formula_operands.get(&formula).cloned().unwrap_or_default()
    }

    fn formula_binary(&self, formula: ElementId) -> Option<(ElementId, ElementId)> {
        self.formula_binary.get(&formula).copied()
    }

    fn formula_negated(&self, formula: ElementId) -> Option<ElementId> {
        self.formula_negated.get(&formula).copied()
    }

    fn formula_quantifier(&self, formula: ElementId) -> Option<(ElementId, ElementId)> {
        self.formula_quantifier.get(&formula).copied()
    }

    fn is_template_with_links(&self, formula: ElementId) -> bool {
        self.formula_with_links.contains(&formula)
    }

    fn get_variables(&self, formula: ElementId) -> HashSet<ElementId> {
        let mut out = HashSet::new();
        self.collect_vars(formula, &mut out);
        out
    }

    fn get_constants(&self, formula: ElementId) -> HashSet<ElementId> {
        let mut out = HashSet::new();
        self.collect_consts(formula, &mut out);
        out
    }

    fn build_template(&self, formula: ElementId, binding: &Binding) -> Result<Template, StoreError> {
        let triples = self
            .formula_pattern
            .get(&formula)
            .ok_or(StoreError::TemplateNotBuilt { formula })?;

        let mut variables = HashSet::new();
        let resolved: Vec<TemplateTriple> = triples
            .iter()
            .map(|t| TemplateTriple {
                source: Self::apply_binding(t.source, binding, &mut variables),
                connector: Self::apply_binding(t.connector, binding, &mut variables),
                target: Self::apply_binding(t.target, binding, &mut variables),
            })
            .collect();

        Ok(Template {
            triples: resolved,
            variables,
            with_links: self.formula_with_links.contains(&formula),
            link_checks: self.formula_link_checks.get(&formula).cloned().unwrap_or_default(),
        })
    }

    fn search_template(&self, template: &Template, stop_after_first: bool) -> Result<Vec<Binding>, StoreError> {
        let mut results = Vec::new();
        let mut current = HashMap::new();
        self.backtrack(&template.triples, 0, &mut current, &mut results, stop_after_first);
        Ok(results)
    }

    fn generate_template(&mut self, template: &Template) -> Result<Binding, StoreError> {
        let mut binding: Binding = HashMap::new();

        let mut is_connector: HashSet<ElementId> = HashSet::new();
        for t in &template.triples {
            if let TemplateElement::Var(v) = t.connector {
                is_connector.insert(v);
            }
        }

        for t in &template.triples {
            let source = self.resolve_or_create(t.source, &mut binding, &is_connector);
            let target = self.resolve_or_create(t.target, &mut binding, &is_connector);
            let connector = match t.connector {
                TemplateElement::Const(c) => c,
                TemplateElement::Var(v) => {
                    if let Some(&existing) = binding.get(&v) {
                        existing
                    } else {
                        let id = self.create_edge(source, target, ElementType::COMMON_EDGE);
                        binding.insert(v, id);
                        id
                    }
                }
            };
            self.facts.insert((source, connector, target));
        }

        Ok(binding)
    }

    fn is_member_of_structure(&self, element: ElementId, structure: ElementId) -> bool {
        self.structure_members
            .get(&structure)
            .map(|members| members.contains(&element))
            .unwrap_or(false)
    }

    fn priority_rule_sets(&self, formulas_set: ElementId) -> Vec<Vec<ElementId>> {
        self.priority_lists.get(&formulas_set).cloned().unwrap_or_default()
    }

    fn main_formula_of_rule(&self, rule: ElementId) -> Option<ElementId> {
        self.rule_main_formula.get(&rule).copied()
    }

    fn elements_of_type_in(&self, container: ElementId, element_type: ElementType) -> Vec<ElementId> {
        self.container_members
            .get(&container)
            .map(|members| {
                members
                    .iter()
                    .filter(|&&e| self.element_type(e).contains(element_type))
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn create_struct_node(&mut self) -> ElementId {
        let id = self.create_node(ElementType::NODE | ElementType::CONST | ElementType::PERMANENT);
        self.structure_members.insert(id, HashSet::new());
        id
    }

    fn add_to_structure(&mut self, structure: ElementId, element: ElementId) {
        self.structure_members.entry(structure).or_default().insert(element);
    }

    fn tag_success(&mut self, solution: ElementId, success: bool) {
        // A dedicated keynode identifies success/failure membership; the
        // in-memory store just records it as a structure tag so tests can
        // assert on it via `is_member_of_structure`.
        let tag = if success {
            self.idtf
                .entry("concept_success_solution_positive".to_string())
                .or_insert_with(|| {
                    self.next_id += 1;
                    ElementId::new(self.next_id)
                })
        } else {
            self.idtf
                .entry("concept_success_solution_negative".to_string())
                .or_insert_with(|| {
                    self.next_id += 1;
                    ElementId::new(self.next_id)
                })
        };
        self.structure_members.entry(*tag).or_default().insert(solution);
    }
}

impl MemoryStore {
    fn apply_binding(
        element: TemplateElement,
        binding: &Binding,
        free_variables: &mut HashSet<ElementId>,
    ) -> TemplateElement {
        match element {
            TemplateElement::Const(c) => TemplateElement::Const(c),
            TemplateElement::Var(v) => match binding.get(&v) {
                Some(&value) => TemplateElement::Const(value),
                None => {
                    free_variables.insert(v);
                    TemplateElement::Var(v)
                }
            },
        }
    }

    fn resolve_or_create(
        &mut self,
        element: TemplateElement,
        binding: &mut Binding,
        is_connector: &HashSet<ElementId>,
    ) -> ElementId {
        match element {
            TemplateElement::Const(c) => c,
            TemplateElement::Var(v) => {
                if let Some(&existing) = binding.get(&v) {
                    existing
                } else if is_connector.contains(&v) {
                    // resolved when the triple's connector arm is processed
                    *binding.entry(v).or_insert_with(|| {
                        self.next_id += 1;
                        ElementId::new(self.next_id)
                    })
                } else {
                    let id = self.create_node(ElementType::CONST);
                    binding.insert(v, id);
                    id
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_template_materializes_fresh_elements() {
        let mut store = MemoryStore::new();
        let arg = store.create_node(ElementType::NODE | ElementType::CONST);
        let rel = store.create_node(ElementType::NODE | ElementType::CONST);
        let var_class = store.new_variable();
        let var_edge = store.new_variable();

        let formula = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Const(rel),
            connector: TemplateElement::Var(var_edge),
            target: TemplateElement::Const(arg),
        }]);
        let _ = var_class;

        let binding = Binding::new();
        let template = store.build_template(formula, &binding).unwrap();
        let result = store.generate_template(&template).unwrap();

        assert!(result.contains_key(&var_edge));
        let edge = result[&var_edge];
        assert!(store.edge_exists(rel, arg, edge));
    }

    #[test]
    fn search_template_finds_asserted_fact() {
        let mut store = MemoryStore::new();
        let class = store.create_node(ElementType::NODE | ElementType::CONST);
        let membership = store.create_node(ElementType::NODE | ElementType::CONST);
        let arg = store.create_node(ElementType::NODE | ElementType::CONST);
        store.assert_fact(class, membership, arg);

        let var = store.new_variable();
        let formula = store.define_atomic_formula(vec![TemplateTriple {
            source: TemplateElement::Const(class),
            connector: TemplateElement::Const(membership),
            target: TemplateElement::Var(var),
        }]);

        let template = store.build_template(formula, &Binding::new()).unwrap();
        let results = store.search_template(&template, false).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0][&var], arg);
    }
}
