//! Column-major relation over element-valued columns ([`Replacements`]).
//!
//! Grounded on `original_source/.../utils/ReplacementsUtils.cpp`: the degenerate
//! "zero columns on one side -> copy the other side" short-circuit in
//! [`intersect`]/[`unite`] and the nested-loop join shape both come from there.
//! `subtract`, the hashing-bucket optimization, and duplicate-column removal are
//! additions spec'd on top of that baseline (spec.md §4.1).

use std::collections::HashMap;

use crate::element::ElementId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplacementsError {
    #[error("binding references unknown variable {0}")]
    UnknownVariable(ElementId),
}

/// A column-major relation: variable -> ordered vector of concrete values.
/// Invariant: every value-vector has the same length (the column count).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replacements {
    columns: HashMap<ElementId, Vec<ElementId>>,
}

/// A single column's values, keyed by variable — the unit [`Replacements::to_param_bindings`]
/// produces and [`Replacements::from_bindings`] consumes.
pub type Binding = HashMap<ElementId, ElementId>;

impl Replacements {
    pub fn new() -> Self {
        Replacements {
            columns: HashMap::new(),
        }
    }

    /// One unconstrained row: no keys, logically combines as "match anything".
    pub fn unconstrained() -> Self {
        Self::new()
    }

    /// The empty relation over the given keys: keys present, zero columns.
    pub fn empty_with_keys(keys: impl IntoIterator<Item = ElementId>) -> Self {
        let mut columns = HashMap::new();
        for k in keys {
            columns.insert(k, Vec::new());
        }
        Replacements { columns }
    }

    pub fn from_bindings(variables: &[ElementId], bindings: &[Binding]) -> Self {
        let mut columns: HashMap<ElementId, Vec<ElementId>> = variables
            .iter()
            .map(|&v| (v, Vec::with_capacity(bindings.len())))
            .collect();
        for binding in bindings {
            for &v in variables {
                if let Some(value) = binding.get(&v) {
                    columns.get_mut(&v).unwrap().push(*value);
                }
            }
        }
        let mut result = Replacements { columns };
        result.dedup_columns();
        result
    }

    pub fn keys(&self) -> impl Iterator<Item = &ElementId> {
        self.columns.keys()
    }

    pub fn key_set(&self) -> std::collections::HashSet<ElementId> {
        self.columns.keys().copied().collect()
    }

    pub fn is_empty_keys(&self) -> bool {
        self.columns.is_empty()
    }

    /// Common column count of all key-vectors (0 if no keys).
    pub fn columns(&self) -> usize {
        self.columns
            .values()
            .next()
            .map(|v| v.len())
            .unwrap_or(0)
    }

    pub fn value_at(&self, key: ElementId, column: usize) -> Option<ElementId> {
        self.columns.get(&key).and_then(|v| v.get(column)).copied()
    }

    pub fn insert_column(&mut self, binding: &Binding) {
        if self.columns.is_empty() {
            for (&k, &v) in binding {
                self.columns.insert(k, vec![v]);
            }
            return;
        }
        for (k, values) in self.columns.iter_mut() {
            if let Some(v) = binding.get(k) {
                values.push(*v);
            }
        }
    }

    pub fn to_param_bindings(&self) -> Vec<Binding> {
        let n = self.columns();
        let keys: Vec<ElementId> = self.columns.keys().copied().collect();
        (0..n)
            .map(|col| {
                keys.iter()
                    .map(|&k| (k, self.columns[&k][col]))
                    .collect::<Binding>()
            })
            .collect()
    }

    /// Drop the named keys entirely (not individual columns).
    pub fn remove_rows(&self, keys_to_drop: &[ElementId]) -> Replacements {
        let mut result = self.clone();
        for k in keys_to_drop {
            result.columns.remove(k);
        }
        result
    }

    /// Remove columns identical across every key (canonicalization step that
    /// follows every algebraic operation per spec.md §4.1).
    pub fn dedup_columns(&mut self) {
        let n = self.columns();
        if n == 0 {
            return;
        }
        let keys: Vec<ElementId> = self.columns.keys().copied().collect();
        let mut seen: Vec<Vec<ElementId>> = Vec::with_capacity(n);
        let mut keep: Vec<bool> = vec![true; n];
        for col in 0..n {
            let row: Vec<ElementId> = keys.iter().map(|k| self.columns[k][col]).collect();
            if seen.contains(&row) {
                keep[col] = false;
            } else {
                seen.push(row);
            }
        }
        for k in &keys {
            let values = self.columns.get_mut(k).unwrap();
            let mut i = 0;
            values.retain(|_| {
                let keep_this = keep[i];
                i += 1;
                keep_this
            });
        }
    }

    fn row(&self, keys: &[ElementId], col: usize) -> Vec<ElementId> {
        keys.iter().map(|k| self.columns[k][col]).collect()
    }
}

/// Checked binding construction: rejects a binding that assigns a variable
/// outside `allowed` (spec.md §7 `InvalidParams` — "binding references
/// unknown variable").
pub fn validate_binding(binding: &Binding, allowed: &std::collections::HashSet<ElementId>) -> Result<(), ReplacementsError> {
    for &variable in binding.keys() {
        if !allowed.contains(&variable) {
            return Err(ReplacementsError::UnknownVariable(variable));
        }
    }
    Ok(())
}

fn common_keys(a: &Replacements, b: &Replacements) -> Vec<ElementId> {
    let b_keys = b.key_set();
    a.keys().filter(|k| b_keys.contains(k)).copied().collect()
}

/// Cheap fingerprint over a row's values on a fixed key set: a filter, not an
/// identity. Final equality is always re-checked column by column.
fn row_hash(values: &[ElementId]) -> u64 {
    const PRIMES: [u64; 8] = [
        1_000_003, 1_000_033, 1_000_037, 1_000_039, 1_000_081, 1_000_099, 1_000_117, 1_000_121,
    ];
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values
        .iter()
        .enumerate()
        .map(|(i, v)| v.raw().wrapping_mul(PRIMES[i % PRIMES.len()]))
        .fold(0u64, |acc, x| acc.wrapping_add(x));
    sum / (values.len() as u64)
}

/// Bucket column indices of `table` (restricted to `keys`) by [`row_hash`], so
/// `intersect`/`subtract` can iterate matching buckets instead of the full
/// O(|A|*|B|) cross product.
fn hashes_on(table: &Replacements, keys: &[ElementId]) -> HashMap<u64, Vec<usize>> {
    let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
    for col in 0..table.columns() {
        let row = table.row(keys, col);
        buckets.entry(row_hash(&row)).or_default().push(col);
    }
    buckets
}

/// Relational natural join on common keys. Degenerate cases: if `a` has zero
/// columns, return a deep copy of `b`; if `b` has zero columns, return a deep
/// copy of `a`. Output is canonicalized by duplicate-column removal.
pub fn intersect(a: &Replacements, b: &Replacements) -> Replacements {
    if a.columns() == 0 {
        return b.clone();
    }
    if b.columns() == 0 {
        return a.clone();
    }

    let common = common_keys(a, b);
    let a_only: Vec<ElementId> = a.keys().filter(|k| !common.contains(k)).copied().collect();
    let b_only: Vec<ElementId> = b.keys().filter(|k| !common.contains(k)).copied().collect();

    let mut result = Replacements::new();
    if common.is_empty() {
        for col_a in 0..a.columns() {
            for col_b in 0..b.columns() {
                let mut binding: Binding = HashMap::new();
                for &k in a.keys() {
                    binding.insert(k, a.value_at(k, col_a).unwrap());
                }
                for &k in &b_only {
                    binding.insert(k, b.value_at(k, col_b).unwrap());
                }
                result.insert_column(&binding);
            }
        }
        result.dedup_columns();
        return result;
    }

    let b_buckets = hashes_on(b, &common);
    for col_a in 0..a.columns() {
        let a_row = a.row(&common, col_a);
        let hash = row_hash(&a_row);
        let Some(candidates) = b_buckets.get(&hash) else {
            continue;
        };
        for &col_b in candidates {
            let b_row = b.row(&common, col_b);
            if a_row != b_row {
                continue;
            }
            let mut binding: Binding = HashMap::new();
            for &k in a.keys() {
                binding.insert(k, a.value_at(k, col_a).unwrap());
            }
            for &k in &b_only {
                binding.insert(k, b.value_at(k, col_b).unwrap());
            }
            result.insert_column(&binding);
        }
    }
    result.dedup_columns();
    result
}

/// Antijoin: columns of `a` for which no column of `b` agrees on every common
/// key. If either side has zero columns, or they share no keys, returns a copy
/// of `a` (matching the "no constraint to subtract" reading of spec.md §4.1).
pub fn subtract(a: &Replacements, b: &Replacements) -> Replacements {
    if a.columns() == 0 || b.columns() == 0 {
        return a.clone();
    }
    let common = common_keys(a, b);
    if common.is_empty() {
        return a.clone();
    }

    let b_buckets = hashes_on(b, &common);
    let mut result = Replacements::new();
    for col_a in 0..a.columns() {
        let a_row = a.row(&common, col_a);
        let hash = row_hash(&a_row);
        let agrees = b_buckets
            .get(&hash)
            .map(|candidates| candidates.iter().any(|&col_b| b.row(&common, col_b) == a_row))
            .unwrap_or(false);
        if agrees {
            continue;
        }
        let mut binding: Binding = HashMap::new();
        for &k in a.keys() {
            binding.insert(k, a.value_at(k, col_a).unwrap());
        }
        result.insert_column(&binding);
    }
    result.dedup_columns();
    result
}

/// Column concatenation with cross-product semantics on non-common keys.
pub fn unite(a: &Replacements, b: &Replacements) -> Replacements {
    if a.columns() == 0 {
        return b.clone();
    }
    if b.columns() == 0 {
        return a.clone();
    }

    let all_keys: std::collections::HashSet<ElementId> =
        a.keys().chain(b.keys()).copied().collect();

    let mut result = Replacements::new();
    for col_a in 0..a.columns() {
        let mut binding: Binding = HashMap::new();
        for &k in &all_keys {
            if let Some(v) = a.value_at(k, col_a) {
                binding.insert(k, v);
            }
        }
        if binding.len() == all_keys.len() {
            result.insert_column(&binding);
        }
    }
    for col_b in 0..b.columns() {
        let mut binding: Binding = HashMap::new();
        for &k in &all_keys {
            if let Some(v) = b.value_at(k, col_b) {
                binding.insert(k, v);
            }
        }
        if binding.len() == all_keys.len() {
            result.insert_column(&binding);
        }
    }
    result.dedup_columns();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(n: u64) -> ElementId {
        ElementId::new(n)
    }

    fn table(pairs: &[(ElementId, &[u64])]) -> Replacements {
        let mut r = Replacements::new();
        let n = pairs[0].1.len();
        for col in 0..n {
            let binding: Binding = pairs.iter().map(|(k, vs)| (*k, e(vs[col]))).collect();
            r.insert_column(&binding);
        }
        r
    }

    #[test]
    fn intersect_is_commutative_up_to_permutation() {
        let x = e(100);
        let y = e(101);
        let a = table(&[(x, &[1, 1]), (y, &[2, 3])]);
        let b = table(&[(x, &[1]), (y, &[2])]);

        let ab = intersect(&a, &b);
        let ba = intersect(&b, &a);
        assert_eq!(ab.columns(), 1);
        assert_eq!(ba.columns(), 1);
        assert_eq!(ab.to_param_bindings(), ba.to_param_bindings());
    }

    #[test]
    fn intersect_with_zero_columns_copies_other_side() {
        let x = e(1);
        let a = Replacements::empty_with_keys([x]);
        let b = table(&[(x, &[1, 2])]);
        let result = intersect(&a, &b);
        assert_eq!(result.to_param_bindings(), b.to_param_bindings());
    }

    #[test]
    fn subtract_removes_agreeing_columns() {
        let x = e(1);
        let y = e(2);
        let a = table(&[(x, &[10, 10]), (y, &[20, 30])]);
        let b = table(&[(x, &[10]), (y, &[20])]);
        let result = subtract(&a, &b);
        assert_eq!(result.columns(), 1);
        assert_eq!(result.value_at(x, 0), Some(e(10)));
        assert_eq!(result.value_at(y, 0), Some(e(30)));
    }

    #[test]
    fn subtract_with_no_common_keys_returns_a() {
        let x = e(1);
        let y = e(2);
        let a = table(&[(x, &[10])]);
        let b = table(&[(y, &[20])]);
        let result = subtract(&a, &b);
        assert_eq!(result.to_param_bindings(), a.to_param_bindings());
    }

    #[test]
    fn dedup_removes_identical_columns() {
        let x = e(1);
        let mut r = table(&[(x, &[1, 1, 2])]);
        r.dedup_columns();
        assert_eq!(r.columns(), 2);
    }

    #[test]
    fn to_param_bindings_round_trips_from_bindings() {
        let x = e(1);
        let y = e(2);
        let bindings = vec![
            [(x, e(1)), (y, e(2))].into_iter().collect::<Binding>(),
            [(x, e(3)), (y, e(4))].into_iter().collect::<Binding>(),
        ];
        let r = Replacements::from_bindings(&[x, y], &bindings);
        assert_eq!(r.columns(), 2);
        let back = r.to_param_bindings();
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn associativity_of_intersect() {
        let x = e(1);
        let y = e(2);
        let z = e(3);
        let a = table(&[(x, &[1, 2]), (y, &[10, 20])]);
        let b = table(&[(y, &[10, 20]), (z, &[100, 200])]);
        let c = table(&[(z, &[100, 200])]);

        let left = intersect(&intersect(&a, &b), &c);
        let right = intersect(&a, &intersect(&b, &c));
        assert_eq!(left.columns(), right.columns());
    }
}
