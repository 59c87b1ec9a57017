//! Policy flags shared across the template manager (C4), searcher (C3), and
//! expression tree (C6). Grouped here rather than duplicated per module,
//! since the driver and `InferenceFlowConfig` (§6) need to set all three
//! together.

/// Whether a formula-generation step skips formulas that already have a
/// matching instance (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationType {
    /// Skip generation when a matching instance already exists.
    GenerateUniqueFormulas,
    /// Always attempt generation, regardless of pre-existing instances.
    GenerateAll,
}

/// How many embeddings a search step should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplacementsUsingType {
    /// Stop at the first successful match per formula.
    First,
    /// Enumerate every match.
    All,
}

impl ReplacementsUsingType {
    pub fn stop_after_first(self) -> bool {
        matches!(self, ReplacementsUsingType::First)
    }
}

/// What gets published into the output structure after a successful
/// generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillingType {
    /// Only newly created elements.
    GeneratedOnly,
    /// Newly created elements plus previously found elements that
    /// participated in the match.
    SearchedAndGenerated,
}
