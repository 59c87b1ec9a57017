//! Top-level error type returned by [`crate::driver::apply_inference`],
//! aggregating the per-module errors via `#[from]` (mirroring the teacher's
//! `query_engine::errors::QueryEngineError` aggregation style) and surfacing
//! spec.md §7's four named kinds.

use thiserror::Error;

use crate::element::ElementId;
use crate::expr_tree::ExpressionError;
use crate::lru_cache::LruError;
use crate::searcher::SearchError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum InferenceError {
    /// LRU cache size is 0, or a binding references an unknown variable.
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] LruError),

    /// No priority-ordered rule sets exist under the given formula set.
    #[error("no priority-ordered rule sets exist under formula set {0}")]
    ItemNotFound(ElementId),

    /// After a successful generation, a formula variable has no binding in
    /// either the generation result or the input parameters.
    #[error("broken invariant: formula variable {0} has no binding after generation")]
    InvalidState(ElementId),

    /// The knowledge base refused to construct a template from a formula
    /// plus binding.
    #[error("template could not be built for formula {0}")]
    TemplateNotBuilt(ElementId),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Expression(#[from] ExpressionError),
}
