use crate::executor::ExecutorError;

/// Errors that can occur while constructing or evaluating a condition.
///
/// Validation errors are raised at construction time, before any query
/// executes, so they can be surfaced to whoever is authoring the rule.
/// Everything else aborts the current evaluation and propagates to the
/// scheduler; nothing is downgraded to a "no data" or "not firing" result.
///
/// # Examples
///
/// ```rust
/// use sentra_engine::error::EngineError;
///
/// let err = EngineError::Validation("evaluator 'gt' is missing the threshold parameter".into());
/// assert!(err.to_string().contains("threshold"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed condition configuration. Never retried.
    #[error("Engine: invalid condition: {0}")]
    Validation(String),

    /// A reference series has no counterpart of the same name in a later
    /// query of a multi-part condition.
    #[error("Engine: cannot normalize: query {query_index} is missing series '{name}'")]
    MissingSeries { query_index: usize, name: String },

    /// A later query of a multi-part condition returned no series at all.
    #[error("Engine: cannot normalize: query {query_index} returned no results")]
    EmptyQueryResult { query_index: usize },

    /// Series counts across queries admit no unambiguous alignment.
    #[error(
        "Engine: cannot normalize: query {query_index} returned {actual} series, \
         expected {expected} or exactly one"
    )]
    AmbiguousJoin {
        query_index: usize,
        expected: usize,
        actual: usize,
    },

    /// The number of normalized query results does not match what the
    /// evaluator expects.
    #[error("Engine: evaluator expects {expected} query results, got {actual}")]
    QueryCountMismatch { expected: usize, actual: usize },

    /// The executor timed out or the evaluation context was canceled.
    #[error("Engine: alert execution exceeded the timeout")]
    ExecutionTimeout,

    /// The executor failed for a reason other than a timeout.
    #[error("Engine: query {ref_id} failed: {source}")]
    QueryFailed {
        ref_id: String,
        #[source]
        source: ExecutorError,
    },
}

/// Convenience `Result` alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
