use crate::context::EvalContext;
use crate::timerange::TimeRange;
use sentra_common::types::Series;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque reference to the datasource a query runs against. Either the
/// numeric id or the uid may be set; the engine passes both through
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasourceRef {
    pub id: Option<i64>,
    pub uid: Option<String>,
}

/// Failure classes an executor can report. The engine only distinguishes
/// timeouts (translated to the user-facing timeout error) from everything
/// else (wrapped with the failing query part and propagated unchanged).
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("query execution timed out")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

/// Datasource query execution, implemented by the embedding application.
///
/// The engine does not care how queries run — HTTP call, embedded engine,
/// cache — it only requires that returned series carry `(name, tags, points)`
/// and that errors are distinguishable as timeout vs other. Implementations
/// should honor `ctx.cancel` for long-running calls.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(
        &self,
        ctx: &EvalContext,
        datasource: &DatasourceRef,
        range: &TimeRange,
        query_model: &Value,
    ) -> Result<Vec<Series>, ExecutorError>;
}
