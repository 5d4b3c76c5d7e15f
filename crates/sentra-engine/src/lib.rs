//! Alert condition evaluation engine.
//!
//! Turns raw time-series query results into a firing/not-firing verdict:
//! each [`Condition`] issues its queries through a caller-provided
//! [`executor::QueryExecutor`], collapses every returned series to a scalar
//! with a [`reducer::Reducer`], runs the configured evaluator over the
//! reduced values, and assembles a
//! [`ConditionResult`](sentra_common::types::ConditionResult). Multi-query
//! conditions additionally align their reduced series by name before
//! comparing them positionally.
//!
//! The engine holds no state across invocations: every call gets a fresh
//! [`context::EvalContext`] and produces fresh value objects, so conditions
//! for different rules can be evaluated concurrently without locks.

pub mod condition;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod handler;
pub mod model;
pub mod multipart;
pub mod normalize;
pub mod reducer;
pub mod registry;
pub mod timerange;


use crate::context::EvalContext;
use crate::executor::QueryExecutor;
use sentra_common::types::ConditionResult;

/// One condition of an alert rule, built from its JSON model by the
/// [`registry::ConditionRegistry`] and evaluated by the rule scheduler.
///
/// Implementations are stateless between invocations; `eval` issues the
/// condition's queries sequentially through `executor` and must respect the
/// context's cancellation token. Any query, normalization, or evaluator
/// failure aborts the invocation with an error — it is never reported as a
/// "no data" result.
#[async_trait::async_trait]
pub trait Condition: std::fmt::Debug + Send + Sync {
    async fn eval(
        &self,
        ctx: &EvalContext,
        executor: &dyn QueryExecutor,
    ) -> error::Result<ConditionResult>;
}
