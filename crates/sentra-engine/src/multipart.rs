use crate::error::{EngineError, Result};
use crate::model::EvaluatorModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    GtQuery,
    LtQuery,
}

/// Predicate over one normalized row of reduced values, ordered by query
/// part. Used for "A vs B" style conditions where the evaluator needs the
/// values of several queries at once rather than a single scalar.
pub trait MultipartEvaluator: std::fmt::Debug + Send + Sync {
    /// How many normalized query results `eval` expects. A mismatch is a
    /// hard evaluation error, never a partial result.
    fn expected_query_count(&self) -> usize;

    fn eval(&self, values: &[Option<f64>]) -> bool;

    /// The configuration `type` string this evaluator was built from.
    fn kind(&self) -> &'static str;
}

/// Compares the reference query's reduced value against the second query's.
/// Either side missing means no match.
#[derive(Debug)]
pub struct QueryComparisonEvaluator {
    pub op: ComparisonOp,
}

impl MultipartEvaluator for QueryComparisonEvaluator {
    fn expected_query_count(&self) -> usize {
        2
    }

    fn eval(&self, values: &[Option<f64>]) -> bool {
        let reference = values.first().copied().flatten();
        let other = values.get(1).copied().flatten();
        match (reference, other) {
            (Some(a), Some(b)) => match self.op {
                ComparisonOp::GtQuery => a > b,
                ComparisonOp::LtQuery => a < b,
            },
            _ => false,
        }
    }

    fn kind(&self) -> &'static str {
        match self.op {
            ComparisonOp::GtQuery => "gt-query",
            ComparisonOp::LtQuery => "lt-query",
        }
    }
}

pub fn from_model(model: &EvaluatorModel) -> Result<Box<dyn MultipartEvaluator>> {
    match model.kind.as_str() {
        "gt-query" => Ok(Box::new(QueryComparisonEvaluator {
            op: ComparisonOp::GtQuery,
        })),
        "lt-query" => Ok(Box::new(QueryComparisonEvaluator {
            op: ComparisonOp::LtQuery,
        })),
        other => Err(EngineError::Validation(format!(
            "unknown multipart evaluator type: {other}"
        ))),
    }
}
