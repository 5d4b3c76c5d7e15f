//! Condition orchestration: issue queries, reduce, evaluate per series,
//! aggregate into a [`ConditionResult`].

use crate::context::EvalContext;
use crate::error::{EngineError, Result};
use crate::evaluator::SeriesEvaluator;
use crate::executor::{DatasourceRef, ExecutorError, QueryExecutor};
use crate::model::{
    EvaluatorModel, MultipartQueryConditionModel, OperatorModel, QueryConditionModel,
    QueryPartModel, QuerySectionModel, ReducerModel,
};
use crate::multipart::{self, MultipartEvaluator};
use crate::normalize::normalize;
use crate::reducer::Reducer;
use crate::timerange::TimeRange;
use crate::Condition;
use sentra_common::types::{ConditionResult, EvalMatch, Operator, ReducedSeries, Series};
use serde_json::Value;
use std::collections::HashMap;

/// Metric name of the synthetic match emitted when a single-query condition
/// gets zero series back and its evaluator fires on the absence of data.
const NO_DATA_METRIC: &str = "NoData";

/// One parsed query: where it runs, over which span, and what to send.
#[derive(Debug, Clone)]
pub struct QueryTarget {
    pub ref_id: String,
    pub time_range: TimeRange,
    pub datasource: DatasourceRef,
    pub query_model: Value,
}

impl QueryTarget {
    fn from_model(model: &QuerySectionModel) -> Result<Self> {
        let [ref_id, from, to] = model.params.as_slice() else {
            return Err(EngineError::Validation(
                "query.params must be [refId, from, to]".to_string(),
            ));
        };
        if ref_id.is_empty() {
            return Err(EngineError::Validation("query is missing refId".to_string()));
        }

        Ok(Self {
            ref_id: ref_id.clone(),
            time_range: TimeRange::parse(from, to)?,
            datasource: DatasourceRef {
                id: model.datasource_id,
                uid: model.datasource_uid.clone(),
            },
            query_model: model.model.clone().unwrap_or(Value::Null),
        })
    }

    fn to_model(&self) -> QuerySectionModel {
        QuerySectionModel {
            params: vec![
                self.ref_id.clone(),
                self.time_range.from.raw().to_string(),
                self.time_range.to.raw().to_string(),
            ],
            datasource_id: self.datasource.id,
            datasource_uid: self.datasource.uid.clone(),
            model: match &self.query_model {
                Value::Null => None,
                other => Some(other.clone()),
            },
        }
    }

    async fn execute(&self, ctx: &EvalContext, executor: &dyn QueryExecutor) -> Result<Vec<Series>> {
        if ctx.cancel.is_cancelled() {
            return Err(EngineError::ExecutionTimeout);
        }
        executor
            .execute(ctx, &self.datasource, &self.time_range, &self.query_model)
            .await
            .map_err(|e| match e {
                ExecutorError::Timeout => EngineError::ExecutionTimeout,
                other => EngineError::QueryFailed {
                    ref_id: self.ref_id.clone(),
                    source: other,
                },
            })
    }
}

/// Single-query condition: reduce every returned series, evaluate each
/// reduced value, and fire when any series matches.
#[derive(Debug)]
pub struct QueryCondition {
    pub target: QueryTarget,
    pub reducer: Reducer,
    pub evaluator: SeriesEvaluator,
    pub operator: Operator,
}

impl QueryCondition {
    pub fn from_model(model: &QueryConditionModel) -> Result<Self> {
        Ok(Self {
            target: QueryTarget::from_model(&model.query)?,
            reducer: model
                .reducer
                .kind
                .parse()
                .map_err(EngineError::Validation)?,
            evaluator: SeriesEvaluator::from_model(&model.evaluator)?,
            operator: model.operator.as_ref().map(|o| o.kind).unwrap_or_default(),
        })
    }

    /// Reproduce the configuration this condition was built from.
    pub fn to_model(&self) -> QueryConditionModel {
        QueryConditionModel {
            query: self.target.to_model(),
            reducer: ReducerModel {
                kind: self.reducer.to_string(),
            },
            evaluator: EvaluatorModel {
                kind: self.evaluator.kind().to_string(),
                params: self.evaluator.params(),
            },
            operator: Some(OperatorModel {
                kind: self.operator,
            }),
        }
    }
}

#[async_trait::async_trait]
impl Condition for QueryCondition {
    async fn eval(
        &self,
        ctx: &EvalContext,
        executor: &dyn QueryExecutor,
    ) -> Result<ConditionResult> {
        let series_list = self.target.execute(ctx, executor).await?;
        let total = series_list.len();

        let mut empty_series_count = 0;
        let mut eval_matches = Vec::new();
        let mut all_matches = Vec::new();

        for series in &series_list {
            let reduced = self.reducer.reduce(series);
            if reduced.is_none() {
                empty_series_count += 1;
            }

            let matched = self.evaluator.eval(reduced, series.points.len());
            if ctx.debug {
                tracing::debug!(
                    ref_id = %self.target.ref_id,
                    metric = %series.name,
                    value = ?reduced,
                    matched,
                    "series evaluated"
                );
            }

            let eval_match = EvalMatch {
                metric: series.name.clone(),
                value: reduced,
                tags: series.tags.clone(),
            };
            if matched {
                eval_matches.push(eval_match.clone());
            }
            all_matches.push(eval_match);
        }

        // No series at all: give the evaluator a chance to fire on the
        // absence of data itself.
        if total == 0 && self.evaluator.eval(None, 0) {
            let eval_match = EvalMatch {
                metric: NO_DATA_METRIC.to_string(),
                value: None,
                tags: HashMap::new(),
            };
            eval_matches.push(eval_match.clone());
            all_matches.push(eval_match);
        }

        let result = ConditionResult {
            firing: !eval_matches.is_empty(),
            no_data_found: empty_series_count == total,
            operator: self.operator,
            eval_matches,
            all_matches,
        };
        tracing::debug!(
            ref_id = %self.target.ref_id,
            firing = result.firing,
            no_data_found = result.no_data_found,
            series = total,
            "condition evaluated"
        );
        Ok(result)
    }
}

/// One query part of a multi-part condition.
#[derive(Debug)]
pub struct QueryPart {
    pub target: QueryTarget,
    pub scalar: Option<f64>,
}

/// Multi-query condition: reduce each part's series, align them by name
/// against the first part, and compare the aligned values positionally.
#[derive(Debug)]
pub struct MultipartQueryCondition {
    pub parts: Vec<QueryPart>,
    pub reducer: Reducer,
    pub evaluator: Box<dyn MultipartEvaluator>,
    pub operator: Operator,
}

impl MultipartQueryCondition {
    pub fn from_model(model: &MultipartQueryConditionModel) -> Result<Self> {
        if model.query_parts.is_empty() {
            return Err(EngineError::Validation(
                "multipartQuery requires at least one query part".to_string(),
            ));
        }

        let parts = model
            .query_parts
            .iter()
            .map(|part| {
                Ok(QueryPart {
                    target: QueryTarget::from_model(&part.query)?,
                    scalar: part.scalar,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            parts,
            reducer: model
                .reducer
                .kind
                .parse()
                .map_err(EngineError::Validation)?,
            evaluator: multipart::from_model(&model.evaluator)?,
            operator: model.operator.as_ref().map(|o| o.kind).unwrap_or_default(),
        })
    }

    /// Reproduce the configuration this condition was built from.
    pub fn to_model(&self) -> MultipartQueryConditionModel {
        MultipartQueryConditionModel {
            query_parts: self
                .parts
                .iter()
                .map(|part| QueryPartModel {
                    query: part.target.to_model(),
                    scalar: part.scalar,
                })
                .collect(),
            reducer: ReducerModel {
                kind: self.reducer.to_string(),
            },
            evaluator: EvaluatorModel {
                kind: self.evaluator.kind().to_string(),
                params: Vec::new(),
            },
            operator: Some(OperatorModel {
                kind: self.operator,
            }),
        }
    }

    /// Reduce one part's series into a name-keyed map, applying the part's
    /// scalar multiplier when both it and the reduced value are present.
    fn reduce_part(&self, part: &QueryPart, series_list: Vec<Series>) -> HashMap<String, ReducedSeries> {
        let mut reduced_map = HashMap::with_capacity(series_list.len());
        for series in series_list {
            let mut value = self.reducer.reduce(&series);
            if let (Some(v), Some(scalar)) = (value, part.scalar) {
                value = Some(v * scalar);
            }
            reduced_map.insert(
                series.name.clone(),
                ReducedSeries {
                    name: series.name,
                    tags: series.tags,
                    value,
                },
            );
        }
        reduced_map
    }
}

#[async_trait::async_trait]
impl Condition for MultipartQueryCondition {
    async fn eval(
        &self,
        ctx: &EvalContext,
        executor: &dyn QueryExecutor,
    ) -> Result<ConditionResult> {
        // Parts run one at a time, in declaration order.
        let mut reduced_per_query = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let series_list = part.target.execute(ctx, executor).await?;
            if ctx.debug {
                tracing::debug!(
                    ref_id = %part.target.ref_id,
                    series = series_list.len(),
                    "query part executed"
                );
            }
            reduced_per_query.push(self.reduce_part(part, series_list));
        }

        let normalized = normalize(&reduced_per_query)?;
        let expected = self.evaluator.expected_query_count();
        if normalized.len() != expected {
            return Err(EngineError::QueryCountMismatch {
                expected,
                actual: normalized.len(),
            });
        }

        // Sorted reference order keeps the result deterministic.
        let mut reference: Vec<(&String, &ReducedSeries)> = normalized[0].iter().collect();
        reference.sort_by(|a, b| a.0.cmp(b.0));
        let total = reference.len();

        let mut empty_series_count = 0;
        let mut eval_matches = Vec::new();
        let mut all_matches = Vec::new();

        for (name, reference_series) in reference {
            let values: Vec<Option<f64>> = normalized
                .iter()
                .map(|query| query.get(name).and_then(|s| s.value))
                .collect();
            if values.first().copied().flatten().is_none() {
                empty_series_count += 1;
            }

            let matched = self.evaluator.eval(&values);
            if ctx.debug {
                tracing::debug!(metric = %name, values = ?values, matched, "series compared");
            }

            let eval_match = EvalMatch {
                metric: name.clone(),
                value: reference_series.value,
                tags: reference_series.tags.clone(),
            };
            if matched {
                eval_matches.push(eval_match.clone());
            }
            all_matches.push(eval_match);
        }

        let result = ConditionResult {
            firing: !eval_matches.is_empty(),
            no_data_found: empty_series_count == total,
            operator: self.operator,
            eval_matches,
            all_matches,
        };
        tracing::debug!(
            parts = self.parts.len(),
            firing = result.firing,
            no_data_found = result.no_data_found,
            series = total,
            "multipart condition evaluated"
        );
        Ok(result)
    }
}
