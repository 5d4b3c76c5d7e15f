//! End-to-end condition evaluation against a mock query executor.

use chrono::Utc;
use sentra_common::types::{Operator, Point, Series};
use sentra_engine::context::EvalContext;
use sentra_engine::error::EngineError;
use sentra_engine::executor::{DatasourceRef, ExecutorError, QueryExecutor};
use sentra_engine::handler::evaluate_rule;
use sentra_engine::registry::ConditionRegistry;
use sentra_engine::timerange::TimeRange;
use sentra_engine::Condition;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Serves canned series keyed by the query model's `refId`.
struct MockExecutor {
    responses: HashMap<String, Vec<Series>>,
}

impl MockExecutor {
    fn new(responses: &[(&str, Vec<Series>)]) -> Self {
        Self {
            responses: responses
                .iter()
                .map(|(ref_id, series)| (ref_id.to_string(), series.clone()))
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl QueryExecutor for MockExecutor {
    async fn execute(
        &self,
        _ctx: &EvalContext,
        _datasource: &DatasourceRef,
        _range: &TimeRange,
        query_model: &Value,
    ) -> Result<Vec<Series>, ExecutorError> {
        let key = query_model
            .get("refId")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(self.responses.get(key).cloned().unwrap_or_default())
    }
}

/// Always fails with the configured error class.
struct FailingExecutor {
    timeout: bool,
}

#[async_trait::async_trait]
impl QueryExecutor for FailingExecutor {
    async fn execute(
        &self,
        _ctx: &EvalContext,
        _datasource: &DatasourceRef,
        _range: &TimeRange,
        _query_model: &Value,
    ) -> Result<Vec<Series>, ExecutorError> {
        if self.timeout {
            Err(ExecutorError::Timeout)
        } else {
            Err(ExecutorError::Other("connection refused".to_string()))
        }
    }
}

/// Panics when reached, to prove the engine stopped before issuing a query.
struct UnreachableExecutor;

#[async_trait::async_trait]
impl QueryExecutor for UnreachableExecutor {
    async fn execute(
        &self,
        _ctx: &EvalContext,
        _datasource: &DatasourceRef,
        _range: &TimeRange,
        _query_model: &Value,
    ) -> Result<Vec<Series>, ExecutorError> {
        panic!("executor must not be reached after cancellation");
    }
}

fn series(name: &str, values: &[Option<f64>]) -> Series {
    let points = values
        .iter()
        .enumerate()
        .map(|(i, v)| Point::new(*v, (i as i64 + 1) * 1000))
        .collect();
    Series::new(name, points)
}

fn query_condition(ref_id: &str, reducer: &str, evaluator: Value) -> Box<dyn Condition> {
    let model = json!({
        "type": "query",
        "query": {
            "params": [ref_id, "5m", "now"],
            "model": { "refId": ref_id }
        },
        "reducer": { "type": reducer },
        "evaluator": evaluator
    });
    ConditionRegistry::default().build(&model).unwrap()
}

fn ctx() -> EvalContext {
    EvalContext::new(Utc::now())
}

#[tokio::test]
async fn fires_when_a_series_breaches_the_threshold() {
    let executor = MockExecutor::new(&[(
        "A",
        vec![
            series("web-01", &[Some(95.0), Some(97.0)]),
            series("web-02", &[Some(40.0), Some(42.0)]),
        ],
    )]);
    let condition = query_condition("A", "avg", json!({ "type": "gt", "params": [90.0] }));

    let result = condition.eval(&ctx(), &executor).await.unwrap();
    assert!(result.firing);
    assert!(!result.no_data_found);
    assert_eq!(result.eval_matches.len(), 1);
    assert_eq!(result.eval_matches[0].metric, "web-01");
    assert_eq!(result.eval_matches[0].value, Some(96.0));
    assert_eq!(result.all_matches.len(), 2);
}

#[tokio::test]
async fn does_not_fire_below_the_threshold() {
    let executor = MockExecutor::new(&[("A", vec![series("web-01", &[Some(40.0)])])]);
    let condition = query_condition("A", "avg", json!({ "type": "gt", "params": [90.0] }));

    let result = condition.eval(&ctx(), &executor).await.unwrap();
    assert!(!result.firing);
    assert!(result.eval_matches.is_empty());
    // Diagnostics still carry every evaluated series
    assert_eq!(result.all_matches.len(), 1);
}

#[tokio::test]
async fn no_data_found_when_every_series_reduces_to_null() {
    let executor = MockExecutor::new(&[(
        "A",
        vec![series("web-01", &[None, None]), series("web-02", &[None])],
    )]);
    let condition = query_condition("A", "avg", json!({ "type": "gt", "params": [90.0] }));

    let result = condition.eval(&ctx(), &executor).await.unwrap();
    assert!(!result.firing);
    assert!(result.no_data_found);
}

#[tokio::test]
async fn partial_nulls_are_not_no_data() {
    let executor = MockExecutor::new(&[(
        "A",
        vec![series("web-01", &[None, None]), series("web-02", &[Some(50.0)])],
    )]);
    let condition = query_condition("A", "avg", json!({ "type": "gt", "params": [90.0] }));

    let result = condition.eval(&ctx(), &executor).await.unwrap();
    assert!(!result.no_data_found);
}

#[tokio::test]
async fn zero_series_with_no_value_evaluator_fires_synthetic_match() {
    let executor = MockExecutor::new(&[("A", vec![])]);
    let condition = query_condition("A", "avg", json!({ "type": "no_value" }));

    let result = condition.eval(&ctx(), &executor).await.unwrap();
    assert!(result.firing);
    assert!(result.no_data_found);
    assert_eq!(result.eval_matches.len(), 1);
    assert_eq!(result.eval_matches[0].metric, "NoData");
    assert_eq!(result.eval_matches[0].value, None);
    assert_eq!(result.all_matches.len(), 1);
}

#[tokio::test]
async fn zero_series_with_threshold_evaluator_is_just_no_data() {
    let executor = MockExecutor::new(&[("A", vec![])]);
    let condition = query_condition("A", "avg", json!({ "type": "gt", "params": [90.0] }));

    let result = condition.eval(&ctx(), &executor).await.unwrap();
    assert!(!result.firing);
    assert!(result.no_data_found);
    assert!(result.eval_matches.is_empty());
    assert!(result.all_matches.is_empty());
}

#[tokio::test]
async fn all_null_series_does_not_fire_no_value() {
    // Points exist but every value is null: that is no-data, not no-points
    let executor = MockExecutor::new(&[("A", vec![series("web-01", &[None, None])])]);
    let condition = query_condition("A", "avg", json!({ "type": "no_value" }));

    let result = condition.eval(&ctx(), &executor).await.unwrap();
    assert!(!result.firing);
    assert!(result.no_data_found);
}

fn multipart_condition(scalar: Option<f64>, evaluator: &str) -> Box<dyn Condition> {
    let mut second = json!({ "query": { "params": ["B", "5m", "now"], "model": { "refId": "B" } } });
    if let Some(scalar) = scalar {
        second["scalar"] = json!(scalar);
    }
    let model = json!({
        "type": "multipartQuery",
        "queryParts": [
            { "query": { "params": ["A", "5m", "now"], "model": { "refId": "A" } } },
            second
        ],
        "reducer": { "type": "avg" },
        "evaluator": { "type": evaluator }
    });
    ConditionRegistry::default().build(&model).unwrap()
}

#[tokio::test]
async fn multipart_broadcasts_a_scalar_like_query() {
    let executor = MockExecutor::new(&[
        (
            "A",
            vec![
                series("web-01", &[Some(10.0)]),
                series("web-02", &[Some(30.0)]),
            ],
        ),
        ("B", vec![series("limit", &[Some(40.0)])]),
    ]);
    // 40 * 0.5 = 20: only web-02 exceeds the broadcast comparator
    let condition = multipart_condition(Some(0.5), "gt-query");

    let result = condition.eval(&ctx(), &executor).await.unwrap();
    assert!(result.firing);
    assert_eq!(result.eval_matches.len(), 1);
    assert_eq!(result.eval_matches[0].metric, "web-02");
    assert_eq!(result.eval_matches[0].value, Some(30.0));
    assert_eq!(result.all_matches.len(), 2);
    assert!(!result.no_data_found);
}

#[tokio::test]
async fn multipart_null_on_either_side_never_matches() {
    let executor = MockExecutor::new(&[
        (
            "A",
            vec![series("web-01", &[None]), series("web-02", &[Some(30.0)])],
        ),
        ("B", vec![series("limit", &[Some(20.0)])]),
    ]);
    let condition = multipart_condition(None, "gt-query");

    let result = condition.eval(&ctx(), &executor).await.unwrap();
    assert_eq!(result.eval_matches.len(), 1);
    assert_eq!(result.eval_matches[0].metric, "web-02");
    // web-01 reduced to null in the reference query
    assert!(!result.no_data_found);
}

#[tokio::test]
async fn multipart_rejects_a_series_name_mismatch() {
    let executor = MockExecutor::new(&[
        (
            "A",
            vec![
                series("web-01", &[Some(1.0)]),
                series("web-02", &[Some(2.0)]),
            ],
        ),
        (
            "B",
            vec![
                series("web-01", &[Some(1.0)]),
                series("db-01", &[Some(2.0)]),
            ],
        ),
    ]);
    let condition = multipart_condition(None, "gt-query");

    let err = condition.eval(&ctx(), &executor).await.unwrap_err();
    match err {
        EngineError::MissingSeries { query_index, name } => {
            assert_eq!(query_index, 1);
            assert_eq!(name, "web-02");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn multipart_part_count_must_match_the_evaluator() {
    let model = json!({
        "type": "multipartQuery",
        "queryParts": [
            { "query": { "params": ["A", "5m", "now"], "model": { "refId": "A" } } },
            { "query": { "params": ["B", "5m", "now"], "model": { "refId": "B" } } },
            { "query": { "params": ["C", "5m", "now"], "model": { "refId": "C" } } }
        ],
        "reducer": { "type": "avg" },
        "evaluator": { "type": "gt-query" }
    });
    let condition = ConditionRegistry::default().build(&model).unwrap();
    let executor = MockExecutor::new(&[
        ("A", vec![series("s", &[Some(1.0)])]),
        ("B", vec![series("s", &[Some(2.0)])]),
        ("C", vec![series("s", &[Some(3.0)])]),
    ]);

    let err = condition.eval(&ctx(), &executor).await.unwrap_err();
    assert!(
        matches!(
            err,
            EngineError::QueryCountMismatch {
                expected: 2,
                actual: 3
            }
        ),
        "{err}"
    );
}

#[tokio::test]
async fn executor_timeout_becomes_the_timeout_error() {
    let condition = query_condition("A", "avg", json!({ "type": "gt", "params": [90.0] }));
    let err = condition
        .eval(&ctx(), &FailingExecutor { timeout: true })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExecutionTimeout), "{err}");
    assert!(err.to_string().contains("exceeded the timeout"));
}

#[tokio::test]
async fn executor_failures_name_the_query_part() {
    let condition = query_condition("A", "avg", json!({ "type": "gt", "params": [90.0] }));
    let err = condition
        .eval(&ctx(), &FailingExecutor { timeout: false })
        .await
        .unwrap_err();
    match err {
        EngineError::QueryFailed { ref_id, source } => {
            assert_eq!(ref_id, "A");
            assert!(source.to_string().contains("connection refused"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn a_canceled_context_aborts_before_querying() {
    let condition = query_condition("A", "avg", json!({ "type": "gt", "params": [90.0] }));
    let ctx = ctx();
    ctx.cancel.cancel();

    let err = condition.eval(&ctx, &UnreachableExecutor).await.unwrap_err();
    assert!(matches!(err, EngineError::ExecutionTimeout), "{err}");
}

#[tokio::test]
async fn rule_verdict_folds_condition_operators() {
    let executor = MockExecutor::new(&[
        ("A", vec![series("web-01", &[Some(95.0)])]),
        ("B", vec![series("web-01", &[Some(10.0)])]),
    ]);

    let firing = json!({
        "type": "query",
        "query": { "params": ["A", "5m", "now"], "model": { "refId": "A" } },
        "reducer": { "type": "avg" },
        "evaluator": { "type": "gt", "params": [90.0] }
    });
    let quiet_and = json!({
        "type": "query",
        "query": { "params": ["B", "5m", "now"], "model": { "refId": "B" } },
        "reducer": { "type": "avg" },
        "evaluator": { "type": "gt", "params": [90.0] },
        "operator": { "type": "and" }
    });
    let mut quiet_or = quiet_and.clone();
    quiet_or["operator"] = json!({ "type": "or" });

    let registry = ConditionRegistry::default();
    let conditions = vec![
        registry.build(&firing).unwrap(),
        registry.build(&quiet_and).unwrap(),
    ];
    let evaluation = evaluate_rule(&ctx(), &executor, &conditions).await.unwrap();
    assert!(!evaluation.firing);
    assert_eq!(evaluation.condition_evals, "[true AND false]");
    assert_eq!(evaluation.results.len(), 2);

    let conditions = vec![
        registry.build(&firing).unwrap(),
        registry.build(&quiet_or).unwrap(),
    ];
    let evaluation = evaluate_rule(&ctx(), &executor, &conditions).await.unwrap();
    assert!(evaluation.firing);
    assert_eq!(evaluation.condition_evals, "[true OR false]");
}

#[tokio::test]
async fn first_condition_seeds_the_rule_verdict() {
    let executor = MockExecutor::new(&[("A", vec![series("web-01", &[Some(95.0)])])]);
    let condition = query_condition("A", "avg", json!({ "type": "gt", "params": [90.0] }));

    let evaluation = evaluate_rule(&ctx(), &executor, &[condition]).await.unwrap();
    assert!(evaluation.firing);
    assert!(!evaluation.no_data_found);
    assert_eq!(evaluation.condition_evals, "true");
}

#[tokio::test]
async fn result_carries_the_configured_operator() {
    let executor = MockExecutor::new(&[("A", vec![series("web-01", &[Some(1.0)])])]);
    let model = json!({
        "type": "query",
        "query": { "params": ["A", "5m", "now"], "model": { "refId": "A" } },
        "reducer": { "type": "avg" },
        "evaluator": { "type": "gt", "params": [90.0] },
        "operator": { "type": "or" }
    });
    let condition = ConditionRegistry::default().build(&model).unwrap();

    let result = condition.eval(&ctx(), &executor).await.unwrap();
    assert_eq!(result.operator, Operator::Or);
}

#[tokio::test]
async fn registry_rejects_unknown_condition_types() {
    let registry = ConditionRegistry::default();
    let err = registry
        .build(&json!({ "type": "classic" }))
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "{err}");

    let err = registry.build(&json!({ "reducer": {} })).unwrap_err();
    assert!(err.to_string().contains("type"), "{err}");
}

#[tokio::test]
async fn debug_flag_does_not_change_the_result() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let executor = MockExecutor::new(&[(
        "A",
        vec![
            series("web-01", &[Some(95.0)]),
            series("web-02", &[None]),
        ],
    )]);
    let condition = query_condition("A", "avg", json!({ "type": "gt", "params": [90.0] }));

    let plain = condition.eval(&ctx(), &executor).await.unwrap();
    let debug = condition
        .eval(&ctx().with_debug(true), &executor)
        .await
        .unwrap();
    assert_eq!(plain.firing, debug.firing);
    assert_eq!(plain.no_data_found, debug.no_data_found);
    assert_eq!(plain.eval_matches, debug.eval_matches);
    assert_eq!(plain.all_matches, debug.all_matches);
}
