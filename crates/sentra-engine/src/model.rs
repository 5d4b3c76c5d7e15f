//! Serde models for the JSON condition shape.
//!
//! These structs mirror the wire configuration exactly and exist only at the
//! parsing boundary: constructing a condition converts them into typed engine
//! values, and the string discriminators (`reducer.type`, `evaluator.type`)
//! do not survive past construction.

use sentra_common::types::Operator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `query` section of a condition: `params` is `[refId, from, to]`, the
/// datasource reference is opaque, and `model` is the datasource-specific
/// query payload handed to the executor untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySectionModel {
    pub params: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducerModel {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorModel {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorModel {
    #[serde(rename = "type")]
    pub kind: Operator,
}

/// Condition model for `type: "query"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConditionModel {
    pub query: QuerySectionModel,
    pub reducer: ReducerModel,
    pub evaluator: EvaluatorModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<OperatorModel>,
}

/// One part of a `type: "multipartQuery"` condition. `scalar` multiplies the
/// part's reduced values when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPartModel {
    pub query: QuerySectionModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<f64>,
}

/// Condition model for `type: "multipartQuery"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartQueryConditionModel {
    pub query_parts: Vec<QueryPartModel>,
    pub reducer: ReducerModel,
    pub evaluator: EvaluatorModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<OperatorModel>,
}
