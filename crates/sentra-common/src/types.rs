use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One sample in a time series.
///
/// `value` is `None` when the datasource reported an explicit null for this
/// timestamp. A null is distinct from `0.0` and the distinction must survive
/// reduction and evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub value: Option<f64>,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
}

impl Point {
    pub fn new(value: impl Into<Option<f64>>, timestamp: i64) -> Self {
        Self {
            value: value.into(),
            timestamp,
        }
    }
}

/// A named, tagged, time-ascending sequence of points as returned by a
/// datasource query. May be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(name: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            tags: HashMap::new(),
            points,
        }
    }
}

/// A series collapsed to one optional scalar by a reducer.
///
/// `value: None` means the series could not be reduced: every point was null,
/// or there were no points at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedSeries {
    pub name: String,
    pub tags: HashMap<String, String>,
    pub value: Option<f64>,
}

/// One evaluated series in a condition result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalMatch {
    pub metric: String,
    pub value: Option<f64>,
    pub tags: HashMap<String, String>,
}

/// How a condition's verdict combines with the previous conditions of the
/// same rule. The engine passes it through untouched.
///
/// # Examples
///
/// ```
/// use sentra_common::types::Operator;
///
/// let op: Operator = "or".parse().unwrap();
/// assert_eq!(op, Operator::Or);
/// assert_eq!(op.to_string(), "or");
/// assert_eq!(Operator::default(), Operator::And);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    And,
    Or,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::And => write!(f, "and"),
            Operator::Or => write!(f, "or"),
        }
    }
}

impl std::str::FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "and" => Ok(Operator::And),
            "or" => Ok(Operator::Or),
            _ => Err(format!("unknown operator: {s}")),
        }
    }
}

/// The verdict for one condition of a rule.
///
/// `eval_matches` holds only the series that triggered; `all_matches` holds
/// every evaluated series for diagnostics, so `eval_matches` is always a
/// subset of `all_matches` by metric name. `no_data_found` is computed purely
/// from how many series reduced to null, never from evaluator results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionResult {
    pub firing: bool,
    pub no_data_found: bool,
    pub operator: Operator,
    pub eval_matches: Vec<EvalMatch>,
    pub all_matches: Vec<EvalMatch>,
}

/// Format a tags map into a stable human-readable string.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use sentra_common::types::format_tags;
///
/// let mut tags = HashMap::new();
/// tags.insert("host".to_string(), "web-01".to_string());
/// tags.insert("device".to_string(), "sda1".to_string());
/// assert_eq!(format_tags(&tags), "device=sda1, host=web-01");
/// ```
pub fn format_tags(tags: &HashMap<String, String>) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let mut pairs: Vec<String> = tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    pairs.join(", ")
}
