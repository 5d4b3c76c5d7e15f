use crate::error::{EngineError, Result};
use crate::model::EvaluatorModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdOp {
    Gt,
    Lt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    Within,
    Outside,
}

/// Decides pass/fail for one reduced series.
///
/// Built once from the condition's `{ type, params }` model; the string
/// discriminator does not survive past construction. The input is the
/// reduced value plus the raw point count of the series it came from —
/// `no_value` fires on the point count alone and ignores the reduced value
/// entirely, so an all-null series (which reduces to `None`) does not fire
/// it. Callers evaluate the "no series at all" case as `(None, 0)`.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesEvaluator {
    Threshold { op: ThresholdOp, threshold: f64 },
    Ranged { mode: RangeMode, lower: f64, upper: f64 },
    NoValue,
}

impl SeriesEvaluator {
    pub fn from_model(model: &EvaluatorModel) -> Result<Self> {
        match model.kind.as_str() {
            "gt" | "lt" => {
                let threshold = *model.params.first().ok_or_else(|| {
                    EngineError::Validation(format!(
                        "evaluator '{}' is missing the threshold parameter",
                        model.kind
                    ))
                })?;
                let op = if model.kind == "gt" {
                    ThresholdOp::Gt
                } else {
                    ThresholdOp::Lt
                };
                Ok(Self::Threshold { op, threshold })
            }
            "within_range" | "outside_range" => {
                if model.params.len() < 2 {
                    return Err(EngineError::Validation(format!(
                        "evaluator '{}' requires two range parameters",
                        model.kind
                    )));
                }
                let mode = if model.kind == "within_range" {
                    RangeMode::Within
                } else {
                    RangeMode::Outside
                };
                Ok(Self::Ranged {
                    mode,
                    lower: model.params[0],
                    upper: model.params[1],
                })
            }
            "no_value" => Ok(Self::NoValue),
            other => Err(EngineError::Validation(format!(
                "unknown evaluator type: {other}"
            ))),
        }
    }

    pub fn eval(&self, value: Option<f64>, point_count: usize) -> bool {
        match self {
            Self::Threshold { op, threshold } => value.is_some_and(|v| match op {
                ThresholdOp::Gt => v > *threshold,
                ThresholdOp::Lt => v < *threshold,
            }),
            // The bounds are not required to be ordered; a value equal to
            // either bound is neither inside nor outside.
            Self::Ranged { mode, lower, upper } => value.is_some_and(|v| match mode {
                RangeMode::Within => (*lower < v && v < *upper) || (*upper < v && v < *lower),
                RangeMode::Outside => (v < *lower && v < *upper) || (v > *lower && v > *upper),
            }),
            Self::NoValue => point_count == 0,
        }
    }

    /// The configuration `type` string this evaluator was built from.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Threshold {
                op: ThresholdOp::Gt,
                ..
            } => "gt",
            Self::Threshold {
                op: ThresholdOp::Lt,
                ..
            } => "lt",
            Self::Ranged {
                mode: RangeMode::Within,
                ..
            } => "within_range",
            Self::Ranged {
                mode: RangeMode::Outside,
                ..
            } => "outside_range",
            Self::NoValue => "no_value",
        }
    }

    /// The configuration `params` this evaluator was built from.
    pub fn params(&self) -> Vec<f64> {
        match self {
            Self::Threshold { threshold, .. } => vec![*threshold],
            Self::Ranged { lower, upper, .. } => vec![*lower, *upper],
            Self::NoValue => Vec::new(),
        }
    }
}
