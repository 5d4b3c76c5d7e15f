use crate::context::EvalContext;
use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::Condition;
use sentra_common::types::{ConditionResult, Operator};

/// The combined verdict of every condition of one rule.
#[derive(Debug, Clone)]
pub struct RuleEvaluation {
    pub firing: bool,
    pub no_data_found: bool,
    /// Human-readable trace of how the per-condition verdicts combined,
    /// e.g. `"[true OR false]"`.
    pub condition_evals: String,
    pub results: Vec<ConditionResult>,
}

/// Evaluate every condition of a rule in order and fold the verdicts with
/// each condition's operator.
///
/// The first condition seeds both flags; each later condition combines with
/// `||` under `or` and `&&` under `and` — `firing` and `no_data_found`
/// independently. Any condition error aborts the whole rule evaluation.
pub async fn evaluate_rule(
    ctx: &EvalContext,
    executor: &dyn QueryExecutor,
    conditions: &[Box<dyn Condition>],
) -> Result<RuleEvaluation> {
    let mut firing = false;
    let mut no_data_found = false;
    let mut condition_evals = String::new();
    let mut results = Vec::with_capacity(conditions.len());

    for (i, condition) in conditions.iter().enumerate() {
        let result = condition.eval(ctx, executor).await?;

        if i == 0 {
            firing = result.firing;
            no_data_found = result.no_data_found;
            condition_evals = result.firing.to_string();
        } else {
            match result.operator {
                Operator::Or => {
                    firing = firing || result.firing;
                    no_data_found = no_data_found || result.no_data_found;
                }
                Operator::And => {
                    firing = firing && result.firing;
                    no_data_found = no_data_found && result.no_data_found;
                }
            }
            condition_evals = format!(
                "[{} {} {}]",
                condition_evals,
                result.operator.to_string().to_uppercase(),
                result.firing
            );
        }

        results.push(result);
    }

    if ctx.debug {
        tracing::debug!(
            firing,
            no_data_found,
            condition_evals = %condition_evals,
            "rule evaluated"
        );
    }

    Ok(RuleEvaluation {
        firing,
        no_data_found,
        condition_evals,
        results,
    })
}
