use crate::condition::{MultipartQueryCondition, QueryCondition};
use crate::error::{EngineError, Result};
use crate::model::{MultipartQueryConditionModel, QueryConditionModel};
use crate::Condition;
use serde_json::Value;
use std::collections::HashMap;

type ConditionFactory = fn(&Value) -> Result<Box<dyn Condition>>;

/// Maps the condition `type` discriminator to a constructor.
///
/// This is an explicit value, constructed once at process start and passed by
/// reference into whatever parses rule configurations — there is no global
/// registration. String dispatch happens here and nowhere else; past this
/// boundary every condition is a typed value.
///
/// # Examples
///
/// ```
/// use sentra_engine::registry::ConditionRegistry;
///
/// let registry = ConditionRegistry::default();
/// assert!(registry.has_factory("query"));
/// assert!(registry.has_factory("multipartQuery"));
/// assert!(!registry.has_factory("classic"));
/// ```
pub struct ConditionRegistry {
    factories: HashMap<String, ConditionFactory>,
}

impl ConditionRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: impl Into<String>, factory: ConditionFactory) {
        self.factories.insert(kind.into(), factory);
    }

    /// Build a condition from its JSON model, dispatching on the `type`
    /// field. Unknown or missing types are validation errors, surfaced when
    /// the rule is authored rather than when it first evaluates.
    pub fn build(&self, model: &Value) -> Result<Box<dyn Condition>> {
        let kind = model
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::Validation("condition is missing 'type'".to_string()))?;
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| EngineError::Validation(format!("unknown condition type: {kind}")))?;
        factory(model)
    }

    pub fn has_factory(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("query", build_query_condition);
        registry.register("multipartQuery", build_multipart_query_condition);
        registry
    }
}

fn build_query_condition(model: &Value) -> Result<Box<dyn Condition>> {
    let parsed: QueryConditionModel = serde_json::from_value(model.clone())
        .map_err(|e| EngineError::Validation(format!("invalid query condition: {e}")))?;
    Ok(Box::new(QueryCondition::from_model(&parsed)?))
}

fn build_multipart_query_condition(model: &Value) -> Result<Box<dyn Condition>> {
    let parsed: MultipartQueryConditionModel = serde_json::from_value(model.clone())
        .map_err(|e| EngineError::Validation(format!("invalid multipartQuery condition: {e}")))?;
    Ok(Box::new(MultipartQueryCondition::from_model(&parsed)?))
}
