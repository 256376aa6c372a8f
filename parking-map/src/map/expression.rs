use serde_json::{json, Value};
use shared_types::Properties;

/// A layer filter predicate.
///
/// Serializes to the MapLibre expression form handed to the renderer, and can
/// be evaluated locally against a feature's property bag.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Any(Vec<Expr>),
    PropertyEq { property: &'static str, value: String },
}

impl Expr {
    pub fn property_eq(property: &'static str, value: impl Into<String>) -> Self {
        Self::PropertyEq {
            property,
            value: value.into(),
        }
    }

    pub fn any(conditions: Vec<Expr>) -> Self {
        Self::Any(conditions)
    }

    pub fn evaluate(&self, properties: &Properties) -> bool {
        match self {
            Self::Any(conditions) => conditions.iter().any(|c| c.evaluate(properties)),
            Self::PropertyEq { property, value } => {
                properties.get(*property).and_then(Value::as_str) == Some(value.as_str())
            }
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Any(conditions) => {
                let mut expr = vec![json!("any")];
                expr.extend(conditions.iter().map(Expr::to_json));
                Value::Array(expr)
            }
            Self::PropertyEq { property, value } => json!(["==", ["get", property], value]),
        }
    }
}
