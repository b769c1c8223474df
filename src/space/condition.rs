//! Activation conditions between hyperparameters.

use serde::{Deserialize, Serialize};

use super::hyperparameter::Domain;
use crate::configuration::{Value, canonical_float};
use crate::error::{Error, Result};

/// A predicate over a parent hyperparameter's value.
///
/// A conditioned hyperparameter is active only when its parent is active
/// and the predicate holds for the parent's value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Parent equals `value`.
    Equals {
        /// The parent hyperparameter.
        parent: String,
        /// The required value.
        value: Value,
    },
    /// Parent differs from `value`.
    NotEquals {
        /// The parent hyperparameter.
        parent: String,
        /// The excluded value.
        value: Value,
    },
    /// Parent is one of `values`.
    In {
        /// The parent hyperparameter.
        parent: String,
        /// The accepted values.
        values: Vec<Value>,
    },
    /// Numeric parent lies in `[low, high]`.
    Range {
        /// The parent hyperparameter.
        parent: String,
        /// Lower bound (inclusive).
        low: f64,
        /// Upper bound (inclusive).
        high: f64,
    },
}

impl Condition {
    /// Active when `parent == value`.
    #[must_use]
    pub fn equals(parent: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Equals {
            parent: parent.into(),
            value: value.into(),
        }
    }

    /// Active when `parent != value`.
    #[must_use]
    pub fn not_equals(parent: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::NotEquals {
            parent: parent.into(),
            value: value.into(),
        }
    }

    /// Active when `parent` takes one of `values`.
    #[must_use]
    pub fn one_of<V: Into<Value>>(
        parent: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Condition::In {
            parent: parent.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Active when the numeric `parent` lies in `[low, high]`.
    #[must_use]
    pub fn range(parent: impl Into<String>, low: f64, high: f64) -> Self {
        Condition::Range {
            parent: parent.into(),
            low,
            high,
        }
    }

    /// The hyperparameter this condition reads.
    #[must_use]
    pub fn parent(&self) -> &str {
        match self {
            Condition::Equals { parent, .. }
            | Condition::NotEquals { parent, .. }
            | Condition::In { parent, .. }
            | Condition::Range { parent, .. } => parent,
        }
    }

    /// Brings the condition's values into the canonical form of the
    /// parent's `domain`.
    ///
    /// Integer values compared against a continuous parent become floats,
    /// and floats are rounded like configuration values. `Equals` and `In`
    /// values must belong to the parent's domain, otherwise the condition
    /// could never hold.
    pub(super) fn resolved(self, child: &str, domain: &Domain) -> Result<Self> {
        let member = |parent: &str, value: Value| -> Result<Value> {
            let value = coerced(domain, value);
            if domain.contains(&value) {
                Ok(value)
            } else {
                Err(Error::InvalidCondition {
                    child: child.to_owned(),
                    parent: parent.to_owned(),
                    value: value.to_string(),
                })
            }
        };
        Ok(match self {
            Condition::Equals { parent, value } => {
                let value = member(&parent, value)?;
                Condition::Equals { parent, value }
            }
            Condition::NotEquals { parent, value } => Condition::NotEquals {
                value: coerced(domain, value),
                parent,
            },
            Condition::In { parent, values } => {
                let values = values
                    .into_iter()
                    .map(|v| member(&parent, v))
                    .collect::<Result<Vec<_>>>()?;
                Condition::In { parent, values }
            }
            Condition::Range { parent, low, high } => Condition::Range {
                parent,
                low: canonical_float(low),
                high: canonical_float(high),
            },
        })
    }

    /// Evaluates the predicate against the parent's value.
    #[must_use]
    pub fn is_satisfied(&self, parent_value: &Value) -> bool {
        match self {
            Condition::Equals { value, .. } => parent_value == value,
            Condition::NotEquals { value, .. } => parent_value != value,
            Condition::In { values, .. } => values.contains(parent_value),
            Condition::Range { low, high, .. } => parent_value
                .as_f64()
                .is_some_and(|v| *low <= v && v <= *high),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn coerced(domain: &Domain, value: Value) -> Value {
    match (domain, value) {
        (Domain::Continuous { .. }, Value::Int(v)) => Value::Float(canonical_float(v as f64)),
        (_, value) => value.canonicalize(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_predicates() {
        assert!(Condition::equals("opt", "sgd").is_satisfied(&Value::from("sgd")));
        assert!(!Condition::equals("opt", "sgd").is_satisfied(&Value::from("adam")));
        assert!(Condition::not_equals("opt", "sgd").is_satisfied(&Value::from("adam")));
        assert!(Condition::one_of("n", [1, 2]).is_satisfied(&Value::from(2)));
        assert!(!Condition::one_of("n", [1, 2]).is_satisfied(&Value::from(3)));
        assert!(Condition::range("depth", 2.0, 4.0).is_satisfied(&Value::from(3)));
        assert!(!Condition::range("depth", 2.0, 4.0).is_satisfied(&Value::from("3")));
    }

    #[test]
    fn test_resolved_rounds_float_values() {
        let domain = Domain::Categorical {
            choices: vec![Value::Float(canonical_float(0.1 + 0.2)), Value::Float(0.5)],
        };
        let cond = Condition::equals("ratio", 0.1 + 0.2)
            .resolved("child", &domain)
            .unwrap();
        assert!(cond.is_satisfied(&Value::Float(0.3)));

        let range = Condition::range("ratio", 0.1 + 0.2, 0.7 - 0.2)
            .resolved("child", &domain)
            .unwrap();
        assert_eq!(range, Condition::range("ratio", 0.3, 0.5));
    }

    #[test]
    fn test_resolved_coerces_int_for_continuous_parent() {
        let domain = Domain::Continuous {
            low: 0.0,
            high: 4.0,
            log_scale: false,
        };
        let cond = Condition::one_of("x", [1, 2]).resolved("y", &domain).unwrap();
        assert!(cond.is_satisfied(&Value::Float(2.0)));
    }

    #[test]
    fn test_resolved_rejects_value_outside_parent_domain() {
        let domain = Domain::Categorical {
            choices: vec![Value::from("sgd"), Value::from("adam")],
        };
        let err = Condition::equals("opt", "adamw")
            .resolved("momentum", &domain)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCondition { .. }));
        assert!(err.is_configuration_error());
        assert!(
            Condition::not_equals("opt", "adamw")
                .resolved("momentum", &domain)
                .is_ok()
        );
    }

    #[test]
    fn test_condition_serde_tagged() {
        let cond: Condition =
            serde_json::from_str(r#"{"type": "equals", "parent": "opt", "value": "sgd"}"#).unwrap();
        assert_eq!(cond, Condition::equals("opt", "sgd"));
        assert_eq!(cond.parent(), "opt");
    }
}
