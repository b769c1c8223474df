//! External, serde-friendly description of a configuration space.
//!
//! This is the representation schedulers hand over as JSON. Kinds are
//! plain strings, numeric bounds are plain numbers, and defaults may be
//! omitted. Conversion into a [`ConfigurationSpace`] performs all
//! construction checks.

use serde::{Deserialize, Serialize};

use super::{Condition, ConfigurationSpace, Domain, Hyperparameter, Kind};
use crate::configuration::Value;
use crate::error::{Error, Result};

/// Largest magnitude at which every integer is exactly representable as `f64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// External description of a whole space.
///
/// # Examples
///
/// ```
/// use hpsearch::ConfigurationSpace;
/// use hpsearch::space::SpaceSpec;
///
/// let spec: SpaceSpec = serde_json::from_str(r#"{
///     "hyperparameters": [
///         {"name": "lr", "kind": "float", "low": 1e-4, "high": 0.1, "log_scale": true},
///         {"name": "batch_size", "kind": "choice", "choices": [32, 64, 128], "default": 64}
///     ]
/// }"#).unwrap();
/// let space = ConfigurationSpace::from_spec(spec).unwrap();
/// assert_eq!(space.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceSpec {
    /// Hyperparameters in declaration order.
    pub hyperparameters: Vec<HyperparameterSpec>,
}

/// External description of one hyperparameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterSpec {
    /// Unique name.
    pub name: String,
    /// One of `continuous|float|real|uniform`, `integer|int`,
    /// `categorical|choice`, `ordinal`, case-insensitive.
    pub kind: String,
    /// Lower bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    /// Upper bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    /// Choices for categorical and ordinal kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,
    /// Default value. Derived from the domain when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Log-scale sampling and encoding for numeric kinds.
    #[serde(default)]
    pub log_scale: bool,
    /// Activation conditions, all of which must hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

fn required<T>(value: Option<T>, name: &str, field: &'static str) -> Result<T> {
    value.ok_or_else(|| Error::MissingField {
        name: name.to_owned(),
        field,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn integral_bound(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_EXACT_INT).then_some(v as i64)
}

impl TryFrom<HyperparameterSpec> for Hyperparameter {
    type Error = Error;

    fn try_from(spec: HyperparameterSpec) -> Result<Self> {
        let HyperparameterSpec {
            name,
            kind: kind_name,
            low,
            high,
            choices,
            default,
            log_scale,
            conditions,
        } = spec;

        let kind = Kind::parse(&kind_name).ok_or_else(|| Error::UnknownKind {
            name: name.clone(),
            kind: kind_name.clone(),
        })?;

        let domain = match kind {
            Kind::Continuous => Domain::Continuous {
                low: required(low, &name, "low")?,
                high: required(high, &name, "high")?,
                log_scale,
            },
            Kind::Integer => {
                let low = required(low, &name, "low")?;
                let high = required(high, &name, "high")?;
                match (integral_bound(low), integral_bound(high)) {
                    (Some(l), Some(h)) => Domain::Integer {
                        low: l,
                        high: h,
                        log_scale,
                    },
                    _ => return Err(Error::InvalidBounds { name, low, high }),
                }
            }
            Kind::Categorical | Kind::Ordinal => {
                if log_scale {
                    return Err(Error::LogScaleUnsupported(name));
                }
                let choices = required(choices, &name, "choices")?;
                if kind == Kind::Categorical {
                    Domain::Categorical { choices }
                } else {
                    Domain::Ordinal { choices }
                }
            }
        };
        let domain = domain.normalized(&name)?;

        let default = match (default, &domain) {
            // JSON writers often emit whole numbers as floats
            (Some(Value::Float(v)), Domain::Integer { .. }) => match integral_bound(v) {
                Some(i) => Value::Int(i),
                None => Value::Float(v),
            },
            (Some(v), _) => v,
            (None, domain) => required(domain.midpoint(), &name, "default")?,
        };

        let mut hp = Hyperparameter::new(name, domain, default);
        for condition in conditions {
            hp = hp.when(condition);
        }
        Ok(hp)
    }
}

impl From<&Hyperparameter> for HyperparameterSpec {
    #[allow(clippy::cast_precision_loss)]
    fn from(hp: &Hyperparameter) -> Self {
        let (low, high, choices) = match hp.domain() {
            Domain::Continuous { low, high, .. } => (Some(*low), Some(*high), None),
            Domain::Integer { low, high, .. } => (Some(*low as f64), Some(*high as f64), None),
            Domain::Categorical { choices } | Domain::Ordinal { choices } => {
                (None, None, Some(choices.clone()))
            }
        };
        Self {
            name: hp.name().to_owned(),
            kind: hp.kind().to_string(),
            low,
            high,
            choices,
            default: Some(hp.default_value().clone()),
            log_scale: hp.domain().is_log_scale(),
            conditions: hp.conditions().to_vec(),
        }
    }
}

impl TryFrom<SpaceSpec> for ConfigurationSpace {
    type Error = Error;

    fn try_from(spec: SpaceSpec) -> Result<Self> {
        let hyperparameters = spec
            .hyperparameters
            .into_iter()
            .map(Hyperparameter::try_from)
            .collect::<Result<Vec<_>>>()?;
        ConfigurationSpace::new(hyperparameters)
    }
}

impl ConfigurationSpace {
    /// Builds a space from its external description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownKind`] for an unrecognized kind string,
    /// [`Error::MissingField`] when a kind's bounds or choices are absent,
    /// and any other construction error [`ConfigurationSpace::new`] reports.
    pub fn from_spec(spec: SpaceSpec) -> Result<Self> {
        Self::try_from(spec)
    }

    /// Returns the external description of this space.
    #[must_use]
    pub fn to_spec(&self) -> SpaceSpec {
        SpaceSpec {
            hyperparameters: self
                .hyperparameters()
                .iter()
                .map(HyperparameterSpec::from)
                .collect(),
        }
    }
}
