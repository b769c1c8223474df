//! Hyperparameter declarations and their kind-specific domains.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use crate::configuration::{Value, canonical_float};
use crate::error::{Error, Result};
use crate::rng_util;

/// Tolerance, relative to the internal range, within which decoded
/// continuous values are clamped instead of rejected.
const DECODE_TOLERANCE: f64 = 1e-9;

/// The kind of a hyperparameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Real-valued range.
    Continuous,
    /// Integer range, inclusive on both ends.
    Integer,
    /// Unordered choice list.
    Categorical,
    /// Choice list whose declared order is meaningful.
    Ordinal,
}

impl Kind {
    /// Parses the kind names accepted by the external space representation.
    ///
    /// Matching is case-insensitive. Returns `None` for anything unknown.
    #[must_use]
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "continuous" | "float" | "real" | "uniform" => Some(Kind::Continuous),
            "integer" | "int" => Some(Kind::Integer),
            "categorical" | "choice" => Some(Kind::Categorical),
            "ordinal" => Some(Kind::Ordinal),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Continuous => "continuous",
            Kind::Integer => "integer",
            Kind::Categorical => "categorical",
            Kind::Ordinal => "ordinal",
        };
        f.write_str(name)
    }
}

/// The set of values a hyperparameter may take.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Domain {
    /// Real values in `[low, high]`, optionally sampled log-uniformly.
    Continuous {
        /// Lower bound (inclusive).
        low: f64,
        /// Upper bound (inclusive).
        high: f64,
        /// Whether sampling and encoding happen in log space.
        log_scale: bool,
    },
    /// Integers in `[low, high]`, optionally sampled log-uniformly.
    Integer {
        /// Lower bound (inclusive).
        low: i64,
        /// Upper bound (inclusive).
        high: i64,
        /// Whether sampling and encoding happen in log space.
        log_scale: bool,
    },
    /// One of `choices`, no ordering.
    Categorical {
        /// The available choices.
        choices: Vec<Value>,
    },
    /// One of `choices`, in declared order.
    Ordinal {
        /// The available choices, lowest first.
        choices: Vec<Value>,
    },
}

impl Domain {
    /// Returns the kind of this domain.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Domain::Continuous { .. } => Kind::Continuous,
            Domain::Integer { .. } => Kind::Integer,
            Domain::Categorical { .. } => Kind::Categorical,
            Domain::Ordinal { .. } => Kind::Ordinal,
        }
    }

    /// Returns `true` for log-scaled numeric domains.
    #[must_use]
    pub fn is_log_scale(&self) -> bool {
        match self {
            Domain::Continuous { log_scale, .. } | Domain::Integer { log_scale, .. } => *log_scale,
            Domain::Categorical { .. } | Domain::Ordinal { .. } => false,
        }
    }

    /// Returns the choice list for categorical and ordinal domains.
    #[must_use]
    pub fn choices(&self) -> Option<&[Value]> {
        match self {
            Domain::Categorical { choices } | Domain::Ordinal { choices } => Some(choices),
            Domain::Continuous { .. } | Domain::Integer { .. } => None,
        }
    }

    /// Returns `true` if `value` belongs to this domain.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Domain::Continuous { low, high, .. }, Value::Float(v)) => {
                v.is_finite() && *low <= *v && *v <= *high
            }
            (Domain::Integer { low, high, .. }, Value::Int(v)) => *low <= *v && *v <= *high,
            (Domain::Categorical { choices } | Domain::Ordinal { choices }, v) => choices.contains(v),
            _ => false,
        }
    }

    /// Number of distinct values, or `None` for continuous domains.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn cardinality(&self) -> Option<u128> {
        match self {
            Domain::Continuous { .. } => None,
            Domain::Integer { low, high, .. } => Some((i128::from(*high) - i128::from(*low) + 1) as u128),
            Domain::Categorical { choices } | Domain::Ordinal { choices } => Some(choices.len() as u128),
        }
    }

    /// All values of a discrete domain, in order.
    pub(crate) fn values(&self) -> Vec<Value> {
        match self {
            Domain::Continuous { .. } => Vec::new(),
            Domain::Integer { low, high, .. } => (*low..=*high).map(Value::Int).collect(),
            Domain::Categorical { choices } | Domain::Ordinal { choices } => choices.clone(),
        }
    }

    /// Draws one value: uniform over choices, uniform or log-uniform over ranges.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub(crate) fn sample(&self, rng: &mut fastrand::Rng) -> Value {
        match self {
            Domain::Continuous {
                low,
                high,
                log_scale,
            } => {
                let v = if *log_scale {
                    rng_util::f64_range(rng, low.ln(), high.ln()).exp()
                } else {
                    rng_util::f64_range(rng, *low, *high)
                };
                Value::Float(canonical_float(v).clamp(*low, *high))
            }
            Domain::Integer {
                low,
                high,
                log_scale,
            } => {
                let v = if *log_scale {
                    let log_low = (*low as f64).ln();
                    let log_high = (*high as f64).ln();
                    let raw = rng_util::f64_range(rng, log_low, log_high).exp().round() as i64;
                    // Rounding might push outside
                    raw.clamp(*low, *high)
                } else {
                    rng.i64(*low..=*high)
                };
                Value::Int(v)
            }
            Domain::Categorical { choices } | Domain::Ordinal { choices } => {
                choices[rng.usize(0..choices.len())].clone()
            }
        }
    }

    /// Internal-space bounds handed to the guiding optimizer.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn internal_bounds(&self) -> (f64, f64) {
        match self {
            Domain::Continuous {
                low,
                high,
                log_scale,
            } => {
                if *log_scale {
                    (low.ln(), high.ln())
                } else {
                    (*low, *high)
                }
            }
            Domain::Integer {
                low,
                high,
                log_scale,
            } => {
                if *log_scale {
                    ((*low as f64).ln(), (*high as f64).ln())
                } else {
                    (*low as f64, *high as f64)
                }
            }
            Domain::Categorical { choices } | Domain::Ordinal { choices } => {
                (0.0, choices.len().saturating_sub(1) as f64)
            }
        }
    }

    /// Converts a value into its internal-space coordinate.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn encode(&self, value: &Value) -> Option<f64> {
        if !self.contains(value) {
            return None;
        }
        match (self, value) {
            (Domain::Continuous { log_scale, .. }, Value::Float(v)) => {
                Some(if *log_scale { v.ln() } else { *v })
            }
            (Domain::Integer { log_scale, .. }, Value::Int(v)) => {
                let v = *v as f64;
                Some(if *log_scale { v.ln() } else { v })
            }
            (Domain::Categorical { choices } | Domain::Ordinal { choices }, v) => {
                choices.iter().position(|c| c == v).map(|i| i as f64)
            }
            _ => None,
        }
    }

    /// Converts an internal-space coordinate back into a value.
    ///
    /// Integers are rounded and clamped into range. Continuous values
    /// slightly outside the range are clamped; anything further out, any
    /// non-finite coordinate, and any choice index outside the list are
    /// rejected with a description of the problem.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub(crate) fn decode(&self, x: f64) -> core::result::Result<Value, String> {
        if !x.is_finite() {
            return Err(format!("non-finite coordinate {x}"));
        }
        match self {
            Domain::Continuous {
                low,
                high,
                log_scale,
            } => {
                let (lo, hi) = self.internal_bounds();
                let tol = DECODE_TOLERANCE * (hi - lo).abs().max(1.0);
                if x < lo - tol || x > hi + tol {
                    return Err(format!("coordinate {x} outside [{lo}, {hi}]"));
                }
                let v = if *log_scale { x.exp() } else { x };
                Ok(Value::Float(canonical_float(v).clamp(*low, *high)))
            }
            Domain::Integer {
                low,
                high,
                log_scale,
            } => {
                let v = if *log_scale { x.exp() } else { x };
                Ok(Value::Int((v.round() as i64).clamp(*low, *high)))
            }
            Domain::Categorical { choices } | Domain::Ordinal { choices } => {
                let idx = x.round();
                if idx < 0.0 || idx >= choices.len() as f64 {
                    return Err(format!("choice index {idx} outside 0..{}", choices.len()));
                }
                Ok(choices[idx as usize].clone())
            }
        }
    }

    /// A sensible default when none is declared: the (geometric) midpoint
    /// of a range, or the first choice.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub(crate) fn midpoint(&self) -> Option<Value> {
        match self {
            Domain::Continuous {
                low,
                high,
                log_scale,
            } => {
                let mid = if *log_scale {
                    ((low.ln() + high.ln()) / 2.0).exp()
                } else {
                    (low + high) / 2.0
                };
                Some(Value::Float(canonical_float(mid).clamp(*low, *high)))
            }
            Domain::Integer {
                low,
                high,
                log_scale,
            } => {
                let mid = if *log_scale {
                    (((*low as f64).ln() + (*high as f64).ln()) / 2.0).exp()
                } else {
                    (*low as f64 + *high as f64) / 2.0
                };
                Some(Value::Int((mid.round() as i64).clamp(*low, *high)))
            }
            Domain::Categorical { choices } | Domain::Ordinal { choices } => choices.first().cloned(),
        }
    }

    /// Checks bounds and choices, then normalizes float bounds and choices
    /// to the canonical float precision.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn normalized(self, name: &str) -> Result<Self> {
        match self {
            Domain::Continuous {
                low,
                high,
                log_scale,
            } => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return Err(Error::InvalidBounds {
                        name: name.to_owned(),
                        low,
                        high,
                    });
                }
                if log_scale && low <= 0.0 {
                    return Err(Error::InvalidLogBounds(name.to_owned()));
                }
                Ok(Domain::Continuous {
                    low: canonical_float(low),
                    high: canonical_float(high),
                    log_scale,
                })
            }
            Domain::Integer {
                low,
                high,
                log_scale,
            } => {
                if low > high {
                    return Err(Error::InvalidBounds {
                        name: name.to_owned(),
                        low: low as f64,
                        high: high as f64,
                    });
                }
                if log_scale && low < 1 {
                    return Err(Error::InvalidLogBounds(name.to_owned()));
                }
                Ok(Domain::Integer {
                    low,
                    high,
                    log_scale,
                })
            }
            Domain::Categorical { choices } => {
                Ok(Domain::Categorical {
                    choices: normalized_choices(name, choices)?,
                })
            }
            Domain::Ordinal { choices } => Ok(Domain::Ordinal {
                choices: normalized_choices(name, choices)?,
            }),
        }
    }
}

fn normalized_choices(name: &str, choices: Vec<Value>) -> Result<Vec<Value>> {
    if choices.is_empty() {
        return Err(Error::EmptyChoices(name.to_owned()));
    }
    let mut out: Vec<Value> = Vec::with_capacity(choices.len());
    for choice in choices {
        let choice = match choice {
            Value::Float(v) => Value::Float(canonical_float(v)),
            other => other,
        };
        if out.contains(&choice) {
            return Err(Error::DuplicateChoice {
                name: name.to_owned(),
                value: choice.to_string(),
            });
        }
        out.push(choice);
    }
    Ok(out)
}

/// A named hyperparameter: its domain, default, and activation conditions.
///
/// # Examples
///
/// ```
/// use hpsearch::space::{Condition, Domain, Hyperparameter};
///
/// let momentum = Hyperparameter::new(
///     "momentum",
///     Domain::Continuous { low: 0.0, high: 0.99, log_scale: false },
///     0.9,
/// )
/// .when(Condition::equals("optimizer", "sgd"));
/// assert_eq!(momentum.conditions().len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameter {
    name: String,
    domain: Domain,
    default: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conditions: Vec<Condition>,
}

impl Hyperparameter {
    /// Creates an unconditional hyperparameter.
    ///
    /// Bounds, choices, and the default are checked when the hyperparameter
    /// is added to a [`ConfigurationSpace`](super::ConfigurationSpace).
    #[must_use]
    pub fn new(name: impl Into<String>, domain: Domain, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            domain,
            default: default.into(),
            conditions: Vec::new(),
        }
    }

    /// Adds an activation condition. All conditions must hold for the
    /// hyperparameter to be active.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// The hyperparameter's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The hyperparameter's domain.
    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// The hyperparameter's kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.domain.kind()
    }

    /// The declared default value.
    #[must_use]
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Conditions gating this hyperparameter.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub(super) fn set_conditions(&mut self, conditions: Vec<Condition>) {
        self.conditions = conditions;
    }

    pub(super) fn set_log_scale(&mut self) -> Result<()> {
        match &mut self.domain {
            Domain::Continuous { log_scale, .. } | Domain::Integer { log_scale, .. } => {
                *log_scale = true;
                Ok(())
            }
            Domain::Categorical { .. } | Domain::Ordinal { .. } => {
                Err(Error::LogScaleUnsupported(self.name.clone()))
            }
        }
    }

    /// Validates the declaration and returns it in canonical form.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn normalized(self) -> Result<Self> {
        if self.name.is_empty() {
            return Err(Error::EmptyName);
        }
        let domain = self.domain.normalized(&self.name)?;
        let default = match (&domain, self.default) {
            (Domain::Continuous { .. }, Value::Int(v)) => Value::Float(canonical_float(v as f64)),
            (_, Value::Float(v)) => Value::Float(canonical_float(v)),
            (_, other) => other,
        };
        if !domain.contains(&default) {
            return Err(Error::InvalidDefault {
                name: self.name,
                reason: format!("{default} is not in the {} domain", domain.kind()),
            });
        }
        Ok(Self {
            name: self.name,
            domain,
            default,
            conditions: self.conditions,
        })
    }
}
