//! Concrete hyperparameter values, configurations, and canonical keys.

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Number of significant decimal digits kept for float values.
const FLOAT_SIGNIFICANT_DIGITS: usize = 12;

/// Round a float to [`FLOAT_SIGNIFICANT_DIGITS`] significant digits.
///
/// Every float that enters a [`Configuration`] goes through this, so
/// values that only differ by `ln`/`exp` round-off compare equal.
pub(crate) fn canonical_float(v: f64) -> f64 {
    if !v.is_finite() {
        return v;
    }
    if v == 0.0 {
        return 0.0;
    }
    format!("{v:.prec$e}", prec = FLOAT_SIGNIFICANT_DIGITS - 1)
        .parse()
        .unwrap_or(v)
}

/// A single hyperparameter value.
///
/// Continuous hyperparameters hold [`Value::Float`], integer ones
/// [`Value::Int`]. Categorical and ordinal choices may be any variant.
/// Serialized untagged, so `64`, `64.0`, `true`, and `"adam"` stay distinct.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean choice.
    Bool(bool),
    /// An integer value or choice.
    Int(i64),
    /// A floating-point value or choice.
    Float(f64),
    /// A string choice.
    Str(String),
}

impl Value {
    /// Returns the value as `f64` for numeric variants.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Bool(_) | Value::Str(_) => None,
        }
    }

    /// Returns the value as `i64` for the integer variant.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string slice for the string variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean for the boolean variant.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub(crate) fn canonicalize(self) -> Self {
        match self {
            Value::Float(v) => Value::Float(canonical_float(v)),
            other => other,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// An assignment of values to the active hyperparameters of a space.
///
/// Entries are kept sorted by name, so two configurations built in a
/// different order are equal. Float values are stored with 12 significant
/// digits.
///
/// # Examples
///
/// ```
/// use hpsearch::{Configuration, Value};
///
/// let a: Configuration = [("lr", Value::from(1e-3)), ("batch_size", Value::from(64))]
///     .into_iter()
///     .collect();
/// let b = Configuration::new()
///     .with("batch_size", 64)
///     .with("lr", 1e-3);
/// assert_eq!(a, b);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Value>",
    into = "BTreeMap<String, Value>"
)]
pub struct Configuration {
    values: BTreeMap<String, Value>,
}

impl Configuration {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value and returns the configuration, for chained construction.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets the value of `name`, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values
            .insert(name.into(), value.into().canonicalize())
    }

    /// Removes `name`, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Returns the value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns `true` if `name` has a value.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of assigned hyperparameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over assigned names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = Configuration::new();
        for (name, value) in iter {
            config.insert(name, value);
        }
        config
    }
}

impl From<BTreeMap<String, Value>> for Configuration {
    fn from(values: BTreeMap<String, Value>) -> Self {
        values.into_iter().collect()
    }
}

impl From<Configuration> for BTreeMap<String, Value> {
    fn from(config: Configuration) -> Self {
        config.values
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

/// Deterministic identity of a configuration within a space.
///
/// The key is the JSON object text of the configuration with entries in the
/// space's declaration order, e.g. `{"lr":0.001,"batch_size":64}`. It is
/// stable across process restarts and suitable as a durable dedup id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Builds a key from `(name, value)` pairs already in canonical order.
    pub(crate) fn from_ordered<'a>(entries: impl IntoIterator<Item = (&'a str, &'a Value)>) -> Self {
        let mut out = String::from("{");
        for (i, (name, value)) in entries.into_iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&serde_json::Value::String(name.to_owned()).to_string());
            out.push(':');
            out.push_str(&value.to_json().to_string());
        }
        out.push('}');
        Self(out)
    }

    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
