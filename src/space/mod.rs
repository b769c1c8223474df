//! Configuration space: ordered hyperparameters plus activation conditions.
//!
//! The declaration order of a [`ConfigurationSpace`] never changes once it
//! is built. [`SpaceAdapter`](crate::SpaceAdapter) relies on it for vector
//! positions and [`canonical_key`](ConfigurationSpace::canonical_key) for
//! the key layout. Conditions are evaluated in a topological order derived
//! at construction, so a parent is always assigned before its children.
//!
//! # Examples
//!
//! ```
//! use hpsearch::space::{Condition, ConfigurationSpace};
//! use hpsearch::Value;
//!
//! let space = ConfigurationSpace::builder()
//!     .categorical("optimizer", ["sgd", "adam"], "adam")
//!     .continuous("momentum", 0.0, 0.99, 0.9)
//!     .when(Condition::equals("optimizer", "sgd"))
//!     .build()
//!     .unwrap();
//!
//! let default = space.default();
//! assert_eq!(default.get("optimizer"), Some(&Value::from("adam")));
//! assert!(!default.contains("momentum"));
//! assert!(space.validate(&default));
//! ```

mod condition;
mod hyperparameter;
mod spec;

use std::collections::HashMap;

pub use condition::Condition;
pub use hyperparameter::{Domain, Hyperparameter, Kind};
pub use spec::{HyperparameterSpec, SpaceSpec};

use crate::configuration::{CanonicalKey, Configuration, Value};
use crate::error::{Error, Result};

/// An immutable, ordered set of hyperparameters with activation conditions.
#[derive(Clone, Debug)]
pub struct ConfigurationSpace {
    hyperparameters: Vec<Hyperparameter>,
    index: HashMap<String, usize>,
    /// Declaration indices, parents before children.
    activation_order: Vec<usize>,
}

impl PartialEq for ConfigurationSpace {
    fn eq(&self, other: &Self) -> bool {
        self.hyperparameters == other.hyperparameters
    }
}

impl ConfigurationSpace {
    /// Creates a builder for declaring a space.
    #[must_use]
    pub fn builder() -> ConfigurationSpaceBuilder {
        ConfigurationSpaceBuilder::default()
    }

    /// Builds a space from hyperparameter declarations, in order.
    ///
    /// # Errors
    ///
    /// Returns a construction error for empty or duplicate names, invalid
    /// bounds or choices, defaults outside their domain, conditions naming
    /// unknown parents or values the parent cannot take, and cyclic
    /// conditions.
    pub fn new(hyperparameters: Vec<Hyperparameter>) -> Result<Self> {
        let mut index = HashMap::with_capacity(hyperparameters.len());
        let mut normalized = Vec::with_capacity(hyperparameters.len());
        for (i, hp) in hyperparameters.into_iter().enumerate() {
            let hp = hp.normalized()?;
            if index.insert(hp.name().to_owned(), i).is_some() {
                return Err(Error::DuplicateName(hp.name().to_owned()));
            }
            normalized.push(hp);
        }

        let mut resolved = Vec::with_capacity(normalized.len());
        for hp in &normalized {
            let mut conditions = Vec::with_capacity(hp.conditions().len());
            for condition in hp.conditions() {
                if condition.parent() == hp.name() {
                    return Err(Error::ConditionCycle(hp.name().to_owned()));
                }
                let Some(&parent) = index.get(condition.parent()) else {
                    return Err(Error::UnknownParent {
                        child: hp.name().to_owned(),
                        parent: condition.parent().to_owned(),
                    });
                };
                conditions.push(
                    condition
                        .clone()
                        .resolved(hp.name(), normalized[parent].domain())?,
                );
            }
            resolved.push(conditions);
        }
        for (hp, conditions) in normalized.iter_mut().zip(resolved) {
            hp.set_conditions(conditions);
        }

        let activation_order = topological_order(&normalized, &index)?;
        Ok(Self {
            hyperparameters: normalized,
            index,
            activation_order,
        })
    }

    /// Number of hyperparameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hyperparameters.len()
    }

    /// Returns `true` if the space declares no hyperparameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hyperparameters.is_empty()
    }

    /// Hyperparameters in declaration order.
    #[must_use]
    pub fn hyperparameters(&self) -> &[Hyperparameter] {
        &self.hyperparameters
    }

    /// Looks up a hyperparameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Hyperparameter> {
        self.index.get(name).map(|&i| &self.hyperparameters[i])
    }

    /// Position of `name` in declaration order.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Hyperparameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hyperparameters.iter().map(Hyperparameter::name)
    }

    /// Declaration indices with parents ahead of their children.
    pub(crate) fn activation_order(&self) -> &[usize] {
        &self.activation_order
    }

    /// Whether the hyperparameter at `idx` is active given the parent
    /// values assigned in `config`. An unassigned parent deactivates it.
    pub(crate) fn is_active_at(&self, idx: usize, config: &Configuration) -> bool {
        self.hyperparameters[idx]
            .conditions()
            .iter()
            .all(|c| config.get(c.parent()).is_some_and(|v| c.is_satisfied(v)))
    }

    /// Whether `name` is active under `config`. Unknown names are inactive.
    #[must_use]
    pub fn is_active(&self, name: &str, config: &Configuration) -> bool {
        self.index_of(name)
            .is_some_and(|idx| self.is_active_at(idx, config))
    }

    /// Checks `config` against the space, reporting the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when a name is unknown, an
    /// active hyperparameter is missing or out of its domain, or an inactive
    /// hyperparameter carries a value.
    pub fn check(&self, config: &Configuration) -> Result<()> {
        if let Some(unknown) = config.names().find(|n| !self.index.contains_key(*n)) {
            return Err(Error::invalid(format!("unknown hyperparameter '{unknown}'")));
        }
        for &idx in &self.activation_order {
            let hp = &self.hyperparameters[idx];
            let active = self.is_active_at(idx, config);
            match (active, config.get(hp.name())) {
                (true, None) => {
                    return Err(Error::invalid(format!(
                        "active hyperparameter '{}' has no value",
                        hp.name()
                    )));
                }
                (true, Some(value)) if !hp.domain().contains(value) => {
                    return Err(Error::invalid(format!(
                        "value {value} for '{}' is outside its {} domain",
                        hp.name(),
                        hp.kind()
                    )));
                }
                (false, Some(_)) => {
                    return Err(Error::invalid(format!(
                        "'{}' is set but its conditions are not satisfied",
                        hp.name()
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` if `config` is a valid configuration of this space.
    #[must_use]
    pub fn validate(&self, config: &Configuration) -> bool {
        self.check(config).is_ok()
    }

    /// Every active hyperparameter at its declared default.
    #[must_use]
    pub fn default(&self) -> Configuration {
        self.assign(|hp| hp.default_value().clone())
    }

    /// Draws one configuration, sampling each active hyperparameter independently.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Configuration {
        self.assign(|hp| hp.domain().sample(rng))
    }

    fn assign(&self, mut value_of: impl FnMut(&Hyperparameter) -> Value) -> Configuration {
        let mut config = Configuration::new();
        for &idx in &self.activation_order {
            if self.is_active_at(idx, &config) {
                let hp = &self.hyperparameters[idx];
                config.insert(hp.name(), value_of(hp));
            }
        }
        config
    }

    /// Canonical key of `config`: entries in declaration order.
    ///
    /// Names unknown to the space are appended in name order so the key
    /// still identifies the configuration exactly.
    #[must_use]
    pub fn canonical_key(&self, config: &Configuration) -> CanonicalKey {
        let declared = self
            .hyperparameters
            .iter()
            .filter_map(|hp| config.get(hp.name()).map(|v| (hp.name(), v)));
        let extra = config.iter().filter(|(n, _)| !self.index.contains_key(*n));
        CanonicalKey::from_ordered(declared.chain(extra))
    }

    /// Upper bound on the number of distinct configurations, ignoring
    /// conditions. `None` if any hyperparameter is continuous or the count
    /// overflows.
    #[must_use]
    pub fn cardinality(&self) -> Option<u128> {
        self.hyperparameters
            .iter()
            .try_fold(1_u128, |acc, hp| acc.checked_mul(hp.domain().cardinality()?))
    }

    /// Lists every valid configuration of a finite space, honoring
    /// conditions. Returns `None` if the space is continuous or its
    /// [`cardinality`](Self::cardinality) exceeds `limit`.
    #[must_use]
    pub fn enumerate(&self, limit: usize) -> Option<Vec<Configuration>> {
        let bound = self.cardinality()?;
        if bound > limit as u128 {
            return None;
        }
        let mut out = Vec::new();
        self.enumerate_from(0, Configuration::new(), &mut out);
        Some(out)
    }

    fn enumerate_from(&self, pos: usize, partial: Configuration, out: &mut Vec<Configuration>) {
        let Some(&idx) = self.activation_order.get(pos) else {
            out.push(partial);
            return;
        };
        if !self.is_active_at(idx, &partial) {
            self.enumerate_from(pos + 1, partial, out);
            return;
        }
        let hp = &self.hyperparameters[idx];
        for value in hp.domain().values() {
            let mut next = partial.clone();
            next.insert(hp.name(), value);
            self.enumerate_from(pos + 1, next, out);
        }
    }
}

/// Kahn's algorithm with declaration order as the tie-breaker.
fn topological_order(
    hyperparameters: &[Hyperparameter],
    index: &HashMap<String, usize>,
) -> Result<Vec<usize>> {
    let n = hyperparameters.len();
    let parents: Vec<Vec<usize>> = hyperparameters
        .iter()
        .map(|hp| {
            hp.conditions()
                .iter()
                .filter_map(|c| index.get(c.parent()).copied())
                .collect()
        })
        .collect();

    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);
    while order.len() < n {
        let Some(next) = (0..n).find(|&i| !placed[i] && parents[i].iter().all(|&p| placed[p]))
        else {
            let stuck = (0..n).find(|&i| !placed[i]).unwrap_or(0);
            return Err(Error::ConditionCycle(hyperparameters[stuck].name().to_owned()));
        };
        placed[next] = true;
        order.push(next);
    }
    Ok(order)
}

/// Builder for [`ConfigurationSpace`].
///
/// Modifiers such as [`log_scale`](Self::log_scale) and [`when`](Self::when)
/// apply to the most recently declared hyperparameter. Errors are deferred
/// to [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ConfigurationSpaceBuilder {
    hyperparameters: Vec<Hyperparameter>,
    error: Option<Error>,
}

impl ConfigurationSpaceBuilder {
    /// Declares a continuous hyperparameter on `[low, high]`.
    #[must_use]
    pub fn continuous(self, name: impl Into<String>, low: f64, high: f64, default: f64) -> Self {
        self.hyperparameter(Hyperparameter::new(
            name,
            Domain::Continuous {
                low,
                high,
                log_scale: false,
            },
            default,
        ))
    }

    /// Declares an integer hyperparameter on `[low, high]`.
    #[must_use]
    pub fn integer(self, name: impl Into<String>, low: i64, high: i64, default: i64) -> Self {
        self.hyperparameter(Hyperparameter::new(
            name,
            Domain::Integer {
                low,
                high,
                log_scale: false,
            },
            default,
        ))
    }

    /// Declares an unordered choice hyperparameter.
    #[must_use]
    pub fn categorical<V: Into<Value>>(
        self,
        name: impl Into<String>,
        choices: impl IntoIterator<Item = V>,
        default: impl Into<Value>,
    ) -> Self {
        let choices = choices.into_iter().map(Into::into).collect();
        self.hyperparameter(Hyperparameter::new(
            name,
            Domain::Categorical { choices },
            default,
        ))
    }

    /// Declares an ordered choice hyperparameter.
    #[must_use]
    pub fn ordinal<V: Into<Value>>(
        self,
        name: impl Into<String>,
        choices: impl IntoIterator<Item = V>,
        default: impl Into<Value>,
    ) -> Self {
        let choices = choices.into_iter().map(Into::into).collect();
        self.hyperparameter(Hyperparameter::new(name, Domain::Ordinal { choices }, default))
    }

    /// Adds a prebuilt hyperparameter.
    #[must_use]
    pub fn hyperparameter(mut self, hyperparameter: Hyperparameter) -> Self {
        self.hyperparameters.push(hyperparameter);
        self
    }

    /// Switches the last declared hyperparameter to log scale.
    #[must_use]
    pub fn log_scale(mut self) -> Self {
        let result = match self.hyperparameters.last_mut() {
            Some(hp) => hp.set_log_scale(),
            None => Err(Error::DanglingModifier("log_scale")),
        };
        if let Err(e) = result {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Adds an activation condition to the last declared hyperparameter.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        if let Some(hp) = self.hyperparameters.pop() {
            self.hyperparameters.push(hp.when(condition));
        } else {
            self.error.get_or_insert(Error::DanglingModifier("when"));
        }
        self
    }

    /// Validates the declarations and builds the space.
    ///
    /// # Errors
    ///
    /// Returns the first construction error encountered.
    pub fn build(self) -> Result<ConfigurationSpace> {
        if let Some(e) = self.error {
            return Err(e);
        }
        ConfigurationSpace::new(self.hyperparameters)
    }
}
