//! Fixed-order mapping between configurations and numeric vectors.

use std::sync::Arc;

use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::optimizer::Dimension;
use crate::space::{ConfigurationSpace, Domain};

/// Translates configurations to and from the vectors a
/// [`SurrogateOptimizer`](crate::optimizer::SurrogateOptimizer) works on.
///
/// Slot `i` of every vector belongs to the `i`-th declared hyperparameter.
/// Log-scale dimensions hold `ln(value)`, choices hold their index, and
/// inactive slots hold the encoded default so vectors always have a fixed
/// length.
///
/// # Examples
///
/// ```
/// use hpsearch::{ConfigurationSpace, SpaceAdapter};
///
/// let space = ConfigurationSpace::builder()
///     .continuous("lr", 1e-4, 1e-1, 1e-3)
///     .log_scale()
///     .categorical("batch_size", [32, 64, 128], 64)
///     .build()
///     .unwrap();
/// let adapter = SpaceAdapter::new(space);
///
/// let config = adapter.space().default();
/// let x = adapter.encode(&config).unwrap();
/// assert_eq!(x[1], 1.0);
/// assert_eq!(adapter.decode(&x).unwrap(), config);
/// ```
#[derive(Clone, Debug)]
pub struct SpaceAdapter {
    space: Arc<ConfigurationSpace>,
}

impl SpaceAdapter {
    /// Creates an adapter over `space`.
    #[must_use]
    pub fn new(space: impl Into<Arc<ConfigurationSpace>>) -> Self {
        Self {
            space: space.into(),
        }
    }

    /// The underlying space.
    #[must_use]
    pub fn space(&self) -> &Arc<ConfigurationSpace> {
        &self.space
    }

    /// Length of every encoded vector.
    #[must_use]
    pub fn n_dims(&self) -> usize {
        self.space.len()
    }

    /// Per-slot description handed to the guiding optimizer.
    ///
    /// Numeric bounds are already in log space for log-scale hyperparameters.
    #[must_use]
    pub fn dimensions(&self) -> Vec<Dimension> {
        self.space
            .hyperparameters()
            .iter()
            .map(|hp| {
                let (low, high) = hp.domain().internal_bounds();
                match hp.domain() {
                    Domain::Continuous { .. } => Dimension::Real { low, high },
                    Domain::Integer { .. } => Dimension::Integer { low, high },
                    Domain::Categorical { choices } => Dimension::Categorical {
                        n_choices: choices.len(),
                    },
                    Domain::Ordinal { choices } => Dimension::Ordinal {
                        n_choices: choices.len(),
                    },
                }
            })
            .collect()
    }

    /// Encodes a valid configuration into a vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `config` is not valid in
    /// the space.
    pub fn encode(&self, config: &Configuration) -> Result<Vec<f64>> {
        self.space.check(config)?;
        self.space
            .hyperparameters()
            .iter()
            .map(|hp| {
                let value = config.get(hp.name()).unwrap_or(hp.default_value());
                hp.domain().encode(value).ok_or_else(|| {
                    Error::invalid(format!("cannot encode {value} for '{}'", hp.name()))
                })
            })
            .collect()
    }

    /// Decodes a vector into a configuration, applying conditions.
    ///
    /// Slots of inactive hyperparameters are ignored, whatever they hold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for a wrong length, a
    /// non-finite active slot, a continuous coordinate outside its bounds,
    /// or a choice index outside its list.
    pub fn decode(&self, x: &[f64]) -> Result<Configuration> {
        if x.len() != self.n_dims() {
            return Err(Error::invalid(format!(
                "expected a vector of length {}, got {}",
                self.n_dims(),
                x.len()
            )));
        }
        let hyperparameters = self.space.hyperparameters();
        let mut config = Configuration::new();
        for &idx in self.space.activation_order() {
            if !self.space.is_active_at(idx, &config) {
                continue;
            }
            let hp = &hyperparameters[idx];
            let value = hp
                .domain()
                .decode(x[idx])
                .map_err(|reason| Error::invalid(format!("'{}': {reason}", hp.name())))?;
            config.insert(hp.name(), value);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Value;
    use crate::space::Condition;

    fn adapter() -> SpaceAdapter {
        let space = ConfigurationSpace::builder()
            .categorical("optimizer", ["sgd", "adam"], "sgd")
            .continuous("momentum", 0.0, 0.99, 0.9)
            .when(Condition::equals("optimizer", "sgd"))
            .integer("layers", 1, 64, 8)
            .log_scale()
            .build()
            .unwrap();
        SpaceAdapter::new(space)
    }

    #[test]
    fn test_inactive_slot_holds_default() {
        let adapter = adapter();
        let config = Configuration::new()
            .with("optimizer", "adam")
            .with("layers", 4);
        let x = adapter.encode(&config).unwrap();
        assert_eq!(x[0], 1.0);
        assert!((x[1] - 0.9).abs() < 1e-12);
        assert!((x[2] - 4.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_decode_ignores_inactive_slot() {
        let adapter = adapter();
        let config = adapter.decode(&[1.0, f64::NAN, 2.0_f64.ln()]).unwrap();
        assert_eq!(config.get("optimizer"), Some(&Value::from("adam")));
        assert!(!config.contains("momentum"));
        assert_eq!(config.get("layers"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_decode_rejects_structural_problems() {
        let adapter = adapter();
        assert!(adapter.decode(&[0.0, 0.5]).is_err());
        assert!(adapter.decode(&[0.0, f64::NAN, 1.0]).is_err());
        assert!(adapter.decode(&[0.0, 1.5, 1.0]).is_err());
        assert!(adapter.decode(&[2.0, 0.5, 1.0]).is_err());
    }

    #[test]
    fn test_encode_rejects_invalid_config() {
        let adapter = adapter();
        let config = Configuration::new().with("optimizer", "rmsprop");
        assert!(matches!(
            adapter.encode(&config),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_dimensions_in_internal_space() {
        let dims = adapter().dimensions();
        assert_eq!(dims[0], Dimension::Categorical { n_choices: 2 });
        assert_eq!(dims[1], Dimension::Real { low: 0.0, high: 0.99 });
        match dims[2] {
            Dimension::Integer { low, high } => {
                assert_eq!(low, 0.0);
                assert!((high - 64.0_f64.ln()).abs() < 1e-12);
            }
            ref other => panic!("unexpected dimension {other:?}"),
        }
    }
}
