//! Random search with deduplication.

use std::sync::Arc;

use super::Searcher;
use crate::config::SearcherConfig;
use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::rng_util;
use crate::space::ConfigurationSpace;
use crate::store::ResultStore;
use crate::types::Direction;

/// Searcher that issues the default configuration first, then novel
/// random samples.
///
/// Random draws are bounded by
/// [`SearcherConfig::random_attempts`]. When every draw hits an already
/// issued configuration and the space is finite and small enough
/// ([`SearcherConfig::enumeration_limit`]), the remaining unseen
/// configurations are enumerated and one is picked uniformly, so small
/// spaces are exhausted completely before
/// [`Error::ExhaustedBudget`] is returned.
///
/// # Examples
///
/// ```
/// use hpsearch::prelude::*;
///
/// let space = ConfigurationSpace::builder()
///     .categorical("activation", ["relu", "tanh"], "relu")
///     .build()
///     .unwrap();
/// let mut searcher = RandomSearcher::new(space, SearcherConfig::builder().seed(1).build());
///
/// let first = searcher.get_config(0).unwrap();
/// assert_eq!(first.get("activation"), Some(&Value::from("relu")));
/// let second = searcher.get_config(0).unwrap();
/// assert_eq!(second.get("activation"), Some(&Value::from("tanh")));
/// assert!(matches!(searcher.get_config(0), Err(Error::ExhaustedBudget { .. })));
/// ```
#[derive(Debug)]
pub struct RandomSearcher {
    space: Arc<ConfigurationSpace>,
    store: ResultStore,
    rng: fastrand::Rng,
    config: SearcherConfig,
}

impl RandomSearcher {
    /// Creates a searcher over `space`.
    #[must_use]
    pub fn new(space: impl Into<Arc<ConfigurationSpace>>, config: SearcherConfig) -> Self {
        let space = space.into();
        Self {
            store: ResultStore::new(Arc::clone(&space)),
            rng: rng_util::seeded(config.seed),
            space,
            config,
        }
    }

    /// The settings this searcher was built with.
    #[must_use]
    pub fn config(&self) -> &SearcherConfig {
        &self.config
    }

    pub(crate) fn record_pending(&mut self, config: &Configuration) {
        self.store.record(config, None);
        trace_debug!(config = %self.store.key_of(config), "configuration issued");
    }

    /// Validates and records a reported reward.
    pub(crate) fn complete(
        &mut self,
        config: &Configuration,
        reward: f64,
        model_params: Option<serde_json::Value>,
    ) -> Result<()> {
        self.space.check(config)?;
        if !reward.is_finite() {
            return Err(Error::NonFiniteReward(reward));
        }
        self.store.record(config, Some(reward));
        if let Some(params) = model_params {
            self.store.set_model_params(config, params);
        }
        trace_info!(config = %self.store.key_of(config), reward, "trial completed");
        Ok(())
    }

    fn unseen_by_enumeration(&mut self) -> Option<Configuration> {
        let unseen: Vec<Configuration> = self
            .space
            .enumerate(self.config.enumeration_limit)?
            .into_iter()
            .filter(|c| !self.store.contains(c))
            .collect();
        if unseen.is_empty() {
            return None;
        }
        let pick = self.rng.usize(0..unseen.len());
        unseen.into_iter().nth(pick)
    }
}

impl Searcher for RandomSearcher {
    fn space(&self) -> &Arc<ConfigurationSpace> {
        &self.space
    }

    fn results(&self) -> &ResultStore {
        &self.store
    }

    fn direction(&self) -> Direction {
        self.config.direction
    }

    fn default_config(&mut self) -> Configuration {
        let config = self.space.default();
        if !self.store.contains(&config) {
            self.record_pending(&config);
        }
        config
    }

    fn random_config(&mut self) -> Result<Configuration> {
        let attempts = self.config.random_attempts;
        if attempts == 0 {
            return Err(Error::ExhaustedBudget { attempts });
        }
        for _ in 0..attempts {
            let config = self.space.sample(&mut self.rng);
            if !self.store.contains(&config) {
                self.record_pending(&config);
                return Ok(config);
            }
        }
        if let Some(config) = self.unseen_by_enumeration() {
            trace_debug!(attempts, "random draws exhausted, picked by enumeration");
            self.record_pending(&config);
            return Ok(config);
        }
        trace_warn!(attempts, "no novel configuration found");
        Err(Error::ExhaustedBudget { attempts })
    }

    /// Returns the default configuration first, then novel random samples.
    /// `max_tries` is unused: random draws are bounded by
    /// [`SearcherConfig::random_attempts`].
    fn get_config(&mut self, _max_tries: usize) -> Result<Configuration> {
        if self.store.is_empty() {
            return Ok(self.default_config());
        }
        self.random_config()
    }

    fn update(
        &mut self,
        config: &Configuration,
        reward: f64,
        model_params: Option<serde_json::Value>,
    ) -> Result<()> {
        self.complete(config, reward, model_params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Value;

    fn searcher(config: SearcherConfig) -> RandomSearcher {
        let space = ConfigurationSpace::builder()
            .integer("n", 0, 3, 1)
            .build()
            .unwrap();
        RandomSearcher::new(space, config)
    }

    #[test]
    fn test_default_config_idempotent() {
        let mut s = searcher(SearcherConfig::builder().seed(0).build());
        let a = s.default_config();
        let b = s.default_config();
        assert_eq!(a, b);
        assert_eq!(s.results().len(), 1);
        assert_eq!(a.get("n"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_zero_budget_exhausted() {
        let mut s = searcher(SearcherConfig::builder().seed(0).random_attempts(0).build());
        assert!(matches!(
            s.random_config(),
            Err(Error::ExhaustedBudget { attempts: 0 })
        ));
        assert!(s.results().is_empty());
    }

    #[test]
    fn test_enumeration_finishes_small_space() {
        let mut s = searcher(SearcherConfig::builder().seed(5).random_attempts(1).build());
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(s.get_config(0).unwrap());
        }
        for (i, c) in seen.iter().enumerate() {
            assert!(!seen[..i].contains(c));
        }
        assert!(s.get_config(0).is_err());
    }

    #[test]
    fn test_update_rejects_bad_input() {
        let mut s = searcher(SearcherConfig::default());
        let valid = Configuration::new().with("n", 2);
        assert!(matches!(
            s.update(&valid, f64::NAN, None),
            Err(Error::NonFiniteReward(_))
        ));
        let invalid = Configuration::new().with("n", 9);
        assert!(matches!(
            s.update(&invalid, 1.0, None),
            Err(Error::InvalidConfiguration { .. })
        ));
        assert!(s.results().is_empty());
    }
}
