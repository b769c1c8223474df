//! Surrogate-guided search with random fallback.

use std::sync::Arc;

use super::{FallbackReason, RandomSearcher, Searcher};
use crate::adapter::SpaceAdapter;
use crate::config::SearcherConfig;
use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::optimizer::SurrogateOptimizer;
use crate::space::ConfigurationSpace;
use crate::store::ResultStore;
use crate::types::Direction;

/// Searcher that takes proposals from a [`SurrogateOptimizer`] and falls
/// back to random sampling whenever they are unusable.
///
/// Each [`get_config`](Searcher::get_config) call:
///
/// 1. returns the default configuration if nothing was issued yet;
/// 2. asks the optimizer for one point and returns it if it decodes to a
///    valid, never issued configuration;
/// 3. otherwise asks for `max_tries` points and returns the first valid,
///    novel one (skipped when `max_tries == 0`);
/// 4. otherwise logs a warning, remembers the [`FallbackReason`], and
///    returns [`random_config`](Searcher::random_config).
///
/// Optimizer errors never reach the caller. They degrade to step 4 during
/// `get_config` and to a warning during `update`.
#[derive(Debug)]
pub struct SurrogateSearcher<O> {
    fallback: RandomSearcher,
    adapter: SpaceAdapter,
    optimizer: O,
    fallbacks: usize,
    last_fallback: Option<FallbackReason>,
}

fn failure_message(error: Error) -> String {
    match error {
        Error::OptimizerFailure(msg) => msg,
        other => other.to_string(),
    }
}

impl<O: SurrogateOptimizer> SurrogateSearcher<O> {
    /// Creates a searcher over `space` guided by `optimizer`.
    ///
    /// The optimizer must search the vector space described by
    /// [`SpaceAdapter::dimensions`] for the same space.
    #[must_use]
    pub fn new(
        space: impl Into<Arc<ConfigurationSpace>>,
        optimizer: O,
        config: SearcherConfig,
    ) -> Self {
        let space = space.into();
        Self {
            adapter: SpaceAdapter::new(Arc::clone(&space)),
            fallback: RandomSearcher::new(space, config),
            optimizer,
            fallbacks: 0,
            last_fallback: None,
        }
    }

    /// The guiding optimizer.
    #[must_use]
    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// The vector mapping shared with the optimizer.
    #[must_use]
    pub fn adapter(&self) -> &SpaceAdapter {
        &self.adapter
    }

    /// Number of `get_config` calls answered by random fallback.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.fallbacks
    }

    /// Why the most recent fallback happened.
    #[must_use]
    pub fn last_fallback(&self) -> Option<&FallbackReason> {
        self.last_fallback.as_ref()
    }

    /// Returns the first candidate that decodes to a valid, novel configuration.
    fn screen(
        &self,
        candidates: impl IntoIterator<Item = Vec<f64>>,
        invalid: &mut usize,
        duplicates: &mut usize,
    ) -> Option<Configuration> {
        for x in candidates {
            match self.adapter.decode(&x) {
                Ok(config) if self.fallback.results().contains(&config) => *duplicates += 1,
                Ok(config) if self.adapter.space().validate(&config) => return Some(config),
                _ => *invalid += 1,
            }
        }
        None
    }

    fn propose(&mut self, max_tries: usize) -> core::result::Result<Configuration, FallbackReason> {
        let mut invalid = 0;
        let mut duplicates = 0;

        let first = self
            .optimizer
            .ask(1)
            .map_err(|e| FallbackReason::OptimizerFailure(failure_message(e)))?;
        if let Some(config) = self.screen(first.into_iter().take(1), &mut invalid, &mut duplicates)
        {
            return Ok(config);
        }

        if max_tries > 0 {
            let batch = self
                .optimizer
                .ask(max_tries)
                .map_err(|e| FallbackReason::OptimizerFailure(failure_message(e)))?;
            let batch = batch.into_iter().take(max_tries);
            if let Some(config) = self.screen(batch, &mut invalid, &mut duplicates) {
                return Ok(config);
            }
        }

        Err(FallbackReason::NoNovelCandidate {
            invalid,
            duplicates,
        })
    }
}

#[cfg(feature = "gp")]
impl SurrogateSearcher<crate::optimizer::gp::GpOptimizer> {
    /// Creates a searcher guided by a [`GpOptimizer`](crate::optimizer::gp::GpOptimizer)
    /// with default settings, seeded from `config.seed`.
    #[must_use]
    pub fn with_gp(space: impl Into<Arc<ConfigurationSpace>>, config: SearcherConfig) -> Self {
        let space = space.into();
        let mut builder = crate::optimizer::gp::GpOptimizer::builder();
        if let Some(seed) = config.seed {
            builder = builder.seed(seed);
        }
        let optimizer = builder.build(SpaceAdapter::new(Arc::clone(&space)).dimensions());
        Self::new(space, optimizer, config)
    }
}

impl<O: SurrogateOptimizer> Searcher for SurrogateSearcher<O> {
    fn space(&self) -> &Arc<ConfigurationSpace> {
        self.fallback.space()
    }

    fn results(&self) -> &ResultStore {
        self.fallback.results()
    }

    fn direction(&self) -> Direction {
        self.fallback.direction()
    }

    fn default_config(&mut self) -> Configuration {
        self.fallback.default_config()
    }

    fn random_config(&mut self) -> Result<Configuration> {
        self.fallback.random_config()
    }

    fn get_config(&mut self, max_tries: usize) -> Result<Configuration> {
        if self.fallback.results().is_empty() {
            return Ok(self.fallback.default_config());
        }
        match self.propose(max_tries) {
            Ok(config) => {
                self.fallback.record_pending(&config);
                Ok(config)
            }
            Err(reason) => {
                trace_warn!(reason = %reason, "falling back to a random configuration");
                self.fallbacks += 1;
                self.last_fallback = Some(reason);
                self.fallback.random_config()
            }
        }
    }

    fn update(
        &mut self,
        config: &Configuration,
        reward: f64,
        model_params: Option<serde_json::Value>,
    ) -> Result<()> {
        self.fallback.complete(config, reward, model_params)?;
        let x = self.adapter.encode(config)?;
        let y = self.direction().to_minimization(reward);
        if let Err(error) = self.optimizer.tell(&x, y) {
            trace_warn!(error = %error, "optimizer rejected an observation");
            #[cfg(not(feature = "tracing"))]
            drop(error);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Value;

    /// Replays a fixed script of `ask` answers, then fails.
    struct Scripted {
        answers: Vec<Result<Vec<Vec<f64>>>>,
        told: Vec<(Vec<f64>, f64)>,
    }

    impl SurrogateOptimizer for Scripted {
        fn ask(&mut self, _n: usize) -> Result<Vec<Vec<f64>>> {
            if self.answers.is_empty() {
                return Err(Error::OptimizerFailure("script exhausted".into()));
            }
            self.answers.remove(0)
        }

        fn tell(&mut self, x: &[f64], y: f64) -> Result<()> {
            self.told.push((x.to_vec(), y));
            Ok(())
        }

        fn n_observations(&self) -> usize {
            self.told.len()
        }
    }

    fn space() -> ConfigurationSpace {
        ConfigurationSpace::builder()
            .integer("n", 0, 9, 0)
            .build()
            .unwrap()
    }

    fn scripted(answers: Vec<Result<Vec<Vec<f64>>>>) -> SurrogateSearcher<Scripted> {
        SurrogateSearcher::new(
            space(),
            Scripted {
                answers,
                told: Vec::new(),
            },
            SearcherConfig::builder().seed(3).build(),
        )
    }

    #[test]
    fn test_first_proposal_used_when_novel() {
        let mut s = scripted(vec![Ok(vec![vec![4.2]])]);
        s.default_config();
        let c = s.get_config(5).unwrap();
        assert_eq!(c.get("n"), Some(&Value::Int(4)));
        assert_eq!(s.fallback_count(), 0);
    }

    #[test]
    fn test_batch_screened_in_order() {
        let mut s = scripted(vec![Ok(vec![vec![0.0]]), Ok(vec![vec![0.1], vec![7.0], vec![8.0]])]);
        s.default_config();
        let c = s.get_config(3).unwrap();
        assert_eq!(c.get("n"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_zero_max_tries_skips_batch() {
        let mut s = scripted(vec![Ok(vec![vec![0.0]]), Ok(vec![vec![7.0]])]);
        s.default_config();
        let c = s.get_config(0).unwrap();
        assert!(s.space().validate(&c));
        assert_eq!(
            s.last_fallback(),
            Some(&FallbackReason::NoNovelCandidate {
                invalid: 0,
                duplicates: 1
            })
        );
    }

    #[test]
    fn test_optimizer_failure_falls_back() {
        let mut s = scripted(Vec::new());
        s.default_config();
        let c = s.get_config(3).unwrap();
        assert!(s.space().validate(&c));
        assert!(matches!(
            s.last_fallback(),
            Some(FallbackReason::OptimizerFailure(msg)) if msg == "script exhausted"
        ));
    }

    #[test]
    fn test_update_tells_minimization_value() {
        let mut s = scripted(Vec::new());
        let c = s.default_config();
        s.update(&c, 0.75, None).unwrap();
        assert_eq!(s.optimizer().told, vec![(vec![0.0], -0.75)]);
        assert_eq!(s.reward(&c), Some(0.75));
    }
}
