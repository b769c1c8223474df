//! The searcher contract and its two strategies.
//!
//! A trial scheduler drives a [`Searcher`] through four operations:
//! [`default_config`](Searcher::default_config),
//! [`random_config`](Searcher::random_config),
//! [`get_config`](Searcher::get_config), and [`update`](Searcher::update).
//! Every configuration a searcher returns is valid in its space and has
//! never been returned before.
//!
//! | Searcher | Strategy |
//! |----------|----------|
//! | [`RandomSearcher`] | Default configuration first, then bounded rejection sampling |
//! | [`SurrogateSearcher`] | Proposals from a [`SurrogateOptimizer`](crate::optimizer::SurrogateOptimizer), random fallback |

mod random;
mod surrogate;

use core::fmt;
use std::collections::HashSet;
use std::sync::Arc;

pub use random::RandomSearcher;
pub use surrogate::SurrogateSearcher;

use crate::checkpoint::{CHECKPOINT_VERSION, Checkpoint};
use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::space::ConfigurationSpace;
use crate::store::ResultStore;
use crate::types::Direction;

/// A [`SurrogateSearcher`] guided by a Gaussian process.
#[cfg(feature = "gp")]
pub type GpSearcher = SurrogateSearcher<crate::optimizer::gp::GpOptimizer>;

/// The contract a trial scheduler consumes.
///
/// All mutating operations take `&mut self`: a searcher is a serial state
/// machine. Share one across threads with [`SharedSearcher`](crate::SharedSearcher).
pub trait Searcher {
    /// The space configurations are drawn from.
    fn space(&self) -> &Arc<ConfigurationSpace>;

    /// Every configuration issued so far.
    fn results(&self) -> &ResultStore;

    /// Whether higher or lower rewards are better.
    fn direction(&self) -> Direction;

    /// Returns the space's default configuration, recording it as pending
    /// if it was never issued. Calling it again returns the same
    /// configuration and changes nothing.
    fn default_config(&mut self) -> Configuration;

    /// Returns a random configuration that was never issued before.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExhaustedBudget`] if no novel configuration was
    /// found within the configured number of random attempts.
    fn random_config(&mut self) -> Result<Configuration>;

    /// Returns the next configuration to evaluate, recorded as pending.
    ///
    /// `max_tries` bounds the extra proposals a guided searcher screens
    /// before falling back to [`random_config`](Self::random_config).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExhaustedBudget`] when even the random fallback
    /// cannot find a novel configuration.
    fn get_config(&mut self, max_tries: usize) -> Result<Configuration>;

    /// Reports the reward of an evaluated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `config` is not valid in
    /// the space and [`Error::NonFiniteReward`] for NaN or infinite rewards.
    fn update(
        &mut self,
        config: &Configuration,
        reward: f64,
        model_params: Option<serde_json::Value>,
    ) -> Result<()>;

    /// The reported reward of `config`, if complete.
    fn reward(&self, config: &Configuration) -> Option<f64> {
        self.results().get(config).and_then(|record| record.reward)
    }

    /// The best configuration reported so far.
    fn best_config(&self) -> Option<Configuration> {
        self.results()
            .best(self.direction())
            .map(|record| record.config.clone())
    }

    /// The best reward reported so far.
    fn best_reward(&self) -> Option<f64> {
        self.results()
            .best(self.direction())
            .and_then(|record| record.reward)
    }

    /// Snapshots every completed evaluation.
    fn checkpoint(&self) -> Checkpoint {
        Checkpoint::from_store(self.results())
    }

    /// Replays a checkpoint into a fresh searcher, entry by entry, through
    /// [`update`](Self::update).
    ///
    /// Every entry is checked before anything is replayed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResumeConflict`] if this searcher already issued
    /// configurations, and [`Error::InvalidConfiguration`] for an unknown
    /// version, an entry whose key does not match its configuration, a key
    /// listed twice, or an entry that is not valid in the space.
    fn restore(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        if !self.results().is_empty() {
            return Err(Error::ResumeConflict(self.results().len()));
        }
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(Error::invalid(format!(
                "unsupported checkpoint version {}",
                checkpoint.version
            )));
        }
        let mut seen = HashSet::with_capacity(checkpoint.len());
        for entry in &checkpoint.entries {
            self.space().check(&entry.config)?;
            let key = self.space().canonical_key(&entry.config);
            if key != entry.key {
                return Err(Error::invalid(format!(
                    "checkpoint key {} does not match configuration key {key}",
                    entry.key
                )));
            }
            if !seen.insert(key) {
                return Err(Error::invalid(format!(
                    "checkpoint lists {} more than once",
                    entry.key
                )));
            }
            if !entry.reward.is_finite() {
                return Err(Error::NonFiniteReward(entry.reward));
            }
        }
        for entry in &checkpoint.entries {
            self.update(&entry.config, entry.reward, entry.model_params.clone())?;
        }
        trace_info!(entries = checkpoint.len(), "checkpoint restored");
        Ok(())
    }
}

/// Why a guided searcher fell back to random sampling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    /// The optimizer answered, but no proposal was both valid and new.
    NoNovelCandidate {
        /// Proposals that failed to decode into a valid configuration.
        invalid: usize,
        /// Proposals that decoded to an already issued configuration.
        duplicates: usize,
    },
    /// The optimizer failed to propose.
    OptimizerFailure(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoNovelCandidate {
                invalid,
                duplicates,
            } => write!(
                f,
                "no novel candidate ({invalid} invalid, {duplicates} duplicates)"
            ),
            FallbackReason::OptimizerFailure(msg) => write!(f, "optimizer failure: {msg}"),
        }
    }
}
