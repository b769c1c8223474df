//! The `ask`/`tell` seam between a searcher and the model guiding it.
//!
//! A [`SurrogateOptimizer`] proposes points in the internal vector space
//! described by a list of [`Dimension`]s and learns from observed
//! `(point, value)` pairs. It always **minimizes**: searchers convert
//! rewards with [`Direction::to_minimization`](crate::Direction::to_minimization)
//! before calling [`tell`](SurrogateOptimizer::tell).
//!
//! # Available optimizers
//!
//! | Optimizer | Algorithm | Feature flag |
//! |-----------|-----------|--------------|
//! | [`GpOptimizer`](gp::GpOptimizer) | Gaussian process, Matérn 5/2 kernel, Expected Improvement | `gp` |
//!
//! Any other model can be plugged into a
//! [`SurrogateSearcher`](crate::SurrogateSearcher) by implementing the trait.

#[cfg(feature = "gp")]
pub mod gp;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rng_util;

/// One slot of the internal vector space.
///
/// Numeric bounds are in internal space: already log-transformed for
/// log-scale hyperparameters. Choice dimensions hold an index in
/// `0..n_choices`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Dimension {
    /// Real range `[low, high]`.
    Real {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
    /// Integer range `[low, high]`, rounded on decode.
    Integer {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
    /// Unordered choice index.
    Categorical {
        /// Number of choices.
        n_choices: usize,
    },
    /// Ordered choice index.
    Ordinal {
        /// Number of choices.
        n_choices: usize,
    },
}

impl Dimension {
    /// Returns a description of the problem if the dimension cannot be searched.
    #[must_use]
    pub fn problem(&self) -> Option<String> {
        match self {
            Dimension::Real { low, high } | Dimension::Integer { low, high } => {
                if !low.is_finite() || !high.is_finite() {
                    Some(format!("non-finite bounds [{low}, {high}]"))
                } else if low > high {
                    Some(format!("low {low} exceeds high {high}"))
                } else {
                    None
                }
            }
            Dimension::Categorical { n_choices } | Dimension::Ordinal { n_choices } => {
                (*n_choices == 0).then(|| "no choices".to_owned())
            }
        }
    }

    /// Internal-space bounds of the dimension.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Dimension::Real { low, high } | Dimension::Integer { low, high } => (*low, *high),
            Dimension::Categorical { n_choices } | Dimension::Ordinal { n_choices } => {
                (0.0, n_choices.saturating_sub(1) as f64)
            }
        }
    }

    /// Draws a uniform point. Choice dimensions yield a whole index.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn sample(&self, rng: &mut fastrand::Rng) -> f64 {
        match self {
            Dimension::Real { low, high } | Dimension::Integer { low, high } => {
                rng_util::f64_range(rng, *low, *high)
            }
            Dimension::Categorical { n_choices } | Dimension::Ordinal { n_choices } => {
                rng.usize(0..(*n_choices).max(1)) as f64
            }
        }
    }
}

/// A model that proposes points and learns from observations.
///
/// Implementations must be deterministic given their seed and the ordered
/// history of `ask` and `tell` calls, so replaying a run rebuilds the same
/// state.
pub trait SurrogateOptimizer {
    /// Proposes `n` points, most promising first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptimizerFailure`](crate::Error::OptimizerFailure)
    /// if the model cannot produce proposals.
    fn ask(&mut self, n: usize) -> Result<Vec<Vec<f64>>>;

    /// Records that `x` scored `y`. Lower is better.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptimizerFailure`](crate::Error::OptimizerFailure)
    /// for malformed observations.
    fn tell(&mut self, x: &[f64], y: f64) -> Result<()>;

    /// Number of observations told so far.
    fn n_observations(&self) -> usize;
}

impl<O: SurrogateOptimizer + ?Sized> SurrogateOptimizer for Box<O> {
    fn ask(&mut self, n: usize) -> Result<Vec<Vec<f64>>> {
        (**self).ask(n)
    }

    fn tell(&mut self, x: &[f64], y: f64) -> Result<()> {
        (**self).tell(x, y)
    }

    fn n_observations(&self) -> usize {
        (**self).n_observations()
    }
}
