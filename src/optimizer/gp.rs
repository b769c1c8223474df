//! Gaussian process optimizer with a choice of acquisition functions.
//!
//! Fits a GP surrogate with a **Matérn 5/2 kernel** (ARD lengthscales) to
//! the observations told so far and proposes the candidates that score
//! highest under the configured [`Acquisition`]: **Expected Improvement
//! (EI)** by default, **Probability of Improvement (PI)**, or a **Lower
//! Confidence Bound (LCB)**.
//!
//! # Algorithm overview
//!
//! 1. **Initial phase**: until `n_initial_points` observations have been
//!    told, `ask(n)` returns `n` uniform random points.
//! 2. **Fit GP**: targets are standardized and inputs normalized per
//!    dimension. Numeric dimensions are scaled to `[0, 1]` by their bounds,
//!    ordinal indices by `n_choices - 1`, and categorical dimensions
//!    contribute a 0/1 mismatch distance. Only the 100 most recent
//!    observations are used.
//! 3. **Maximize the acquisition**: `n_candidates` random points are scored
//!    under the posterior and the best `n` distinct ones are returned.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `n_initial_points` | 10 | Observations before the GP guides proposals |
//! | `n_candidates` | 1000 | Random candidates scored per `ask` |
//! | `noise_variance` | 1e-6 | Observation noise added to the kernel diagonal |
//! | `acquisition` | EI | How candidates are ranked, see [`Acquisition`] |
//! | `seed` | random | RNG seed for reproducibility |
//!
//! # Examples
//!
//! ```
//! use hpsearch::optimizer::gp::GpOptimizer;
//! use hpsearch::optimizer::{Dimension, SurrogateOptimizer};
//!
//! let mut gp = GpOptimizer::builder()
//!     .n_initial_points(3)
//!     .n_candidates(200)
//!     .seed(42)
//!     .build(vec![Dimension::Real { low: -2.0, high: 2.0 }]);
//!
//! for _ in 0..8 {
//!     let x = gp.ask(1).unwrap().remove(0);
//!     gp.tell(&x, x[0] * x[0]).unwrap();
//! }
//! assert_eq!(gp.n_observations(), 8);
//! ```

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::{Dimension, SurrogateOptimizer};
use crate::error::{Error, Result};
use crate::rng_util;

/// Default number of observations before the GP kicks in.
const DEFAULT_N_INITIAL: usize = 10;
/// Default number of candidate points for EI optimization.
const DEFAULT_N_CANDIDATES: usize = 1000;
/// Default observation noise variance.
const DEFAULT_NOISE_VAR: f64 = 1e-6;

/// Maximum number of training points to use for the GP.
/// Caps computational cost at O(`MAX_TRAIN_POINTS`^3) per `ask`.
const MAX_TRAIN_POINTS: usize = 100;

/// Precomputed √5 constant.
const SQRT_5: f64 = 2.236_067_977_499_79;

/// How candidate points are ranked under the GP posterior.
///
/// The optimizer minimizes, so "improvement" means a value below the best
/// observation so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Acquisition {
    /// Expected amount by which a candidate beats the best observation.
    #[default]
    ExpectedImprovement,
    /// Probability that a candidate beats the best observation.
    ProbabilityOfImprovement,
    /// Optimistic estimate `mean - kappa * std`. Larger `kappa` explores
    /// more; 1.96 is a common choice.
    LowerConfidenceBound {
        /// Weight of the posterior standard deviation. Finite, non-negative.
        kappa: f64,
    },
}

impl Acquisition {
    /// Score to maximize for a posterior `mean` and `std`, given the best
    /// observed value `f_best`.
    fn score(self, mean: f64, std: f64, f_best: f64) -> f64 {
        match self {
            Acquisition::ExpectedImprovement => expected_improvement(mean, std, f_best),
            Acquisition::ProbabilityOfImprovement => {
                probability_of_improvement(mean, std, f_best)
            }
            Acquisition::LowerConfidenceBound { kappa } => kappa * std - mean,
        }
    }

    fn problem(self) -> Option<String> {
        match self {
            Acquisition::LowerConfidenceBound { kappa } if !kappa.is_finite() || kappa < 0.0 => Some(
                format!("lower confidence bound kappa must be finite and non-negative, got {kappa}"),
            ),
            _ => None,
        }
    }
}

/// Gaussian process optimizer over a fixed list of [`Dimension`]s.
///
/// A dimension list with malformed entries is accepted at construction,
/// but every subsequent [`ask`](SurrogateOptimizer::ask) fails with
/// [`Error::OptimizerFailure`].
#[derive(Debug)]
pub struct GpOptimizer {
    dimensions: Vec<Dimension>,
    problem: Option<String>,
    rng: fastrand::Rng,
    n_initial_points: usize,
    n_candidates: usize,
    noise_variance: f64,
    acquisition: Acquisition,
    x_observed: Vec<Vec<f64>>,
    y_observed: Vec<f64>,
}

impl GpOptimizer {
    /// Creates an optimizer with default settings and a random seed.
    #[must_use]
    pub fn new(dimensions: Vec<Dimension>) -> Self {
        GpOptimizerBuilder::new().build(dimensions)
    }

    /// Creates a builder for configuring a `GpOptimizer`.
    #[must_use]
    pub fn builder() -> GpOptimizerBuilder {
        GpOptimizerBuilder::new()
    }

    /// The acquisition function ranking candidates.
    #[must_use]
    pub fn acquisition(&self) -> Acquisition {
        self.acquisition
    }

    /// The dimensions this optimizer searches.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    fn random_point(&mut self) -> Vec<f64> {
        self.dimensions
            .iter()
            .map(|d| d.sample(&mut self.rng))
            .collect()
    }

    fn is_categorical(&self) -> Vec<bool> {
        self.dimensions
            .iter()
            .map(|d| matches!(d, Dimension::Categorical { .. }))
            .collect()
    }

    /// Map an internal-space point to kernel features.
    fn features(&self, x: &[f64]) -> Vec<f64> {
        self.dimensions
            .iter()
            .zip(x)
            .map(|(dim, &v)| match dim {
                Dimension::Categorical { .. } => v.round(),
                _ => {
                    let (lo, hi) = dim.bounds();
                    to_normalized(v, lo, hi)
                }
            })
            .collect()
    }
}

/// Builder for configuring a [`GpOptimizer`].
///
/// All options have sensible defaults:
/// - `n_initial_points`: 10
/// - `n_candidates`: 1000
/// - `noise_variance`: 1e-6
/// - `acquisition`: [`Acquisition::ExpectedImprovement`]
/// - `seed`: random
#[derive(Debug, Clone, Default)]
pub struct GpOptimizerBuilder {
    n_initial_points: Option<usize>,
    n_candidates: Option<usize>,
    noise_variance: Option<f64>,
    acquisition: Option<Acquisition>,
    seed: Option<u64>,
}

impl GpOptimizerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of observations answered with random points before
    /// the GP guides proposals.
    ///
    /// Default: 10.
    #[must_use]
    pub fn n_initial_points(mut self, n: usize) -> Self {
        self.n_initial_points = Some(n);
        self
    }

    /// Sets the number of random candidates scored per `ask`.
    ///
    /// More candidates improve the quality of the acquisition maximum
    /// at the cost of more GP predictions.
    ///
    /// Default: 1000.
    #[must_use]
    pub fn n_candidates(mut self, n: usize) -> Self {
        self.n_candidates = Some(n);
        self
    }

    /// Sets the observation noise variance added to the kernel diagonal.
    ///
    /// Larger values make the GP smoother.
    ///
    /// Default: 1e-6 (near-noiseless).
    #[must_use]
    pub fn noise_variance(mut self, v: f64) -> Self {
        self.noise_variance = Some(v);
        self
    }

    /// Sets the acquisition function.
    ///
    /// A [`Acquisition::LowerConfidenceBound`] with a negative or
    /// non-finite `kappa` makes every `ask` fail.
    ///
    /// Default: [`Acquisition::ExpectedImprovement`].
    #[must_use]
    pub fn acquisition(mut self, acquisition: Acquisition) -> Self {
        self.acquisition = Some(acquisition);
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the optimizer for `dimensions`.
    #[must_use]
    pub fn build(self, dimensions: Vec<Dimension>) -> GpOptimizer {
        let acquisition = self.acquisition.unwrap_or_default();
        let problem = dimensions
            .iter()
            .enumerate()
            .find_map(|(i, d)| d.problem().map(|p| format!("dimension {i}: {p}")))
            .or_else(|| acquisition.problem());
        GpOptimizer {
            dimensions,
            problem,
            rng: rng_util::seeded(self.seed),
            n_initial_points: self.n_initial_points.unwrap_or(DEFAULT_N_INITIAL),
            n_candidates: self.n_candidates.unwrap_or(DEFAULT_N_CANDIDATES),
            noise_variance: self.noise_variance.unwrap_or(DEFAULT_NOISE_VAR),
            acquisition,
            x_observed: Vec::new(),
            y_observed: Vec::new(),
        }
    }
}

impl SurrogateOptimizer for GpOptimizer {
    fn ask(&mut self, n: usize) -> Result<Vec<Vec<f64>>> {
        if let Some(problem) = &self.problem {
            return Err(Error::OptimizerFailure(problem.clone()));
        }
        if n == 0 {
            return Ok(Vec::new());
        }
        if self.y_observed.len() < self.n_initial_points {
            return Ok((0..n).map(|_| self.random_point()).collect());
        }

        let start = self.y_observed.len().saturating_sub(MAX_TRAIN_POINTS);
        let x_train: Vec<Vec<f64>> = self.x_observed[start..]
            .iter()
            .map(|x| self.features(x))
            .collect();
        let model = fit_gp(
            &x_train,
            &self.y_observed[start..],
            &self.is_categorical(),
            self.noise_variance,
        )?;

        let mut scored: Vec<(f64, Vec<f64>)> = (0..self.n_candidates.max(n))
            .map(|_| {
                let x = self.random_point();
                let (mean, std) = model.predict(&self.features(&x));
                (self.acquisition.score(mean, std, model.f_best), x)
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut proposals: Vec<Vec<f64>> = Vec::with_capacity(n);
        for (_, x) in scored {
            if proposals.len() == n {
                break;
            }
            if !proposals.contains(&x) {
                proposals.push(x);
            }
        }
        trace_debug!(
            n_proposals = proposals.len(),
            n_train = x_train.len(),
            "GP proposals ready"
        );
        Ok(proposals)
    }

    fn tell(&mut self, x: &[f64], y: f64) -> Result<()> {
        if x.len() != self.dimensions.len() {
            return Err(Error::OptimizerFailure(format!(
                "expected {} coordinates, got {}",
                self.dimensions.len(),
                x.len()
            )));
        }
        if !y.is_finite() || x.iter().any(|v| !v.is_finite()) {
            return Err(Error::OptimizerFailure(
                "observations must be finite".to_owned(),
            ));
        }
        self.x_observed.push(x.to_vec());
        self.y_observed.push(y);
        Ok(())
    }

    fn n_observations(&self) -> usize {
        self.y_observed.len()
    }
}

// ---------------------------------------------------------------------------
// Matérn 5/2 kernel
// ---------------------------------------------------------------------------

/// Matérn 5/2 kernel with ARD lengthscales and categorical mismatch.
///
/// `k(x1, x2) = σ² (1 + √5 r + 5/3 r²) exp(-√5 r)`
/// where `r = sqrt(Σ (d_i / l_i)²)` and `d_i` is the coordinate difference,
/// or `0`/`1` for categorical dimensions.
struct Kernel {
    lengthscales: Vec<f64>,
    categorical: Vec<bool>,
    signal_var: f64,
}

impl Kernel {
    fn eval(&self, x1: &[f64], x2: &[f64]) -> f64 {
        let r_sq: f64 = x1
            .iter()
            .zip(x2)
            .zip(self.lengthscales.iter().zip(&self.categorical))
            .map(|((a, b), (l, &is_cat))| {
                // categorical features are whole choice indices
                let diff = if is_cat {
                    if (a - b).abs() < 0.5 { 0.0 } else { 1.0 }
                } else {
                    a - b
                };
                (diff / l).powi(2)
            })
            .sum();
        let r = r_sq.sqrt();
        let sqrt5_r = SQRT_5 * r;
        self.signal_var * (1.0 + sqrt5_r + 5.0 / 3.0 * r_sq) * (-sqrt5_r).exp()
    }

    /// Build the kernel matrix `K + σ²I`.
    fn matrix(&self, x: &[Vec<f64>], noise_var: f64) -> DMatrix<f64> {
        let n = x.len();
        DMatrix::from_fn(n, n, |i, j| {
            let k = self.eval(&x[i], &x[j]);
            if i == j { k + noise_var } else { k }
        })
    }

    /// Compute the kernel vector k(x*, X) for a test point.
    fn vector(&self, x_star: &[f64], x_train: &[Vec<f64>]) -> DVector<f64> {
        DVector::from_fn(x_train.len(), |i, _| self.eval(x_star, &x_train[i]))
    }
}

// ---------------------------------------------------------------------------
// GP fitting and prediction
// ---------------------------------------------------------------------------

/// A fitted GP model ready for predictions.
struct GpModel {
    /// Cholesky factor L of K + σ²I.
    cholesky: nalgebra::linalg::Cholesky<f64, nalgebra::Dyn>,
    /// α = (K + σ²I)^{-1} y.
    alpha: DVector<f64>,
    x_train: Vec<Vec<f64>>,
    kernel: Kernel,
    /// Best observed (standardized) y.
    f_best: f64,
}

impl GpModel {
    /// Predict mean and standard deviation at a feature vector.
    fn predict(&self, x: &[f64]) -> (f64, f64) {
        let k_star = self.kernel.vector(x, &self.x_train);
        let mean = k_star.dot(&self.alpha);
        let v = self.cholesky.solve(&k_star);
        let var = (self.kernel.signal_var - k_star.dot(&v)).max(0.0);
        (mean, var.sqrt())
    }
}

#[allow(clippy::cast_precision_loss)]
fn fit_gp(
    x_train: &[Vec<f64>],
    y_train: &[f64],
    categorical: &[bool],
    noise_var: f64,
) -> Result<GpModel> {
    let n = y_train.len();
    if n == 0 {
        return Err(Error::OptimizerFailure("no observations to fit".to_owned()));
    }

    // Standardize y
    let y_mean = y_train.iter().sum::<f64>() / n as f64;
    let y_var = if n > 1 {
        y_train.iter().map(|&y| (y - y_mean).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        1.0
    };
    let y_std = y_var.sqrt().max(1e-10);
    let y_standardized: Vec<f64> = y_train.iter().map(|&y| (y - y_mean) / y_std).collect();
    let f_best = y_standardized.iter().copied().fold(f64::INFINITY, f64::min);

    // ARD lengthscales: per-dimension std dev of the normalized inputs
    let lengthscales: Vec<f64> = categorical
        .iter()
        .enumerate()
        .map(|(j, &is_cat)| {
            if is_cat {
                return 1.0;
            }
            let mean_j = x_train.iter().map(|x| x[j]).sum::<f64>() / n as f64;
            let var_j = x_train.iter().map(|x| (x[j] - mean_j).powi(2)).sum::<f64>() / n as f64;
            var_j.sqrt().max(0.01)
        })
        .collect();

    let kernel = Kernel {
        lengthscales,
        categorical: categorical.to_vec(),
        signal_var: 1.0,
    };
    let k = kernel.matrix(x_train, noise_var);
    let cholesky = nalgebra::linalg::Cholesky::new(k).ok_or_else(|| {
        Error::OptimizerFailure("kernel matrix is not positive definite".to_owned())
    })?;
    let alpha = cholesky.solve(&DVector::from_column_slice(&y_standardized));

    Ok(GpModel {
        cholesky,
        alpha,
        x_train: x_train.to_vec(),
        kernel,
        f_best,
    })
}

/// Convert an internal-space value to normalized [0, 1] using bounds.
fn to_normalized(value: f64, lo: f64, hi: f64) -> f64 {
    if (hi - lo).abs() < 1e-15 {
        0.5
    } else {
        (value - lo) / (hi - lo)
    }
}

// ---------------------------------------------------------------------------
// Acquisition functions
// ---------------------------------------------------------------------------

/// Standard normal PDF.
fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF (Abramowitz-Stegun rational approximation).
fn norm_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }
    let t = 1.0 / (1.0 + 0.231_641_9 * x.abs());
    let poly = t
        * (0.319_381_530
            + t * (-0.356_563_782 + t * (1.781_477_937 + t * (-1.821_255_978 + t * 1.330_274_429))));
    let cdf = 1.0 - norm_pdf(x.abs()) * poly;
    if x >= 0.0 { cdf } else { 1.0 - cdf }
}

/// `EI(x) = (f_best - mean) Φ(z) + std φ(z)` with `z = (f_best - mean) / std`.
fn expected_improvement(mean: f64, std: f64, f_best: f64) -> f64 {
    if std < 1e-12 {
        return (f_best - mean).max(0.0);
    }
    let z = (f_best - mean) / std;
    ((f_best - mean) * norm_cdf(z) + std * norm_pdf(z)).max(0.0)
}

/// `PI(x) = Φ((f_best - mean) / std)`.
fn probability_of_improvement(mean: f64, std: f64, f_best: f64) -> f64 {
    if std < 1e-12 {
        return if mean < f_best { 1.0 } else { 0.0 };
    }
    norm_cdf((f_best - mean) / std)
}
