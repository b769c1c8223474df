#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Hyperparameter search engine for trial schedulers. It models structured,
//! conditional configuration spaces, proposes configurations that have never
//! been issued before, and learns from the rewards reported back. Two
//! strategies ship: pure random search and surrogate-guided Bayesian search
//! that falls back to random sampling whenever the surrogate proposes
//! something invalid or already seen.
//!
//! # Getting Started
//!
//! ```
//! use hpsearch::prelude::*;
//!
//! let space = ConfigurationSpace::builder()
//!     .continuous("lr", 1e-4, 1e-1, 1e-3)
//!     .log_scale()
//!     .categorical("batch_size", [32, 64, 128], 64)
//!     .build()
//!     .unwrap();
//!
//! let mut searcher = RandomSearcher::new(space, SearcherConfig::builder().seed(7).build());
//!
//! for _ in 0..5 {
//!     let config = searcher.get_config(10).unwrap();
//!     let lr = config.get("lr").and_then(Value::as_f64).unwrap();
//!     searcher.update(&config, -lr.ln(), None).unwrap();
//! }
//!
//! assert_eq!(searcher.results().n_complete(), 5);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`ConfigurationSpace`] | Ordered hyperparameters plus activation conditions. Immutable once built. |
//! | [`Configuration`] | Assignment of values to the active hyperparameters of a space. |
//! | [`CanonicalKey`] | Order-independent identity of a configuration, stable across restarts. |
//! | [`SpaceAdapter`] | Fixed-order mapping between configurations and numeric vectors. |
//! | [`ResultStore`] | Every configuration issued so far, pending or complete. |
//! | [`Searcher`] | The four-operation contract consumed by a trial scheduler. |
//! | [`SurrogateOptimizer`](optimizer::SurrogateOptimizer) | `ask`/`tell` seam for the model guiding Bayesian search. |
//!
//! # Searchers
//!
//! | Searcher | Strategy | Feature flag |
//! |----------|----------|--------------|
//! | [`RandomSearcher`] | Bounded rejection sampling, default config first | always |
//! | [`SurrogateSearcher`] | Any [`SurrogateOptimizer`](optimizer::SurrogateOptimizer), random fallback | always |
//! | [`GpSearcher`] | [`SurrogateSearcher`] over a Gaussian process (EI, PI, or LCB acquisition) | `gp` |
//!
//! # Concurrency
//!
//! Searchers are serial state machines: every mutating operation takes
//! `&mut self`. Schedulers that call in from several threads wrap the whole
//! searcher in a [`SharedSearcher`], which puts one lock around it.
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `gp` | [`GpOptimizer`](optimizer::gp::GpOptimizer) and [`GpSearcher`] (adds `nalgebra`) | on |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing), including fallback warnings | on |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

mod adapter;
mod checkpoint;
mod config;
mod configuration;
mod error;
pub mod optimizer;
mod rng_util;
pub mod searcher;
mod shared;
pub mod space;
mod store;
mod types;

pub use adapter::SpaceAdapter;
pub use checkpoint::{CHECKPOINT_VERSION, Checkpoint, CheckpointEntry};
pub use config::{SearcherConfig, SearcherConfigBuilder};
pub use configuration::{CanonicalKey, Configuration, Value};
pub use error::{Error, Result};
#[cfg(feature = "gp")]
pub use searcher::GpSearcher;
pub use searcher::{FallbackReason, RandomSearcher, Searcher, SurrogateSearcher};
pub use shared::SharedSearcher;
pub use space::ConfigurationSpace;
pub use store::{RecordStatus, ResultRecord, ResultStore};
pub use types::Direction;

/// Convenient wildcard import for the most common types.
///
/// ```
/// use hpsearch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::adapter::SpaceAdapter;
    pub use crate::checkpoint::Checkpoint;
    pub use crate::config::SearcherConfig;
    pub use crate::configuration::{CanonicalKey, Configuration, Value};
    pub use crate::error::{Error, Result};
    #[cfg(feature = "gp")]
    pub use crate::optimizer::gp::{Acquisition, GpOptimizer};
    pub use crate::optimizer::{Dimension, SurrogateOptimizer};
    #[cfg(feature = "gp")]
    pub use crate::searcher::GpSearcher;
    pub use crate::searcher::{RandomSearcher, Searcher, SurrogateSearcher};
    pub use crate::shared::SharedSearcher;
    pub use crate::space::{Condition, ConfigurationSpace};
    pub use crate::store::{RecordStatus, ResultStore};
    pub use crate::types::Direction;
}
