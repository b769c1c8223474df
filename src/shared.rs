//! One lock around a whole searcher, for multi-threaded schedulers.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::configuration::Configuration;
use crate::error::Result;
use crate::searcher::Searcher;

/// A cloneable handle that serializes every call into a [`Searcher`].
///
/// The store and the guiding optimizer are always mutated together under
/// the same lock, so concurrent schedulers observe the searcher as a single
/// serial state machine.
///
/// # Examples
///
/// ```
/// use std::thread;
///
/// use hpsearch::prelude::*;
///
/// let space = ConfigurationSpace::builder()
///     .integer("units", 1, 512, 64)
///     .log_scale()
///     .build()
///     .unwrap();
/// let shared = SharedSearcher::new(RandomSearcher::new(space, SearcherConfig::default()));
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let searcher = shared.clone();
///         thread::spawn(move || {
///             let config = searcher.get_config(10).unwrap();
///             searcher.update(&config, 1.0, None).unwrap();
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(shared.lock().results().n_complete(), 4);
/// ```
#[derive(Debug)]
pub struct SharedSearcher<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedSearcher<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Searcher> SharedSearcher<S> {
    /// Wraps `searcher`.
    #[must_use]
    pub fn new(searcher: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(searcher)),
        }
    }

    /// Locks the searcher for a sequence of calls.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock()
    }

    /// See [`Searcher::get_config`].
    ///
    /// # Errors
    ///
    /// Propagates the searcher's error.
    pub fn get_config(&self, max_tries: usize) -> Result<Configuration> {
        self.inner.lock().get_config(max_tries)
    }

    /// See [`Searcher::update`].
    ///
    /// # Errors
    ///
    /// Propagates the searcher's error.
    pub fn update(
        &self,
        config: &Configuration,
        reward: f64,
        model_params: Option<serde_json::Value>,
    ) -> Result<()> {
        self.inner.lock().update(config, reward, model_params)
    }

    /// See [`Searcher::default_config`].
    pub fn default_config(&self) -> Configuration {
        self.inner.lock().default_config()
    }

    /// See [`Searcher::random_config`].
    ///
    /// # Errors
    ///
    /// Propagates the searcher's error.
    pub fn random_config(&self) -> Result<Configuration> {
        self.inner.lock().random_config()
    }

    /// Unwraps the searcher if this is the last handle.
    ///
    /// # Errors
    ///
    /// Returns the handle unchanged while other clones are alive.
    pub fn into_inner(self) -> core::result::Result<S, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}
