//! Searcher settings.

use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// Default number of random draws before giving up on a novel configuration.
const DEFAULT_RANDOM_ATTEMPTS: usize = 1000;
/// Default largest finite space that is enumerated once random draws stall.
const DEFAULT_ENUMERATION_LIMIT: usize = 10_000;

/// Settings shared by every searcher.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use hpsearch::{Direction, SearcherConfig};
///
/// let config: SearcherConfig = serde_json::from_str(r#"{"seed": 3, "direction": "minimize"}"#).unwrap();
/// assert_eq!(config.seed, Some(3));
/// assert_eq!(config.direction, Direction::Minimize);
/// assert_eq!(config.random_attempts, 1000);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearcherConfig {
    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Whether higher or lower rewards are better.
    pub direction: Direction,
    /// Random draws per [`random_config`](crate::Searcher::random_config) call.
    pub random_attempts: usize,
    /// Finite spaces up to this many configurations are enumerated when
    /// every random draw was a duplicate.
    pub enumeration_limit: usize,
}

impl Default for SearcherConfig {
    fn default() -> Self {
        Self {
            seed: None,
            direction: Direction::Maximize,
            random_attempts: DEFAULT_RANDOM_ATTEMPTS,
            enumeration_limit: DEFAULT_ENUMERATION_LIMIT,
        }
    }
}

impl SearcherConfig {
    /// Creates a builder for configuring a `SearcherConfig`.
    #[must_use]
    pub fn builder() -> SearcherConfigBuilder {
        SearcherConfigBuilder::default()
    }
}

/// Builder for [`SearcherConfig`].
///
/// All options have sensible defaults:
/// - `seed`: random
/// - `direction`: maximize
/// - `random_attempts`: 1000
/// - `enumeration_limit`: 10 000
#[derive(Clone, Debug, Default)]
pub struct SearcherConfigBuilder {
    config: SearcherConfig,
}

impl SearcherConfigBuilder {
    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Sets the optimization direction.
    ///
    /// Default: [`Direction::Maximize`].
    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.config.direction = direction;
        self
    }

    /// Shorthand for `direction(Direction::Maximize)`.
    #[must_use]
    pub fn maximize(self) -> Self {
        self.direction(Direction::Maximize)
    }

    /// Shorthand for `direction(Direction::Minimize)`.
    #[must_use]
    pub fn minimize(self) -> Self {
        self.direction(Direction::Minimize)
    }

    /// Sets the number of random draws per `random_config` call. Zero
    /// makes every `random_config` call fail.
    ///
    /// Default: 1000.
    #[must_use]
    pub fn random_attempts(mut self, n: usize) -> Self {
        self.config.random_attempts = n;
        self
    }

    /// Sets the largest finite space that is enumerated once random draws
    /// stall. Zero disables enumeration.
    ///
    /// Default: 10 000.
    #[must_use]
    pub fn enumeration_limit(mut self, n: usize) -> Self {
        self.config.enumeration_limit = n;
        self
    }

    /// Builds the configured [`SearcherConfig`].
    #[must_use]
    pub fn build(self) -> SearcherConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = SearcherConfig::builder()
            .seed(11)
            .minimize()
            .random_attempts(5)
            .enumeration_limit(0)
            .build();
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.direction, Direction::Minimize);
        assert_eq!(config.random_attempts, 5);
        assert_eq!(config.enumeration_limit, 0);
    }

    #[test]
    fn test_default_maximizes() {
        let config = SearcherConfig::default();
        assert_eq!(config.direction, Direction::Maximize);
        assert_eq!(config.enumeration_limit, 10_000);
        assert_eq!(config, SearcherConfig::builder().build());
    }
}
