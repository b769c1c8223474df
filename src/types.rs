//! Core types shared across the engine.

use serde::{Deserialize, Serialize};

/// Whether rewards should be maximized or minimized.
///
/// Guiding optimizers always minimize, so rewards cross that boundary
/// through [`Direction::to_minimization`]. Stored records keep the raw reward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Minimize the reward.
    Minimize,
    /// Maximize the reward (accuracy-style objectives).
    #[default]
    Maximize,
}

impl Direction {
    /// Converts a raw reward into the value a minimizing optimizer should see.
    ///
    /// ```
    /// use hpsearch::Direction;
    ///
    /// assert_eq!(Direction::Maximize.to_minimization(0.9), -0.9);
    /// assert_eq!(Direction::Minimize.to_minimization(0.9), 0.9);
    /// ```
    #[must_use]
    pub fn to_minimization(self, reward: f64) -> f64 {
        match self {
            Direction::Minimize => reward,
            Direction::Maximize => -reward,
        }
    }

    /// Returns `true` if `candidate` is strictly better than `incumbent`.
    #[must_use]
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Minimize => candidate < incumbent,
            Direction::Maximize => candidate > incumbent,
        }
    }
}
