//! Serializable snapshot of a searcher's completed evaluations.

use serde::{Deserialize, Serialize};

use crate::configuration::{CanonicalKey, Configuration};
use crate::store::ResultStore;

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Complete records of a searcher in the order their rewards were reported.
///
/// A checkpoint is restored with [`Searcher::restore`](crate::Searcher::restore),
/// which replays every entry through `update`, so a guiding optimizer is
/// rebuilt from the same sequence of observations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Format version, [`CHECKPOINT_VERSION`] when written by this crate.
    pub version: u32,
    /// Completed evaluations, oldest report first.
    pub entries: Vec<CheckpointEntry>,
}

/// One completed evaluation in a [`Checkpoint`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointEntry {
    /// Canonical key of `config`. Checked on restore.
    pub key: CanonicalKey,
    /// The evaluated configuration.
    pub config: Configuration,
    /// The reported reward.
    pub reward: f64,
    /// Model parameters attached when the reward was reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_params: Option<serde_json::Value>,
}

impl Checkpoint {
    /// Snapshots the complete records of `store`. Pending records are left out.
    #[must_use]
    pub fn from_store(store: &ResultStore) -> Self {
        let entries = store
            .in_completion_order()
            .filter_map(|record| {
                Some(CheckpointEntry {
                    key: record.key.clone(),
                    config: record.config.clone(),
                    reward: record.reward?,
                    model_params: record.model_params.clone(),
                })
            })
            .collect();
        Self {
            version: CHECKPOINT_VERSION,
            entries,
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
