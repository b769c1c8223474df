//! Insertion-ordered record of every configuration a searcher has issued.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapter::SpaceAdapter;
use crate::configuration::{CanonicalKey, Configuration};
use crate::space::ConfigurationSpace;
use crate::types::Direction;

/// Whether a record's evaluation has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Issued to the scheduler, no reward yet.
    Pending,
    /// Reward reported.
    Complete,
}

/// One issued configuration and, once reported, its reward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Canonical key of `config`.
    pub key: CanonicalKey,
    /// The configuration as issued.
    pub config: Configuration,
    /// Reported reward, `None` while pending.
    pub reward: Option<f64>,
    /// Evaluation status.
    pub status: RecordStatus,
    /// Opaque model parameters the caller attached when reporting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_params: Option<serde_json::Value>,
}

impl ResultRecord {
    /// Returns `true` once a reward has been reported.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == RecordStatus::Complete
    }
}

/// Every configuration issued so far, keyed by canonical key.
///
/// Records are never dropped. Recording a configuration that is already
/// present updates it in place, so iteration order is the order in which
/// configurations were first issued. The order in which rewards arrived is
/// kept separately, see [`ResultStore::in_completion_order`].
#[derive(Clone, Debug)]
pub struct ResultStore {
    space: Arc<ConfigurationSpace>,
    records: Vec<ResultRecord>,
    index: HashMap<CanonicalKey, usize>,
    /// Record indices of complete records, oldest reward first.
    completions: Vec<usize>,
}

impl ResultStore {
    /// Creates an empty store for configurations of `space`.
    #[must_use]
    pub fn new(space: impl Into<Arc<ConfigurationSpace>>) -> Self {
        Self {
            space: space.into(),
            records: Vec::new(),
            index: HashMap::new(),
            completions: Vec::new(),
        }
    }

    /// Canonical key of `config` in this store's space.
    #[must_use]
    pub fn key_of(&self, config: &Configuration) -> CanonicalKey {
        self.space.canonical_key(config)
    }

    /// Returns `true` if `config` was ever recorded.
    #[must_use]
    pub fn contains(&self, config: &Configuration) -> bool {
        self.index.contains_key(&self.key_of(config))
    }

    /// Inserts `config` as pending (`reward == None`) or complete, or
    /// updates the existing record in place. Attached model parameters
    /// survive the update.
    ///
    /// A reward moves the record to the end of the completion order, so a
    /// re-reported configuration counts as its latest report.
    pub fn record(&mut self, config: &Configuration, reward: Option<f64>) -> &ResultRecord {
        let key = self.key_of(config);
        let status = if reward.is_some() {
            RecordStatus::Complete
        } else {
            RecordStatus::Pending
        };
        let idx = if let Some(&idx) = self.index.get(&key) {
            let record = &mut self.records[idx];
            record.config = config.clone();
            record.reward = reward;
            record.status = status;
            idx
        } else {
            let idx = self.records.len();
            self.index.insert(key.clone(), idx);
            self.records.push(ResultRecord {
                key,
                config: config.clone(),
                reward,
                status,
                model_params: None,
            });
            idx
        };
        self.completions.retain(|&i| i != idx);
        if reward.is_some() {
            self.completions.push(idx);
        }
        &self.records[idx]
    }

    /// Attaches model parameters to a recorded configuration.
    ///
    /// Returns `false` if `config` was never recorded.
    pub fn set_model_params(&mut self, config: &Configuration, params: serde_json::Value) -> bool {
        let Some(&idx) = self.index.get(&self.key_of(config)) else {
            return false;
        };
        self.records[idx].model_params = Some(params);
        true
    }

    /// The record for `config`, if any.
    #[must_use]
    pub fn get(&self, config: &Configuration) -> Option<&ResultRecord> {
        self.get_by_key(&self.key_of(config))
    }

    /// The record with canonical key `key`, if any.
    #[must_use]
    pub fn get_by_key(&self, key: &CanonicalKey) -> Option<&ResultRecord> {
        self.index.get(key).map(|&idx| &self.records[idx])
    }

    /// Records in first-issued order.
    pub fn iter(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter()
    }

    /// Complete records in first-issued order.
    pub fn completed(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter().filter(|r| r.is_complete())
    }

    /// Complete records in the order their rewards were reported.
    pub fn in_completion_order(&self) -> impl Iterator<Item = &ResultRecord> {
        self.completions.iter().map(|&idx| &self.records[idx])
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing was ever recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of complete records.
    #[must_use]
    pub fn n_complete(&self) -> usize {
        self.completed().count()
    }

    /// Number of pending records.
    #[must_use]
    pub fn n_pending(&self) -> usize {
        self.len() - self.n_complete()
    }

    /// The complete record with the best reward. Ties go to the earliest.
    #[must_use]
    pub fn best(&self, direction: Direction) -> Option<&ResultRecord> {
        self.completed().fold(None, |best, record| match (best, record.reward) {
            (Some(b), Some(r)) if b.reward.is_some_and(|br| !direction.is_better(r, br)) => Some(b),
            _ => Some(record),
        })
    }

    /// Complete records as `(vector, value)` pairs for a minimizing
    /// optimizer, in first-issued order. Rewards are flipped for
    /// [`Direction::Maximize`]; stored rewards are left untouched.
    ///
    /// Records that no longer encode in `adapter`'s space are skipped.
    #[must_use]
    pub fn as_training_set(
        &self,
        adapter: &SpaceAdapter,
        direction: Direction,
    ) -> Vec<(Vec<f64>, f64)> {
        self.completed()
            .filter_map(|record| {
                let reward = record.reward?;
                let x = adapter.encode(&record.config).ok()?;
                Some((x, direction.to_minimization(reward)))
            })
            .collect()
    }
}
