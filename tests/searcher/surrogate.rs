use std::collections::VecDeque;

use hpsearch::prelude::*;
use hpsearch::FallbackReason;

use crate::{conditional_space, lr_batch_space};

/// Optimizer that answers `ask` from a queue and records every `tell`.
#[derive(Debug, Default)]
struct MockOptimizer {
    answers: VecDeque<Vec<Vec<f64>>>,
    asked: Vec<usize>,
    told: Vec<(Vec<f64>, f64)>,
    reject_tells: bool,
}

impl MockOptimizer {
    fn answering(answers: impl IntoIterator<Item = Vec<Vec<f64>>>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl SurrogateOptimizer for MockOptimizer {
    fn ask(&mut self, n: usize) -> Result<Vec<Vec<f64>>> {
        self.asked.push(n);
        self.answers
            .pop_front()
            .ok_or_else(|| Error::OptimizerFailure("no scripted answer".into()))
    }

    fn tell(&mut self, x: &[f64], y: f64) -> Result<()> {
        if self.reject_tells {
            return Err(Error::OptimizerFailure("tell rejected".into()));
        }
        self.told.push((x.to_vec(), y));
        Ok(())
    }

    fn n_observations(&self) -> usize {
        self.told.len()
    }
}

#[test]
fn test_invalid_then_duplicate_batch_falls_back_to_novel_random() {
    let space = lr_batch_space();
    let adapter = SpaceAdapter::new(space.clone());
    let default = space.default();
    let default_x = adapter.encode(&default).unwrap();

    // ask(1): choice index out of range; ask(3): all decode to the default
    let optimizer = MockOptimizer::answering([
        vec![vec![1e-3_f64.ln(), 7.0]],
        vec![default_x.clone(), default_x.clone(), default_x],
    ]);
    let mut searcher =
        SurrogateSearcher::new(space, optimizer, SearcherConfig::builder().seed(4).build());

    let first = searcher.get_config(3).unwrap();
    assert_eq!(first, default);
    searcher.update(&first, 0.5, None).unwrap();

    let before = searcher.results().len();
    let second = searcher.get_config(3).unwrap();
    assert!(searcher.space().validate(&second));
    assert_ne!(second, default);
    assert_eq!(searcher.results().len(), before + 1);
    assert_eq!(searcher.fallback_count(), 1);
    assert_eq!(
        searcher.last_fallback(),
        Some(&FallbackReason::NoNovelCandidate {
            invalid: 1,
            duplicates: 3
        })
    );
    assert_eq!(searcher.optimizer().asked, vec![1, 3]);
}

#[test]
fn test_oversized_batch_screened_up_to_max_tries() {
    let space = lr_batch_space();
    let adapter = SpaceAdapter::new(space.clone());
    let default_x = adapter.encode(&space.default()).unwrap();
    let novel = Configuration::new().with("lr", 0.02).with("batch_size", 128);
    let novel_x = adapter.encode(&novel).unwrap();

    // ask(2) answers with three vectors; the novel one is past the limit
    let optimizer = MockOptimizer::answering([
        vec![default_x.clone()],
        vec![default_x.clone(), default_x, novel_x],
    ]);
    let mut searcher =
        SurrogateSearcher::new(space, optimizer, SearcherConfig::builder().seed(9).build());
    searcher.get_config(2).unwrap();

    let config = searcher.get_config(2).unwrap();
    assert_ne!(config, novel);
    assert_eq!(
        searcher.last_fallback(),
        Some(&FallbackReason::NoNovelCandidate {
            invalid: 0,
            duplicates: 3
        })
    );
    assert_eq!(searcher.optimizer().asked, vec![1, 2]);
}

#[test]
fn test_default_config_does_not_consult_optimizer() {
    let mut searcher = SurrogateSearcher::new(
        lr_batch_space(),
        MockOptimizer::default(),
        SearcherConfig::default(),
    );
    searcher.get_config(5).unwrap();
    assert!(searcher.optimizer().asked.is_empty());
}

#[test]
fn test_proposal_decoded_with_conditions() {
    let space = conditional_space();
    // optimizer=sgd (index 0), momentum 0.5, layers 3.4 -> 3
    let optimizer = MockOptimizer::answering([vec![vec![0.0, 0.5, 3.4]]]);
    let mut searcher = SurrogateSearcher::new(space, optimizer, SearcherConfig::default());
    searcher.default_config();

    let config = searcher.get_config(2).unwrap();
    assert_eq!(config.get("optimizer"), Some(&Value::from("sgd")));
    assert_eq!(config.get("momentum"), Some(&Value::Float(0.5)));
    assert_eq!(config.get("layers"), Some(&Value::Int(3)));
    assert_eq!(searcher.fallback_count(), 0);
}

#[test]
fn test_inactive_slots_ignored_in_proposals() {
    let space = conditional_space();
    // optimizer=adam, so the NaN momentum slot never matters
    let optimizer = MockOptimizer::answering([vec![vec![1.0, f64::NAN, 5.0]]]);
    let mut searcher = SurrogateSearcher::new(space, optimizer, SearcherConfig::default());
    searcher.default_config();

    let config = searcher.get_config(0).unwrap();
    assert!(!config.contains("momentum"));
    assert_eq!(config.get("layers"), Some(&Value::Int(5)));
}

#[test]
fn test_update_feeds_negated_reward_when_maximizing() {
    let space = lr_batch_space();
    let mut searcher = SurrogateSearcher::new(
        space.clone(),
        MockOptimizer::default(),
        SearcherConfig::builder().maximize().build(),
    );
    let config = searcher.default_config();
    searcher.update(&config, 0.8, None).unwrap();

    let expected_x = SpaceAdapter::new(space).encode(&config).unwrap();
    assert_eq!(searcher.optimizer().told, vec![(expected_x, -0.8)]);
    assert_eq!(searcher.reward(&config), Some(0.8));
}

#[test]
fn test_update_feeds_raw_reward_when_minimizing() {
    let mut searcher = SurrogateSearcher::new(
        lr_batch_space(),
        MockOptimizer::default(),
        SearcherConfig::builder().minimize().build(),
    );
    let config = searcher.default_config();
    searcher.update(&config, 0.8, None).unwrap();
    assert_eq!(searcher.optimizer().told[0].1, 0.8);
}

#[test]
fn test_rejected_tell_does_not_fail_update() {
    let optimizer = MockOptimizer {
        reject_tells: true,
        ..MockOptimizer::default()
    };
    let mut searcher = SurrogateSearcher::new(lr_batch_space(), optimizer, SearcherConfig::default());
    let config = searcher.default_config();
    searcher.update(&config, 1.0, None).unwrap();
    assert_eq!(
        searcher.results().get(&config).unwrap().status,
        RecordStatus::Complete
    );
}

#[test]
fn test_update_rejects_invalid_configuration() {
    let mut searcher = SurrogateSearcher::new(
        conditional_space(),
        MockOptimizer::default(),
        SearcherConfig::default(),
    );
    let config = Configuration::new()
        .with("optimizer", "adam")
        .with("momentum", 0.5)
        .with("layers", 2);
    assert!(matches!(
        searcher.update(&config, 1.0, None),
        Err(Error::InvalidConfiguration { .. })
    ));
    assert!(searcher.optimizer().told.is_empty());
}

#[test]
fn test_restore_replays_observations_in_report_order() {
    let space = lr_batch_space();
    let adapter = SpaceAdapter::new(space.clone());
    let proposals = [1e-2, 5e-2].map(|lr| {
        let config = Configuration::new().with("lr", lr).with("batch_size", 32);
        vec![adapter.encode(&config).unwrap()]
    });
    let config = SearcherConfig::builder().minimize().build();
    let mut live = SurrogateSearcher::new(
        space.clone(),
        MockOptimizer::answering(proposals),
        config.clone(),
    );
    let a = live.get_config(1).unwrap();
    let b = live.get_config(1).unwrap();
    let c = live.get_config(1).unwrap();
    assert_eq!(live.fallback_count(), 0);

    // rewards arrive out of issue order
    live.update(&c, 3.0, None).unwrap();
    live.update(&a, 1.0, None).unwrap();
    live.update(&b, 2.0, None).unwrap();

    let mut resumed = SurrogateSearcher::new(space, MockOptimizer::default(), config);
    resumed.restore(&live.checkpoint()).unwrap();

    let live_told: Vec<f64> = live.optimizer().told.iter().map(|(_, y)| *y).collect();
    assert_eq!(live_told, vec![3.0, 1.0, 2.0]);
    assert_eq!(resumed.optimizer().told, live.optimizer().told);
}

#[test]
fn test_boxed_optimizer() {
    let optimizer: Box<dyn SurrogateOptimizer> = Box::new(MockOptimizer::default());
    let mut searcher = SurrogateSearcher::new(lr_batch_space(), optimizer, SearcherConfig::default());
    let config = searcher.get_config(1).unwrap();
    searcher.update(&config, 0.2, None).unwrap();
    assert_eq!(searcher.optimizer().n_observations(), 1);
    // the mock has no answers left, so the next call falls back
    searcher.get_config(1).unwrap();
    assert!(matches!(
        searcher.last_fallback(),
        Some(FallbackReason::OptimizerFailure(_))
    ));
}
