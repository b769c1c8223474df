use hpsearch::prelude::*;

use crate::{conditional_space, lr_batch_space};

#[test]
fn test_random_searcher_starts_with_default() {
    let space = lr_batch_space();
    let default = space.default();
    let mut searcher = RandomSearcher::new(space, SearcherConfig::builder().seed(1).build());

    let first = searcher.get_config(10).unwrap();
    assert_eq!(first, default);
    assert_eq!(
        searcher.results().get(&first).unwrap().status,
        RecordStatus::Pending
    );
}

#[test]
fn test_random_searcher_issues_novel_valid_configs() {
    let mut searcher = RandomSearcher::new(
        conditional_space(),
        SearcherConfig::builder().seed(2).build(),
    );
    for i in 0..50 {
        let config = searcher.get_config(10).unwrap();
        assert!(searcher.space().validate(&config), "{config}");
        assert_eq!(searcher.results().len(), i + 1);
        searcher.update(&config, i as f64, None).unwrap();
    }
    assert_eq!(searcher.results().n_complete(), 50);
    assert_eq!(searcher.results().n_pending(), 0);
}

#[test]
fn test_random_searcher_same_seed_same_sequence() {
    let run = || {
        let mut searcher = RandomSearcher::new(
            lr_batch_space(),
            SearcherConfig::builder().seed(77).build(),
        );
        (0..10)
            .map(|_| searcher.get_config(0).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_random_searcher_exhausts_finite_space() {
    let space = ConfigurationSpace::builder()
        .categorical("a", [1, 2, 3], 1)
        .ordinal("b", ["low", "high"], "low")
        .build()
        .unwrap();
    let mut searcher = RandomSearcher::new(space, SearcherConfig::builder().seed(9).build());

    for _ in 0..6 {
        searcher.get_config(0).unwrap();
    }
    assert_eq!(searcher.results().len(), 6);
    assert!(matches!(
        searcher.get_config(0),
        Err(Error::ExhaustedBudget { attempts: 1000 })
    ));
    assert_eq!(searcher.results().len(), 6);
}

#[test]
fn test_random_searcher_without_enumeration_may_exhaust_early() {
    let space = ConfigurationSpace::builder()
        .integer("n", 0, 1000, 0)
        .build()
        .unwrap();
    let mut searcher = RandomSearcher::new(
        space,
        SearcherConfig::builder()
            .seed(3)
            .random_attempts(1)
            .enumeration_limit(0)
            .build(),
    );
    searcher.default_config();
    // A single draw over 1001 values is novel unless it hits the default.
    let mut ok = 0;
    for _ in 0..20 {
        if searcher.random_config().is_ok() {
            ok += 1;
        }
    }
    assert!(ok > 0);
    assert_eq!(searcher.results().len(), ok + 1);
}

#[test]
fn test_best_config_follows_direction() {
    let mut searcher = RandomSearcher::new(
        lr_batch_space(),
        SearcherConfig::builder().seed(5).minimize().build(),
    );
    let mut rewards = Vec::new();
    for r in [0.3, 0.1, 0.7] {
        let config = searcher.get_config(0).unwrap();
        searcher.update(&config, r, None).unwrap();
        rewards.push((config, r));
    }
    assert_eq!(searcher.best_reward(), Some(0.1));
    assert_eq!(searcher.best_config(), Some(rewards[1].0.clone()));
    assert_eq!(searcher.reward(&rewards[2].0), Some(0.7));
}

#[test]
fn test_update_stores_model_params() {
    let mut searcher = RandomSearcher::new(lr_batch_space(), SearcherConfig::default());
    let config = searcher.default_config();
    searcher
        .update(&config, 0.9, Some(serde_json::json!({"epochs": 12})))
        .unwrap();
    let record = searcher.results().get(&config).unwrap();
    assert_eq!(record.model_params, Some(serde_json::json!({"epochs": 12})));
    assert_eq!(record.reward, Some(0.9));
}
