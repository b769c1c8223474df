//! End-to-end scheduler scenarios against both searchers.

use hpsearch::prelude::*;

fn lr_batch_space() -> ConfigurationSpace {
    ConfigurationSpace::builder()
        .continuous("lr", 1e-4, 1e-1, 1e-3)
        .log_scale()
        .categorical("batch_size", [32, 64, 128], 64)
        .build()
        .unwrap()
}

fn searchers() -> Vec<Box<dyn Searcher>> {
    let config = SearcherConfig::builder().seed(31).build();
    let mut out: Vec<Box<dyn Searcher>> = vec![Box::new(RandomSearcher::new(
        lr_batch_space(),
        config.clone(),
    ))];
    #[cfg(feature = "gp")]
    out.push(Box::new(GpSearcher::with_gp(lr_batch_space(), config)));
    out
}

#[test]
fn test_default_config_recorded_then_completed() {
    for mut searcher in searchers() {
        let default = searcher.default_config();
        assert_eq!(
            default,
            Configuration::new().with("lr", 1e-3).with("batch_size", 64)
        );
        let record = searcher.results().get(&default).unwrap();
        assert_eq!(record.status, RecordStatus::Pending);
        assert_eq!(record.reward, None);

        searcher.update(&default, 0.5, None).unwrap();
        let record = searcher.results().get(&default).unwrap();
        assert_eq!(record.status, RecordStatus::Complete);
        assert_eq!(record.reward, Some(0.5));
    }
}

#[test]
fn test_two_more_configs_are_distinct() {
    for mut searcher in searchers() {
        let default = searcher.default_config();
        searcher.update(&default, 0.5, None).unwrap();

        let a = searcher.get_config(10).unwrap();
        searcher.update(&a, 0.6, None).unwrap();
        let b = searcher.get_config(10).unwrap();
        searcher.update(&b, 0.7, None).unwrap();

        let keys = [
            searcher.space().canonical_key(&default),
            searcher.space().canonical_key(&a),
            searcher.space().canonical_key(&b),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_ne!(keys[1], keys[2]);
        assert_eq!(searcher.results().n_complete(), 3);
        assert_eq!(searcher.results().len(), 3);
    }
}

#[test]
fn test_last_two_combinations_always_found() {
    let space = ConfigurationSpace::builder()
        .categorical("opt", ["sgd", "adam"], "sgd")
        .categorical("act", ["relu", "tanh"], "relu")
        .build()
        .unwrap();
    for seed in 0..20 {
        let mut searcher = RandomSearcher::new(
            space.clone(),
            SearcherConfig::builder().seed(seed).random_attempts(2).build(),
        );
        searcher.default_config();
        searcher.random_config().unwrap();
        // two combinations remain
        let c = searcher.random_config().unwrap();
        let d = searcher.random_config().unwrap();
        assert_ne!(c, d);
        assert!(space.validate(&c) && space.validate(&d));
        assert!(matches!(
            searcher.random_config(),
            Err(Error::ExhaustedBudget { attempts: 2 })
        ));
    }
}

#[test]
fn test_zero_budget_fails_without_recording() {
    let space = ConfigurationSpace::builder()
        .categorical("opt", ["sgd", "adam"], "sgd")
        .build()
        .unwrap();
    let mut searcher = RandomSearcher::new(
        space,
        SearcherConfig::builder().random_attempts(0).build(),
    );
    searcher.default_config();
    assert!(matches!(
        searcher.random_config(),
        Err(Error::ExhaustedBudget { attempts: 0 })
    ));
    assert_eq!(searcher.results().len(), 1);
}

#[test]
fn test_issued_configs_are_valid_novel_and_round_trip() {
    for mut searcher in searchers() {
        let adapter = SpaceAdapter::new(searcher.space().clone());
        for i in 0..30_u32 {
            let before = searcher.results().len();
            let config = searcher.get_config(8).unwrap();
            assert_eq!(searcher.results().len(), before + 1);
            assert!(searcher.space().validate(&config));
            let x = adapter.encode(&config).unwrap();
            assert_eq!(adapter.decode(&x).unwrap(), config);

            let reward = f64::from(i) / 30.0;
            searcher.update(&config, reward, None).unwrap();
            assert_eq!(searcher.reward(&config), Some(reward));
        }
    }
}

#[test]
fn test_default_config_idempotent_after_search() {
    for mut searcher in searchers() {
        let default = searcher.default_config();
        searcher.get_config(4).unwrap();
        let len = searcher.results().len();
        assert_eq!(searcher.default_config(), default);
        assert_eq!(searcher.results().len(), len);
    }
}
