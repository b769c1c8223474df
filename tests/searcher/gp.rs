use hpsearch::optimizer::gp::{Acquisition, GpOptimizer};
use hpsearch::optimizer::Dimension;
use hpsearch::prelude::*;

use crate::{conditional_space, lr_batch_space};

#[test]
fn test_gp_searcher_issues_unique_valid_configs() {
    let mut searcher = GpSearcher::with_gp(
        conditional_space(),
        SearcherConfig::builder().seed(42).build(),
    );
    let mut issued = Vec::new();
    for _ in 0..25 {
        let config = searcher.get_config(10).unwrap();
        assert!(searcher.space().validate(&config), "{config}");
        assert!(!issued.contains(&config));
        let layers = config.get("layers").and_then(Value::as_i64).unwrap();
        searcher.update(&config, -((layers - 5) as f64).powi(2), None).unwrap();
        issued.push(config);
    }
    assert_eq!(searcher.results().n_complete(), 25);
    assert_eq!(searcher.optimizer().n_observations(), 25);
}

#[test]
fn test_gp_searcher_minimizes_log_scale_objective() {
    let mut searcher = GpSearcher::new(
        lr_batch_space(),
        GpOptimizer::builder()
            .n_initial_points(5)
            .n_candidates(300)
            .seed(7)
            .build(SpaceAdapter::new(lr_batch_space()).dimensions()),
        SearcherConfig::builder().seed(7).minimize().build(),
    );
    for _ in 0..20 {
        let config = searcher.get_config(5).unwrap();
        let lr = config.get("lr").and_then(Value::as_f64).unwrap();
        searcher.update(&config, (lr.log10() + 2.0).powi(2), None).unwrap();
    }
    let best = searcher.best_reward().unwrap();
    let first = searcher.results().iter().next().unwrap().reward.unwrap();
    assert!(best <= first);
}

#[test]
fn test_gp_searcher_with_lower_confidence_bound() {
    let space = lr_batch_space();
    let optimizer = GpOptimizer::builder()
        .n_initial_points(4)
        .n_candidates(200)
        .acquisition(Acquisition::LowerConfidenceBound { kappa: 1.96 })
        .seed(3)
        .build(SpaceAdapter::new(space.clone()).dimensions());
    let mut searcher =
        GpSearcher::new(space, optimizer, SearcherConfig::builder().seed(3).build());
    for _ in 0..12 {
        let config = searcher.get_config(5).unwrap();
        let lr = config.get("lr").and_then(Value::as_f64).unwrap();
        searcher.update(&config, -(lr.log10() + 2.0).abs(), None).unwrap();
    }
    assert_eq!(searcher.results().n_complete(), 12);
    assert_eq!(searcher.optimizer().n_observations(), 12);
}

#[test]
fn test_gp_with_malformed_dimensions_still_serves_configs() {
    let optimizer = GpOptimizer::builder()
        .seed(1)
        .build(vec![Dimension::Categorical { n_choices: 0 }]);
    let mut searcher = GpSearcher::new(
        lr_batch_space(),
        optimizer,
        SearcherConfig::builder().seed(1).build(),
    );
    searcher.get_config(3).unwrap();
    let config = searcher.get_config(3).unwrap();
    assert!(searcher.space().validate(&config));
    assert_eq!(searcher.fallback_count(), 1);
    assert!(matches!(
        searcher.last_fallback(),
        Some(hpsearch::FallbackReason::OptimizerFailure(_))
    ));
}

#[test]
fn test_gp_searcher_restore_rebuilds_observations() {
    let config = SearcherConfig::builder().seed(11).build();
    let mut original = GpSearcher::with_gp(lr_batch_space(), config.clone());
    for i in 0..6_u32 {
        let c = original.get_config(5).unwrap();
        original.update(&c, f64::from(i) * 0.1, None).unwrap();
    }
    let checkpoint = original.checkpoint();

    let mut resumed = GpSearcher::with_gp(lr_batch_space(), config);
    resumed.restore(&checkpoint).unwrap();
    assert_eq!(resumed.optimizer().n_observations(), 6);
    assert_eq!(resumed.best_config(), original.best_config());
}
