#![allow(clippy::cast_precision_loss)]

#[cfg(feature = "gp")]
mod gp;
mod random;
mod surrogate;

use hpsearch::space::Condition;
use hpsearch::ConfigurationSpace;

/// The two-hyperparameter space used throughout the searcher tests.
pub fn lr_batch_space() -> ConfigurationSpace {
    ConfigurationSpace::builder()
        .continuous("lr", 1e-4, 1e-1, 1e-3)
        .log_scale()
        .categorical("batch_size", [32, 64, 128], 64)
        .build()
        .unwrap()
}

/// A space whose `momentum` only exists when `optimizer == "sgd"`.
pub fn conditional_space() -> ConfigurationSpace {
    ConfigurationSpace::builder()
        .categorical("optimizer", ["sgd", "adam"], "adam")
        .continuous("momentum", 0.0, 0.99, 0.9)
        .when(Condition::equals("optimizer", "sgd"))
        .integer("layers", 1, 8, 2)
        .build()
        .unwrap()
}
