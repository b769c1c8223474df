/// Errors produced by the search engine.
///
/// Construction errors (invalid bounds, unknown kinds, cyclic conditions)
/// are fatal and surface when a [`ConfigurationSpace`](crate::ConfigurationSpace)
/// is built. Everything else is recoverable: searchers absorb invalid
/// candidates and optimizer failures with a fallback, and only report
/// [`Error::ExhaustedBudget`] when random sampling itself runs dry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the lower bound is greater than the upper bound.
    #[error("invalid bounds for '{name}': low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The hyperparameter name.
        name: String,
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when log scale is used with non-positive bounds.
    #[error("invalid log bounds for '{0}': low must be positive for log scale")]
    InvalidLogBounds(String),

    /// Returned when log scale is requested for a categorical or ordinal hyperparameter.
    #[error("log scale is only supported for continuous and integer hyperparameters ('{0}')")]
    LogScaleUnsupported(String),

    /// Returned when categorical or ordinal choices are empty.
    #[error("choices for '{0}' cannot be empty")]
    EmptyChoices(String),

    /// Returned when a choice list contains the same value twice.
    #[error("duplicate choice {value} for '{name}'")]
    DuplicateChoice {
        /// The hyperparameter name.
        name: String,
        /// The repeated choice, rendered as text.
        value: String,
    },

    /// Returned when two hyperparameters share a name.
    #[error("duplicate hyperparameter name '{0}'")]
    DuplicateName(String),

    /// Returned when a hyperparameter name is empty.
    #[error("hyperparameter names cannot be empty")]
    EmptyName,

    /// Returned when a declared default lies outside the hyperparameter's domain.
    #[error("invalid default for '{name}': {reason}")]
    InvalidDefault {
        /// The hyperparameter name.
        name: String,
        /// Why the default was rejected.
        reason: String,
    },

    /// Returned when a condition refers to a hyperparameter that does not exist.
    #[error("condition on '{child}' refers to unknown parent '{parent}'")]
    UnknownParent {
        /// The conditioned hyperparameter.
        child: String,
        /// The missing parent name.
        parent: String,
    },

    /// Returned when a condition requires a value its parent can never take.
    #[error("condition on '{child}' requires '{parent}' to take {value}, which is outside its domain")]
    InvalidCondition {
        /// The conditioned hyperparameter.
        child: String,
        /// The parent hyperparameter.
        parent: String,
        /// The unreachable value, rendered as text.
        value: String,
    },

    /// Returned when conditions form a cycle.
    #[error("conditions form a cycle through '{0}'")]
    ConditionCycle(String),

    /// Returned when the external representation names a kind the engine does not know.
    #[error("unknown hyperparameter kind '{kind}' for '{name}'")]
    UnknownKind {
        /// The hyperparameter name.
        name: String,
        /// The unrecognized kind string.
        kind: String,
    },

    /// Returned when a builder modifier such as `log_scale()` has no hyperparameter to apply to.
    #[error("`{0}` must follow a hyperparameter declaration")]
    DanglingModifier(&'static str),

    /// Returned when the external representation omits a field required by the kind.
    #[error("hyperparameter '{name}' is missing required field '{field}'")]
    MissingField {
        /// The hyperparameter name.
        name: String,
        /// The missing field.
        field: &'static str,
    },

    /// Returned when a configuration or decoded vector is structurally invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// The first violation found.
        reason: String,
    },

    /// Returned when the guiding optimizer fails to propose or learn.
    #[error("optimizer failure: {0}")]
    OptimizerFailure(String),

    /// Returned when no novel, valid configuration was found within the attempt budget.
    #[error("no novel configuration found within {attempts} attempts")]
    ExhaustedBudget {
        /// The number of attempts that were allowed.
        attempts: usize,
    },

    /// Returned when a reported reward is NaN or infinite.
    #[error("reward must be finite, got {0}")]
    NonFiniteReward(f64),

    /// Returned when restoring a checkpoint into a searcher that already issued configurations.
    #[error("cannot restore a checkpoint into a searcher with {0} existing records")]
    ResumeConflict(usize),
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors raised while building a configuration space.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidBounds { .. }
                | Error::InvalidLogBounds(_)
                | Error::LogScaleUnsupported(_)
                | Error::EmptyChoices(_)
                | Error::DuplicateChoice { .. }
                | Error::DuplicateName(_)
                | Error::EmptyName
                | Error::InvalidDefault { .. }
                | Error::UnknownParent { .. }
                | Error::InvalidCondition { .. }
                | Error::ConditionCycle(_)
                | Error::UnknownKind { .. }
                | Error::MissingField { .. }
                | Error::DanglingModifier(_)
        )
    }
}

pub type Result<T> = core::result::Result<T, Error>;
