use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, FlockError>;

/// Errors raised by the flocking core.
///
/// Configuration problems are the only failures the kernel itself produces;
/// they are reported when an agent, cohort or engine is built (or when a live
/// setter is queued), never in the middle of a tick.
#[derive(Debug, Error)]
pub enum FlockError {
    /// A numeric parameter is out of its admissible range or not finite.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Perceptron slice count and weight vector length disagree.
    #[error("perceptron has {slices} slices but {weights} weights")]
    SliceMismatch { slices: usize, weights: usize },

    /// Behavior name outside the closed set of known behaviors.
    #[error("unknown behavior kind: {0}")]
    UnknownBehavior(String),

    /// Control change addressed to a cohort that was never created.
    #[error("unknown cohort: {0}")]
    UnknownCohort(String),

    /// I/O failure in a data sink.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization failure in a data sink or a scenario file.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FlockError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FlockError::InvalidParam(msg.into())
    }
}
