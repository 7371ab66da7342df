//! Error types for the models crate.

use thiserror::Error;

/// Errors surfaced by the model-fitting stages.
///
/// Unlike row-level data errors, a modeling failure is fatal for its stage:
/// nothing downstream can proceed without a fitted model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// No observations to fit on
    #[error("Training set is empty")]
    EmptyTrainingSet,

    /// A hyperparameter was outside its valid range
    #[error("Invalid hyperparameter {name}: {value}")]
    InvalidHyperparameter { name: &'static str, value: String },

    /// A least-squares subproblem was singular even after a jittered retry
    #[error("Singular system while solving {context}")]
    SingularSystem { context: String },

    /// The iterative solver did not reach tolerance
    #[error("{context} did not converge within {iterations} iterations")]
    DidNotConverge {
        context: String,
        iterations: usize,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ModelError>;
