//! # Models Crate
//!
//! The two recommender models the evaluation pipeline compares, plus the
//! shared numeric plumbing:
//!
//! - **glm**: content-based ridge regression over one-hot user, movie, and
//!   user×genre interaction columns
//! - **matrix** / **factorization**: sparse rating matrix and its low-rank
//!   factorization (alternating least squares with column de-meaning)
//! - **sweep**: parallel (rank, gamma) grid search with deterministic
//!   selection
//! - **metrics**: MAE / RMSE
//!
//! ## Example Usage
//!
//! ```ignore
//! use models::{FactorConfig, FactorModel, RatingMatrix};
//!
//! let train = RatingMatrix::from_ratings(&train_ratings);
//! let model = FactorModel::fit(&train, FactorConfig::default())?;
//! let summary = model.evaluate(&RatingMatrix::from_ratings(&eval_ratings));
//! println!("RMSE {:.4} over {} entries", summary.rmse, summary.scored);
//! ```

pub mod error;
pub mod factorization;
pub mod glm;
mod linalg;
pub mod matrix;
pub mod metrics;
pub mod sweep;

// Re-export commonly used types for convenience
pub use error::{ModelError, Result};
pub use factorization::{EvalSummary, FactorConfig, FactorModel};
pub use glm::{ContentModel, RidgeConfig};
pub use matrix::RatingMatrix;
pub use sweep::{SweepGrid, SweepOutcome, SweepResult, run_sweep};
