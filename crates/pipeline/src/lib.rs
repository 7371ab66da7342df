//! # Pipeline Crate
//!
//! Orchestrates the recommender evaluation as an explicit, typed pipeline:
//!
//! 1. **Data preparation** — join ratings with movie metadata, explode
//!    genres, derive user×genre interaction columns
//! 2. **Split** — seeded 75/25 train/evaluation partition
//! 3. **Content-based model** — ridge regression, MAE on the held-out rows
//! 4. **Collaborative filtering** — (rank, gamma) factorization sweep,
//!    RMSE per configuration, global-minimum selection
//!
//! Stages pass immutable tables forward; there is no hidden session state.
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{PipelineConfig, run};
//!
//! let report = run(&ratings, &movies, &PipelineConfig::default())?;
//! println!("content MAE {:.4}", report.content_mae);
//! println!(
//!     "best factorization: rank {} gamma {} (RMSE {:.4})",
//!     report.best_rank, report.best_gamma, report.best_rmse
//! );
//! ```

pub mod config;
pub mod report;
pub mod split;
pub mod stages;

// Re-export main types
pub use config::PipelineConfig;
pub use report::{PipelineReport, ProjectionPoint, SweepRow};
pub use split::{Split, split_rows};
pub use stages::run;
