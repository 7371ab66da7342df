//! The pipeline's output artifact.

use data_prep::MovieId;
use serde::Serialize;

/// One row of the hyperparameter sweep table.
#[derive(Debug, Clone, Serialize)]
pub struct SweepRow {
    pub rank: usize,
    pub gamma: f64,
    pub rmse: f64,
    /// Held-out entries that entered the RMSE denominator
    pub scored: usize,
    /// Held-out entries excluded because their user or movie was absent
    /// from the training matrix
    pub skipped: usize,
    pub selected: bool,
}

/// A movie's coordinates in the first two latent dimensions of the selected
/// factorization, for similarity inspection.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionPoint {
    pub movie_id: MovieId,
    pub x: f64,
    pub y: f64,
}

/// Everything a single pipeline run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    // Data preparation
    pub total_rows: usize,
    pub genre_count: usize,
    pub interaction_count: usize,
    pub distinct_users: usize,

    // Split
    pub train_rows: usize,
    pub eval_rows: usize,

    // Content-based model
    pub content_mae: f64,

    // Collaborative-filtering sweep
    pub sweep: Vec<SweepRow>,
    pub best_rank: usize,
    pub best_gamma: f64,
    pub best_rmse: f64,
    /// (user_count, rank) and (movie_count, rank) of the selected factors
    pub user_factor_shape: (usize, usize),
    pub movie_factor_shape: (usize, usize),

    /// Sample of training movies projected to 2D, most-rated first
    pub projection: Vec<ProjectionPoint>,
}
