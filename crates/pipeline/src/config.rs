//! Pipeline configuration.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// All knobs for one pipeline run.
///
/// Defaults match the canonical evaluation: a 75/25 split, interaction
/// columns with minimum support 3 capped at 2 per distinct user, and a
/// rank {5, 10, 15} × gamma {0, 5, 10} factorization sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Fraction of rows assigned to training
    pub train_fraction: f64,
    /// Seed for the split and for factor initialization
    pub seed: u64,
    /// Minimum occurrence count for an interaction column to survive
    pub min_support: usize,
    /// Interaction column cap, as a multiple of the distinct user count
    pub max_interactions_per_user: usize,
    /// Ridge penalty for the content-based model
    pub glm_lambda: f64,
    /// Factorization ranks to sweep
    pub ranks: Vec<usize>,
    /// Regularization strengths to sweep
    pub gammas: Vec<f64>,
    /// ALS rounds per factorization fit
    pub als_iterations: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.75,
            seed: 42,
            min_support: 3,
            max_interactions_per_user: 2,
            glm_lambda: 1e-5,
            ranks: vec![5, 10, 15],
            gammas: vec![0.0, 5.0, 10.0],
            als_iterations: 10,
        }
    }
}

impl PipelineConfig {
    /// Reject invalid configuration before any data work begins.
    pub fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            bail!(
                "train_fraction must be in (0, 1), got {}",
                self.train_fraction
            );
        }
        if self.min_support == 0 {
            bail!("min_support must be at least 1");
        }
        if !(self.glm_lambda.is_finite() && self.glm_lambda > 0.0) {
            bail!("glm_lambda must be strictly positive, got {}", self.glm_lambda);
        }
        if self.ranks.is_empty() || self.ranks.contains(&0) {
            bail!("ranks must be non-empty and positive");
        }
        if self.gammas.is_empty() || self.gammas.iter().any(|g| !g.is_finite() || *g < 0.0) {
            bail!("gammas must be non-empty, finite, and non-negative");
        }
        if self.als_iterations == 0 {
            bail!("als_iterations must be at least 1");
        }
        Ok(())
    }
}
