//! Content-based rating model: a ridge-regularized linear model over
//! one-hot user, movie, and user×genre interaction columns.
//!
//! Encoding per-user taste as interaction terms inside one jointly-fitted
//! model avoids training a model per user. The feature space is built from
//! the training rows only, so evaluation rows that reference unseen levels
//! simply get a zero contribution for those levels instead of aborting.

use crate::error::{ModelError, Result};
use crate::metrics;
use data_prep::{FeatureRow, FeatureTable, MovieId, UserId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Hyperparameters for the ridge fit.
#[derive(Debug, Clone, Copy)]
pub struct RidgeConfig {
    /// L2 penalty; must be strictly positive so the normal system is
    /// positive definite even with exactly-collinear columns
    pub lambda: f64,
    /// Conjugate gradient iteration cap
    pub max_iterations: usize,
    /// Relative residual tolerance for conjugate gradient
    pub tolerance: f64,
}

impl Default for RidgeConfig {
    fn default() -> Self {
        Self {
            lambda: 1e-5,
            max_iterations: 1000,
            tolerance: 1e-8,
        }
    }
}

/// A fitted content-based model.
///
/// The intercept is the training-set mean rating; every column weight is a
/// deviation from it. Levels absent from the column maps (unseen in
/// training, or constant there) contribute nothing at prediction time.
#[derive(Debug, Clone)]
pub struct ContentModel {
    intercept: f64,
    weights: Vec<f64>,
    user_cols: HashMap<UserId, usize>,
    movie_cols: HashMap<MovieId, usize>,
    interaction_cols: HashMap<(UserId, usize), usize>,
}

impl ContentModel {
    /// Fit on the rows of `table` selected by `train`.
    pub fn fit(table: &FeatureTable, train: &[usize], config: &RidgeConfig) -> Result<Self> {
        if train.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if !config.lambda.is_finite() || config.lambda <= 0.0 {
            return Err(ModelError::InvalidHyperparameter {
                name: "lambda",
                value: config.lambda.to_string(),
            });
        }

        let n = train.len();

        // Support counts per candidate level, over training rows only.
        let mut user_support: HashMap<UserId, usize> = HashMap::new();
        let mut movie_support: HashMap<MovieId, usize> = HashMap::new();
        let mut interaction_support: HashMap<(UserId, usize), usize> = HashMap::new();
        for &i in train {
            let row = &table.rows[i];
            *user_support.entry(row.user_id).or_insert(0) += 1;
            *movie_support.entry(row.movie_id).or_insert(0) += 1;
            for k in table.row_interactions(row) {
                let key = (table.interactions[k].user_id, table.interactions[k].genre);
                *interaction_support.entry(key).or_insert(0) += 1;
            }
        }

        // Assign columns, excluding zero-variance levels (active in every
        // training row, hence collinear with the intercept).
        let mut user_cols = HashMap::new();
        let mut movie_cols = HashMap::new();
        let mut interaction_cols = HashMap::new();
        let mut next_col = 0usize;
        let mut constant_cols = 0usize;

        let mut users: Vec<_> = user_support.into_iter().collect();
        users.sort_unstable_by_key(|&(id, _)| id);
        for (id, support) in users {
            if support == n {
                constant_cols += 1;
                continue;
            }
            user_cols.insert(id, next_col);
            next_col += 1;
        }
        let mut movies: Vec<_> = movie_support.into_iter().collect();
        movies.sort_unstable_by_key(|&(id, _)| id);
        for (id, support) in movies {
            if support == n {
                constant_cols += 1;
                continue;
            }
            movie_cols.insert(id, next_col);
            next_col += 1;
        }
        let mut interactions: Vec<_> = interaction_support.into_iter().collect();
        interactions.sort_unstable_by_key(|&(key, _)| key);
        for (key, support) in interactions {
            if support == n {
                constant_cols += 1;
                continue;
            }
            interaction_cols.insert(key, next_col);
            next_col += 1;
        }
        if constant_cols > 0 {
            debug!(constant_cols, "excluded zero-variance columns");
        }

        // Sparse one-hot design and centered target.
        let intercept =
            train.iter().map(|&i| table.rows[i].rating as f64).sum::<f64>() / n as f64;
        let mut design: Vec<Vec<usize>> = Vec::with_capacity(n);
        let mut target: Vec<f64> = Vec::with_capacity(n);
        for &i in train {
            let row = &table.rows[i];
            let mut active = Vec::with_capacity(2 + 4);
            if let Some(&c) = user_cols.get(&row.user_id) {
                active.push(c);
            }
            if let Some(&c) = movie_cols.get(&row.movie_id) {
                active.push(c);
            }
            for k in table.row_interactions(row) {
                let key = (table.interactions[k].user_id, table.interactions[k].genre);
                if let Some(&c) = interaction_cols.get(&key) {
                    active.push(c);
                }
            }
            design.push(active);
            target.push(row.rating as f64 - intercept);
        }

        let weights = conjugate_gradient(&design, &target, next_col, config)?;

        Ok(Self {
            intercept,
            weights,
            user_cols,
            movie_cols,
            interaction_cols,
        })
    }

    /// Predicted rating for a feature row.
    ///
    /// Always defined: levels the model has no column for contribute zero.
    pub fn predict_row(&self, table: &FeatureTable, row: &FeatureRow) -> f64 {
        let mut value = self.intercept;
        if let Some(&c) = self.user_cols.get(&row.user_id) {
            value += self.weights[c];
        }
        if let Some(&c) = self.movie_cols.get(&row.movie_id) {
            value += self.weights[c];
        }
        for k in table.row_interactions(row) {
            let key = (table.interactions[k].user_id, table.interactions[k].genre);
            if let Some(&c) = self.interaction_cols.get(&key) {
                value += self.weights[c];
            }
        }
        value
    }

    /// Mean absolute error over the rows of `table` selected by `eval`.
    pub fn evaluate(&self, table: &FeatureTable, eval: &[usize]) -> f64 {
        let pairs: Vec<(f64, f64)> = eval
            .iter()
            .map(|&i| {
                let row = &table.rows[i];
                (row.rating as f64, self.predict_row(table, row))
            })
            .collect();
        metrics::mean_absolute_error(&pairs)
    }
}

/// Conjugate gradient on the ridge normal equations
/// `(XᵀX + λI) w = Xᵀ y` over the sparse one-hot design.
///
/// The system is symmetric positive definite for λ > 0, so CG converges;
/// hitting the iteration cap leaves the current (approximate) iterate with
/// a warning. Non-finite values mean the solve genuinely failed.
fn conjugate_gradient(
    design: &[Vec<usize>],
    target: &[f64],
    cols: usize,
    config: &RidgeConfig,
) -> Result<Vec<f64>> {
    if cols == 0 {
        return Ok(Vec::new());
    }

    let matvec = |w: &[f64]| -> Vec<f64> {
        let mut out = vec![0.0; cols];
        for active in design {
            let t: f64 = active.iter().map(|&c| w[c]).sum();
            if t != 0.0 {
                for &c in active {
                    out[c] += t;
                }
            }
        }
        for (c, value) in out.iter_mut().enumerate() {
            *value += config.lambda * w[c];
        }
        out
    };

    // b = Xᵀ y
    let mut b = vec![0.0; cols];
    for (row, active) in design.iter().enumerate() {
        for &c in active {
            b[c] += target[row];
        }
    }

    let mut w = vec![0.0; cols];
    let mut r = b.clone();
    let mut p = r.clone();
    let mut rs: f64 = r.iter().map(|v| v * v).sum();
    let rs0 = rs.max(f64::MIN_POSITIVE);
    let threshold = config.tolerance * config.tolerance * rs0;

    for iteration in 0..config.max_iterations {
        if rs <= threshold {
            debug!(iteration, "conjugate gradient converged");
            break;
        }
        let ap = matvec(&p);
        let p_ap: f64 = p.iter().zip(&ap).map(|(x, y)| x * y).sum();
        if p_ap <= 0.0 {
            return Err(ModelError::SingularSystem {
                context: "ridge normal equations".to_string(),
            });
        }
        let alpha = rs / p_ap;
        for c in 0..cols {
            w[c] += alpha * p[c];
            r[c] -= alpha * ap[c];
        }
        let rs_new: f64 = r.iter().map(|v| v * v).sum();
        let beta = rs_new / rs;
        for c in 0..cols {
            p[c] = r[c] + beta * p[c];
        }
        rs = rs_new;
    }

    if rs > threshold {
        warn!(
            residual = rs.sqrt(),
            iterations = config.max_iterations,
            "conjugate gradient stopped at iteration cap"
        );
    }
    if w.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::DidNotConverge {
            context: "ridge regression".to_string(),
            iterations: config.max_iterations,
        });
    }
    Ok(w)
}
