//! Low-rank factorization of the rating matrix.
//!
//! The partially-observed user×movie matrix is decomposed into two dense
//! factor matrices whose product approximates the observed cells. Fitting
//! minimizes squared reconstruction error over observed entries only, with
//! a quadratic penalty of strength `gamma` on both factors, by alternating
//! least squares. Movie columns are de-meaned before fitting and the means
//! are re-added at reconstruction, so predictions on never-observed cells
//! double as imputations.

use crate::error::{ModelError, Result};
use crate::linalg::solve_spd;
use crate::matrix::RatingMatrix;
use crate::metrics;
use data_prep::{MovieId, UserId};
use ndarray::{Array1, Array2, ArrayView1};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Standard deviation of the random factor initialization.
const INIT_SCALE: f64 = 0.1;

/// Hyperparameters for one factorization fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorConfig {
    /// Number of latent factors
    pub rank: usize,
    /// Quadratic regularization strength applied to both factor matrices
    pub gamma: f64,
    /// Number of alternating least squares rounds
    pub iterations: usize,
    /// Seed for factor initialization
    pub seed: u64,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            rank: 10,
            gamma: 5.0,
            iterations: 10,
            seed: 42,
        }
    }
}

impl FactorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rank == 0 {
            return Err(ModelError::InvalidHyperparameter {
                name: "rank",
                value: self.rank.to_string(),
            });
        }
        if !self.gamma.is_finite() || self.gamma < 0.0 {
            return Err(ModelError::InvalidHyperparameter {
                name: "gamma",
                value: self.gamma.to_string(),
            });
        }
        if self.iterations == 0 {
            return Err(ModelError::InvalidHyperparameter {
                name: "iterations",
                value: self.iterations.to_string(),
            });
        }
        Ok(())
    }
}

/// Evaluation outcome of a fitted model against a held-out matrix.
///
/// `skipped` counts held-out entries whose user or movie never appeared in
/// training; they are excluded from the RMSE denominator rather than being
/// treated as zero-error. If nothing was scorable the RMSE is infinite.
#[derive(Debug, Clone, Copy)]
pub struct EvalSummary {
    pub rmse: f64,
    pub scored: usize,
    pub skipped: usize,
}

/// A fitted low-rank model: latent coordinates for every training user and
/// movie, plus the column means removed before fitting.
#[derive(Debug, Clone)]
pub struct FactorModel {
    pub config: FactorConfig,
    user_ids: Vec<UserId>,
    movie_ids: Vec<MovieId>,
    user_index: HashMap<UserId, usize>,
    movie_index: HashMap<MovieId, usize>,
    /// user_count × rank
    user_factors: Array2<f64>,
    /// movie_count × rank
    movie_factors: Array2<f64>,
    movie_means: Vec<f64>,
}

impl FactorModel {
    /// Fit a factorization of `train` with the given hyperparameters.
    pub fn fit(train: &RatingMatrix, config: FactorConfig) -> Result<Self> {
        config.validate()?;
        if train.observed_count() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }

        let rank = config.rank;
        let user_count = train.user_count();
        let movie_count = train.movie_count();
        let movie_means = train.column_means();

        // Movie factors start from a seeded normal draw; user factors are
        // produced by the first alternation.
        let mut rng = StdRng::seed_from_u64(config.seed);
        let normal = Normal::new(0.0, INIT_SCALE).expect("valid normal distribution");
        let mut movie_factors = Array2::<f64>::zeros((movie_count, rank));
        for value in movie_factors.iter_mut() {
            *value = normal.sample(&mut rng);
        }
        let mut user_factors = Array2::<f64>::zeros((user_count, rank));

        for round in 0..config.iterations {
            user_factors = solve_side(
                user_count,
                rank,
                config.gamma,
                &movie_factors,
                |ui| {
                    train
                        .user_row(ui)
                        .iter()
                        .map(|&(mi, r)| (mi, r - movie_means[mi]))
                        .collect()
                },
                "user factors",
            )?;
            movie_factors = solve_side(
                movie_count,
                rank,
                config.gamma,
                &user_factors,
                |mi| {
                    train
                        .movie_column(mi)
                        .iter()
                        .map(|&(ui, r)| (ui, r - movie_means[mi]))
                        .collect()
                },
                "movie factors",
            )?;
            debug!(round, rank, gamma = config.gamma, "ALS round complete");
        }

        Ok(Self {
            config,
            user_ids: train.user_ids().to_vec(),
            movie_ids: train.movie_ids().to_vec(),
            user_index: train
                .user_ids()
                .iter()
                .enumerate()
                .map(|(i, &u)| (u, i))
                .collect(),
            movie_index: train
                .movie_ids()
                .iter()
                .enumerate()
                .map(|(i, &m)| (m, i))
                .collect(),
            user_factors,
            movie_factors,
            movie_means,
        })
    }

    pub fn rank(&self) -> usize {
        self.config.rank
    }

    /// Predicted (or imputed) rating for a (user, movie) cell.
    ///
    /// `None` when either id is outside the training matrix; such cells
    /// cannot be scored and must not enter an RMSE denominator.
    pub fn predict(&self, user: UserId, movie: MovieId) -> Option<f64> {
        let ui = *self.user_index.get(&user)?;
        let mi = *self.movie_index.get(&movie)?;
        Some(self.reconstruct(ui, mi))
    }

    fn reconstruct(&self, ui: usize, mi: usize) -> f64 {
        self.movie_means[mi] + self.user_factors.row(ui).dot(&self.movie_factors.row(mi))
    }

    /// RMSE against the observed entries of `matrix`, excluding entries the
    /// model cannot score.
    pub fn evaluate(&self, matrix: &RatingMatrix) -> EvalSummary {
        let mut pairs = Vec::new();
        let mut skipped = 0usize;

        for (ui, mi, actual) in matrix.observations() {
            let user = matrix.user_ids()[ui];
            let movie = matrix.movie_ids()[mi];
            match self.predict(user, movie) {
                Some(predicted) => pairs.push((actual, predicted)),
                None => skipped += 1,
            }
        }

        let rmse = if pairs.is_empty() {
            f64::INFINITY
        } else {
            metrics::root_mean_squared_error(&pairs)
        };
        EvalSummary {
            rmse,
            scored: pairs.len(),
            skipped,
        }
    }

    /// Latent coordinates for a training user.
    pub fn user_vector(&self, user: UserId) -> Option<ArrayView1<'_, f64>> {
        let ui = *self.user_index.get(&user)?;
        Some(self.user_factors.row(ui))
    }

    /// Latent coordinates for a training movie.
    pub fn movie_vector(&self, movie: MovieId) -> Option<ArrayView1<'_, f64>> {
        let mi = *self.movie_index.get(&movie)?;
        Some(self.movie_factors.row(mi))
    }

    /// Every training movie projected onto the first two latent dimensions,
    /// for similarity inspection. With rank 1 the second coordinate is 0.
    pub fn movie_projection(&self) -> Vec<(MovieId, f64, f64)> {
        self.movie_ids
            .iter()
            .enumerate()
            .map(|(mi, &movie)| {
                let row = self.movie_factors.row(mi);
                let y = if self.config.rank > 1 { row[1] } else { 0.0 };
                (movie, row[0], y)
            })
            .collect()
    }
}

/// Solve one side of the alternation: for each of `count` rows, the ridge
/// system over that row's observations against the fixed opposite factors.
///
/// Rows are solved in parallel and written back by index, so the result is
/// independent of scheduling. A row with no observations keeps zero factors
/// (its predictions fall back to the column mean).
fn solve_side<F>(
    count: usize,
    rank: usize,
    gamma: f64,
    fixed: &Array2<f64>,
    residuals: F,
    context: &str,
) -> Result<Array2<f64>>
where
    F: Fn(usize) -> Vec<(usize, f64)> + Sync,
{
    let rows: Vec<Array1<f64>> = (0..count)
        .into_par_iter()
        .map(|i| {
            let obs = residuals(i);
            if obs.is_empty() {
                return Ok(Array1::<f64>::zeros(rank));
            }

            let mut a = Array2::<f64>::zeros((rank, rank));
            let mut b = Array1::<f64>::zeros(rank);
            for &(j, residual) in &obs {
                let f = fixed.row(j);
                for p in 0..rank {
                    b[p] += residual * f[p];
                    for q in 0..rank {
                        a[[p, q]] += f[p] * f[q];
                    }
                }
            }
            for p in 0..rank {
                a[[p, p]] += gamma;
            }
            solve_spd(&a, &b, context)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = Array2::<f64>::zeros((count, rank));
    for (i, row) in rows.into_iter().enumerate() {
        out.row_mut(i).assign(&row);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ratings generated from an exactly rank-2 structure.
    fn synthetic_matrix() -> RatingMatrix {
        let user_coords: Vec<[f64; 2]> = (0..12)
            .map(|i| [1.0 + (i % 4) as f64 * 0.5, (i % 3) as f64 * 0.4])
            .collect();
        let movie_coords: Vec<[f64; 2]> = (0..10)
            .map(|j| [0.8 + (j % 5) as f64 * 0.3, (j % 2) as f64 * 0.6])
            .collect();

        let mut triples = Vec::new();
        for (i, u) in user_coords.iter().enumerate() {
            for (j, m) in movie_coords.iter().enumerate() {
                // Leave some cells unobserved.
                if (i + j) % 4 == 0 {
                    continue;
                }
                let value = u[0] * m[0] + u[1] * m[1];
                triples.push((i as u32 + 1, j as u32 + 100, value as f32));
            }
        }
        RatingMatrix::from_triples(triples)
    }

    #[test]
    fn test_fit_reconstructs_observed_entries() {
        let train = synthetic_matrix();
        let config = FactorConfig {
            rank: 3,
            gamma: 0.01,
            iterations: 20,
            seed: 7,
        };
        let model = FactorModel::fit(&train, config).unwrap();

        let summary = model.evaluate(&train);
        assert_eq!(summary.skipped, 0);
        assert!(
            summary.rmse < 0.05,
            "training RMSE too high: {}",
            summary.rmse
        );
    }

    #[test]
    fn test_training_error_non_increasing_in_rank() {
        let train = synthetic_matrix();
        let mut previous = f64::INFINITY;
        for rank in [1, 2, 4] {
            let config = FactorConfig {
                rank,
                gamma: 0.5,
                iterations: 15,
                seed: 7,
            };
            let model = FactorModel::fit(&train, config).unwrap();
            let rmse = model.evaluate(&train).rmse;
            assert!(
                rmse <= previous + 1e-3,
                "rank {rank} residual {rmse} above rank below ({previous})"
            );
            previous = rmse;
        }
    }

    #[test]
    fn test_unknown_ids_are_not_scored() {
        let train = RatingMatrix::from_triples(vec![(1, 10, 4.0), (2, 10, 3.0), (1, 20, 5.0)]);
        let model = FactorModel::fit(
            &train,
            FactorConfig {
                rank: 1,
                gamma: 1.0,
                iterations: 5,
                seed: 1,
            },
        )
        .unwrap();

        assert!(model.predict(1, 10).is_some());
        assert!(model.predict(99, 10).is_none());
        assert!(model.predict(1, 999).is_none());

        // Held-out matrix with one scorable and one unscorable entry.
        let eval = RatingMatrix::from_triples(vec![(2, 20, 4.0), (99, 10, 1.0)]);
        let summary = model.evaluate(&eval);
        assert_eq!(summary.scored, 1);
        assert_eq!(summary.skipped, 1);
        assert!(summary.rmse.is_finite());
    }

    #[test]
    fn test_imputation_of_unobserved_cell() {
        let train = RatingMatrix::from_triples(vec![
            (1, 10, 4.0),
            (1, 20, 2.0),
            (2, 10, 4.0),
            (3, 20, 2.0),
        ]);
        let model = FactorModel::fit(
            &train,
            FactorConfig {
                rank: 1,
                gamma: 0.5,
                iterations: 10,
                seed: 3,
            },
        )
        .unwrap();

        // (3, 10) was never observed but both ids are in training, so the
        // reconstruction imputes it.
        assert!(train.get(3, 10).is_none());
        assert!(model.predict(3, 10).is_some());
    }

    #[test]
    fn test_gamma_zero_is_accepted() {
        let train = synthetic_matrix();
        let config = FactorConfig {
            rank: 2,
            gamma: 0.0,
            iterations: 10,
            seed: 11,
        };
        let model = FactorModel::fit(&train, config).unwrap();
        assert!(model.evaluate(&train).rmse.is_finite());
    }

    #[test]
    fn test_invalid_hyperparameters_fail_fast() {
        let train = synthetic_matrix();
        assert!(matches!(
            FactorModel::fit(
                &train,
                FactorConfig {
                    rank: 0,
                    ..FactorConfig::default()
                }
            ),
            Err(ModelError::InvalidHyperparameter { name: "rank", .. })
        ));
        assert!(matches!(
            FactorModel::fit(
                &train,
                FactorConfig {
                    gamma: -1.0,
                    ..FactorConfig::default()
                }
            ),
            Err(ModelError::InvalidHyperparameter { name: "gamma", .. })
        ));
    }

    #[test]
    fn test_same_seed_reproduces_factors() {
        let train = synthetic_matrix();
        let config = FactorConfig {
            rank: 2,
            gamma: 0.5,
            iterations: 5,
            seed: 21,
        };
        let a = FactorModel::fit(&train, config).unwrap();
        let b = FactorModel::fit(&train, config).unwrap();
        assert_eq!(a.predict(1, 100), b.predict(1, 100));
    }

    #[test]
    fn test_projection_has_two_coordinates_per_movie() {
        let train = synthetic_matrix();
        let model = FactorModel::fit(
            &train,
            FactorConfig {
                rank: 2,
                gamma: 0.5,
                iterations: 5,
                seed: 5,
            },
        )
        .unwrap();

        let projection = model.movie_projection();
        assert_eq!(projection.len(), train.movie_count());
    }
}
