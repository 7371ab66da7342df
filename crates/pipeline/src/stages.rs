//! Stage orchestration for one evaluation run.
//!
//! The four stages are pure functions passing immutable tables forward:
//! feature preparation, split, content-based fit, factorization sweep.
//! Each stage is all-or-nothing: a failure propagates with context and
//! nothing downstream runs.

use crate::config::PipelineConfig;
use crate::report::{PipelineReport, ProjectionPoint, SweepRow};
use crate::split::split_rows;
use anyhow::{Context, Result, ensure};
use data_prep::{FeatureTable, InteractionExpander, Movie, MovieId, Rating};
use models::{ContentModel, RatingMatrix, RidgeConfig, SweepGrid, run_sweep};
use std::time::Instant;
use tracing::info;

/// Number of movies included in the 2D projection sample.
const PROJECTION_SAMPLE: usize = 20;

/// Run the full evaluation pipeline over already-parsed tables.
pub fn run(
    ratings: &[Rating],
    movies: &[Movie],
    config: &PipelineConfig,
) -> Result<PipelineReport> {
    config.validate().context("invalid pipeline configuration")?;
    ensure!(!ratings.is_empty(), "ratings table is empty");

    // Stage 1: data preparation.
    let start = Instant::now();
    let expander = InteractionExpander::new(config.min_support, config.max_interactions_per_user);
    let table = FeatureTable::build(ratings, movies, &expander);
    info!(
        rows = table.rows.len(),
        genres = table.genres.len(),
        interactions = table.interactions.len(),
        elapsed = ?start.elapsed(),
        "data preparation complete"
    );

    // Stage 2: split.
    let start = Instant::now();
    let split = split_rows(table.rows.len(), config.train_fraction, config.seed);
    ensure!(
        !split.train.is_empty() && !split.test.is_empty(),
        "split produced an empty side ({} train / {} eval rows)",
        split.train.len(),
        split.test.len()
    );
    info!(
        train = split.train.len(),
        eval = split.test.len(),
        seed = config.seed,
        elapsed = ?start.elapsed(),
        "split complete"
    );

    // Stage 3: content-based model.
    let start = Instant::now();
    let ridge = RidgeConfig {
        lambda: config.glm_lambda,
        ..RidgeConfig::default()
    };
    let content = ContentModel::fit(&table, &split.train, &ridge)
        .context("content-based model fit failed")?;
    let content_mae = content.evaluate(&table, &split.test);
    info!(
        mae = content_mae,
        lambda = config.glm_lambda,
        elapsed = ?start.elapsed(),
        "content-based model complete"
    );

    // Stage 4: collaborative-filtering sweep.
    let start = Instant::now();
    let train_matrix = RatingMatrix::from_triples(
        split
            .train
            .iter()
            .map(|&i| &table.rows[i])
            .map(|r| (r.user_id, r.movie_id, r.rating)),
    );
    let eval_matrix = RatingMatrix::from_triples(
        split
            .test
            .iter()
            .map(|&i| &table.rows[i])
            .map(|r| (r.user_id, r.movie_id, r.rating)),
    );
    let grid = SweepGrid {
        ranks: config.ranks.clone(),
        gammas: config.gammas.clone(),
        iterations: config.als_iterations,
        seed: config.seed,
    };
    let outcome =
        run_sweep(&train_matrix, &eval_matrix, &grid).context("factorization sweep failed")?;
    info!(
        configurations = outcome.results.len(),
        elapsed = ?start.elapsed(),
        "factorization sweep complete"
    );

    // Assemble the report.
    let best = outcome.best_result();
    let rank = best.model.rank();
    let sweep = outcome
        .results
        .iter()
        .enumerate()
        .map(|(i, r)| SweepRow {
            rank: r.model.config.rank,
            gamma: r.model.config.gamma,
            rmse: r.rmse,
            scored: r.scored,
            skipped: r.skipped,
            selected: i == outcome.best,
        })
        .collect();

    // Most-rated training movies first, ties by id for determinism.
    let mut popularity: Vec<(MovieId, usize)> = train_matrix
        .movie_ids()
        .iter()
        .enumerate()
        .map(|(mi, &movie)| (movie, train_matrix.movie_column(mi).len()))
        .collect();
    popularity.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let projection = popularity
        .iter()
        .take(PROJECTION_SAMPLE)
        .filter_map(|&(movie, _)| {
            best.model.movie_vector(movie).map(|v| ProjectionPoint {
                movie_id: movie,
                x: v[0],
                y: if rank > 1 { v[1] } else { 0.0 },
            })
        })
        .collect();

    Ok(PipelineReport {
        total_rows: table.rows.len(),
        genre_count: table.genres.len(),
        interaction_count: table.interactions.len(),
        distinct_users: table.distinct_users,
        train_rows: split.train.len(),
        eval_rows: split.test.len(),
        content_mae,
        sweep,
        best_rank: rank,
        best_gamma: best.model.config.gamma,
        best_rmse: best.rmse,
        user_factor_shape: (train_matrix.user_count(), rank),
        movie_factor_shape: (train_matrix.movie_count(), rank),
        projection,
    })
}
