use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use data_prep::parser;
use pipeline::{PipelineConfig, PipelineReport};
use std::path::PathBuf;
use std::time::Instant;

/// LensEval - recommender evaluation pipeline over MovieLens data
///
/// Runs a single non-interactive evaluation: joins ratings with movie
/// metadata, fits a content-based ridge model and a sweep of low-rank
/// factorizations, and reports MAE / RMSE on a held-out split.
#[derive(Parser)]
#[command(name = "lens-eval")]
#[command(about = "Evaluate content-based and collaborative recommender models", long_about = None)]
struct Cli {
    /// Path to the ratings file (.dat with '::' or .csv)
    #[arg(long, default_value = "data/ratings.dat")]
    ratings: PathBuf,

    /// Path to the movies file (.dat with '::' or .csv)
    #[arg(long, default_value = "data/movies.dat")]
    movies: PathBuf,

    /// Seed for the split and factor initialization
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Fraction of rows used for training
    #[arg(long, default_value = "0.75")]
    train_fraction: f64,

    /// Factorization ranks to sweep
    #[arg(long, value_delimiter = ',', default_value = "5,10,15")]
    ranks: Vec<usize>,

    /// Regularization strengths to sweep
    #[arg(long, value_delimiter = ',', default_value = "0,5,10")]
    gammas: Vec<f64>,

    /// ALS rounds per factorization fit
    #[arg(long, default_value = "10")]
    iterations: usize,

    /// Minimum support for an interaction column
    #[arg(long, default_value = "3")]
    min_support: usize,

    /// Ridge penalty for the content-based model
    #[arg(long, default_value = "0.00001")]
    lambda: f64,

    /// Emit the report as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load the two input tables (this may take a moment on the full dataset)
    println!(
        "Loading ratings from {} and movies from {}...",
        cli.ratings.display(),
        cli.movies.display()
    );
    let start = Instant::now();
    let ratings = parser::parse_ratings(&cli.ratings).context("Failed to load ratings table")?;
    let movies = parser::parse_movies(&cli.movies).context("Failed to load movies table")?;
    println!(
        "{} Loaded {} ratings and {} movies in {:?}",
        "✓".green(),
        ratings.len(),
        movies.len(),
        start.elapsed()
    );

    let config = PipelineConfig {
        train_fraction: cli.train_fraction,
        seed: cli.seed,
        min_support: cli.min_support,
        glm_lambda: cli.lambda,
        ranks: cli.ranks.clone(),
        gammas: cli.gammas.clone(),
        als_iterations: cli.iterations,
        ..PipelineConfig::default()
    };

    let start = Instant::now();
    let report = pipeline::run(&ratings, &movies, &config)?;
    println!(
        "{} Pipeline finished in {:?}",
        "✓".green(),
        start.elapsed()
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Format and print the evaluation report
fn print_report(report: &PipelineReport) {
    println!();
    println!("{}", "Evaluation Report".bold().blue());
    println!(
        "{}Rows: {} ({} train / {} eval)",
        "• ".green(),
        report.total_rows,
        report.train_rows,
        report.eval_rows
    );
    println!(
        "{}Genres: {}, interaction columns: {} (cap {})",
        "• ".green(),
        report.genre_count,
        report.interaction_count,
        2 * report.distinct_users
    );
    println!(
        "{}Content-based model MAE: {}",
        "• ".cyan(),
        format!("{:.4}", report.content_mae).bold()
    );

    println!();
    println!("{}", "Factorization sweep".bold().blue());
    println!("{:>6} {:>8} {:>10} {:>8} {:>8}", "rank", "gamma", "rmse", "scored", "skipped");
    for row in &report.sweep {
        let line = format!(
            "{:>6} {:>8.1} {:>10.4} {:>8} {:>8}",
            row.rank, row.gamma, row.rmse, row.scored, row.skipped
        );
        if row.selected {
            println!("{} {}", line.green().bold(), "← selected".green());
        } else {
            println!("{line}");
        }
    }
    println!(
        "{}Best: rank {} gamma {} (RMSE {:.4}); factors {}×{} and {}×{}",
        "• ".cyan(),
        report.best_rank,
        report.best_gamma,
        report.best_rmse,
        report.user_factor_shape.0,
        report.user_factor_shape.1,
        report.movie_factor_shape.0,
        report.movie_factor_shape.1
    );

    if !report.projection.is_empty() {
        println!();
        println!("{}", "Movie projection (first two latent dimensions)".bold().blue());
        for point in &report.projection {
            println!(
                "  movie {:>6}: ({:>8.4}, {:>8.4})",
                point.movie_id, point.x, point.y
            );
        }
    }
}
