//! # Data Preparation Crate
//!
//! Loads the MovieLens rating and movie tables and turns them into the
//! joined feature table the evaluation pipeline consumes.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Rating, Movie, id aliases)
//! - **parser**: Parse `.dat` / `.csv` source files into Rust structs
//! - **features**: Genre explosion, left join, interaction expansion
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_prep::{parser, FeatureTable, InteractionExpander};
//! use std::path::Path;
//!
//! let ratings = parser::parse_ratings(Path::new("data/ratings.dat"))?;
//! let movies = parser::parse_movies(Path::new("data/movies.dat"))?;
//!
//! let table = FeatureTable::build(&ratings, &movies, &InteractionExpander::default());
//! println!("{} rows, {} genres", table.rows.len(), table.genres.len());
//! ```

// Public modules
pub mod error;
pub mod features;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DataError, Result};
pub use features::{
    FeatureRow, FeatureTable, GenreColumns, Interaction, InteractionExpander, genre_columns,
};
pub use types::{Movie, MovieId, Rating, UserId};
