//! Core domain types for the MovieLens tables.
//!
//! Identifier aliases keep user and movie ids from being mixed up at the
//! type level. Genres are free-form strings rather than a closed enum: the
//! feature pipeline pivots over whatever distinct genre tags appear in the
//! movies table, so the vocabulary is data-driven.

use serde::{Deserialize, Serialize};

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

/// A single rating event from the ratings table.
///
/// Source data does not guarantee uniqueness per (user, movie); consumers
/// that need a unique cell (the rating matrix) keep the last occurrence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value, 1.0 to 5.0 in MovieLens
    pub rating: f32,
    /// Unix timestamp when the rating was made
    pub timestamp: i64,
}

/// A movie from the movies table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from the title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    /// Genre tags, split from the pipe-delimited source field.
    /// Empty when the source listed no genres.
    pub genres: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_with_multiple_genres() {
        let movie = Movie {
            id: 1,
            title: "Toy Story (1995)".to_string(),
            year: Some(1995),
            genres: vec!["Animation".into(), "Children's".into(), "Comedy".into()],
        };

        assert_eq!(movie.genres.len(), 3);
    }
}
