//! Sparse user×movie rating matrix.
//!
//! Unobserved cells are absent, not zero: every algorithm downstream
//! iterates the observation lists rather than a dense grid.

use data_prep::{MovieId, Rating, UserId};
use std::collections::{BTreeSet, HashMap};

/// Sparse 2D structure indexed by (user, movie) -> rating.
///
/// Rows (users) and columns (movies) are assigned dense indices in sorted
/// id order so the layout is deterministic for a given set of observations.
/// Duplicate (user, movie) pairs keep the last occurrence.
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    users: Vec<UserId>,
    movies: Vec<MovieId>,
    user_index: HashMap<UserId, usize>,
    movie_index: HashMap<MovieId, usize>,
    /// Per-user observations as (movie index, rating), sorted by movie index
    by_user: Vec<Vec<(usize, f64)>>,
    /// Per-movie observations as (user index, rating), sorted by user index
    by_movie: Vec<Vec<(usize, f64)>>,
    observed: usize,
}

impl RatingMatrix {
    /// Build the matrix from rating records.
    pub fn from_ratings<'a, I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = &'a Rating>,
    {
        Self::from_triples(
            ratings
                .into_iter()
                .map(|r| (r.user_id, r.movie_id, r.rating)),
        )
    }

    /// Build the matrix from (user, movie, rating) triples.
    pub fn from_triples<I>(triples: I) -> Self
    where
        I: IntoIterator<Item = (UserId, MovieId, f32)>,
    {
        // Last occurrence wins for duplicate cells.
        let mut cells: HashMap<(UserId, MovieId), f64> = HashMap::new();
        for (user, movie, rating) in triples {
            cells.insert((user, movie), rating as f64);
        }

        let user_set: BTreeSet<UserId> = cells.keys().map(|&(u, _)| u).collect();
        let movie_set: BTreeSet<MovieId> = cells.keys().map(|&(_, m)| m).collect();
        let users: Vec<UserId> = user_set.into_iter().collect();
        let movies: Vec<MovieId> = movie_set.into_iter().collect();

        let user_index: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        let movie_index: HashMap<MovieId, usize> =
            movies.iter().enumerate().map(|(i, &m)| (m, i)).collect();

        let mut by_user: Vec<Vec<(usize, f64)>> = vec![Vec::new(); users.len()];
        let mut by_movie: Vec<Vec<(usize, f64)>> = vec![Vec::new(); movies.len()];
        let observed = cells.len();

        for ((user, movie), rating) in cells {
            let ui = user_index[&user];
            let mi = movie_index[&movie];
            by_user[ui].push((mi, rating));
            by_movie[mi].push((ui, rating));
        }
        for row in &mut by_user {
            row.sort_unstable_by_key(|&(mi, _)| mi);
        }
        for col in &mut by_movie {
            col.sort_unstable_by_key(|&(ui, _)| ui);
        }

        Self {
            users,
            movies,
            user_index,
            movie_index,
            by_user,
            by_movie,
            observed,
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn movie_count(&self) -> usize {
        self.movies.len()
    }

    pub fn observed_count(&self) -> usize {
        self.observed
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.users
    }

    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movies
    }

    pub fn user_position(&self, user: UserId) -> Option<usize> {
        self.user_index.get(&user).copied()
    }

    pub fn movie_position(&self, movie: MovieId) -> Option<usize> {
        self.movie_index.get(&movie).copied()
    }

    /// Observations for one user row, as (movie index, rating).
    pub fn user_row(&self, index: usize) -> &[(usize, f64)] {
        &self.by_user[index]
    }

    /// Observations for one movie column, as (user index, rating).
    pub fn movie_column(&self, index: usize) -> &[(usize, f64)] {
        &self.by_movie[index]
    }

    /// The rating at (user, movie), if observed.
    pub fn get(&self, user: UserId, movie: MovieId) -> Option<f64> {
        let ui = self.user_position(user)?;
        let mi = self.movie_position(movie)?;
        self.by_user[ui]
            .binary_search_by_key(&mi, |&(m, _)| m)
            .ok()
            .map(|pos| self.by_user[ui][pos].1)
    }

    /// Iterate all observed cells as (user index, movie index, rating).
    pub fn observations(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.by_user
            .iter()
            .enumerate()
            .flat_map(|(ui, row)| row.iter().map(move |&(mi, r)| (ui, mi, r)))
    }

    /// Mean of the observed entries in each movie column.
    pub fn column_means(&self) -> Vec<f64> {
        self.by_movie
            .iter()
            .map(|col| {
                if col.is_empty() {
                    0.0
                } else {
                    col.iter().map(|&(_, r)| r).sum::<f64>() / col.len() as f64
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entries_are_absent_not_zero() {
        let matrix =
            RatingMatrix::from_triples(vec![(1, 10, 5.0), (1, 20, 3.0), (2, 10, 4.0)]);

        assert_eq!(matrix.user_count(), 2);
        assert_eq!(matrix.movie_count(), 2);
        assert_eq!(matrix.observed_count(), 3);
        assert_eq!(matrix.get(1, 10), Some(5.0));
        // (2, 20) was never rated: missing, not 0.
        assert_eq!(matrix.get(2, 20), None);
    }

    #[test]
    fn test_duplicate_cell_keeps_last_occurrence() {
        let matrix = RatingMatrix::from_triples(vec![(1, 10, 2.0), (1, 10, 5.0)]);

        assert_eq!(matrix.observed_count(), 1);
        assert_eq!(matrix.get(1, 10), Some(5.0));
    }

    #[test]
    fn test_column_means() {
        let matrix =
            RatingMatrix::from_triples(vec![(1, 10, 5.0), (2, 10, 3.0), (1, 20, 2.0)]);

        let means = matrix.column_means();
        let m10 = matrix.movie_position(10).unwrap();
        let m20 = matrix.movie_position(20).unwrap();
        assert!((means[m10] - 4.0).abs() < 1e-12);
        assert!((means[m20] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic_layout() {
        let a = RatingMatrix::from_triples(vec![(3, 30, 1.0), (1, 10, 2.0), (2, 20, 3.0)]);
        assert_eq!(a.user_ids(), &[1, 2, 3]);
        assert_eq!(a.movie_ids(), &[10, 20, 30]);
    }
}
