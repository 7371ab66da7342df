//! Feature table construction: genre explosion and user×genre interactions.
//!
//! This is the data-preparation stage of the evaluation pipeline. Ratings
//! are left-joined with movie metadata, pipe-delimited genre tags are
//! exploded into indicator columns, and per-(user, genre) interaction
//! columns are derived with frequency-based truncation.

use crate::types::{Movie, MovieId, Rating, UserId};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Genre indicator columns derived from the movies table.
///
/// `names` holds the distinct genre tags in sorted order; `by_movie` maps a
/// movie to the sorted indices of its set flags. A movie may set several
/// flags (the columns are mutually non-exclusive).
#[derive(Debug, Clone)]
pub struct GenreColumns {
    pub names: Vec<String>,
    pub by_movie: HashMap<MovieId, Vec<usize>>,
}

/// Explode pipe-delimited genre sets into indicator columns.
///
/// The round trip holds: mapping a movie's indices back through `names`
/// reproduces its original genre set.
pub fn genre_columns(movies: &[Movie]) -> GenreColumns {
    let distinct: BTreeSet<&str> = movies
        .iter()
        .flat_map(|m| m.genres.iter().map(String::as_str))
        .collect();
    let names: Vec<String> = distinct.into_iter().map(String::from).collect();
    let index: HashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let by_movie = movies
        .iter()
        .map(|movie| {
            let mut flags: Vec<usize> = movie
                .genres
                .iter()
                .filter_map(|g| index.get(g.as_str()).copied())
                .collect();
            flags.sort_unstable();
            flags.dedup();
            (movie.id, flags)
        })
        .collect();

    GenreColumns { names, by_movie }
}

impl GenreColumns {
    /// Reassemble a movie's indicator flags back into genre names.
    ///
    /// Returns `None` for a movie absent from the movies table.
    pub fn reassemble(&self, movie_id: MovieId) -> Option<Vec<&str>> {
        self.by_movie
            .get(&movie_id)
            .map(|flags| flags.iter().map(|&i| self.names[i].as_str()).collect())
    }
}

/// One row of the joined feature table: a rating augmented with the rated
/// movie's genre flags.
///
/// `genres` is `None` when the movie id had no match in the movies table
/// (left-join semantics: the rating row is retained, its genre columns are
/// null). A matched movie with no genre tags yields `Some(vec![])`.
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f32,
    pub genres: Option<Vec<usize>>,
}

/// A surviving user×genre interaction column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub user_id: UserId,
    /// Index into the genre column list
    pub genre: usize,
    /// Number of rating rows where this user rated a movie with this genre
    pub support: usize,
}

/// Expands categorical crosses into interaction columns with
/// frequency-based truncation.
///
/// Candidate columns are every (user id, genre flag) pair observed in the
/// feature rows. Candidates are ranked by occurrence count, truncated to
/// `max_per_user × distinct_user_count` columns, and any survivor with
/// support below `min_support` is dropped. Ties in the ranking break by
/// ascending user id then genre index, so the output is deterministic.
#[derive(Debug, Clone, Copy)]
pub struct InteractionExpander {
    pub min_support: usize,
    pub max_per_user: usize,
}

impl Default for InteractionExpander {
    fn default() -> Self {
        Self {
            min_support: 3,
            max_per_user: 2,
        }
    }
}

impl InteractionExpander {
    pub fn new(min_support: usize, max_per_user: usize) -> Self {
        Self {
            min_support,
            max_per_user,
        }
    }

    /// Derive the surviving interaction columns from the feature rows.
    pub fn expand(&self, rows: &[FeatureRow]) -> Vec<Interaction> {
        let mut counts: HashMap<(UserId, usize), usize> = HashMap::new();
        let mut users: HashSet<UserId> = HashSet::new();

        for row in rows {
            users.insert(row.user_id);
            if let Some(genres) = &row.genres {
                for &genre in genres {
                    *counts.entry((row.user_id, genre)).or_insert(0) += 1;
                }
            }
        }

        let mut candidates: Vec<Interaction> = counts
            .into_iter()
            .map(|((user_id, genre), support)| Interaction {
                user_id,
                genre,
                support,
            })
            .collect();
        candidates.sort_unstable_by(|a, b| {
            b.support
                .cmp(&a.support)
                .then(a.user_id.cmp(&b.user_id))
                .then(a.genre.cmp(&b.genre))
        });

        // Cap first, then apply minimum support to the survivors.
        let cap = self.max_per_user.saturating_mul(users.len());
        candidates.truncate(cap);
        candidates.retain(|c| c.support >= self.min_support);
        candidates
    }
}

/// The joined feature table: one row per rating plus the derived schema.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
    /// Distinct genre names, sorted; genre indices refer into this list
    pub genres: Vec<String>,
    /// Surviving interaction columns, frequency-ranked
    pub interactions: Vec<Interaction>,
    pub distinct_users: usize,
    interaction_index: HashMap<(UserId, usize), usize>,
}

impl FeatureTable {
    /// Build the feature table: left-join movies onto ratings, attach genre
    /// flags, and derive interaction columns.
    pub fn build(ratings: &[Rating], movies: &[Movie], expander: &InteractionExpander) -> Self {
        let columns = genre_columns(movies);

        let rows: Vec<FeatureRow> = ratings
            .iter()
            .map(|r| FeatureRow {
                user_id: r.user_id,
                movie_id: r.movie_id,
                rating: r.rating,
                // Left join: a missing movie leaves the genre columns null.
                genres: columns.by_movie.get(&r.movie_id).cloned(),
            })
            .collect();

        let distinct_users = rows
            .iter()
            .map(|r| r.user_id)
            .collect::<HashSet<_>>()
            .len();

        let interactions = expander.expand(&rows);
        let interaction_index = interactions
            .iter()
            .enumerate()
            .map(|(i, c)| ((c.user_id, c.genre), i))
            .collect();

        debug!(
            rows = rows.len(),
            genres = columns.names.len(),
            interactions = interactions.len(),
            "feature table built"
        );

        Self {
            rows,
            genres: columns.names,
            interactions,
            distinct_users,
            interaction_index,
        }
    }

    /// Index of the interaction column for (user, genre), if it survived.
    pub fn interaction_id(&self, user_id: UserId, genre: usize) -> Option<usize> {
        self.interaction_index.get(&(user_id, genre)).copied()
    }

    /// Interaction column indices active on a row.
    pub fn row_interactions(&self, row: &FeatureRow) -> Vec<usize> {
        match &row.genres {
            Some(genres) => genres
                .iter()
                .filter_map(|&g| self.interaction_id(row.user_id, g))
                .collect(),
            None => Vec::new(),
        }
    }
}
