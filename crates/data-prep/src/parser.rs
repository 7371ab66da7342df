//! Parsers for the raw rating and movie tables.
//!
//! Two on-disk layouts are supported, detected from the first data line:
//! - MovieLens `.dat` files delimited by `::`
//!   (ratings: `userId::movieId::rating::timestamp`,
//!   movies: `movieId::title::genres`)
//! - Comma-delimited files, optionally with a header row
//!   (ratings: `userId,movieId,rating,timestamp`,
//!   movies: `movieId,title,genres` with quoted titles)
//!
//! Malformed rows are skipped with a warning rather than aborting the load;
//! only file-level failures surface as errors.

use crate::error::{DataError, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Genre placeholder used by newer MovieLens dumps for untagged movies.
const NO_GENRES: &str = "(no genres listed)";

#[derive(Debug, Deserialize)]
struct RawRating {
    user_id: UserId,
    movie_id: MovieId,
    rating: f32,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct RawMovie {
    id: MovieId,
    title: String,
    genres: String,
}

/// Read a file with ISO-8859-1 (Latin-1) encoding.
///
/// The classic MovieLens dumps are not UTF-8; each byte maps directly to a
/// Unicode code point, so the conversion is a straight widening.
fn read_latin1(path: &Path) -> Result<String> {
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(bytes.iter().map(|&b| b as char).collect())
}

/// True when the first non-empty line uses the `::` delimiter.
fn is_dat_format(content: &str) -> bool {
    content
        .lines()
        .find(|l| !l.trim().is_empty())
        .is_some_and(|l| l.contains("::"))
}

/// Parse the ratings table from `path`.
///
/// Rows whose fields do not parse are skipped and counted; a file with no
/// usable rows at all is an error.
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let content = read_latin1(path)?;

    let ratings = if is_dat_format(&content) {
        parse_ratings_dat(&content, path)
    } else {
        parse_ratings_csv(&content, path)?
    };

    if ratings.is_empty() {
        return Err(DataError::NoRows {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), rows = ratings.len(), "parsed ratings");
    Ok(ratings)
}

fn parse_ratings_dat(content: &str, path: &Path) -> Vec<Rating> {
    let mut ratings = Vec::new();
    let mut skipped = 0usize;

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split("::").collect();
        match parse_rating_fields(&fields) {
            Some(rating) => ratings.push(rating),
            None => {
                skipped += 1;
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    "skipping malformed rating row"
                );
            }
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "ratings rows skipped");
    }
    ratings
}

fn parse_rating_fields(fields: &[&str]) -> Option<Rating> {
    if fields.len() != 4 {
        return None;
    }
    Some(Rating {
        user_id: fields[0].trim().parse().ok()?,
        movie_id: fields[1].trim().parse().ok()?,
        rating: fields[2].trim().parse().ok()?,
        timestamp: fields[3].trim().parse().ok()?,
    })
}

fn parse_ratings_csv(content: &str, path: &Path) -> Result<Vec<Rating>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut ratings = Vec::new();
    let mut skipped = 0usize;

    for (idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(source) => {
                return Err(DataError::Csv {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        match record.deserialize::<RawRating>(None) {
            Ok(raw) => ratings.push(Rating {
                user_id: raw.user_id,
                movie_id: raw.movie_id,
                rating: raw.rating,
                timestamp: raw.timestamp,
            }),
            // First record is allowed to be a header row.
            Err(_) if idx == 0 => continue,
            Err(_) => {
                skipped += 1;
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    "skipping malformed rating row"
                );
            }
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "ratings rows skipped");
    }
    Ok(ratings)
}

/// Parse the movies table from `path`.
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let content = read_latin1(path)?;

    let movies = if is_dat_format(&content) {
        parse_movies_dat(&content, path)
    } else {
        parse_movies_csv(&content, path)?
    };

    if movies.is_empty() {
        return Err(DataError::NoRows {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), rows = movies.len(), "parsed movies");
    Ok(movies)
}

fn parse_movies_dat(content: &str, path: &Path) -> Vec<Movie> {
    let mut movies = Vec::new();
    let mut skipped = 0usize;

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split("::").collect();
        let parsed = match fields.as_slice() {
            [id, title, genres] => id.trim().parse().ok().map(|id| Movie {
                id,
                title: title.to_string(),
                year: extract_year_from_title(title),
                genres: split_genres(genres),
            }),
            _ => None,
        };
        match parsed {
            Some(movie) => movies.push(movie),
            None => {
                skipped += 1;
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    "skipping malformed movie row"
                );
            }
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "movie rows skipped");
    }
    movies
}

fn parse_movies_csv(content: &str, path: &Path) -> Result<Vec<Movie>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut movies = Vec::new();
    let mut skipped = 0usize;

    for (idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(source) => {
                return Err(DataError::Csv {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        match record.deserialize::<RawMovie>(None) {
            Ok(raw) => movies.push(Movie {
                id: raw.id,
                year: extract_year_from_title(&raw.title),
                genres: split_genres(&raw.genres),
                title: raw.title,
            }),
            Err(_) if idx == 0 => continue,
            Err(_) => {
                skipped += 1;
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    "skipping malformed movie row"
                );
            }
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "movie rows skipped");
    }
    Ok(movies)
}

/// Extract year from a movie title.
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        if let Ok(year) = title[start + 1..end].parse::<u16>() {
            return Some(year);
        }
    }
    None
}

/// Split a pipe-delimited genre field into tags.
///
/// An empty field or the "(no genres listed)" placeholder yields an empty
/// set; the movie row itself is still kept.
fn split_genres(field: &str) -> Vec<String> {
    let field = field.trim();
    if field.is_empty() || field == NO_GENRES {
        return Vec::new();
    }
    field
        .split('|')
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year_from_title("Toy Story (1995)"), Some(1995));
        assert_eq!(extract_year_from_title("Movie Title"), None);
    }

    #[test]
    fn test_split_genres() {
        assert_eq!(
            split_genres("Comedy|Drama"),
            vec!["Comedy".to_string(), "Drama".to_string()]
        );
        assert!(split_genres("(no genres listed)").is_empty());
        assert!(split_genres("").is_empty());
    }

    #[test]
    fn test_parse_ratings_dat_format() {
        let path = write_temp(
            "lens_eval_ratings.dat",
            "1::1193::5::978300760\n1::661::3::978302109\n",
        );
        let ratings = parse_ratings(&path).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].user_id, 1);
        assert_eq!(ratings[0].movie_id, 1193);
        assert_eq!(ratings[0].rating, 5.0);
    }

    #[test]
    fn test_parse_ratings_csv_with_header() {
        let path = write_temp(
            "lens_eval_ratings.csv",
            "userId,movieId,rating,timestamp\n1,31,2.5,1260759144\n7,31,3.0,851868750\n",
        );
        let ratings = parse_ratings(&path).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[1].user_id, 7);
        assert_eq!(ratings[1].rating, 3.0);
    }

    #[test]
    fn test_malformed_rating_rows_are_skipped() {
        let path = write_temp(
            "lens_eval_ratings_bad.dat",
            "1::1193::5::978300760\nnot-a-row\n2::abc::4::978300000\n3::50::4::978301000\n",
        );
        let ratings = parse_ratings(&path).unwrap();
        assert_eq!(ratings.len(), 2);
    }

    #[test]
    fn test_all_rows_malformed_is_an_error() {
        let path = write_temp("lens_eval_ratings_empty.dat", "garbage::row\n");
        assert!(matches!(
            parse_ratings(&path),
            Err(DataError::NoRows { .. })
        ));
    }

    #[test]
    fn test_parse_movies_csv_quoted_title() {
        let path = write_temp(
            "lens_eval_movies.csv",
            "movieId,title,genres\n11,\"American President, The (1995)\",Comedy|Drama|Romance\n",
        );
        let movies = parse_movies(&path).unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "American President, The (1995)");
        assert_eq!(movies[0].year, Some(1995));
        assert_eq!(movies[0].genres.len(), 3);
    }

    #[test]
    fn test_parse_movies_dat_format() {
        let path = write_temp(
            "lens_eval_movies.dat",
            "1::Toy Story (1995)::Animation|Children's|Comedy\n2::Jumanji (1995)::Adventure|Children's|Fantasy\n",
        );
        let movies = parse_movies(&path).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].genres[0], "Animation");
        assert_eq!(movies[1].year, Some(1995));
    }
}
