use std::collections::{BTreeSet, HashMap, HashSet};

use ndarray::{Array2, ArrayView1};

use crate::error::{AppError, AppResult};
use crate::models::{MovieId, Rating, UserId};

/// Dense user-by-movie rating matrix.
///
/// Rows are the distinct users observed in the input ratings, columns the
/// distinct movies, both in ascending identifier order so every downstream
/// stage sees the same layout for the same input. Pairs without a rating are
/// filled with 0.0, so for similarity purposes an unrated movie is
/// indistinguishable from a movie rated zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    users: Vec<UserId>,
    movies: Vec<MovieId>,
    values: Array2<f64>,
}

impl RatingMatrix {
    /// Builds the matrix from an unordered collection of rating facts.
    ///
    /// An empty input yields a 0x0 matrix. Non-finite scores are rejected;
    /// everything else is assumed well-formed per the rating store's
    /// ingestion rules.
    pub fn from_ratings(ratings: &[Rating]) -> AppResult<Self> {
        for rating in ratings {
            if !rating.rating.is_finite() {
                return Err(AppError::InvalidInput(format!(
                    "Non-finite rating for user {} movie {}",
                    rating.user_id, rating.movie_id
                )));
            }
        }

        let users: Vec<UserId> = ratings
            .iter()
            .map(|r| r.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let movies: Vec<MovieId> = ratings
            .iter()
            .map(|r| r.movie_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let user_pos: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        let movie_pos: HashMap<MovieId, usize> =
            movies.iter().enumerate().map(|(i, &m)| (m, i)).collect();

        let mut values = Array2::zeros((users.len(), movies.len()));
        for rating in ratings {
            values[[user_pos[&rating.user_id], movie_pos[&rating.movie_id]]] = rating.rating;
        }

        Ok(Self {
            users,
            movies,
            values,
        })
    }

    /// True when no ratings were observed at all
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn movie_count(&self) -> usize {
        self.movies.len()
    }

    /// Row ordering: user ids ascending
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Column ordering: movie ids ascending
    pub fn movies(&self) -> &[MovieId] {
        &self.movies
    }

    /// One user's rating vector
    pub fn row(&self, user_pos: usize) -> ArrayView1<'_, f64> {
        self.values.row(user_pos)
    }

    /// Column positions the user has actually rated (non-zero entries)
    pub fn rated_columns(&self, user_pos: usize) -> HashSet<usize> {
        self.row(user_pos)
            .iter()
            .enumerate()
            .filter(|(_, &value)| value != 0.0)
            .map(|(col, _)| col)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(user_id: UserId, movie_id: MovieId, rating: f64) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating,
        }
    }

    #[test]
    fn test_dimensions_match_distinct_ids() {
        let ratings = vec![
            rating(1, 1, 5.0),
            rating(1, 2, 1.0),
            rating(2, 1, 4.0),
            rating(2, 3, 5.0),
            rating(2, 2, 2.0),
        ];

        let matrix = RatingMatrix::from_ratings(&ratings).unwrap();

        assert_eq!(matrix.user_count(), 2);
        assert_eq!(matrix.movie_count(), 3);
        assert_eq!(matrix.users(), &[1, 2]);
        assert_eq!(matrix.movies(), &[1, 2, 3]);
    }

    #[test]
    fn test_zero_fill_for_unrated_pairs() {
        let ratings = vec![rating(1, 1, 5.0), rating(2, 2, 3.0)];

        let matrix = RatingMatrix::from_ratings(&ratings).unwrap();

        assert_eq!(matrix.row(0).to_vec(), vec![5.0, 0.0]);
        assert_eq!(matrix.row(1).to_vec(), vec![0.0, 3.0]);
    }

    #[test]
    fn test_orderings_are_ascending_regardless_of_input_order() {
        let ratings = vec![
            rating(9, 30, 1.0),
            rating(3, 10, 2.0),
            rating(7, 20, 3.0),
        ];

        let matrix = RatingMatrix::from_ratings(&ratings).unwrap();

        assert_eq!(matrix.users(), &[3, 7, 9]);
        assert_eq!(matrix.movies(), &[10, 20, 30]);
    }

    #[test]
    fn test_empty_input_yields_empty_matrix() {
        let matrix = RatingMatrix::from_ratings(&[]).unwrap();

        assert!(matrix.is_empty());
        assert_eq!(matrix.user_count(), 0);
        assert_eq!(matrix.movie_count(), 0);
    }

    #[test]
    fn test_rated_columns_skips_zero_entries() {
        let ratings = vec![rating(1, 1, 5.0), rating(1, 3, 2.0), rating(2, 2, 4.0)];

        let matrix = RatingMatrix::from_ratings(&ratings).unwrap();

        let watched = matrix.rated_columns(0);
        assert!(watched.contains(&0));
        assert!(watched.contains(&2));
        assert!(!watched.contains(&1));
    }

    #[test]
    fn test_non_finite_rating_is_rejected() {
        let ratings = vec![rating(1, 1, f64::NAN)];

        let result = RatingMatrix::from_ratings(&ratings);

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
