use crate::models::{MovieId, UserId};
use crate::services::matrix::RatingMatrix;
use crate::services::similarity::SimilarityTable;

/// Maximum number of candidates produced per user in one pass
pub const MAX_CANDIDATES: usize = 20;

/// Ranked, unseen-movie candidates for one user. Ephemeral: exists only
/// between the ranking pass and the lifecycle merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList {
    pub user_id: UserId,
    pub movies: Vec<MovieId>,
}

/// Produces a candidate list for every user in the matrix, in row order.
pub fn rank_all(matrix: &RatingMatrix, similarity: &SimilarityTable) -> Vec<CandidateList> {
    (0..matrix.user_count())
        .map(|target| rank_for_user(matrix, similarity, target))
        .collect()
}

/// Aggregates similarity-weighted ratings from all other users, restricted to
/// movies the target has not rated.
///
/// Contributions are accumulated from the most similar user down; the sorts
/// are stable over the matrix orderings, so equal similarities keep row order
/// and equal scores keep column order. Movies the target rated never appear,
/// and candidates with no positive weight are dropped, so a user who has
/// rated everything (or has no signal) gets an empty list.
fn rank_for_user(
    matrix: &RatingMatrix,
    similarity: &SimilarityTable,
    target: usize,
) -> CandidateList {
    let user_id = matrix.users()[target];

    let mut others: Vec<usize> = (0..matrix.user_count()).filter(|&v| v != target).collect();
    others.sort_by(|&a, &b| {
        similarity
            .get(target, b)
            .total_cmp(&similarity.get(target, a))
    });

    let watched = matrix.rated_columns(target);

    let mut weighted = vec![0.0_f64; matrix.movie_count()];
    for &other in &others {
        let sim = similarity.get(target, other);
        if sim == 0.0 {
            continue;
        }
        let row = matrix.row(other);
        for (col, &value) in row.iter().enumerate() {
            if !watched.contains(&col) {
                weighted[col] += value * sim;
            }
        }
    }

    let mut candidates: Vec<usize> = (0..matrix.movie_count())
        .filter(|col| !watched.contains(col) && weighted[*col] > 0.0)
        .collect();
    candidates.sort_by(|&a, &b| weighted[b].total_cmp(&weighted[a]));
    candidates.truncate(MAX_CANDIDATES);

    CandidateList {
        user_id,
        movies: candidates.into_iter().map(|col| matrix.movies()[col]).collect(),
    }
}
