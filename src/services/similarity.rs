use ndarray::Array2;

use crate::services::matrix::RatingMatrix;

/// Norms below this are treated as zero vectors
const NORM_EPSILON: f64 = 1e-12;

/// Symmetric user-by-user cosine similarity table.
///
/// Recomputed wholesale on every refresh pass; never updated incrementally.
/// Indices are matrix row positions, not user ids.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityTable {
    values: Array2<f64>,
}

impl SimilarityTable {
    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.values[[a, b]]
    }

    pub fn user_count(&self) -> usize {
        self.values.nrows()
    }
}

/// Computes pairwise cosine similarity between all user row vectors.
///
/// sim(u, v) = (u . v) / (||u|| * ||v||), with sim = 0 whenever either norm
/// is (numerically) zero. Results are clamped to [-1, 1] to absorb floating
/// point drift. O(n^2 * m): intended for batch recomputation, not for
/// per-request use.
pub fn user_similarity(matrix: &RatingMatrix) -> SimilarityTable {
    let n = matrix.user_count();

    let norms: Vec<f64> = (0..n)
        .map(|i| matrix.row(i).dot(&matrix.row(i)).sqrt())
        .collect();

    let mut values = Array2::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let sim = if norms[i] < NORM_EPSILON || norms[j] < NORM_EPSILON {
                0.0
            } else {
                (matrix.row(i).dot(&matrix.row(j)) / (norms[i] * norms[j])).clamp(-1.0, 1.0)
            };
            values[[i, j]] = sim;
            values[[j, i]] = sim;
        }
    }

    SimilarityTable { values }
}
