use std::collections::BTreeMap;

use crate::models::{MovieId, Rating, TopMovie};

/// Length of the global top-rated list served to cold-start users
pub const FALLBACK_LIMIT: usize = 10;

/// Ranks all movies by mean rating, best first.
///
/// Independent of the similarity pipeline: this is the cold-start path for
/// users with no active recommendations. The BTreeMap iteration plus a stable
/// sort breaks mean-rating ties by ascending movie id.
pub fn top_rated(ratings: &[Rating], limit: usize) -> Vec<TopMovie> {
    let mut totals: BTreeMap<MovieId, (f64, usize)> = BTreeMap::new();
    for rating in ratings {
        let entry = totals.entry(rating.movie_id).or_insert((0.0, 0));
        entry.0 += rating.rating;
        entry.1 += 1;
    }

    let mut ranked: Vec<TopMovie> = totals
        .into_iter()
        .map(|(movie_id, (sum, count))| TopMovie {
            movie_id,
            mean_rating: sum / count as f64,
        })
        .collect();
    ranked.sort_by(|a, b| b.mean_rating.total_cmp(&a.mean_rating));
    ranked.truncate(limit);

    ranked
}
