use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cached;
use crate::db::redis::{Cache, CacheKey};
use crate::error::{AppError, AppResult};
use crate::models::{MovieId, TopMovie, UserId};
use crate::services::lifecycle;
use crate::services::matrix::RatingMatrix;
use crate::services::ranker;
use crate::services::similarity;
use crate::services::top_rated::{self, FALLBACK_LIMIT};
use crate::stores::{RatingSource, RecommendationStore};

/// Maximum number of entries in one serving response
pub const SERVE_LIMIT: usize = 10;

/// Cache TTL for the global top-rated fallback, in seconds
const TOP_RATED_CACHE_TTL: u64 = 300;

/// Counters from one full refresh pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub users_processed: usize,
    pub users_updated: usize,
    pub users_failed: usize,
}

/// One entry in a serving response.
///
/// `rating` is display data: the user's own score for an actively recommended
/// movie (usually absent, since recommendations are unseen by construction),
/// or the global mean on the fallback path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedMovie {
    pub movie_id: MovieId,
    pub rating: Option<f64>,
    pub recommended_at: Option<DateTime<Utc>>,
}

/// A user's recommendation list as served to the HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub movies: Vec<RecommendedMovie>,
    /// True when the list came from the cold-start fallback
    pub is_new_user: bool,
}

/// Runs the full batch pass: matrix, similarity, ranking, lifecycle merge.
///
/// One user's store failure is logged and counted; the remaining users still
/// get their merge. Already-committed writes stay durable either way, and a
/// retry skips them via the duplicate check, so re-running is always safe.
pub async fn refresh_recommendations(
    ratings: &dyn RatingSource,
    store: &dyn RecommendationStore,
) -> AppResult<RefreshOutcome> {
    let facts = ratings.fetch_all().await?;
    let matrix = RatingMatrix::from_ratings(&facts)?;
    if matrix.is_empty() {
        tracing::info!("No ratings available, nothing to refresh");
        return Ok(RefreshOutcome::default());
    }

    tracing::info!(
        users = matrix.user_count(),
        movies = matrix.movie_count(),
        "Starting recommendation refresh"
    );

    let similarity = similarity::user_similarity(&matrix);
    let candidates = ranker::rank_all(&matrix, &similarity);

    let now = Utc::now();
    let mut outcome = RefreshOutcome::default();
    for list in &candidates {
        outcome.users_processed += 1;
        match lifecycle::merge_candidates(store, list, now).await {
            Ok(merge) if merge.inserted > 0 => outcome.users_updated += 1,
            Ok(_) => {}
            Err(error) => {
                tracing::error!(
                    user_id = list.user_id,
                    error = %error,
                    "Recommendation merge failed, continuing with remaining users"
                );
                outcome.users_failed += 1;
            }
        }
    }

    tracing::info!(
        users_processed = outcome.users_processed,
        users_updated = outcome.users_updated,
        users_failed = outcome.users_failed,
        "Recommendation refresh completed"
    );

    Ok(outcome)
}

/// Serves one user's recommendation list.
///
/// Active records win, oldest first, capped at [`SERVE_LIMIT`]. A user with
/// no active records gets the global top-rated fallback instead, flagged
/// `is_new_user`.
pub async fn recommend(
    ratings: &dyn RatingSource,
    store: &dyn RecommendationStore,
    cache: Option<&Cache>,
    user_id: UserId,
) -> AppResult<Recommendations> {
    let active = store.active_for_user(user_id).await?;

    if !active.is_empty() {
        let own_ratings: HashMap<MovieId, f64> = ratings
            .fetch_all()
            .await?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| (r.movie_id, r.rating))
            .collect();

        let movies = active
            .iter()
            .take(SERVE_LIMIT)
            .map(|record| RecommendedMovie {
                movie_id: record.movie_id,
                rating: own_ratings.get(&record.movie_id).copied(),
                recommended_at: Some(record.recommended_at),
            })
            .collect();

        return Ok(Recommendations {
            movies,
            is_new_user: false,
        });
    }

    tracing::debug!(user_id, "No active recommendations, serving fallback");

    let movies = fallback_top_rated(ratings, cache)
        .await?
        .into_iter()
        .map(|movie| RecommendedMovie {
            movie_id: movie.movie_id,
            rating: Some(movie.mean_rating),
            recommended_at: None,
        })
        .collect();

    Ok(Recommendations {
        movies,
        is_new_user: true,
    })
}

/// Global top-rated ranking, read through the cache when one is configured
async fn fallback_top_rated(
    ratings: &dyn RatingSource,
    cache: Option<&Cache>,
) -> AppResult<Vec<TopMovie>> {
    match cache {
        Some(cache) => {
            let key = CacheKey::TopRated(FALLBACK_LIMIT);
            cached!(cache, key, TOP_RATED_CACHE_TTL, async {
                Ok::<_, AppError>(top_rated::top_rated(
                    &ratings.fetch_all().await?,
                    FALLBACK_LIMIT,
                ))
            })
        }
        None => Ok(top_rated::top_rated(
            &ratings.fetch_all().await?,
            FALLBACK_LIMIT,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rating, RecommendationRecord};
    use crate::stores::{MockRatingSource, MockRecommendationStore};
    use chrono::Duration;
    use mockall::predicate::eq;

    fn rating(user_id: i32, movie_id: i32, rating: f64) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating,
        }
    }

    fn record(id: i32, user_id: i32, movie_id: i32, age_minutes: i64) -> RecommendationRecord {
        RecommendationRecord {
            id,
            user_id,
            movie_id,
            recommended_at: Utc::now() - Duration::minutes(age_minutes),
            interacted: 0,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_refresh_with_empty_rating_set_is_a_no_op() {
        let mut ratings = MockRatingSource::new();
        ratings.expect_fetch_all().returning(|| Ok(vec![]));

        let mut store = MockRecommendationStore::new();
        store.expect_active_for_user().times(0);
        store.expect_insert_active().times(0);

        let outcome = refresh_recommendations(&ratings, &store).await.unwrap();

        assert_eq!(outcome, RefreshOutcome::default());
    }

    #[tokio::test]
    async fn test_refresh_inserts_for_users_with_candidates() {
        // User 1 has not seen movie 3; user 2 has seen everything.
        let mut ratings = MockRatingSource::new();
        ratings.expect_fetch_all().returning(|| {
            Ok(vec![
                rating(1, 1, 5.0),
                rating(1, 2, 1.0),
                rating(2, 1, 4.0),
                rating(2, 3, 5.0),
                rating(2, 2, 2.0),
            ])
        });

        let mut store = MockRecommendationStore::new();
        store.expect_active_for_user().returning(|_| Ok(vec![]));
        store
            .expect_insert_active()
            .with(eq(1), eq(3), mockall::predicate::always())
            .times(1)
            .returning(|_, _, _| Ok(()));

        let outcome = refresh_recommendations(&ratings, &store).await.unwrap();

        assert_eq!(
            outcome,
            RefreshOutcome {
                users_processed: 2,
                users_updated: 1,
                users_failed: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_refresh_isolates_per_user_store_failures() {
        let mut ratings = MockRatingSource::new();
        ratings.expect_fetch_all().returning(|| {
            Ok(vec![
                rating(1, 1, 5.0),
                rating(2, 1, 4.0),
                rating(2, 2, 5.0),
                rating(3, 1, 5.0),
                rating(3, 3, 4.0),
            ])
        });

        let mut store = MockRecommendationStore::new();
        store
            .expect_active_for_user()
            .with(eq(1))
            .returning(|_| Err(AppError::Internal("store unavailable".to_string())));
        store
            .expect_active_for_user()
            .withf(|&user_id| user_id != 1)
            .returning(|_| Ok(vec![]));
        store.expect_insert_active().returning(|_, _, _| Ok(()));

        let outcome = refresh_recommendations(&ratings, &store).await.unwrap();

        assert_eq!(outcome.users_processed, 3);
        assert_eq!(outcome.users_failed, 1);
        assert_eq!(outcome.users_updated, 2);
    }

    #[tokio::test]
    async fn test_recommend_serves_active_records_with_own_ratings() {
        let mut ratings = MockRatingSource::new();
        ratings
            .expect_fetch_all()
            .returning(|| Ok(vec![rating(1, 10, 4.5), rating(2, 20, 3.0)]));

        let mut store = MockRecommendationStore::new();
        store
            .expect_active_for_user()
            .with(eq(1))
            .returning(|_| Ok(vec![record(1, 1, 10, 60), record(2, 1, 20, 30)]));

        let result = recommend(&ratings, &store, None, 1).await.unwrap();

        assert!(!result.is_new_user);
        assert_eq!(result.movies.len(), 2);
        assert_eq!(result.movies[0].movie_id, 10);
        assert_eq!(result.movies[0].rating, Some(4.5));
        assert_eq!(result.movies[1].movie_id, 20);
        assert_eq!(result.movies[1].rating, None);
    }

    #[tokio::test]
    async fn test_recommend_caps_serving_at_limit() {
        let mut ratings = MockRatingSource::new();
        ratings.expect_fetch_all().returning(|| Ok(vec![]));

        let mut store = MockRecommendationStore::new();
        store.expect_active_for_user().returning(|_| {
            Ok((1..=15).map(|i| record(i, 1, 100 + i, (16 - i) as i64)).collect())
        });

        let result = recommend(&ratings, &store, None, 1).await.unwrap();

        assert_eq!(result.movies.len(), SERVE_LIMIT);
        // Oldest first.
        assert_eq!(result.movies[0].movie_id, 101);
    }

    #[tokio::test]
    async fn test_recommend_falls_back_to_top_rated_for_cold_start() {
        let mut ratings = MockRatingSource::new();
        ratings.expect_fetch_all().returning(|| {
            Ok(vec![
                rating(1, 1, 5.0),
                rating(2, 1, 4.0),
                rating(1, 2, 2.0),
            ])
        });

        let mut store = MockRecommendationStore::new();
        store.expect_active_for_user().returning(|_| Ok(vec![]));

        let result = recommend(&ratings, &store, None, 42).await.unwrap();

        assert!(result.is_new_user);
        assert_eq!(result.movies.len(), 2);
        assert_eq!(result.movies[0].movie_id, 1);
        assert_eq!(result.movies[0].rating, Some(4.5));
        assert_eq!(result.movies[1].movie_id, 2);
    }

    #[tokio::test]
    async fn test_recommend_with_empty_store_and_no_ratings() {
        let mut ratings = MockRatingSource::new();
        ratings.expect_fetch_all().returning(|| Ok(vec![]));

        let mut store = MockRecommendationStore::new();
        store.expect_active_for_user().returning(|_| Ok(vec![]));

        let result = recommend(&ratings, &store, None, 7).await.unwrap();

        assert!(result.is_new_user);
        assert!(result.movies.is_empty());
    }
}
