use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identifier, assigned by the external account system
pub type UserId = i32;

/// Movie identifier, assigned by the external catalog
pub type MovieId = i32;

/// A single rating fact: one user's score for one movie.
///
/// Ratings are immutable inputs owned by the external rating store;
/// uniqueness of the (user, movie) pair is enforced there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
}

/// A persisted recommendation for one (user, movie) pair.
///
/// Records are never physically deleted; eviction flips `active` to false.
/// Per user, at most [`crate::services::lifecycle::MAX_ACTIVE`] records are
/// active at a time, and no movie appears twice among the active ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecommendationRecord {
    pub id: i32,
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub recommended_at: DateTime<Utc>,
    /// 1 once the user has interacted with the recommendation, 0 otherwise
    pub interacted: i32,
    pub active: bool,
}

/// A movie ranked by its global mean rating, served to cold-start users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMovie {
    pub movie_id: MovieId,
    pub mean_rating: f64,
}
