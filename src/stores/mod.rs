//! Collaborator contracts for the recommendation core.
//!
//! The engine touches the outside world only through these two traits: a
//! supplier of the full rating set and a store for persisted recommendation
//! records. Account management, catalog CRUD and schema migrations live with
//! the implementations, not here.

use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::{MovieId, Rating, RecommendationRecord, UserId};

pub mod postgres;

pub use postgres::PgRatingSource;
pub use postgres::PgRecommendationStore;

/// Supplier of rating facts
///
/// A refresh pass reads the full set every time; no filtering or pagination
/// contract is assumed.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingSource: Send + Sync {
    /// Returns every rating fact currently known, in no particular order.
    async fn fetch_all(&self) -> AppResult<Vec<Rating>>;
}

/// Store for persisted recommendation records
///
/// Each write is committed before the call returns, so a pass interrupted
/// mid-user leaves a durable, invariant-preserving state.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Active records for one user, oldest first.
    async fn active_for_user(&self, user_id: UserId) -> AppResult<Vec<RecommendationRecord>>;

    /// Inserts a new active record with `interacted = 0`.
    async fn insert_active(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        recommended_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Flips one record to inactive. Records are never physically deleted.
    async fn deactivate(&self, id: i32) -> AppResult<()>;
}
