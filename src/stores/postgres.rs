use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{MovieId, Rating, RecommendationRecord, UserId};

use super::{RatingSource, RecommendationStore};

/// Rating supplier backed by the relational store owned by the CRUD layer
pub struct PgRatingSource {
    pool: PgPool,
}

impl PgRatingSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingSource for PgRatingSource {
    async fn fetch_all(&self) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT user_id, movie_id, rating
            FROM ratings
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }
}

/// Recommendation store backed by the `recommendations` table
pub struct PgRecommendationStore {
    pool: PgPool,
}

impl PgRecommendationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn active_for_user(&self, user_id: UserId) -> AppResult<Vec<RecommendationRecord>> {
        // Same-pass inserts share a timestamp; the id tiebreak keeps the
        // oldest-first order reproducible across restarts.
        let records = sqlx::query_as::<_, RecommendationRecord>(
            r#"
            SELECT id, user_id, movie_id, recommended_at, interacted, active
            FROM recommendations
            WHERE user_id = $1 AND active = TRUE
            ORDER BY recommended_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn insert_active(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        recommended_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO recommendations (user_id, movie_id, recommended_at, interacted, active)
            VALUES ($1, $2, $3, 0, TRUE)
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(recommended_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn deactivate(&self, id: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE recommendations
            SET active = FALSE
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
