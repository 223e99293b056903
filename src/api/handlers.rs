use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::models::UserId;
use crate::services::recommender::{self, Recommendations, RefreshOutcome};

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Serves a user's recommendation list
///
/// Active records if the user has any, the global top-rated fallback
/// otherwise.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<Recommendations>> {
    let recommendations = recommender::recommend(
        state.ratings.as_ref(),
        state.recommendations.as_ref(),
        state.cache.as_ref(),
        user_id,
    )
    .await?;

    Ok(Json(recommendations))
}

/// Triggers a full recommendation refresh pass
///
/// Intended for an external scheduler or an admin action, not for
/// per-request use.
pub async fn update_recommendations(
    State(state): State<AppState>,
) -> AppResult<Json<RefreshOutcome>> {
    tracing::info!("Recommendation refresh requested");

    let outcome = recommender::refresh_recommendations(
        state.ratings.as_ref(),
        state.recommendations.as_ref(),
    )
    .await?;

    Ok(Json(outcome))
}
