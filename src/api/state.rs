use std::sync::Arc;

use crate::db::redis::Cache;
use crate::stores::{RatingSource, RecommendationStore};

/// Shared application state
///
/// Handlers reach the outside world only through the two store contracts, so
/// tests can swap in whatever implementations they like. The cache is
/// optional; without one the fallback path computes directly.
#[derive(Clone)]
pub struct AppState {
    pub ratings: Arc<dyn RatingSource>,
    pub recommendations: Arc<dyn RecommendationStore>,
    pub cache: Option<Cache>,
}

impl AppState {
    pub fn new(
        ratings: Arc<dyn RatingSource>,
        recommendations: Arc<dyn RecommendationStore>,
        cache: Option<Cache>,
    ) -> Self {
        Self {
            ratings,
            recommendations,
            cache,
        }
    }
}
