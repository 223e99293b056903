use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::MovieId;
use crate::services::ranker::CandidateList;
use crate::stores::RecommendationStore;

/// Maximum number of active recommendation records per user
pub const MAX_ACTIVE: usize = 20;

/// What one user's merge changed in the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub inserted: usize,
    pub deactivated: usize,
}

/// Merges ranked candidates into one user's persisted active set.
///
/// Candidates are processed in list order. A movie that already has an active
/// record is skipped, so re-running a pass with unchanged ratings inserts
/// nothing. Each insertion is committed before the next candidate is
/// considered; whenever the active count exceeds [`MAX_ACTIVE`], the oldest
/// still-active pre-existing records are deactivated until it no longer does.
/// Records inserted during this run are never evicted by it.
///
/// The caller owns this user's record set for the duration of the merge;
/// concurrent passes for the same user are not supported.
pub async fn merge_candidates(
    store: &dyn RecommendationStore,
    candidates: &CandidateList,
    now: DateTime<Utc>,
) -> AppResult<MergeOutcome> {
    let existing = store.active_for_user(candidates.user_id).await?;

    let mut active_movies: HashSet<MovieId> = existing.iter().map(|r| r.movie_id).collect();
    // Oldest first, pre-existing records only: the eviction pool.
    let mut evictable: VecDeque<i32> = existing.iter().map(|r| r.id).collect();
    let mut outcome = MergeOutcome::default();

    for &movie_id in &candidates.movies {
        if active_movies.contains(&movie_id) {
            continue;
        }

        store
            .insert_active(candidates.user_id, movie_id, now)
            .await?;
        active_movies.insert(movie_id);
        outcome.inserted += 1;

        while evictable.len() + outcome.inserted > MAX_ACTIVE {
            let Some(oldest) = evictable.pop_front() else {
                break;
            };
            store.deactivate(oldest).await?;
            outcome.deactivated += 1;
        }
    }

    if outcome.inserted > 0 || outcome.deactivated > 0 {
        tracing::debug!(
            user_id = candidates.user_id,
            inserted = outcome.inserted,
            deactivated = outcome.deactivated,
            "Merged recommendation candidates"
        );
    }

    Ok(outcome)
}
