//! Per-unit progress counters.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::{UnitId, UserProgress, WordId};
use crate::store::MemStore;

/// Applies one attempt to the (unit, user) progress row and returns the
/// updated row.
///
/// `completed_words` moves only on the user's first correct attempt at the
/// word. The solved flag is tested and set before the row is written, so the
/// current attempt never counts as its own predecessor.
pub fn record_attempt(
    store: &mut MemStore,
    unit_id: UnitId,
    user_id: &str,
    word_id: WordId,
    is_correct: bool,
    now: DateTime<Utc>,
) -> UserProgress {
    let mut progress = store
        .progress(unit_id, user_id)
        .cloned()
        .unwrap_or_else(|| UserProgress::empty(unit_id, user_id));

    progress.total_attempts = progress.total_attempts.saturating_add(1);
    progress.last_practiced_at = Some(now);
    if is_correct {
        progress.correct_attempts = progress.correct_attempts.saturating_add(1);
        if store.mark_solved(word_id, user_id) {
            progress.completed_words = progress.completed_words.saturating_add(1);
            debug!(%unit_id, %word_id, user_id, "word completed");
        }
    }

    store.put_progress(progress.clone());
    progress
}
