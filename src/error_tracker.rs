//! Open-error lifecycle per (word, user).
//!
//! A wrong attempt opens an error row or bumps the open one; a correct
//! attempt resolves it. Resolved rows stay in the store for history but
//! never show up in [`list_active_errors`].

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::model::{ActiveError, ErrorWord, WordId};
use crate::store::MemStore;

pub fn on_attempt(
    store: &mut MemStore,
    word_id: WordId,
    user_id: &str,
    submitted: &str,
    is_correct: bool,
    now: DateTime<Utc>,
) {
    if is_correct {
        if let Some(resolved) = store.resolve_open_error(word_id, user_id) {
            debug!(%word_id, user_id, attempts = resolved.attempt_count, "error resolved");
        }
        return;
    }

    if let Some(open) = store.open_error_mut(word_id, user_id) {
        open.attempt_count = open.attempt_count.saturating_add(1);
        open.user_spelling = submitted.to_string();
        open.last_attempted_at = now;
        debug!(%word_id, user_id, attempts = open.attempt_count, "error repeated");
        return;
    }

    store.insert_open_error(ErrorWord {
        id: Uuid::new_v4(),
        word_id,
        user_id: user_id.to_string(),
        user_spelling: submitted.to_string(),
        attempt_count: 1,
        last_attempted_at: now,
        resolved: false,
    });
    debug!(%word_id, user_id, "error opened");
}

/// Unresolved errors of the user joined with their words, in creation order.
/// Rows whose word is gone from the catalogue are skipped.
pub fn list_active_errors(store: &MemStore, user_id: &str) -> Vec<ActiveError> {
    store
        .error_words_for_user(user_id)
        .into_iter()
        .filter(|e| !e.resolved)
        .filter_map(|e| match store.word(e.word_id) {
            Some(word) => Some(ActiveError {
                error_word: e.clone(),
                word: word.clone(),
            }),
            None => {
                warn!(word_id = %e.word_id, user_id, "skipping error for missing word");
                None
            }
        })
        .collect()
}
