//! The practice core as seen by its callers.
//!
//! Every operation takes the store lock once and runs to completion under
//! it: the judge → ledger → tracker chain of an attempt and the
//! delete-then-insert of paper regeneration are never interleaved with
//! another request.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::error_tracker;
use crate::judge::judge;
use crate::ledger;
use crate::model::{
    ActiveError, PracticeAttempt, PracticeSettings, SettingsUpdate, TestPaper, TestPaperId, Unit,
    UnitId, UserProgress, Word, WordId,
};
use crate::papers::{self, PredefinedPapers};
use crate::store::MemStore;

pub const DEFAULT_RANDOM_WORDS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    pub is_correct: bool,
    pub correct_spelling: String,
    pub attempt: PracticeAttempt,
    pub progress: UserProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellCheck {
    pub is_correct: bool,
    pub correct_spelling: String,
    pub user_spelling: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_words: u32,
    pub mastered_words: u32,
    pub error_words: usize,
    /// Rounded percentage of correct attempts.
    pub overall_accuracy: u32,
}

pub struct PracticeService {
    store: Mutex<MemStore>,
    predefined: PredefinedPapers,
}

impl PracticeService {
    pub fn new(store: MemStore, predefined: PredefinedPapers) -> Self {
        Self {
            store: Mutex::new(store),
            predefined,
        }
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, MemStore>> {
        self.store
            .lock()
            .map_err(|_| CoreError::Storage("store lock poisoned".into()))
    }

    // === attempts ===

    /// Judges the submission, appends it to the attempt log, then updates
    /// the unit's progress and the word's error record.
    pub fn submit_attempt(
        &self,
        word_id: WordId,
        user_id: &str,
        submitted: &str,
    ) -> CoreResult<AttemptOutcome> {
        if submitted.trim().is_empty() {
            return Err(CoreError::InvalidArgument("userSpelling is empty".into()));
        }
        let mut store = self.lock()?;
        let word = store
            .word(word_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("word", word_id))?;

        let verdict = judge(&word.word, submitted);
        let now = Utc::now();
        let attempt = PracticeAttempt {
            id: Uuid::new_v4(),
            word_id,
            user_id: user_id.to_string(),
            user_spelling: submitted.to_string(),
            is_correct: verdict.is_correct,
            attempted_at: now,
        };
        store.append_attempt(attempt.clone());

        let progress = ledger::record_attempt(
            &mut store,
            word.unit_id,
            user_id,
            word_id,
            verdict.is_correct,
            now,
        );
        error_tracker::on_attempt(
            &mut store,
            word_id,
            user_id,
            submitted,
            verdict.is_correct,
            now,
        );

        info!(
            %word_id,
            user_id,
            correct = verdict.is_correct,
            "attempt recorded"
        );
        Ok(AttemptOutcome {
            is_correct: verdict.is_correct,
            correct_spelling: word.word,
            attempt,
            progress,
        })
    }

    /// Judges a spelling without recording anything.
    pub fn check_spelling(&self, word_id: WordId, submitted: &str) -> CoreResult<SpellCheck> {
        let store = self.lock()?;
        let word = store
            .word(word_id)
            .ok_or_else(|| CoreError::not_found("word", word_id))?;
        let verdict = judge(&word.word, submitted);
        Ok(SpellCheck {
            is_correct: verdict.is_correct,
            correct_spelling: word.word.clone(),
            user_spelling: submitted.trim().to_string(),
        })
    }

    /// Attempts of one user at one word, in submission order.
    pub fn attempts_for(&self, word_id: WordId, user_id: &str) -> CoreResult<Vec<PracticeAttempt>> {
        let store = self.lock()?;
        if store.word(word_id).is_none() {
            return Err(CoreError::not_found("word", word_id));
        }
        Ok(store
            .attempts_for(word_id, user_id)
            .into_iter()
            .cloned()
            .collect())
    }

    // === errors & progress ===

    pub fn list_active_errors(&self, user_id: &str) -> CoreResult<Vec<ActiveError>> {
        let store = self.lock()?;
        Ok(error_tracker::list_active_errors(&store, user_id))
    }

    pub fn get_progress(&self, unit_id: UnitId, user_id: &str) -> CoreResult<Option<UserProgress>> {
        let store = self.lock()?;
        Ok(store.progress(unit_id, user_id).cloned())
    }

    pub fn list_all_progress(&self, user_id: &str) -> CoreResult<Vec<UserProgress>> {
        let store = self.lock()?;
        Ok(store.progress_for_user(user_id).to_vec())
    }

    pub fn stats(&self, user_id: &str) -> CoreResult<Stats> {
        let store = self.lock()?;
        let total_words: u32 = store.units().iter().map(|u| u.word_count).sum();
        let progress = store.progress_for_user(user_id);
        let mastered_words: u32 = progress.iter().map(|p| p.completed_words).sum();
        let total: u64 = progress.iter().map(|p| u64::from(p.total_attempts)).sum();
        let correct: u64 = progress.iter().map(|p| u64::from(p.correct_attempts)).sum();
        let overall_accuracy = if total == 0 {
            0
        } else {
            ((correct as f64 / total as f64) * 100.0).round() as u32
        };
        Ok(Stats {
            total_words,
            mastered_words,
            error_words: error_tracker::list_active_errors(&store, user_id).len(),
            overall_accuracy,
        })
    }

    // === test papers ===

    pub fn generate_test_papers(
        &self,
        unit_id: UnitId,
        words_per_paper: Option<i64>,
        use_predefined: bool,
    ) -> CoreResult<Vec<TestPaper>> {
        let mut store = self.lock()?;
        let now = Utc::now();
        let papers = if use_predefined {
            papers::generate_predefined(&mut store, unit_id, &self.predefined, now)?
        } else {
            let size = words_per_paper.ok_or_else(|| {
                CoreError::InvalidArgument("wordsPerPaper is required".into())
            })?;
            papers::generate(&mut store, unit_id, size, now)?
        };
        info!(%unit_id, papers = papers.len(), use_predefined, "test papers generated");
        Ok(papers)
    }

    pub fn list_test_papers(&self, unit_id: UnitId) -> CoreResult<Vec<TestPaper>> {
        let store = self.lock()?;
        if store.unit(unit_id).is_none() {
            return Err(CoreError::not_found("unit", unit_id));
        }
        Ok(store.papers_for_unit(unit_id).into_iter().cloned().collect())
    }

    /// Words of a paper in paper order. Ids no longer in the catalogue are
    /// skipped.
    pub fn get_test_paper_words(&self, paper_id: TestPaperId) -> CoreResult<Vec<Word>> {
        let store = self.lock()?;
        let paper = store
            .test_paper(paper_id)
            .ok_or_else(|| CoreError::not_found("test paper", paper_id))?;
        Ok(paper
            .word_ids
            .iter()
            .filter_map(|id| store.word(*id).cloned())
            .collect())
    }

    // === catalogue ===

    pub fn list_units(&self) -> CoreResult<Vec<Unit>> {
        let store = self.lock()?;
        Ok(store.units().into_iter().cloned().collect())
    }

    pub fn get_unit(&self, unit_id: UnitId) -> CoreResult<Unit> {
        let store = self.lock()?;
        store
            .unit(unit_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("unit", unit_id))
    }

    pub fn unit_words(&self, unit_id: UnitId) -> CoreResult<Vec<Word>> {
        let store = self.lock()?;
        if store.unit(unit_id).is_none() {
            return Err(CoreError::not_found("unit", unit_id));
        }
        Ok(store.words_in_unit(unit_id).into_iter().cloned().collect())
    }

    pub fn random_words(&self, count: usize, exclude_units: &[UnitId]) -> CoreResult<Vec<Word>> {
        let store = self.lock()?;
        let mut pool: Vec<Word> = store
            .all_words()
            .filter(|w| !exclude_units.contains(&w.unit_id))
            .cloned()
            .collect();
        drop(store);
        pool.shuffle(&mut rand::thread_rng());
        pool.truncate(count);
        Ok(pool)
    }

    // === settings ===

    pub fn settings(&self, user_id: &str) -> CoreResult<PracticeSettings> {
        let store = self.lock()?;
        Ok(store.settings(user_id).cloned().unwrap_or_default())
    }

    pub fn update_settings(
        &self,
        user_id: &str,
        update: SettingsUpdate,
    ) -> CoreResult<PracticeSettings> {
        let mut store = self.lock()?;
        let merged = store
            .settings(user_id)
            .cloned()
            .unwrap_or_default()
            .merge(update);
        store.put_settings(user_id, merged.clone());
        Ok(merged)
    }
}
