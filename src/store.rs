//! In-memory entity store.
//!
//! Plain keyed collections with the composite indexes the core needs:
//! per-user ledgers hold progress by unit, the solved-word set and the open
//! error index, so every lookup on the attempt path is a single hash lookup.
//! The store holds no business rules; `ledger`, `error_tracker` and `papers`
//! drive it.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::model::{
    Difficulty, ErrorWord, PracticeAttempt, PracticeSettings, TestPaper, TestPaperId, Unit,
    UnitId, UserId, UserProgress, Word, WordId,
};

#[derive(Debug, Clone)]
pub struct NewUnit {
    pub number: u32,
    pub title: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone)]
pub struct NewWord {
    pub unit_id: UnitId,
    pub word: String,
    pub phonetic: Option<String>,
    pub definition: Option<String>,
}

#[derive(Debug, Default)]
struct UserLedger {
    /// First-practiced order.
    progress: Vec<UserProgress>,
    progress_index: HashMap<UnitId, usize>,
    /// Words with at least one correct attempt.
    solved: HashSet<WordId>,
    /// Indices into `MemStore::error_words`, creation order.
    errors: Vec<usize>,
    /// At most one unresolved error per word.
    open_errors: HashMap<WordId, usize>,
    settings: Option<PracticeSettings>,
}

#[derive(Debug, Default)]
pub struct MemStore {
    units: HashMap<UnitId, Unit>,
    words: HashMap<WordId, Word>,
    unit_words: HashMap<UnitId, Vec<WordId>>,
    attempts: Vec<PracticeAttempt>,
    error_words: Vec<ErrorWord>,
    test_papers: HashMap<TestPaperId, TestPaper>,
    unit_papers: HashMap<UnitId, Vec<TestPaperId>>,
    users: HashMap<UserId, UserLedger>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self, user_id: &str) -> Option<&UserLedger> {
        self.users.get(user_id)
    }

    fn ledger_mut(&mut self, user_id: &str) -> &mut UserLedger {
        self.users.entry(user_id.to_owned()).or_default()
    }

    // === units & words ===

    pub fn insert_unit(&mut self, new: NewUnit) -> Unit {
        let unit = Unit {
            id: Uuid::new_v4(),
            number: new.number,
            title: new.title,
            description: new.description,
            difficulty: new.difficulty,
            word_count: 0,
        };
        self.unit_words.insert(unit.id, Vec::new());
        self.units.insert(unit.id, unit.clone());
        unit
    }

    pub fn insert_word(&mut self, new: NewWord) -> CoreResult<Word> {
        if !self.units.contains_key(&new.unit_id) {
            return Err(CoreError::not_found("unit", new.unit_id));
        }
        let word = Word {
            id: Uuid::new_v4(),
            unit_id: new.unit_id,
            word: new.word,
            phonetic: new.phonetic,
            definition: new.definition,
        };
        self.unit_words
            .entry(word.unit_id)
            .or_default()
            .push(word.id);
        self.words.insert(word.id, word.clone());
        self.refresh_word_count(word.unit_id);
        Ok(word)
    }

    /// Drops a word from the catalogue. History rows that point at it stay.
    pub fn remove_word(&mut self, word_id: WordId) -> Option<Word> {
        let word = self.words.remove(&word_id)?;
        if let Some(ids) = self.unit_words.get_mut(&word.unit_id) {
            ids.retain(|id| *id != word_id);
        }
        self.refresh_word_count(word.unit_id);
        Some(word)
    }

    fn refresh_word_count(&mut self, unit_id: UnitId) {
        let count = self.unit_words.get(&unit_id).map_or(0, Vec::len);
        if let Some(unit) = self.units.get_mut(&unit_id) {
            unit.word_count = u32::try_from(count).unwrap_or(u32::MAX);
        }
    }

    /// Units ordered by their ordinal number.
    pub fn units(&self) -> Vec<&Unit> {
        let mut units: Vec<&Unit> = self.units.values().collect();
        units.sort_by_key(|u| u.number);
        units
    }

    pub fn unit(&self, unit_id: UnitId) -> Option<&Unit> {
        self.units.get(&unit_id)
    }

    pub fn word(&self, word_id: WordId) -> Option<&Word> {
        self.words.get(&word_id)
    }

    /// Words of a unit in insertion order.
    pub fn words_in_unit(&self, unit_id: UnitId) -> Vec<&Word> {
        self.unit_words
            .get(&unit_id)
            .map(|ids| ids.iter().filter_map(|id| self.words.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn all_words(&self) -> impl Iterator<Item = &Word> {
        self.words.values()
    }

    // === progress ===

    pub fn progress(&self, unit_id: UnitId, user_id: &str) -> Option<&UserProgress> {
        let ledger = self.ledger(user_id)?;
        ledger
            .progress_index
            .get(&unit_id)
            .map(|&idx| &ledger.progress[idx])
    }

    pub fn put_progress(&mut self, progress: UserProgress) {
        let ledger = self.ledger_mut(&progress.user_id);
        match ledger.progress_index.get(&progress.unit_id) {
            Some(&idx) => ledger.progress[idx] = progress,
            None => {
                ledger
                    .progress_index
                    .insert(progress.unit_id, ledger.progress.len());
                ledger.progress.push(progress);
            }
        }
    }

    pub fn progress_for_user(&self, user_id: &str) -> &[UserProgress] {
        self.ledger(user_id)
            .map(|l| l.progress.as_slice())
            .unwrap_or_default()
    }

    // === attempts ===

    pub fn append_attempt(&mut self, attempt: PracticeAttempt) {
        self.attempts.push(attempt);
    }

    pub fn attempts_for(&self, word_id: WordId, user_id: &str) -> Vec<&PracticeAttempt> {
        self.attempts
            .iter()
            .filter(|a| a.word_id == word_id && a.user_id == user_id)
            .collect()
    }

    /// Flags the word as solved by the user; true only the first time.
    pub fn mark_solved(&mut self, word_id: WordId, user_id: &str) -> bool {
        self.ledger_mut(user_id).solved.insert(word_id)
    }

    // === error words ===

    pub fn open_error_mut(&mut self, word_id: WordId, user_id: &str) -> Option<&mut ErrorWord> {
        let idx = *self.ledger(user_id)?.open_errors.get(&word_id)?;
        self.error_words.get_mut(idx)
    }

    /// Stores a new unresolved error and indexes it as the open one. A row
    /// already open for the word is marked resolved first, so at most one
    /// stays open.
    pub fn insert_open_error(&mut self, error: ErrorWord) {
        let idx = self.error_words.len();
        let word_id = error.word_id;
        let ledger = self.ledger_mut(&error.user_id);
        let superseded = ledger.open_errors.insert(word_id, idx);
        ledger.errors.push(idx);
        if let Some(old) = superseded.and_then(|i| self.error_words.get_mut(i)) {
            old.resolved = true;
        }
        self.error_words.push(error);
    }

    /// Marks the open error resolved and unindexes it.
    pub fn resolve_open_error(&mut self, word_id: WordId, user_id: &str) -> Option<&ErrorWord> {
        let idx = self.users.get_mut(user_id)?.open_errors.remove(&word_id)?;
        let error = self.error_words.get_mut(idx)?;
        error.resolved = true;
        Some(error)
    }

    /// Every error row of the user, resolved or not, in creation order.
    pub fn error_words_for_user(&self, user_id: &str) -> Vec<&ErrorWord> {
        self.ledger(user_id)
            .map(|l| {
                l.errors
                    .iter()
                    .filter_map(|&idx| self.error_words.get(idx))
                    .collect()
            })
            .unwrap_or_default()
    }

    // === test papers ===

    pub fn test_paper(&self, paper_id: TestPaperId) -> Option<&TestPaper> {
        self.test_papers.get(&paper_id)
    }

    /// Papers of a unit ordered by paper number.
    pub fn papers_for_unit(&self, unit_id: UnitId) -> Vec<&TestPaper> {
        let mut papers: Vec<&TestPaper> = self
            .unit_papers
            .get(&unit_id)
            .map(|ids| ids.iter().filter_map(|id| self.test_papers.get(id)).collect())
            .unwrap_or_default();
        papers.sort_by_key(|p| p.paper_number);
        papers
    }

    /// Swaps the unit's whole paper set for `papers`.
    ///
    /// The caller holds the store exclusively, so readers observe either the
    /// old set or the new one.
    pub fn replace_test_papers(&mut self, unit_id: UnitId, papers: Vec<TestPaper>) {
        if let Some(old) = self.unit_papers.remove(&unit_id) {
            for id in old {
                self.test_papers.remove(&id);
            }
        }
        let ids = papers.iter().map(|p| p.id).collect();
        for paper in papers {
            self.test_papers.insert(paper.id, paper);
        }
        self.unit_papers.insert(unit_id, ids);
    }

    // === settings ===

    pub fn settings(&self, user_id: &str) -> Option<&PracticeSettings> {
        self.ledger(user_id).and_then(|l| l.settings.as_ref())
    }

    pub fn put_settings(&mut self, user_id: &str, settings: PracticeSettings) {
        self.ledger_mut(user_id).settings = Some(settings);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn unit_with_words(store: &mut MemStore, title: &str, words: &[&str]) -> Unit {
        let number = store.units.len() as u32 + 1;
        let unit = store.insert_unit(NewUnit {
            number,
            title: title.to_string(),
            description: None,
            difficulty: Difficulty::Beginner,
        });
        for w in words {
            store
                .insert_word(NewWord {
                    unit_id: unit.id,
                    word: w.to_string(),
                    phonetic: None,
                    definition: None,
                })
                .expect("unit exists");
        }
        store.unit(unit.id).cloned().expect("unit stored")
    }

    #[test]
    fn word_count_tracks_word_set() {
        let mut store = MemStore::new();
        let unit = unit_with_words(&mut store, "Travel", &["voyage", "luggage"]);
        assert_eq!(unit.word_count, 2);

        let first = store.words_in_unit(unit.id)[0].id;
        store.remove_word(first);
        assert_eq!(store.unit(unit.id).map(|u| u.word_count), Some(1));
    }

    #[test]
    fn words_keep_insertion_order() {
        let mut store = MemStore::new();
        let unit = unit_with_words(&mut store, "Science", &["zeta", "alpha", "mid"]);
        let spelled: Vec<&str> = store
            .words_in_unit(unit.id)
            .iter()
            .map(|w| w.word.as_str())
            .collect();
        assert_eq!(spelled, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn word_for_unknown_unit_is_rejected() {
        let mut store = MemStore::new();
        let err = store
            .insert_word(NewWord {
                unit_id: Uuid::new_v4(),
                word: "orphan".into(),
                phonetic: None,
                definition: None,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: "unit", .. }));
    }

    #[test]
    fn units_sorted_by_number() {
        let mut store = MemStore::new();
        for n in [3, 1, 2] {
            store.insert_unit(NewUnit {
                number: n,
                title: format!("Unit {n}"),
                description: None,
                difficulty: Difficulty::Beginner,
            });
        }
        let numbers: Vec<u32> = store.units().iter().map(|u| u.number).collect();
        assert_eq!(numbers, [1, 2, 3]);
    }

    #[test]
    fn progress_is_keyed_by_unit_and_user() {
        let mut store = MemStore::new();
        let unit = unit_with_words(&mut store, "Academic", &["concept"]);
        store.put_progress(UserProgress::empty(unit.id, "alice"));
        assert!(store.progress(unit.id, "alice").is_some());
        assert!(store.progress(unit.id, "bob").is_none());

        let mut updated = UserProgress::empty(unit.id, "alice");
        updated.total_attempts = 4;
        store.put_progress(updated);
        assert_eq!(store.progress_for_user("alice").len(), 1);
        assert_eq!(store.progress_for_user("alice")[0].total_attempts, 4);
    }

    #[test]
    fn mark_solved_is_idempotent() {
        let mut store = MemStore::new();
        let word = Uuid::new_v4();
        assert!(store.mark_solved(word, "alice"));
        assert!(!store.mark_solved(word, "alice"));
        assert!(store.mark_solved(word, "bob"));
    }

    fn open_error(word_id: WordId, spelling: &str) -> ErrorWord {
        ErrorWord {
            id: Uuid::new_v4(),
            word_id,
            user_id: "alice".into(),
            user_spelling: spelling.into(),
            attempt_count: 1,
            last_attempted_at: chrono::Utc::now(),
            resolved: false,
        }
    }

    #[test]
    fn second_open_error_supersedes_first() {
        let mut store = MemStore::new();
        let word = Uuid::new_v4();
        store.insert_open_error(open_error(word, "voyag"));
        store.insert_open_error(open_error(word, "voiage"));

        let rows = store.error_words_for_user("alice");
        assert_eq!(rows.len(), 2);
        assert!(rows[0].resolved);
        assert!(!rows[1].resolved);
        assert_eq!(
            store.open_error_mut(word, "alice").map(|e| e.user_spelling.clone()),
            Some("voiage".to_string())
        );
    }

    #[test]
    fn replace_drops_previous_papers() {
        let mut store = MemStore::new();
        let unit = unit_with_words(&mut store, "Nature", &[]);
        let paper = |n: u32| TestPaper {
            id: Uuid::new_v4(),
            unit_id: unit.id,
            paper_number: n,
            title: format!("Nature - Test {n}"),
            words_per_paper: 10,
            word_ids: vec![],
            created_at: chrono::Utc::now(),
        };
        let old = paper(1);
        let old_id = old.id;
        store.replace_test_papers(unit.id, vec![old]);
        store.replace_test_papers(unit.id, vec![paper(2), paper(1)]);

        assert!(store.test_paper(old_id).is_none());
        let numbers: Vec<u32> = store
            .papers_for_unit(unit.id)
            .iter()
            .map(|p| p.paper_number)
            .collect();
        assert_eq!(numbers, [1, 2]);
    }
}
