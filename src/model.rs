//! Entities of the practice domain.
//!
//! All records serialize in camelCase so the JSON surface matches what the
//! web client already consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UnitId = Uuid;
pub type WordId = Uuid;
pub type TestPaperId = Uuid;

/// Opaque caller-supplied user identity.
pub type UserId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Tier used by the corpus import when a unit carries no explicit one.
    pub fn for_chapter(number: u32) -> Self {
        match number {
            0..=9 => Self::Beginner,
            10..=19 => Self::Intermediate,
            _ => Self::Advanced,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: UnitId,
    pub number: u32,
    pub title: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    /// Cached size of the unit's word set.
    pub word_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: WordId,
    pub unit_id: UnitId,
    pub word: String,
    pub phonetic: Option<String>,
    pub definition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub unit_id: UnitId,
    pub user_id: UserId,
    /// Distinct words with at least one correct attempt.
    pub completed_words: u32,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub last_practiced_at: Option<DateTime<Utc>>,
}

impl UserProgress {
    pub fn empty(unit_id: UnitId, user_id: &str) -> Self {
        Self {
            unit_id,
            user_id: user_id.to_string(),
            completed_words: 0,
            total_attempts: 0,
            correct_attempts: 0,
            last_practiced_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeAttempt {
    pub id: Uuid,
    pub word_id: WordId,
    pub user_id: UserId,
    /// Exactly what the user typed.
    pub user_spelling: String,
    pub is_correct: bool,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorWord {
    pub id: Uuid,
    pub word_id: WordId,
    pub user_id: UserId,
    /// Latest misspelling only.
    pub user_spelling: String,
    pub attempt_count: u32,
    pub last_attempted_at: DateTime<Utc>,
    pub resolved: bool,
}

/// An open error joined with the word it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveError {
    #[serde(flatten)]
    pub error_word: ErrorWord,
    pub word: Word,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPaper {
    pub id: TestPaperId,
    pub unit_id: UnitId,
    /// 1-based, unique within the unit.
    pub paper_number: u32,
    pub title: String,
    pub words_per_paper: u32,
    pub word_ids: Vec<WordId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSettings {
    pub play_audio_automatically: bool,
    pub show_definitions: bool,
    pub practice_speed: PracticeSpeed,
}

impl Default for PracticeSettings {
    fn default() -> Self {
        Self {
            play_audio_automatically: true,
            show_definitions: true,
            practice_speed: PracticeSpeed::Normal,
        }
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub play_audio_automatically: Option<bool>,
    pub show_definitions: Option<bool>,
    pub practice_speed: Option<PracticeSpeed>,
}

impl PracticeSettings {
    pub fn merge(mut self, update: SettingsUpdate) -> Self {
        if let Some(v) = update.play_audio_automatically {
            self.play_audio_automatically = v;
        }
        if let Some(v) = update.show_definitions {
            self.show_definitions = v;
        }
        if let Some(v) = update.practice_speed {
            self.practice_speed = v;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_tiers() {
        assert_eq!(Difficulty::for_chapter(1), Difficulty::Beginner);
        assert_eq!(Difficulty::for_chapter(10), Difficulty::Intermediate);
        assert_eq!(Difficulty::for_chapter(19), Difficulty::Intermediate);
        assert_eq!(Difficulty::for_chapter(20), Difficulty::Advanced);
    }

    #[test]
    fn settings_merge_keeps_absent_fields() {
        let merged = PracticeSettings::default().merge(SettingsUpdate {
            practice_speed: Some(PracticeSpeed::Slow),
            ..Default::default()
        });
        assert!(merged.play_audio_automatically);
        assert!(merged.show_definitions);
        assert_eq!(merged.practice_speed, PracticeSpeed::Slow);
    }

    #[test]
    fn active_error_flattens_error_fields() {
        let unit_id = Uuid::new_v4();
        let word = Word {
            id: Uuid::new_v4(),
            unit_id,
            word: "voyage".into(),
            phonetic: None,
            definition: None,
        };
        let active = ActiveError {
            error_word: ErrorWord {
                id: Uuid::new_v4(),
                word_id: word.id,
                user_id: "u1".into(),
                user_spelling: "voyag".into(),
                attempt_count: 2,
                last_attempted_at: Utc::now(),
                resolved: false,
            },
            word,
        };
        let value = serde_json::to_value(&active).unwrap();
        assert_eq!(value["attemptCount"], 2);
        assert_eq!(value["userSpelling"], "voyag");
        assert_eq!(value["word"]["word"], "voyage");
    }
}
