use serde::Serialize;

use crate::model::{UnitId, UserProgress, WordId};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Broadcast after every recorded attempt; sockets forward it only to
    /// the user who made it.
    #[serde(rename = "attempt_recorded", rename_all = "camelCase")]
    AttemptRecorded {
        user_id: String,
        word_id: WordId,
        is_correct: bool,
        progress: UserProgress,
    },

    #[serde(rename = "test_papers_generated", rename_all = "camelCase")]
    TestPapersGenerated { unit_id: UnitId, papers: usize },

    /// Direct reply to a `submit_attempt` message.
    #[serde(rename = "attempt_result", rename_all = "camelCase")]
    AttemptResult {
        word_id: WordId,
        is_correct: bool,
        correct_spelling: String,
    },

    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerEvent {
    /// Whether a socket joined as `user` should see this broadcast.
    pub fn visible_to(&self, user: Option<&str>) -> bool {
        match self {
            Self::AttemptRecorded { user_id, .. } => user == Some(user_id.as_str()),
            _ => true,
        }
    }
}
