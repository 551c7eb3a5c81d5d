use serde::Deserialize;

use crate::model::WordId;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join", rename_all = "camelCase")]
    Join { user_id: String },

    #[serde(rename = "submit_attempt", rename_all = "camelCase")]
    SubmitAttempt {
        word_id: WordId,
        user_spelling: String,
    },
}
