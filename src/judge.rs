//! Spelling verdicts: trimmed, case-insensitive exact match.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_correct: bool,
    pub normalized_expected: String,
    pub normalized_submitted: String,
}

pub fn judge(expected: &str, submitted: &str) -> Verdict {
    let normalized_expected = expected.to_lowercase();
    let normalized_submitted = submitted.trim().to_lowercase();
    Verdict {
        is_correct: normalized_expected == normalized_submitted,
        normalized_expected,
        normalized_submitted,
    }
}
