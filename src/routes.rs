//! JSON handlers for the `/api` surface.

use std::time::Instant;

use axum::{
    Json,
    extract::{Path, Query, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::enums::server_event::ServerEvent;
use crate::error::{CoreError, CoreResult};
use crate::model::{
    ActiveError, PracticeAttempt, PracticeSettings, SettingsUpdate, TestPaper, Unit, UserProgress,
    Word, WordId,
};
use crate::service::{AttemptOutcome, DEFAULT_RANDOM_WORDS, SpellCheck, Stats};
use crate::states::app_state::AppState;

pub const USER_HEADER: &str = "x-user-id";

type ApiResult<T> = Result<Json<T>, CoreError>;

fn user_id(headers: &HeaderMap, state: &AppState) -> String {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| state.default_user.to_string(), str::to_string)
}

/// Ids that do not parse cannot name a stored entity.
fn parse_id(kind: &'static str, raw: &str) -> CoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| CoreError::not_found(kind, raw))
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();
    let response = next.run(req).await;
    if path.starts_with("/api") {
        info!(
            %method,
            path,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        );
    }
    response
}

// === catalogue ===

pub async fn list_units(State(state): State<AppState>) -> ApiResult<Vec<Unit>> {
    Ok(Json(state.service.list_units()?))
}

pub async fn get_unit(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Unit> {
    let unit_id = parse_id("unit", &id)?;
    Ok(Json(state.service.get_unit(unit_id)?))
}

pub async fn unit_words(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Word>> {
    let unit_id = parse_id("unit", &id)?;
    Ok(Json(state.service.unit_words(unit_id)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomQuery {
    count: Option<usize>,
    /// Comma-separated unit ids.
    exclude_units: Option<String>,
}

pub async fn random_words(
    State(state): State<AppState>,
    Query(query): Query<RandomQuery>,
) -> ApiResult<Vec<Word>> {
    let exclude: Vec<Uuid> = query
        .exclude_units
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| Uuid::parse_str(s.trim()).ok())
        .collect();
    let count = query
        .count
        .filter(|&c| c > 0)
        .unwrap_or(DEFAULT_RANDOM_WORDS);
    Ok(Json(state.service.random_words(count, &exclude)?))
}

// === practice ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellingRequest {
    word_id: WordId,
    user_spelling: String,
}

pub async fn submit_attempt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SpellingRequest>,
) -> ApiResult<AttemptOutcome> {
    let user = user_id(&headers, &state);
    let outcome = state
        .service
        .submit_attempt(body.word_id, &user, &body.user_spelling)?;
    state.publish(ServerEvent::AttemptRecorded {
        user_id: user,
        word_id: body.word_id,
        is_correct: outcome.is_correct,
        progress: outcome.progress.clone(),
    });
    Ok(Json(outcome))
}

pub async fn spell_check(
    State(state): State<AppState>,
    Json(body): Json<SpellingRequest>,
) -> ApiResult<SpellCheck> {
    Ok(Json(
        state
            .service
            .check_spelling(body.word_id, &body.user_spelling)?,
    ))
}

/// The caller's attempt history for one word, oldest first.
pub async fn word_attempts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Vec<PracticeAttempt>> {
    let user = user_id(&headers, &state);
    let word_id = parse_id("word", &id)?;
    Ok(Json(state.service.attempts_for(word_id, &user)?))
}

pub async fn error_words(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<ActiveError>> {
    let user = user_id(&headers, &state);
    Ok(Json(state.service.list_active_errors(&user)?))
}

// === progress ===

pub async fn all_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<UserProgress>> {
    let user = user_id(&headers, &state);
    Ok(Json(state.service.list_all_progress(&user)?))
}

/// `null` when the user has not practiced the unit yet.
pub async fn unit_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(unit_id): Path<String>,
) -> ApiResult<Option<UserProgress>> {
    let user = user_id(&headers, &state);
    let Ok(unit_id) = Uuid::parse_str(&unit_id) else {
        return Ok(Json(None));
    };
    Ok(Json(state.service.get_progress(unit_id, &user)?))
}

pub async fn stats(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Stats> {
    let user = user_id(&headers, &state);
    Ok(Json(state.service.stats(&user)?))
}

// === settings ===

pub async fn get_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<PracticeSettings> {
    let user = user_id(&headers, &state);
    Ok(Json(state.service.settings(&user)?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<PracticeSettings> {
    let user = user_id(&headers, &state);
    Ok(Json(state.service.update_settings(&user, update)?))
}

// === test papers ===

pub async fn list_test_papers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<TestPaper>> {
    let unit_id = parse_id("unit", &id)?;
    Ok(Json(state.service.list_test_papers(unit_id)?))
}

fn default_true() -> bool {
    true
}

/// The predefined layout is used unless the caller opts out with
/// `usePredefined: false`; only then is `wordsPerPaper` read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    words_per_paper: Option<i64>,
    #[serde(default = "default_true", alias = "useExcelStructure")]
    use_predefined: bool,
}

pub async fn generate_test_papers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<GenerateRequest>,
) -> ApiResult<Vec<TestPaper>> {
    let unit_id = parse_id("unit", &id)?;
    let papers =
        state
            .service
            .generate_test_papers(unit_id, body.words_per_paper, body.use_predefined)?;
    state.publish(ServerEvent::TestPapersGenerated {
        unit_id,
        papers: papers.len(),
    });
    Ok(Json(papers))
}

pub async fn test_paper_words(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Word>> {
    let paper_id = parse_id("test paper", &id)?;
    Ok(Json(state.service.get_test_paper_words(paper_id)?))
}
