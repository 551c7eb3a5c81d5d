use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::AppState;
use crate::routes;
use crate::ws::ws_handler;

pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/units", get(routes::list_units))
        .route("/units/{id}", get(routes::get_unit))
        .route("/units/{id}/words", get(routes::unit_words))
        .route("/units/{id}/test-papers", get(routes::list_test_papers))
        .route(
            "/units/{id}/generate-test-papers",
            post(routes::generate_test_papers),
        )
        .route("/words/random", get(routes::random_words))
        .route("/words/{id}/attempts", get(routes::word_attempts))
        .route("/progress", get(routes::all_progress))
        .route("/progress/{unit_id}", get(routes::unit_progress))
        .route("/practice-attempts", post(routes::submit_attempt))
        .route("/spell-check", post(routes::spell_check))
        .route("/error-words", get(routes::error_words))
        .route(
            "/settings",
            get(routes::get_settings).post(routes::update_settings),
        )
        .route("/stats", get(routes::stats))
        .route("/test-papers/{id}/words", get(routes::test_paper_words));

    Router::new()
        .nest("/api", api)
        .nest("/ws", Router::new().route("/events", get(ws_handler)))
        .layer(middleware::from_fn(routes::log_requests))
        .with_state(state)
}
