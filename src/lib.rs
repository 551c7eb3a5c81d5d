//! Spelling practice service: attempt judging, per-unit progress, the
//! open-error ledger and test paper partitioning, served over JSON/HTTP with
//! a websocket event feed.

pub mod app;
pub mod client_message;
pub mod config;
pub mod enums;
pub mod error;
pub mod error_tracker;
pub mod judge;
pub mod ledger;
pub mod model;
pub mod papers;
pub mod routes;
pub mod seed;
pub mod service;
pub mod states;
pub mod store;
pub mod ws;

pub use app::build_app;
pub use config::AppConfig;
pub use error::{CoreError, CoreResult};
pub use service::PracticeService;
pub use states::app_state::AppState;
