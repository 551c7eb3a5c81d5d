use std::env;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_USER: &str = "default_user";
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Identity used when a request names no user.
    pub default_user: String,
    pub seed_path: Option<PathBuf>,
    pub test_paper_map: Option<PathBuf>,
    pub log_json: bool,
    pub event_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            default_user: DEFAULT_USER.to_string(),
            seed_path: None,
            test_paper_map: None,
            log_json: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("SPELLWISE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
            default_user: env::var("SPELLWISE_DEFAULT_USER")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER.to_string()),
            seed_path: env_path("SPELLWISE_SEED_PATH"),
            test_paper_map: env_path("SPELLWISE_TEST_PAPER_MAP"),
            log_json: env_bool("SPELLWISE_LOG_JSON", false),
            event_capacity: env_usize("SPELLWISE_EVENT_CAPACITY", DEFAULT_EVENT_CAPACITY).max(1),
        }
    }
}
