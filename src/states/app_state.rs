use crate::config::AppConfig;
use crate::enums::server_event::ServerEvent;
use crate::service::PracticeService;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PracticeService>,
    pub tx: broadcast::Sender<ServerEvent>,
    pub default_user: Arc<str>,
}

impl AppState {
    pub fn new(service: PracticeService, config: &AppConfig) -> Self {
        let (tx, _rx) = broadcast::channel::<ServerEvent>(config.event_capacity);
        Self {
            service: Arc::new(service),
            tx,
            default_user: Arc::from(config.default_user.as_str()),
        }
    }

    /// Fans an event out to every open socket. Having no subscribers is fine.
    pub fn publish(&self, event: ServerEvent) {
        let _ = self.tx.send(event);
    }
}
