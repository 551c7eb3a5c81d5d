use crate::enums::client_message::ClientMessage;
use crate::enums::server_event::ServerEvent;
use crate::states::app_state::AppState;
use tokio::sync::watch;

/// Per-socket identity; the watch side tells the outbound task whose
/// attempt events to forward.
pub struct SocketSession {
    user_id: String,
    joined: watch::Sender<Option<String>>,
}

impl SocketSession {
    pub fn new(user_id: String, joined: watch::Sender<Option<String>>) -> Self {
        joined.send_replace(Some(user_id.clone()));
        Self { user_id, joined }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn join(&mut self, user_id: String) {
        self.joined.send_replace(Some(user_id.clone()));
        self.user_id = user_id;
    }
}

/// Applies one client message and returns the reply meant for that client
/// only, if any.
pub async fn handle_client_message(
    msg: ClientMessage,
    state: &AppState,
    session: &mut SocketSession,
) -> Option<ServerEvent> {
    match msg {
        ClientMessage::Join { user_id } => {
            if user_id.trim().is_empty() {
                return Some(ServerEvent::Error {
                    message: "userId must not be empty".to_string(),
                });
            }
            tracing::debug!(%user_id, "socket joined");
            session.join(user_id);
            None
        }

        ClientMessage::SubmitAttempt {
            word_id,
            user_spelling,
        } => match state
            .service
            .submit_attempt(word_id, session.user_id(), &user_spelling)
        {
            Ok(outcome) => {
                state.publish(ServerEvent::AttemptRecorded {
                    user_id: session.user_id().to_string(),
                    word_id,
                    is_correct: outcome.is_correct,
                    progress: outcome.progress,
                });
                Some(ServerEvent::AttemptResult {
                    word_id,
                    is_correct: outcome.is_correct,
                    correct_spelling: outcome.correct_spelling,
                })
            }
            Err(err) => Some(ServerEvent::Error {
                message: err.to_string(),
            }),
        },
    }
}
