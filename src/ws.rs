use axum::{
    extract::{
        State,
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast::error::RecvError, mpsc, watch};

use crate::client_message::{SocketSession, handle_client_message};
use crate::enums::client_message::ClientMessage;
use crate::enums::server_event::ServerEvent;
use crate::states::app_state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(stream: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = stream.split();

    // subscribe to broadcast of server events
    let mut rx = state.tx.subscribe();
    let (joined_tx, joined_rx) = watch::channel::<Option<String>>(None);
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // task: forward broadcasts visible to the joined user, plus direct replies
    let send_task = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                broadcast = rx.recv() => match broadcast {
                    Ok(event) => {
                        if !event.visible_to(joined_rx.borrow().as_deref()) {
                            continue;
                        }
                        event
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event feed lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(event) => event,
                    None => break,
                },
            };
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(_) => continue,
            };
            if sender
                .send(Message::Text(Utf8Bytes::from(json)))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // task: receive client messages
    let recv_state = state.clone();
    let recv_task = tokio::spawn(async move {
        let mut session = SocketSession::new(recv_state.default_user.to_string(), joined_tx);
        while let Some(Ok(msg)) = receiver.next().await {
            let Message::Text(text) = msg else {
                continue;
            };
            let reply = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(parsed) => handle_client_message(parsed, &recv_state, &mut session).await,
                Err(err) => Some(ServerEvent::Error {
                    message: format!("invalid message: {err}"),
                }),
            };
            if let Some(reply) = reply
                && reply_tx.send(reply).is_err()
            {
                break;
            }
        }
    });

    let _ = tokio::join!(send_task, recv_task);
}
