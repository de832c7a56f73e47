use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use skillswap_common::AppError;

use crate::connection_manager::PushEvent;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    token: Option<String>,
}

/// Frames a client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Ping,
}

pub async fn websocket_handler(
    State(state): State<AppState>,
    Query(params): Query<WebSocketQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let token = params
        .token
        .as_deref()
        .ok_or_else(|| AppError::Authentication("Missing token".to_string()))?;

    let user_id = state
        .jwt_service
        .extract_user_id(token)
        .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?;

    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Authentication("Account no longer exists".to_string()))?;

    if user.is_banned {
        return Err(AppError::Authorization("Your account has been banned".to_string()));
    }

    // Check connection limits
    if state.connection_manager.connection_count(user.id) >= state.config.push.max_connections_per_user {
        return Err(AppError::Conflict(
            "Maximum connections per user exceeded".to_string(),
        ));
    }

    Ok(ws.on_upgrade(move |socket| handle_websocket(socket, user.id, state)))
}

async fn handle_websocket(socket: WebSocket, user_id: Uuid, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let connection_id = state.connection_manager.add_connection(user_id, tx);

    // Forward queued frames to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let heartbeat_interval = Duration::from_secs(state.config.push.heartbeat_secs.max(1));
    let idle_timeout = heartbeat_interval * 2;
    let mut heartbeat_timer = tokio::time::interval(heartbeat_interval);
    heartbeat_timer.tick().await;
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_seen = Instant::now();
                        match serde_json::from_str::<ClientFrame>(&text) {
                            Ok(ClientFrame::Ping) => {
                                state.connection_manager.send_event_to_connection(
                                    user_id,
                                    connection_id,
                                    &PushEvent::pong(),
                                );
                            }
                            Err(_) => {
                                tracing::debug!(%user_id, "Ignoring unrecognised client frame");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        last_seen = Instant::now();
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(%user_id, "WebSocket closed by client");
                        break;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        last_seen = Instant::now();
                    }
                    Some(Err(e)) => {
                        tracing::warn!(%user_id, "WebSocket error: {}", e);
                        break;
                    }
                }
            }

            // Send periodic heartbeat
            _ = heartbeat_timer.tick() => {
                if last_seen.elapsed() > idle_timeout {
                    tracing::warn!(%user_id, "Client not responding to heartbeat, closing connection");
                    break;
                }
                let ping = Message::Ping(Vec::new());
                if !state.connection_manager.send_to_connection(user_id, connection_id, ping) {
                    break;
                }
            }
        }
    }

    state.connection_manager.remove_connection(user_id, connection_id);
    send_task.abort();
}
