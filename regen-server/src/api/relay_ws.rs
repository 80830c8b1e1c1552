use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use tokio::sync::mpsc;

use crate::state::AppState;

/// `GET /`: relay subscription.
///
/// The first frame is always the connection acknowledgment; after that the
/// socket receives `batch_update` frames. Anything the client sends is
/// ignored.
pub(super) async fn relay_ws(state: State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let app_state = state.0.clone();
    ws.on_upgrade(move |socket| handle_relay_ws(socket, app_state))
}

async fn handle_relay_ws(mut socket: WebSocket, state: AppState) {
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Arc<str>>();
    let subscriber = match state.relay.accept(frame_tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "WS: failed to register subscriber");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let mut shutdown_rx = state.shutdown_rx.clone();

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            }

            frame = frame_rx.recv() => {
                let Some(frame) = frame else { break };
                if socket.send(Message::Text(frame.as_ref().into())).await.is_err() {
                    break;
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(subscriber = %subscriber, error = %e, "WS: receive error");
                        break;
                    }
                }
            }
        }
    }

    state.relay.remove(subscriber).await;
}
