use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::AppState;

pub async fn stream_events_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_events_ws(socket, state).await {
            tracing::warn!("events WS closed: {}", e);
        }
    })
}

async fn handle_events_ws(socket: WebSocket, state: AppState) -> anyhow::Result<()> {
    let mut events = state.bus().subscribe();

    // Split socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Drain (and ignore) any client->server messages so pings/pongs work
    tokio::spawn(async move { while let Some(Ok(_)) = receiver.next().await {} });

    loop {
        match events.recv().await {
            Ok(event) => {
                let text = serde_json::to_string(&event)?;
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break; // client disconnected
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("events WS lagged, skipped {skipped} events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    let _ = sender.close().await;
    Ok(())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events/stream/ws", get(stream_events_ws))
}
