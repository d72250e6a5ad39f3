use axum::{
    extract::{ws::Message, State, WebSocketUpgrade},
    response::Response,
};
use axum::extract::ws::WebSocket;
use futures::channel::mpsc;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use tracing::{debug, info, error};

use crate::state::AppState;
use crate::handlers;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sender, receiver) = socket.split();
    run_session(state, sender, receiver).await;
}

/// Serves one chat client until its stream closes or errors.
///
/// Client messages are dispatched in arrival order. A submitted turn waits on
/// the backend in its own task, so `chat-clear` and further messages are
/// handled while the reply is pending. All outgoing transcripts go through one
/// channel drained by a writer task.
pub async fn run_session<S, R, E>(state: AppState, sender: S, mut receiver: R)
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let client_uid = state.generate_client_uid();
    info!("New chat connection: {}", client_uid);

    let page = state.open_chat_session(&client_uid);
    let (mut outgoing, outgoing_rx) = mpsc::unbounded::<Message>();
    tokio::spawn(write_outgoing(outgoing_rx, sender));

    if let Err(e) = handlers::send_transcript(&page, &mut outgoing).await {
        error!("Failed to send initial transcript: {}", e);
        state.close_chat_session(&client_uid);
        return;
    }

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                match handlers::handle_message(&state, &client_uid, &text, &mut outgoing).await {
                    Ok(Some(turn)) => {
                        let mut outgoing = outgoing.clone();
                        tokio::spawn(async move {
                            if let Err(e) = turn.finish(&mut outgoing).await {
                                error!("Failed to deliver chat reply: {}", e);
                            }
                        });
                    }
                    Ok(None) => {}
                    Err(e) => error!("Error handling message: {}", e),
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {} disconnected", client_uid);
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    state.close_chat_session(&client_uid);
    info!("Cleaned up chat session {}", client_uid);
}

/// Drains the session channel into the socket; ends once every sender is gone
async fn write_outgoing<S>(mut outgoing: mpsc::UnboundedReceiver<Message>, mut sender: S)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(msg) = outgoing.next().await {
        if let Err(e) = sender.send(msg).await {
            debug!("Client went away before delivery: {}", e);
            break;
        }
    }
}
