use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::pages::ChatPage;
use crate::state::AppState;

pub async fn send_transcript<S>(page: &ChatPage, sender: &mut S) -> anyhow::Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    sender
        .send(Message::Text(
            serde_json::json!({
                "type": "transcript",
                "html": page.window().inner_html()
            })
            .to_string(),
        ))
        .await?;
    Ok(())
}

/// A submitted prompt still waiting on the backend reply
pub struct PendingTurn {
    page: Arc<ChatPage>,
    prompt: String,
}

impl PendingTurn {
    /// Waits for the reply, then pushes the updated transcript
    pub async fn finish<S>(self, sender: &mut S) -> anyhow::Result<()>
    where
        S: Sink<Message> + Unpin,
        S::Error: std::error::Error + Send + Sync + 'static,
    {
        self.page.finish_turn(&self.prompt).await;
        send_transcript(&self.page, sender).await
    }
}

/// Dispatches one client message for a chat session. A submit returns its
/// pending turn so the caller can wait on the backend without blocking the
/// socket.
pub async fn handle_message<S>(
    state: &AppState,
    client_uid: &str,
    text: &str,
    sender: &mut S,
) -> anyhow::Result<Option<PendingTurn>>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let msg: Value = serde_json::from_str(text)?;
    let msg_type = msg.get("type").and_then(|v| v.as_str());

    let page = state
        .chat_session(client_uid)
        .ok_or_else(|| anyhow::anyhow!("No chat session for {}", client_uid))?;

    match msg_type {
        Some("chat-submit") => {
            let text = msg.get("text").and_then(|v| v.as_str()).unwrap_or("");
            handle_submit(page, text, sender).await
        }
        Some("chat-clear") => {
            page.clear();
            send_transcript(&page, sender).await?;
            Ok(None)
        }
        _ => {
            warn!("Unknown message type: {:?}", msg_type);
            Ok(None)
        }
    }
}

async fn handle_submit<S>(
    page: Arc<ChatPage>,
    text: &str,
    sender: &mut S,
) -> anyhow::Result<Option<PendingTurn>>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    page.input().set_value(text);
    let Some(prompt) = page.begin_turn() else {
        debug!("Ignoring blank chat message");
        return Ok(None);
    };

    // Show the user bubble and typing indicator before waiting on the backend
    send_transcript(&page, sender).await?;
    Ok(Some(PendingTurn { page, prompt }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AgentDescriptor;
    use crate::config::Config;
    use crate::dom::SelectedFile;
    use crate::error::BackendError;
    use async_trait::async_trait;
    use futures::channel::mpsc;
    use futures::StreamExt;
    use serde_json::json;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl crate::backend::AgentBackend for Echo {
        async fn list_agents(&self) -> Result<Vec<AgentDescriptor>, BackendError> {
            Ok(vec![])
        }

        async fn analyze_feedback(&self, _file: &SelectedFile) -> Result<Value, BackendError> {
            Ok(json!({}))
        }

        async fn chat(&self, user_prompt: &str) -> Result<Value, BackendError> {
            Ok(json!({ "response": format!("echo: {}", user_prompt) }))
        }
    }

    fn transcript(msg: Message) -> String {
        match msg {
            Message::Text(text) => {
                let v: Value = serde_json::from_str(&text).unwrap();
                assert_eq!(v["type"], "transcript");
                v["html"].as_str().unwrap().to_string()
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    fn state_with_session(uid: &str) -> AppState {
        let state = AppState::with_backend(Config::default(), Arc::new(Echo));
        state.open_chat_session(uid);
        state
    }

    #[tokio::test]
    async fn submit_sends_typing_then_reply() {
        let state = state_with_session("c1");
        let (mut tx, mut rx) = mpsc::unbounded::<Message>();

        let submit = r#"{"type":"chat-submit","text":"Hello"}"#;
        let turn = handle_message(&state, "c1", submit, &mut tx)
            .await
            .unwrap()
            .expect("submit leaves a pending turn");

        let pending = transcript(rx.next().await.unwrap());
        assert!(pending.contains("typing-indicator"));
        assert!(pending.contains(">Hello</div>"));

        turn.finish(&mut tx).await.unwrap();
        drop(tx);

        let done = transcript(rx.next().await.unwrap());
        assert!(!done.contains("typing-indicator"));
        assert!(done.contains("echo: Hello"));
        assert!(rx.next().await.is_none());
    }

    #[tokio::test]
    async fn blank_submit_sends_nothing() {
        let state = state_with_session("c2");
        let (mut tx, mut rx) = mpsc::unbounded::<Message>();

        let submit = r#"{"type":"chat-submit","text":"  "}"#;
        let turn = handle_message(&state, "c2", submit, &mut tx)
            .await
            .unwrap();
        assert!(turn.is_none());
        drop(tx);

        assert!(rx.next().await.is_none());
        assert_eq!(state.chat_session("c2").unwrap().window().child_count(), 1);
    }

    #[tokio::test]
    async fn clear_resets_transcript() {
        let state = state_with_session("c3");
        let (mut tx, mut rx) = mpsc::unbounded::<Message>();

        let submit = r#"{"type":"chat-submit","text":"Hi"}"#;
        let turn = handle_message(&state, "c3", submit, &mut tx)
            .await
            .unwrap()
            .unwrap();
        turn.finish(&mut tx).await.unwrap();
        let cleared = handle_message(&state, "c3", r#"{"type":"chat-clear"}"#, &mut tx)
            .await
            .unwrap();
        assert!(cleared.is_none());
        drop(tx);

        let messages: Vec<Message> = rx.collect().await;
        let last = transcript(messages.into_iter().last().unwrap());
        assert!(last.contains("initial-message"));
        assert!(!last.contains("echo: Hi"));
    }

    #[tokio::test]
    async fn unrecognized_type_sends_nothing() {
        let state = state_with_session("c4");
        let (mut tx, mut rx) = mpsc::unbounded::<Message>();

        let turn = handle_message(&state, "c4", r#"{"type":"request-transcript"}"#, &mut tx)
            .await
            .unwrap();
        assert!(turn.is_none());
        drop(tx);

        assert!(rx.next().await.is_none());
    }

    #[tokio::test]
    async fn unknown_session_is_an_error() {
        let state = AppState::with_backend(Config::default(), Arc::new(Echo));
        let (mut tx, _rx) = mpsc::unbounded::<Message>();
        assert!(handle_message(&state, "nobody", r#"{"type":"chat-clear"}"#, &mut tx)
            .await
            .is_err());
    }
}
