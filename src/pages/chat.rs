use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

use crate::backend::AgentBackend;
use crate::dom::Element;
use crate::markup::{with_line_breaks, MarkupPolicy};

pub const GREETING: &str = "Hello! I'm the Job Placement assistant. Ask me about open positions, resumes or interview preparation.";
pub const CHAT_ERROR_MESSAGE: &str = "Sorry, something went wrong. Please ensure the backend server is running and there are no CORS issues. Check the browser console for more details.";
pub const TYPING_INDICATOR_ID: &str = "typing-indicator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    fn class(&self) -> &'static str {
        match self {
            Sender::User => "message-user",
            Sender::Bot => "message-bot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input, nothing happened
    Ignored,
    Replied,
    Failed,
}

fn greeting_element() -> Element {
    Element::new("div")
        .with_id("initial-message")
        .with_classes("message message-bot")
        .with_text(GREETING)
}

/// Fresh `chat-window` (seeded with the greeting) and `message-input`
pub fn skeleton() -> (Element, Element) {
    let window = Element::new("div")
        .with_id("chat-window")
        .with_classes("chat-window")
        .with_child(greeting_element());
    let input = Element::new("input")
        .with_id("message-input")
        .with_attr("type", "text")
        .with_attr("autocomplete", "off")
        .with_attr("placeholder", "Type your message...");
    (window, input)
}

/// Controller for the chat transcript
pub struct ChatPage {
    window: Element,
    input: Element,
    greeting: Element,
    policy: MarkupPolicy,
    backend: Arc<dyn AgentBackend>,
}

impl ChatPage {
    /// Captures a copy of the window's `initial-message` as the clear template
    pub fn new(
        window: Element,
        input: Element,
        policy: MarkupPolicy,
        backend: Arc<dyn AgentBackend>,
    ) -> Self {
        let greeting = window
            .find_by_id("initial-message")
            .map(|e| e.deep_clone())
            .unwrap_or_else(greeting_element);
        window.scroll_to_bottom();
        Self {
            window,
            input,
            greeting,
            policy,
            backend,
        }
    }

    pub fn window(&self) -> &Element {
        &self.window
    }

    pub fn input(&self) -> &Element {
        &self.input
    }

    pub fn add_message(&self, message: &str, sender: Sender) {
        let bubble = Element::new("div")
            .with_classes("message")
            .with_markup(&with_line_breaks(self.policy, message));
        bubble.add_class(sender.class());
        self.window.append_child(bubble);
        self.window.scroll_to_bottom();
    }

    fn show_typing_indicator(&self) {
        let dots = Element::new("div")
            .with_classes("typing-dots")
            .with_child(Element::new("span"))
            .with_child(Element::new("span"))
            .with_child(Element::new("span"));
        self.window.append_child(
            Element::new("div")
                .with_id(TYPING_INDICATOR_ID)
                .with_classes("message message-bot")
                .with_child(dots),
        );
        self.window.scroll_to_bottom();
    }

    fn remove_typing_indicator(&self) {
        self.window.remove_by_id(TYPING_INDICATOR_ID);
        self.window.scroll_to_bottom();
    }

    /// Accepts the typed message: shows it, clears the input and starts the
    /// typing indicator. Returns the prompt to send, or `None` for blank input.
    pub fn begin_turn(&self) -> Option<String> {
        let message = self.input.value().trim().to_string();
        if message.is_empty() {
            return None;
        }
        self.add_message(&message, Sender::User);
        self.input.set_value("");
        self.show_typing_indicator();
        Some(message)
    }

    /// Sends the prompt and renders the reply or the fixed error bubble
    pub async fn finish_turn(&self, prompt: &str) -> TurnOutcome {
        let result = self.backend.chat(prompt).await;
        self.remove_typing_indicator();

        let reply = match result {
            Ok(body) => match body.get("response").and_then(Value::as_str) {
                Some(text) if !text.is_empty() => Ok(text.to_string()),
                _ => Err(format!(
                    "The API response format is incorrect. Expected {{ 'response': '...' }}, got {}",
                    body
                )),
            },
            Err(e) => Err(e.to_string()),
        };

        match reply {
            Ok(text) => {
                debug!("Chat reply of {} chars", text.len());
                self.add_message(&text, Sender::Bot);
                TurnOutcome::Replied
            }
            Err(e) => {
                error!("Error fetching from API: {}", e);
                self.add_message(CHAT_ERROR_MESSAGE, Sender::Bot);
                TurnOutcome::Failed
            }
        }
    }

    pub async fn submit(&self) -> TurnOutcome {
        match self.begin_turn() {
            Some(prompt) => self.finish_turn(&prompt).await,
            None => TurnOutcome::Ignored,
        }
    }

    /// Drops the transcript back to a fresh copy of the greeting
    pub fn clear(&self) {
        self.window.clear();
        self.window.append_child(self.greeting.deep_clone());
        self.window.scroll_to_bottom();
    }
}
