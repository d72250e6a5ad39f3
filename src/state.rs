use std::sync::Arc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::backend::{AgentBackend, AgentSuiteClient};
use crate::config::Config;
use crate::pages::chat::{self, ChatPage};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn AgentBackend>,
    /// Live chat pages, one per WebSocket client
    pub chat_sessions: Arc<DashMap<String, Arc<ChatPage>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let backend = Arc::new(AgentSuiteClient::new(
            config.system_config.backend_base_url.clone(),
        ));
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: Config, backend: Arc<dyn AgentBackend>) -> Self {
        Self {
            config,
            backend,
            chat_sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn generate_client_uid(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Creates a chat page with a fresh transcript for the client
    pub fn open_chat_session(&self, client_uid: &str) -> Arc<ChatPage> {
        let (window, input) = chat::skeleton();
        let page = Arc::new(ChatPage::new(
            window,
            input,
            self.config.system_config.markup_policy,
            self.backend.clone(),
        ));
        self.chat_sessions
            .insert(client_uid.to_string(), page.clone());
        page
    }

    pub fn chat_session(&self, client_uid: &str) -> Option<Arc<ChatPage>> {
        self.chat_sessions.get(client_uid).map(|e| e.value().clone())
    }

    pub fn close_chat_session(&self, client_uid: &str) {
        self.chat_sessions.remove(client_uid);
    }
}
