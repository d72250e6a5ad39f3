use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dom::SelectedFile;
use crate::error::BackendError;

pub const AGENTS_PATH: &str = "/api/agents";
pub const ANALYZE_FEEDBACK_PATH: &str = "/api/instructor_assistant/analyze_feedback";
pub const CHAT_PATH: &str = "/api/jobplacement_rag/chat";

/// One entry of the agent directory. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon_svg: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl AgentDescriptor {
    pub fn named(name: &str) -> Self {
        Self {
            agent_name: Some(name.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_prompt: String,
}

/// Structured result of the feedback analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub summary: String,
    pub sentiment: String,
    pub action_suggestions: Vec<String>,
}

impl FeedbackReport {
    /// Recognizes the report shape; empty summary or sentiment does not count
    pub fn from_value(value: &Value) -> Option<Self> {
        let report: FeedbackReport = serde_json::from_value(value.clone()).ok()?;
        if report.summary.is_empty() || report.sentiment.is_empty() {
            return None;
        }
        Some(report)
    }
}

/// Calls the agent suite backend on behalf of the page controllers.
///
/// Bodies of the feedback and chat endpoints come back as raw JSON so the
/// pages can decide how to degrade when the shape is off.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// GET the agent directory
    async fn list_agents(&self) -> Result<Vec<AgentDescriptor>, BackendError>;

    /// POST one file as multipart form data for analysis
    async fn analyze_feedback(&self, file: &SelectedFile) -> Result<Value, BackendError>;

    /// POST a chat turn
    async fn chat(&self, user_prompt: &str) -> Result<Value, BackendError>;

    /// Whether the backend answers at all
    async fn health_check(&self) -> Result<bool, BackendError> {
        Ok(true)
    }
}
