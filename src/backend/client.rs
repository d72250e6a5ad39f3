use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use super::interface::{
    AgentBackend, AgentDescriptor, ChatRequest, AGENTS_PATH, ANALYZE_FEEDBACK_PATH, CHAT_PATH,
};
use crate::dom::SelectedFile;
use crate::error::BackendError;

/// HTTP client for the agent suite backend
#[derive(Debug, Clone)]
pub struct AgentSuiteClient {
    client: Client,
    base_url: String,
}

impl AgentSuiteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn decode_json<T: serde::de::DeserializeOwned>(
    response: Response,
    url: &str,
) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| BackendError::decode(url, e))
}

#[async_trait]
impl AgentBackend for AgentSuiteClient {
    async fn list_agents(&self) -> Result<Vec<AgentDescriptor>, BackendError> {
        let url = self.url(AGENTS_PATH);
        debug!("Fetching agents from {}", url);
        let response = self.client.get(&url).send().await?;
        decode_json(response, &url).await
    }

    async fn analyze_feedback(&self, file: &SelectedFile) -> Result<Value, BackendError> {
        let url = self.url(ANALYZE_FEEDBACK_PATH);
        debug!("Uploading {} ({} bytes) to {}", file.name, file.bytes.len(), url);

        let mut part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| BackendError::InvalidUpload(e.to_string()))?;
        }
        // reqwest sets the multipart content type with its boundary
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        decode_json(response, &url).await
    }

    async fn chat(&self, user_prompt: &str) -> Result<Value, BackendError> {
        let url = self.url(CHAT_PATH);
        debug!("Sending chat turn to {}", url);
        let request = ChatRequest {
            user_prompt: user_prompt.to_string(),
        };
        let response = self.client.post(&url).json(&request).send().await?;
        decode_json(response, &url).await
    }

    async fn health_check(&self) -> Result<bool, BackendError> {
        let response = self.client.get(self.url("/")).send().await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn list_agents_decodes_sparse_descriptors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"agent_id": 1, "agent_name": "Instructor Assistant", "schema_name": "ia"},
                {"description": "no name"}
            ])))
            .mount(&server)
            .await;

        let client = AgentSuiteClient::new(format!("{}/", server.uri()));
        let agents = client.list_agents().await.unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].agent_name.as_deref(), Some("Instructor Assistant"));
        assert_eq!(agents[1].agent_name, None);
        assert_eq!(agents[1].description.as_deref(), Some("no name"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agents"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = AgentSuiteClient::new(server.uri());
        match client.list_agents().await {
            Err(BackendError::Status { status, .. }) => assert_eq!(status, 503),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_array_agents_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "x"})))
            .mount(&server)
            .await;

        let client = AgentSuiteClient::new(server.uri());
        assert!(matches!(
            client.list_agents().await,
            Err(BackendError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn chat_posts_user_prompt_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/jobplacement_rag/chat"))
            .and(body_json(json!({"user_prompt": "Hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Hi there"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = AgentSuiteClient::new(server.uri());
        let body = client.chat("Hello").await.unwrap();
        assert_eq!(body["response"], "Hi there");
    }

    #[tokio::test]
    async fn feedback_upload_is_multipart_with_file_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/instructor_assistant/analyze_feedback"))
            .and(header_regex("content-type", "^multipart/form-data; boundary=.+"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = AgentSuiteClient::new(server.uri());
        let file = SelectedFile::new("feedback.csv", b"rating,comment\n5,great".to_vec())
            .with_content_type("text/csv");
        let body = client.analyze_feedback(&file).await.unwrap();
        assert_eq!(body["response"], "ok");

        let requests = server.received_requests().await.unwrap();
        let sent = String::from_utf8_lossy(&requests[0].body);
        assert!(sent.contains("name=\"file\""));
        assert!(sent.contains("filename=\"feedback.csv\""));
        assert!(sent.contains("5,great"));
    }

    #[tokio::test]
    async fn health_check_reports_reachability() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(AgentSuiteClient::new(server.uri()).health_check().await.unwrap());
    }
}
