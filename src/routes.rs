use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    response::Html,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::dom::{Element, SelectedFile};
use crate::pages::{chat, directory, feedback, layout};
use crate::pages::{DirectoryPage, FeedbackPage};
use crate::state::AppState;

pub const FEEDBACK_PAGE_PATH: &str = "/instructor_assistant/instructor_assistant.html";
pub const CHAT_PAGE_PATH: &str = "/jobplacement/jobplacement_chat.html";
pub const CHAT_SOCKET_PATH: &str = "/jobplacement/ws";

/// Largest feedback upload accepted, well above axum's 2 MB default
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn create_routes(state: AppState) -> Router<AppState> {
    let static_dir = &state.config.system_config.static_dir;

    Router::new()
        .route("/", get(directory_page))
        .route("/index.html", get(directory_page))
        .route(
            FEEDBACK_PAGE_PATH,
            get(feedback_page)
                .post(submit_feedback)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(CHAT_PAGE_PATH, get(chat_page))
        .route(CHAT_SOCKET_PATH, get(crate::websocket::websocket_handler))
        .route("/api/health", get(health_check))
        .nest_service("/static", ServeDir::new(static_dir))
}

/// Full application with layers and state applied
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let backend_healthy = state.backend.health_check().await.unwrap_or(false);
    Json(json!({
        "status": "ok",
        "backend": backend_healthy
    }))
}

async fn directory_page(State(state): State<AppState>) -> Html<String> {
    let (container, loading) = directory::skeleton();
    let page = DirectoryPage::new(
        container.clone(),
        loading,
        state.config.agent_links.clone(),
        state.config.system_config.markup_policy,
        state.backend.clone(),
    );
    page.load().await;

    let body = Element::new("section")
        .with_child(
            Element::new("h1")
                .with_classes("text-2xl font-bold text-gray-900")
                .with_text("Available Agents"),
        )
        .with_child(container);
    Html(layout::document("Agent Suite", &body, None))
}

fn feedback_document(skeleton: &feedback::FeedbackSkeleton) -> Html<String> {
    let body = Element::new("section")
        .with_classes("upload-card")
        .with_child(Element::new("h1").with_text("Instructor Assistant"))
        .with_child(
            Element::new("p")
                .with_classes("text-gray-500")
                .with_text("Upload a CSV or JSON file of student feedback to get a summary, overall sentiment and suggestions."),
        )
        .with_child(skeleton.form.clone())
        .with_child(skeleton.loading_indicator.clone())
        .with_child(skeleton.output.clone());
    Html(layout::document("Instructor Assistant", &body, None))
}

async fn feedback_page() -> Html<String> {
    feedback_document(&feedback::skeleton())
}

async fn submit_feedback(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Html<String> {
    let skeleton = feedback::skeleton();
    let page = FeedbackPage::new(
        &skeleton,
        state.config.system_config.markup_policy,
        state.backend.clone(),
    );

    match read_file_field(&mut multipart).await {
        Ok(files) => {
            skeleton.file_input.set_files(files);
            page.submit().await;
        }
        Err(e) => {
            page.fail_upload(&e);
        }
    }
    feedback_document(&skeleton)
}

/// Files sent under the `file` field
async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<Vec<SelectedFile>, MultipartError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|c| c.to_string());
        let bytes = field.bytes().await?;
        files.push(SelectedFile {
            name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

async fn chat_page() -> Html<String> {
    let (window, input) = chat::skeleton();
    let form = Element::new("form")
        .with_id("chat-form")
        .with_classes("chat-form")
        .with_child(input)
        .with_child(
            Element::new("button")
                .with_attr("type", "submit")
                .with_text("Send"),
        );
    let body = Element::new("section")
        .with_classes("chat-card")
        .with_child(
            Element::new("div")
                .with_classes("chat-header")
                .with_child(Element::new("h1").with_text("Job Placement Assistant"))
                .with_child(
                    Element::new("button")
                        .with_id("clear-chat")
                        .with_attr("type", "button")
                        .with_text("Clear chat"),
                ),
        )
        .with_child(window)
        .with_child(form);
    Html(layout::document(
        "Job Placement Assistant",
        &body,
        Some(layout::CHAT_SCRIPT),
    ))
}
