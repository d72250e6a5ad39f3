use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::backend::{AgentBackend, FeedbackReport};
use crate::dom::{Element, SelectedFile};
use crate::markup::{escape_html, MarkupPolicy};

pub const NO_FILE_MESSAGE: &str = "Please select a file to upload.";
pub const UNEXPECTED_FORMAT_MESSAGE: &str =
    "Received an unexpected response format from the server.";
pub const UPLOAD_FAILED_MESSAGE: &str = "An error occurred while uploading the file. Please ensure the backend is running and check the console for details.";
pub const ERROR_COLOR: &str = "#ef4444";

const SUMMARY_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><path d="M2 3h6a4 4 0 0 1 4 4v14a3 3 0 0 0-3-3H2z"></path><path d="M22 3h-6a4 4 0 0 0-4 4v14a3 3 0 0 1 3-3h7z"></path></svg>"#;
const SENTIMENT_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><circle cx="12" cy="12" r="10"></circle><path d="M8 14s1.5 2 4 2 4-2 4-2"></path><line x1="9" y1="9" x2="9.01" y2="9"></line><line x1="15" y1="9" x2="15.01" y2="9"></line></svg>"#;
const SUGGESTIONS_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><path d="M21.73 18a2.62 2.62 0 0 1-1.73 1H4a2 2 0 0 1-2-2V5a2 2 0 0 1 2-2h14a2 2 0 0 1 2 2v10l-2.05-2.05a2.62 2.62 0 0 1-1.73-1H6"></path></svg>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackOutcome {
    /// No file selected; nothing was sent
    Rejected,
    Report,
    Fallback,
    Failed,
}

/// Markup for the analysis report
pub fn render_report(report: &FeedbackReport, policy: MarkupPolicy) -> String {
    let suggestions: String = report
        .action_suggestions
        .iter()
        .map(|s| format!("<li>{}</li>", policy.apply(s)))
        .collect();

    // The class suffix is an attribute value, so it is always escaped.
    let sentiment_class = escape_html(&report.sentiment.to_lowercase());

    format!(
        r#"<div class="report"><h3 class="report-title">Feedback Analysis Report</h3><div class="report-section"><h4 class="section-title">{summary_icon}<span>Summary</span></h4><p class="section-content">{summary}</p></div><div class="report-section"><h4 class="section-title">{sentiment_icon}<span>Overall Sentiment</span></h4><div class="section-content"><span class="sentiment-badge sentiment-{sentiment_class}">{sentiment}</span></div></div><div class="report-section"><h4 class="section-title">{suggestions_icon}<span>Actionable Suggestions</span></h4><ul class="section-content suggestion-list">{suggestions}</ul></div></div>"#,
        summary_icon = SUMMARY_ICON,
        summary = policy.apply(&report.summary),
        sentiment_icon = SENTIMENT_ICON,
        sentiment_class = sentiment_class,
        sentiment = policy.apply(&report.sentiment),
        suggestions_icon = SUGGESTIONS_ICON,
        suggestions = suggestions,
    )
}

/// Elements of a fresh feedback page
pub struct FeedbackSkeleton {
    pub form: Element,
    pub file_input: Element,
    pub output: Element,
    pub loading_indicator: Element,
}

pub fn skeleton() -> FeedbackSkeleton {
    let file_input = Element::new("input")
        .with_id("file-input")
        .with_attr("type", "file")
        .with_attr("name", "file")
        .with_attr("accept", ".csv,.json,.txt");
    let form = Element::new("form")
        .with_id("upload-form")
        .with_attr("method", "post")
        .with_attr("enctype", "multipart/form-data")
        .with_child(file_input.clone())
        .with_child(
            Element::new("button")
                .with_attr("type", "submit")
                .with_classes("upload-button")
                .with_text("Analyze Feedback"),
        );
    let loading_indicator = Element::new("div")
        .with_id("loading-indicator")
        .with_classes("loading hidden")
        .with_text("Analyzing feedback...");
    let output = Element::new("div").with_id("response-output");
    FeedbackSkeleton {
        form,
        file_input,
        output,
        loading_indicator,
    }
}

/// Controller for the feedback upload form
pub struct FeedbackPage {
    form: Element,
    file_input: Element,
    output: Element,
    loading_indicator: Element,
    policy: MarkupPolicy,
    backend: Arc<dyn AgentBackend>,
}

impl FeedbackPage {
    pub fn new(
        skeleton: &FeedbackSkeleton,
        policy: MarkupPolicy,
        backend: Arc<dyn AgentBackend>,
    ) -> Self {
        Self {
            form: skeleton.form.clone(),
            file_input: skeleton.file_input.clone(),
            output: skeleton.output.clone(),
            loading_indicator: skeleton.loading_indicator.clone(),
            policy,
            backend,
        }
    }

    pub fn output(&self) -> &Element {
        &self.output
    }

    fn selected_file(&self) -> Option<SelectedFile> {
        self.file_input
            .files()
            .into_iter()
            .next()
            .filter(|f| !f.is_blank())
    }

    pub async fn submit(&self) -> FeedbackOutcome {
        let Some(file) = self.selected_file() else {
            self.output.set_text(NO_FILE_MESSAGE);
            self.output.set_color(Some(ERROR_COLOR));
            return FeedbackOutcome::Rejected;
        };

        self.loading_indicator.remove_class("hidden");
        self.output.set_text("");
        self.output.set_color(None);

        match self.backend.analyze_feedback(&file).await {
            Ok(body) => {
                let outcome = self.render_response(&body);
                self.loading_indicator.add_class("hidden");
                self.form.reset();
                outcome
            }
            Err(e) => self.fail_upload(&e),
        }
    }

    /// Shows the red upload error, hides the indicator and resets the form
    pub fn fail_upload(&self, cause: &dyn std::fmt::Display) -> FeedbackOutcome {
        error!("Error during file upload: {}", cause);
        self.output.set_text(UPLOAD_FAILED_MESSAGE);
        self.output.set_color(Some(ERROR_COLOR));
        self.loading_indicator.add_class("hidden");
        self.form.reset();
        FeedbackOutcome::Failed
    }

    fn render_response(&self, body: &Value) -> FeedbackOutcome {
        if let Some(report) = FeedbackReport::from_value(body) {
            info!(
                "Rendering feedback report with {} suggestions",
                report.action_suggestions.len()
            );
            self.output.set_inner_html(&render_report(&report, self.policy));
            return FeedbackOutcome::Report;
        }

        let text = body
            .get("response")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNEXPECTED_FORMAT_MESSAGE);
        self.output.set_text(text);
        FeedbackOutcome::Fallback
    }
}
