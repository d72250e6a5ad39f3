use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::backend::{AgentBackend, AgentDescriptor};
use crate::dom::Element;
use crate::markup::MarkupPolicy;

pub const NO_AGENTS_MESSAGE: &str = "No agents are available at the moment.";
pub const LOAD_FAILED_MESSAGE: &str =
    "Failed to load agents. Please check the connection and try again.";
pub const UNNAMED_AGENT: &str = "Unnamed Agent";
pub const UNKNOWN_AGENT: &str = "Unknown Agent";

pub const DEFAULT_ICON_SVG: &str = r#"<svg class="h-8 w-8 text-gray-400" xmlns="http://www.w3.org/2000/svg" fill="none" viewBox="0 0 24 24" stroke="currentColor" aria-hidden="true"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M8 9l4-4 4 4m0 6l-4 4-4-4" /></svg>"#;

const ACTIVE_LINK_CLASSES: &str = "agent-link font-medium brand-text brand-text-hover";
const INACTIVE_LINK_CLASSES: &str = "agent-link font-medium text-gray-400 cursor-not-allowed";

/// Agent name -> page path, consulted before the descriptor's own link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkOverrides(HashMap<String, String>);

impl Default for LinkOverrides {
    fn default() -> Self {
        let mut table = HashMap::new();
        table.insert(
            "Instructor Assistant".to_string(),
            "instructor_assistant/instructor_assistant.html".to_string(),
        );
        table.insert(
            "Job Placement RAG".to_string(),
            "jobplacement/jobplacement_chat.html".to_string(),
        );
        Self(table)
    }
}

impl LinkOverrides {
    pub fn get(&self, agent_name: &str) -> Option<&str> {
        self.0.get(agent_name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentLink {
    Override(String),
    Backend(String),
    Inactive,
}

impl AgentLink {
    pub fn href(&self) -> &str {
        match self {
            AgentLink::Override(path) | AgentLink::Backend(path) => path,
            AgentLink::Inactive => "#",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, AgentLink::Inactive)
    }
}

/// Override table first, then the descriptor's link, else inactive
pub fn resolve_link(agent: &AgentDescriptor, overrides: &LinkOverrides) -> AgentLink {
    if let Some(path) = agent.agent_name.as_deref().and_then(|n| overrides.get(n)) {
        return AgentLink::Override(path.to_string());
    }
    match agent.link.as_deref() {
        Some(link) if !link.is_empty() => AgentLink::Backend(link.to_string()),
        _ => AgentLink::Inactive,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Builds one agent card; the anchor carries the `agent-link` class
pub fn render_card(agent: &AgentDescriptor, link: &AgentLink, policy: MarkupPolicy) -> Element {
    let icon = match non_empty(&agent.icon_svg) {
        Some(svg) if policy.is_trusted() => svg.to_string(),
        _ => DEFAULT_ICON_SVG.to_string(),
    };
    let name = non_empty(&agent.agent_name).unwrap_or(UNNAMED_AGENT);
    let description = agent.description.as_deref().unwrap_or("");

    let anchor = Element::new("a").with_attr("href", link.href());
    if link.is_active() {
        anchor.set_inner_html("Go to agent &rarr;");
        for class in ACTIVE_LINK_CLASSES.split_whitespace() {
            anchor.add_class(class);
        }
    } else {
        anchor.set_text("Not available");
        anchor.set_attr("onclick", "return false;");
        for class in INACTIVE_LINK_CLASSES.split_whitespace() {
            anchor.add_class(class);
        }
    }

    let body = Element::new("div").with_classes("p-5").with_child(
        Element::new("div")
            .with_classes("flex items-center")
            .with_child(
                Element::new("div")
                    .with_classes("agent-icon flex-shrink-0")
                    .with_markup(&icon),
            )
            .with_child(
                Element::new("div").with_classes("ml-5 w-0 flex-1").with_child(
                    Element::new("dl")
                        .with_child(
                            Element::new("dt")
                                .with_classes("agent-name text-sm font-medium text-gray-500 truncate")
                                .with_markup(&policy.apply(name)),
                        )
                        .with_child(
                            Element::new("dd").with_child(
                                Element::new("div")
                                    .with_classes("agent-description text-lg font-medium text-gray-900")
                                    .with_markup(&policy.apply(description)),
                            ),
                        ),
                ),
            ),
    );

    let footer = Element::new("div")
        .with_classes("bg-gray-50 px-5 py-3")
        .with_child(Element::new("div").with_classes("text-sm").with_child(anchor));

    Element::new("div")
        .with_classes("agent-card bg-white overflow-hidden shadow rounded-lg")
        .with_child(body)
        .with_child(footer)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryOutcome {
    pub cards: usize,
    /// Names of agents rendered with a disabled link
    pub inactive: Vec<String>,
    pub failed: bool,
}

/// Fresh `agent-list` container holding the `loading-state` placeholder
pub fn skeleton() -> (Element, Element) {
    let loading = Element::new("p")
        .with_id("loading-state")
        .with_classes("col-span-full text-center text-gray-500")
        .with_text("Loading agents...");
    let container = Element::new("div")
        .with_id("agent-list")
        .with_classes("grid grid-cols-1 gap-5 sm:grid-cols-2 lg:grid-cols-3")
        .with_child(loading.clone());
    (container, loading)
}

/// Controller for the agent directory
pub struct DirectoryPage {
    container: Element,
    loading: Element,
    overrides: LinkOverrides,
    policy: MarkupPolicy,
    backend: Arc<dyn AgentBackend>,
}

impl DirectoryPage {
    pub fn new(
        container: Element,
        loading: Element,
        overrides: LinkOverrides,
        policy: MarkupPolicy,
        backend: Arc<dyn AgentBackend>,
    ) -> Self {
        Self {
            container,
            loading,
            overrides,
            policy,
            backend,
        }
    }

    pub fn container(&self) -> &Element {
        &self.container
    }

    /// Fetch the directory once and render it
    pub async fn load(&self) -> DirectoryOutcome {
        match self.backend.list_agents().await {
            Ok(agents) => self.render(&agents),
            Err(e) => {
                error!("Failed to fetch agents: {}", e);
                self.loading.set_text(LOAD_FAILED_MESSAGE);
                self.loading.add_class("text-red-500");
                DirectoryOutcome {
                    failed: true,
                    ..Default::default()
                }
            }
        }
    }

    pub fn render(&self, agents: &[AgentDescriptor]) -> DirectoryOutcome {
        self.container.clear();

        if agents.is_empty() {
            self.container.append_child(
                Element::new("p")
                    .with_classes("no-agents col-span-full text-center text-gray-500")
                    .with_text(NO_AGENTS_MESSAGE),
            );
            return DirectoryOutcome::default();
        }

        let mut outcome = DirectoryOutcome::default();
        for agent in agents {
            let link = resolve_link(agent, &self.overrides);
            if !link.is_active() {
                let name = non_empty(&agent.agent_name).unwrap_or(UNKNOWN_AGENT);
                warn!(
                    "Agent \"{}\" is missing a 'link' property from the backend and has no frontend override. The link has been disabled.",
                    name
                );
                outcome.inactive.push(name.to_string());
            }
            self.container
                .append_child(render_card(agent, &link, self.policy));
            outcome.cards += 1;
        }
        info!("Rendered {} agent cards", outcome.cards);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SelectedFile;
    use crate::error::BackendError;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeDirectory {
        agents: Option<Vec<AgentDescriptor>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AgentBackend for FakeDirectory {
        async fn list_agents(&self) -> Result<Vec<AgentDescriptor>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.agents.clone().ok_or(BackendError::Status {
                status: 500,
                url: "/api/agents".to_string(),
            })
        }

        async fn analyze_feedback(&self, _file: &SelectedFile) -> Result<Value, BackendError> {
            unreachable!("directory never uploads")
        }

        async fn chat(&self, _user_prompt: &str) -> Result<Value, BackendError> {
            unreachable!("directory never chats")
        }
    }

    fn page(agents: Option<Vec<AgentDescriptor>>) -> (DirectoryPage, Arc<FakeDirectory>) {
        let backend = Arc::new(FakeDirectory {
            agents,
            calls: AtomicUsize::new(0),
        });
        let (container, loading) = skeleton();
        let page = DirectoryPage::new(
            container,
            loading,
            LinkOverrides::default(),
            MarkupPolicy::Trusted,
            backend.clone(),
        );
        (page, backend)
    }

    #[test]
    fn override_beats_backend_link() {
        let mut agent = AgentDescriptor::named("Instructor Assistant");
        agent.link = Some("https://elsewhere.example/ia".to_string());
        assert_eq!(
            resolve_link(&agent, &LinkOverrides::default()),
            AgentLink::Override("instructor_assistant/instructor_assistant.html".to_string())
        );
    }

    #[test]
    fn backend_link_used_when_no_override() {
        let mut agent = AgentDescriptor::named("Resume Coach");
        agent.link = Some("coach.html".to_string());
        assert_eq!(
            resolve_link(&agent, &LinkOverrides::default()),
            AgentLink::Backend("coach.html".to_string())
        );
    }

    #[test]
    fn empty_link_without_override_is_inactive() {
        let mut agent = AgentDescriptor::named("Resume Coach");
        agent.link = Some(String::new());
        assert_eq!(resolve_link(&agent, &LinkOverrides::default()), AgentLink::Inactive);
        assert_eq!(
            resolve_link(&AgentDescriptor::default(), &LinkOverrides::default()),
            AgentLink::Inactive
        );
    }

    #[test]
    fn override_match_is_exact() {
        let agent = AgentDescriptor::named("instructor assistant");
        assert_eq!(resolve_link(&agent, &LinkOverrides::default()), AgentLink::Inactive);
    }

    #[tokio::test]
    async fn empty_directory_renders_only_placeholder() {
        let (page, backend) = page(Some(vec![]));
        let outcome = page.load().await;

        assert_eq!(outcome, DirectoryOutcome::default());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        let children = page.container().children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].text(), NO_AGENTS_MESSAGE);
        assert!(page.container().find_all_by_class("agent-card").is_empty());
    }

    #[tokio::test]
    async fn cards_follow_input_order_with_fallbacks() {
        let mut coach = AgentDescriptor::named("Resume Coach");
        coach.description = Some("Polishes resumes".to_string());
        coach.icon_svg = Some("<svg id=\"coach\"></svg>".to_string());
        coach.link = Some("coach.html".to_string());
        let nameless = AgentDescriptor::default();

        let (page, _) = page(Some(vec![coach, nameless]));
        let outcome = page.load().await;

        assert_eq!(outcome.cards, 2);
        assert_eq!(outcome.inactive, vec![UNKNOWN_AGENT.to_string()]);

        let cards = page.container().find_all_by_class("agent-card");
        assert_eq!(cards.len(), 2);
        assert!(page.container().find_by_id("loading-state").is_none());

        let part = |card: &Element, class: &str| card.find_all_by_class(class)[0].clone();

        let first = &cards[0];
        assert_eq!(part(first, "agent-name").text(), "Resume Coach");
        assert_eq!(part(first, "agent-description").text(), "Polishes resumes");
        assert!(part(first, "agent-icon").inner_html().contains("coach"));
        assert_eq!(
            part(first, "agent-link").attr("href").as_deref(),
            Some("coach.html")
        );

        let second = &cards[1];
        assert_eq!(part(second, "agent-name").text(), UNNAMED_AGENT);
        assert_eq!(part(second, "agent-description").text(), "");
        assert_eq!(part(second, "agent-icon").inner_html(), DEFAULT_ICON_SVG);
        let link = part(second, "agent-link");
        assert_eq!(link.attr("href").as_deref(), Some("#"));
        assert_eq!(link.attr("onclick").as_deref(), Some("return false;"));
        assert!(link.has_class("cursor-not-allowed"));
        assert_eq!(link.text(), "Not available");
    }

    #[tokio::test]
    async fn overridden_card_links_to_table_path() {
        let mut ia = AgentDescriptor::named("Job Placement RAG");
        ia.link = Some("ignored.html".to_string());
        let (page, _) = page(Some(vec![ia]));
        let outcome = page.load().await;

        assert!(outcome.inactive.is_empty());
        let link = &page.container().find_all_by_class("agent-link")[0];
        assert_eq!(link.attr("href").as_deref(), Some("jobplacement/jobplacement_chat.html"));
        assert!(link.has_class("brand-text"));
    }

    #[tokio::test]
    async fn failure_marks_loading_placeholder() {
        let (page, backend) = page(None);
        let outcome = page.load().await;

        assert!(outcome.failed);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        let loading = page.container().find_by_id("loading-state").unwrap();
        assert_eq!(loading.text(), LOAD_FAILED_MESSAGE);
        assert!(loading.has_class("text-red-500"));
    }

    #[test]
    fn escape_policy_neutralizes_names_and_icons() {
        let mut agent = AgentDescriptor::named("<script>x</script>");
        agent.icon_svg = Some("<svg onload=\"x()\"></svg>".to_string());
        let card = render_card(&agent, &AgentLink::Inactive, MarkupPolicy::Escape);

        let html = card.to_html();
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("onload"));
        assert!(html.contains(DEFAULT_ICON_SVG));
    }
}
