pub mod interface;
pub mod client;

pub use interface::{AgentBackend, AgentDescriptor, ChatRequest, FeedbackReport};
pub use client::AgentSuiteClient;
