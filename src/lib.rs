pub mod backend;
pub mod config;
pub mod dom;
pub mod error;
pub mod handlers;
pub mod markup;
pub mod pages;
pub mod routes;
pub mod state;
pub mod websocket;

pub use backend::{AgentBackend, AgentDescriptor, AgentSuiteClient};
pub use config::Config;
pub use error::BackendError;
pub use state::AppState;
