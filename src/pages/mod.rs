pub mod chat;
pub mod directory;
pub mod feedback;
pub mod layout;

pub use chat::{ChatPage, Sender, TurnOutcome};
pub use directory::{AgentLink, DirectoryOutcome, DirectoryPage, LinkOverrides};
pub use feedback::{FeedbackOutcome, FeedbackPage};
