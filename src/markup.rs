use serde::{Deserialize, Serialize};

/// How backend- and user-supplied text is inserted into rendered markup.
///
/// `Trusted` inserts it verbatim, so any HTML in a summary, suggestion or
/// chat reply is live. `Escape` turns it into inert text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupPolicy {
    #[default]
    Trusted,
    Escape,
}

impl MarkupPolicy {
    pub fn apply(&self, text: &str) -> String {
        match self {
            MarkupPolicy::Trusted => text.to_string(),
            MarkupPolicy::Escape => escape_html(text),
        }
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, MarkupPolicy::Trusted)
    }
}

/// Escapes the characters that matter in HTML text and attribute values
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Applies the policy, then turns newlines into `<br>` line breaks
pub fn with_line_breaks(policy: MarkupPolicy, text: &str) -> String {
    policy.apply(text).replace('\n', "<br>")
}
