use std::sync::{Arc, Mutex, MutexGuard};

use crate::markup::escape_html;

/// A file held by a file input, as picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Browsers submit an unnamed empty part when the file input was left blank
    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.bytes.is_empty()
    }
}

#[derive(Debug, Clone)]
enum Content {
    Text(String),
    Markup(String),
}

#[derive(Debug)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    color: Option<String>,
    content: Content,
    children: Vec<Element>,
    value: String,
    files: Vec<SelectedFile>,
    scroll_top: usize,
}

/// Shared handle to a node in a page's element tree.
///
/// Cloning the handle aliases the same node; use [`Element::deep_clone`] for
/// an independent copy.
#[derive(Debug, Clone)]
pub struct Element {
    inner: Arc<Mutex<Node>>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Node {
                tag: tag.to_string(),
                id: None,
                classes: Vec::new(),
                attrs: Vec::new(),
                color: None,
                content: Content::Text(String::new()),
                children: Vec::new(),
                value: String::new(),
                files: Vec::new(),
                scroll_top: 0,
            })),
        }
    }

    pub fn with_id(self, id: &str) -> Self {
        self.node().id = Some(id.to_string());
        self
    }

    pub fn with_classes(self, classes: &str) -> Self {
        for class in classes.split_whitespace() {
            self.add_class(class);
        }
        self
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_markup(self, markup: &str) -> Self {
        self.set_inner_html(markup);
        self
    }

    pub fn with_child(self, child: Element) -> Self {
        self.append_child(child);
        self
    }

    // A poisoned lock only means another holder panicked mid-update; the node
    // itself is still plain data.
    fn node(&self) -> MutexGuard<'_, Node> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn same_node(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn id(&self) -> Option<String> {
        self.node().id.clone()
    }

    pub fn add_class(&self, class: &str) {
        let mut node = self.node();
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&self, class: &str) {
        self.node().classes.retain(|c| c != class);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.node().classes.iter().any(|c| c == class)
    }

    pub fn class_name(&self) -> String {
        self.node().classes.join(" ")
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        let mut node = self.node();
        match node.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => node.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.node()
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Inline `color` style; `None` resets it
    pub fn set_color(&self, color: Option<&str>) {
        self.node().color = color.map(|c| c.to_string());
    }

    pub fn color(&self) -> Option<String> {
        self.node().color.clone()
    }

    pub fn is_hidden(&self) -> bool {
        self.has_class("hidden")
    }

    /// Replaces all children with plain text, escaped on serialization
    pub fn set_text(&self, text: &str) {
        let mut node = self.node();
        node.children.clear();
        node.content = Content::Text(text.to_string());
    }

    /// Replaces all children with a raw markup fragment, inserted verbatim
    pub fn set_inner_html(&self, markup: &str) {
        let mut node = self.node();
        node.children.clear();
        node.content = Content::Markup(markup.to_string());
    }

    /// Text content of this node and its descendants, markup left as-is
    pub fn text(&self) -> String {
        let node = self.node();
        let mut out = match &node.content {
            Content::Text(t) | Content::Markup(t) => t.clone(),
        };
        for child in &node.children {
            out.push_str(&child.text());
        }
        out
    }

    pub fn inner_html(&self) -> String {
        let node = self.node();
        let mut out = match &node.content {
            Content::Text(t) => escape_html(t),
            Content::Markup(m) => m.clone(),
        };
        for child in &node.children {
            out.push_str(&child.to_html());
        }
        out
    }

    pub fn to_html(&self) -> String {
        let (open, tag) = {
            let node = self.node();
            let mut open = format!("<{}", node.tag);
            if let Some(id) = &node.id {
                open.push_str(&format!(" id=\"{}\"", escape_html(id)));
            }
            if !node.classes.is_empty() {
                open.push_str(&format!(" class=\"{}\"", escape_html(&node.classes.join(" "))));
            }
            if let Some(color) = &node.color {
                open.push_str(&format!(" style=\"color: {};\"", escape_html(color)));
            }
            for (name, value) in &node.attrs {
                open.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
            }
            if node.tag == "input" && !node.value.is_empty() {
                open.push_str(&format!(" value=\"{}\"", escape_html(&node.value)));
            }
            open.push('>');
            (open, node.tag.clone())
        };
        if matches!(tag.as_str(), "input" | "br" | "meta" | "link") {
            return open;
        }
        format!("{}{}</{}>", open, self.inner_html(), tag)
    }

    pub fn append_child(&self, child: Element) {
        self.node().children.push(child);
    }

    pub fn children(&self) -> Vec<Element> {
        self.node().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    /// Removes every child and any text or markup content
    pub fn clear(&self) {
        let mut node = self.node();
        node.children.clear();
        node.content = Content::Text(String::new());
    }

    /// Removes the first descendant with the given id; returns whether one was found
    pub fn remove_by_id(&self, id: &str) -> bool {
        let children = {
            let mut node = self.node();
            if let Some(pos) = node
                .children
                .iter()
                .position(|c| c.id().as_deref() == Some(id))
            {
                node.children.remove(pos);
                return true;
            }
            node.children.clone()
        };
        children.iter().any(|c| c.remove_by_id(id))
    }

    pub fn find_by_id(&self, id: &str) -> Option<Element> {
        if self.id().as_deref() == Some(id) {
            return Some(self.clone());
        }
        self.children().iter().find_map(|c| c.find_by_id(id))
    }

    /// Descendants (not including self) carrying the class, in document order
    pub fn find_all_by_class(&self, class: &str) -> Vec<Element> {
        let mut found = Vec::new();
        for child in self.children() {
            if child.has_class(class) {
                found.push(child.clone());
            }
            found.extend(child.find_all_by_class(class));
        }
        found
    }

    pub fn deep_clone(&self) -> Element {
        let node = self.node();
        let copy = Node {
            tag: node.tag.clone(),
            id: node.id.clone(),
            classes: node.classes.clone(),
            attrs: node.attrs.clone(),
            color: node.color.clone(),
            content: node.content.clone(),
            children: node.children.iter().map(|c| c.deep_clone()).collect(),
            value: node.value.clone(),
            files: node.files.clone(),
            scroll_top: node.scroll_top,
        };
        Element {
            inner: Arc::new(Mutex::new(copy)),
        }
    }

    pub fn value(&self) -> String {
        self.node().value.clone()
    }

    pub fn set_value(&self, value: &str) {
        self.node().value = value.to_string();
    }

    pub fn files(&self) -> Vec<SelectedFile> {
        self.node().files.clone()
    }

    pub fn set_files(&self, files: Vec<SelectedFile>) {
        self.node().files = files;
    }

    /// Form reset: clears values and file selections on this node and below
    pub fn reset(&self) {
        let children = {
            let mut node = self.node();
            node.value.clear();
            node.files.clear();
            node.children.clone()
        };
        for child in children {
            child.reset();
        }
    }

    pub fn scroll_top(&self) -> usize {
        self.node().scroll_top
    }

    /// Content height in rows, one per child
    pub fn scroll_height(&self) -> usize {
        self.node().children.len()
    }

    pub fn scroll_to_bottom(&self) {
        let mut node = self.node();
        node.scroll_top = node.children.len();
    }
}
