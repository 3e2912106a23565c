//! Renderer - maps compiled node kinds to HTML builders

use indexmap::IndexMap;

use crate::content::{html_escape, CompiledBody, Node};
use crate::error::Error;

/// Builds the HTML for one node kind
type Builder = fn(&Node) -> String;

/// Turns compiled bodies into displayable HTML.
///
/// Node kinds dispatch through a mapping table resolved once at
/// construction. A kind with no entry goes through the fallback builder so a
/// single unknown node never fails the page. Stateless; rendering the same
/// body twice yields identical output.
pub struct Renderer {
    builders: IndexMap<&'static str, Builder>,
    fallback: Builder,
}

impl Renderer {
    /// Create a renderer with the standard mapping table
    pub fn new() -> Self {
        let mut builders: IndexMap<&'static str, Builder> = IndexMap::new();
        builders.insert("heading", build_heading);
        builders.insert("paragraph", build_passthrough);
        builders.insert("code", build_code);
        builders.insert("list", build_passthrough);
        builders.insert("blockquote", build_passthrough);
        builders.insert("table", build_passthrough);
        builders.insert("rule", build_rule);
        builders.insert("html", build_passthrough);

        Self {
            builders,
            fallback: build_fallback,
        }
    }

    /// Render a compiled body into an HTML fragment
    pub fn render(&self, body: &CompiledBody) -> Result<String, Error> {
        let nodes = body.nodes()?;
        let parts: Vec<String> = nodes.iter().map(|n| self.render_node(n)).collect();
        Ok(parts.join("\n"))
    }

    fn render_node(&self, node: &Node) -> String {
        match self.builders.get(node.kind.as_str()) {
            Some(builder) => builder(node),
            None => {
                tracing::debug!("No builder for node kind {:?}, using fallback", node.kind);
                (self.fallback)(node)
            }
        }
    }

    /// The node kinds this renderer has builders for
    pub fn known_kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builders.keys().copied()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn build_heading(node: &Node) -> String {
    let level = node.level.unwrap_or(1).clamp(1, 6);
    let inner = node.html.as_deref().unwrap_or_default();
    match &node.id {
        Some(id) => format!(r#"<h{level} id="{id}">{inner}</h{level}>"#),
        None => format!("<h{level}>{inner}</h{level}>"),
    }
}

fn build_code(node: &Node) -> String {
    let lang = node.lang.as_deref().unwrap_or("text");
    let inner = node.html.as_deref().unwrap_or_default();
    format!(r#"<figure class="highlight {lang}">{inner}</figure>"#)
}

fn build_rule(_node: &Node) -> String {
    "<hr>".to_string()
}

/// Container kinds carry their markup pre-rendered
fn build_passthrough(node: &Node) -> String {
    node.html.clone().unwrap_or_default()
}

/// Unknown kinds degrade to escaped content instead of failing the page
fn build_fallback(node: &Node) -> String {
    let payload = node
        .text
        .as_deref()
        .or(node.html.as_deref())
        .unwrap_or_default();
    format!(
        r#"<div class="unknown-node" data-kind="{}">{}</div>"#,
        html_escape(&node.kind),
        html_escape(payload)
    )
}
