//! Layout shell - embedded Tera templates for the page chrome
//!
//! The shell wraps rendered content with a fixed-height header and an
//! independently scrolling content region. All templates are embedded in the
//! binary.

use anyhow::Result;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{html_escape, Document};
use crate::theme::ThemePreference;

/// Characters percent-encoded inside a path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'%')
    .add(b'/');

/// Page shell renderer with embedded templates
pub struct Shell {
    tera: Tera,
}

impl Shell {
    /// Create a shell with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // The shell emits HTML fragments produced by the renderer; escaping
        // happens upstream where untrusted strings enter a context.
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("templates/layout.html")),
            ("document.html", include_str!("templates/document.html")),
            ("index.html", include_str!("templates/index.html")),
            ("not_found.html", include_str!("templates/not_found.html")),
        ])?;

        tera.register_filter("doc_url", doc_url_filter);

        Ok(Self { tera })
    }

    /// Render a resolved document inside the shell
    pub fn document_page(
        &self,
        config: &SiteConfig,
        theme: ThemePreference,
        doc: &Document,
        content_html: &str,
    ) -> Result<String> {
        let mut context = base_context(config, theme, doc.description.as_deref());
        context.insert("doc", &DocView::from(doc));
        context.insert("content", content_html);
        Ok(self.tera.render("document.html", &context)?)
    }

    /// Render the document index
    pub fn index_page(
        &self,
        config: &SiteConfig,
        theme: ThemePreference,
        docs: &[Document],
    ) -> Result<String> {
        let description = (!config.description.is_empty()).then_some(config.description.as_str());
        let mut context = base_context(config, theme, description);
        let views: Vec<DocView> = docs.iter().map(DocView::from).collect();
        context.insert("docs", &views);
        Ok(self.tera.render("index.html", &context)?)
    }

    /// Render the full-page not-found response
    pub fn not_found_page(
        &self,
        config: &SiteConfig,
        theme: ThemePreference,
        slug: &str,
    ) -> Result<String> {
        let mut context = base_context(config, theme, None);
        // The slug comes straight from the request path
        context.insert("slug", &html_escape(slug));
        Ok(self.tera.render("not_found.html", &context)?)
    }
}

fn base_context(config: &SiteConfig, theme: ThemePreference, description: Option<&str>) -> Context {
    let mut context = Context::new();
    context.insert(
        "site",
        &SiteChrome {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            root: config.root.clone(),
        },
    );
    context.insert("theme", theme.as_str());
    context.insert("description", &description);
    context
}

/// Build the canonical URL for a document slug
pub fn doc_url(slug: &str) -> String {
    format!("/docs/{}", utf8_percent_encode(slug, SEGMENT))
}

/// Tera filter: slug to document URL
fn doc_url_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let slug = tera::try_get_value!("doc_url", "value", String, value);
    Ok(tera::Value::String(doc_url(&slug)))
}

/// Site fields exposed to templates
#[derive(Debug, Clone, Serialize)]
struct SiteChrome {
    title: String,
    description: String,
    language: String,
    root: String,
}

/// Document fields exposed to templates
#[derive(Debug, Clone, Serialize)]
struct DocView {
    slug: String,
    title: String,
    description: Option<String>,
    date: Option<String>,
}

impl From<&Document> for DocView {
    fn from(doc: &Document) -> Self {
        Self {
            slug: doc.slug.clone(),
            title: doc.title.clone(),
            description: doc.description.clone(),
            date: doc.date.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}
