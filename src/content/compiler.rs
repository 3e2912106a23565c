//! MDX/Markdown compiler - turns source text into a compiled node stream

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use super::{CompiledBody, Node};
use crate::config::{HighlightConfig, ImagesConfig, SiteConfig};

/// Compiles document sources into serialized node streams.
///
/// The output payload (`CompiledBody.code`) is a JSON array of block-level
/// nodes; the renderer maps node kinds to builders at display time. Code
/// blocks are highlighted here with syntect, and external images are checked
/// against the configured host allow-list.
pub struct Compiler {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
    images: ImagesConfig,
    minify: bool,
}

/// The block currently being assembled at the top level of the event stream
enum Open {
    Heading { level: u8 },
    Code { lang: Option<String> },
    Container { kind: &'static str },
}

impl Compiler {
    /// Create a compiler for the given site configuration
    pub fn new(config: &SiteConfig) -> Self {
        Self::with_options(&config.highlight, config.images.clone(), config.minify)
    }

    /// Create with explicit settings
    pub fn with_options(highlight: &HighlightConfig, images: ImagesConfig, minify: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: highlight.theme.clone(),
            line_numbers: highlight.line_number,
            images,
            minify,
        }
    }

    /// Compile source text into a compiled body payload
    pub fn compile(&self, source: &str) -> Result<CompiledBody> {
        let mut nodes = self.compile_nodes(source);

        if self.minify {
            for node in &mut nodes {
                if node.kind != "code" {
                    node.html = node.html.take().map(|h| minify_html(&h));
                }
            }
        }

        let code = serde_json::to_string(&nodes)?;
        Ok(CompiledBody { code })
    }

    /// Compile source text into block-level nodes
    fn compile_nodes(&self, source: &str) -> Vec<Node> {
        // Enable most options but NOT YAML metadata blocks; front-matter is
        // stripped before the compiler runs.
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(source, options);
        let events = self.filter_images(parser);

        let mut nodes: Vec<Node> = Vec::new();
        let mut buf: Vec<Event> = Vec::new();
        let mut open: Option<Open> = None;
        let mut depth = 0usize;
        let mut heading_text = String::new();
        let mut code_content = String::new();

        for event in events {
            match event {
                Event::Start(tag) => {
                    if depth == 0 {
                        open = Some(match &tag {
                            Tag::Heading { level, .. } => {
                                heading_text.clear();
                                buf.clear();
                                Open::Heading {
                                    level: *level as u8,
                                }
                            }
                            Tag::CodeBlock(kind) => {
                                code_content.clear();
                                let lang = match kind {
                                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                                        Some(lang.to_string())
                                    }
                                    _ => None,
                                };
                                Open::Code { lang }
                            }
                            other => {
                                buf.clear();
                                let kind = container_kind(other);
                                buf.push(Event::Start(tag.clone()));
                                Open::Container { kind }
                            }
                        });
                    } else {
                        buf.push(Event::Start(tag));
                    }
                    depth += 1;
                }

                Event::End(tag_end) => {
                    depth = depth.saturating_sub(1);
                    if depth > 0 {
                        buf.push(Event::End(tag_end));
                        continue;
                    }
                    match open.take() {
                        Some(Open::Heading { level }) => {
                            let inner = events_to_html(buf.drain(..));
                            let mut node = Node::with_html("heading", inner.trim().to_string());
                            node.level = Some(level);
                            node.id = Some(slug::slugify(&heading_text));
                            node.text = Some(heading_text.clone());
                            nodes.push(node);
                        }
                        Some(Open::Code { lang }) => {
                            let highlighted =
                                self.highlight_code(&code_content, lang.as_deref());
                            let mut node = Node::with_html("code", highlighted);
                            node.lang = lang;
                            nodes.push(node);
                        }
                        Some(Open::Container { kind }) => {
                            buf.push(Event::End(tag_end));
                            let html = events_to_html(buf.drain(..));
                            nodes.push(Node::with_html(kind, html.trim().to_string()));
                        }
                        None => {}
                    }
                }

                Event::Text(text) => match &open {
                    Some(Open::Code { .. }) => code_content.push_str(&text),
                    Some(Open::Heading { .. }) => {
                        heading_text.push_str(&text);
                        buf.push(Event::Text(text));
                    }
                    _ => buf.push(Event::Text(text)),
                },

                Event::Code(code) => {
                    if matches!(&open, Some(Open::Heading { .. })) {
                        heading_text.push_str(&code);
                    }
                    buf.push(Event::Code(code));
                }

                Event::Rule if depth == 0 => {
                    nodes.push(Node::new("rule"));
                }

                other => {
                    if depth > 0 {
                        buf.push(other);
                    }
                }
            }
        }

        nodes
    }

    /// Replace images whose host is not allow-listed with plain links
    fn filter_images<'a>(&self, parser: Parser<'a>) -> Vec<Event<'a>> {
        let mut out = Vec::new();
        // Tracks, innermost last, whether each open image was demoted
        let mut demoted = Vec::new();

        for event in parser {
            match event {
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    if self.images.allows(&dest_url) {
                        demoted.push(false);
                        out.push(Event::Start(Tag::Image {
                            link_type,
                            dest_url,
                            title,
                            id,
                        }));
                    } else {
                        tracing::warn!(
                            "Image host not in images.domains, demoting to link: {}",
                            dest_url
                        );
                        demoted.push(true);
                        out.push(Event::Start(Tag::Link {
                            link_type,
                            dest_url,
                            title,
                            id,
                        }));
                    }
                }
                Event::End(TagEnd::Image) => {
                    if demoted.pop().unwrap_or(false) {
                        out.push(Event::End(TagEnd::Link));
                    } else {
                        out.push(Event::End(TagEnd::Image));
                    }
                }
                e => out.push(e),
            }
        }

        out
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let token = lang.unwrap_or("text");

        let syntax = self
            .syntax_set
            .find_syntax_by_token(token)
            .or_else(|| self.syntax_set.find_syntax_by_extension(token))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .unwrap_or_else(|| {
                self.theme_set
                    .themes
                    .values()
                    .next()
                    .expect("No themes available")
            });

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(highlighted) => {
                if self.line_numbers {
                    add_line_numbers(&highlighted)
                } else {
                    highlighted
                }
            }
            Err(_) => {
                // Fallback to a plain escaped code block
                format!(
                    r#"<pre><code class="language-{}">{}</code></pre>"#,
                    token,
                    html_escape(code)
                )
            }
        }
    }
}

/// Map a top-level container tag to a node kind.
///
/// Anything without a dedicated kind compiles as pre-rendered HTML so the
/// renderer's passthrough builder can display it.
fn container_kind(tag: &Tag) -> &'static str {
    match tag {
        Tag::Paragraph => "paragraph",
        Tag::List(_) => "list",
        Tag::BlockQuote(_) => "blockquote",
        Tag::Table(_) => "table",
        _ => "html",
    }
}

/// Render a buffered event run to an HTML fragment
fn events_to_html<'a>(events: impl Iterator<Item = Event<'a>>) -> String {
    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

/// Add a line-number gutter to highlighted code
fn add_line_numbers(code: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();
    let line_count = lines.len();

    let mut gutter = String::new();
    let mut code_lines = String::new();

    for (i, line) in lines.iter().enumerate() {
        gutter.push_str(&format!(r#"<span class="line-number">{}</span>"#, i + 1));
        code_lines.push_str(line);
        if i < line_count - 1 {
            gutter.push('\n');
            code_lines.push('\n');
        }
    }

    format!(
        r#"<table class="code-table"><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table>"#,
        gutter, code_lines
    )
}

/// Collapse indentation and blank lines in a compiled HTML fragment
fn minify_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    for line in html.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(trimmed);
    }
    out
}

/// Simple HTML escaping
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiler() -> Compiler {
        Compiler::with_options(&HighlightConfig::default(), ImagesConfig::default(), false)
    }

    #[test]
    fn test_compile_heading_and_paragraph() {
        let nodes = compiler().compile_nodes("# Hello World\n\nThis is a test.");
        assert_eq!(nodes.len(), 2);

        assert_eq!(nodes[0].kind, "heading");
        assert_eq!(nodes[0].level, Some(1));
        assert_eq!(nodes[0].id.as_deref(), Some("hello-world"));
        assert_eq!(nodes[0].html.as_deref(), Some("Hello World"));

        assert_eq!(nodes[1].kind, "paragraph");
        assert!(nodes[1].html.as_deref().unwrap().contains("This is a test."));
    }

    #[test]
    fn test_compile_code_block() {
        let nodes = compiler().compile_nodes("```rust\nfn main() {}\n```");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, "code");
        assert_eq!(nodes[0].lang.as_deref(), Some("rust"));
        assert!(nodes[0].html.as_deref().unwrap().contains("<pre"));
    }

    #[test]
    fn test_compile_list_and_rule() {
        let nodes = compiler().compile_nodes("- one\n- two\n\n---\n");
        assert_eq!(nodes[0].kind, "list");
        assert!(nodes[0].html.as_deref().unwrap().contains("<li>"));
        assert_eq!(nodes[1].kind, "rule");
    }

    #[test]
    fn test_allowed_image_survives() {
        let c = Compiler::with_options(
            &HighlightConfig::default(),
            ImagesConfig {
                domains: vec!["raw.githubusercontent.com".to_string()],
            },
            false,
        );
        let nodes =
            c.compile_nodes("![logo](https://raw.githubusercontent.com/a/b/logo.png)");
        let html = nodes[0].html.as_deref().unwrap();
        assert!(html.contains("<img"));
    }

    #[test]
    fn test_disallowed_image_demoted_to_link() {
        let c = Compiler::with_options(
            &HighlightConfig::default(),
            ImagesConfig {
                domains: vec!["raw.githubusercontent.com".to_string()],
            },
            false,
        );
        let nodes = c.compile_nodes("![logo](https://evil.example.com/logo.png)");
        let html = nodes[0].html.as_deref().unwrap();
        assert!(!html.contains("<img"));
        assert!(html.contains(r#"<a href="https://evil.example.com/logo.png""#));
    }

    #[test]
    fn test_compiled_body_is_json() {
        let body = compiler().compile("# Title\n\ntext").unwrap();
        let nodes = body.nodes().unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_minify_strips_blank_lines() {
        let c = Compiler::with_options(&HighlightConfig::default(), ImagesConfig::default(), true);
        let body = c.compile("para one\n\npara two").unwrap();
        for node in body.nodes().unwrap() {
            let html = node.html.unwrap();
            assert!(!html.contains("\n\n"));
        }
    }

    #[test]
    fn test_heading_with_inline_code() {
        let nodes = compiler().compile_nodes("## Using `docker build`");
        assert_eq!(nodes[0].kind, "heading");
        assert_eq!(nodes[0].id.as_deref(), Some("using-docker-build"));
        assert!(nodes[0].html.as_deref().unwrap().contains("<code>"));
    }
}
