//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub store_dir: String,

    // Build pipeline
    #[serde(default)]
    pub mdx: MdxConfig,
    pub minify: bool,
    pub compress: bool,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "mdxdocs".to_string(),
            description: String::new(),
            author: String::new(),
            language: "en".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            source_dir: "content".to_string(),
            store_dir: ".mdxdocs/store".to_string(),

            mdx: MdxConfig::default(),
            minify: false,
            compress: false,
            images: ImagesConfig::default(),
            highlight: HighlightConfig::default(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// MDX compiler configuration
///
/// When `rs` is false, `.mdx` sources are skipped with a warning instead of
/// going through the native compiler. Plain `.md` sources always compile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MdxConfig {
    pub rs: bool,
}

impl Default for MdxConfig {
    fn default() -> Self {
        Self { rs: true }
    }
}

/// External image host allow-list
///
/// An image whose host is not listed is demoted to a plain link at compile
/// time. Relative paths are always allowed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ImagesConfig {
    pub domains: Vec<String>,
}

impl ImagesConfig {
    /// Check whether an image source URL is allowed
    pub fn allows(&self, src: &str) -> bool {
        match extract_host(src) {
            Some(host) => self.domains.iter().any(|d| d == host),
            // Relative path, always served locally
            None => true,
        }
    }
}

/// Extract the host portion of an absolute URL, if any
fn extract_host(src: &str) -> Option<&str> {
    let rest = src
        .strip_prefix("https://")
        .or_else(|| src.strip_prefix("http://"))
        .or_else(|| src.strip_prefix("//"))?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let host = &rest[..end];
    // Strip port and credentials
    let host = host.rsplit('@').next().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    Some(host)
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.source_dir, "content");
        assert_eq!(config.store_dir, ".mdxdocs/store");
        assert!(config.mdx.rs);
        assert!(!config.minify);
        assert!(!config.compress);
        assert!(config.images.domains.is_empty());
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
title: My Docs
url: https://docs.example.com
mdx:
  rs: false
minify: true
compress: true
images:
  domains:
    - raw.githubusercontent.com
    - images.emojiterra.com
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Docs");
        assert!(!config.mdx.rs);
        assert!(config.minify);
        assert!(config.compress);
        assert_eq!(config.images.domains.len(), 2);
        // Unspecified fields fall back to defaults
        assert_eq!(config.source_dir, "content");
    }

    #[test]
    fn test_image_allow_list() {
        let images = ImagesConfig {
            domains: vec!["raw.githubusercontent.com".to_string()],
        };
        assert!(images.allows("https://raw.githubusercontent.com/a/b/img.png"));
        assert!(images.allows("/assets/local.png"));
        assert!(images.allows("../relative.png"));
        assert!(!images.allows("https://evil.example.com/img.png"));
        assert!(!images.allows("//cdn.example.com/img.png"));
    }

    #[test]
    fn test_extract_host_with_port() {
        assert_eq!(
            extract_host("http://localhost:3000/img.png"),
            Some("localhost")
        );
        assert_eq!(extract_host("assets/img.png"), None);
    }
}
