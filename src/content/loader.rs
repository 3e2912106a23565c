//! Content loader - loads and compiles document sources

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::{Compiler, Document, FrontMatter};
use crate::Site;

/// Loads sources from the source directory and compiles them into documents
pub struct ContentLoader<'a> {
    site: &'a Site,
    compiler: Compiler,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        let compiler = Compiler::new(&site.config);
        Self { site, compiler }
    }

    /// All compilable source files under the source directory, sorted
    pub fn source_files(&self) -> Vec<std::path::PathBuf> {
        let source_dir = &self.site.source_dir;
        if !source_dir.exists() {
            return Vec::new();
        }

        let mut paths: Vec<_> = WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p.is_file() && self.is_source_file(p))
            .collect();
        paths.sort();
        paths
    }

    /// Load and compile all published documents
    pub fn load_documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for path in self.source_files() {
            match self.load_document(&path) {
                Ok(Some(doc)) => documents.push(doc),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Failed to load document {:?}: {}", path, e);
                }
            }
        }

        // Sort by date descending, undated documents last by slug
        documents.sort_by(|a, b| match (&b.date, &a.date) {
            (Some(db), Some(da)) => db.cmp(da),
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (None, None) => a.slug.cmp(&b.slug),
        });

        Ok(documents)
    }

    /// Load and compile a single source file.
    ///
    /// Returns `Ok(None)` for unpublished documents.
    pub fn load_document(&self, path: &Path) -> Result<Option<Document>> {
        let content = fs::read_to_string(path)?;
        let (fm, body) = FrontMatter::parse(&content)?;

        if !fm.is_published() {
            tracing::debug!("Skipping unpublished document {:?}", path);
            return Ok(None);
        }

        // The slug comes from the filename, not the title
        let slug = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("source file has no usable name: {:?}", path))?
            .to_string();

        let title = fm.title.clone().unwrap_or_else(|| slug.clone());

        let source = path
            .strip_prefix(&self.site.source_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        let compiled = self.compiler.compile(body)?;

        // Front-matter extras ride along into the JSON artifact
        let mut extra = HashMap::new();
        for (key, value) in &fm.extra {
            match serde_json::to_value(value) {
                Ok(v) => {
                    extra.insert(key.clone(), v);
                }
                Err(e) => {
                    tracing::warn!("Dropping front-matter field {} in {:?}: {}", key, path, e);
                }
            }
        }

        Ok(Some(Document {
            slug,
            title,
            description: fm.description.clone(),
            date: fm.parse_date(),
            source,
            body: compiled,
            extra,
        }))
    }

    /// Check whether a file is a compilable source
    fn is_source_file(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") | Some("markdown") => true,
            Some("mdx") => {
                if self.site.config.mdx.rs {
                    true
                } else {
                    tracing::warn!("mdx.rs is disabled, skipping {:?}", path);
                    false
                }
            }
            _ => false,
        }
    }
}
