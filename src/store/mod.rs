//! Content store - the in-memory collection of compiled documents

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::content::Document;
use crate::error::Error;

/// Read-only, slug-keyed collection of compiled documents.
///
/// Loaded once at process start from the artifact directory and never
/// mutated during request handling; watch mode swaps in a freshly loaded
/// store wholesale.
#[derive(Debug, Default)]
pub struct ContentStore {
    documents: Vec<Document>,
}

impl ContentStore {
    /// Load all compiled artifacts from the store directory
    pub fn load<P: AsRef<Path>>(store_dir: P) -> Result<Self> {
        let store_dir = store_dir.as_ref();
        let mut documents = Vec::new();

        if store_dir.exists() {
            let mut paths: Vec<_> = fs::read_dir(store_dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
                .collect();
            paths.sort();

            for path in paths {
                let content = match fs::read_to_string(&path) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!("Failed to read artifact {:?}: {}", path, e);
                        continue;
                    }
                };
                match serde_json::from_str::<Document>(&content) {
                    Ok(doc) => documents.push(doc),
                    Err(e) => {
                        tracing::warn!("Failed to parse artifact {:?}: {}", path, e);
                    }
                }
            }
        }

        // Newest first; undated artifacts last by slug
        documents.sort_by(|a, b| match (&b.date, &a.date) {
            (Some(db), Some(da)) => db.cmp(da),
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (None, None) => a.slug.cmp(&b.slug),
        });

        Ok(Self::from_documents(documents))
    }

    /// Build a store from already-loaded documents, preserving their order.
    ///
    /// Duplicate slugs violate the store invariant; they are reported as a
    /// data-integrity defect and dropped, keeping the first occurrence.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut kept = Vec::with_capacity(documents.len());
        for doc in documents {
            if seen.insert(doc.slug.clone()) {
                kept.push(doc);
            } else {
                tracing::warn!(
                    "Duplicate slug in content store (data-integrity defect): {}",
                    doc.slug
                );
            }
        }
        Self { documents: kept }
    }

    /// Resolve a document by exact slug match.
    ///
    /// Pure read; absent slugs yield [`Error::NotFound`] and the caller must
    /// abandon the rendering attempt.
    pub fn resolve(&self, slug: &str) -> Result<&Document, Error> {
        self.documents
            .iter()
            .find(|d| d.slug == slug)
            .ok_or_else(|| Error::NotFound(slug.to_string()))
    }

    /// All documents, in store order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::CompiledBody;
    use std::collections::HashMap;

    fn doc(slug: &str, code: &str) -> Document {
        Document {
            slug: slug.to_string(),
            title: slug.to_string(),
            description: None,
            date: None,
            source: format!("{}.md", slug),
            body: CompiledBody {
                code: code.to_string(),
            },
            extra: HashMap::new(),
        }
    }

    #[test]
    fn test_resolve_present_slug() {
        let store = ContentStore::from_documents(vec![
            doc("next.js-more-docker", "[]"),
            doc("other", "[]"),
        ]);
        let found = store.resolve("next.js-more-docker").unwrap();
        assert_eq!(found.slug, "next.js-more-docker");
    }

    #[test]
    fn test_resolve_absent_slug_is_not_found() {
        let store = ContentStore::from_documents(vec![doc("next.js-more-docker", "[]")]);
        let err = store.resolve("missing-page").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document not found: missing-page");
    }

    #[test]
    fn test_every_stored_slug_resolves() {
        let slugs = ["a", "b", "c"];
        let store = ContentStore::from_documents(slugs.iter().map(|s| doc(s, "[]")).collect());
        for s in slugs {
            assert_eq!(store.resolve(s).unwrap().slug, s);
        }
    }

    #[test]
    fn test_duplicate_slug_first_wins() {
        let mut first = doc("dup", "[]");
        first.title = "first".to_string();
        let mut second = doc("dup", "[]");
        second.title = "second".to_string();

        let store = ContentStore::from_documents(vec![first, second]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve("dup").unwrap().title, "first");
    }

    #[test]
    fn test_load_from_artifact_directory() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = serde_json::to_string(&doc("on-disk", "[]")).unwrap();
        std::fs::write(dir.path().join("on-disk.json"), artifact).unwrap();
        std::fs::write(dir.path().join("garbage.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

        let store = ContentStore::load(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.resolve("on-disk").is_ok());
    }

    #[test]
    fn test_load_missing_directory_is_empty() {
        let store = ContentStore::load("/nonexistent/store/dir").unwrap();
        assert!(store.is_empty());
    }
}
