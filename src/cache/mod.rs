//! Compile cache for incremental artifact generation
//!
//! Tracks source content hashes so unchanged files are not recompiled. A
//! config change invalidates everything.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Cache file path relative to the base directory
const CACHE_FILE: &str = ".mdxdocs/cache.json";

/// Cached state for one source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Content hash of the source file
    pub content_hash: u64,
    /// Slug of the artifact the source compiled to
    pub slug: String,
}

/// Cache database for tracking source changes
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    /// Hash of the site config (changes trigger a full recompile)
    pub config_hash: u64,
    /// Cached entries keyed by source path relative to the source dir
    pub sources: HashMap<String, SourceEntry>,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            if let Ok(cache) = serde_json::from_str::<CacheDb>(&content) {
                if cache.version == Self::VERSION {
                    return cache;
                }
                tracing::info!("Cache version mismatch, recompiling everything");
            }
        }
        Self::new()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_path = base_dir.join(CACHE_FILE);
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_path, content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Whether a source is unchanged since the last compile
    pub fn is_fresh(&self, source: &str, content_hash: u64) -> bool {
        self.sources
            .get(source)
            .map(|e| e.content_hash == content_hash)
            .unwrap_or(false)
    }
}

/// Calculate a hash for file content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Calculate a hash for a file on disk
pub fn hash_file(path: &Path) -> Result<u64> {
    let content = fs::read_to_string(path)?;
    Ok(hash_content(&content))
}
