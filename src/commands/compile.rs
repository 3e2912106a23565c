//! Compile document sources into store artifacts

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::fs;
use std::time::Duration;

use crate::cache::{self, CacheDb, SourceEntry};
use crate::content::loader::ContentLoader;
use crate::Site;

/// Compile the content store (with incremental support)
pub fn run(site: &Site) -> Result<()> {
    run_with_options(site, false)
}

/// Compile with force option
pub fn run_with_options(site: &Site, force: bool) -> Result<()> {
    let start = std::time::Instant::now();

    let loader = ContentLoader::new(site);
    let previous = CacheDb::load(&site.base_dir);

    // A config change invalidates every artifact
    let config_path = site.base_dir.join("_config.yml");
    let config_hash = if config_path.exists() {
        cache::hash_file(&config_path)?
    } else {
        0
    };
    let force = force || (previous.config_hash != config_hash && !previous.sources.is_empty());
    if force {
        tracing::info!("Full compile (config changed or forced)");
    }

    fs::create_dir_all(&site.store_dir)?;

    let mut next = CacheDb::new();
    next.config_hash = config_hash;

    let mut compiled = 0usize;
    let mut skipped = 0usize;

    for path in loader.source_files() {
        let source = path
            .strip_prefix(&site.source_dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .to_string();
        let content_hash = cache::hash_file(&path)?;

        if !force && previous.is_fresh(&source, content_hash) {
            let entry = previous.sources[&source].clone();
            if site.store_dir.join(format!("{}.json", entry.slug)).exists() {
                next.sources.insert(source, entry);
                skipped += 1;
                continue;
            }
        }

        match loader.load_document(&path) {
            Ok(Some(doc)) => {
                let artifact = site.store_dir.join(format!("{}.json", doc.slug));
                fs::write(&artifact, serde_json::to_string_pretty(&doc)?)?;
                tracing::debug!("Compiled {:?} -> {:?}", path, artifact);
                next.sources.insert(
                    source,
                    SourceEntry {
                        content_hash,
                        slug: doc.slug,
                    },
                );
                compiled += 1;
            }
            Ok(None) => {
                // Unpublished now; drop any artifact from an earlier compile
                if let Some(entry) = previous.sources.get(&source) {
                    remove_artifact(site, &entry.slug);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to compile {:?}: {}", path, e);
            }
        }
    }

    // Artifacts whose source disappeared
    for (source, entry) in &previous.sources {
        if !next.sources.contains_key(source) {
            remove_artifact(site, &entry.slug);
        }
    }

    next.save(&site.base_dir)?;

    tracing::info!(
        "Compiled {} documents ({} unchanged) in {:?}",
        compiled,
        skipped,
        start.elapsed()
    );

    Ok(())
}

fn remove_artifact(site: &Site, slug: &str) {
    let artifact = site.store_dir.join(format!("{}.json", slug));
    if artifact.exists() {
        if let Err(e) = fs::remove_file(&artifact) {
            tracing::warn!("Failed to remove stale artifact {:?}: {}", artifact, e);
        } else {
            tracing::debug!("Removed stale artifact {:?}", artifact);
        }
    }
}

/// Watch the source directory and recompile on changes
pub async fn watch(site: &Site) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    if site.source_dir.exists() {
        debouncer
            .watcher()
            .watch(&site.source_dir, RecursiveMode::Recursive)?;
    }
    let config_path = site.base_dir.join("_config.yml");
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
    }

    println!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                if events.is_empty() {
                    continue;
                }
                for event in &events {
                    tracing::info!("File changed: {}", event.path.display());
                }
                match run(site) {
                    Ok(_) => println!("Recompiled successfully!"),
                    Err(e) => println!("Compile failed: {}", e),
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ContentStore;
    use std::fs;

    fn site_with_sources(files: &[(&str, &str)]) -> (tempfile::TempDir, Site) {
        let dir = tempfile::tempdir().unwrap();
        let content_dir = dir.path().join("content");
        fs::create_dir_all(&content_dir).unwrap();
        for (name, body) in files {
            fs::write(content_dir.join(name), body).unwrap();
        }
        let site = Site::new(dir.path()).unwrap();
        (dir, site)
    }

    #[test]
    fn test_compile_writes_artifacts() {
        let (_dir, site) = site_with_sources(&[(
            "next.js-more-docker.mdx",
            "---\ntitle: Next.js and Docker\n---\n\n# Intro\n",
        )]);

        run(&site).unwrap();

        let store = ContentStore::load(&site.store_dir).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.resolve("next.js-more-docker").is_ok());
    }

    #[test]
    fn test_recompile_skips_unchanged() {
        let (_dir, site) = site_with_sources(&[("a.md", "# A\n"), ("b.md", "# B\n")]);

        run(&site).unwrap();
        let cache = CacheDb::load(&site.base_dir);
        assert_eq!(cache.sources.len(), 2);

        // Second run with no edits keeps the same artifacts
        run(&site).unwrap();
        let store = ContentStore::load(&site.store_dir).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_deleted_source_removes_artifact() {
        let (dir, site) = site_with_sources(&[("a.md", "# A\n"), ("b.md", "# B\n")]);

        run(&site).unwrap();
        fs::remove_file(dir.path().join("content/b.md")).unwrap();
        run(&site).unwrap();

        let store = ContentStore::load(&site.store_dir).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.resolve("b").is_err());
    }
}
