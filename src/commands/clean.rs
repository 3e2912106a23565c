//! Clean compiled artifacts and the compile cache

use anyhow::Result;
use std::fs;

use crate::Site;

/// Remove the artifact store and the compile cache
pub fn run(site: &Site) -> Result<()> {
    if site.store_dir.exists() {
        fs::remove_dir_all(&site.store_dir)?;
        tracing::info!("Deleted: {:?}", site.store_dir);
    }

    let cache_path = site.base_dir.join(".mdxdocs/cache.json");
    if cache_path.exists() {
        fs::remove_file(&cache_path)?;
        tracing::info!("Deleted: {:?}", cache_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::compile;

    #[test]
    fn test_clean_removes_store_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        let content_dir = dir.path().join("content");
        fs::create_dir_all(&content_dir).unwrap();
        fs::write(content_dir.join("a.md"), "# A\n").unwrap();

        let site = Site::new(dir.path()).unwrap();
        compile::run(&site).unwrap();
        assert!(site.store_dir.exists());

        run(&site).unwrap();
        assert!(!site.store_dir.exists());
        assert!(!dir.path().join(".mdxdocs/cache.json").exists());
    }
}
