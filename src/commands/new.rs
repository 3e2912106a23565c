//! Create a new document source

use anyhow::{anyhow, Result};
use std::fs;

use crate::Site;

/// Create a new document skeleton in the source directory
pub fn create_document(site: &Site, title: &str, path: Option<&str>) -> Result<()> {
    let filename = match path {
        Some(p) => format!("{}.md", p.trim_end_matches(".md")),
        None => format!("{}.md", slug::slugify(title)),
    };

    fs::create_dir_all(&site.source_dir)?;
    let file_path = site.source_dir.join(&filename);
    if file_path.exists() {
        return Err(anyhow!("{:?} already exists", file_path));
    }

    let now = chrono::Local::now();
    let content = format!(
        "---\ntitle: {}\ndate: {}\ndescription: ''\n---\n\n",
        title,
        now.format("%Y-%m-%d %H:%M:%S")
    );

    fs::write(&file_path, content)?;
    println!("Created {:?}", file_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;

    #[test]
    fn test_create_document_scaffold() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();

        create_document(&site, "Next.js and Docker", None).unwrap();

        let path = dir.path().join("content/next-js-and-docker.md");
        let content = fs::read_to_string(&path).unwrap();
        let (fm, _) = FrontMatter::parse(&content).unwrap();
        assert_eq!(fm.title, Some("Next.js and Docker".to_string()));
        assert!(fm.parse_date().is_some());
    }

    #[test]
    fn test_create_document_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();

        create_document(&site, "Doc", None).unwrap();
        assert!(create_document(&site, "Doc", None).is_err());
    }
}
