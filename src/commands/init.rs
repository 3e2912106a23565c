//! Initialize a new mdxdocs site

use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;

/// Default site configuration written by `init`
const DEFAULT_CONFIG: &str = r#"# mdxdocs configuration

# Site
title: mdxdocs
description: ''
author: ''
language: en

# URL
url: http://example.com
root: /

# Directory
source_dir: content
store_dir: .mdxdocs/store

# Build pipeline
mdx:
  rs: true
minify: false
compress: false
images:
  domains: []
highlight:
  theme: base16-ocean.dark
  line_number: false
"#;

/// Starter document written by `init`
const STARTER_DOC: &str = r#"---
title: Getting started
description: Your first compiled document
---

# Getting started

Write Markdown or MDX files in the `content/` directory, then run
`mdxdocs compile` followed by `mdxdocs serve`.

```sh
mdxdocs compile
mdxdocs serve
```
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        return Err(anyhow!("{:?} already contains a _config.yml", target_dir));
    }

    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("content"))?;

    fs::write(config_path, DEFAULT_CONFIG)?;
    fs::write(
        target_dir.join("content").join("getting-started.md"),
        STARTER_DOC,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Site;

    #[test]
    fn test_init_creates_usable_site() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        assert!(dir.path().join("_config.yml").exists());
        assert!(dir.path().join("content/getting-started.md").exists());

        // The generated config parses back
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.source_dir, "content");
    }

    #[test]
    fn test_init_refuses_existing_site() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();
        assert!(init_site(dir.path()).is_err());
    }
}
