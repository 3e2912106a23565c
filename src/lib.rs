//! mdxdocs: a minimal documentation site for compiled MDX/Markdown content
//!
//! Sources are compiled into slug-keyed JSON artifacts; the server loads the
//! artifact store into memory, resolves documents by slug and renders their
//! compiled bodies inside a themed shell.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod render;
pub mod server;
pub mod shell;
pub mod store;
pub mod theme;

pub use error::Error;

use anyhow::Result;
use std::path::Path;

/// The main mdxdocs application
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Document source directory
    pub source_dir: std::path::PathBuf,
    /// Compiled artifact (store) directory
    pub store_dir: std::path::PathBuf,
}

impl Site {
    /// Create a new Site instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let source_dir = base_dir.join(&config.source_dir);
        let store_dir = base_dir.join(&config.store_dir);

        Ok(Self {
            config,
            base_dir,
            source_dir,
            store_dir,
        })
    }

    /// Compile all sources into store artifacts
    pub fn compile(&self) -> Result<()> {
        commands::compile::run(self)
    }

    /// Remove compiled artifacts and the compile cache
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
