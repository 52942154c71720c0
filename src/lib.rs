//! folio: a small static site generator for Markdown posts and pages
//!
//! Content lives in `content/posts/<slug>/index.md` and
//! `content/pages/<slug>/index.md`. Every build renders the whole site through
//! Tera templates into the output directory; `serve` adds a live-reloading
//! development server on top.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Name of the optional site configuration file
pub const CONFIG_FILE: &str = "config.yml";

/// A site rooted at a directory, with its configuration and resolved paths
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content directory (holds `posts/` and `pages/`)
    pub content_dir: PathBuf,
    /// Output directory
    pub output_dir: PathBuf,
    /// Templates directory (may not exist; the built-in theme is used then)
    pub templates_dir: PathBuf,
}

impl Site {
    /// Open a site from a directory, reading `config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a site from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);
        let output_dir = base_dir.join(&config.output_dir);
        let templates_dir = base_dir.join(&config.templates_dir);

        Self {
            config,
            base_dir,
            content_dir,
            output_dir,
            templates_dir,
        }
    }

    /// Directory holding one folder per post
    pub fn posts_dir(&self) -> PathBuf {
        self.content_dir.join("posts")
    }

    /// Directory holding one folder per page
    pub fn pages_dir(&self) -> PathBuf {
        self.content_dir.join("pages")
    }

    /// Path of the site configuration file
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE)
    }

    /// Build the whole site
    pub fn build(&self) -> Result<()> {
        commands::build::run(self)
    }

    /// Remove the output directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
