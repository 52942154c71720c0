//! Content loader - loads posts and pages from the content directory

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{compare_pages, compare_posts, MarkdownRenderer, Metadata, Page, Post};
use crate::Site;

/// File holding the Markdown source of a content folder
pub const INDEX_FILE: &str = "index.md";

/// Loads content from the content directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    renderer: MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        let renderer = MarkdownRenderer::with_theme(&site.config.highlight_theme);
        Self { site, renderer }
    }

    /// Load all posts from content/posts, sorted by date
    pub fn load_posts(&self) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        for (slug, dir) in content_folders(&self.site.posts_dir())? {
            let Some((html, meta)) = self.load_folder(&dir)? else {
                continue;
            };
            posts.push(Post::build(html, &slug, meta, dir));
        }

        // Stable: posts with equal dates keep folder-name order
        posts.sort_by(compare_posts);
        Ok(posts)
    }

    /// Load all pages from content/pages, sorted by `order`
    pub fn load_pages(&self) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        for (slug, dir) in content_folders(&self.site.pages_dir())? {
            let Some((html, meta)) = self.load_folder(&dir)? else {
                continue;
            };
            pages.push(Page::build(html, &slug, meta, dir));
        }

        pages.sort_by(compare_pages);
        Ok(pages)
    }

    /// Read and render a folder's index.md; `None` when the folder has none
    fn load_folder(&self, dir: &Path) -> Result<Option<(String, Metadata)>> {
        let path = dir.join(INDEX_FILE);
        if !path.is_file() {
            tracing::warn!("Skipping {:?}: no {}", dir, INDEX_FILE);
            return Ok(None);
        }

        let source =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        let (meta, body) =
            Metadata::parse(&source).with_context(|| format!("Failed to load {:?}", path))?;
        let html = self.renderer.render(body);
        tracing::debug!("Loaded: {:?}", path);

        Ok(Some((html, meta)))
    }
}

/// Immediate subdirectories of `root` as (folder name, path), sorted by name.
/// A missing root is created and has no folders.
fn content_folders(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !root.exists() {
        fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;
        return Ok(Vec::new());
    }

    let mut folders = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to list {:?}", root))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::warn!("Skipping {:?}: folder name is not UTF-8", entry.path());
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        folders.push((name.to_string(), entry.path().to_path_buf()));
    }

    Ok(folders)
}
