//! Site configuration (config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub site_title: String,
    pub site_subtitle: String,
    pub meta_description: String,

    // Pagination (0 renders every listing on a single page)
    pub posts_per_page: usize,

    // Directory
    pub content_dir: String,
    pub output_dir: String,
    pub templates_dir: String,

    // Markdown
    pub highlight_theme: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_title: "My Site".to_string(),
            site_subtitle: String::new(),
            meta_description: String::new(),

            posts_per_page: 0,

            content_dir: "content".to_string(),
            output_dir: "output".to_string(),
            templates_dir: "templates".to_string(),

            highlight_theme: "InspiredGitHub".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        // An empty file deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Page size for listings, `None` when listings are not paginated
    pub fn page_size(&self) -> Option<usize> {
        match self.posts_per_page {
            0 => None,
            n => Some(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.content_dir, "content");
        assert_eq!(config.output_dir, "output");
        assert_eq!(config.page_size(), None);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
site_title: My Blog
site_subtitle: Notes
meta_description: A blog about things
posts_per_page: 5
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.site_title, "My Blog");
        assert_eq!(config.site_subtitle, "Notes");
        assert_eq!(config.meta_description, "A blog about things");
        assert_eq!(config.page_size(), Some(5));
        assert_eq!(config.templates_dir, "templates");
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "\n").unwrap();
        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.site_title, "My Site");
    }

    #[test]
    fn test_load_rejects_bad_page_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "posts_per_page: lots\n").unwrap();
        assert!(SiteConfig::load(&path).is_err());
    }
}
