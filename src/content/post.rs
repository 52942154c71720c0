//! Post, Page and Tag models

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::PathBuf;

use super::Metadata;

/// A dated blog post
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Rendered HTML content
    pub content: String,

    /// URL path, `/<slug>`
    pub url: String,

    /// Folder name the post was loaded from
    pub slug: String,

    /// ISO-8601 publication date
    pub date: Option<String>,

    /// Parsed `date`, the sort key
    #[serde(skip)]
    pub timestamp: Option<NaiveDateTime>,

    pub title: String,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<Tag>,

    /// Custom metadata fields
    pub extra: IndexMap<String, String>,

    /// Content folder, used to copy co-located assets
    #[serde(skip)]
    pub source_dir: PathBuf,
}

impl Post {
    /// Build a post from its rendered body and metadata
    pub fn build(content: String, slug: &str, meta: Metadata, source_dir: PathBuf) -> Self {
        Self {
            content,
            url: format!("/{}", slug),
            slug: slug.to_string(),
            date: meta.date,
            timestamp: meta.timestamp,
            title: meta.title.unwrap_or_else(|| "Untitled".to_string()),
            summary: meta.summary,
            image: meta.image,
            tags: meta.tags.iter().map(|t| Tag::new(t)).collect(),
            extra: meta.extra,
            source_dir,
        }
    }

    /// Whether any of this post's tags shares the given tag's slug
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.iter().any(|t| t.slug == tag.slug)
    }
}

/// Sort order for posts: date ascending, posts without a date last
pub fn compare_posts(a: &Post, b: &Post) -> Ordering {
    match (&a.timestamp, &b.timestamp) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A standalone page
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Rendered HTML content
    pub content: String,

    /// URL path, `/<slug>`
    pub url: String,

    /// Folder name the page was loaded from
    pub slug: String,

    pub title: String,
    pub summary: Option<String>,

    /// Position in page listings (ascending)
    pub order: i64,

    pub image: Option<String>,

    /// Custom metadata fields
    pub extra: IndexMap<String, String>,

    /// Content folder, used to copy co-located assets
    #[serde(skip)]
    pub source_dir: PathBuf,
}

impl Page {
    /// Build a page from its rendered body and metadata
    pub fn build(content: String, slug: &str, meta: Metadata, source_dir: PathBuf) -> Self {
        Self {
            content,
            url: format!("/{}", slug),
            slug: slug.to_string(),
            title: meta.title.unwrap_or_else(|| "Untitled".to_string()),
            summary: meta.summary,
            order: meta.order,
            image: meta.image,
            extra: meta.extra,
            source_dir,
        }
    }
}

/// Sort order for pages: `order` ascending
pub fn compare_pages(a: &Page, b: &Page) -> Ordering {
    a.order.cmp(&b.order)
}

/// A tag; two tags with the same slug are the same tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub title: String,
    pub slug: String,
    pub url: String,
}

impl Tag {
    pub fn new(title: &str) -> Self {
        let title = title.trim();
        let slug = slug::slugify(title);
        let url = format!("/tags/{}", slug);
        Self {
            title: title.to_string(),
            slug,
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::parse_date;

    fn meta(date: Option<&str>, tags: &[&str]) -> Metadata {
        Metadata {
            date: date.map(str::to_string),
            timestamp: date.and_then(parse_date),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_post_defaults() {
        let post = Post::build(
            "<p>Hi</p>".to_string(),
            "hello-world",
            Metadata::default(),
            PathBuf::from("content/posts/hello-world"),
        );
        assert_eq!(post.title, "Untitled");
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.url, "/hello-world");
        assert!(post.tags.is_empty());
        assert_eq!(post.date, None);
    }

    #[test]
    fn test_build_post_tags() {
        let post = Post::build(
            String::new(),
            "p",
            meta(None, &["Rust Lang", "notes"]),
            PathBuf::new(),
        );
        assert_eq!(post.tags.len(), 2);
        assert_eq!(post.tags[0].title, "Rust Lang");
        assert_eq!(post.tags[0].slug, "rust-lang");
        assert_eq!(post.tags[0].url, "/tags/rust-lang");
        assert!(post.has_tag(&Tag::new("rust lang")));
        assert!(!post.has_tag(&Tag::new("rust")));
    }

    #[test]
    fn test_tag_slug_ignores_case_and_whitespace() {
        assert_eq!(Tag::new(" Foo ").slug, Tag::new("foo").slug);
        assert_eq!(Tag::new("Foo").title, "Foo");
    }

    #[test]
    fn test_compare_posts_by_parsed_date() {
        let unpadded = Post::build(String::new(), "jan5", meta(Some("2023-1-5"), &[]), PathBuf::new());
        let padded = Post::build(String::new(), "jan10", meta(Some("2023-01-10"), &[]), PathBuf::new());
        let mut posts = vec![padded, unpadded];
        posts.sort_by(compare_posts);
        assert_eq!(posts[0].slug, "jan5");
    }

    #[test]
    fn test_compare_posts_dateless_last() {
        let a = Post::build(String::new(), "a", meta(Some("2023-02-01"), &[]), PathBuf::new());
        let b = Post::build(String::new(), "b", meta(None, &[]), PathBuf::new());
        let c = Post::build(String::new(), "c", meta(Some("2023-01-01"), &[]), PathBuf::new());
        let mut posts = vec![a, b, c];
        posts.sort_by(compare_posts);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_build_page_order() {
        let page = Page::build(
            String::new(),
            "about",
            Metadata {
                order: 2,
                ..Default::default()
            },
            PathBuf::new(),
        );
        assert_eq!(page.order, 2);
        assert_eq!(page.url, "/about");
    }
}
