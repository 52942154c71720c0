//! Content module - loads posts and pages and builds their records

mod error;
pub mod loader;
mod markdown;
mod metadata;
mod post;
mod tags;

pub use error::ContentError;
pub use loader::ContentLoader;
pub use markdown::MarkdownRenderer;
pub use metadata::{parse_date, Metadata};
pub use post::{compare_pages, compare_posts, Page, Post, Tag};
pub use tags::aggregate_tags;
