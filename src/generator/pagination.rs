//! Listing pagination

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Split `items` into groups of `page_size`. Without a page size (or with 0)
/// everything goes into a single group, which is also returned for an empty
/// list so listing pages are always rendered.
pub fn paginate<T>(items: &[T], page_size: Option<usize>) -> Vec<&[T]> {
    match page_size {
        Some(size) if size > 0 && !items.is_empty() => items.chunks(size).collect(),
        _ => vec![items],
    }
}

/// One entry of the pagination bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    /// 1-based page number
    pub number: usize,
    pub url: String,
    pub active: bool,
}

/// Pagination state for one page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Every page of the listing; empty when there is only one
    pub pages: Vec<PageLink>,
    pub next: Option<PageLink>,
    pub prev: Option<PageLink>,
}

impl Pagination {
    /// Pagination for group `current` (0-based) of `group_count` groups
    pub fn new(group_count: usize, current: usize, url_prefix: &str) -> Self {
        if group_count <= 1 {
            return Self {
                pages: Vec::new(),
                next: None,
                prev: None,
            };
        }

        let pages: Vec<PageLink> = (0..group_count)
            .map(|index| PageLink {
                number: index + 1,
                url: group_url(url_prefix, index),
                active: index == current,
            })
            .collect();

        let next = pages.get(current + 1).cloned();
        let prev = current
            .checked_sub(1)
            .and_then(|index| pages.get(index))
            .cloned();

        Self { pages, next, prev }
    }

    /// Output file for group `index` of a listing rooted at `root`
    pub fn output_path(root: &Path, index: usize) -> PathBuf {
        if index == 0 {
            root.join("index.html")
        } else {
            root.join((index + 1).to_string()).join("index.html")
        }
    }
}

/// URL of group `index`: the prefix itself for the first group
fn group_url(url_prefix: &str, index: usize) -> String {
    if index == 0 {
        url_prefix.to_string()
    } else {
        format!("{}{}", url_prefix, index + 1)
    }
}
