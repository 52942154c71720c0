//! Tag aggregation across posts

use std::collections::HashSet;

use super::{Post, Tag};

/// Collect every post's tags, keeping the first tag seen for each slug
pub fn aggregate_tags(posts: &[Post]) -> Vec<Tag> {
    let mut seen = HashSet::new();
    posts
        .iter()
        .flat_map(|post| post.tags.iter())
        .filter(|tag| seen.insert(tag.slug.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Metadata;
    use std::path::PathBuf;

    fn post(slug: &str, tags: &str) -> Post {
        let raw = [("tags".to_string(), tags.to_string())].into_iter().collect();
        let meta = Metadata::from_raw(raw).unwrap();
        Post::build(String::new(), slug, meta, PathBuf::new())
    }

    #[test]
    fn test_first_seen_wins() {
        let posts = vec![post("a", "Foo, bar"), post("b", "foo")];
        let tags = aggregate_tags(&posts);
        let slugs: Vec<_> = tags.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["foo", "bar"]);
        assert_eq!(tags[0].title, "Foo");
    }

    #[test]
    fn test_order_follows_posts() {
        let posts = vec![post("a", "zeta"), post("b", "alpha, zeta"), post("c", "mid")];
        let tags = aggregate_tags(&posts);
        let slugs: Vec<_> = tags.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_no_tags() {
        assert!(aggregate_tags(&[]).is_empty());
    }
}
