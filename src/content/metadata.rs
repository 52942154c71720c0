//! Metadata block parsing
//!
//! A content file starts with a metadata block followed by the Markdown body.
//! Two forms are accepted:
//!
//! ```text
//! title: Hello World          ---
//! date: 2023-01-01            title: Hello World
//! tags: rust, notes           tags: [rust, notes]
//!                             ---
//! Body starts here.           Body starts here.
//! ```
//!
//! The bare form ends at the first blank line, the fenced form at the closing
//! `---` and is read as YAML.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;

use super::ContentError;

/// Typed metadata of a post or page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    /// ISO-8601 date, kept as written for display
    pub date: Option<String>,
    /// `date` parsed for ordering, offsets normalised to UTC
    #[serde(skip)]
    pub timestamp: Option<NaiveDateTime>,
    /// Tag titles, trimmed, in the order they were written
    pub tags: Vec<String>,
    pub order: i64,
    /// Keys without a dedicated field
    pub extra: IndexMap<String, String>,
}

impl Metadata {
    /// Parse the metadata block at the top of `content`
    /// Returns (metadata, markdown_body)
    pub fn parse(content: &str) -> Result<(Self, &str), ContentError> {
        let content = content.trim_start_matches('\u{feff}');
        let (raw, body) = split_block(content)?;
        Ok((Self::from_raw(raw)?, body))
    }

    /// Build typed metadata from raw `key -> value` pairs
    pub fn from_raw(mut raw: IndexMap<String, String>) -> Result<Self, ContentError> {
        let order = match raw.shift_remove("order") {
            Some(value) => value
                .parse::<i64>()
                .map_err(|_| ContentError::InvalidOrder { value })?,
            None => 0,
        };

        let (date, timestamp) = match raw.shift_remove("date") {
            Some(value) => match parse_date(&value) {
                Some(timestamp) => (Some(value), Some(timestamp)),
                None => return Err(ContentError::InvalidDate { value }),
            },
            None => (None, None),
        };

        let tags = raw
            .shift_remove("tags")
            .map(|value| split_tags(&value))
            .unwrap_or_default();

        Ok(Self {
            title: raw.shift_remove("title"),
            summary: raw.shift_remove("summary"),
            image: raw.shift_remove("image"),
            date,
            timestamp,
            tags,
            order,
            extra: raw,
        })
    }
}

/// Split a comma separated tag list, dropping empty entries
fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 date, with or without a time part. Dates carrying an
/// offset are converted to UTC; all others are taken as written.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
        return Some(datetime.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn split_block(content: &str) -> Result<(IndexMap<String, String>, &str), ContentError> {
    let first_line = content.lines().next().unwrap_or("");
    if first_line.trim_end() == "---" {
        return split_fenced(content);
    }
    Ok(split_bare(content))
}

/// `---` fenced YAML block. Without a closing fence the file has no metadata.
fn split_fenced(content: &str) -> Result<(IndexMap<String, String>, &str), ContentError> {
    let Some(open_end) = content.find('\n') else {
        return Ok((IndexMap::new(), content));
    };
    let rest = &content[open_end + 1..];

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let raw = parse_yaml(yaml)?;
            return Ok((raw, body.trim_start_matches(['\n', '\r'])));
        }
        offset += line.len();
    }

    Ok((IndexMap::new(), content))
}

fn parse_yaml(yaml: &str) -> Result<IndexMap<String, String>, ContentError> {
    if yaml.trim().is_empty() {
        return Ok(IndexMap::new());
    }

    let values: IndexMap<String, serde_yaml::Value> =
        serde_yaml::from_str(yaml).map_err(|e| ContentError::InvalidMetadata(e.to_string()))?;

    let mut raw = IndexMap::new();
    for (key, value) in values {
        let value = match value {
            serde_yaml::Value::Sequence(items) => items
                .iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(", "),
            other => match scalar_to_string(&other) {
                Some(s) => s,
                None => continue,
            },
        };
        insert_pair(&mut raw, &key, &value);
    }
    Ok(raw)
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Bare `key: value` lines up to the first blank line
fn split_bare(content: &str) -> (IndexMap<String, String>, &str) {
    let mut raw = IndexMap::new();
    let mut found = false;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            offset += line.len();
            break;
        }
        match split_key_value(trimmed) {
            Some((key, value)) => {
                insert_pair(&mut raw, key, value);
                found = true;
            }
            None => break,
        }
        offset += line.len();
    }

    if !found {
        return (raw, content);
    }
    (raw, &content[offset..])
}

/// Split `key: value`, where key is a simple identifier and not a URL scheme
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let is_valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !matches!(key, "http" | "https" | "ftp");
    if !is_valid_key || !(value.is_empty() || value.starts_with([' ', '\t'])) {
        return None;
    }
    Some((key, value))
}

fn insert_pair(raw: &mut IndexMap<String, String>, key: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    raw.insert(key.trim().to_lowercase(), value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_metadata() {
        let content = "title: Hello World\ndate: 2023-01-01\ntags: Rust, notes \n\nThis is the body.\n";
        let (meta, body) = Metadata::parse(content).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Hello World"));
        assert_eq!(meta.date.as_deref(), Some("2023-01-01"));
        assert_eq!(meta.tags, vec!["Rust", "notes"]);
        assert_eq!(meta.order, 0);
        assert_eq!(body, "This is the body.\n");
    }

    #[test]
    fn test_parse_fenced_metadata() {
        let content = r#"---
title: "Hello: World"
tags: [a, b]
order: 3
layout: wide
---

Body.
"#;
        let (meta, body) = Metadata::parse(content).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Hello: World"));
        assert_eq!(meta.tags, vec!["a", "b"]);
        assert_eq!(meta.order, 3);
        assert_eq!(meta.extra.get("layout").map(String::as_str), Some("wide"));
        assert_eq!(body, "Body.\n");
    }

    #[test]
    fn test_malformed_yaml_fails() {
        let content = "---\ntags: [a, b\n---\nBody\n";
        assert!(matches!(
            Metadata::parse(content),
            Err(ContentError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn test_no_metadata() {
        let content = "# Heading\n\nJust text.\n";
        let (meta, body) = Metadata::parse(content).unwrap();
        assert_eq!(meta, Metadata::default());
        assert_eq!(body, content);
    }

    #[test]
    fn test_url_is_not_metadata() {
        let content = "https://example.com is a link\n\nMore.\n";
        let (meta, body) = Metadata::parse(content).unwrap();
        assert!(meta.extra.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_unterminated_fence_is_body() {
        let content = "---\n\nSome text after a rule.\n";
        let (meta, body) = Metadata::parse(content).unwrap();
        assert_eq!(meta, Metadata::default());
        assert_eq!(body, content);
    }

    #[test]
    fn test_bad_order_fails() {
        let content = "title: About\norder: first\n\nBody\n";
        match Metadata::parse(content) {
            Err(ContentError::InvalidOrder { value }) => assert_eq!(value, "first"),
            other => panic!("expected InvalidOrder, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_fails() {
        let content = "date: last tuesday\n\nBody\n";
        assert!(matches!(
            Metadata::parse(content),
            Err(ContentError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_date_with_time() {
        let content = "date: 2023-01-01 10:30\n\nBody\n";
        let (meta, _) = Metadata::parse(content).unwrap();
        assert_eq!(meta.date.as_deref(), Some("2023-01-01 10:30"));
        assert_eq!(meta.timestamp, parse_date("2023-01-01 10:30"));
        assert!(meta.timestamp.is_some());
    }

    #[test]
    fn test_parse_date_forms() {
        let at = |y, m, d, h, min| {
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(h, min, 0))
                .unwrap()
        };
        assert_eq!(parse_date("2023-1-5"), Some(at(2023, 1, 5, 0, 0)));
        assert_eq!(parse_date("2023-01-01 10:00"), Some(at(2023, 1, 1, 10, 0)));
        assert_eq!(parse_date("2023-01-01T09:00"), Some(at(2023, 1, 1, 9, 0)));
        assert_eq!(
            parse_date("2022-12-31T23:00:00-05:00"),
            Some(at(2023, 1, 1, 4, 0))
        );
        assert_eq!(parse_date("2023-13-01"), None);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let content = "title:\ntags:\norder:\n\nBody\n";
        let (meta, body) = Metadata::parse(content).unwrap();
        assert_eq!(body, "Body\n");
        assert_eq!(meta.title, None);
        assert!(meta.tags.is_empty());
        assert_eq!(meta.order, 0);
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let content = "Title: Loud\n\nBody\n";
        let (meta, _) = Metadata::parse(content).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Loud"));
    }
}
