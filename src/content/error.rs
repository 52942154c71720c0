//! Content errors

use thiserror::Error;

/// Errors raised while turning content files into records
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Invalid order {value:?}: expected an integer")]
    InvalidOrder { value: String },

    #[error("Invalid date {value:?}: expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Invalid metadata block: {0}")]
    InvalidMetadata(String),

    #[error("Slug {slug:?} is used by both a post and a page")]
    DuplicateSlug { slug: String },
}
