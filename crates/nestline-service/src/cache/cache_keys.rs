//! Cache key builders.
//!
//! Keys are `prefix:namespace:suffix`. Lookups addressed by a single id
//! embed it raw; parameterized lookups canonicalize their parameters
//! into a short digest so that logically identical requests always map
//! to the same key, regardless of how the caller assembled them.

use nestline_core::{OffsetPageRequest, PostCategory, PostFilter, PostId, PostStatus};
use sha2::{Digest, Sha256};
use std::fmt::Display;

const CACHE_PREFIX: &str = "nestline:cache";

/// Invalidation scopes. Each namespace owns every key built under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    PostById,
    PostList,
    PostTrending,
    CommentList,
}

impl CacheNamespace {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PostById => "post:id",
            Self::PostList => "post:list",
            Self::PostTrending => "post:trending",
            Self::CommentList => "comment:list",
        }
    }
}

/// Glob matching every key in a namespace.
#[must_use]
pub fn namespace_pattern(namespace: CacheNamespace) -> String {
    format!("{}:{}:*", CACHE_PREFIX, namespace.as_str())
}

/// Named parameters of one cacheable lookup.
///
/// Fields are sorted by name before hashing, so insertion order never
/// changes the resulting key.
#[derive(Debug, Clone, Default)]
pub struct KeyDescriptor {
    fields: Vec<(String, String)>,
}

impl KeyDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: &str, value: impl Display) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn opt_field<V: Display>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    fn canonical(&self) -> String {
        let mut fields = self.fields.clone();
        fields.sort();
        fields
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// First 16 hex characters of the SHA-256 of the canonical form.
    #[must_use]
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.canonical().as_bytes());
        hex::encode(hash)[..16].to_string()
    }
}

/// Key for a single post.
#[must_use]
pub fn post_by_id(id: PostId) -> String {
    format!("{}:{}:{}", CACHE_PREFIX, CacheNamespace::PostById.as_str(), id)
}

/// Key for one page of a filtered post listing.
#[must_use]
pub fn post_list(filter: &PostFilter, page: OffsetPageRequest) -> String {
    let digest = KeyDescriptor::new()
        .opt_field("category", filter.category.map(PostCategory::as_str))
        .opt_field("status", filter.status.map(PostStatus::as_str))
        .opt_field("author", filter.author_id)
        .opt_field("search", filter.search.as_ref().map(|s| s.to_lowercase()))
        .field("limit", page.limit)
        .field("offset", page.offset)
        .digest();
    format!(
        "{}:{}:{}",
        CACHE_PREFIX,
        CacheNamespace::PostList.as_str(),
        digest
    )
}

/// Key for the trending selection.
#[must_use]
pub fn post_trending(limit: u32) -> String {
    let digest = KeyDescriptor::new().field("limit", limit).digest();
    format!(
        "{}:{}:{}",
        CACHE_PREFIX,
        CacheNamespace::PostTrending.as_str(),
        digest
    )
}

/// Key for the first comment page of a post.
#[must_use]
pub fn comment_first_page(post_id: PostId, limit: u32) -> String {
    let digest = KeyDescriptor::new()
        .field("post", post_id)
        .field("limit", limit)
        .digest();
    format!(
        "{}:{}:{}",
        CACHE_PREFIX,
        CacheNamespace::CommentList.as_str(),
        digest
    )
}
