//! Post listing filter.

use crate::{Post, PostCategory, PostStatus, UserId};
use serde::{Deserialize, Serialize};

/// The closed set of predicates a post listing can be narrowed by.
///
/// Every field is optional; an empty filter matches all posts that are
/// not soft-deleted. Asking for `Deleted` explicitly is the only way
/// soft-deleted rows come back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFilter {
    /// Restrict to one category.
    pub category: Option<PostCategory>,
    /// Restrict to one status.
    pub status: Option<PostStatus>,
    /// Restrict to posts by one author.
    pub author_id: Option<UserId>,
    /// Case-insensitive substring match against title and body.
    pub search: Option<String>,
}

impl PostFilter {
    /// Restricts the filter to a category.
    #[must_use]
    pub fn with_category(mut self, category: PostCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Restricts the filter to a status.
    #[must_use]
    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts the filter to an author.
    #[must_use]
    pub fn with_author(mut self, author_id: UserId) -> Self {
        self.author_id = Some(author_id);
        self
    }

    /// Adds a search term.
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Returns true when a post passes every predicate in the filter.
    ///
    /// This is the single definition of filter semantics; the SQL store
    /// mirrors it clause for clause.
    #[must_use]
    pub fn matches(&self, post: &Post) -> bool {
        let status_ok = match self.status {
            Some(status) => post.status == status,
            None => !post.status.is_deleted(),
        };
        let category_ok = self.category.map_or(true, |c| post.category == c);
        let author_ok = self.author_id.map_or(true, |a| post.author_id == a);
        let search_ok = match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                post.title.to_lowercase().contains(&term)
                    || post.body.to_lowercase().contains(&term)
            }
            None => true,
        };
        status_ok && category_ok && author_ok && search_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post::new(
            UserId::new(),
            "Finding an OT in the north end",
            "Has anyone had luck with occupational therapy referrals?",
            PostCategory::Therapies,
        )
    }

    #[test]
    fn test_empty_filter_matches_active_post() {
        assert!(PostFilter::default().matches(&post()));
    }

    #[test]
    fn test_empty_filter_excludes_deleted() {
        let mut p = post();
        p.status = PostStatus::Deleted;
        assert!(!PostFilter::default().matches(&p));
    }

    #[test]
    fn test_explicit_status_includes_deleted() {
        let mut p = post();
        p.status = PostStatus::Deleted;
        let filter = PostFilter::default().with_status(PostStatus::Deleted);
        assert!(filter.matches(&p));
    }

    #[test]
    fn test_category_filter() {
        let filter = PostFilter::default().with_category(PostCategory::Therapies);
        assert!(filter.matches(&post()));
        let other = PostFilter::default().with_category(PostCategory::Education);
        assert!(!other.matches(&post()));
    }

    #[test]
    fn test_author_filter() {
        let p = post();
        assert!(PostFilter::default().with_author(p.author_id).matches(&p));
        assert!(!PostFilter::default().with_author(UserId::new()).matches(&p));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let p = post();
        assert!(PostFilter::default().with_search("FINDING").matches(&p));
        assert!(PostFilter::default().with_search("referrals").matches(&p));
        assert!(!PostFilter::default().with_search("speech").matches(&p));
    }
}
