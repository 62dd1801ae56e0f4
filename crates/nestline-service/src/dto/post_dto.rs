//! Post-related DTOs.

use nestline_core::validation::rules;
use nestline_core::{PostCategory, UserId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to create a new post.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    pub author_id: UserId,

    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = rules::not_blank)
    )]
    pub title: String,

    #[validate(length(min = 1, max = 50000, message = "Body must be 1-50000 characters"))]
    pub body: String,

    pub category: PostCategory,
}

/// Request to update a post. Absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = rules::not_blank)
    )]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 50000, message = "Body must be 1-50000 characters"))]
    pub body: Option<String>,

    pub category: Option<PostCategory>,
}
