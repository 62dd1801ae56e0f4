//! Comment-related DTOs.

use nestline_core::validation::rules;
use nestline_core::{PostId, UserId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to add a comment to a post.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub post_id: PostId,

    pub author_id: UserId,

    #[validate(
        length(min = 1, max = 10000, message = "Comment must be 1-10000 characters"),
        custom(function = rules::not_blank)
    )]
    pub body: String,
}
