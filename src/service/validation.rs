//! Validation of posts before they reach the store.

use crate::error::AppError;
use crate::post::{NewPost, PostStatus};

/// LinkedIn rejects post bodies longer than this.
pub const MAX_CONTENT_CHARS: usize = 3000;

pub struct PostValidator;

impl PostValidator {
    /// Validate an insert: body must be non-blank and within platform limits.
    pub fn validate_new(post: &NewPost) -> Result<(), AppError> {
        if post.content_text.trim().is_empty() {
            return Err(AppError::Validation("content_text is required".into()));
        }
        let chars = post.content_text.chars().count();
        if chars > MAX_CONTENT_CHARS {
            return Err(AppError::Validation(format!(
                "content_text must be at most {} characters (got {})",
                MAX_CONTENT_CHARS, chars
            )));
        }
        if let Some(path) = &post.image_path {
            if path.trim().is_empty() {
                return Err(AppError::Validation("image_path must not be blank".into()));
            }
        }
        Ok(())
    }

    /// Validate a status change: `linkedin_post_id` must be set iff the target status is posted.
    pub fn validate_transition(
        status: PostStatus,
        linkedin_post_id: Option<&str>,
    ) -> Result<(), AppError> {
        let has_id = linkedin_post_id.map(|s| !s.trim().is_empty()).unwrap_or(false);
        match (status, has_id) {
            (PostStatus::Posted, false) => Err(AppError::Validation(
                "linkedin_post_id is required when status is posted".into(),
            )),
            (PostStatus::Pending | PostStatus::Failed, true) => Err(AppError::Validation(format!(
                "linkedin_post_id must be empty when status is {}",
                status
            ))),
            _ => Ok(()),
        }
    }
}
