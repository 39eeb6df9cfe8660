/// Comment service - replies under cheeps
use super::validate_message_text;
use crate::error::{AppError, Result};
use crate::metrics::COMMENTS_POSTED_TOTAL;
use crate::models::{CommentDto, CommentWithAuthor};
use crate::repository::ChirpRepository;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct CommentService {
    repo: Arc<dyn ChirpRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn ChirpRepository>) -> Self {
        Self { repo }
    }

    /// Comment on `cheep_id`. Unknown cheeps yield `NotFound`.
    pub async fn add_comment(&self, cheep_id: Uuid, author_id: Uuid, text: &str) -> Result<CommentDto> {
        let text = validate_message_text(text)?;
        let author = self
            .repo
            .find_by_id(author_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("author {}", author_id)))?;

        let comment = self.repo.create_comment(cheep_id, author_id, &text).await?;
        COMMENTS_POSTED_TOTAL.inc();
        info!(comment_id = %comment.id, %cheep_id, %author_id, "Comment posted");

        Ok(CommentDto::from(CommentWithAuthor {
            id: comment.id,
            cheep_id: comment.cheep_id,
            author_id: comment.author_id,
            author_username: author.username,
            text: comment.text,
            created_at: comment.created_at,
        }))
    }

    /// Comments on `cheep_id`, oldest first. Unknown cheeps yield `NotFound`.
    pub async fn comments(&self, cheep_id: Uuid) -> Result<Vec<CommentDto>> {
        if self.repo.find_cheep(cheep_id).await?.is_none() {
            return Err(AppError::NotFound(format!("cheep {}", cheep_id)));
        }
        let rows = self.repo.list_comments(cheep_id).await?;
        Ok(rows.into_iter().map(CommentDto::from).collect())
    }

    /// Returns false when the comment does not exist or belongs to someone else.
    pub async fn delete_comment(&self, comment_id: Uuid, viewer_id: Uuid) -> Result<bool> {
        let deleted = self.repo.delete_comment(comment_id, viewer_id).await?;
        if deleted {
            info!(%comment_id, author_id = %viewer_id, "Comment deleted");
        }
        Ok(deleted)
    }
}
