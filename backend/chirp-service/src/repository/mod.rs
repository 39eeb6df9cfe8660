/// Storage layer for authors, cheeps, comments and the follow graph.
///
/// `PgChirpRepository` is the production implementation. `InMemoryChirpRepository`
/// backs the test suite and the `CHIRP_STORAGE=memory` development mode.
pub mod memory;
pub mod postgres;

pub use memory::InMemoryChirpRepository;
pub use postgres::PgChirpRepository;

use crate::error::Result;
use crate::models::{
    Author, Cheep, CheepWithAuthor, Comment, CommentWithAuthor, NewAuthor,
};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Author>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Author>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Author>>;

    /// Insert a new author. Duplicate username or email yields `Conflict`.
    async fn create_author(&self, author: NewAuthor) -> Result<Author>;

    /// Insert the author if the id is unknown, otherwise refresh username and email.
    async fn ensure_author(&self, id: Uuid, username: &str, email: &str) -> Result<Author>;

    async fn update_image(&self, id: Uuid, image_url: Option<String>) -> Result<bool>;

    /// Create a follow edge. Returns true if the edge is new.
    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;

    /// Remove a follow edge. Returns true if an edge was removed.
    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;

    /// Authors followed by `id`, ordered by username
    async fn following(&self, id: Uuid) -> Result<Vec<Author>>;

    /// Authors following `id`, ordered by username
    async fn followers(&self, id: Uuid) -> Result<Vec<Author>>;

    /// Returns (followers_count, following_count)
    async fn follow_counts(&self, id: Uuid) -> Result<(i64, i64)>;

    /// Delete an author with their cheeps, comments (including comments on their
    /// cheeps) and every follow edge naming them.
    async fn delete_author(&self, id: Uuid) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait CheepRepository: Send + Sync {
    async fn create_cheep(&self, author_id: Uuid, text: &str) -> Result<Cheep>;

    async fn find_cheep(&self, id: Uuid) -> Result<Option<CheepWithAuthor>>;

    /// All cheeps, newest first
    async fn list_cheeps(&self, offset: i64, limit: i64) -> Result<Vec<CheepWithAuthor>>;

    async fn list_cheeps_by_author(
        &self,
        author_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CheepWithAuthor>>;

    /// Cheeps written by any of `author_ids`, newest first
    async fn list_cheeps_by_authors(
        &self,
        author_ids: &[Uuid],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CheepWithAuthor>>;

    async fn count_cheeps(&self) -> Result<i64>;

    async fn count_cheeps_by_author(&self, author_id: Uuid) -> Result<i64>;

    async fn count_cheeps_by_authors(&self, author_ids: &[Uuid]) -> Result<i64>;

    /// Delete a cheep owned by `author_id` along with its comments.
    async fn delete_cheep(&self, id: Uuid, author_id: Uuid) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait CommentRepository: Send + Sync {
    /// Fails with `NotFound` when the cheep does not exist.
    async fn create_comment(&self, cheep_id: Uuid, author_id: Uuid, text: &str)
        -> Result<Comment>;

    /// Comments on a cheep, oldest first
    async fn list_comments(&self, cheep_id: Uuid) -> Result<Vec<CommentWithAuthor>>;

    async fn delete_comment(&self, id: Uuid, author_id: Uuid) -> Result<bool>;
}

/// Everything the services need from storage.
#[async_trait::async_trait]
pub trait ChirpRepository: AuthorRepository + CheepRepository + CommentRepository {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
