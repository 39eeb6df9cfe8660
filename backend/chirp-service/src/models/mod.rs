/// Data models for chirp-service
///
/// - `Author`, `Cheep`, `Comment`: stored entities
/// - `CheepWithAuthor`, `CommentWithAuthor`: read models joined with author fields
/// - `dto`: response projections
/// - `requests`: request bodies and query strings
pub mod dto;
pub mod requests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use dto::{
    AuthorDto, AuthorExport, CheepDetailDto, CheepDto, CommentDto, MeDto, Page, ProfileDto,
};
pub use requests::{
    CreateCheepRequest, CreateCommentRequest, NewAuthor, PageQuery, UpdateImageRequest,
};

/// Maximum length of cheep and comment text, in characters.
pub const MAX_TEXT_CHARS: usize = 160;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cheep {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub cheep_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Cheep row joined with the public fields of its author.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CheepWithAuthor {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_image_url: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub cheep_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
