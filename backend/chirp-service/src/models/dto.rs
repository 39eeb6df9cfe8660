//! Response projections returned by the HTTP layer.

use super::{Author, CheepWithAuthor, CommentWithAuthor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of an author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDto {
    pub username: String,
    pub image_url: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
}

impl AuthorDto {
    pub fn from_author(author: &Author, followers_count: i64, following_count: i64) -> Self {
        Self {
            username: author.username.clone(),
            image_url: author.image_url.clone(),
            followers_count,
            following_count,
        }
    }
}

/// Author profile as seen by a (possibly anonymous) viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDto {
    #[serde(flatten)]
    pub author: AuthorDto,
    pub is_following: bool,
    pub is_self: bool,
}

/// The authenticated author's own profile, including private fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeDto {
    #[serde(flatten)]
    pub author: AuthorDto,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheepDto {
    pub id: Uuid,
    pub author: String,
    pub author_image_url: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl From<CheepWithAuthor> for CheepDto {
    fn from(row: CheepWithAuthor) -> Self {
        Self {
            id: row.id,
            author: row.author_username,
            author_image_url: row.author_image_url,
            text: row.text,
            timestamp: row.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDto {
    pub id: Uuid,
    pub cheep_id: Uuid,
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl From<CommentWithAuthor> for CommentDto {
    fn from(row: CommentWithAuthor) -> Self {
        Self {
            id: row.id,
            cheep_id: row.cheep_id,
            author: row.author_username,
            text: row.text,
            timestamp: row.created_at,
        }
    }
}

/// A cheep together with its comments, oldest comment first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheepDetailDto {
    pub cheep: CheepDto,
    pub comments: Vec<CommentDto>,
}

/// One page of an offset-paginated listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, page_size: u32, total_items: i64) -> Self {
        let size = i64::from(page_size.max(1));
        let pages = (total_items.max(0) + size - 1) / size;
        let total_pages = pages.clamp(1, i64::from(u32::MAX)) as u32;
        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages,
            has_next: page < total_pages,
        }
    }
}

/// Everything stored about an author, for the "download my data" feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorExport {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub following: Vec<String>,
    pub followers: Vec<String>,
    pub cheeps: Vec<CheepDto>,
    pub exported_at: DateTime<Utc>,
}
