/// Business logic layer
///
/// Services validate input, do paging arithmetic and project repository rows
/// into DTOs. They share one `ChirpRepository` handle.
pub mod authors;
pub mod cheeps;
pub mod comments;

pub use authors::AuthorService;
pub use cheeps::CheepService;
pub use comments::CommentService;

use crate::error::{AppError, Result};
use crate::models::MAX_TEXT_CHARS;

/// Offset window for a 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// Trim and bound-check cheep/comment text.
pub fn validate_message_text(raw: &str) -> Result<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text must not be empty".into()));
    }
    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "text must be at most {} characters, got {}",
            MAX_TEXT_CHARS, chars
        )));
    }
    Ok(text.to_string())
}
