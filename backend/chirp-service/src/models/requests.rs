//! Request bodies and query strings.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Body for registering an author
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAuthor {
    #[validate(
        length(min = 1, max = 64, message = "must be 1-64 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(url(message = "must be a valid URL"))]
    pub image_url: Option<String>,
}

/// Usernames appear in URL paths and response headers.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '"'))
    {
        let mut err = ValidationError::new("username_chars");
        err.message = Some("must not contain whitespace, control characters, '/', '?', '#' or '\"'".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheepRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateImageRequest {
    #[validate(url(message = "must be a valid URL"))]
    pub image_url: Option<String>,
}

/// `?page=N` query string. Pages are 1-based; anything below 1 means the first page.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page
            .unwrap_or(1)
            .clamp(1, i64::from(u32::MAX)) as u32
    }
}
