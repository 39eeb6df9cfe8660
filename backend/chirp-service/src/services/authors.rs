/// Author service - profiles, registration, the follow graph and account removal
use crate::error::{AppError, Result};
use crate::metrics::FOLLOW_EVENTS_TOTAL;
use crate::middleware::Viewer;
use crate::models::{Author, AuthorDto, AuthorExport, CheepDto, MeDto, NewAuthor, ProfileDto};
use crate::repository::ChirpRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct AuthorService {
    repo: Arc<dyn ChirpRepository>,
}

impl AuthorService {
    pub fn new(repo: Arc<dyn ChirpRepository>) -> Self {
        Self { repo }
    }

    async fn require_by_username(&self, username: &str) -> Result<Author> {
        self.repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("author '{}'", username)))
    }

    async fn require_by_id(&self, id: Uuid) -> Result<Author> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("author {}", id)))
    }

    async fn to_dto(&self, author: &Author) -> Result<AuthorDto> {
        let (followers, following) = self.repo.follow_counts(author.id).await?;
        Ok(AuthorDto::from_author(author, followers, following))
    }

    pub async fn profile(&self, username: &str, viewer_id: Option<Uuid>) -> Result<ProfileDto> {
        let author = self.require_by_username(username).await?;
        let is_following = match viewer_id {
            Some(viewer_id) if viewer_id != author.id => {
                self.repo.is_following(viewer_id, author.id).await?
            }
            _ => false,
        };

        Ok(ProfileDto {
            author: self.to_dto(&author).await?,
            is_following,
            is_self: viewer_id == Some(author.id),
        })
    }

    pub async fn me(&self, viewer_id: Uuid) -> Result<MeDto> {
        let author = self.require_by_id(viewer_id).await?;
        Ok(MeDto {
            author: self.to_dto(&author).await?,
            email: author.email,
        })
    }

    pub async fn register(&self, new_author: NewAuthor) -> Result<AuthorDto> {
        new_author.validate()?;

        if self
            .repo
            .find_by_username(&new_author.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "username '{}' is already taken",
                new_author.username
            )));
        }
        if self.repo.find_by_email(&new_author.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "email '{}' is already registered",
                new_author.email
            )));
        }

        let author = self.repo.create_author(new_author).await?;
        info!(author_id = %author.id, username = %author.username, "Author registered");
        Ok(AuthorDto::from_author(&author, 0, 0))
    }

    /// Make sure the token holder has an author row before they write anything.
    pub async fn ensure_author(&self, viewer: &Viewer) -> Result<Author> {
        let candidate = NewAuthor {
            username: viewer.username.clone(),
            email: viewer.email.clone(),
            image_url: None,
        };
        candidate.validate()?;

        self.repo
            .ensure_author(viewer.id, &viewer.username, &viewer.email)
            .await
    }

    pub async fn set_image(&self, viewer_id: Uuid, image_url: Option<String>) -> Result<()> {
        if !self.repo.update_image(viewer_id, image_url).await? {
            return Err(AppError::NotFound(format!("author {}", viewer_id)));
        }
        Ok(())
    }

    /// Follow `target`. Following someone already followed is a no-op.
    pub async fn follow(&self, viewer_id: Uuid, target: &str) -> Result<()> {
        let followee = self.require_by_username(target).await?;
        if followee.id == viewer_id {
            return Err(AppError::Validation("authors cannot follow themselves".into()));
        }

        if self.repo.follow(viewer_id, followee.id).await? {
            FOLLOW_EVENTS_TOTAL.with_label_values(&["follow"]).inc();
            info!(follower_id = %viewer_id, followee_id = %followee.id, "Follow created");
        }
        Ok(())
    }

    /// Unfollow `target`. Unfollowing someone not followed is a no-op.
    pub async fn unfollow(&self, viewer_id: Uuid, target: &str) -> Result<()> {
        let followee = self.require_by_username(target).await?;

        if self.repo.unfollow(viewer_id, followee.id).await? {
            FOLLOW_EVENTS_TOTAL.with_label_values(&["unfollow"]).inc();
            info!(follower_id = %viewer_id, followee_id = %followee.id, "Follow removed");
        }
        Ok(())
    }

    pub async fn is_following(&self, viewer_id: Uuid, target: &str) -> Result<bool> {
        let followee = self.require_by_username(target).await?;
        self.repo.is_following(viewer_id, followee.id).await
    }

    pub async fn following(&self, username: &str) -> Result<Vec<AuthorDto>> {
        let author = self.require_by_username(username).await?;
        let mut dtos = Vec::new();
        for followee in self.repo.following(author.id).await? {
            dtos.push(self.to_dto(&followee).await?);
        }
        Ok(dtos)
    }

    pub async fn followers(&self, username: &str) -> Result<Vec<AuthorDto>> {
        let author = self.require_by_username(username).await?;
        let mut dtos = Vec::new();
        for follower in self.repo.followers(author.id).await? {
            dtos.push(self.to_dto(&follower).await?);
        }
        Ok(dtos)
    }

    /// Delete the viewer's account with all of their content and follow edges.
    pub async fn forget_me(&self, viewer_id: Uuid) -> Result<()> {
        if !self.repo.delete_author(viewer_id).await? {
            warn!(author_id = %viewer_id, "Forget-me requested for unknown author");
            return Err(AppError::NotFound(format!("author {}", viewer_id)));
        }
        info!(author_id = %viewer_id, "Author deleted on request");
        Ok(())
    }

    /// Everything stored about the viewer.
    pub async fn export(&self, viewer_id: Uuid) -> Result<AuthorExport> {
        let author = self.require_by_id(viewer_id).await?;
        let following = self.repo.following(author.id).await?;
        let followers = self.repo.followers(author.id).await?;
        let total = self.repo.count_cheeps_by_author(author.id).await?;
        let cheeps = self
            .repo
            .list_cheeps_by_author(author.id, 0, total.max(1))
            .await?;

        Ok(AuthorExport {
            username: author.username,
            email: author.email,
            image_url: author.image_url,
            joined_at: author.created_at,
            following: following.into_iter().map(|a| a.username).collect(),
            followers: followers.into_iter().map(|a| a.username).collect(),
            cheeps: cheeps.into_iter().map(CheepDto::from).collect(),
            exported_at: Utc::now(),
        })
    }
}
