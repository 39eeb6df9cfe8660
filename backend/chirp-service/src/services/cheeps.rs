/// Cheep service - timelines, posting and cheep detail
use super::{validate_message_text, PageRequest};
use crate::error::{AppError, Result};
use crate::metrics::CHEEPS_POSTED_TOTAL;
use crate::models::{CheepDetailDto, CheepDto, CommentDto, Page};
use crate::repository::ChirpRepository;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct CheepService {
    repo: Arc<dyn ChirpRepository>,
    page_size: u32,
}

impl CheepService {
    pub fn new(repo: Arc<dyn ChirpRepository>, page_size: u32) -> Self {
        Self { repo, page_size }
    }

    fn window(&self, page: u32) -> PageRequest {
        PageRequest::new(page, self.page_size)
    }

    /// Every cheep, newest first
    pub async fn public_timeline(&self, page: u32) -> Result<Page<CheepDto>> {
        let window = self.window(page);
        let total = self.repo.count_cheeps().await?;
        let rows = self
            .repo
            .list_cheeps(window.offset(), window.limit())
            .await?;

        Ok(Page::new(
            rows.into_iter().map(CheepDto::from).collect(),
            window.page,
            window.page_size,
            total,
        ))
    }

    /// One author's cheeps
    pub async fn author_timeline(&self, username: &str, page: u32) -> Result<Page<CheepDto>> {
        let author = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("author '{}'", username)))?;

        let window = self.window(page);
        let total = self.repo.count_cheeps_by_author(author.id).await?;
        let rows = self
            .repo
            .list_cheeps_by_author(author.id, window.offset(), window.limit())
            .await?;

        Ok(Page::new(
            rows.into_iter().map(CheepDto::from).collect(),
            window.page,
            window.page_size,
            total,
        ))
    }

    /// The viewer's own cheeps merged with those of everyone they follow
    pub async fn private_timeline(&self, viewer_id: Uuid, page: u32) -> Result<Page<CheepDto>> {
        let mut author_ids: Vec<Uuid> = self
            .repo
            .following(viewer_id)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        author_ids.push(viewer_id);

        let window = self.window(page);
        let total = self.repo.count_cheeps_by_authors(&author_ids).await?;
        let rows = self
            .repo
            .list_cheeps_by_authors(&author_ids, window.offset(), window.limit())
            .await?;

        Ok(Page::new(
            rows.into_iter().map(CheepDto::from).collect(),
            window.page,
            window.page_size,
            total,
        ))
    }

    /// Author page as seen by `viewer_id`: authors looking at their own page get
    /// their private timeline.
    pub async fn author_page(
        &self,
        username: &str,
        page: u32,
        viewer_id: Option<Uuid>,
    ) -> Result<Page<CheepDto>> {
        if let Some(viewer_id) = viewer_id {
            if let Some(author) = self.repo.find_by_username(username).await? {
                if author.id == viewer_id {
                    return self.private_timeline(viewer_id, page).await;
                }
            }
        }
        self.author_timeline(username, page).await
    }

    pub async fn post_cheep(&self, author_id: Uuid, text: &str) -> Result<CheepDto> {
        let text = validate_message_text(text)?;
        let cheep = self.repo.create_cheep(author_id, &text).await?;
        CHEEPS_POSTED_TOTAL.inc();
        info!(cheep_id = %cheep.id, %author_id, "Cheep posted");

        let row = self
            .repo
            .find_cheep(cheep.id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("cheep {} vanished after insert", cheep.id)))?;
        Ok(CheepDto::from(row))
    }

    pub async fn cheep_detail(&self, cheep_id: Uuid) -> Result<CheepDetailDto> {
        let cheep = self
            .repo
            .find_cheep(cheep_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("cheep {}", cheep_id)))?;
        let comments = self.repo.list_comments(cheep_id).await?;

        Ok(CheepDetailDto {
            cheep: CheepDto::from(cheep),
            comments: comments.into_iter().map(CommentDto::from).collect(),
        })
    }

    /// Returns false when the cheep does not exist or belongs to someone else.
    pub async fn delete_cheep(&self, cheep_id: Uuid, viewer_id: Uuid) -> Result<bool> {
        let deleted = self.repo.delete_cheep(cheep_id, viewer_id).await?;
        if deleted {
            info!(%cheep_id, author_id = %viewer_id, "Cheep deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewAuthor;
    use crate::repository::{AuthorRepository, CommentRepository, InMemoryChirpRepository};

    async fn setup(page_size: u32) -> (Arc<InMemoryChirpRepository>, CheepService) {
        let repo = Arc::new(InMemoryChirpRepository::new());
        let service = CheepService::new(repo.clone(), page_size);
        (repo, service)
    }

    async fn author(repo: &InMemoryChirpRepository, name: &str) -> Uuid {
        repo.create_author(NewAuthor {
            username: name.into(),
            email: format!("{}@chirp.test", name),
            image_url: None,
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn public_timeline_pages_newest_first() {
        let (repo, service) = setup(2).await;
        let a = author(&repo, "a").await;
        for i in 1..=5 {
            service.post_cheep(a, &format!("#{}", i)).await.unwrap();
        }

        let first = service.public_timeline(1).await.unwrap();
        assert_eq!(first.total_items, 5);
        assert_eq!(first.total_pages, 3);
        let texts: Vec<_> = first.items.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["#5", "#4"]);

        let last = service.public_timeline(3).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].text, "#1");

        let past_end = service.public_timeline(9).await.unwrap();
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.page, 9);
    }

    #[tokio::test]
    async fn page_zero_is_first_page() {
        let (repo, service) = setup(32).await;
        let a = author(&repo, "a").await;
        service.post_cheep(a, "only").await.unwrap();
        let page = service.public_timeline(0).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn author_timeline_unknown_author_is_not_found() {
        let (_repo, service) = setup(32).await;
        assert!(matches!(
            service.author_timeline("ghost", 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn private_timeline_includes_followed_authors_only() {
        let (repo, service) = setup(32).await;
        let me = author(&repo, "me").await;
        let friend = author(&repo, "friend").await;
        let stranger = author(&repo, "stranger").await;

        service.post_cheep(me, "mine").await.unwrap();
        service.post_cheep(friend, "friend's").await.unwrap();
        service.post_cheep(stranger, "stranger's").await.unwrap();

        let alone = service.private_timeline(me, 1).await.unwrap();
        assert_eq!(alone.total_items, 1);
        assert_eq!(alone.items[0].text, "mine");

        repo.follow(me, friend).await.unwrap();
        let timeline = service.private_timeline(me, 1).await.unwrap();
        let texts: Vec<_> = timeline.items.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["friend's", "mine"]);
    }

    #[tokio::test]
    async fn author_page_switches_to_private_timeline_for_owner() {
        let (repo, service) = setup(32).await;
        let me = author(&repo, "me").await;
        let friend = author(&repo, "friend").await;
        repo.follow(me, friend).await.unwrap();
        service.post_cheep(friend, "hello").await.unwrap();

        let own = service.author_page("me", 1, Some(me)).await.unwrap();
        assert_eq!(own.total_items, 1);

        let as_stranger = service.author_page("me", 1, Some(friend)).await.unwrap();
        assert_eq!(as_stranger.total_items, 0);

        let anonymous = service.author_page("friend", 1, None).await.unwrap();
        assert_eq!(anonymous.total_items, 1);
    }

    #[tokio::test]
    async fn post_cheep_validates_text() {
        let (repo, service) = setup(32).await;
        let a = author(&repo, "a").await;

        assert!(matches!(
            service.post_cheep(a, "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.post_cheep(a, &"x".repeat(161)).await,
            Err(AppError::Validation(_))
        ));

        let dto = service.post_cheep(a, "  trimmed  ").await.unwrap();
        assert_eq!(dto.text, "trimmed");
        assert_eq!(dto.author, "a");
    }

    #[tokio::test]
    async fn cheep_detail_lists_comments_oldest_first() {
        let (repo, service) = setup(32).await;
        let a = author(&repo, "a").await;
        let b = author(&repo, "b").await;
        let cheep = service.post_cheep(a, "root").await.unwrap();

        repo.create_comment(cheep.id, b, "first").await.unwrap();
        repo.create_comment(cheep.id, a, "second").await.unwrap();

        let detail = service.cheep_detail(cheep.id).await.unwrap();
        assert_eq!(detail.cheep.text, "root");
        let texts: Vec<_> = detail.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(detail.comments[0].author, "b");

        assert!(matches!(
            service.cheep_detail(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
