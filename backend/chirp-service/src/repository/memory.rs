use super::{AuthorRepository, CheepRepository, ChirpRepository, CommentRepository};
use crate::error::{AppError, Result};
use crate::models::{Author, Cheep, CheepWithAuthor, Comment, CommentWithAuthor, NewAuthor};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local repository.
///
/// Both directions of the follow graph are stored as adjacency sets and are only
/// ever mutated together under the write lock, so
/// `following[a].contains(b) == followers[b].contains(a)` holds after every call.
#[derive(Default)]
pub struct InMemoryChirpRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    authors: HashMap<Uuid, Author>,
    cheeps: HashMap<Uuid, Cheep>,
    comments: HashMap<Uuid, Comment>,
    following: HashMap<Uuid, BTreeSet<Uuid>>,
    followers: HashMap<Uuid, BTreeSet<Uuid>>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl State {
    /// Strictly increasing clock so insertion order is also timestamp order.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.authors
            .values()
            .any(|a| a.username == username && Some(a.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.authors
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(email) && Some(a.id) != except)
    }

    fn check_unique(&self, username: &str, email: &str, except: Option<Uuid>) -> Result<()> {
        if self.username_taken(username, except) {
            return Err(AppError::Conflict(format!(
                "username '{}' is already taken",
                username
            )));
        }
        if self.email_taken(email, except) {
            return Err(AppError::Conflict(format!(
                "email '{}' is already registered",
                email
            )));
        }
        Ok(())
    }

    fn with_author(&self, cheep: &Cheep) -> Option<CheepWithAuthor> {
        let author = self.authors.get(&cheep.author_id)?;
        Some(CheepWithAuthor {
            id: cheep.id,
            author_id: cheep.author_id,
            author_username: author.username.clone(),
            author_image_url: author.image_url.clone(),
            text: cheep.text.clone(),
            created_at: cheep.created_at,
        })
    }

    /// Newest first, ties broken by id descending (same order as the SQL queries)
    fn page_of<'a>(
        &self,
        cheeps: impl Iterator<Item = &'a Cheep>,
        offset: i64,
        limit: i64,
    ) -> Vec<CheepWithAuthor> {
        let mut sorted: Vec<&Cheep> = cheeps.collect();
        sorted.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        sorted
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .filter_map(|c| self.with_author(c))
            .collect()
    }

    fn authors_sorted(&self, ids: Option<&BTreeSet<Uuid>>) -> Vec<Author> {
        let mut authors: Vec<Author> = ids
            .into_iter()
            .flatten()
            .filter_map(|id| self.authors.get(id).cloned())
            .collect();
        authors.sort_by(|a, b| a.username.cmp(&b.username));
        authors
    }

    fn remove_comments_where(&mut self, pred: impl Fn(&Comment) -> bool) -> usize {
        let before = self.comments.len();
        self.comments.retain(|_, c| !pred(c));
        before - self.comments.len()
    }
}

impl InMemoryChirpRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify follow-graph symmetry. Used by tests after mutating operations.
    pub async fn follow_graph_is_symmetric(&self) -> bool {
        let state = self.state.read().await;
        let forward = state.following.iter().all(|(a, set)| {
            set.iter()
                .all(|b| state.followers.get(b).is_some_and(|f| f.contains(a)))
        });
        let backward = state.followers.iter().all(|(b, set)| {
            set.iter()
                .all(|a| state.following.get(a).is_some_and(|f| f.contains(b)))
        });
        forward && backward
    }
}

#[async_trait::async_trait]
impl AuthorRepository for InMemoryChirpRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Author>> {
        let state = self.state.read().await;
        Ok(state
            .authors
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Author>> {
        let state = self.state.read().await;
        Ok(state
            .authors
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Author>> {
        Ok(self.state.read().await.authors.get(&id).cloned())
    }

    async fn create_author(&self, author: NewAuthor) -> Result<Author> {
        let mut state = self.state.write().await;
        state.check_unique(&author.username, &author.email, None)?;

        let created = Author {
            id: Uuid::new_v4(),
            username: author.username,
            email: author.email,
            image_url: author.image_url,
            created_at: state.tick(),
        };
        state.authors.insert(created.id, created.clone());
        Ok(created)
    }

    async fn ensure_author(&self, id: Uuid, username: &str, email: &str) -> Result<Author> {
        let mut state = self.state.write().await;
        state.check_unique(username, email, Some(id))?;

        let existing = state.authors.get(&id).map(|a| a.created_at);
        let created_at = match existing {
            Some(ts) => ts,
            None => state.tick(),
        };
        let author = state.authors.entry(id).or_insert_with(|| Author {
            id,
            username: String::new(),
            email: String::new(),
            image_url: None,
            created_at,
        });
        author.username = username.to_string();
        author.email = email.to_string();
        Ok(author.clone())
    }

    async fn update_image(&self, id: Uuid, image_url: Option<String>) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.authors.get_mut(&id) {
            Some(author) => {
                author.image_url = image_url;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        if follower_id == followee_id {
            return Err(AppError::Validation("authors cannot follow themselves".into()));
        }

        let mut state = self.state.write().await;
        for id in [follower_id, followee_id] {
            if !state.authors.contains_key(&id) {
                return Err(AppError::NotFound(format!("author {}", id)));
            }
        }

        let created = state
            .following
            .entry(follower_id)
            .or_default()
            .insert(followee_id);
        state
            .followers
            .entry(followee_id)
            .or_default()
            .insert(follower_id);
        Ok(created)
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;

        let removed = state
            .following
            .get_mut(&follower_id)
            .is_some_and(|set| set.remove(&followee_id));
        if let Some(set) = state.followers.get_mut(&followee_id) {
            set.remove(&follower_id);
        }
        Ok(removed)
    }

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .following
            .get(&follower_id)
            .is_some_and(|set| set.contains(&followee_id)))
    }

    async fn following(&self, id: Uuid) -> Result<Vec<Author>> {
        let state = self.state.read().await;
        Ok(state.authors_sorted(state.following.get(&id)))
    }

    async fn followers(&self, id: Uuid) -> Result<Vec<Author>> {
        let state = self.state.read().await;
        Ok(state.authors_sorted(state.followers.get(&id)))
    }

    async fn follow_counts(&self, id: Uuid) -> Result<(i64, i64)> {
        let state = self.state.read().await;
        let followers = state.followers.get(&id).map_or(0, |s| s.len()) as i64;
        let following = state.following.get(&id).map_or(0, |s| s.len()) as i64;
        Ok((followers, following))
    }

    async fn delete_author(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.authors.remove(&id).is_none() {
            return Ok(false);
        }

        // Drop the author from the other side of every edge, then their own sets.
        if let Some(followees) = state.following.remove(&id) {
            for followee in followees {
                if let Some(set) = state.followers.get_mut(&followee) {
                    set.remove(&id);
                }
            }
        }
        if let Some(followers) = state.followers.remove(&id) {
            for follower in followers {
                if let Some(set) = state.following.get_mut(&follower) {
                    set.remove(&id);
                }
            }
        }

        let owned_cheeps: HashSet<Uuid> = state
            .cheeps
            .values()
            .filter(|c| c.author_id == id)
            .map(|c| c.id)
            .collect();
        state.remove_comments_where(|c| c.author_id == id || owned_cheeps.contains(&c.cheep_id));
        state.cheeps.retain(|_, c| c.author_id != id);

        Ok(true)
    }
}

#[async_trait::async_trait]
impl CheepRepository for InMemoryChirpRepository {
    async fn create_cheep(&self, author_id: Uuid, text: &str) -> Result<Cheep> {
        let mut state = self.state.write().await;
        if !state.authors.contains_key(&author_id) {
            return Err(AppError::NotFound(format!("author {}", author_id)));
        }

        let cheep = Cheep {
            id: Uuid::new_v4(),
            author_id,
            text: text.to_string(),
            created_at: state.tick(),
        };
        state.cheeps.insert(cheep.id, cheep.clone());
        Ok(cheep)
    }

    async fn find_cheep(&self, id: Uuid) -> Result<Option<CheepWithAuthor>> {
        let state = self.state.read().await;
        Ok(state.cheeps.get(&id).and_then(|c| state.with_author(c)))
    }

    async fn list_cheeps(&self, offset: i64, limit: i64) -> Result<Vec<CheepWithAuthor>> {
        let state = self.state.read().await;
        Ok(state.page_of(state.cheeps.values(), offset, limit))
    }

    async fn list_cheeps_by_author(
        &self,
        author_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CheepWithAuthor>> {
        let state = self.state.read().await;
        Ok(state.page_of(
            state.cheeps.values().filter(|c| c.author_id == author_id),
            offset,
            limit,
        ))
    }

    async fn list_cheeps_by_authors(
        &self,
        author_ids: &[Uuid],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CheepWithAuthor>> {
        let wanted: HashSet<&Uuid> = author_ids.iter().collect();
        let state = self.state.read().await;
        Ok(state.page_of(
            state.cheeps.values().filter(|c| wanted.contains(&c.author_id)),
            offset,
            limit,
        ))
    }

    async fn count_cheeps(&self) -> Result<i64> {
        Ok(self.state.read().await.cheeps.len() as i64)
    }

    async fn count_cheeps_by_author(&self, author_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .cheeps
            .values()
            .filter(|c| c.author_id == author_id)
            .count() as i64)
    }

    async fn count_cheeps_by_authors(&self, author_ids: &[Uuid]) -> Result<i64> {
        let wanted: HashSet<&Uuid> = author_ids.iter().collect();
        let state = self.state.read().await;
        Ok(state
            .cheeps
            .values()
            .filter(|c| wanted.contains(&c.author_id))
            .count() as i64)
    }

    async fn delete_cheep(&self, id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let owned = state
            .cheeps
            .get(&id)
            .is_some_and(|c| c.author_id == author_id);
        if !owned {
            return Ok(false);
        }

        state.cheeps.remove(&id);
        state.remove_comments_where(|c| c.cheep_id == id);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl CommentRepository for InMemoryChirpRepository {
    async fn create_comment(
        &self,
        cheep_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Comment> {
        let mut state = self.state.write().await;
        if !state.cheeps.contains_key(&cheep_id) {
            return Err(AppError::NotFound(format!("cheep {}", cheep_id)));
        }
        if !state.authors.contains_key(&author_id) {
            return Err(AppError::NotFound(format!("author {}", author_id)));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            cheep_id,
            author_id,
            text: text.to_string(),
            created_at: state.tick(),
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, cheep_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let state = self.state.read().await;
        let mut comments: Vec<CommentWithAuthor> = state
            .comments
            .values()
            .filter(|c| c.cheep_id == cheep_id)
            .filter_map(|c| {
                let author = state.authors.get(&c.author_id)?;
                Some(CommentWithAuthor {
                    id: c.id,
                    cheep_id: c.cheep_id,
                    author_id: c.author_id,
                    author_username: author.username.clone(),
                    text: c.text.clone(),
                    created_at: c.created_at,
                })
            })
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn delete_comment(&self, id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let owned = state
            .comments
            .get(&id)
            .is_some_and(|c| c.author_id == author_id);
        if owned {
            state.comments.remove(&id);
        }
        Ok(owned)
    }
}

impl ChirpRepository for InMemoryChirpRepository {}
