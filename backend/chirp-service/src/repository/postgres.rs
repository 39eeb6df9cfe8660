use super::{AuthorRepository, CheepRepository, ChirpRepository, CommentRepository};
use crate::error::{AppError, Result};
use crate::models::{Author, Cheep, CheepWithAuthor, Comment, CommentWithAuthor, NewAuthor};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

const SERVICE_NAME: &str = "chirp-service";

const CHEEP_SELECT: &str = r#"
    SELECT c.id, c.author_id, a.username AS author_username,
           a.image_url AS author_image_url, c.text, c.created_at
    FROM cheeps c
    JOIN authors a ON a.id = c.author_id
"#;

/// PostgreSQL repository (source of truth)
#[derive(Clone)]
pub struct PgChirpRepository {
    pool: PgPool,
}

impl PgChirpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuthorRepository for PgChirpRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, username, email, image_url, created_at FROM authors WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            r#"
            SELECT id, username, email, image_url, created_at
            FROM authors
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, username, email, image_url, created_at FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }

    async fn create_author(&self, author: NewAuthor) -> Result<Author> {
        let created = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (id, username, email, image_url, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, username, email, image_url, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&author.username)
        .bind(&author.email)
        .bind(&author.image_url)
        .fetch_one(&self.pool)
        .await?;

        debug!(author_id = %created.id, username = %created.username, "Created author");
        Ok(created)
    }

    async fn ensure_author(&self, id: Uuid, username: &str, email: &str) -> Result<Author> {
        let author = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (id, username, email, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email
            RETURNING id, username, email, image_url, created_at
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(author)
    }

    async fn update_image(&self, id: Uuid, image_url: Option<String>) -> Result<bool> {
        let result = sqlx::query("UPDATE authors SET image_url = $1 WHERE id = $2")
            .bind(image_url)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        if follower_id == followee_id {
            return Err(AppError::Validation("authors cannot follow themselves".into()));
        }

        let inserted = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO follows (follower_id, followee_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            RETURNING follower_id
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(&self.pool)
        .await?;

        debug!(%follower_id, %followee_id, created = inserted.is_some(), "FOLLOWS upsert");
        Ok(inserted.is_some())
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        debug!(%follower_id, %followee_id, removed = affected > 0, "FOLLOWS delete");
        Ok(affected > 0)
    }

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn following(&self, id: Uuid) -> Result<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT a.id, a.username, a.email, a.image_url, a.created_at
            FROM follows f
            JOIN authors a ON a.id = f.followee_id
            WHERE f.follower_id = $1
            ORDER BY a.username ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    async fn followers(&self, id: Uuid) -> Result<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT a.id, a.username, a.email, a.image_url, a.created_at
            FROM follows f
            JOIN authors a ON a.id = f.follower_id
            WHERE f.followee_id = $1
            ORDER BY a.username ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    async fn follow_counts(&self, id: Uuid) -> Result<(i64, i64)> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM follows WHERE followee_id = $1) AS followers,
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1) AS following
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn delete_author(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let edges = sqlx::query("DELETE FROM follows WHERE follower_id = $1 OR followee_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let comments = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE author_id = $1
               OR cheep_id IN (SELECT id FROM cheeps WHERE author_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let cheeps = sqlx::query("DELETE FROM cheeps WHERE author_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        debug!(
            author_id = %id,
            edges,
            comments,
            cheeps,
            "Deleted author and dependent rows"
        );
        Ok(deleted > 0)
    }
}

#[async_trait::async_trait]
impl CheepRepository for PgChirpRepository {
    async fn create_cheep(&self, author_id: Uuid, text: &str) -> Result<Cheep> {
        let cheep = sqlx::query_as::<_, Cheep>(
            r#"
            INSERT INTO cheeps (id, author_id, text, created_at)
            VALUES ($1, $2, $3, clock_timestamp())
            RETURNING id, author_id, text, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(cheep)
    }

    async fn find_cheep(&self, id: Uuid) -> Result<Option<CheepWithAuthor>> {
        let query = format!("{CHEEP_SELECT} WHERE c.id = $1");
        let cheep = sqlx::query_as::<_, CheepWithAuthor>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(cheep)
    }

    async fn list_cheeps(&self, offset: i64, limit: i64) -> Result<Vec<CheepWithAuthor>> {
        let query = format!(
            "{CHEEP_SELECT} ORDER BY c.created_at DESC, c.id DESC LIMIT $1 OFFSET $2"
        );
        let cheeps = sqlx::query_as::<_, CheepWithAuthor>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(cheeps)
    }

    async fn list_cheeps_by_author(
        &self,
        author_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CheepWithAuthor>> {
        let query = format!(
            "{CHEEP_SELECT} WHERE c.author_id = $1 \
             ORDER BY c.created_at DESC, c.id DESC LIMIT $2 OFFSET $3"
        );
        let cheeps = sqlx::query_as::<_, CheepWithAuthor>(&query)
            .bind(author_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(cheeps)
    }

    async fn list_cheeps_by_authors(
        &self,
        author_ids: &[Uuid],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CheepWithAuthor>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "{CHEEP_SELECT} WHERE c.author_id = ANY($1) \
             ORDER BY c.created_at DESC, c.id DESC LIMIT $2 OFFSET $3"
        );
        let cheeps = sqlx::query_as::<_, CheepWithAuthor>(&query)
            .bind(author_ids)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(cheeps)
    }

    async fn count_cheeps(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cheeps")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_cheeps_by_author(&self, author_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cheeps WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_cheeps_by_authors(&self, author_ids: &[Uuid]) -> Result<i64> {
        if author_ids.is_empty() {
            return Ok(0);
        }

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cheeps WHERE author_id = ANY($1)")
                .bind(author_ids)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn delete_cheep(&self, id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM cheeps WHERE id = $1 AND author_id = $2 FOR UPDATE")
                .bind(id)
                .bind(author_id)
                .fetch_optional(&mut *tx)
                .await?;

        if owned.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM comments WHERE cheep_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM cheeps WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl CommentRepository for PgChirpRepository {
    async fn create_comment(
        &self,
        cheep_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, cheep_id, author_id, text, created_at)
            SELECT $1::uuid, c.id, $3::uuid, $4::text, clock_timestamp()
            FROM cheeps c
            WHERE c.id = $2
            RETURNING id, cheep_id, author_id, text, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(cheep_id)
        .bind(author_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        comment.ok_or_else(|| AppError::NotFound(format!("cheep {}", cheep_id)))
    }

    async fn list_comments(&self, cheep_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT cm.id, cm.cheep_id, cm.author_id, a.username AS author_username,
                   cm.text, cm.created_at
            FROM comments cm
            JOIN authors a ON a.id = cm.author_id
            WHERE cm.cheep_id = $1
            ORDER BY cm.created_at ASC, cm.id ASC
            "#,
        )
        .bind(cheep_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn delete_comment(&self, id: Uuid, author_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl ChirpRepository for PgChirpRepository {
    async fn health_check(&self) -> Result<()> {
        let mut conn = db_pool::acquire_with_metrics(&self.pool, SERVICE_NAME).await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}
