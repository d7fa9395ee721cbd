use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CommentsRepo, NewCommentParams, RepoError};
use crate::domain::entities::CommentRecord;

use super::PostgresRepositories;
use super::map_sqlx_error;

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    author_name: String,
    content: String,
    created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            author_name: row.author_name,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let rows: Vec<CommentRow> = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, author_id, author_name, content, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn create_comment(&self, params: NewCommentParams) -> Result<CommentRecord, RepoError> {
        let NewCommentParams {
            post_id,
            author_id,
            author_name,
            content,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let row: CommentRow = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (id, post_id, author_id, author_name, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, post_id, author_id, author_name, content, created_at
            "#,
        )
        .bind(id)
        .bind(post_id)
        .bind(author_id)
        .bind(author_name)
        .bind(content)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CommentRecord::from(row))
    }

    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
