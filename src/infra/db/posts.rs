use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CategoryCount, NewPostParams, PostsRepo, PostsWriteRepo, RepoError, SiteTotals,
    UpdatePostParams,
};
use crate::domain::entities::PostRecord;
use crate::domain::types::Category;

use super::PostgresRepositories;
use super::map_sqlx_error;

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: String,
    excerpt: Option<String>,
    author_id: Uuid,
    author_name: String,
    category: Category,
    tags: Vec<String>,
    image_url: Option<String>,
    views: i64,
    published: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            excerpt: row.excerpt,
            author_id: row.author_id,
            author_name: row.author_name,
            category: row.category,
            tags: row.tags,
            image_url: row.image_url,
            views: row.views,
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn top_viewed_published(&self, limit: i64) -> Result<Vec<PostRecord>, RepoError> {
        let rows: Vec<PostRow> = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, excerpt, author_id, author_name, category,
                   tags, image_url, views, published, created_at, updated_at
            FROM posts
            WHERE published = TRUE
            ORDER BY views DESC, created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn recent_published(
        &self,
        category: Option<Category>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new(
            "SELECT id, title, content, excerpt, author_id, author_name, category, \
             tags, image_url, views, published, created_at, updated_at \
             FROM posts WHERE published = TRUE ",
        );

        if let Some(category) = category {
            qb.push(" AND category = ");
            qb.push_bind(category);
        }

        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_published(&self, category: Option<Category>) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts WHERE published = TRUE ");

        if let Some(category) = category {
            qb.push(" AND category = ");
            qb.push_bind(category);
        }

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let row: Option<PostRow> = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, excerpt, author_id, author_name, category,
                   tags, image_url, views, published, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn find_published_by_title(&self, title: &str) -> Result<Option<PostRecord>, RepoError> {
        let row: Option<PostRow> = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, excerpt, author_id, author_name, category,
                   tags, image_url, views, published, created_at, updated_at
            FROM posts
            WHERE title = $1 AND published = TRUE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(title)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn related_published(
        &self,
        category: Category,
        exclude: Uuid,
        limit: i64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let rows: Vec<PostRow> = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, excerpt, author_id, author_name, category,
                   tags, image_url, views, published, created_at, updated_at
            FROM posts
            WHERE category = $1 AND id <> $2 AND published = TRUE
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(category)
        .bind(exclude)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn search_published(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let pattern = format!("%{}%", query);

        let rows: Vec<PostRow> = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, excerpt, author_id, author_name, category,
                   tags, image_url, views, published, created_at, updated_at
            FROM posts
            WHERE published = TRUE
              AND (title ILIKE $1
                   OR content ILIKE $1
                   OR EXISTS (SELECT 1 FROM UNNEST(tags) AS tag WHERE tag ILIKE $1))
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn site_totals(&self) -> Result<SiteTotals, RepoError> {
        #[derive(sqlx::FromRow)]
        struct TotalsRow {
            total_posts: i64,
            total_views: i64,
        }

        #[derive(sqlx::FromRow)]
        struct CategoryCountRow {
            category: Category,
            count: i64,
        }

        let totals: TotalsRow = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT COUNT(*) AS total_posts,
                   COALESCE(SUM(views), 0)::BIGINT AS total_views
            FROM posts
            WHERE published = TRUE
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let rows: Vec<CategoryCountRow> = sqlx::query_as::<_, CategoryCountRow>(
            r#"
            SELECT category, COUNT(*) AS count
            FROM posts
            WHERE published = TRUE
            GROUP BY category
            ORDER BY count DESC, category
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut category_counts = Vec::with_capacity(rows.len());
        for row in rows {
            category_counts.push(CategoryCount {
                category: row.category,
                count: Self::convert_count(row.count)?,
            });
        }

        Ok(SiteTotals {
            total_posts: Self::convert_count(totals.total_posts)?,
            total_views: Self::convert_count(totals.total_views)?,
            category_counts,
        })
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: NewPostParams) -> Result<PostRecord, RepoError> {
        let NewPostParams {
            title,
            content,
            excerpt,
            author_id,
            author_name,
            category,
            tags,
            image_url,
            published,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let row: PostRow = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (
                id, title, content, excerpt, author_id, author_name, category,
                tags, image_url, views, published, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, $10, $11, $11)
            RETURNING id, title, content, excerpt, author_id, author_name, category,
                      tags, image_url, views, published, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(excerpt)
        .bind(author_id)
        .bind(author_name)
        .bind(category)
        .bind(tags)
        .bind(image_url)
        .bind(published)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            title,
            content,
            excerpt,
            category,
            tags,
            image_url,
        } = params;

        let now = OffsetDateTime::now_utc();
        let row: PostRow = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET title = $2,
                content = $3,
                excerpt = $4,
                category = $5,
                tags = $6,
                image_url = COALESCE($7, image_url),
                updated_at = $8
            WHERE id = $1
            RETURNING id, title, content, excerpt, author_id, author_name, category,
                      tags, image_url, views, published, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(excerpt)
        .bind(category)
        .bind(tags)
        .bind(image_url)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> Result<PostRecord, RepoError> {
        let row: PostRow = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET views = views + 1
            WHERE id = $1
            RETURNING id, title, content, excerpt, author_id, author_name, category,
                      tags, image_url, views, published, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }
}
