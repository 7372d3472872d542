use crate::models::{Category, Content, User};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use thiserror::Error;

/// RepositoryError
///
/// Failures surfaced by the persistence layer. Callers decide how each maps to HTTP.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("Cannot Delete a Category That Has Associated Contents")]
    CategoryInUse,
    // Lost a race on the unique slug index.
    #[error("Slug Already Exists")]
    SlugTaken,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Columns a content listing may be ordered by. Anything else is rejected before
/// it reaches SQL, since ORDER BY cannot be parameterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderColumn {
    #[default]
    CreatedAt,
    Title,
    Status,
    Id,
}

impl OrderColumn {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created_at" => Some(OrderColumn::CreatedAt),
            "title" => Some(OrderColumn::Title),
            "status" => Some(OrderColumn::Status),
            "id" => Some(OrderColumn::Id),
            _ => None,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            OrderColumn::CreatedAt => "c.created_at",
            OrderColumn::Title => "c.title",
            OrderColumn::Status => "c.status",
            OrderColumn::Id => "c.id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// ContentFilter
///
/// A validated listing request. `page` and `limit` are always >= 1 here.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFilter {
    pub page: i64,
    pub limit: i64,
    pub order_by: OrderColumn,
    pub direction: SortDirection,
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub status: Option<String>,
}

impl ContentFilter {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Column values written on content create and update.
#[derive(Debug, Clone, Default)]
pub struct ContentInput {
    pub title: String,
    pub excerpt: String,
    pub description: String,
    pub image: String,
    pub tags: String,
    pub status: String,
    pub category_id: i64,
    pub created_by_id: i64,
}

/// Repository Trait
///
/// The persistence contract the services are written against. `PostgresRepository`
/// is the production implementation; tests supply in-memory ones.
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_email(&self, email: &str) -> Result<User, RepositoryError>;
    async fn get_user(&self, id: i64) -> Result<User, RepositoryError>;
    // Inserts the user unless the email is taken. Returns true if a row was inserted.
    async fn ensure_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, RepositoryError>;
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), RepositoryError>;

    // --- Categories ---
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn get_category(&self, id: i64) -> Result<Category, RepositoryError>;
    // Rows whose slug equals `slug`, optionally ignoring the row being edited.
    async fn count_categories_by_slug(
        &self,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<i64, RepositoryError>;
    async fn create_category(
        &self,
        title: &str,
        slug: &str,
        created_by_id: i64,
    ) -> Result<Category, RepositoryError>;
    async fn update_category(
        &self,
        id: i64,
        title: &str,
        slug: &str,
        created_by_id: i64,
    ) -> Result<Category, RepositoryError>;
    // Refuses with `CategoryInUse` while any content references the category.
    async fn delete_category(&self, id: i64) -> Result<(), RepositoryError>;

    // --- Contents ---
    // Returns the requested page and the total number of matching rows.
    async fn list_contents(
        &self,
        filter: &ContentFilter,
    ) -> Result<(Vec<Content>, i64), RepositoryError>;
    async fn get_content(&self, id: i64, status: Option<&str>) -> Result<Content, RepositoryError>;
    async fn create_content(&self, input: ContentInput) -> Result<Content, RepositoryError>;
    async fn update_content(&self, id: i64, input: ContentInput) -> Result<Content, RepositoryError>;
    async fn delete_content(&self, id: i64) -> Result<(), RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CATEGORY_SELECT: &str = r#"
    SELECT cat.id, cat.title, cat.slug, cat.created_by_id, u.name AS created_by_name, cat.created_at
    FROM categories cat
    JOIN users u ON u.id = cat.created_by_id
"#;

const CONTENT_SELECT: &str = r#"
    SELECT
        c.id, c.title, c.excerpt, c.description, c.image, c.tags, c.status,
        c.category_id, c.created_by_id, c.created_at,
        cat.title AS category_title, cat.slug AS category_slug, u.name AS author
    FROM contents c
    JOIN categories cat ON cat.id = c.category_id
    JOIN users u ON u.id = c.created_by_id
    WHERE 1 = 1
"#;

/// Maps a unique-index violation on a category write to `SlugTaken`.
fn category_write_error(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::SlugTaken,
        _ => RepositoryError::from(e),
    }
}

/// Appends the WHERE conditions shared by the listing query and its count.
fn push_content_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ContentFilter) {
    if let Some(s) = &filter.search {
        let pattern = format!("%{}%", s);
        builder.push(" AND (c.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR c.excerpt ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR c.description ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(category_id) = filter.category_id {
        builder.push(" AND c.category_id = ");
        builder.push_bind(category_id);
    }

    if let Some(status) = &filter.status {
        builder.push(" AND c.status = ");
        builder.push_bind(status.clone());
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>("SELECT id, name, email, password FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(code = "[REPOSITORY] GetUserByEmail - 1", error = ?e);
                RepositoryError::from(e)
            })?
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_user(&self, id: i64) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>("SELECT id, name, email, password FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(code = "[REPOSITORY] GetUserByID - 1", error = ?e);
                RepositoryError::from(e)
            })?
            .ok_or(RepositoryError::NotFound)
    }

    /// ensure_user
    ///
    /// Uses `ON CONFLICT DO NOTHING` so seeding at every boot is idempotent.
    async fn ensure_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) ON CONFLICT (email) DO NOTHING",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(code = "[REPOSITORY] SeedUser - 1", error = ?e);
            RepositoryError::from(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(code = "[REPOSITORY] UpdatePassword - 1", error = ?e);
                RepositoryError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let query = format!("{} ORDER BY cat.created_at DESC, cat.id DESC", CATEGORY_SELECT);
        sqlx::query_as::<_, Category>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(code = "[REPOSITORY] GetCategories - 1", error = ?e);
                RepositoryError::from(e)
            })
    }

    async fn get_category(&self, id: i64) -> Result<Category, RepositoryError> {
        let query = format!("{} WHERE cat.id = $1", CATEGORY_SELECT);
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(code = "[REPOSITORY] GetCategoryByID - 1", error = ?e);
                RepositoryError::from(e)
            })?
            .ok_or(RepositoryError::NotFound)
    }

    async fn count_categories_by_slug(
        &self,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<i64, RepositoryError> {
        // `$2 IS NULL` keeps a single statement for both the create and edit paths.
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2)",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(code = "[REPOSITORY] CountSlug - 1", error = ?e);
            RepositoryError::from(e)
        })
    }

    /// create_category
    ///
    /// Inserts and joins the author name in one round trip with a CTE.
    async fn create_category(
        &self,
        title: &str,
        slug: &str,
        created_by_id: i64,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r#"
            WITH inserted AS (
                INSERT INTO categories (title, slug, created_by_id) VALUES ($1, $2, $3)
                RETURNING id, title, slug, created_by_id, created_at
            )
            SELECT i.id, i.title, i.slug, i.created_by_id, u.name AS created_by_name, i.created_at
            FROM inserted i JOIN users u ON u.id = i.created_by_id
            "#,
        )
        .bind(title)
        .bind(slug)
        .bind(created_by_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(code = "[REPOSITORY] CreateCategory - 1", error = ?e);
            category_write_error(e)
        })
    }

    async fn update_category(
        &self,
        id: i64,
        title: &str,
        slug: &str,
        created_by_id: i64,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r#"
            WITH updated AS (
                UPDATE categories
                SET title = $2, slug = $3, created_by_id = $4, updated_at = NOW()
                WHERE id = $1
                RETURNING id, title, slug, created_by_id, created_at
            )
            SELECT up.id, up.title, up.slug, up.created_by_id, u.name AS created_by_name, up.created_at
            FROM updated up JOIN users u ON u.id = up.created_by_id
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(slug)
        .bind(created_by_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(code = "[REPOSITORY] EditCategoryByID - 1", error = ?e);
            category_write_error(e)
        })?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete_category(&self, id: i64) -> Result<(), RepositoryError> {
        let in_use = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contents WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(code = "[REPOSITORY] DeleteCategoryByID - 1", error = ?e);
                RepositoryError::from(e)
            })?;

        if in_use > 0 {
            return Err(RepositoryError::CategoryInUse);
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(code = "[REPOSITORY] DeleteCategoryByID - 2", error = ?e);
                RepositoryError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// list_contents
    ///
    /// Filtering goes through `QueryBuilder` binds; ordering comes from the
    /// `OrderColumn`/`SortDirection` whitelists, never from raw input.
    async fn list_contents(
        &self,
        filter: &ContentFilter,
    ) -> Result<(Vec<Content>, i64), RepositoryError> {
        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM contents c WHERE 1 = 1");
        push_content_filters(&mut count, filter);

        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(code = "[REPOSITORY] GetContents - 1", error = ?e);
                RepositoryError::from(e)
            })?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(CONTENT_SELECT);
        push_content_filters(&mut builder, filter);
        builder.push(format!(
            " ORDER BY {} {}, c.id DESC",
            filter.order_by.as_sql(),
            filter.direction.as_sql()
        ));
        builder.push(" LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset());

        let rows = builder
            .build_query_as::<Content>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(code = "[REPOSITORY] GetContents - 2", error = ?e);
                RepositoryError::from(e)
            })?;

        Ok((rows, total))
    }

    async fn get_content(&self, id: i64, status: Option<&str>) -> Result<Content, RepositoryError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(CONTENT_SELECT);
        builder.push(" AND c.id = ");
        builder.push_bind(id);
        if let Some(s) = status {
            builder.push(" AND c.status = ");
            builder.push_bind(s.to_string());
        }

        builder
            .build_query_as::<Content>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(code = "[REPOSITORY] GetContentByID - 1", error = ?e);
                RepositoryError::from(e)
            })?
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_content(&self, input: ContentInput) -> Result<Content, RepositoryError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO contents (title, excerpt, description, image, tags, status, category_id, created_by_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&input.title)
        .bind(&input.excerpt)
        .bind(&input.description)
        .bind(&input.image)
        .bind(&input.tags)
        .bind(&input.status)
        .bind(input.category_id)
        .bind(input.created_by_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(code = "[REPOSITORY] CreateContent - 1", error = ?e);
            RepositoryError::from(e)
        })?;

        self.get_content(id, None).await
    }

    async fn update_content(&self, id: i64, input: ContentInput) -> Result<Content, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE contents
            SET title = $2, excerpt = $3, description = $4, image = $5, tags = $6,
                status = $7, category_id = $8, created_by_id = $9, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.excerpt)
        .bind(&input.description)
        .bind(&input.image)
        .bind(&input.tags)
        .bind(&input.status)
        .bind(input.category_id)
        .bind(input.created_by_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(code = "[REPOSITORY] UpdateContent - 1", error = ?e);
            RepositoryError::from(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_content(id, None).await
    }

    async fn delete_content(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM contents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(code = "[REPOSITORY] DeleteContent - 1", error = ?e);
                RepositoryError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
