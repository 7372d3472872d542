use std::path::Path;

use chrono::Utc;

use crate::{
    error::AppError,
    models::{ContentQuery, ContentRequest, ContentResponse, Pagination, split_tags, join_tags},
    repository::{ContentFilter, ContentInput, OrderColumn, RepositoryState, SortDirection},
    storage::StorageState,
};

pub const ADMIN_PAGE_SIZE: i64 = 10;
pub const PUBLIC_PAGE_SIZE: i64 = 6;
/// Largest `limit` a listing accepts.
pub const MAX_PAGE_SIZE: i64 = 100;

/// ContentService
///
/// Articles: listing with paging/filtering, CRUD, and image upload to object storage.
#[derive(Clone)]
pub struct ContentService {
    repo: RepositoryState,
    storage: StorageState,
}

impl ContentService {
    pub fn new(repo: RepositoryState, storage: StorageState) -> Self {
        Self { repo, storage }
    }

    pub async fn list(
        &self,
        filter: &ContentFilter,
    ) -> Result<(Vec<ContentResponse>, Pagination), AppError> {
        let (rows, total) = self.repo.list_contents(filter).await?;
        let pagination = Pagination::new(total, filter.page, filter.limit);
        Ok((rows.into_iter().map(ContentResponse::from).collect(), pagination))
    }

    /// `status` restricts the lookup, e.g. the public detail page only sees PUBLISH.
    pub async fn get(&self, id: i64, status: Option<&str>) -> Result<ContentResponse, AppError> {
        Ok(self.repo.get_content(id, status).await?.into())
    }

    pub async fn create(&self, req: &ContentRequest, user_id: i64) -> Result<ContentResponse, AppError> {
        let input = self.to_input(req, user_id).await?;
        let created = self.repo.create_content(input).await.map_err(|e| {
            tracing::error!(code = "[SERVICE] CreateContent - 1", error = %e);
            AppError::from(e)
        })?;
        Ok(created.into())
    }

    pub async fn update(
        &self,
        id: i64,
        req: &ContentRequest,
        user_id: i64,
    ) -> Result<ContentResponse, AppError> {
        let input = self.to_input(req, user_id).await?;
        let updated = self.repo.update_content(id, input).await.map_err(|e| {
            tracing::error!(code = "[SERVICE] UpdateContent - 1", error = %e);
            AppError::from(e)
        })?;
        Ok(updated.into())
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        Ok(self.repo.delete_content(id).await?)
    }

    /// upload_image
    ///
    /// Stores the image under `{user_id}-{unix_nanos}{.ext}` and returns its public URL.
    pub async fn upload_image(
        &self,
        user_id: i64,
        file_name: Option<&str>,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<String, AppError> {
        if body.is_empty() {
            return Err(AppError::bad_request("Field image is required"));
        }

        let key = image_key(user_id, file_name, Utc::now().timestamp_nanos_opt().unwrap_or_default());

        self.storage
            .upload_object(&key, body, content_type)
            .await
            .map_err(|e| {
                tracing::error!(code = "[SERVICE] UploadImage - 1", key = %key, error = %e);
                AppError::internal(e)
            })
    }

    async fn to_input(&self, req: &ContentRequest, user_id: i64) -> Result<ContentInput, AppError> {
        // Fail with a 404 on an unknown category instead of a foreign-key 500.
        self.repo.get_category(req.category_id).await?;

        Ok(ContentInput {
            title: req.title.trim().to_string(),
            excerpt: req.excerpt.trim().to_string(),
            description: req.description.clone(),
            image: req.image.trim().to_string(),
            tags: join_tags(&split_tags(&req.tags)),
            status: req.status.clone(),
            category_id: req.category_id,
            created_by_id: user_id,
        })
    }
}

/// Builds the object key for an uploaded image. The extension, if any, comes from
/// the client's file name; everything else is server-chosen.
pub fn image_key(user_id: i64, file_name: Option<&str>, nanos: i64) -> String {
    let ext = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}-{}{}", user_id, nanos, ext)
}

/// filter_from_query
///
/// Validates raw listing parameters into a `ContentFilter`. `forced_status`
/// overrides whatever status the caller asked for.
pub fn filter_from_query(
    query: &ContentQuery,
    default_limit: i64,
    forced_status: Option<&str>,
) -> Result<ContentFilter, AppError> {
    let page = parse_positive(query.page.as_deref(), "page")?.unwrap_or(1);
    let limit = parse_positive(query.limit.as_deref(), "limit")?.unwrap_or(default_limit);
    if limit > MAX_PAGE_SIZE {
        return Err(AppError::bad_request(format!(
            "Invalid limit value: must not exceed {}",
            MAX_PAGE_SIZE
        )));
    }
    // The row offset must fit in a BIGINT.
    if (page - 1).checked_mul(limit).is_none() {
        return Err(AppError::bad_request("Invalid page value: out of range"));
    }

    let order_by = match non_blank(query.order_by.as_deref()) {
        Some(v) => OrderColumn::parse(v)
            .ok_or_else(|| AppError::bad_request(format!("Invalid orderBy value: {}", v)))?,
        None => OrderColumn::default(),
    };

    let direction = match non_blank(query.order_type.as_deref()) {
        Some(v) => SortDirection::parse(v)
            .ok_or_else(|| AppError::bad_request(format!("Invalid orderType value: {}", v)))?,
        None => SortDirection::default(),
    };

    let category_id = parse_positive(query.category_id.as_deref(), "categoryID")?;

    let status = match forced_status {
        Some(s) => Some(s.to_string()),
        None => non_blank(query.status.as_deref()).map(str::to_string),
    };

    Ok(ContentFilter {
        page,
        limit,
        order_by,
        direction,
        search: non_blank(query.search.as_deref()).map(str::to_string),
        category_id,
        status,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_positive(value: Option<&str>, field: &str) -> Result<Option<i64>, AppError> {
    match non_blank(value) {
        None => Ok(None),
        Some(v) => match v.parse::<i64>() {
            Ok(n) if n >= 1 => Ok(Some(n)),
            _ => Err(AppError::bad_request(format!(
                "Invalid {} value: must be a positive integer",
                field
            ))),
        },
    }
}
