use crate::{
    error::AppError,
    models::Category,
    repository::{RepositoryError, RepositoryState},
    slug::{slugify, with_suffix},
};

// Insert attempts per write before a slug race is reported as a conflict.
const SLUG_ATTEMPTS: u32 = 2;

/// CategoryService
///
/// Category CRUD plus the slug policy: a slug is derived from the title and made
/// unique by counting rows that already use it.
#[derive(Clone)]
pub struct CategoryService {
    repo: RepositoryState,
}

impl CategoryService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// Newest first. An empty table is reported as not found.
    pub async fn list(&self) -> Result<Vec<Category>, AppError> {
        let categories = self.repo.list_categories().await?;
        if categories.is_empty() {
            return Err(AppError::NotFound("Data Not Found".to_string()));
        }
        Ok(categories)
    }

    pub async fn get(&self, id: i64) -> Result<Category, AppError> {
        Ok(self.repo.get_category(id).await?)
    }

    /// create
    ///
    /// A concurrent write can claim the computed slug between the count and the
    /// insert. The slug is then recomputed once; a second loss is a 409.
    pub async fn create(&self, title: &str, user_id: i64) -> Result<Category, AppError> {
        let title = title.trim();

        for attempt in 1..=SLUG_ATTEMPTS {
            let slug = self.unique_slug(title, None).await?;
            match self.repo.create_category(title, &slug, user_id).await {
                Ok(category) => return Ok(category),
                Err(RepositoryError::SlugTaken) if attempt < SLUG_ATTEMPTS => {
                    tracing::warn!(code = "[SERVICE] CreateCategory - 1", slug = %slug, "slug taken concurrently, retrying");
                }
                Err(e) => {
                    tracing::error!(code = "[SERVICE] CreateCategory - 2", error = %e);
                    return Err(e.into());
                }
            }
        }

        Err(RepositoryError::SlugTaken.into())
    }

    /// update
    ///
    /// An unchanged title keeps the stored slug. Otherwise the new slug is
    /// disambiguated against every other row, never against the row itself.
    pub async fn update(&self, id: i64, title: &str, user_id: i64) -> Result<Category, AppError> {
        let title = title.trim();
        let current = self.repo.get_category(id).await?;

        if current.title == title {
            return self
                .repo
                .update_category(id, title, &current.slug, user_id)
                .await
                .map_err(|e| {
                    tracing::error!(code = "[SERVICE] EditCategoryByID - 1", error = %e);
                    e.into()
                });
        }

        for attempt in 1..=SLUG_ATTEMPTS {
            let slug = self.unique_slug(title, Some(id)).await?;
            match self.repo.update_category(id, title, &slug, user_id).await {
                Ok(category) => return Ok(category),
                Err(RepositoryError::SlugTaken) if attempt < SLUG_ATTEMPTS => {
                    tracing::warn!(code = "[SERVICE] EditCategoryByID - 2", slug = %slug, "slug taken concurrently, retrying");
                }
                Err(e) => {
                    tracing::error!(code = "[SERVICE] EditCategoryByID - 3", error = %e);
                    return Err(e.into());
                }
            }
        }

        Err(RepositoryError::SlugTaken.into())
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        match self.repo.delete_category(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::CategoryInUse) => {
                tracing::info!(code = "[SERVICE] DeleteCategoryByID - 1", id, "category in use");
                Err(RepositoryError::CategoryInUse.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// unique_slug
    ///
    /// `count` rows already holding the candidate means this is row `count + 1`,
    /// so the first collision on "news" yields "news-2". Should that suffixed
    /// slug itself be taken, the suffix keeps counting up until it is free.
    async fn unique_slug(&self, title: &str, exclude_id: Option<i64>) -> Result<String, AppError> {
        let base = slugify(title);
        if base.is_empty() {
            return Err(AppError::bad_request(
                "Title must contain at least one letter or digit",
            ));
        }

        let count = self.repo.count_categories_by_slug(&base, exclude_id).await?;
        if count == 0 {
            return Ok(base);
        }

        let mut n = count + 1;
        loop {
            let candidate = with_suffix(&base, n);
            if self.repo.count_categories_by_slug(&candidate, exclude_id).await? == 0 {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}
