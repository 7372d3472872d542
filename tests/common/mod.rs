#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use trustnews::{
    AppConfig, AppState, MockStorageService, create_router,
    models::{Category, Content, User},
    repository::{
        ContentFilter, ContentInput, OrderColumn, Repository, RepositoryError, RepositoryState,
        SortDirection,
    },
    storage::StorageState,
};

pub const ADMIN_ID: i64 = 1;
pub const ADMIN_EMAIL: &str = "admin@gmail.com";
pub const ADMIN_PASSWORD: &str = "admin123";

// --- In-memory Repository ---

#[derive(Default)]
struct Store {
    users: Vec<User>,
    categories: Vec<Category>,
    contents: Vec<Content>,
    next_id: i64,
    // Category writes that lose a race to a concurrent writer of the same slug.
    slug_races: usize,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_name(&self, id: i64) -> String {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.clone())
            .unwrap_or_default()
    }

    /// Mirrors the unique slug index. A pending race first lets a competing row
    /// claim `slug`, as if another request had committed it in between.
    fn claim_slug(&mut self, slug: &str, own_id: Option<i64>) -> Result<(), RepositoryError> {
        if self.slug_races > 0 {
            self.slug_races -= 1;
            let id = self.next_id();
            self.categories.push(Category {
                id,
                title: "Concurrent".to_string(),
                slug: slug.to_string(),
                created_by_id: ADMIN_ID,
                created_by_name: self.user_name(ADMIN_ID),
                created_at: Utc::now() + Duration::seconds(id),
            });
        }

        if self
            .categories
            .iter()
            .any(|c| c.slug == slug && Some(c.id) != own_id)
        {
            return Err(RepositoryError::SlugTaken);
        }
        Ok(())
    }

    // Mirrors the JOINs the Postgres queries perform.
    fn hydrate(&self, mut content: Content) -> Content {
        if let Some(cat) = self.categories.iter().find(|c| c.id == content.category_id) {
            content.category_title = cat.title.clone();
            content.category_slug = cat.slug.clone();
        }
        content.author = self.user_name(content.created_by_id);
        content
    }
}

/// InMemoryRepository
///
/// A `Repository` backed by vectors behind a mutex. Behaves like the Postgres
/// implementation for everything the handlers can observe.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryRepository {
    /// A repository holding the admin account (password `admin123`).
    pub fn with_admin() -> Self {
        let repo = Self::default();
        repo.insert_user(ADMIN_ID, "Admin", ADMIN_EMAIL, ADMIN_PASSWORD);
        repo
    }

    pub fn insert_user(&self, id: i64, name: &str, email: &str, password: &str) {
        // Minimum cost keeps the suite fast.
        let hashed = bcrypt::hash(password, 4).unwrap();
        let mut store = self.store.lock().unwrap();
        store.users.push(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password: hashed,
        });
        store.next_id = store.next_id.max(id);
    }

    pub fn insert_category(&self, title: &str, slug: &str) -> i64 {
        let mut store = self.store.lock().unwrap();
        let id = store.next_id();
        let created_by_name = store.user_name(ADMIN_ID);
        store.categories.push(Category {
            id,
            title: title.to_string(),
            slug: slug.to_string(),
            created_by_id: ADMIN_ID,
            created_by_name,
            created_at: Utc::now() + Duration::seconds(id),
        });
        id
    }

    pub fn insert_content(&self, title: &str, status: &str, category_id: i64) -> i64 {
        let mut store = self.store.lock().unwrap();
        let id = store.next_id();
        store.contents.push(Content {
            id,
            title: title.to_string(),
            excerpt: format!("{} excerpt", title),
            description: format!("{} body", title),
            image: "http://localhost:9000/mock-bucket/1-1.png".to_string(),
            tags: "news,local".to_string(),
            status: status.to_string(),
            category_id,
            created_by_id: ADMIN_ID,
            // Later inserts are newer.
            created_at: Utc::now() + Duration::seconds(id),
            ..Default::default()
        });
        id
    }

    /// Makes the next `n` category writes lose a race for their slug.
    pub fn race_next_slug_writes(&self, n: usize) {
        self.store.lock().unwrap().slug_races = n;
    }

    pub fn password_hash(&self, id: i64) -> String {
        let store = self.store.lock().unwrap();
        store
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.password.clone())
            .unwrap_or_default()
    }

    pub fn slugs(&self) -> Vec<String> {
        let store = self.store.lock().unwrap();
        store.categories.iter().map(|c| c.slug.clone()).collect()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        let store = self.store.lock().unwrap();
        store
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_user(&self, id: i64) -> Result<User, RepositoryError> {
        let store = self.store.lock().unwrap();
        store
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn ensure_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        if store.users.iter().any(|u| u.email == email) {
            return Ok(false);
        }
        let id = store.next_id();
        store.users.push(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
        });
        Ok(true)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        user.password = password_hash.to_string();
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let store = self.store.lock().unwrap();
        let mut categories = store.categories.clone();
        categories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> Result<Category, RepositoryError> {
        let store = self.store.lock().unwrap();
        store
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn count_categories_by_slug(
        &self,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<i64, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .categories
            .iter()
            .filter(|c| c.slug == slug && Some(c.id) != exclude_id)
            .count() as i64)
    }

    async fn create_category(
        &self,
        title: &str,
        slug: &str,
        created_by_id: i64,
    ) -> Result<Category, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        store.claim_slug(slug, None)?;
        let id = store.next_id();
        let category = Category {
            id,
            title: title.to_string(),
            slug: slug.to_string(),
            created_by_id,
            created_by_name: store.user_name(created_by_id),
            created_at: Utc::now() + Duration::seconds(id),
        };
        store.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: i64,
        title: &str,
        slug: &str,
        created_by_id: i64,
    ) -> Result<Category, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        if !store.categories.iter().any(|c| c.id == id) {
            return Err(RepositoryError::NotFound);
        }
        store.claim_slug(slug, Some(id))?;
        let name = store.user_name(created_by_id);
        let category = store
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        category.title = title.to_string();
        category.slug = slug.to_string();
        category.created_by_id = created_by_id;
        category.created_by_name = name;
        Ok(category.clone())
    }

    async fn delete_category(&self, id: i64) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        if store.contents.iter().any(|c| c.category_id == id) {
            return Err(RepositoryError::CategoryInUse);
        }
        let before = store.categories.len();
        store.categories.retain(|c| c.id != id);
        if store.categories.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_contents(
        &self,
        filter: &ContentFilter,
    ) -> Result<(Vec<Content>, i64), RepositoryError> {
        let store = self.store.lock().unwrap();
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());

        let mut rows: Vec<Content> = store
            .contents
            .iter()
            .filter(|c| filter.category_id.is_none_or(|id| c.category_id == id))
            .filter(|c| filter.status.as_ref().is_none_or(|s| &c.status == s))
            .filter(|c| {
                needle.as_ref().is_none_or(|n| {
                    c.title.to_lowercase().contains(n)
                        || c.excerpt.to_lowercase().contains(n)
                        || c.description.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ord = match filter.order_by {
                OrderColumn::CreatedAt => a.created_at.cmp(&b.created_at),
                OrderColumn::Title => a.title.cmp(&b.title),
                OrderColumn::Status => a.status.cmp(&b.status),
                OrderColumn::Id => a.id.cmp(&b.id),
            };
            match filter.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .map(|c| store.hydrate(c))
            .collect();

        Ok((page, total))
    }

    async fn get_content(&self, id: i64, status: Option<&str>) -> Result<Content, RepositoryError> {
        let store = self.store.lock().unwrap();
        store
            .contents
            .iter()
            .find(|c| c.id == id && status.is_none_or(|s| c.status == s))
            .cloned()
            .map(|c| store.hydrate(c))
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_content(&self, input: ContentInput) -> Result<Content, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let id = store.next_id();
        let content = Content {
            id,
            title: input.title,
            excerpt: input.excerpt,
            description: input.description,
            image: input.image,
            tags: input.tags,
            status: input.status,
            category_id: input.category_id,
            created_by_id: input.created_by_id,
            created_at: Utc::now() + Duration::seconds(id),
            ..Default::default()
        };
        store.contents.push(content.clone());
        Ok(store.hydrate(content))
    }

    async fn update_content(&self, id: i64, input: ContentInput) -> Result<Content, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let content = store
            .contents
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        content.title = input.title;
        content.excerpt = input.excerpt;
        content.description = input.description;
        content.image = input.image;
        content.tags = input.tags;
        content.status = input.status;
        content.category_id = input.category_id;
        content.created_by_id = input.created_by_id;
        let updated = content.clone();
        Ok(store.hydrate(updated))
    }

    async fn delete_content(&self, id: i64) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let before = store.contents.len();
        store.contents.retain(|c| c.id != id);
        if store.contents.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// --- App Helpers ---

pub fn test_state(repo: InMemoryRepository, storage: MockStorageService) -> AppState {
    let repo = Arc::new(repo) as RepositoryState;
    let storage = Arc::new(storage) as StorageState;
    AppState::new(repo, storage, AppConfig::default())
}

pub fn app(repo: InMemoryRepository) -> Router {
    create_router(test_state(repo, MockStorageService::new()))
}

pub fn app_with_storage(repo: InMemoryRepository, storage: MockStorageService) -> Router {
    create_router(test_state(repo, storage))
}

/// A valid bearer token for `user_id`, signed with the default test secret.
pub fn bearer(user_id: i64) -> String {
    let config = AppConfig::default();
    let codec = trustnews::TokenCodec::new(&config.jwt_secret, &config.jwt_issuer);
    let (token, _) = codec.mint(user_id).unwrap();
    format!("Bearer {}", token)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(ADMIN_ID))
        .body(Body::empty())
        .unwrap()
}

pub fn admin_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(ADMIN_ID))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(ADMIN_ID))
        .body(Body::empty())
        .unwrap()
}

/// Sends one request through a fresh clone of the router.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    read_json(response).await
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
