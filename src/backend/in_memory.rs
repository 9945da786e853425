use crate::backend::ResourceStore;
use crate::error::{AppError, AppResult};
use crate::models::{AttributeCatalog, AttributeDeclaration, TagDeclaration, UserRecord};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::RwLock;

/// Seed document for [`InMemoryStore`]
///
/// ```yaml
/// attributes:
///   - key: department
///     case_exact: false
/// tags:
///   - code: vip
///     title: VIP
///     view_requires_superuser: true
/// users:
///   - id: 0b6c9a8e-1f7e-4b7a-9c55-0d2b1e3f4a5b
///     username: john
///     email: john@example.com
///     attributes:
///       department: Sales
///     tags: [vip]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub attributes: Vec<AttributeDeclaration>,
    #[serde(default)]
    pub tags: Vec<TagDeclaration>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Default)]
struct StoreState {
    users: Vec<UserRecord>,
    catalog: AttributeCatalog,
}

/// Resource store keeping users and declarations in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for user in &seed.users {
            if !seen.insert(user.id) {
                return Err(AppError::Store(format!("duplicate user id {}", user.id)));
            }
        }

        tracing::debug!(
            users = seed.users.len(),
            attributes = seed.attributes.len(),
            tags = seed.tags.len(),
            "Seeding in-memory store"
        );

        Ok(Self {
            state: RwLock::new(StoreState {
                users: seed.users,
                catalog: AttributeCatalog::new(seed.attributes, seed.tags),
            }),
        })
    }

    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let seed: SeedData = serde_yaml::from_str(content)?;
        Self::from_seed(seed)
    }

    pub async fn load_yaml_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_yaml_str(&content)
    }

    /// Insert a user, replacing any existing record with the same id
    pub async fn upsert_user(&self, user: UserRecord) {
        let mut state = self.state.write().await;
        match state.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => state.users.push(user),
        }
    }

    pub async fn declare_attribute(&self, declaration: AttributeDeclaration) {
        self.state.write().await.catalog.declare_attribute(declaration);
    }

    pub async fn declare_tag(&self, declaration: TagDeclaration) {
        self.state.write().await.catalog.declare_tag(declaration);
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn list_all(&self) -> AppResult<Vec<UserRecord>> {
        Ok(self.state.read().await.users.clone())
    }

    async fn catalog(&self) -> AppResult<AttributeCatalog> {
        Ok(self.state.read().await.catalog.clone())
    }
}
