//! Binding between a username and its collection.

use std::path::Path;

use crate::model::{Funko, FunkoPatch};
use crate::store::collection::Collection;
use crate::store::disk::UserDir;
use crate::store::error::{Result, StoreError};

/// One user's collection together with the directory that backs it.
///
/// Built fresh for every request; nothing is cached between requests.
#[derive(Debug)]
pub struct UserContext {
    username: String,
    dir: UserDir,
    collection: Collection,
}

impl UserContext {
    /// Create a context with an empty collection. Nothing is read yet.
    pub fn new(data_dir: &Path, username: &str) -> Result<Self> {
        Ok(Self::with_dir(username, UserDir::new(data_dir, username)?))
    }

    /// Create a context over an already validated directory.
    pub fn with_dir(username: &str, dir: UserDir) -> Self {
        Self {
            username: username.to_string(),
            dir,
            collection: Collection::new(),
        }
    }

    /// Create a context and load the stored collection.
    pub async fn open(data_dir: &Path, username: &str) -> Result<Self> {
        Self::open_dir(username, UserDir::new(data_dir, username)?).await
    }

    /// Load the stored collection from `dir`.
    pub async fn open_dir(username: &str, dir: UserDir) -> Result<Self> {
        let mut ctx = Self::with_dir(username, dir);
        ctx.load_collection().await?;
        Ok(ctx)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub async fn load_collection(&mut self) -> Result<()> {
        self.collection.load_all(&self.dir).await.map_err(|e| {
            tracing::error!(user = %self.username, error = %e, "Failed to load the collection");
            e
        })
    }

    /// Rewrite every item file of the collection.
    pub async fn save_collection(&self) -> Result<()> {
        self.collection.save_all(&self.dir).await.map_err(|e| {
            tracing::error!(user = %self.username, error = %e, "Failed to save the collection");
            e
        })
    }

    /// Write just item `id` to disk.
    pub async fn persist(&self, id: &str) -> Result<()> {
        let funko = self
            .collection
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.dir.ensure().await?;
        self.dir.write(funko).await.map_err(|e| {
            tracing::error!(user = %self.username, funko_id = %id, error = %e, "Failed to save Funko");
            e
        })
    }

    /// Add a new Funko under a freshly allocated id.
    pub fn add_item(&mut self, funko: Funko) -> Result<&Funko> {
        funko.validate();
        match self.collection.add(funko, false) {
            Ok(added) => {
                tracing::info!(user = %self.username, funko_id = %added.id, "Funko added to the collection");
                Ok(added)
            }
            Err(e) => {
                tracing::warn!(user = %self.username, error = %e, "Funko not added");
                Err(e)
            }
        }
    }

    pub fn update_item(&mut self, id: &str, patch: FunkoPatch) -> Result<&Funko> {
        self.collection.update(id, patch)
    }

    pub async fn remove_item(&mut self, id: &str) -> Result<Funko> {
        self.collection.remove(id, &self.dir).await
    }
}
