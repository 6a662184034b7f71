//! In-memory collection of one user's Funkos.
//!
//! # Responsibilities
//! - Allocate ids (`1 + max(numeric ids)`, gaps are never reused)
//! - Enforce id uniqueness
//! - CRUD over the ordered item list
//! - Load from and save to a `UserDir`

use crate::model::{Funko, FunkoPatch};
use crate::observability::metrics;
use crate::store::disk::UserDir;
use crate::store::error::{Result, StoreError};

/// Ordered set of Funkos, unique by id.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    funkos: Vec<Funko>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from an initial set, keeping the given ids.
    pub fn with_funkos(funkos: impl IntoIterator<Item = Funko>) -> Result<Self> {
        let mut collection = Self::new();
        for funko in funkos {
            collection.add(funko, true)?;
        }
        Ok(collection)
    }

    /// Items in store order.
    pub fn list(&self) -> &[Funko] {
        &self.funkos
    }

    pub fn len(&self) -> usize {
        self.funkos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funkos.is_empty()
    }

    /// Next id to hand out. Non-numeric ids do not take part.
    ///
    /// Fails once the largest stored id is `u64::MAX`.
    pub fn next_id(&self) -> Result<u64> {
        match self.funkos.iter().filter_map(Funko::numeric_id).max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or(StoreError::IdsExhausted),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Funko> {
        self.funkos.iter().find(|f| f.id == id)
    }

    /// Add a Funko.
    ///
    /// Unless `preserve_id` is set the id is replaced with a freshly allocated
    /// one. Fails without touching the collection if the id is taken.
    pub fn add(&mut self, mut funko: Funko, preserve_id: bool) -> Result<&Funko> {
        if !preserve_id {
            funko.id = self.next_id()?.to_string();
        }
        if self.get(&funko.id).is_some() {
            return Err(StoreError::Duplicate(funko.id));
        }

        let index = self.funkos.len();
        self.funkos.push(funko);
        Ok(&self.funkos[index])
    }

    /// Apply a partial update to item `id`.
    pub fn update(&mut self, id: &str, patch: FunkoPatch) -> Result<&Funko> {
        let funko = self
            .funkos
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        funko.apply(patch);
        Ok(&*funko)
    }

    /// Remove item `id`, deleting its backing file first.
    ///
    /// An already-missing file is not an error. File and memory removal are
    /// two steps; if the second never happens the in-memory copy is stale
    /// until the next load.
    pub async fn remove(&mut self, id: &str, dir: &UserDir) -> Result<Funko> {
        let index = self
            .funkos
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        dir.delete(id).await.map_err(|e| {
            tracing::error!(funko_id = %id, error = %e, "Failed to delete Funko file");
            metrics::record_storage_error("delete");
            e
        })?;

        Ok(self.funkos.remove(index))
    }

    /// Write every item to `dir`, overwriting existing files.
    ///
    /// A failing file is logged and the rest are still written.
    pub async fn save_all(&self, dir: &UserDir) -> Result<()> {
        dir.ensure().await?;

        let mut failed = 0;
        for funko in &self.funkos {
            if let Err(e) = dir.write(funko).await {
                tracing::error!(funko_id = %funko.id, error = %e, "Error saving Funko");
                metrics::record_storage_error("write");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(StoreError::PartialSave {
                failed,
                total: self.funkos.len(),
            });
        }
        tracing::debug!(path = ?dir.path(), count = self.funkos.len(), "Collection saved");
        Ok(())
    }

    /// Replace the contents with what is stored in `dir`.
    ///
    /// A missing directory is created and leaves the collection empty.
    /// Unreadable files and duplicate ids are logged and skipped.
    pub async fn load_all(&mut self, dir: &UserDir) -> Result<()> {
        self.funkos.clear();
        if dir.ensure().await? {
            return Ok(());
        }

        for funko in dir.read_all().await? {
            if let Err(e) = self.add(funko, true) {
                tracing::warn!(path = ?dir.path(), error = %e, "Skipping stored Funko");
            }
        }
        tracing::debug!(path = ?dir.path(), count = self.funkos.len(), "Collection loaded");
        Ok(())
    }
}
